//! Error types for the simulation core and its surrounding layers.
//!
//! Undefined metric values (zero demand, zero mean inventory) are not errors;
//! they travel as `None` through `metrics`.

use thiserror::Error;

/// Errors that can occur while preparing data or running simulations.
#[derive(Error, Debug)]
pub enum SimulationError {
    /// No usable grouping column, unknown store, or a bad configuration value
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Structurally invalid input to a simulation call
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Required CSV column absent from the header
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Unparsable field in an input row
    #[error("Invalid record in row {row}: {message}")]
    InvalidRecord { row: usize, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing or writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Malformed TOML configuration
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, SimulationError>;

impl SimulationError {
    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        SimulationError::InvalidInput(message.into())
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        SimulationError::Configuration(message.into())
    }
}
