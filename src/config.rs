//! Experiment configuration.
//! Every field has a default, so a TOML file only needs the values it changes.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};
use crate::forecasting::ForecastMethod;
use crate::preprocessing::StoreSelection;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub data_path: PathBuf,
    pub store: StoreSelection,
    /// Number of leading periods of the chosen group to simulate
    pub horizon: usize,
    pub forecast_method: ForecastMethod,
    pub lead_time: f64,
    pub order_quantity: f64,
    /// Safety factor z
    pub safety_factor: f64,
    pub initial_inventory: f64,
    pub n_runs: usize,
    pub seed: u64,
    /// Cost per unit of ending inventory per period
    pub holding_cost: f64,
    pub volatility_multipliers: Vec<f64>,
    pub trailing_window: usize,
    pub output_path: PathBuf,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/retail_store_inventory.csv"),
            store: StoreSelection::FirstAlphabetical,
            horizon: 365,
            forecast_method: ForecastMethod::Dataset,
            lead_time: 1.0,
            order_quantity: 200.0,
            safety_factor: 1.0,
            initial_inventory: 300.0,
            n_runs: 300,
            seed: 11,
            holding_cost: 1.0,
            volatility_multipliers: vec![0.5, 1.0, 1.5],
            trailing_window: 7,
            output_path: PathBuf::from("results_volatility.csv"),
        }
    }
}

impl ExperimentConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: ExperimentConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_runs == 0 {
            return Err(SimulationError::configuration("n_runs must be positive"));
        }
        if self.horizon == 0 {
            return Err(SimulationError::configuration("horizon must be positive"));
        }
        if self.trailing_window == 0 {
            return Err(SimulationError::configuration("trailing_window must be positive"));
        }
        if self.volatility_multipliers.is_empty() {
            return Err(SimulationError::configuration(
                "at least one volatility multiplier is required",
            ));
        }
        if self.volatility_multipliers.iter().any(|m| !(*m >= 0.0)) {
            return Err(SimulationError::configuration(
                "volatility multipliers must be non-negative",
            ));
        }
        if !(self.lead_time >= 0.0) {
            return Err(SimulationError::configuration("lead_time must be non-negative"));
        }
        for (name, value) in [
            ("initial_inventory", self.initial_inventory),
            ("order_quantity", self.order_quantity),
            ("holding_cost", self.holding_cost),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SimulationError::configuration(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}
