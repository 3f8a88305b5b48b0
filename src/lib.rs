//! Monte Carlo evaluation of inventory replenishment policies under demand
//! uncertainty.
//!
//! Pipeline: [`calibration`] derives per-group forecast-error pools,
//! [`demand`] bootstraps synthetic demand paths from them, [`simulation`]
//! replays a policy period by period, [`monte_carlo`] repeats that under one
//! seeded generator, and [`metrics`] aggregates the runs into confidence
//! intervals.

pub mod calibration;
pub mod config;
pub mod demand;
pub mod error;
pub mod experiment;
pub mod forecasting;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod monte_carlo;
pub mod policies;
pub mod preprocessing;
pub mod reporting;
pub mod simulation;

pub use error::{Result, SimulationError};
