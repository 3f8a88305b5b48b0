//! Demand path generation.
//! Synthetic demand is the point forecast perturbed by historical forecast
//! errors drawn with replacement (bootstrap), floored at zero.

use rand::Rng;
use rand_distr::{Distribution, Uniform};

use crate::error::{Result, SimulationError};

/// Draw one stochastic demand path from `forecast` and an empirical error pool.
///
/// Exactly `forecast.len()` indices are drawn from `rng`, so the caller's
/// generator advances by the same amount for equal horizons.
pub fn generate_demand_path<R: Rng + ?Sized>(
    forecast: &[f64],
    error_pool: &[f64],
    rng: &mut R,
) -> Result<Vec<f64>> {
    if error_pool.is_empty() {
        return Err(SimulationError::invalid_input(
            "cannot bootstrap demand from an empty error pool",
        ));
    }

    let index = Uniform::new(0, error_pool.len());

    let path = forecast
        .iter()
        .map(|f| {
            let error = error_pool[index.sample(rng)];
            // Demand cannot be negative
            (f + error).max(0.0)
        })
        .collect();

    Ok(path)
}

/// Multiply every error sample by `multiplier` to widen or narrow uncertainty
pub fn scale_errors(error_pool: &[f64], multiplier: f64) -> Vec<f64> {
    error_pool.iter().map(|e| e * multiplier).collect()
}
