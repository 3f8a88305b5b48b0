//! Simple point forecasts used as the deterministic backbone of demand paths.
//! Periods without enough history have no forecast (`None`).

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ForecastMethod {
    /// Forecast column shipped with the data
    #[default]
    Dataset,
    MovingAverage { window: usize },
    ExpSmoothing { alpha: f64 },
}

/// Mean of the previous `window` observations, from period `window` onwards
pub fn moving_average_forecast(series: &[f64], window: usize) -> Result<Vec<Option<f64>>> {
    if window == 0 {
        return Err(SimulationError::invalid_input("moving-average window must be positive"));
    }

    let forecast = (0..series.len())
        .map(|t| {
            if t < window {
                None
            } else {
                Some(series[t - window..t].iter().sum::<f64>() / window as f64)
            }
        })
        .collect();

    Ok(forecast)
}

/// F[1] = Y[0], F[t] = alpha * Y[t-1] + (1 - alpha) * F[t-1]
pub fn exponential_smoothing_forecast(series: &[f64], alpha: f64) -> Result<Vec<Option<f64>>> {
    if !(alpha > 0.0 && alpha <= 1.0) {
        return Err(SimulationError::invalid_input(format!(
            "smoothing alpha must lie in (0, 1], got {}",
            alpha
        )));
    }

    let mut forecast = Vec::with_capacity(series.len());
    let mut previous: Option<f64> = None;

    for t in 0..series.len() {
        let current = match (t, previous) {
            (0, _) => None,
            (1, _) => Some(series[0]),
            (_, Some(prev)) => Some(alpha * series[t - 1] + (1.0 - alpha) * prev),
            (_, None) => None,
        };
        forecast.push(current);
        previous = current;
    }

    Ok(forecast)
}

/// Forecast `demand` with `method`; `dataset_forecast` backs `Dataset`
pub fn generate_forecasts(
    demand: &[f64],
    dataset_forecast: &[f64],
    method: ForecastMethod,
) -> Result<Vec<Option<f64>>> {
    match method {
        ForecastMethod::Dataset => {
            if dataset_forecast.len() != demand.len() {
                return Err(SimulationError::invalid_input(format!(
                    "dataset forecast has {} periods but demand has {}",
                    dataset_forecast.len(),
                    demand.len()
                )));
            }
            Ok(dataset_forecast.iter().copied().map(Some).collect())
        }
        ForecastMethod::MovingAverage { window } => moving_average_forecast(demand, window),
        ForecastMethod::ExpSmoothing { alpha } => exponential_smoothing_forecast(demand, alpha),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moving_average_uses_past_only() {
        let forecast = moving_average_forecast(&[1.0, 2.0, 3.0, 4.0, 5.0], 2).unwrap();
        assert_eq!(forecast, vec![None, None, Some(1.5), Some(2.5), Some(3.5)]);
        assert!(moving_average_forecast(&[1.0], 0).is_err());
    }

    #[test]
    fn test_exponential_smoothing() {
        let forecast = exponential_smoothing_forecast(&[10.0, 20.0, 30.0], 0.5).unwrap();
        assert_eq!(forecast, vec![None, Some(10.0), Some(15.0)]);
    }

    #[test]
    fn test_exponential_smoothing_rejects_bad_alpha() {
        assert!(exponential_smoothing_forecast(&[1.0], 0.0).is_err());
        assert!(exponential_smoothing_forecast(&[1.0], 1.5).is_err());
        assert!(exponential_smoothing_forecast(&[1.0], f64::NAN).is_err());
    }

    #[test]
    fn test_dataset_passthrough() {
        let forecast =
            generate_forecasts(&[1.0, 2.0], &[3.0, 4.0], ForecastMethod::Dataset).unwrap();
        assert_eq!(forecast, vec![Some(3.0), Some(4.0)]);
        assert!(generate_forecasts(&[1.0, 2.0], &[3.0], ForecastMethod::Dataset).is_err());
    }

    #[test]
    fn test_short_series() {
        assert!(exponential_smoothing_forecast(&[], 0.3).unwrap().is_empty());
        assert_eq!(moving_average_forecast(&[4.0], 7).unwrap(), vec![None]);
    }
}
