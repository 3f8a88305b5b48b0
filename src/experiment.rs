//! Volatility experiment: static vs tuned (r, Q) policies, plus a
//! trailing-mean baseline, under scaled forecast-error pools.

use serde::Serialize;
use tracing::info;

use crate::calibration::{GroupCalibration, GroupColumn};
use crate::config::ExperimentConfig;
use crate::demand::scale_errors;
use crate::error::{Result, SimulationError};
use crate::forecasting::generate_forecasts;
use crate::metrics::summarize_monte_carlo;
use crate::models::{DemandSeries, DemandTable, Metric, MetricSummary};
use crate::monte_carlo::run_policy;
use crate::policies::{configure_static_rq, configure_tuned_rq, PolicyParameters};

/// Demand, forecast and error pool of the group under study
#[derive(Clone, Debug)]
pub struct ExperimentInputs {
    pub group_id: String,
    pub series: DemandSeries,
    pub errors: Vec<f64>,
}

/// Build inputs for the calibrated group with the most observations
pub fn prepare_inputs(
    table: &DemandTable,
    calibration: &GroupCalibration,
    group_column: &GroupColumn,
    config: &ExperimentConfig,
) -> Result<ExperimentInputs> {
    let group = calibration.largest_group().ok_or_else(|| {
        SimulationError::invalid_input("calibration retained no groups to experiment on")
    })?;
    let errors = calibration
        .error_samples
        .get(&group.group_id)
        .cloned()
        .unwrap_or_default();

    let rows: Vec<_> = table
        .records
        .iter()
        .filter(|r| group_column.key(r) == Some(group.group_id.as_str()))
        .collect();
    let demand: Vec<f64> = rows.iter().map(|r| r.units_sold).collect();
    let dataset_forecast: Vec<f64> = rows.iter().map(|r| r.demand_forecast).collect();

    let forecast = generate_forecasts(&demand, &dataset_forecast, config.forecast_method)?;
    let mut series = DemandSeries::from_optional(demand, forecast)?;
    series.truncate(config.horizon);

    info!(group = %group.group_id, periods = series.len(), "prepared experiment inputs");
    Ok(ExperimentInputs {
        group_id: group.group_id.clone(),
        series,
        errors,
    })
}

/// One (multiplier, policy) cell of the comparison table
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub volatility_multiplier: f64,
    pub policy: String,
    pub fill_rate_mean: Option<f64>,
    pub fill_rate_ci_low: Option<f64>,
    pub fill_rate_ci_high: Option<f64>,
    pub stockout_event_mean: Option<f64>,
    pub stockout_event_ci_low: Option<f64>,
    pub stockout_event_ci_high: Option<f64>,
    pub stockout_volume_mean: Option<f64>,
    pub stockout_volume_ci_low: Option<f64>,
    pub stockout_volume_ci_high: Option<f64>,
    pub holding_cost_mean: Option<f64>,
    pub holding_cost_ci_low: Option<f64>,
    pub holding_cost_ci_high: Option<f64>,
    pub turnover_mean: Option<f64>,
    pub turnover_ci_low: Option<f64>,
    pub turnover_ci_high: Option<f64>,
}

impl ComparisonRow {
    pub fn from_summary(volatility_multiplier: f64, policy: &str, summary: &MetricSummary) -> Self {
        let field = |metric: Metric| {
            let estimate = summary.get(metric);
            (
                estimate.map(|e| e.mean),
                estimate.map(|e| e.ci_low),
                estimate.map(|e| e.ci_high),
            )
        };
        let (fill_rate_mean, fill_rate_ci_low, fill_rate_ci_high) = field(Metric::FillRate);
        let (stockout_event_mean, stockout_event_ci_low, stockout_event_ci_high) =
            field(Metric::StockoutEvent);
        let (stockout_volume_mean, stockout_volume_ci_low, stockout_volume_ci_high) =
            field(Metric::StockoutVolume);
        let (holding_cost_mean, holding_cost_ci_low, holding_cost_ci_high) =
            field(Metric::HoldingCost);
        let (turnover_mean, turnover_ci_low, turnover_ci_high) = field(Metric::Turnover);

        ComparisonRow {
            volatility_multiplier,
            policy: policy.to_string(),
            fill_rate_mean,
            fill_rate_ci_low,
            fill_rate_ci_high,
            stockout_event_mean,
            stockout_event_ci_low,
            stockout_event_ci_high,
            stockout_volume_mean,
            stockout_volume_ci_low,
            stockout_volume_ci_high,
            holding_cost_mean,
            holding_cost_ci_low,
            holding_cost_ci_high,
            turnover_mean,
            turnover_ci_low,
            turnover_ci_high,
        }
    }
}

/// Policies compared in every volatility regime, keyed by report name
pub fn candidate_policies(
    series: &DemandSeries,
    config: &ExperimentConfig,
) -> Vec<(&'static str, PolicyParameters)> {
    let mean_demand = series.mean_demand();
    let std_demand = series.std_demand();

    vec![
        (
            "static",
            PolicyParameters::ReorderPoint(configure_static_rq(
                mean_demand,
                config.lead_time,
                config.order_quantity,
                config.safety_factor,
            )),
        ),
        (
            "tuned",
            PolicyParameters::ReorderPoint(configure_tuned_rq(
                mean_demand,
                std_demand,
                config.lead_time,
                config.order_quantity,
                config.safety_factor,
            )),
        ),
        (
            "trailing_mean",
            PolicyParameters::TrailingMean {
                window: config.trailing_window,
            },
        ),
    ]
}

/// Run every candidate policy under every volatility multiplier.
/// All policies in a regime share the configured seed.
pub fn run_volatility_experiment(
    inputs: &ExperimentInputs,
    config: &ExperimentConfig,
) -> Result<Vec<ComparisonRow>> {
    config.validate()?;
    let policies = candidate_policies(&inputs.series, config);
    let mut rows = Vec::with_capacity(config.volatility_multipliers.len() * policies.len());

    for multiplier in &config.volatility_multipliers {
        let scaled = scale_errors(&inputs.errors, *multiplier);

        for (name, params) in &policies {
            let runs = run_policy(
                params,
                inputs.series.forecast(),
                &scaled,
                config.initial_inventory,
                config.n_runs,
                config.seed,
            )?;
            let summary = summarize_monte_carlo(&runs, config.holding_cost);
            info!(
                multiplier,
                policy = name,
                fill_rate = ?summary.mean(Metric::FillRate),
                "volatility cell complete"
            );
            rows.push(ComparisonRow::from_summary(*multiplier, name, &summary));
        }
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::calibrate_by_group;
    use crate::models::DemandRecord;
    use chrono::{Duration, NaiveDate};

    fn table() -> DemandTable {
        let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        let mut records = Vec::new();
        for day in 0..40 {
            let units = 80.0 + ((day * 37) % 23) as f64;
            records.push(DemandRecord {
                date: start + Duration::days(day),
                store_id: "S001".into(),
                product_id: Some("P1".into()),
                category: Some("Toys".into()),
                units_sold: units,
                demand_forecast: 90.0,
            });
            if day % 3 == 0 {
                records.push(DemandRecord {
                    date: start + Duration::days(day),
                    store_id: "S001".into(),
                    product_id: Some("P2".into()),
                    category: Some("Games".into()),
                    units_sold: 5.0,
                    demand_forecast: 4.0,
                });
            }
        }
        DemandTable {
            columns: vec!["Category".into(), "Product ID".into()],
            records,
        }
    }

    fn config() -> ExperimentConfig {
        ExperimentConfig {
            n_runs: 10,
            horizon: 30,
            seed: 3,
            ..ExperimentConfig::default()
        }
    }

    #[test]
    fn test_prepare_inputs_picks_largest_group() {
        let column = GroupColumn::Category("Category".into());
        let calibration = calibrate_by_group(&table(), &column);
        let inputs = prepare_inputs(&table(), &calibration, &column, &config()).unwrap();

        assert_eq!(inputs.group_id, "Toys");
        assert_eq!(inputs.series.len(), 30);
        assert_eq!(inputs.errors.len(), 40);
    }

    #[test]
    fn test_experiment_produces_a_row_per_cell() {
        let column = GroupColumn::Category("Category".into());
        let calibration = calibrate_by_group(&table(), &column);
        let inputs = prepare_inputs(&table(), &calibration, &column, &config()).unwrap();

        let rows = run_volatility_experiment(&inputs, &config()).unwrap();
        assert_eq!(rows.len(), 9);
        assert_eq!(rows[0].policy, "static");
        assert_eq!(rows[1].policy, "tuned");
        assert_eq!(rows[2].policy, "trailing_mean");
        for row in &rows {
            let fill = row.fill_rate_mean.unwrap();
            assert!((0.0..=1.0).contains(&fill));
            assert!(row.fill_rate_ci_low.unwrap() <= fill);
            assert!(fill <= row.fill_rate_ci_high.unwrap());
            assert!(row.holding_cost_mean.unwrap() >= 0.0);
        }
    }

    #[test]
    fn test_tuned_reorder_point_not_below_static() {
        let series = DemandSeries::new(vec![10.0, 30.0, 20.0], vec![20.0; 3]).unwrap();
        let policies = candidate_policies(&series, &config());
        let reorder_point = |p: &PolicyParameters| match p {
            PolicyParameters::ReorderPoint(rq) => rq.reorder_point,
            PolicyParameters::TrailingMean { .. } => f64::NAN,
        };
        assert!(reorder_point(&policies[1].1) > reorder_point(&policies[0].1));
    }

    #[test]
    fn test_no_groups_is_invalid_input() {
        let column = GroupColumn::Category("Category".into());
        let result = prepare_inputs(&table(), &GroupCalibration::default(), &column, &config());
        assert!(matches!(result, Err(SimulationError::InvalidInput(_))));
    }
}
