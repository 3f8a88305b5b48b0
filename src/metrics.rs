//! Per-run performance metrics and cross-run aggregation.
//!
//! Ratios with a zero denominator are undefined (`None`) rather than errors.
//! Aggregation skips undefined runs and reports a metric as undefined only
//! when no run defined it.

use crate::models::{Metric, MetricEstimate, MetricRow, MetricSummary, RunMetrics, RunResult};

/// z-value of a two-sided 95% normal interval
pub const CI_Z: f64 = 1.96;

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

/// Fraction of total demand served from stock
pub fn fill_rate(run: &RunResult) -> Option<f64> {
    ratio(run.total_sales(), run.total_demand())
}

/// Fraction of periods with any lost sales
pub fn stockout_event_rate(run: &RunResult) -> Option<f64> {
    let stockouts = run.periods.iter().filter(|p| p.lost_sales > 0.0).count();
    ratio(stockouts as f64, run.len() as f64)
}

/// Fraction of total demand lost
pub fn stockout_volume_rate(run: &RunResult) -> Option<f64> {
    ratio(run.total_lost_sales(), run.total_demand())
}

/// Holding cost `h` per unit of ending inventory per period
pub fn holding_cost(run: &RunResult, h: f64) -> f64 {
    h * run.periods.iter().map(|p| p.ending_inventory).sum::<f64>()
}

/// Total sales over mean ending inventory
pub fn inventory_turnover(run: &RunResult) -> Option<f64> {
    if run.is_empty() {
        return None;
    }
    let mean_inventory =
        run.periods.iter().map(|p| p.ending_inventory).sum::<f64>() / run.len() as f64;
    ratio(run.total_sales(), mean_inventory)
}

pub fn summarize_run(run: &RunResult, h: f64) -> RunMetrics {
    RunMetrics {
        fill_rate: fill_rate(run),
        stockout_event: stockout_event_rate(run),
        stockout_volume: stockout_volume_rate(run),
        holding_cost: holding_cost(run, h),
        turnover: inventory_turnover(run),
    }
}

/// Mean and 95% interval over the defined values, or `None` if there are none
pub fn aggregate(values: &[Option<f64>]) -> Option<MetricEstimate> {
    let valid: Vec<f64> = values
        .iter()
        .flatten()
        .copied()
        .filter(|v| !v.is_nan())
        .collect();

    if valid.is_empty() {
        return None;
    }

    let n = valid.len() as f64;
    let mean = valid.iter().sum::<f64>() / n;
    let std = if valid.len() > 1 {
        (valid.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
    } else {
        0.0
    };
    let half_width = CI_Z * std / n.sqrt();

    Some(MetricEstimate {
        mean,
        ci_low: mean - half_width,
        ci_high: mean + half_width,
        valid_runs: valid.len(),
    })
}

/// Aggregate already-computed run metrics
pub fn summarize_metrics(per_run: &[RunMetrics]) -> MetricSummary {
    let rows = Metric::ALL
        .iter()
        .map(|metric| {
            let values: Vec<Option<f64>> = per_run.iter().map(|m| m.get(*metric)).collect();
            MetricRow {
                metric: *metric,
                estimate: aggregate(&values),
            }
        })
        .collect();

    MetricSummary { rows }
}

/// Summarize every run, then aggregate across runs
pub fn summarize_monte_carlo(runs: &[RunResult], h: f64) -> MetricSummary {
    let per_run: Vec<RunMetrics> = runs.iter().map(|run| summarize_run(run, h)).collect();
    summarize_metrics(&per_run)
}
