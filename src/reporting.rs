//! Reporting and output formatting module
//! Console tables for calibration and metric summaries, CSV export of
//! comparison rows and batched run histories

use std::path::Path;

use serde::Serialize;

use crate::calibration::{GroupCalibration, GroupColumn};
use crate::error::Result;
use crate::experiment::ComparisonRow;
use crate::models::{MetricSummary, RunResult};

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "undefined".to_string(), |v| format!("{:.4}", v))
}

/// Display the banner shown at program start
pub fn display_banner() {
    println!("╔══════════════════════════════════════════════════════════════════════════════╗");
    println!("║            INVENTORY POLICY EVALUATION UNDER DEMAND UNCERTAINTY              ║");
    println!("╚══════════════════════════════════════════════════════════════════════════════╝\n");
}

/// Display the per-group calibration table
pub fn display_calibration(calibration: &GroupCalibration, group_column: &GroupColumn) {
    println!("Calibration by '{}':", group_column.name());
    println!(
        "  {:<20} {:>6} {:>10} {:>10} {:>10} {:>10}",
        "group", "n_obs", "mu_demand", "sd_demand", "mu_error", "sd_error"
    );
    for record in &calibration.records {
        println!(
            "  {:<20} {:>6} {:>10.2} {:>10.2} {:>10.2} {:>10.2}",
            record.group_id,
            record.n_obs,
            record.mean_demand,
            record.std_demand,
            record.mean_error,
            record.std_error
        );
    }
    if calibration.dropped_groups > 0 {
        println!(
            "  ({} of {} groups dropped for too few observations)",
            calibration.dropped_groups, calibration.total_groups
        );
    }
    println!();
}

/// Display one aggregated metric table
pub fn display_metric_summary(title: &str, summary: &MetricSummary) {
    println!("  {}", title);
    println!("    {:<16} {:>12} {:>12} {:>12}", "metric", "mean", "ci_low", "ci_high");
    for row in &summary.rows {
        let estimate = row.estimate.as_ref();
        println!(
            "    {:<16} {:>12} {:>12} {:>12}",
            row.metric.name(),
            fmt_opt(estimate.map(|e| e.mean)),
            fmt_opt(estimate.map(|e| e.ci_low)),
            fmt_opt(estimate.map(|e| e.ci_high)),
        );
    }
}

/// Display the full volatility comparison
pub fn display_comparison(rows: &[ComparisonRow]) {
    println!("\n╔═══════════════════════════════════════════════════════════════════════════════════════════════════╗");
    println!("║                              VOLATILITY EXPERIMENT RESULTS                                        ║");
    println!("╚═══════════════════════════════════════════════════════════════════════════════════════════════════╝\n");

    let mut current = None;
    for row in rows {
        if current != Some(row.volatility_multiplier) {
            println!("Volatility x{:.2}", row.volatility_multiplier);
            current = Some(row.volatility_multiplier);
        }
        println!(
            concat!(
                "  {:<14} fill rate {} [{}, {}] | stockout events {} | ",
                "stockout volume {} | holding {} | turnover {}"
            ),
            row.policy,
            fmt_opt(row.fill_rate_mean),
            fmt_opt(row.fill_rate_ci_low),
            fmt_opt(row.fill_rate_ci_high),
            fmt_opt(row.stockout_event_mean),
            fmt_opt(row.stockout_volume_mean),
            fmt_opt(row.holding_cost_mean),
            fmt_opt(row.turnover_mean),
        );
    }
}

/// Write comparison rows as CSV; undefined values become empty fields
pub fn write_comparison_csv<P: AsRef<Path>>(path: P, rows: &[ComparisonRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct HistoryRow {
    run_id: usize,
    period: usize,
    demand: f64,
    forecast: f64,
    sales: f64,
    lost_sales: f64,
    ending_inventory: f64,
    order_qty: f64,
    arrivals: f64,
}

/// Write batched run histories, one row per (run, period)
pub fn write_run_histories<P: AsRef<Path>>(path: P, runs: &[RunResult]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for run in runs {
        for p in &run.periods {
            writer.serialize(HistoryRow {
                run_id: run.run_id,
                period: p.period,
                demand: p.demand,
                forecast: p.forecast,
                sales: p.sales,
                lost_sales: p.lost_sales,
                ending_inventory: p.ending_inventory,
                order_qty: p.order_qty,
                arrivals: p.arrivals,
            })?;
        }
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Metric, MetricEstimate, MetricRow, PeriodRecord};

    fn summary() -> MetricSummary {
        MetricSummary {
            rows: vec![
                MetricRow {
                    metric: Metric::FillRate,
                    estimate: Some(MetricEstimate {
                        mean: 0.9,
                        ci_low: 0.85,
                        ci_high: 0.95,
                        valid_runs: 4,
                    }),
                },
                MetricRow {
                    metric: Metric::Turnover,
                    estimate: None,
                },
            ],
        }
    }

    #[test]
    fn test_comparison_csv_has_header_and_empty_undefined() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        let row = ComparisonRow::from_summary(1.5, "tuned", &summary());

        write_comparison_csv(&path, &[row]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("volatility_multiplier,policy,fill_rate_mean"));
        let body = lines.next().unwrap();
        assert!(body.starts_with("1.5,tuned,0.9,0.85,0.95,"));
        assert!(body.ends_with(",,"));
    }

    #[test]
    fn test_run_histories_are_tagged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs.csv");
        let period = PeriodRecord {
            period: 0,
            demand: 5.0,
            forecast: 4.0,
            sales: 5.0,
            lost_sales: 0.0,
            ending_inventory: 1.0,
            order_qty: 0.0,
            arrivals: 0.0,
        };
        let runs = vec![
            RunResult {
                run_id: 0,
                periods: vec![period.clone()],
            },
            RunResult {
                run_id: 1,
                periods: vec![period],
            },
        ];

        write_run_histories(&path, &runs).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(reader.headers().unwrap().get(0), Some("run_id"));
        let ids: Vec<String> = reader
            .records()
            .map(|r| r.unwrap().get(0).unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["0", "1"]);
    }

    #[test]
    fn test_fmt_undefined() {
        assert_eq!(fmt_opt(None), "undefined");
        assert_eq!(fmt_opt(Some(0.5)), "0.5000");
    }
}
