//! Data structures shared across calibration, simulation and metrics.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{Result, SimulationError};

/// One cleaned row of single-store demand data
#[derive(Clone, Debug, PartialEq)]
pub struct DemandRecord {
    pub date: NaiveDate,
    pub store_id: String,
    pub product_id: Option<String>,
    pub category: Option<String>,
    pub units_sold: f64,
    pub demand_forecast: f64,
}

/// Cleaned demand data together with the header names it was read from
#[derive(Clone, Debug, Default)]
pub struct DemandTable {
    pub columns: Vec<String>,
    pub records: Vec<DemandRecord>,
}

impl DemandTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn units_sold(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.units_sold).collect()
    }

    pub fn demand_forecast(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.demand_forecast).collect()
    }
}

/// Realized demand aligned 1:1 with a point forecast
#[derive(Clone, Debug, PartialEq)]
pub struct DemandSeries {
    demand: Vec<f64>,
    forecast: Vec<f64>,
}

impl DemandSeries {
    pub fn new(demand: Vec<f64>, forecast: Vec<f64>) -> Result<Self> {
        if demand.len() != forecast.len() {
            return Err(SimulationError::invalid_input(format!(
                "demand has {} periods but forecast has {}",
                demand.len(),
                forecast.len()
            )));
        }
        Ok(DemandSeries { demand, forecast })
    }

    /// Build a series from a forecast with an undefined warm-up prefix.
    /// Leading undefined periods are dropped from both vectors; an undefined
    /// value after the first defined one is rejected.
    pub fn from_optional(demand: Vec<f64>, forecast: Vec<Option<f64>>) -> Result<Self> {
        if demand.len() != forecast.len() {
            return Err(SimulationError::invalid_input(format!(
                "demand has {} periods but forecast has {}",
                demand.len(),
                forecast.len()
            )));
        }

        let warm_up = forecast.iter().take_while(|f| f.is_none()).count();
        let defined: Option<Vec<f64>> = forecast[warm_up..].iter().copied().collect();
        let forecast = defined.ok_or_else(|| {
            SimulationError::invalid_input("forecast has an undefined period after warm-up")
        })?;

        Ok(DemandSeries {
            demand: demand[warm_up..].to_vec(),
            forecast,
        })
    }

    pub fn demand(&self) -> &[f64] {
        &self.demand
    }

    pub fn forecast(&self) -> &[f64] {
        &self.forecast
    }

    pub fn len(&self) -> usize {
        self.demand.len()
    }

    pub fn is_empty(&self) -> bool {
        self.demand.is_empty()
    }

    /// Keep at most the first `horizon` periods
    pub fn truncate(&mut self, horizon: usize) {
        self.demand.truncate(horizon);
        self.forecast.truncate(horizon);
    }

    pub fn mean_demand(&self) -> f64 {
        if self.demand.is_empty() {
            return 0.0;
        }
        self.demand.iter().sum::<f64>() / self.demand.len() as f64
    }

    /// Population standard deviation of demand (denominator N)
    pub fn std_demand(&self) -> f64 {
        if self.demand.is_empty() {
            return 0.0;
        }
        let mean = self.mean_demand();
        let variance = self
            .demand
            .iter()
            .map(|d| (d - mean).powi(2))
            .sum::<f64>()
            / self.demand.len() as f64;
        variance.sqrt()
    }
}

/// Per-group demand and forecast-error statistics
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CalibrationRecord {
    pub group_id: String,
    pub n_obs: usize,
    pub mean_demand: f64,
    pub std_demand: f64,
    pub mean_error: f64,
    pub std_error: f64,
}

/// Result of a single simulated period
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PeriodRecord {
    pub period: usize,
    pub demand: f64,
    pub forecast: f64,
    pub sales: f64,
    pub lost_sales: f64,
    pub ending_inventory: f64,
    pub order_qty: f64,
    pub arrivals: f64,
}

impl PeriodRecord {
    /// On-hand inventory after arrivals and before demand
    pub fn inventory_start(&self) -> f64 {
        self.ending_inventory + self.sales
    }
}

/// Complete per-period history of one simulation run
#[derive(Clone, Debug, PartialEq)]
pub struct RunResult {
    pub run_id: usize,
    pub periods: Vec<PeriodRecord>,
}

impl RunResult {
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn demand(&self) -> Vec<f64> {
        self.periods.iter().map(|p| p.demand).collect()
    }

    pub fn total_demand(&self) -> f64 {
        self.periods.iter().map(|p| p.demand).sum()
    }

    pub fn total_sales(&self) -> f64 {
        self.periods.iter().map(|p| p.sales).sum()
    }

    pub fn total_lost_sales(&self) -> f64 {
        self.periods.iter().map(|p| p.lost_sales).sum()
    }
}

/// Outcome metrics tracked for every run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    FillRate,
    StockoutEvent,
    StockoutVolume,
    HoldingCost,
    Turnover,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::FillRate,
        Metric::StockoutEvent,
        Metric::StockoutVolume,
        Metric::HoldingCost,
        Metric::Turnover,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::FillRate => "fill_rate",
            Metric::StockoutEvent => "stockout_event",
            Metric::StockoutVolume => "stockout_volume",
            Metric::HoldingCost => "holding_cost",
            Metric::Turnover => "turnover",
        }
    }
}

/// Metrics of one run; `None` marks an undefined ratio
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunMetrics {
    pub fill_rate: Option<f64>,
    pub stockout_event: Option<f64>,
    pub stockout_volume: Option<f64>,
    pub holding_cost: f64,
    pub turnover: Option<f64>,
}

impl RunMetrics {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::FillRate => self.fill_rate,
            Metric::StockoutEvent => self.stockout_event,
            Metric::StockoutVolume => self.stockout_volume,
            Metric::HoldingCost => Some(self.holding_cost),
            Metric::Turnover => self.turnover,
        }
    }
}

/// Cross-run mean with a normal-approximation 95% confidence interval
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MetricEstimate {
    pub mean: f64,
    pub ci_low: f64,
    pub ci_high: f64,
    pub valid_runs: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MetricRow {
    pub metric: Metric,
    /// `None` when no run produced a defined value
    pub estimate: Option<MetricEstimate>,
}

/// Aggregated metrics, one row per tracked metric in `Metric::ALL` order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetricSummary {
    pub rows: Vec<MetricRow>,
}

impl MetricSummary {
    pub fn get(&self, metric: Metric) -> Option<&MetricEstimate> {
        self.rows
            .iter()
            .find(|row| row.metric == metric)
            .and_then(|row| row.estimate.as_ref())
    }

    pub fn mean(&self, metric: Metric) -> Option<f64> {
        self.get(metric).map(|e| e.mean)
    }
}
