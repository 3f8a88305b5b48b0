//! Per-group calibration of demand and forecast-error statistics.
//!
//! Groups are product categories when the data has a category-like column,
//! otherwise SKUs. The raw errors (actual - forecast) of every retained group
//! are kept as the bootstrap pool for that group.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info, warn};

use crate::error::{Result, SimulationError};
use crate::models::{CalibrationRecord, DemandRecord, DemandTable};

pub const CATEGORY_CANDIDATES: &[&str] =
    &["Category", "Product Category", "ProductCategory", "category"];
pub const SKU_CANDIDATES: &[&str] = &["SKU", "Product ID", "ProductID", "Item", "item"];

/// Groups with fewer observations are dropped
pub const MIN_OBS_THRESHOLD: usize = 10;

/// Column the data is grouped by, carrying the header name it was found under
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GroupColumn {
    Category(String),
    Sku(String),
}

impl GroupColumn {
    pub fn name(&self) -> &str {
        match self {
            GroupColumn::Category(name) | GroupColumn::Sku(name) => name,
        }
    }

    /// Group id of `record`, if it has one
    pub fn key<'a>(&self, record: &'a DemandRecord) -> Option<&'a str> {
        match self {
            GroupColumn::Category(_) => record.category.as_deref(),
            GroupColumn::Sku(_) => record.product_id.as_deref(),
        }
    }
}

/// Calibration table plus the bootstrap pool of every retained group
#[derive(Clone, Debug, Default)]
pub struct GroupCalibration {
    pub records: Vec<CalibrationRecord>,
    pub error_samples: BTreeMap<String, Vec<f64>>,
    pub total_groups: usize,
    pub dropped_groups: usize,
}

impl GroupCalibration {
    pub fn record(&self, group_id: &str) -> Option<&CalibrationRecord> {
        self.records.iter().find(|r| r.group_id == group_id)
    }

    /// Group with the most observations; the earliest one wins ties
    pub fn largest_group(&self) -> Option<&CalibrationRecord> {
        self.records
            .iter()
            .fold(None, |best: Option<&CalibrationRecord>, record| match best {
                Some(b) if b.n_obs >= record.n_obs => Some(b),
                _ => Some(record),
            })
    }
}

/// Pick the grouping column, preferring categories over SKUs
pub fn infer_group_column(columns: &[String]) -> Result<GroupColumn> {
    let has = |candidate: &str| columns.iter().any(|c| c == candidate);

    if let Some(name) = CATEGORY_CANDIDATES.iter().find(|c| has(**c)) {
        return Ok(GroupColumn::Category(name.to_string()));
    }
    if let Some(name) = SKU_CANDIDATES.iter().find(|c| has(**c)) {
        return Ok(GroupColumn::Sku(name.to_string()));
    }

    Err(SimulationError::configuration(format!(
        "no suitable grouping column found; expected one of {:?} or {:?}, available columns: {:?}",
        CATEGORY_CANDIDATES, SKU_CANDIDATES, columns
    )))
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (N - 1); 0 when fewer than two values
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

pub fn calibrate_by_group(table: &DemandTable, group_column: &GroupColumn) -> GroupCalibration {
    calibrate_by_group_with_threshold(table, group_column, MIN_OBS_THRESHOLD)
}

/// Calibrate every group with at least `min_obs` observations.
/// Groups keep the order in which they first appear in `table`. Records
/// without a group id are never calibrated and together count as one
/// dropped group.
pub fn calibrate_by_group_with_threshold(
    table: &DemandTable,
    group_column: &GroupColumn,
    min_obs: usize,
) -> GroupCalibration {
    let mut order: Vec<&str> = Vec::new();
    let mut members: HashMap<&str, Vec<&DemandRecord>> = HashMap::new();
    let mut unkeyed = 0usize;

    for record in &table.records {
        let Some(key) = group_column.key(record) else {
            unkeyed += 1;
            continue;
        };
        members
            .entry(key)
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(record);
    }

    let mut calibration = GroupCalibration {
        total_groups: order.len(),
        ..GroupCalibration::default()
    };
    if unkeyed > 0 {
        debug!(rows = unkeyed, column = group_column.name(), "records without a group id");
        calibration.total_groups += 1;
        calibration.dropped_groups += 1;
    }

    for group in order {
        let rows = &members[group];
        if rows.len() < min_obs {
            calibration.dropped_groups += 1;
            continue;
        }

        let demand: Vec<f64> = rows.iter().map(|r| r.units_sold).collect();
        let errors: Vec<f64> = rows.iter().map(|r| r.units_sold - r.demand_forecast).collect();

        calibration.records.push(CalibrationRecord {
            group_id: group.to_string(),
            n_obs: rows.len(),
            mean_demand: mean(&demand),
            std_demand: sample_std(&demand),
            mean_error: mean(&errors),
            std_error: sample_std(&errors),
        });
        calibration.error_samples.insert(group.to_string(), errors);
    }

    if calibration.dropped_groups > 0 {
        warn!(
            dropped = calibration.dropped_groups,
            total = calibration.total_groups,
            min_obs,
            "calibration dropped groups with too few observations"
        );
    }
    info!(
        column = group_column.name(),
        groups = calibration.records.len(),
        "calibration complete"
    );

    calibration
}

/// Infer the grouping column and calibrate
pub fn run_calibration(table: &DemandTable) -> Result<(GroupCalibration, GroupColumn)> {
    let group_column = infer_group_column(&table.columns)?;
    let calibration = calibrate_by_group(table, &group_column);
    Ok((calibration, group_column))
}
