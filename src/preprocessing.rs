//! Loading and cleaning of raw store inventory CSV data.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::calibration::{CATEGORY_CANDIDATES, SKU_CANDIDATES};
use crate::error::{Result, SimulationError};
use crate::models::{DemandRecord, DemandTable};

const DATE_COLUMN: &str = "Date";
const STORE_COLUMN: &str = "Store ID";
const UNITS_COLUMN: &str = "Units Sold";
const FORECAST_COLUMN: &str = "Demand Forecast";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Which store's rows to keep
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreSelection {
    /// Alphabetically first store id
    #[default]
    FirstAlphabetical,
    Named(String),
}

/// One CSV row before cleaning; demand fields may be missing
#[derive(Clone, Debug, PartialEq)]
pub struct RawDemandRow {
    pub date: NaiveDate,
    pub store_id: String,
    pub product_id: Option<String>,
    pub category: Option<String>,
    pub units_sold: Option<f64>,
    pub demand_forecast: Option<f64>,
}

#[derive(Clone, Debug, Default)]
pub struct RawDemandTable {
    pub columns: Vec<String>,
    pub rows: Vec<RawDemandRow>,
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| SimulationError::MissingColumn(name.to_string()))
}

fn first_present(headers: &csv::StringRecord, candidates: &[&str]) -> Option<(usize, String)> {
    candidates.iter().find_map(|candidate| {
        headers
            .iter()
            .position(|h| h.trim() == *candidate)
            .map(|idx| (idx, candidate.to_string()))
    })
}

fn optional_text(record: &csv::StringRecord, idx: Option<usize>) -> Option<String> {
    idx.and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn optional_number(record: &csv::StringRecord, idx: usize, row: usize) -> Result<Option<f64>> {
    let field = record.get(idx).map(str::trim).unwrap_or("");
    if field.is_empty() {
        return Ok(None);
    }
    field
        .parse::<f64>()
        .map(Some)
        .map_err(|e| SimulationError::InvalidRecord {
            row,
            message: format!("'{}' is not a number: {}", field, e),
        })
}

/// Read a headered inventory CSV.
///
/// `Date`, `Store ID`, `Units Sold` and `Demand Forecast` are required; the
/// first category-like and SKU-like headers found are read when present.
pub fn load_demand_csv<P: AsRef<Path>>(path: P) -> Result<RawDemandTable> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    read_demand_csv(&mut reader)
}

pub fn read_demand_csv<R: std::io::Read>(reader: &mut csv::Reader<R>) -> Result<RawDemandTable> {
    let headers = reader.headers()?.clone();

    let date_idx = column_index(&headers, DATE_COLUMN)?;
    let store_idx = column_index(&headers, STORE_COLUMN)?;
    let units_idx = column_index(&headers, UNITS_COLUMN)?;
    let forecast_idx = column_index(&headers, FORECAST_COLUMN)?;
    let category = first_present(&headers, CATEGORY_CANDIDATES);
    let product = first_present(&headers, SKU_CANDIDATES);

    let mut columns: Vec<String> = [DATE_COLUMN, STORE_COLUMN]
        .iter()
        .map(|s| s.to_string())
        .collect();
    columns.extend(product.iter().map(|(_, name)| name.clone()));
    columns.extend(category.iter().map(|(_, name)| name.clone()));
    columns.push(UNITS_COLUMN.to_string());
    columns.push(FORECAST_COLUMN.to_string());

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result?;
        let row = idx + 1;

        let raw_date = record.get(date_idx).map(str::trim).unwrap_or("");
        let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT).map_err(|e| {
            SimulationError::InvalidRecord {
                row,
                message: format!("bad date '{}': {}", raw_date, e),
            }
        })?;

        rows.push(RawDemandRow {
            date,
            store_id: record.get(store_idx).map(str::trim).unwrap_or("").to_string(),
            product_id: optional_text(&record, product.as_ref().map(|(i, _)| *i)),
            category: optional_text(&record, category.as_ref().map(|(i, _)| *i)),
            units_sold: optional_number(&record, units_idx, row)?,
            demand_forecast: optional_number(&record, forecast_idx, row)?,
        });
    }

    debug!(rows = rows.len(), "loaded demand csv");
    Ok(RawDemandTable { columns, rows })
}

/// Drop rows with missing, NaN or negative units sold or forecast
pub fn clean(raw: RawDemandTable) -> DemandTable {
    let total = raw.rows.len();
    let valid = |v: Option<f64>| v.filter(|x| !x.is_nan() && *x >= 0.0);

    let records: Vec<DemandRecord> = raw
        .rows
        .into_iter()
        .filter_map(|row| {
            Some(DemandRecord {
                units_sold: valid(row.units_sold)?,
                demand_forecast: valid(row.demand_forecast)?,
                date: row.date,
                store_id: row.store_id,
                product_id: row.product_id,
                category: row.category,
            })
        })
        .collect();

    debug!(kept = records.len(), dropped = total - records.len(), "cleaned demand rows");
    DemandTable {
        columns: raw.columns,
        records,
    }
}

/// Stable chronological sort
pub fn sort_by_date(mut table: DemandTable) -> DemandTable {
    table.records.sort_by_key(|r| r.date);
    table
}

/// Keep the rows of a single store
pub fn select_store(table: DemandTable, selection: &StoreSelection) -> Result<DemandTable> {
    let store = match selection {
        StoreSelection::FirstAlphabetical => table
            .records
            .iter()
            .map(|r| r.store_id.as_str())
            .min()
            .map(str::to_string)
            .ok_or_else(|| SimulationError::invalid_input("no rows left to select a store from"))?,
        StoreSelection::Named(id) => {
            if !table.records.iter().any(|r| &r.store_id == id) {
                return Err(SimulationError::configuration(format!("store '{}' not found", id)));
            }
            id.clone()
        }
    };

    info!(store = %store, "selected store");
    Ok(DemandTable {
        columns: table.columns,
        records: table
            .records
            .into_iter()
            .filter(|r| r.store_id == store)
            .collect(),
    })
}

/// Load, clean, sort and filter to one store
pub fn preprocess_pipeline<P: AsRef<Path>>(
    path: P,
    selection: &StoreSelection,
) -> Result<DemandTable> {
    let raw = load_demand_csv(path)?;
    select_store(sort_by_date(clean(raw)), selection)
}
