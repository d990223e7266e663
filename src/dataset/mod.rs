//! Flow dataset ingestion: CSV loading, row cleaning and feature extraction.

mod loader;

pub use loader::{load_dataset, load_flows, read_flows};

use crate::error::PipelineError;
use crate::features::{FeatureMatrix, FeatureSchema};
use serde::Serialize;
use std::collections::HashSet;

/// Value substituted for `inf` / `-inf` cells, as the CIC exports contain them
/// for zero-duration flows.
pub const INF_REPLACEMENT: f64 = 1e6;

/// Cell spellings treated as missing (compared case-insensitively).
const MISSING_MARKERS: [&str; 9] = ["", "nan", "-nan", "na", "n/a", "#n/a", "<na>", "null", "none"];

/// Raw flow rows as read from CSV, headers trimmed.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CleanStats {
    pub rows_read: usize,
    pub dropped_missing: usize,
    pub dropped_duplicates: usize,
    pub rows_kept: usize,
}

impl FlowTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.columns.iter().position(|c| c.trim() == name)
    }

    /// Cells of one column in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|r| r.get(idx).map(String::as_str).unwrap_or(""))
                .collect(),
        )
    }

    /// Drop rows with any missing cell, then duplicates (first kept).
    ///
    /// Rows are compared on trimmed cells, numeric cells by value, so `5`,
    /// ` 5` and `5.0` are the same.
    pub fn clean(self) -> (FlowTable, CleanStats) {
        let rows_read = self.rows.len();
        let complete: Vec<Vec<String>> = self
            .rows
            .into_iter()
            .filter(|row| !row.iter().any(|c| is_missing(c)))
            .collect();
        let dropped_missing = rows_read - complete.len();

        let mut seen = HashSet::with_capacity(complete.len());
        let mut rows = Vec::with_capacity(complete.len());
        for row in complete {
            if seen.insert(row_key(&row)) {
                rows.push(row);
            }
        }
        let dropped_duplicates = rows_read - dropped_missing - rows.len();

        let stats = CleanStats {
            rows_read,
            dropped_missing,
            dropped_duplicates,
            rows_kept: rows.len(),
        };
        (
            FlowTable {
                columns: self.columns,
                rows,
            },
            stats,
        )
    }

    /// Numeric matrix of the schema's columns, in schema order.
    pub fn feature_matrix(&self, schema: &FeatureSchema) -> Result<FeatureMatrix, PipelineError> {
        let indices = schema.resolve(self.columns.as_slice())?;
        let mut matrix = FeatureMatrix::zeros((self.rows.len(), indices.len()));
        for (i, row) in self.rows.iter().enumerate() {
            for (j, &col) in indices.iter().enumerate() {
                let raw = row.get(col).map(String::as_str).unwrap_or("");
                matrix[[i, j]] = parse_cell(raw).ok_or_else(|| PipelineError::Parse {
                    row: i,
                    column: self.columns[col].clone(),
                    value: raw.to_string(),
                })?;
            }
        }
        Ok(matrix)
    }
}

fn is_missing(cell: &str) -> bool {
    let cell = cell.trim();
    MISSING_MARKERS.iter().any(|m| cell.eq_ignore_ascii_case(m))
}

fn row_key(row: &[String]) -> Vec<String> {
    row.iter()
        .map(|cell| {
            let cell = cell.trim();
            match cell.parse::<f64>() {
                // -0.0 and 0.0 compare equal
                Ok(v) if v == 0.0 => "0".to_string(),
                Ok(v) => format!("{v:?}"),
                Err(_) => cell.to_string(),
            }
        })
        .collect()
}

/// Finite number, with either infinity mapped to `INF_REPLACEMENT`.
fn parse_cell(raw: &str) -> Option<f64> {
    let v: f64 = raw.trim().parse().ok()?;
    if v.is_nan() {
        None
    } else if v.is_infinite() {
        Some(INF_REPLACEMENT)
    } else {
        Some(v)
    }
}
