//! Per-flow alert summary exported as CSV.

use crate::dataset::FlowTable;
use crate::error::{DetectError, PipelineError};
use crate::scoring::Detection;
use chrono::NaiveDateTime;
use std::io::Write;
use std::path::Path;

/// Source columns copied into the summary when the dataset carries them.
pub const CONTEXT_COLUMNS: [&str; 3] = ["Source IP", "Destination IP", "Flow Duration"];

const TIMESTAMP_COLUMN: &str = "Timestamp";

/// Layouts seen in flow exports; month-first for slashed dates.
const TIMESTAMP_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
];

#[derive(Debug, Clone, PartialEq)]
pub struct AlertRow {
    /// Source timestamp as `YYYY-MM-DD HH:MM:SS[.fff]` (raw cell when it does
    /// not parse), or the row index when the dataset has none
    pub timestamp: String,
    pub anomaly_score: f64,
    pub is_anomaly: bool,
    /// Values of `AlertSummary::context_columns`, same order
    pub context: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlertSummary {
    context_columns: Vec<String>,
    rows: Vec<AlertRow>,
}

impl AlertSummary {
    pub fn build(table: &FlowTable, detection: &Detection) -> Result<Self, DetectError> {
        if table.len() != detection.len() {
            return Err(DetectError::Dimension {
                expected: table.len(),
                actual: detection.len(),
            });
        }

        let timestamps = table.column(TIMESTAMP_COLUMN);
        let context: Vec<(String, Vec<&str>)> = CONTEXT_COLUMNS
            .iter()
            .filter_map(|name| table.column(name).map(|cells| (name.to_string(), cells)))
            .collect();

        let rows = detection
            .scores
            .iter()
            .zip(&detection.labels)
            .enumerate()
            .map(|(i, (&score, label))| AlertRow {
                timestamp: match &timestamps {
                    Some(ts) => normalize_timestamp(ts[i]),
                    None => i.to_string(),
                },
                anomaly_score: score,
                is_anomaly: label.is_anomaly(),
                context: context.iter().map(|(_, cells)| cells[i].to_string()).collect(),
            })
            .collect();

        Ok(Self {
            context_columns: context.into_iter().map(|(name, _)| name).collect(),
            rows,
        })
    }

    pub fn context_columns(&self) -> &[String] {
        &self.context_columns
    }

    pub fn rows(&self) -> &[AlertRow] {
        &self.rows
    }

    pub fn anomalies(&self) -> impl Iterator<Item = &AlertRow> {
        self.rows.iter().filter(|r| r.is_anomaly)
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), PipelineError> {
        let mut csv = csv::Writer::from_writer(writer);
        let mut header = vec![TIMESTAMP_COLUMN, "Anomaly_Score", "Is_Anomaly"];
        header.extend(self.context_columns.iter().map(String::as_str));
        csv.write_record(&header)?;

        for row in &self.rows {
            let mut record = vec![
                row.timestamp.clone(),
                row.anomaly_score.to_string(),
                row.is_anomaly.to_string(),
            ];
            record.extend(row.context.iter().cloned());
            csv.write_record(&record)?;
        }
        csv.flush()?;
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), PipelineError> {
        self.write_csv(std::fs::File::create(path)?)
    }
}

fn normalize_timestamp(raw: &str) -> String {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S%.f").to_string())
        .unwrap_or_else(|| raw.to_string())
}
