use super::{CleanStats, FlowTable};
use crate::error::PipelineError;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Read a flow CSV. Headers are trimmed; cells are kept verbatim.
pub fn read_flows<R: Read>(reader: R) -> Result<FlowTable, PipelineError> {
    let mut csv = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
    let columns: Vec<String> = csv.headers()?.iter().map(|h| h.trim().to_string()).collect();

    let mut rows = Vec::new();
    for record in csv.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(FlowTable::new(columns, rows))
}

pub fn load_flows(path: &Path) -> Result<FlowTable, PipelineError> {
    info!(path = %path.display(), "loading dataset");
    let table = read_flows(std::fs::File::open(path)?)?;
    info!(rows = table.len(), columns = table.columns().len(), "dataset loaded");
    Ok(table)
}

/// Load and clean in one step.
pub fn load_dataset(path: &Path) -> Result<(FlowTable, CleanStats), PipelineError> {
    let (table, stats) = load_flows(path)?.clean();
    info!(
        kept = stats.rows_kept,
        dropped_missing = stats.dropped_missing,
        dropped_duplicates = stats.dropped_duplicates,
        "dataset cleaned"
    );
    Ok((table, stats))
}
