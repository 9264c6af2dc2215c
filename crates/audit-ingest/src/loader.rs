//! Loading the parsed-input contract from JSON.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use audit_model::AnalysisInput;
use tracing::{debug, warn};

use crate::error::{IngestError, Result};

/// Read an [`AnalysisInput`] payload from a JSON file.
pub fn load_input(path: &Path) -> Result<AnalysisInput> {
    let text = std::fs::read_to_string(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_input(&text)
}

/// Read an [`AnalysisInput`] payload from any reader (stdin, sockets, ...).
pub fn read_input<R: Read>(reader: R) -> Result<AnalysisInput> {
    let input: AnalysisInput =
        serde_json::from_reader(reader).map_err(|source| IngestError::Payload { source })?;
    Ok(reconcile_columns(input))
}

/// Parse an [`AnalysisInput`] payload from a JSON string.
pub fn parse_input(text: &str) -> Result<AnalysisInput> {
    let input: AnalysisInput =
        serde_json::from_str(text).map_err(|source| IngestError::Payload { source })?;
    Ok(reconcile_columns(input))
}

/// Make `column_names` cover every key that appears in a row.
///
/// Keys missing from the header list are appended in sorted order so that
/// detection sees every column the rows actually carry.
pub fn reconcile_columns(mut input: AnalysisInput) -> AnalysisInput {
    let known: BTreeSet<String> = input.column_names.iter().cloned().collect();
    let mut extra = BTreeSet::new();
    for row in &input.rows {
        for column in row.cells.keys() {
            if !known.contains(column) {
                extra.insert(column.clone());
            }
        }
    }
    if !extra.is_empty() {
        if !known.is_empty() {
            warn!(
                count = extra.len(),
                "rows contain columns absent from the header list"
            );
        }
        input.column_names.extend(extra);
    }
    debug!(
        columns = input.column_names.len(),
        rows = input.rows.len(),
        "loaded analysis input"
    );
    input
}
