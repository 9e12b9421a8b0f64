use crate::core::edge::Edge;
use crate::error::DetectionError;
use crate::io::validation::{validate_and_clean, RawRow, REQUIRED_COLUMNS};
use std::io::Read as StdRead;
use std::path::Path;

/// Parse and validate a CSV transaction batch from a reader.
///
/// Header is required; `transaction_id, sender_id, receiver_id, amount,
/// timestamp` must all be present, extra columns are ignored. Returns
/// the cleaned edge list plus any non-fatal per-row issues.
pub fn read_edges<R: StdRead>(reader: R) -> Result<(Vec<Edge>, Vec<String>), DetectionError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| DetectionError::validation(vec![format!("failed to read header row: {e}")]))?
        .clone();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| format!("missing required column: {col}"))
        .collect();
    if !missing.is_empty() {
        return Err(DetectionError::validation(missing));
    }

    let mut rows = Vec::new();
    for result in csv_reader.records() {
        let record =
            result.map_err(|e| DetectionError::validation(vec![format!("malformed row: {e}")]))?;
        let get = |name: &str| -> String {
            headers
                .iter()
                .position(|h| h == name)
                .and_then(|i| record.get(i))
                .unwrap_or("")
                .to_string()
        };
        rows.push(RawRow {
            transaction_id: get("transaction_id"),
            sender_id: get("sender_id"),
            receiver_id: get("receiver_id"),
            amount: get("amount"),
            timestamp: get("timestamp"),
        });
    }

    validate_and_clean(rows)
}

pub fn read_edges_from_path(path: &Path) -> Result<(Vec<Edge>, Vec<String>), DetectionError> {
    let file = std::fs::File::open(path)
        .map_err(|e| DetectionError::processing(format!("failed to open {path:?}: {e}")))?;
    read_edges(file)
}
