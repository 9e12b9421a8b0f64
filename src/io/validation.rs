use crate::core::account::AccountId;
use crate::core::edge::Edge;
use crate::error::DetectionError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::str::FromStr;

/// One row of the input CSV before type parsing or normalization.
#[derive(Debug, Clone)]
pub struct RawRow {
    pub transaction_id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub amount: String,
    pub timestamp: String,
}

/// The required columns, in no particular order; extra columns in the
/// source file are ignored.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "transaction_id",
    "sender_id",
    "receiver_id",
    "amount",
    "timestamp",
];

/// Validate and clean a raw row set into the edge list the graph
/// builder expects: required fields present, amount numeric and
/// positive, timestamps parsed, duplicate transaction ids removed,
/// self-loops removed, account ids trimmed and upper-cased.
///
/// A malformed individual row is dropped and recorded as an issue
/// rather than failing the whole batch; only an empty input, or an
/// input that yields zero valid edges, is a hard `DetectionError`.
pub fn validate_and_clean(rows: Vec<RawRow>) -> Result<(Vec<Edge>, Vec<String>), DetectionError> {
    if rows.is_empty() {
        return Err(DetectionError::validation(vec![
            "input is empty".to_string()
        ]));
    }

    let mut issues = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut edges = Vec::new();

    for row in rows {
        match validate_row(&row, &mut seen_ids) {
            Ok(edge) => edges.push(edge),
            Err(issue) => issues.push(issue),
        }
    }

    if edges.is_empty() {
        let mut all = vec!["no valid edges after cleaning".to_string()];
        all.extend(issues);
        return Err(DetectionError::validation(all));
    }

    Ok((edges, issues))
}

fn validate_row(row: &RawRow, seen_ids: &mut HashSet<String>) -> Result<Edge, String> {
    if row.transaction_id.trim().is_empty() {
        return Err("missing transaction_id".to_string());
    }
    if !seen_ids.insert(row.transaction_id.clone()) {
        return Err(format!("duplicate transaction_id {}", row.transaction_id));
    }

    let sender = AccountId::normalize(&row.sender_id);
    let receiver = AccountId::normalize(&row.receiver_id);
    if row.sender_id.trim().is_empty() || row.receiver_id.trim().is_empty() {
        return Err(format!(
            "missing account id on transaction {}",
            row.transaction_id
        ));
    }
    if sender == receiver {
        return Err(format!(
            "self-loop on transaction {} ({sender})",
            row.transaction_id
        ));
    }

    let amount = Decimal::from_str(row.amount.trim()).map_err(|_| {
        format!(
            "non-numeric amount {:?} on transaction {}",
            row.amount, row.transaction_id
        )
    })?;
    if amount <= Decimal::ZERO {
        return Err(format!(
            "non-positive amount on transaction {}",
            row.transaction_id
        ));
    }

    let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| {
        format!(
            "unparseable timestamp {:?} on transaction {}",
            row.timestamp, row.transaction_id
        )
    })?;

    Ok(Edge::new(
        row.transaction_id.clone(),
        sender,
        receiver,
        amount,
        timestamp,
    ))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw.trim()) {
        return Some(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}
