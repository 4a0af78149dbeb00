//! Derives serial-number ids from equipment records.

use super::{scalar_to_string, Record, SerialId};
use serde_json::Value;
use std::collections::HashSet;

/// Keys that may carry serial-number references on an equipment record.
///
/// Probed left to right; the first key holding a non-null value is the only
/// one read for that record.
pub const SERIAL_ID_KEYS: &[&str] = &[
    "serial_number_ids",
    "serial_number_id",
    "serialnumber_ids",
    "serialnumber_id",
    "serialnumber",
    "serial_numbers",
    "serial_numbers_ids",
    "id",
];

/// Returns the unique serial ids referenced by `records`, in first-seen order.
///
/// Empty and whitespace-only values are dropped. A record without any of the
/// [`SERIAL_ID_KEYS`] contributes nothing.
pub fn extract_serial_ids(records: &[Record]) -> Vec<SerialId> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for record in records {
        for id in ids_from_record(record) {
            if !id.is_empty() && seen.insert(id.clone()) {
                out.push(id);
            }
        }
    }

    tracing::info!(
        "Extracted {} unique serial ids from {} items.",
        out.len(),
        records.len()
    );
    out
}

fn ids_from_record(record: &Record) -> Vec<String> {
    let Some(value) = SERIAL_ID_KEYS
        .iter()
        .find_map(|key| record.get(*key).filter(|v| !v.is_null()))
    else {
        return Vec::new();
    };

    match value {
        // "123,456,789"
        Value::String(joined) => joined
            .split(',')
            .map(|part| part.trim().to_string())
            .collect(),
        Value::Array(values) => values
            .iter()
            .filter(|v| !v.is_null())
            .map(|v| scalar_to_string(v).trim().to_string())
            .collect(),
        other => vec![scalar_to_string(other).trim().to_string()],
    }
}
