//! Normalizes the different response shapes the API uses for collections.

use super::Record;
use serde_json::Value;

/// Mapping keys that may hold the item list, tried in this order.
pub const ENVELOPE_KEYS: &[&str] = &["data", "results", "items", "serialnumbers", "rows"];

/// Returns the item list carried by a response body.
///
/// A bare list is returned as-is. A mapping is searched with [`ENVELOPE_KEYS`]
/// and the first key holding a list wins. Anything else yields no items.
pub fn extract_items(body: &Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items.clone(),
        Value::Object(map) => ENVELOPE_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))
            .cloned()
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Keeps the object items of a page, dropping anything else.
pub fn into_records(items: Vec<Value>) -> Vec<Record> {
    let total = items.len();
    let records: Vec<Record> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect();
    if records.len() != total {
        tracing::debug!(
            "Dropped {} non-object item(s) from a page of {}",
            total - records.len(),
            total
        );
    }
    records
}
