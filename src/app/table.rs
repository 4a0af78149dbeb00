//! Searchable tabular views over fetched records.

use crate::core::{scalar_to_string, Record};
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;

/// Columns shown for equipment, when present.
pub const EQUIPMENT_COLUMNS: &[&str] = &["displayname", "name", "serial_number_ids"];
/// Columns shown for serial numbers, when present.
pub const SERIAL_NUMBER_COLUMNS: &[&str] = &["displayname", "qrcodes", "id"];

const MAX_CELL_WIDTH: usize = 48;

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct TableView {
    columns: Vec<String>,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TableView {
    /// Projects `records` onto table rows.
    ///
    /// With `preferred` columns, only those present on the first record are
    /// kept, in the given order. Without, every key of the first record is a
    /// column.
    pub fn load(records: &[Record], preferred: Option<&[&str]>) -> Self {
        let Some(first) = records.first() else {
            return Self::default();
        };

        let columns: Vec<String> = match preferred {
            Some(cols) if !cols.is_empty() => cols
                .iter()
                .filter(|c| first.contains_key(**c))
                .map(|c| c.to_string())
                .collect(),
            _ => first.keys().cloned().collect(),
        };
        let headers = columns.iter().map(|c| header_title(c)).collect();
        let rows = records
            .iter()
            .map(|record| columns.iter().map(|c| cell_text(record.get(c))).collect())
            .collect();

        Self {
            columns,
            headers,
            rows,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
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

    /// Rows where any cell contains `query`, ignoring case. A blank query
    /// keeps every row.
    pub fn filter(&self, query: &str) -> Vec<&Vec<String>> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.rows.iter().collect();
        }
        self.rows
            .par_iter()
            .filter(|row| row.iter().any(|cell| cell.to_lowercase().contains(&query)))
            .collect()
    }

    /// Plain-text rendering of `rows` under this table's headers.
    pub fn render(&self, rows: &[&Vec<String>]) -> String {
        if self.columns.is_empty() {
            return String::from("(no rows)\n");
        }

        let widths: Vec<usize> = (0..self.columns.len())
            .map(|i| {
                rows.iter()
                    .map(|row| row[i].chars().count())
                    .chain(std::iter::once(self.headers[i].chars().count()))
                    .max()
                    .unwrap_or(0)
                    .min(MAX_CELL_WIDTH)
            })
            .collect();

        let mut out = String::new();
        push_line(&mut out, &self.headers, &widths);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        push_line(&mut out, &rule, &widths);
        for row in rows {
            push_line(&mut out, row, &widths);
        }
        out.push_str(&format!("{} rows\n", rows.len()));
        out
    }
}

/// `serial_number_ids` -> `Serial Number Ids`.
pub fn header_title(column: &str) -> String {
    column
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None => String::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(scalar_to_string)
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => scalar_to_string(other),
    }
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let clipped: String = if cell.chars().count() > *width {
                cell.chars().take(width.saturating_sub(1)).chain(['…']).collect()
            } else {
                cell.clone()
            };
            format!("{:<width$}", clipped, width = *width)
        })
        .collect();
    out.push_str(padded.join("  ").trim_end());
    out.push('\n');
}
