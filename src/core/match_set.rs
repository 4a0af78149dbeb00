//! Flattens serial-number records into the token set used for file matching.

use super::{scalar_to_string, Record};
use serde_json::Value;
use std::collections::HashSet;

/// Serial-number fields whose values identify a unit.
pub const MATCH_FIELDS: &[&str] = &["id", "qrcodes", "serial", "displayname", "ref"];

/// A set of trimmed, non-empty tokens.
///
/// The empty string can never be a member, so an empty filename token never
/// matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchSet {
    tokens: HashSet<String>,
}

impl MatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a token after trimming it. Returns `false` for blank or known tokens.
    pub fn insert(&mut self, token: &str) -> bool {
        let token = token.trim();
        if token.is_empty() {
            return false;
        }
        self.tokens.insert(token.to_string())
    }

    pub fn contains(&self, token: &str) -> bool {
        !token.is_empty() && self.tokens.contains(token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }
}

impl<'a> FromIterator<&'a str> for MatchSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut set = MatchSet::new();
        for token in iter {
            set.insert(token);
        }
        set
    }
}

/// Builds a [`MatchSet`] from the [`MATCH_FIELDS`] of every record.
///
/// Each field value is split on commas, so `"F105304,R20000009413"` yields two
/// tokens. List values contribute each of their elements the same way.
pub fn build_match_set(records: &[Record]) -> MatchSet {
    let mut set = MatchSet::new();
    for record in records {
        for field in MATCH_FIELDS {
            match record.get(*field) {
                None | Some(Value::Null) => {}
                Some(Value::Array(values)) => {
                    for value in values.iter().filter(|v| !v.is_null()) {
                        add_comma_separated(&mut set, &scalar_to_string(value));
                    }
                }
                Some(value) => add_comma_separated(&mut set, &scalar_to_string(value)),
            }
        }
    }
    tracing::info!("Built match set with {} unique values", set.len());
    set
}

fn add_comma_separated(set: &mut MatchSet, value: &str) {
    for part in value.split(',') {
        set.insert(part);
    }
}
