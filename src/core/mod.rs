pub mod api;
pub mod envelope;
pub mod error;
pub mod file_matcher;
pub mod identifiers;
pub mod match_set;
pub mod session;

use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// One item of an API collection, e.g. an equipment or serial-number record.
pub type Record = serde_json::Map<String, Value>;

/// A trimmed, non-empty serial-number identifier.
pub type SerialId = String;

/// Numeric project identifier in the rental system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProjectId(u64);

impl ProjectId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl FromStr for ProjectId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        trimmed
            .parse::<u64>()
            .map(ProjectId)
            .map_err(|_| CoreError::InvalidProjectId(trimmed.to_string()))
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Renders a JSON value the way it should appear as an identifier or cell.
///
/// Strings lose their quotes; everything else uses its JSON text.
pub fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub use api::{ApiToken, HttpTransport, RawResponse, RentmanClient, Transport};
pub use envelope::extract_items;
pub use error::{CoreError, CoreResult, ErrorCategory};
pub use file_matcher::{
    check_source_folder, copy_matching_files, CopyReport, FileCopier, UnmatchedSample,
};
pub use identifiers::extract_serial_ids;
pub use match_set::{build_match_set, MatchSet};
pub use session::{fetch_project, FetchSession};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_project_id_parsing() {
        assert_eq!(" 791 ".parse::<ProjectId>().unwrap(), ProjectId::new(791));
        assert!(matches!(
            "abc".parse::<ProjectId>(),
            Err(CoreError::InvalidProjectId(s)) if s == "abc"
        ));
        assert!("".parse::<ProjectId>().is_err());
        assert!("-3".parse::<ProjectId>().is_err());
    }

    #[test]
    fn test_scalar_to_string() {
        assert_eq!(scalar_to_string(&json!("F1")), "F1");
        assert_eq!(scalar_to_string(&json!(12)), "12");
        assert_eq!(scalar_to_string(&json!(true)), "true");
        assert_eq!(scalar_to_string(&Value::Null), "");
    }
}
