//! Defines the per-session state shared between the host and its tasks.

use crate::config::AppConfig;
use crate::core::FetchSession;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Reasons the state refuses to start an operation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("A fetch is already running.")]
    FetchInProgress,
    #[error("A copy is already running.")]
    CopyInProgress,
    #[error("Fetch a project before copying.")]
    NothingToMatch,
}

/// Holds the mutable state of one session.
///
/// This struct is wrapped in an `Arc<Mutex<...>>` so the host and the
/// background tasks can both reach it. Independent sessions use independent
/// instances.
#[derive(Default)]
pub struct AppState {
    /// The application's configuration settings.
    pub config: AppConfig,
    /// Where `config` is persisted. `None` means the platform default.
    pub config_path: Option<PathBuf>,
    /// The result of the most recent successful fetch.
    session: Option<Arc<FetchSession>>,
    /// `true` while a fetch is running.
    pub is_fetching: bool,
    /// `true` while a copy is running.
    pub is_copying: bool,
    /// The last status line reported by a task.
    pub status: String,
}

impl AppState {
    pub fn new(config: AppConfig, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
            ..Default::default()
        }
    }

    pub fn session(&self) -> Option<&Arc<FetchSession>> {
        self.session.as_ref()
    }

    /// Marks a fetch as running and forgets the previous session, so its
    /// match set can never be used once a new project has been requested.
    pub fn begin_fetch(&mut self) -> Result<(), StateError> {
        if self.is_fetching {
            return Err(StateError::FetchInProgress);
        }
        if self.is_copying {
            return Err(StateError::CopyInProgress);
        }
        self.is_fetching = true;
        self.session = None;
        Ok(())
    }

    /// Ends a fetch. A successful one installs its session.
    pub fn finish_fetch(&mut self, session: Option<FetchSession>) -> Option<Arc<FetchSession>> {
        self.is_fetching = false;
        self.session = session.map(Arc::new);
        self.session.clone()
    }

    /// Marks a copy as running and hands out the session to copy for. A
    /// session with no match values still copies, matching nothing.
    pub fn begin_copy(&mut self) -> Result<Arc<FetchSession>, StateError> {
        if self.is_fetching {
            return Err(StateError::FetchInProgress);
        }
        if self.is_copying {
            return Err(StateError::CopyInProgress);
        }
        let session = self.session.clone().ok_or(StateError::NothingToMatch)?;
        self.is_copying = true;
        Ok(session)
    }

    pub fn finish_copy(&mut self) {
        self.is_copying = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ProjectId, Record};
    use serde_json::json;

    fn session(project: u64, qrcode: &str) -> FetchSession {
        let serials: Vec<Record> =
            serde_json::from_value(json!([{ "id": 1, "qrcodes": qrcode }])).unwrap();
        FetchSession::new(ProjectId::new(project), Vec::new(), serials)
    }

    #[test]
    fn test_copy_requires_a_session() {
        let mut state = AppState::default();
        assert_eq!(state.begin_copy().unwrap_err(), StateError::NothingToMatch);
    }

    #[test]
    fn test_copy_allowed_with_empty_match_set() {
        let mut state = AppState::default();
        state.begin_fetch().unwrap();
        state.finish_fetch(Some(FetchSession::new(ProjectId::new(1), Vec::new(), Vec::new())));

        let session = state.begin_copy().unwrap();

        assert!(session.match_set().is_empty());
        assert!(state.is_copying);
    }

    #[test]
    fn test_new_fetch_drops_previous_session() {
        let mut state = AppState::default();
        state.begin_fetch().unwrap();
        state.finish_fetch(Some(session(1, "F1")));
        assert!(state.session().is_some());

        state.begin_fetch().unwrap();
        assert!(state.session().is_none());
        state.finish_fetch(None);
        assert_eq!(state.begin_copy().unwrap_err(), StateError::NothingToMatch);
    }

    #[test]
    fn test_session_is_replaced_not_merged() {
        let mut state = AppState::default();
        state.begin_fetch().unwrap();
        state.finish_fetch(Some(session(1, "F1")));
        state.begin_fetch().unwrap();
        state.finish_fetch(Some(session(2, "F2")));

        let current = state.begin_copy().unwrap();
        assert_eq!(current.project(), ProjectId::new(2));
        assert!(current.match_set().contains("F2"));
        assert!(!current.match_set().contains("F1"));
    }

    #[test]
    fn test_operations_are_serialized() {
        let mut state = AppState::default();
        state.begin_fetch().unwrap();
        assert_eq!(state.begin_fetch().unwrap_err(), StateError::FetchInProgress);
        assert_eq!(state.begin_copy().unwrap_err(), StateError::FetchInProgress);
        state.finish_fetch(Some(session(1, "F1")));

        state.begin_copy().unwrap();
        assert_eq!(state.begin_fetch().unwrap_err(), StateError::CopyInProgress);
        assert_eq!(state.begin_copy().unwrap_err(), StateError::CopyInProgress);
        state.finish_copy();
        assert!(state.begin_fetch().is_ok());
    }
}
