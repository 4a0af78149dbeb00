//! Defines the custom error type for the `core` module.

use std::path::PathBuf;
use thiserror::Error;

/// Coarse grouping of [`CoreError`] variants, used by hosts to decide how to
/// present a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Detected before any network call: token or project id problems.
    Configuration,
    /// Anything that went wrong talking to the remote API.
    Transport,
    /// Source directory problems or failures while copying.
    Filesystem,
}

/// The primary error type for the `core` module.
///
/// Every pipeline operation either returns its complete result or one of
/// these. There is no partial result on failure.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No API token was supplied, or it was blank.
    #[error("RENTMAN_TOKEN is not set. Add it to a .env file or the environment.")]
    MissingToken,

    /// The project identifier is not a number.
    #[error("'{0}' is not a valid project id")]
    InvalidProjectId(String),

    /// The HTTP client could not be initialised.
    #[error("could not set up the HTTP client: {0}")]
    ClientSetup(#[source] reqwest::Error),

    /// The request could not be sent or the response body could not be read.
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    /// The response body was not valid JSON.
    #[error("invalid JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The source directory does not exist.
    #[error("Source folder does not exist: {0}")]
    SourceNotFound(PathBuf),

    /// Represents a path that was expected to be a directory but was not.
    #[error("Path is not a valid directory: {0}")]
    NotADirectory(PathBuf),

    /// Represents an I/O error, typically from file system operations.
    #[error("I/O error for path {1}: {0}")]
    Io(#[source] std::io::Error, PathBuf),
}

impl CoreError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CoreError::MissingToken | CoreError::InvalidProjectId(_) => {
                ErrorCategory::Configuration
            }
            CoreError::ClientSetup(_)
            | CoreError::Http { .. }
            | CoreError::Status { .. }
            | CoreError::Decode { .. } => ErrorCategory::Transport,
            CoreError::SourceNotFound(_) | CoreError::NotADirectory(_) | CoreError::Io(..) => {
                ErrorCategory::Filesystem
            }
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
