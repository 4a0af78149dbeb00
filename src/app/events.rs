//! Events sent from the background tasks to the host.

use super::view_model::FetchView;
use crate::core::{CopyReport, ErrorCategory};

/// Which long-running operation an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Fetch,
    Copy,
}

#[derive(Debug)]
pub enum PipelineEvent {
    /// A short progress line for a status bar.
    Status(String),
    /// A fetch finished; the new session is already stored in the state.
    FetchCompleted(Box<FetchView>),
    /// A copy run finished.
    CopyCompleted(CopyReport),
    /// An operation failed. `category` is `None` for failures outside the
    /// pipeline itself, such as a worker that panicked.
    Failed {
        operation: Operation,
        category: Option<ErrorCategory>,
        message: String,
    },
}
