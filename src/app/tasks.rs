//! Runs the blocking pipeline operations off the host's thread.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;

use super::events::{Operation, PipelineEvent};
use super::proxy::EventSink;
use super::state::{AppState, StateError};
use super::view_model::FetchView;

use crate::config::settings::save_config;
use crate::core::{fetch_project, CoreError, ProjectId, RentmanClient, Transport};

fn lock(state: &Mutex<AppState>) -> MutexGuard<'_, AppState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn failed<S: EventSink>(sink: &S, operation: Operation, error: &CoreError) {
    tracing::error!("{:?} failed: {}", operation, error);
    sink.send_event(PipelineEvent::Failed {
        operation,
        category: Some(error.category()),
        message: error.to_string(),
    });
}

fn panicked<S: EventSink>(sink: &S, operation: Operation, error: tokio::task::JoinError) {
    tracing::error!("{:?} worker did not finish: {}", operation, error);
    sink.send_event(PipelineEvent::Failed {
        operation,
        category: None,
        message: format!("Worker did not finish: {}", error),
    });
}

/// Starts fetching `project` in the background.
///
/// Must be called from within a Tokio runtime. Refused while another fetch
/// or a copy is running.
pub fn start_fetch<T, S>(
    client: Arc<RentmanClient<T>>,
    project: ProjectId,
    sink: S,
    state: Arc<Mutex<AppState>>,
) -> Result<JoinHandle<()>, StateError>
where
    T: Transport + 'static,
    S: EventSink,
{
    lock(&state).begin_fetch()?;
    sink.send_event(PipelineEvent::Status("Connecting to Rentman API…".to_string()));

    Ok(tokio::spawn(async move {
        let progress_sink = sink.clone();
        let progress_state = state.clone();
        let result = tokio::task::spawn_blocking(move || {
            fetch_project(&*client, project, |status| {
                lock(&progress_state).status = status.clone();
                progress_sink.send_event(PipelineEvent::Status(status));
            })
        })
        .await;

        let mut state_guard = lock(&state);
        match result {
            Ok(Ok(session)) => {
                let view = FetchView::from_session(&session);
                state_guard.status = view.summary.clone();
                state_guard.finish_fetch(Some(session));
                drop(state_guard);
                tracing::info!("Fetch for project {} complete.", project);
                sink.send_event(PipelineEvent::FetchCompleted(Box::new(view)));
            }
            Ok(Err(e)) => {
                state_guard.finish_fetch(None);
                drop(state_guard);
                failed(&sink, Operation::Fetch, &e);
            }
            Err(e) => {
                state_guard.finish_fetch(None);
                drop(state_guard);
                panicked(&sink, Operation::Fetch, e);
            }
        }
    }))
}

/// Starts copying the files of `source` that match the current session.
///
/// Must be called from within a Tokio runtime. Refused without a session,
/// or while another operation is running.
pub fn start_copy<S>(
    source: PathBuf,
    sink: S,
    state: Arc<Mutex<AppState>>,
) -> Result<JoinHandle<()>, StateError>
where
    S: EventSink,
{
    let (session, copier) = {
        let mut state_guard = lock(&state);
        let session = state_guard.begin_copy()?;
        (session, state_guard.config.copier())
    };

    Ok(tokio::spawn(async move {
        let source_for_copy = source.clone();
        let result = tokio::task::spawn_blocking(move || {
            session.copy_matching_files(&source_for_copy, &copier)
        })
        .await;

        let mut state_guard = lock(&state);
        state_guard.finish_copy();
        match result {
            Ok(Ok(report)) => {
                state_guard.status = report.summary();
                state_guard.config.last_source_folder = Some(source);
                let config = state_guard.config.clone();
                let config_path = state_guard.config_path.clone();
                drop(state_guard);
                if let Err(e) = save_config(&config, config_path.as_deref()) {
                    tracing::warn!("Could not remember the source folder: {}", e);
                }
                sink.send_event(PipelineEvent::CopyCompleted(report));
            }
            Ok(Err(e)) => {
                drop(state_guard);
                failed(&sink, Operation::Copy, &e);
            }
            Err(e) => {
                drop(state_guard);
                panicked(&sink, Operation::Copy, e);
            }
        }
    }))
}
