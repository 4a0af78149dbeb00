//! The fetch pipeline and the session it produces.

use super::api::{RentmanClient, Transport};
use super::error::CoreResult;
use super::file_matcher::{CopyReport, FileCopier};
use super::identifiers::extract_serial_ids;
use super::match_set::{build_match_set, MatchSet};
use super::{ProjectId, Record, SerialId};
use std::path::Path;

/// Everything one fetch produced for a project.
///
/// The match set can only be reached through the session that built it, so
/// a copy always runs against the project it was fetched for. A new fetch
/// yields a new session; nothing is merged.
#[derive(Debug, Clone)]
pub struct FetchSession {
    project: ProjectId,
    pub equipment: Vec<Record>,
    pub serial_ids: Vec<SerialId>,
    pub serial_numbers: Vec<Record>,
    match_set: MatchSet,
}

impl FetchSession {
    pub fn new(project: ProjectId, equipment: Vec<Record>, serial_numbers: Vec<Record>) -> Self {
        let serial_ids = extract_serial_ids(&equipment);
        let match_set = build_match_set(&serial_numbers);
        Self {
            project,
            equipment,
            serial_ids,
            serial_numbers,
            match_set,
        }
    }

    pub fn project(&self) -> ProjectId {
        self.project
    }

    pub fn match_set(&self) -> &MatchSet {
        &self.match_set
    }

    /// One-line summary suitable for a status bar.
    pub fn summary(&self) -> String {
        format!(
            "{} equipment items  |  {} serial numbers",
            self.equipment.len(),
            self.serial_numbers.len()
        )
    }

    /// Copies the files of `source` that reference this session's serial
    /// numbers into `source/<project>`.
    pub fn copy_matching_files(&self, source: &Path, copier: &FileCopier) -> CoreResult<CopyReport> {
        copier.copy_matching_files(source, &self.project, &self.match_set)
    }
}

/// Runs equipment fetch, id extraction, detail fetch and match-set build.
///
/// `progress` receives short status lines as the pipeline advances. Zero
/// equipment or zero serial ids produce an empty session, not an error.
pub fn fetch_project<T, F>(
    client: &RentmanClient<T>,
    project: ProjectId,
    progress: F,
) -> CoreResult<FetchSession>
where
    T: Transport,
    F: Fn(String),
{
    progress("Fetching equipment…".to_string());
    let equipment = client.fetch_equipment(project)?;

    let serial_ids = extract_serial_ids(&equipment);
    let serial_numbers = if serial_ids.is_empty() {
        Vec::new()
    } else {
        progress(format!("Fetching {} serial numbers…", serial_ids.len()));
        client.fetch_serial_details(&serial_ids)?
    };

    let session = FetchSession::new(project, equipment, serial_numbers);
    progress(session.summary());
    Ok(session)
}
