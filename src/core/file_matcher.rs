//! Scans a flat source folder and copies the files whose names reference a
//! known serial number into a per-project folder.

use super::error::{CoreError, CoreResult};
use super::{MatchSet, ProjectId};
use filetime::FileTime;
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Maximum number of unmatched filenames kept for diagnostics.
pub const DEFAULT_UNMATCHED_SAMPLES: usize = 20;

fn separator_regex() -> &'static Regex {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    SEPARATORS.get_or_init(|| Regex::new(r"[_\-.\s]+").expect("separator pattern is valid"))
}

/// Splits an extension-less filename on runs of `_`, `-`, `.` or whitespace.
pub fn filename_tokens(stem: &str) -> Vec<&str> {
    separator_regex()
        .split(stem)
        .filter(|token| !token.is_empty())
        .collect()
}

/// A file matches when any of its tokens, or its whole stem, is in the set.
pub fn is_match(stem: &str, match_set: &MatchSet) -> bool {
    filename_tokens(stem)
        .into_iter()
        .any(|token| match_set.contains(token))
        || match_set.contains(stem)
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UnmatchedSample {
    pub file_name: String,
    pub tokens: Vec<String>,
}

/// Outcome of a copy run.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CopyReport {
    /// Regular files looked at in the source folder.
    pub scanned: usize,
    /// Files copied into `destination`.
    pub copied: usize,
    pub destination: PathBuf,
    pub unmatched_samples: Vec<UnmatchedSample>,
}

impl CopyReport {
    pub fn summary(&self) -> String {
        format!(
            "Done: copied {}/{} files to {}",
            self.copied,
            self.scanned,
            self.destination.display()
        )
    }
}

pub struct FileCopier {
    sample_limit: usize,
}

impl Default for FileCopier {
    fn default() -> Self {
        Self::new(DEFAULT_UNMATCHED_SAMPLES)
    }
}

impl FileCopier {
    pub fn new(sample_limit: usize) -> Self {
        Self { sample_limit }
    }

    /// Copies every regular file of `source` that matches `match_set` into
    /// `source/<project>`.
    ///
    /// The destination is wiped and recreated first. Subdirectories of
    /// `source` are not descended into. Files copied before an I/O failure
    /// stay where they are.
    pub fn copy_matching_files(
        &self,
        source: &Path,
        project: &ProjectId,
        match_set: &MatchSet,
    ) -> CoreResult<CopyReport> {
        check_source_folder(source)?;

        let destination = source.join(project.to_string());
        reset_destination(&destination)?;
        tracing::info!("Match set has {} values", match_set.len());

        let mut entries: Vec<PathBuf> = fs::read_dir(source)
            .map_err(|e| CoreError::Io(e, source.to_path_buf()))?
            .map(|entry| {
                entry
                    .map(|e| e.path())
                    .map_err(|e| CoreError::Io(e, source.to_path_buf()))
            })
            .collect::<CoreResult<_>>()?;
        entries.sort();

        let mut report = CopyReport {
            scanned: 0,
            copied: 0,
            destination: destination.clone(),
            unmatched_samples: Vec::new(),
        };

        for path in entries {
            if !path.is_file() {
                continue;
            }
            let Some(file_name) = path.file_name() else {
                continue;
            };
            report.scanned += 1;

            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();

            if is_match(&stem, match_set) {
                let target = destination.join(file_name);
                copy_with_metadata(&path, &target)?;
                report.copied += 1;
                tracing::info!(
                    "Copied {} -> {}/",
                    file_name.to_string_lossy(),
                    destination.display()
                );
            } else if report.unmatched_samples.len() < self.sample_limit {
                report.unmatched_samples.push(UnmatchedSample {
                    file_name: file_name.to_string_lossy().into_owned(),
                    tokens: filename_tokens(&stem).into_iter().map(String::from).collect(),
                });
            }
        }

        if !report.unmatched_samples.is_empty() {
            let lines: Vec<String> = report
                .unmatched_samples
                .iter()
                .map(|s| format!("  {}  ->  parts: {:?}", s.file_name, s.tokens))
                .collect();
            tracing::info!("Sample UNMATCHED files:\n{}", lines.join("\n"));
        }

        tracing::info!("{}", report.summary());
        Ok(report)
    }
}

/// Fails unless `source` is an existing directory.
pub fn check_source_folder(source: &Path) -> CoreResult<()> {
    if !source.exists() {
        return Err(CoreError::SourceNotFound(source.to_path_buf()));
    }
    if !source.is_dir() {
        return Err(CoreError::NotADirectory(source.to_path_buf()));
    }
    Ok(())
}

/// Copies with the default sample limit.
pub fn copy_matching_files(
    source: &Path,
    project: &ProjectId,
    match_set: &MatchSet,
) -> CoreResult<CopyReport> {
    FileCopier::default().copy_matching_files(source, project, match_set)
}

/// Anything other than a directory at `destination` belongs to the user and
/// is left alone.
fn reset_destination(destination: &Path) -> CoreResult<()> {
    if destination.is_dir() {
        fs::remove_dir_all(destination).map_err(|e| CoreError::Io(e, destination.to_path_buf()))?;
    } else if destination.symlink_metadata().is_ok() {
        return Err(CoreError::NotADirectory(destination.to_path_buf()));
    }
    fs::create_dir_all(destination).map_err(|e| CoreError::Io(e, destination.to_path_buf()))
}

/// `fs::copy` carries contents and permissions; the modification time is
/// set by path so read-only copies need no write handle.
fn copy_with_metadata(from: &Path, to: &Path) -> CoreResult<()> {
    fs::copy(from, to).map_err(|e| CoreError::Io(e, to.to_path_buf()))?;
    let metadata = fs::metadata(from).map_err(|e| CoreError::Io(e, from.to_path_buf()))?;
    filetime::set_file_mtime(to, FileTime::from_last_modification_time(&metadata))
        .map_err(|e| CoreError::Io(e, to.to_path_buf()))
}
