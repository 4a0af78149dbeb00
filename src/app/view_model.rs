//! Prepares fetched data for display.

use super::table::{TableView, EQUIPMENT_COLUMNS, SERIAL_NUMBER_COLUMNS};
use crate::core::{FetchSession, ProjectId};
use serde::Serialize;

/// The two tables and status line shown after a fetch.
#[derive(Debug, Clone, Serialize)]
pub struct FetchView {
    pub project: u64,
    pub equipment: TableView,
    pub serial_numbers: TableView,
    pub match_values: usize,
    pub summary: String,
}

impl FetchView {
    pub fn from_session(session: &FetchSession) -> Self {
        Self {
            project: session.project().get(),
            equipment: TableView::load(&session.equipment, Some(EQUIPMENT_COLUMNS)),
            serial_numbers: TableView::load(&session.serial_numbers, Some(SERIAL_NUMBER_COLUMNS)),
            match_values: session.match_set().len(),
            summary: session.summary(),
        }
    }

    pub fn project_id(&self) -> ProjectId {
        ProjectId::new(self.project)
    }
}
