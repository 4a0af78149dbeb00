//! Host-facing layer: session state, background tasks and table views.

pub mod events;
pub mod proxy;
pub mod state;
pub mod table;
pub mod tasks;
pub mod view_model;
