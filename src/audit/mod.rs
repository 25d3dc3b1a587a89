//! Audit orchestration module
//!
//! Coordinates the audit pipeline from URL input to report output: crawl
//! discovery, module dispatch, plugin execution, and the immutable
//! `AuditStore` snapshot handed to the output layer.

mod orchestrator;
mod state;

pub use orchestrator::{Orchestrator, Stats};
pub use state::{AuditState, PauseSet};
