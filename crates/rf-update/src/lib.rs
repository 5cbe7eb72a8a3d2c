//! rf-update: live updates of a running reflow graph.
//!
//! Provides:
//! - Drain orders (`Linearization`, `DrainOrder`) that say in which order a
//!   pass may touch elements, with quiescence waits in between
//! - `apply_update`, which reconciles a running graph with a candidate
//!   version without stopping the components both versions share
//! - `UpdateService`, a control thread that owns the graph and applies
//!   submitted revisions one at a time

pub mod error;
pub mod linearization;
pub mod orchestrator;
pub mod report;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{UpdateError, UpdateResult};
pub use linearization::{DEFAULT_POLL_INTERVAL, DrainOrder, Element, Elements, Linearization};
pub use orchestrator::apply_update;
pub use report::UpdateReport;
pub use service::{Revision, UpdateHandle, UpdateOutcome, UpdateService};
