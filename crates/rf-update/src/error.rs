//! Error types for update passes.

use std::time::Duration;

use rf_core::{CompId, PortId};
use rf_graph::ComponentError;
use thiserror::Error;

use crate::linearization::Element;

pub type UpdateResult<T> = Result<T, UpdateError>;

/// Errors that abort an update pass.
///
/// Apart from `PortLayoutChanged`, which is detected before anything is
/// touched, an aborted pass leaves the live graph with whatever elements
/// were already processed. Components that were running keep running.
#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("Component {comp} changes its port layout between versions ({live:?} -> {candidate:?})")]
    PortLayoutChanged {
        comp: CompId,
        live: Vec<PortId>,
        candidate: Vec<PortId>,
    },

    #[error("Linearization refers to {0}, which is not in the running graph")]
    UnknownElement(Element),

    #[error("Linearization visits {0} more than once")]
    DuplicateVisit(Element),

    #[error("Components never settled during the update pass: {}", list_ids(.0))]
    Unsettled(Vec<CompId>),

    #[error("Quiescence condition '{label}' not reached after {waited:?}")]
    QuiescenceTimeout { label: String, waited: Duration },

    #[error("Failed to start component: {0}")]
    Start(#[from] ComponentError),

    #[error("Failed to spawn the update control thread")]
    ControlThread(#[source] std::io::Error),

    #[error("Update service is no longer running")]
    ServiceClosed,
}

fn list_ids(ids: &[CompId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
