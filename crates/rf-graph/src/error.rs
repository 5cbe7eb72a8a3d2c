//! Graph-specific error types.

use rf_core::{CompId, PortId};
use thiserror::Error;

use crate::port::Side;

pub type GraphResult<T> = Result<T, GraphError>;

/// Graph construction errors. All of them are raised while a graph version
/// is being built, never during an update.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Port {0} already exists")]
    DuplicatePort(PortId),

    #[error("Component {0} already exists")]
    DuplicateComponent(CompId),

    #[error("Component {comp} refers to non-existent port {port}")]
    UnknownPort { comp: CompId, port: PortId },

    #[error("Component {comp} lists port {port} more than once")]
    PortListedTwice { comp: CompId, port: PortId },

    #[error("Component {comp} declares {num_inputs} inputs but has only {count} ports")]
    TooManyInputs {
        comp: CompId,
        num_inputs: usize,
        count: usize,
    },

    #[error("Port {port} already has {side} {existing}")]
    PortAlreadyBound {
        port: PortId,
        side: Side,
        existing: CompId,
    },

    #[error("Port {port} has no {side}")]
    Unbound { port: PortId, side: Side },

    /// Data only moves across an edge between an active and a passive
    /// component: the active side drives the passive side's handlers.
    #[error("Port {port} must connect exactly one active and one passive component")]
    EndpointKinds { port: PortId },
}

/// Data-path errors raised by port operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PortError {
    #[error("Port {port} has no live {side}")]
    Disconnected { port: PortId, side: Side },

    #[error("Component {comp} behind port {port} is not passive")]
    NotPassive { comp: CompId, port: PortId },

    #[error("Component {comp} cannot {op} on port {port}")]
    WrongDirection {
        comp: CompId,
        port: PortId,
        op: &'static str,
    },

    #[error("Passive component has no {op} slot {slot}")]
    NoSlot { op: &'static str, slot: usize },

    #[error("Queue behind the port is closed")]
    Closed,
}

/// Component lifecycle and run-loop errors.
#[derive(Error, Debug)]
pub enum ComponentError {
    /// The component was stopped while waiting on a port. Run loops return
    /// this to exit; the harness does not treat it as a failure.
    #[error("Component {0} was stopped")]
    Stopped(CompId),

    #[error("Component {comp} has no {direction} {index}")]
    NoSuchPort {
        comp: CompId,
        direction: &'static str,
        index: usize,
    },

    #[error("Component {0} was not settled during the update pass")]
    Unsettled(CompId),

    #[error("Failed to spawn worker for component {comp}")]
    Spawn {
        comp: CompId,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Port(#[from] PortError),

    #[error("{message}")]
    Failed { message: String },
}

impl ComponentError {
    /// Convenience constructor for component implementations.
    pub fn failed(message: impl Into<String>) -> Self {
        ComponentError::Failed {
            message: message.into(),
        }
    }
}
