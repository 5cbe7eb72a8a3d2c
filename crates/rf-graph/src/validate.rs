//! Graph validation logic.

use std::collections::BTreeMap;
use std::sync::Arc;

use rf_core::PortId;

use crate::error::{GraphError, GraphResult};
use crate::port::{Port, Side};

/// Every port must have both endpoints, and exactly one of them must be
/// passive: the active side drives the passive side's handlers.
pub(crate) fn validate_ports<T>(ports: &BTreeMap<PortId, Arc<Port<T>>>) -> GraphResult<()> {
    for port in ports.values() {
        let mut active_ends = 0;
        for side in Side::BOTH {
            let comp = port.endpoint(side).ok_or_else(|| GraphError::Unbound {
                port: port.id().clone(),
                side,
            })?;
            if comp.is_active() {
                active_ends += 1;
            }
        }
        if active_ends != 1 {
            return Err(GraphError::EndpointKinds {
                port: port.id().clone(),
            });
        }
    }
    Ok(())
}
