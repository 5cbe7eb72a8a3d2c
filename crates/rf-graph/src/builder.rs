//! Incremental graph builder.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use rf_core::{CompId, PortId, RuntimeOptions};

use crate::component::{Active, Behavior, Component, Passive};
use crate::error::{GraphError, GraphResult};
use crate::graph::Graph;
use crate::port::{Port, Side};
use crate::validate;

/// Builder for one graph version.
///
/// Add ports first, then components that list them (inputs first). Every
/// construction violation is reported by the call that causes it, except
/// for incomplete wiring, which `build()` checks.
pub struct GraphBuilder<T> {
    ports: BTreeMap<PortId, Arc<Port<T>>>,
    components: BTreeMap<CompId, Arc<Component<T>>>,
    options: RuntimeOptions,
}

impl<T> Default for GraphBuilder<T> {
    fn default() -> Self {
        Self::with_options(RuntimeOptions::default())
    }
}

impl<T> GraphBuilder<T> {
    /// Create a new empty builder with default runtime options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder whose components all use `options`.
    pub fn with_options(options: RuntimeOptions) -> Self {
        Self {
            ports: BTreeMap::new(),
            components: BTreeMap::new(),
            options,
        }
    }

    pub fn options(&self) -> RuntimeOptions {
        self.options
    }

    /// Add an unconnected port.
    pub fn add_port(&mut self, id: impl Into<PortId>) -> GraphResult<PortId> {
        let id = id.into();
        if self.ports.contains_key(&id) {
            return Err(GraphError::DuplicatePort(id));
        }
        self.ports.insert(id.clone(), Arc::new(Port::new(id.clone())));
        Ok(id)
    }

    /// Add a component and attach it to `ports`.
    ///
    /// The component consumes from the first `num_inputs` ports and produces
    /// into the rest.
    pub fn add_component(
        &mut self,
        id: CompId,
        behavior: Behavior<T>,
        num_inputs: usize,
        ports: &[PortId],
    ) -> GraphResult<CompId> {
        if self.components.contains_key(&id) {
            return Err(GraphError::DuplicateComponent(id));
        }
        if num_inputs > ports.len() {
            return Err(GraphError::TooManyInputs {
                comp: id,
                num_inputs,
                count: ports.len(),
            });
        }

        let mut seen = HashSet::new();
        let mut resolved = Vec::with_capacity(ports.len());
        for (i, port_id) in ports.iter().enumerate() {
            if !seen.insert(port_id) {
                return Err(GraphError::PortListedTwice {
                    comp: id,
                    port: port_id.clone(),
                });
            }
            let port = self
                .ports
                .get(port_id)
                .ok_or_else(|| GraphError::UnknownPort {
                    comp: id.clone(),
                    port: port_id.clone(),
                })?;
            let side = if i < num_inputs {
                Side::Consumer
            } else {
                Side::Producer
            };
            if let Some(existing) = port.endpoint_id(side) {
                return Err(GraphError::PortAlreadyBound {
                    port: port_id.clone(),
                    side,
                    existing,
                });
            }
            resolved.push((Arc::clone(port), side));
        }

        let comp = Arc::new(Component::new(
            id.clone(),
            num_inputs,
            resolved.iter().map(|(port, _)| Arc::clone(port)).collect(),
            behavior,
            self.options,
        ));
        for (port, side) in &resolved {
            port.bind(*side, &comp);
        }
        self.components.insert(id.clone(), comp);
        Ok(id)
    }

    /// Shorthand for `add_component` with an active behavior.
    pub fn add_active(
        &mut self,
        id: CompId,
        task: impl Active<T> + 'static,
        num_inputs: usize,
        ports: &[PortId],
    ) -> GraphResult<CompId> {
        self.add_component(id, Behavior::active(task), num_inputs, ports)
    }

    /// Shorthand for `add_component` with a passive behavior.
    pub fn add_passive(
        &mut self,
        id: CompId,
        handler: impl Passive<T> + 'static,
        num_inputs: usize,
        ports: &[PortId],
    ) -> GraphResult<CompId> {
        self.add_component(id, Behavior::passive(handler), num_inputs, ports)
    }

    /// Validate the wiring and freeze the builder into a `Graph`.
    pub fn build(self) -> GraphResult<Graph<T>> {
        validate::validate_ports(&self.ports)?;
        Ok(Graph {
            ports: self.ports,
            components: self.components,
        })
    }
}
