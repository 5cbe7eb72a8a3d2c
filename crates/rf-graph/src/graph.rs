//! The graph: one version of an application's components and ports.

use core::fmt;
use std::collections::BTreeMap;
use std::sync::Arc;

use rf_core::{CompId, PortId};
use tracing::info;

use crate::component::Component;
use crate::error::ComponentError;
use crate::port::Port;

/// All components and ports of one application version.
///
/// Entries are keyed by id and iterated in id order, so every scan over the
/// graph is deterministic. Outside of construction, only the update
/// orchestrator inserts or removes entries.
pub struct Graph<T> {
    pub(crate) ports: BTreeMap<PortId, Arc<Port<T>>>,
    pub(crate) components: BTreeMap<CompId, Arc<Component<T>>>,
}

impl<T> Default for Graph<T> {
    fn default() -> Self {
        Self {
            ports: BTreeMap::new(),
            components: BTreeMap::new(),
        }
    }
}

impl<T> fmt::Debug for Graph<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("ports", &self.ports.keys().collect::<Vec<_>>())
            .field("components", &self.components.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<T> Graph<T> {
    pub fn ports(&self) -> impl Iterator<Item = &Arc<Port<T>>> {
        self.ports.values()
    }

    pub fn port_ids(&self) -> impl Iterator<Item = &PortId> {
        self.ports.keys()
    }

    pub fn components(&self) -> impl Iterator<Item = &Arc<Component<T>>> {
        self.components.values()
    }

    pub fn component_ids(&self) -> impl Iterator<Item = &CompId> {
        self.components.keys()
    }

    pub fn port(&self, id: &PortId) -> Option<&Arc<Port<T>>> {
        self.ports.get(id)
    }

    pub fn component(&self, id: &CompId) -> Option<&Arc<Component<T>>> {
        self.components.get(id)
    }

    /// First component (in id order) with the given name, whatever its version.
    pub fn component_named(&self, name: &str) -> Option<&Arc<Component<T>>> {
        self.components.values().find(|c| c.id().name() == name)
    }

    pub fn contains_port(&self, id: &PortId) -> bool {
        self.ports.contains_key(id)
    }

    pub fn contains_component(&self, id: &CompId) -> bool {
        self.components.contains_key(id)
    }

    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Insert a port taken from another graph version. Update orchestrator only.
    pub fn insert_port(&mut self, port: Arc<Port<T>>) -> Option<Arc<Port<T>>> {
        self.ports.insert(port.id().clone(), port)
    }

    /// Update orchestrator only.
    pub fn remove_port(&mut self, id: &PortId) -> Option<Arc<Port<T>>> {
        self.ports.remove(id)
    }

    /// Insert a component taken from another graph version. Update orchestrator only.
    pub fn insert_component(&mut self, comp: Arc<Component<T>>) -> Option<Arc<Component<T>>> {
        self.components.insert(comp.id().clone(), comp)
    }

    /// Update orchestrator only.
    pub fn remove_component(&mut self, id: &CompId) -> Option<Arc<Component<T>>> {
        self.components.remove(id)
    }

    /// Ask every component to stop. Does not wait for workers.
    pub fn stop(&self) {
        for comp in self.components.values() {
            comp.stop();
        }
    }

    /// Stop every component and wait for all workers to exit.
    pub fn shutdown(&self) {
        self.stop();
        for comp in self.components.values() {
            comp.join();
        }
        info!(components = self.components.len(), "graph shut down");
    }
}

impl<T: Send + 'static> Graph<T> {
    /// Start every component that is not running yet.
    pub fn start(&self) -> Result<(), ComponentError> {
        for comp in self.components.values() {
            if !comp.is_running() {
                comp.start()?;
            }
        }
        info!(
            components = self.components.len(),
            ports = self.ports.len(),
            "graph started"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GraphBuilder;
    use crate::testing::{Idle, Mailbox};

    fn sample() -> Graph<u32> {
        let mut b = GraphBuilder::new();
        let a = b.add_port("a").unwrap();
        b.add_active(CompId::new("src", "1"), Idle, 0, &[a.clone()])
            .unwrap();
        b.add_passive(CompId::new("box", "1"), Mailbox::default(), 1, &[a])
            .unwrap();
        b.build().unwrap()
    }

    #[test]
    fn lookups() {
        let graph = sample();
        assert_eq!(graph.port_count(), 1);
        assert_eq!(graph.component_count(), 2);
        assert!(graph.contains_port(&PortId::from("a")));
        assert!(graph.contains_component(&CompId::new("src", "1")));
        assert!(!graph.contains_component(&CompId::new("src", "2")));
        assert_eq!(
            graph.component_named("box").map(|c| c.id().clone()),
            Some(CompId::new("box", "1"))
        );
        let ids: Vec<_> = graph.component_ids().map(|id| id.name().to_string()).collect();
        assert_eq!(ids, vec!["box", "src"]);
    }

    #[test]
    fn start_and_shutdown() {
        let graph = sample();
        graph.start().unwrap();
        assert!(graph.components().all(|c| c.is_running()));
        graph.shutdown();
        assert!(graph.components().all(|c| !c.is_running() && c.worker_finished()));
    }

    #[test]
    fn remove_and_insert() {
        let mut graph = sample();
        let port = graph.remove_port(&PortId::from("a")).unwrap();
        assert!(!graph.contains_port(&PortId::from("a")));
        assert!(graph.insert_port(port).is_none());
        let comp = graph.remove_component(&CompId::new("src", "1")).unwrap();
        assert_eq!(graph.component_count(), 1);
        assert!(graph.insert_component(comp).is_none());
    }
}
