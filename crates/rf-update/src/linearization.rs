//! Drain orders: the sequence in which an update pass visits graph elements.
//!
//! A linearization is pulled one element at a time. Pulling may block, for
//! instance until a buffer has drained, so readiness is decided by the
//! application while the orchestrator only enforces the order. A
//! linearization is consumed by a single pass and cannot be restarted.

use core::fmt;
use std::collections::VecDeque;
use std::thread;
use std::time::{Duration, Instant};

use rf_core::{CompId, PortId};
use rf_graph::Graph;
use tracing::debug;

use crate::error::{UpdateError, UpdateResult};

/// Default sleep between two evaluations of a quiescence predicate.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// A reference to one element of the running graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Element {
    Port(PortId),
    Component(CompId),
}

impl Element {
    pub fn port(id: impl Into<PortId>) -> Self {
        Element::Port(id.into())
    }

    pub fn component(id: CompId) -> Self {
        Element::Component(id)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Port(id) => write!(f, "port {id}"),
            Element::Component(id) => write!(f, "component {id}"),
        }
    }
}

/// Pull-based source of the elements visited by one update pass.
pub trait Linearization<T> {
    /// Next element to visit, or `None` when the sequence is exhausted.
    ///
    /// `live` is the running graph as the pass has left it so far. May
    /// block; an error aborts the pass.
    fn next_element(&mut self, live: &Graph<T>) -> UpdateResult<Option<Element>>;
}

impl<T, L: Linearization<T> + ?Sized> Linearization<T> for Box<L> {
    fn next_element(&mut self, live: &Graph<T>) -> UpdateResult<Option<Element>> {
        (**self).next_element(live)
    }
}

/// Adapts a plain iterator of elements. Never blocks.
pub struct Elements<I>(pub I);

impl<T, I: Iterator<Item = Element>> Linearization<T> for Elements<I> {
    fn next_element(&mut self, _live: &Graph<T>) -> UpdateResult<Option<Element>> {
        Ok(self.0.next())
    }
}

type Predicate<T> = Box<dyn FnMut(&Graph<T>) -> bool + Send>;

enum Step<T> {
    Visit(Element),
    Wait {
        label: String,
        predicate: Predicate<T>,
        limit: Option<Duration>,
    },
}

/// Declarative drain order: element visits interleaved with quiescence
/// waits.
///
/// ```
/// use rf_core::CompId;
/// use rf_update::DrainOrder;
///
/// let buffer = CompId::new("buffer", "1");
/// let drained = buffer.clone();
/// let order: DrainOrder<u32> = DrainOrder::new()
///     .component(CompId::new("producer", "1"))
///     .port("a")
///     .wait_until("buffer drained", move |g| {
///         g.component(&drained).is_none_or(|c| c.size() == 0)
///     })
///     .component(buffer)
///     .port("b")
///     .component(CompId::new("consumer", "1"));
/// assert_eq!(order.len(), 6);
/// ```
pub struct DrainOrder<T> {
    steps: VecDeque<Step<T>>,
    poll_interval: Duration,
}

impl<T> Default for DrainOrder<T> {
    fn default() -> Self {
        Self {
            steps: VecDeque::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl<T> DrainOrder<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// How long to sleep between predicate evaluations.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn element(mut self, element: Element) -> Self {
        self.steps.push_back(Step::Visit(element));
        self
    }

    pub fn port(self, id: impl Into<PortId>) -> Self {
        self.element(Element::port(id))
    }

    pub fn component(self, id: CompId) -> Self {
        self.element(Element::Component(id))
    }

    /// Block the sequence until `predicate` holds on the live graph.
    pub fn wait_until(
        self,
        label: impl Into<String>,
        predicate: impl FnMut(&Graph<T>) -> bool + Send + 'static,
    ) -> Self {
        self.push_wait(label.into(), Box::new(predicate), None)
    }

    /// Like `wait_until`, but give up after `limit` and abort the pass.
    pub fn wait_until_within(
        self,
        label: impl Into<String>,
        predicate: impl FnMut(&Graph<T>) -> bool + Send + 'static,
        limit: Duration,
    ) -> Self {
        self.push_wait(label.into(), Box::new(predicate), Some(limit))
    }

    fn push_wait(mut self, label: String, predicate: Predicate<T>, limit: Option<Duration>) -> Self {
        self.steps.push_back(Step::Wait {
            label,
            predicate,
            limit,
        });
        self
    }

    /// Remaining steps, waits included.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn wait(
        &self,
        label: String,
        mut predicate: Predicate<T>,
        limit: Option<Duration>,
        live: &Graph<T>,
    ) -> UpdateResult<()> {
        let started = Instant::now();
        loop {
            if predicate(live) {
                debug!(condition = %label, waited = ?started.elapsed(), "quiescent");
                return Ok(());
            }
            let waited = started.elapsed();
            if limit.is_some_and(|limit| waited >= limit) {
                return Err(UpdateError::QuiescenceTimeout { label, waited });
            }
            debug!(condition = %label, waited = ?waited, "waiting for quiescence");
            thread::sleep(self.poll_interval);
        }
    }
}

impl<T> Linearization<T> for DrainOrder<T> {
    fn next_element(&mut self, live: &Graph<T>) -> UpdateResult<Option<Element>> {
        while let Some(step) = self.steps.pop_front() {
            match step {
                Step::Visit(element) => return Ok(Some(element)),
                Step::Wait {
                    label,
                    predicate,
                    limit,
                } => self.wait(label, predicate, limit, live)?,
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn element_display() {
        assert_eq!(Element::port("a").to_string(), "port a");
        assert_eq!(
            Element::component(CompId::new("buffer", "1")).to_string(),
            "component buffer (1)"
        );
    }

    #[test]
    fn elements_adapter_yields_in_order() {
        let graph: Graph<u32> = Graph::default();
        let mut order = Elements(vec![Element::port("a"), Element::port("b")].into_iter());
        assert_eq!(order.next_element(&graph).unwrap(), Some(Element::port("a")));
        assert_eq!(order.next_element(&graph).unwrap(), Some(Element::port("b")));
        assert_eq!(order.next_element(&graph).unwrap(), None);
    }

    #[test]
    fn wait_blocks_until_predicate_holds() {
        let graph: Graph<u32> = Graph::default();
        let polls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&polls);
        let mut order = DrainOrder::new()
            .poll_interval(Duration::from_millis(1))
            .port("a")
            .wait_until("third poll", move |_| counter.fetch_add(1, Ordering::SeqCst) >= 2)
            .port("b");

        assert_eq!(order.next_element(&graph).unwrap(), Some(Element::port("a")));
        assert_eq!(polls.load(Ordering::SeqCst), 0);
        assert_eq!(order.next_element(&graph).unwrap(), Some(Element::port("b")));
        assert_eq!(polls.load(Ordering::SeqCst), 3);
        assert_eq!(order.next_element(&graph).unwrap(), None);
        assert!(order.is_empty());
    }

    #[test]
    fn bounded_wait_times_out() {
        let graph: Graph<u32> = Graph::default();
        let mut order = DrainOrder::new()
            .poll_interval(Duration::from_millis(2))
            .wait_until_within("never", |_| false, Duration::from_millis(20))
            .port("a");
        match order.next_element(&graph) {
            Err(UpdateError::QuiescenceTimeout { label, waited }) => {
                assert_eq!(label, "never");
                assert!(waited >= Duration::from_millis(20));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn boxed_linearization_delegates() {
        let graph: Graph<u32> = Graph::default();
        let mut boxed: Box<dyn Linearization<u32> + Send> =
            Box::new(DrainOrder::new().port("a"));
        assert_eq!(boxed.next_element(&graph).unwrap(), Some(Element::port("a")));
        assert_eq!(boxed.next_element(&graph).unwrap(), None);
    }
}
