//! Ports: the edges of a running graph.
//!
//! A port never owns its endpoints. It holds weak references to the producer
//! and the consumer and routes data operations to whichever of them is
//! passive: `put` goes to the consumer, `get` goes to the producer.

use core::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, Weak};
use std::time::Duration;

use rf_core::{CompId, PortId};

use crate::component::Component;
use crate::error::PortError;
use crate::sync::{read, write};

/// Which end of a port a component sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Producer,
    Consumer,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Producer, Side::Consumer];
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Producer => f.write_str("producer"),
            Side::Consumer => f.write_str("consumer"),
        }
    }
}

/// Outcome of a bounded put.
#[derive(Debug, PartialEq, Eq)]
pub enum Offer<T> {
    Accepted,
    /// The consumer stayed full for the whole timeout; the value is handed
    /// back so the caller can retry or decide what to do with it.
    TimedOut(T),
}

struct Link<T> {
    id: CompId,
    comp: Weak<Component<T>>,
}

impl<T> Clone for Link<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            comp: Weak::clone(&self.comp),
        }
    }
}

/// A unidirectional connection between one producer and one consumer.
pub struct Port<T> {
    id: PortId,
    producer: RwLock<Option<Link<T>>>,
    consumer: RwLock<Option<Link<T>>>,
    settled: AtomicBool,
}

impl<T> fmt::Debug for Port<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Port")
            .field("id", &self.id)
            .field("producer", &self.producer_id())
            .field("consumer", &self.consumer_id())
            .field("settled", &self.settled.load(Ordering::Acquire))
            .finish()
    }
}

impl<T> Port<T> {
    pub(crate) fn new(id: PortId) -> Self {
        Self {
            id,
            producer: RwLock::new(None),
            consumer: RwLock::new(None),
            settled: AtomicBool::new(true),
        }
    }

    pub fn id(&self) -> &PortId {
        &self.id
    }

    fn slot(&self, side: Side) -> &RwLock<Option<Link<T>>> {
        match side {
            Side::Producer => &self.producer,
            Side::Consumer => &self.consumer,
        }
    }

    fn link(&self, side: Side) -> Option<Link<T>> {
        read(self.slot(side)).clone()
    }

    /// Identity of the component on `side`, even if it has since been dropped.
    pub fn endpoint_id(&self, side: Side) -> Option<CompId> {
        read(self.slot(side)).as_ref().map(|link| link.id.clone())
    }

    pub fn producer_id(&self) -> Option<CompId> {
        self.endpoint_id(Side::Producer)
    }

    pub fn consumer_id(&self) -> Option<CompId> {
        self.endpoint_id(Side::Consumer)
    }

    /// The live component on `side`, if it still exists.
    pub fn endpoint(&self, side: Side) -> Option<Arc<Component<T>>> {
        read(self.slot(side))
            .as_ref()
            .and_then(|link| link.comp.upgrade())
    }

    pub fn producer(&self) -> Option<Arc<Component<T>>> {
        self.endpoint(Side::Producer)
    }

    pub fn consumer(&self) -> Option<Arc<Component<T>>> {
        self.endpoint(Side::Consumer)
    }

    pub(crate) fn bind(&self, side: Side, comp: &Arc<Component<T>>) {
        *write(self.slot(side)) = Some(Link {
            id: comp.id().clone(),
            comp: Arc::downgrade(comp),
        });
    }

    fn live_endpoint(&self, side: Side) -> Result<Arc<Component<T>>, PortError> {
        self.endpoint(side).ok_or_else(|| PortError::Disconnected {
            port: self.id.clone(),
            side,
        })
    }

    /// The port's own flag, without looking at its endpoints.
    pub fn is_marked_settled(&self) -> bool {
        self.settled.load(Ordering::Acquire)
    }

    pub fn mark_settled(&self) {
        self.settled.store(true, Ordering::Release);
    }

    pub fn mark_unsettled(&self) {
        self.settled.store(false, Ordering::Release);
    }

    /// True iff the port's own flag is set and both endpoints are settled.
    ///
    /// A missing endpoint counts as unsettled.
    pub fn is_settled(&self) -> bool {
        self.is_marked_settled()
            && Side::BOTH
                .into_iter()
                .all(|side| self.endpoint(side).is_some_and(|comp| comp.is_settled()))
    }

    /// Blocking put, delivered to the consumer. Blocks as long as the
    /// consumer applies back-pressure.
    pub fn put(&self, value: T) -> Result<(), PortError> {
        self.live_endpoint(Side::Consumer)?.accept(&self.id, value)
    }

    /// Put that gives up after `timeout`, returning the value to the caller.
    pub fn offer(&self, value: T, timeout: Duration) -> Result<Offer<T>, PortError> {
        self.live_endpoint(Side::Consumer)?
            .offer(&self.id, value, timeout)
    }

    /// Get from the producer, waiting at most `timeout`. `Ok(None)` means no
    /// value arrived in time and is not an error.
    pub fn get(&self, timeout: Duration) -> Result<Option<T>, PortError> {
        self.live_endpoint(Side::Producer)?
            .deliver(&self.id, timeout)
    }

    /// Reconnect this (live) port to the endpoints `target` declares.
    ///
    /// Only endpoints whose identity differs are replaced. A newly attached
    /// component gets this port object swapped into its own port list, so it
    /// and any worker it starts share the live port. Returns whether any
    /// endpoint changed; calling it again with the same target is a no-op.
    pub fn rewire(self: &Arc<Self>, target: &Port<T>) -> bool {
        let mut changed = false;
        for side in Side::BOTH {
            let Some(next) = target.link(side) else {
                continue;
            };
            if self.endpoint_id(side).as_ref() == Some(&next.id) {
                continue;
            }
            if let Some(comp) = next.comp.upgrade() {
                comp.relink(self);
            }
            *write(self.slot(side)) = Some(next);
            changed = true;
        }
        changed
    }
}
