//! Components: the vertices of a running graph.
//!
//! A component is either *active* (it owns a worker thread that loops in
//! [`Active::run`]) or *passive* (its [`Passive`] handlers run on the threads
//! of the active components next to it).

use core::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::JoinHandle;
use std::time::Duration;

use rf_core::{CompId, PortId, RuntimeOptions};
use tracing::{debug, warn};

use crate::error::{ComponentError, PortError};
use crate::harness::{self, RunContext};
use crate::port::{Offer, Port};
use crate::sync::{lock, read, write};

/// Behavior of an active component.
pub trait Active<T>: Send + Sync {
    /// Worker entry point. Implementations loop while `ctx.is_running()`,
    /// doing their blocking work through the context so that the loop
    /// observes `stop()` within one I/O timeout.
    fn run(&self, ctx: &RunContext<T>) -> Result<(), ComponentError>;
}

/// Behavior of a passive component.
///
/// `input` and `output` are indices into the component's input and output
/// port lists respectively.
pub trait Passive<T>: Send + Sync {
    /// Blocking put on an input.
    fn put(&self, input: usize, value: T) -> Result<(), PortError>;

    /// Put on an input that waits at most `timeout` for room.
    fn offer(&self, input: usize, value: T, timeout: Duration) -> Result<Offer<T>, PortError>;

    /// Get from an output, waiting at most `timeout`.
    fn get(&self, output: usize, timeout: Duration) -> Result<Option<T>, PortError>;

    /// Number of items currently held. Only quiescence checks should look at
    /// this; it is a snapshot and never blocks.
    fn size(&self) -> usize {
        0
    }
}

/// Execution style of a component.
pub enum Behavior<T> {
    Active(Arc<dyn Active<T>>),
    Passive(Arc<dyn Passive<T>>),
}

impl<T> Clone for Behavior<T> {
    fn clone(&self) -> Self {
        match self {
            Behavior::Active(task) => Behavior::Active(Arc::clone(task)),
            Behavior::Passive(handler) => Behavior::Passive(Arc::clone(handler)),
        }
    }
}

impl<T> Behavior<T> {
    pub fn active(task: impl Active<T> + 'static) -> Self {
        Behavior::Active(Arc::new(task))
    }

    pub fn passive(handler: impl Passive<T> + 'static) -> Self {
        Behavior::Passive(Arc::new(handler))
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Behavior::Active(_))
    }
}

/// A named unit of computation with ordered ports: the first `num_inputs`
/// are inputs, the rest are outputs.
pub struct Component<T> {
    id: CompId,
    num_inputs: usize,
    ports: RwLock<Vec<Arc<Port<T>>>>,
    behavior: Behavior<T>,
    options: RuntimeOptions,
    running: Arc<AtomicBool>,
    settled: AtomicBool,
    worker: Mutex<Option<JoinHandle<()>>>,
    failure: Arc<Mutex<Option<String>>>,
}

impl<T> fmt::Debug for Component<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ports: Vec<PortId> = self.ports().iter().map(|p| p.id().clone()).collect();
        f.debug_struct("Component")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .field("num_inputs", &self.num_inputs)
            .field("ports", &ports)
            .field("running", &self.is_running())
            .field("settled", &self.is_settled())
            .finish()
    }
}

impl<T> Component<T> {
    pub(crate) fn new(
        id: CompId,
        num_inputs: usize,
        ports: Vec<Arc<Port<T>>>,
        behavior: Behavior<T>,
        options: RuntimeOptions,
    ) -> Self {
        Self {
            id,
            num_inputs,
            ports: RwLock::new(ports),
            behavior,
            options,
            running: Arc::new(AtomicBool::new(false)),
            settled: AtomicBool::new(true),
            worker: Mutex::new(None),
            failure: Arc::new(Mutex::new(None)),
        }
    }

    pub fn id(&self) -> &CompId {
        &self.id
    }

    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    /// Snapshot of the port list (inputs first).
    pub fn ports(&self) -> Vec<Arc<Port<T>>> {
        read(&self.ports).clone()
    }

    pub fn port_ids(&self) -> Vec<PortId> {
        read(&self.ports).iter().map(|p| p.id().clone()).collect()
    }

    pub fn inputs(&self) -> Vec<Arc<Port<T>>> {
        read(&self.ports)[..self.num_inputs].to_vec()
    }

    pub fn outputs(&self) -> Vec<Arc<Port<T>>> {
        read(&self.ports)[self.num_inputs..].to_vec()
    }

    pub fn is_active(&self) -> bool {
        self.behavior.is_active()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn is_settled(&self) -> bool {
        self.settled.load(Ordering::Acquire)
    }

    pub fn mark_settled(&self) {
        self.settled.store(true, Ordering::Release);
    }

    pub fn mark_unsettled(&self) {
        self.settled.store(false, Ordering::Release);
    }

    /// Not running, and every port is settled.
    pub fn startable(&self) -> bool {
        !self.is_running() && read(&self.ports).iter().all(|p| p.is_settled())
    }

    /// Request the component to stop. Cooperative: an active worker exits
    /// the next time it checks its context, at most one I/O timeout later.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            debug!(component = %self.id, "stop requested");
        }
    }

    /// Wait for the worker thread, if any, to exit.
    pub fn join(&self) {
        let handle = lock(&self.worker).take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!(component = %self.id, "worker thread panicked outside the run loop");
            }
        }
    }

    /// True when no worker thread is alive (never started, or exited).
    pub fn worker_finished(&self) -> bool {
        lock(&self.worker)
            .as_ref()
            .is_none_or(|handle| handle.is_finished())
    }

    /// End-of-pass check: the component must have been settled during the
    /// pass. Clears the flag for the next pass.
    pub fn settle(&self) -> Result<(), ComponentError> {
        if self.settled.swap(false, Ordering::AcqRel) {
            Ok(())
        } else {
            Err(ComponentError::Unsettled(self.id.clone()))
        }
    }

    /// Items held by a passive component; always 0 for active ones.
    pub fn size(&self) -> usize {
        match &self.behavior {
            Behavior::Passive(handler) => handler.size(),
            Behavior::Active(_) => 0,
        }
    }

    /// Last failure recorded by the worker, if its run loop crashed.
    pub fn failure(&self) -> Option<String> {
        lock(&self.failure).clone()
    }

    fn position(&self, port: &PortId) -> Option<usize> {
        read(&self.ports).iter().position(|p| p.id() == port)
    }

    fn passive(&self, port: &PortId) -> Result<&Arc<dyn Passive<T>>, PortError> {
        match &self.behavior {
            Behavior::Passive(handler) => Ok(handler),
            Behavior::Active(_) => Err(PortError::NotPassive {
                comp: self.id.clone(),
                port: port.clone(),
            }),
        }
    }

    fn input_slot(&self, port: &PortId, op: &'static str) -> Result<usize, PortError> {
        match self.position(port) {
            Some(i) if i < self.num_inputs => Ok(i),
            _ => Err(PortError::WrongDirection {
                comp: self.id.clone(),
                port: port.clone(),
                op,
            }),
        }
    }

    fn output_slot(&self, port: &PortId, op: &'static str) -> Result<usize, PortError> {
        match self.position(port) {
            Some(i) if i >= self.num_inputs => Ok(i - self.num_inputs),
            _ => Err(PortError::WrongDirection {
                comp: self.id.clone(),
                port: port.clone(),
                op,
            }),
        }
    }

    pub(crate) fn accept(&self, port: &PortId, value: T) -> Result<(), PortError> {
        let handler = self.passive(port)?;
        handler.put(self.input_slot(port, "put")?, value)
    }

    pub(crate) fn offer(
        &self,
        port: &PortId,
        value: T,
        timeout: Duration,
    ) -> Result<Offer<T>, PortError> {
        let handler = self.passive(port)?;
        handler.offer(self.input_slot(port, "put")?, value, timeout)
    }

    pub(crate) fn deliver(&self, port: &PortId, timeout: Duration) -> Result<Option<T>, PortError> {
        let handler = self.passive(port)?;
        handler.get(self.output_slot(port, "get")?, timeout)
    }

    /// Swap `port` into every list entry carrying the same id.
    pub(crate) fn relink(&self, port: &Arc<Port<T>>) {
        for entry in write(&self.ports).iter_mut() {
            if entry.id() == port.id() {
                *entry = Arc::clone(port);
            }
        }
    }
}

impl<T: Send + 'static> Component<T> {
    /// Mark the component running; an active component also spawns its
    /// worker. Starting a running component does nothing.
    pub fn start(&self) -> Result<(), ComponentError> {
        // Held for the whole start so concurrent starts cannot both spawn.
        let mut worker = lock(&self.worker);
        if self.is_running() {
            return Ok(());
        }
        let Behavior::Active(task) = &self.behavior else {
            self.running.store(true, Ordering::Release);
            debug!(component = %self.id, "passive component started");
            return Ok(());
        };

        // The previous worker shares the running flag, so it must be gone
        // before the flag goes back up.
        if let Some(previous) = worker.take() {
            if previous.join().is_err() {
                warn!(component = %self.id, "worker thread panicked outside the run loop");
            }
        }
        *lock(&self.failure) = None;
        self.running.store(true, Ordering::Release);

        let ctx = RunContext::new(
            self.id.clone(),
            self.ports(),
            self.num_inputs,
            Arc::clone(&self.running),
            self.options.io_timeout,
        );
        match harness::spawn(Arc::clone(task), ctx, Arc::clone(&self.failure)) {
            Ok(handle) => {
                *worker = Some(handle);
                Ok(())
            }
            Err(source) => {
                self.running.store(false, Ordering::Release);
                Err(ComponentError::Spawn {
                    comp: self.id.clone(),
                    source,
                })
            }
        }
    }
}

impl<T> Drop for Component<T> {
    /// An unreachable component must not leave its worker looping.
    fn drop(&mut self) {
        self.stop();
    }
}
