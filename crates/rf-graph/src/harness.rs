//! Execution harness for active components.
//!
//! Each started active component gets one named OS thread. Whatever happens
//! inside [`Active::run`](crate::Active::run), an error or a panic, stays on
//! that thread: it is logged, recorded on the component, and the thread
//! exits.

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rf_core::CompId;
use tracing::{error, info};

use crate::component::Active;
use crate::error::ComponentError;
use crate::port::{Offer, Port};
use crate::sync::lock;

/// What an active component's run loop sees: its ports, its liveness flag,
/// and bounded blocking helpers.
pub struct RunContext<T> {
    id: CompId,
    ports: Vec<Arc<Port<T>>>,
    num_inputs: usize,
    running: Arc<AtomicBool>,
    io_timeout: Duration,
}

impl<T> RunContext<T> {
    pub(crate) fn new(
        id: CompId,
        ports: Vec<Arc<Port<T>>>,
        num_inputs: usize,
        running: Arc<AtomicBool>,
        io_timeout: Duration,
    ) -> Self {
        Self {
            id,
            ports,
            num_inputs,
            running,
            io_timeout,
        }
    }

    pub fn id(&self) -> &CompId {
        &self.id
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn io_timeout(&self) -> Duration {
        self.io_timeout
    }

    pub fn inputs(&self) -> &[Arc<Port<T>>] {
        &self.ports[..self.num_inputs]
    }

    pub fn outputs(&self) -> &[Arc<Port<T>>] {
        &self.ports[self.num_inputs..]
    }

    pub fn input(&self, index: usize) -> Result<&Arc<Port<T>>, ComponentError> {
        self.inputs()
            .get(index)
            .ok_or_else(|| ComponentError::NoSuchPort {
                comp: self.id.clone(),
                direction: "input",
                index,
            })
    }

    pub fn output(&self, index: usize) -> Result<&Arc<Port<T>>, ComponentError> {
        self.outputs()
            .get(index)
            .ok_or_else(|| ComponentError::NoSuchPort {
                comp: self.id.clone(),
                direction: "output",
                index,
            })
    }

    /// Get from input `index`, waiting at most one I/O timeout.
    pub fn recv(&self, index: usize) -> Result<Option<T>, ComponentError> {
        Ok(self.input(index)?.get(self.io_timeout)?)
    }

    /// Put on output `index`, retrying in I/O-timeout slices until the value
    /// is accepted. Returns `ComponentError::Stopped` if the component is
    /// stopped first; the value is dropped in that case.
    pub fn send(&self, index: usize, value: T) -> Result<(), ComponentError> {
        let port = self.output(index)?;
        let mut pending = value;
        loop {
            if !self.is_running() {
                return Err(ComponentError::Stopped(self.id.clone()));
            }
            match port.offer(pending, self.io_timeout)? {
                Offer::Accepted => return Ok(()),
                Offer::TimedOut(value) => pending = value,
            }
        }
    }

    /// Sleep for `duration`, waking early if the component is stopped.
    /// Returns whether the component is still running.
    pub fn pause(&self, duration: Duration) -> bool {
        let slice = self.io_timeout.min(duration);
        let mut remaining = duration;
        while self.is_running() && !remaining.is_zero() {
            let step = slice.min(remaining);
            thread::sleep(step);
            remaining -= step;
        }
        self.is_running()
    }
}

pub(crate) fn spawn<T: Send + 'static>(
    task: Arc<dyn Active<T>>,
    ctx: RunContext<T>,
    failure: Arc<Mutex<Option<String>>>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(ctx.id().to_string())
        .spawn(move || {
            info!(component = %ctx.id(), "worker started");
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| task.run(&ctx)));
            let message = match outcome {
                Ok(Ok(())) | Ok(Err(ComponentError::Stopped(_))) => None,
                Ok(Err(err)) => Some(err.to_string()),
                Err(payload) => Some(panic_message(payload.as_ref())),
            };
            if let Some(message) = message {
                error!(component = %ctx.id(), %message, "worker failed");
                *lock(&failure) = Some(message);
            }
            info!(component = %ctx.id(), "worker terminated");
        })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic with a non-string payload".to_string()
    }
}
