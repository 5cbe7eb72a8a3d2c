//! Small components used by this crate's unit tests.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::component::{Active, Passive};
use crate::error::{ComponentError, PortError};
use crate::harness::RunContext;
use crate::port::Offer;

/// Does nothing until stopped.
pub(crate) struct Idle;

impl<T> Active<T> for Idle {
    fn run(&self, ctx: &RunContext<T>) -> Result<(), ComponentError> {
        while ctx.pause(Duration::from_millis(5)) {}
        Ok(())
    }
}

/// Mutex/condvar queue with an optional capacity.
pub(crate) struct Mailbox<T> {
    items: Mutex<VecDeque<T>>,
    changed: Condvar,
    capacity: Option<usize>,
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            changed: Condvar::new(),
            capacity: None,
        }
    }
}

impl<T> Mailbox<T> {
    pub(crate) fn bounded(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    fn full(&self, len: usize) -> bool {
        self.capacity.is_some_and(|cap| len >= cap)
    }
}

impl<T: Send> Passive<T> for Mailbox<T> {
    fn put(&self, input: usize, value: T) -> Result<(), PortError> {
        match self.offer(input, value, Duration::from_secs(3600))? {
            Offer::Accepted => Ok(()),
            Offer::TimedOut(_) => Err(PortError::Closed),
        }
    }

    fn offer(&self, input: usize, value: T, timeout: Duration) -> Result<Offer<T>, PortError> {
        if input != 0 {
            return Err(PortError::NoSlot { op: "put", slot: input });
        }
        let items = self.items.lock().unwrap();
        let (mut items, _) = self
            .changed
            .wait_timeout_while(items, timeout, |q| self.full(q.len()))
            .unwrap();
        if self.full(items.len()) {
            return Ok(Offer::TimedOut(value));
        }
        items.push_back(value);
        self.changed.notify_all();
        Ok(Offer::Accepted)
    }

    fn get(&self, output: usize, timeout: Duration) -> Result<Option<T>, PortError> {
        if output != 0 {
            return Err(PortError::NoSlot { op: "get", slot: output });
        }
        let items = self.items.lock().unwrap();
        let (mut items, _) = self
            .changed
            .wait_timeout_while(items, timeout, |q| q.is_empty())
            .unwrap();
        let value = items.pop_front();
        if value.is_some() {
            self.changed.notify_all();
        }
        Ok(value)
    }

    fn size(&self) -> usize {
        self.items.lock().unwrap().len()
    }
}

/// Poll `cond` until it holds or `limit` elapses.
pub(crate) fn wait_for(limit: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    cond()
}
