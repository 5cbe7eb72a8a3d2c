//! Bounded FIFO buffer.
//!
//! Bridges one input port and one output port. `put` applies back-pressure
//! when the buffer is full, `get` waits up to its timeout for an item.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use rf_graph::{Offer, Passive, PortError};

use crate::error::{BufferError, BufferResult};

pub struct Buffer<T> {
    capacity: usize,
    tx: Sender<T>,
    rx: Receiver<T>,
}

impl<T> Buffer<T> {
    pub fn new(capacity: usize) -> BufferResult<Self> {
        // A zero-capacity channel is a rendezvous, not a buffer.
        if capacity == 0 {
            return Err(BufferError::ZeroCapacity);
        }
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        Ok(Self { capacity, tx, rx })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Items currently queued. A snapshot, never blocks.
    pub fn size(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

fn check_slot(op: &'static str, slot: usize) -> Result<(), PortError> {
    if slot == 0 {
        Ok(())
    } else {
        Err(PortError::NoSlot { op, slot })
    }
}

impl<T: Send> Passive<T> for Buffer<T> {
    fn put(&self, input: usize, value: T) -> Result<(), PortError> {
        check_slot("put", input)?;
        self.tx.send(value).map_err(|_| PortError::Closed)
    }

    fn offer(&self, input: usize, value: T, timeout: Duration) -> Result<Offer<T>, PortError> {
        check_slot("put", input)?;
        match self.tx.send_timeout(value, timeout) {
            Ok(()) => Ok(Offer::Accepted),
            Err(SendTimeoutError::Timeout(value)) => Ok(Offer::TimedOut(value)),
            Err(SendTimeoutError::Disconnected(_)) => Err(PortError::Closed),
        }
    }

    fn get(&self, output: usize, timeout: Duration) -> Result<Option<T>, PortError> {
        check_slot("get", output)?;
        match self.rx.recv_timeout(timeout) {
            Ok(value) => Ok(Some(value)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(PortError::Closed),
        }
    }

    fn size(&self) -> usize {
        Buffer::size(self)
    }
}
