//! Shared fixtures for the rf-update integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use rf_components::Buffer;
use rf_core::{CompId, RuntimeOptions};
use rf_graph::{Active, ComponentError, Graph, GraphBuilder, RunContext};

pub type Seen = Arc<Mutex<Vec<u32>>>;

/// Emits a fixed list of values once, then idles until stopped.
pub struct Scripted(pub Vec<u32>);

impl Active<u32> for Scripted {
    fn run(&self, ctx: &RunContext<u32>) -> Result<(), ComponentError> {
        for &v in &self.0 {
            ctx.send(0, v)?;
        }
        while ctx.pause(Duration::from_millis(5)) {}
        Ok(())
    }
}

/// Records every value it receives, spending `delay` on each.
pub struct Recorder {
    pub seen: Seen,
    pub delay: Duration,
}

impl Active<u32> for Recorder {
    fn run(&self, ctx: &RunContext<u32>) -> Result<(), ComponentError> {
        while ctx.is_running() {
            if let Some(v) = ctx.recv(0)? {
                self.seen.lock().unwrap().push(v);
                ctx.pause(self.delay);
            }
        }
        Ok(())
    }
}

pub fn options() -> RuntimeOptions {
    RuntimeOptions::new(Duration::from_millis(10)).expect("non-zero timeout")
}

pub fn producer(version: &str) -> CompId {
    CompId::new("producer", version)
}

pub fn buffer() -> CompId {
    CompId::new("buffer", "1")
}

pub fn consumer() -> CompId {
    CompId::new("consumer", "1")
}

/// `producer (version) -a-> buffer (10) -b-> consumer`
pub fn pipeline(version: &str, values: Vec<u32>, seen: Seen) -> Graph<u32> {
    slow_pipeline(version, values, seen, Duration::ZERO)
}

/// Like `pipeline`, with a consumer that takes `delay` per value.
pub fn slow_pipeline(version: &str, values: Vec<u32>, seen: Seen, delay: Duration) -> Graph<u32> {
    let mut b = GraphBuilder::with_options(options());
    let a = b.add_port("a").expect("port a");
    let c = b.add_port("b").expect("port b");
    b.add_active(producer(version), Scripted(values), 0, &[a.clone()])
        .expect("producer");
    b.add_passive(buffer(), Buffer::new(10).expect("capacity"), 1, &[a, c.clone()])
        .expect("buffer");
    b.add_active(consumer(), Recorder { seen, delay }, 1, &[c])
        .expect("consumer");
    b.build().expect("valid pipeline")
}

pub fn seen() -> Seen {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn snapshot(seen: &Seen) -> Vec<u32> {
    seen.lock().unwrap().clone()
}

/// Poll `cond` until it holds or `limit` elapses.
pub fn wait_for(limit: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    cond()
}
