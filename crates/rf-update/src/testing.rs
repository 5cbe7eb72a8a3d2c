//! Fixtures shared by this crate's unit tests.

use std::time::Duration;

use rf_components::Buffer;
use rf_core::CompId;
use rf_graph::{Active, ComponentError, Graph, GraphBuilder, RunContext};

/// Active component that does nothing until stopped.
pub struct Idle;

impl<T> Active<T> for Idle {
    fn run(&self, ctx: &RunContext<T>) -> Result<(), ComponentError> {
        while ctx.pause(Duration::from_millis(5)) {}
        Ok(())
    }
}

/// `producer (version) -a-> buffer (1) -b-> consumer (1)`
pub fn chain(producer_version: &str) -> Graph<u32> {
    let mut b = GraphBuilder::new();
    let a = b.add_port("a").unwrap();
    let c = b.add_port("b").unwrap();
    b.add_active(CompId::new("producer", producer_version), Idle, 0, &[a.clone()])
        .unwrap();
    b.add_passive(CompId::new("buffer", "1"), Buffer::new(10).unwrap(), 1, &[a, c.clone()])
        .unwrap();
    b.add_active(CompId::new("consumer", "1"), Idle, 1, &[c])
        .unwrap();
    b.build().unwrap()
}
