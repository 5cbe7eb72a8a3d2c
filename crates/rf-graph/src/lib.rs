//! rf-graph: component/port execution model for reflow.
//!
//! Provides:
//! - Ports with blocking put, bounded get and a per-update `settled` flag
//! - Active and passive components, and the worker harness for active ones
//! - The `Graph` of one application version and its validating builder
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use rf_core::CompId;
//! use rf_graph::{ComponentError, GraphBuilder, Offer, Passive, PortError, RunContext, Active};
//!
//! struct Sink;
//! impl Passive<u32> for Sink {
//!     fn put(&self, _input: usize, _value: u32) -> Result<(), PortError> { Ok(()) }
//!     fn offer(&self, _input: usize, _value: u32, _t: Duration) -> Result<Offer<u32>, PortError> {
//!         Ok(Offer::Accepted)
//!     }
//!     fn get(&self, _output: usize, _t: Duration) -> Result<Option<u32>, PortError> { Ok(None) }
//! }
//!
//! struct Ticker;
//! impl Active<u32> for Ticker {
//!     fn run(&self, ctx: &RunContext<u32>) -> Result<(), ComponentError> {
//!         while ctx.is_running() {
//!             ctx.send(0, 1)?;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let mut builder = GraphBuilder::new();
//! let a = builder.add_port("a").unwrap();
//! builder.add_active(CompId::new("ticker", "1"), Ticker, 0, &[a.clone()]).unwrap();
//! builder.add_passive(CompId::new("sink", "1"), Sink, 1, &[a]).unwrap();
//! let graph = builder.build().unwrap();
//!
//! assert_eq!(graph.component_count(), 2);
//! assert!(graph.components().all(|c| c.startable()));
//! ```

pub mod builder;
pub mod component;
pub mod error;
pub mod graph;
pub mod harness;
pub mod port;
mod sync;
pub(crate) mod validate;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for ergonomics
pub use builder::GraphBuilder;
pub use component::{Active, Behavior, Component, Passive};
pub use error::{ComponentError, GraphError, GraphResult, PortError};
pub use graph::Graph;
pub use harness::RunContext;
pub use port::{Offer, Port, Side};
