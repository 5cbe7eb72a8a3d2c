//! Reusable components for reflow graphs.
//!
//! - [`Buffer`]: bounded FIFO queue, the reference passive component

pub mod buffer;
pub mod error;

pub use buffer::Buffer;
pub use error::{BufferError, BufferResult};
