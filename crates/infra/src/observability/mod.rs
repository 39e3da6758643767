//! Observability infrastructure
//!
//! Recent log lines are mirrored from `tracing` into a bounded in-memory
//! buffer for the status server:
//!
//! ```text
//! tracing event ─► LogBufferLayer ─► mpsc ─► LogForwarder task ─► LogBuffer
//! ```
//!
//! The layer never blocks; when the channel is full the line is dropped.

pub mod log_buffer;

pub use log_buffer::{log_channel, LogBuffer, LogBufferLayer, LogForwarder};
