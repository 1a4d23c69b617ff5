//! Diagnostic sink.
//!
//! Components report failures through an `Arc<dyn Logger>` rather than
//! calling `tracing` directly for them, so deployments can route the
//! reports elsewhere and tests can assert on them.
//!
//! - [`TracingLogger`] forwards to `tracing`
//! - [`MemoryLogger`] records entries for inspection
//! - [`NoOpLogger`] discards everything

mod level;
mod memory;
mod noop;
mod tracing_adapter;

pub use level::{LogLevel, Logger};
pub use memory::{LogEntry, MemoryLogger};
pub use noop::NoOpLogger;
pub use tracing_adapter::TracingLogger;
