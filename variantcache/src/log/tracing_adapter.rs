//! Logger forwarding to `tracing`.

use crate::log::{LogLevel, Logger};
use std::fmt::Arguments;

/// Production sink: entries become `tracing` events under the
/// `variantcache::diagnostics` target, so they can be filtered separately
/// from the structured flow logging.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    pub fn new() -> Self {
        Self
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        match level {
            LogLevel::Trace => tracing::trace!(target: "variantcache::diagnostics", "{}", args),
            LogLevel::Debug => tracing::debug!(target: "variantcache::diagnostics", "{}", args),
            LogLevel::Info => tracing::info!(target: "variantcache::diagnostics", "{}", args),
            LogLevel::Warn => tracing::warn!(target: "variantcache::diagnostics", "{}", args),
            LogLevel::Error => tracing::error!(target: "variantcache::diagnostics", "{}", args),
        }
    }
}
