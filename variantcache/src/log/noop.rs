//! Logger that drops everything.

use crate::log::{LogLevel, Logger};
use std::fmt::Arguments;

/// Discards all entries. Used where diagnostics are not wanted, such as
/// one-shot CLI commands that already print their outcome.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    #[inline]
    fn log(&self, _level: LogLevel, _args: Arguments<'_>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_usable_as_shared_sink() {
        let logger: Arc<dyn Logger> = Arc::new(NoOpLogger);
        logger.error(format_args!("dropped {}", 1));
        crate::log_warn!(logger, "dropped too");
    }
}
