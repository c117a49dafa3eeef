//! Timing helper for remote operations.

use std::time::{Duration, Instant};
use tracing::info;

/// Measures one named operation against one stack.
#[derive(Debug)]
pub struct OperationTimer {
    start: Instant,
    operation: &'static str,
    stack_name: String,
}

impl OperationTimer {
    /// Starts a new timer.
    #[must_use]
    pub fn start(operation: &'static str, stack_name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            operation,
            stack_name: stack_name.into(),
        }
    }

    /// Returns the elapsed time.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Returns the operation name.
    #[must_use]
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Logs the duration with the final result and returns it.
    pub fn finish(self, result: &str) -> Duration {
        let elapsed = self.elapsed();
        info!(
            operation = self.operation,
            stack_name = %self.stack_name,
            result,
            duration_ms = self.elapsed_ms(),
            "Operation finished"
        );
        elapsed
    }
}
