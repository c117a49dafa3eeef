//! Waiting for remote transitions.
//!
//! This module provides:
//! - Poll interval configuration with backoff and jitter
//! - A bounded, cancellable poll loop over `describe_stack`

mod backoff;
mod waiter;

pub use backoff::{BackoffStrategy, JitterStrategy, PollConfig, PollSchedule};
pub use waiter::{wait_for_terminal, WaitResult};
