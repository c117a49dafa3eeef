//! Cooperative cancellation.
//!
//! A [`CancellationToken`] lets the operator stop a long wait (Ctrl-C)
//! without killing the process mid-report. The remote transition keeps
//! running and is picked up as in-progress on the next invocation.

mod token;

pub use token::CancellationToken;
