//! The `stackpilot` command line.
//!
//! Exit statuses: 0 success, 2 validation, 3 precondition, 4 remote
//! transition failure, 5 timeout, 6 provider error, 7 local IO or config,
//! 130 cancelled.

mod args;
mod output;
mod run;

pub use args::{Cli, Mode};
pub use output::{print_error, print_report};
pub use run::{execute, RunReport};
