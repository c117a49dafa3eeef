//! Core domain model types for stackpilot.
//!
//! This module contains the fundamental types used throughout the crate:
//! - Deployment requests and the environment enum
//! - Provider stack statuses and the reconciler's lifecycle states
//! - Output keys and output sets
//! - Reconciliation outcomes

mod outcome;
mod outputs;
mod request;
mod status;

pub use outcome::{Change, Failure, Outcome, OutcomeStatus};
pub use outputs::{OutputKey, OutputSet};
pub use request::{
    validate_stack_name, DeploymentRequest, Environment, StackParameter, ValidatedRequest,
};
pub use status::{StackState, StackStatus};
