//! # Stackpilot
//!
//! Drives one named CloudFormation stack through its create, update and
//! delete lifecycle, waits for it to settle and materializes the stack's
//! outputs into a `.env` file for the marketing agents application.
//!
//! - **Reconciliation**: create when absent, update when present, explicit
//!   handling of the provider's "no updates" signal
//! - **Bounded waiting**: backoff with jitter, a hard timeout and
//!   cooperative cancellation
//! - **Rendering**: pure single-pass placeholder substitution
//! - **Explicit logging**: lifecycle events go to an injected [`events::EventSink`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stackpilot::prelude::*;
//!
//! let provider = Arc::new(CloudFormationProvider::from_region("us-east-1").await);
//! let reconciler = Reconciler::new(provider)
//!     .with_event_sink(Arc::new(LoggingEventSink::info()));
//!
//! let request = DeploymentRequest::new("marketing-agents-dev", "us-east-1", "dev");
//! let outcome = reconciler.reconcile(&request).await?.into_result()?;
//! render_config(&outcome.outputs, ".env.template".as_ref(), ".env".as_ref())?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod cli;
pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod observability;
pub mod polling;
pub mod provider;
pub mod reconciler;
pub mod render;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::config::Settings;
    pub use crate::core::{
        Change, DeploymentRequest, Environment, Failure, Outcome, OutcomeStatus, OutputKey,
        OutputSet, StackState, StackStatus,
    };
    pub use crate::errors::{
        PreconditionError, ProviderError, RemoteTransitionError, Result, StackpilotError,
        TimeoutError, ValidationError,
    };
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::polling::{PollConfig, WaitResult};
    #[cfg(feature = "aws")]
    pub use crate::provider::CloudFormationProvider;
    pub use crate::provider::{StackProvider, TemplateSummary};
    pub use crate::reconciler::{Reconciler, StackReport};
    pub use crate::render::{render, render_config, RenderReport, Rendered};
}
