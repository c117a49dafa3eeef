//! Testing utilities for stackpilot.
//!
//! This module provides:
//! - A scripted in-memory [`StackProvider`](crate::provider::StackProvider)
//! - Templates, requests and poll settings that run in milliseconds
//! - Assertions for outcomes and provider traffic

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{
    assert_change, assert_no_mutations, assert_no_remote_calls, assert_outcome_failed,
    assert_outcome_succeeded,
};
pub use fixtures::{
    fast_poll_config, sample_outputs, sample_request, write_template, SAMPLE_ENV_TEMPLATE,
    SAMPLE_TEMPLATE, TEMPLATE_FILE_NAME,
};
pub use mocks::{ProviderCall, ScriptedProvider};
