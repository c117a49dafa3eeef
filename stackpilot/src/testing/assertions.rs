//! Test assertions for reconciliation outcomes and provider traffic.

use super::{ProviderCall, ScriptedProvider};
use crate::core::{Change, Outcome};

/// Asserts that the outcome indicates success.
pub fn assert_outcome_succeeded(outcome: &Outcome) {
    assert!(
        outcome.is_success(),
        "Expected success, got {:?} ({:?})",
        outcome.status,
        outcome.failure
    );
}

/// Asserts that the outcome indicates failure.
pub fn assert_outcome_failed(outcome: &Outcome) {
    assert!(
        !outcome.is_success(),
        "Expected failure, got status: {:?}",
        outcome.status
    );
}

/// Asserts that the outcome recorded the expected change.
pub fn assert_change(outcome: &Outcome, expected: Change) {
    assert_eq!(
        outcome.change, expected,
        "Expected change {:?}, got {:?}",
        expected, outcome.change
    );
}

/// Asserts that no create, update or delete was issued.
pub fn assert_no_mutations(provider: &ScriptedProvider) {
    let mutations: Vec<ProviderCall> = provider.mutations();
    assert!(
        mutations.is_empty(),
        "Expected no mutations, got {mutations:?}"
    );
}

/// Asserts that the provider was never contacted.
pub fn assert_no_remote_calls(provider: &ScriptedProvider) {
    assert_eq!(
        provider.remote_call_count(),
        0,
        "Expected no remote calls, got {:?}",
        provider.calls()
    );
}
