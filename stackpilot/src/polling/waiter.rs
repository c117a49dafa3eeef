//! Bounded poll loop that waits for a stack to reach a terminal status.

use serde_json::json;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::{PollConfig, PollSchedule};
use crate::cancellation::CancellationToken;
use crate::core::StackStatus;
use crate::errors::ProviderError;
use crate::events::EventSink;
use crate::provider::{StackDescription, StackProvider};

/// How a wait ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitResult {
    /// The stack reached a terminal status.
    Settled(StackDescription),
    /// The stack no longer exists.
    Vanished,
    /// The bound expired first.
    TimedOut {
        /// Time spent waiting.
        waited: Duration,
        /// Last status observed.
        last_status: Option<StackStatus>,
    },
    /// The operator cancelled the wait.
    Cancelled {
        /// Cancellation reason.
        reason: String,
        /// Last status observed.
        last_status: Option<StackStatus>,
    },
}

/// Polls `describe_stack` until the stack settles, disappears, the timeout
/// expires or the token is cancelled.
///
/// Transient describe failures are tolerated up to
/// `config.max_consecutive_errors` in a row; the next one is returned.
pub async fn wait_for_terminal<P>(
    provider: &P,
    stack_name: &str,
    config: &PollConfig,
    cancel: &CancellationToken,
    events: &dyn EventSink,
) -> Result<WaitResult, ProviderError>
where
    P: StackProvider + ?Sized,
{
    let started = Instant::now();
    let deadline = config.timeout();
    let mut schedule = PollSchedule::new(config);
    let mut last_status: Option<StackStatus> = None;
    let mut consecutive_errors = 0u32;

    loop {
        if cancel.is_cancelled() {
            return Ok(cancelled(stack_name, cancel, last_status, events).await);
        }

        match provider.describe_stack(stack_name).await {
            Ok(None) => {
                debug!(stack_name, "Stack disappeared while waiting");
                return Ok(WaitResult::Vanished);
            }
            Ok(Some(description)) => {
                consecutive_errors = 0;
                if last_status.as_ref() != Some(&description.status) {
                    events
                        .emit(
                            "stack.status",
                            Some(json!({
                                "stack_name": stack_name,
                                "status": description.status.as_str(),
                                "reason": description.status_reason,
                            })),
                        )
                        .await;
                    if let StackStatus::Unknown(raw) = &description.status {
                        warn!(stack_name, status = %raw, "Unrecognized stack status; still waiting");
                    }
                }
                if description.status.is_terminal() {
                    return Ok(WaitResult::Settled(description));
                }
                last_status = Some(description.status);
            }
            Err(err) => {
                consecutive_errors += 1;
                if consecutive_errors > config.max_consecutive_errors {
                    return Err(err);
                }
                warn!(
                    stack_name,
                    consecutive_errors,
                    error = %err,
                    "Describe failed while waiting; retrying"
                );
            }
        }

        let elapsed = started.elapsed();
        if elapsed >= deadline {
            events
                .emit(
                    "stack.wait.timed_out",
                    Some(json!({
                        "stack_name": stack_name,
                        "waited_ms": u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                        "last_status": last_status.as_ref().map(StackStatus::as_str),
                    })),
                )
                .await;
            return Ok(WaitResult::TimedOut {
                waited: elapsed,
                last_status,
            });
        }

        let interval = schedule.next_interval().min(deadline - elapsed);
        debug!(
            stack_name,
            attempt = schedule.attempt,
            interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            "Waiting before next describe"
        );

        tokio::select! {
            () = tokio::time::sleep(interval) => {}
            () = cancel.cancelled() => {
                return Ok(cancelled(stack_name, cancel, last_status, events).await);
            }
        }
    }
}

async fn cancelled(
    stack_name: &str,
    cancel: &CancellationToken,
    last_status: Option<StackStatus>,
    events: &dyn EventSink,
) -> WaitResult {
    let reason = cancel.reason().unwrap_or_else(|| "cancelled".to_string());
    events
        .emit(
            "stack.wait.cancelled",
            Some(json!({"stack_name": stack_name, "reason": reason})),
        )
        .await;
    WaitResult::Cancelled {
        reason,
        last_status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{CollectingEventSink, NoOpEventSink};
    use crate::polling::JitterStrategy;
    use crate::testing::{fast_poll_config, ScriptedProvider};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_settles_on_terminal_status() {
        let provider = ScriptedProvider::new().with_existing_script(vec![
            StackStatus::UpdateInProgress,
            StackStatus::UpdateCompleteCleanupInProgress,
            StackStatus::UpdateComplete,
        ]);
        let sink = CollectingEventSink::new();

        let result = wait_for_terminal(
            &provider,
            "marketing-dev",
            &fast_poll_config(),
            &CancellationToken::new(),
            &sink,
        )
        .await
        .unwrap();

        match result {
            WaitResult::Settled(desc) => assert_eq!(desc.status, StackStatus::UpdateComplete),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(sink.events_of_type("stack.status").len(), 3);
    }

    #[tokio::test]
    async fn test_vanished_when_describe_returns_none() {
        let provider = ScriptedProvider::new();
        let result = wait_for_terminal(
            &provider,
            "gone",
            &fast_poll_config(),
            &CancellationToken::new(),
            &NoOpEventSink,
        )
        .await
        .unwrap();
        assert_eq!(result, WaitResult::Vanished);
    }

    #[tokio::test]
    async fn test_times_out_and_reports_last_status() {
        let provider =
            ScriptedProvider::new().with_existing_script(vec![StackStatus::CreateInProgress]);
        let config = fast_poll_config().with_timeout_secs(0);
        let sink = CollectingEventSink::new();

        let result = wait_for_terminal(
            &provider,
            "slow",
            &config,
            &CancellationToken::new(),
            &sink,
        )
        .await
        .unwrap();

        match result {
            WaitResult::TimedOut { last_status, .. } => {
                assert_eq!(last_status, Some(StackStatus::CreateInProgress));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(sink.events_of_type("stack.wait.timed_out").len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_poll() {
        let provider =
            ScriptedProvider::new().with_existing_script(vec![StackStatus::CreateInProgress]);
        let token = CancellationToken::new();
        token.cancel("ctrl-c");

        let result = wait_for_terminal(&provider, "s", &fast_poll_config(), &token, &NoOpEventSink)
            .await
            .unwrap();

        assert_eq!(
            result,
            WaitResult::Cancelled {
                reason: "ctrl-c".into(),
                last_status: None
            }
        );
        assert_eq!(provider.remote_call_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_sleep() {
        let provider =
            ScriptedProvider::new().with_existing_script(vec![StackStatus::UpdateInProgress]);
        let config = PollConfig::new()
            .with_initial_interval_ms(60_000)
            .with_jitter(JitterStrategy::None);
        let token = std::sync::Arc::new(CancellationToken::new());
        {
            let token = std::sync::Arc::clone(&token);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                token.cancel("operator");
            });
        }

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            wait_for_terminal(&provider, "s", &config, &token, &NoOpEventSink),
        )
        .await
        .unwrap()
        .unwrap();

        assert!(matches!(
            result,
            WaitResult::Cancelled { last_status: Some(StackStatus::UpdateInProgress), .. }
        ));
    }

    #[tokio::test]
    async fn test_tolerates_transient_describe_errors() {
        let provider = ScriptedProvider::new()
            .with_existing_script(vec![StackStatus::CreateComplete])
            .with_describe_failures(2);

        let result = wait_for_terminal(
            &provider,
            "s",
            &fast_poll_config().with_max_consecutive_errors(2),
            &CancellationToken::new(),
            &NoOpEventSink,
        )
        .await
        .unwrap();
        assert!(matches!(result, WaitResult::Settled(_)));
    }

    #[tokio::test]
    async fn test_gives_up_after_too_many_describe_errors() {
        let provider = ScriptedProvider::new()
            .with_existing_script(vec![StackStatus::CreateComplete])
            .with_describe_failures(3);

        let err = wait_for_terminal(
            &provider,
            "s",
            &fast_poll_config().with_max_consecutive_errors(2),
            &CancellationToken::new(),
            &NoOpEventSink,
        )
        .await
        .unwrap_err();
        assert_eq!(err.operation, "describe_stacks");
    }
}
