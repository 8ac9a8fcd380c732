//! Bounded retry with exponential backoff for collaborator calls.
//!
//! Every collaborator call goes through [`call_with_retry`]: each attempt
//! runs under the policy's timeout, transient failures back off as
//! `backoff_base_ms * 2^n` (capped), and exhaustion surfaces as
//! [`OrchestrationError::CollaboratorExhausted`] carrying the last error.
//! Validation failures never pass through here; they are not retryable by
//! construction.

use std::future::Future;
use std::time::Duration;

use coverdesk_core::error::{CollaboratorError, OrchestrationError};
use coverdesk_config::CollaboratorPolicy;
use tracing::{debug, warn};

/// Run `op` until it succeeds or the policy's attempt budget is spent.
///
/// `op` is re-invoked per attempt, so it must be safe to call more than
/// once — collaborator calls are request/response and carry no local state.
/// Ceiling on a single backoff sleep, whatever the attempt budget.
const MAX_BACKOFF_MS: u64 = 30_000;

/// Delay after a failed `attempt`: `base * 2^(attempt - 1)`, capped at
/// [`MAX_BACKOFF_MS`]. The cap also keeps large configured attempt budgets
/// from overflowing the shift.
fn backoff_delay(policy: &CollaboratorPolicy, attempt: u32) -> Duration {
    let factor = 1u64
        .checked_shl(attempt.saturating_sub(1))
        .unwrap_or(u64::MAX);
    let millis = policy
        .backoff_base_ms
        .saturating_mul(factor)
        .min(MAX_BACKOFF_MS);
    Duration::from_millis(millis)
}

pub async fn call_with_retry<T, F, Fut>(
    collaborator: &str,
    policy: &CollaboratorPolicy,
    mut op: F,
) -> Result<T, OrchestrationError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CollaboratorError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error: Option<CollaboratorError> = None;

    for attempt in 1..=max_attempts {
        let outcome = tokio::time::timeout(Duration::from_secs(policy.timeout_secs), op()).await;

        let error = match outcome {
            Ok(Ok(value)) => {
                if attempt > 1 {
                    debug!(collaborator, attempt, "Collaborator recovered");
                }
                return Ok(value);
            }
            Ok(Err(e)) => e,
            Err(_) => CollaboratorError::Timeout {
                collaborator: collaborator.to_string(),
                timeout_secs: policy.timeout_secs,
            },
        };

        warn!(
            collaborator,
            attempt,
            max_attempts,
            error = %error,
            "Collaborator call failed"
        );
        last_error = Some(error);

        if attempt < max_attempts {
            tokio::time::sleep(backoff_delay(policy, attempt)).await;
        }
    }

    Err(OrchestrationError::CollaboratorExhausted {
        collaborator: collaborator.to_string(),
        attempts: max_attempts,
        last_error: last_error.unwrap_or(CollaboratorError::Unavailable {
            collaborator: collaborator.to_string(),
            reason: "no attempts executed".into(),
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> CollaboratorPolicy {
        CollaboratorPolicy {
            timeout_secs: 1,
            max_attempts,
            backoff_base_ms: 1,
        }
    }

    #[tokio::test]
    async fn first_attempt_success_makes_one_call() {
        let calls = AtomicU32::new(0);
        let result = call_with_retry("optimizer", &fast_policy(3), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, CollaboratorError>(42) }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn succeeds_on_third_attempt_within_budget() {
        let calls = AtomicU32::new(0);
        let result = call_with_retry("optimizer", &fast_policy(3), || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Err(CollaboratorError::Unavailable {
                        collaborator: "optimizer".into(),
                        reason: "connection refused".into(),
                    })
                } else {
                    Ok("ranked")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "ranked");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhaustion_reports_attempts_and_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = call_with_retry("textgen", &fast_policy(2), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(CollaboratorError::Unavailable {
                    collaborator: "textgen".into(),
                    reason: "503".into(),
                })
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        match result.unwrap_err() {
            OrchestrationError::CollaboratorExhausted {
                collaborator,
                attempts,
                last_error,
            } => {
                assert_eq!(collaborator, "textgen");
                assert_eq!(attempts, 2);
                assert!(matches!(last_error, CollaboratorError::Unavailable { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn backoff_doubles_then_caps() {
        let policy = CollaboratorPolicy {
            timeout_secs: 1,
            max_attempts: 200,
            backoff_base_ms: 250,
        };
        assert_eq!(backoff_delay(&policy, 1), Duration::from_millis(250));
        assert_eq!(backoff_delay(&policy, 2), Duration::from_millis(500));
        assert_eq!(backoff_delay(&policy, 3), Duration::from_millis(1000));
        // Large attempt numbers saturate instead of overflowing the shift.
        assert_eq!(backoff_delay(&policy, 64), Duration::from_millis(MAX_BACKOFF_MS));
        assert_eq!(backoff_delay(&policy, 200), Duration::from_millis(MAX_BACKOFF_MS));
    }

    #[tokio::test]
    async fn slow_call_times_out_and_retries() {
        let calls = AtomicU32::new(0);
        let policy = fast_policy(2);
        let result: Result<(), _> = call_with_retry("optimizer", &policy, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
                Err(CollaboratorError::Unavailable {
                    collaborator: "optimizer".into(),
                    reason: "down".into(),
                })
            }
        })
        .await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("2 attempts"));
    }
}
