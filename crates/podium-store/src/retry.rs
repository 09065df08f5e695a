//! Transient-contention retry wrapper.
//!
//! `PostgreSQL` can reject a write under concurrent access: serialization
//! failures, deadlocks, and lock timeouts. These are expected to succeed
//! on retry, so every store-touching operation in the service runs through
//! [`RetryPolicy::run`], which retries with exponential backoff and a
//! capped attempt budget.
//!
//! Outcomes the wrapper distinguishes:
//!
//! - success -- the operation's value, possibly after retries
//! - non-transient error -- returned immediately, never retried
//! - retries exhausted -- [`StoreError::StillBusy`]
//! - cancellation -- [`StoreError::Cancelled`], surfaced the moment the
//!   signal fires, even mid-backoff

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use crate::error::StoreError;

/// Default delay before the first retry.
const DEFAULT_BASE_DELAY_MS: u64 = 25;

/// Default total attempt budget (first try included).
const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// `SQLSTATE` codes that signal transient contention.
///
/// - `40001` -- `serialization_failure`
/// - `40P01` -- `deadlock_detected`
/// - `55P03` -- `lock_not_available`
const TRANSIENT_SQLSTATES: &[&str] = &["40001", "40P01", "55P03"];

/// Returns `true` if the error is a transient contention rejection that
/// is expected to succeed on retry.
///
/// Anything else -- constraint violations, connection loss, bad SQL --
/// is returned to the caller unretried.
pub fn is_transient(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db) => db
            .code()
            .is_some_and(|code| TRANSIENT_SQLSTATES.contains(&code.as_ref())),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Cancellation signal
// ---------------------------------------------------------------------------

/// A cancellation signal shared between a store operation and whoever may
/// abort it (request timeout, process shutdown).
///
/// Cheap to clone; all clones observe the same signal. Once cancelled it
/// stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    inner: Arc<CancelInner>,
}

#[derive(Debug, Default)]
struct CancelInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancellationSignal {
    /// Create a fresh, un-fired signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the signal. Wakes every task waiting in [`Self::cancelled`].
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
        self.inner.notify.notify_waiters();
    }

    /// Whether the signal has fired.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Resolve when the signal fires. Resolves immediately if it already has.
    pub async fn cancelled(&self) {
        loop {
            // Register interest before checking the flag so a concurrent
            // cancel() between the check and the await cannot be missed.
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

// ---------------------------------------------------------------------------
// Retry policy
// ---------------------------------------------------------------------------

/// Exponential-backoff retry policy for transient contention.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Delay before the first retry; doubles after each failed attempt.
    pub base_delay: Duration,
    /// Total attempt budget, first try included.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl RetryPolicy {
    /// Override the base delay (mainly for tests).
    #[must_use]
    pub const fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Override the attempt budget.
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Run `op`, retrying on transient contention.
    ///
    /// `op` is invoked up to `max_attempts` times. Between attempts the
    /// wrapper sleeps with doubling delay, racing the sleep against
    /// `cancel` so a fired signal aborts the wait immediately.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Cancelled`] if `cancel` fires before or between attempts.
    /// - [`StoreError::StillBusy`] if every attempt hit transient contention.
    /// - [`StoreError::Postgres`] for the first non-transient failure.
    pub async fn run<T, F, Fut>(
        &self,
        op_name: &'static str,
        cancel: &CancellationSignal,
        mut op: F,
    ) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut delay = self.base_delay;

        for attempt in 1..=self.max_attempts {
            if cancel.is_cancelled() {
                return Err(StoreError::Cancelled);
            }

            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() => {
                    if attempt == self.max_attempts {
                        tracing::warn!(
                            op = op_name,
                            attempts = self.max_attempts,
                            "retry budget exhausted, store still busy"
                        );
                        return Err(StoreError::StillBusy {
                            attempts: self.max_attempts,
                        });
                    }

                    tracing::debug!(
                        op = op_name,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "transient contention, backing off"
                    );

                    tokio::select! {
                        () = tokio::time::sleep(delay) => {}
                        () = cancel.cancelled() => return Err(StoreError::Cancelled),
                    }
                    delay = delay.saturating_mul(2);
                }
                Err(e) => return Err(e),
            }
        }

        // max_attempts is validated to be >= 1 by construction of the loop;
        // reaching here means it was configured as 0.
        Err(StoreError::StillBusy { attempts: 0 })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use std::sync::atomic::AtomicU32;

    use super::*;

    /// Fabricate a non-transient store error.
    fn plain_error() -> StoreError {
        StoreError::Postgres(sqlx::Error::RowNotFound)
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::default().with_base_delay(Duration::from_millis(1))
    }

    #[test]
    fn non_database_errors_are_not_transient() {
        assert!(!plain_error().is_transient());
        assert!(!is_transient(&sqlx::Error::PoolClosed));
        assert!(!StoreError::Cancelled.is_transient());
        assert!(!StoreError::StillBusy { attempts: 5 }.is_transient());
    }

    #[tokio::test]
    async fn success_passes_through_untouched() {
        let cancel = CancellationSignal::new();
        let result: Result<u32, _> = fast_policy()
            .run("test_ok", &cancel, || async { Ok(7) })
            .await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn non_transient_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let cancel = CancellationSignal::new();
        let result: Result<(), _> = fast_policy()
            .run("test_plain", &cancel, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(plain_error()) }
            })
            .await;
        assert!(matches!(result, Err(StoreError::Postgres(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn pre_fired_cancellation_short_circuits() {
        let cancel = CancellationSignal::new();
        cancel.cancel();
        let result: Result<u32, _> = fast_policy()
            .run("test_cancel", &cancel, || async { Ok(1) })
            .await;
        assert!(matches!(result, Err(StoreError::Cancelled)));
    }

    #[tokio::test]
    async fn cancelled_future_resolves_after_cancel() {
        let cancel = CancellationSignal::new();
        let waiter = cancel.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });
        cancel.cancel();
        handle.await.unwrap();
        assert!(cancel.is_cancelled());
    }
}
