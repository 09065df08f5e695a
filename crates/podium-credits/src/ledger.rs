//! The store-backed credit ledger.
//!
//! Answers "how many credits does this account have right now" and
//! "charge N credits if affordable". Balance mutations go through the
//! store's conditional updates inside the retry wrapper; an unaffordable
//! charge is a business outcome ([`ChargeOutcome::Insufficient`]), never
//! an error.

use chrono::{DateTime, Duration, Utc};

use podium_store::{AccountStore, CancellationSignal, RetryPolicy, StoreError, StorePool};
use podium_types::AccountId;

use crate::accrual::accrue;

/// Upper bound on accrual persist races before giving up and returning
/// the freshest read. Two concurrent readers settle in one round.
const MAX_ACCRUAL_ROUNDS: u32 = 3;

/// Errors from ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum CreditError {
    /// The data layer failed (non-transient, exhausted, or cancelled).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The account does not exist.
    #[error("unknown account: {0}")]
    UnknownAccount(AccountId),
}

/// Result of a charge attempt.
///
/// Callers branch on this; insufficiency is expected and frequent, so it
/// is not an `Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeOutcome {
    /// The conditional decrement succeeded.
    Charged {
        /// Balance remaining after the charge.
        remaining: i64,
    },
    /// The balance did not cover the amount (or a concurrent charge won
    /// the race). Nothing was mutated.
    Insufficient,
}

/// An account's up-to-date balance and next-credit ETA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceView {
    /// Spendable credits right now.
    pub balance: i64,
    /// Time until the next credit accrues.
    pub next_credit_in: Duration,
}

/// The credit ledger.
///
/// Cheap to clone; all clones share the underlying pool.
#[derive(Clone)]
pub struct CreditLedger {
    pool: StorePool,
    policy: RetryPolicy,
}

impl CreditLedger {
    /// Create a ledger over a store pool with the default retry policy.
    pub fn new(pool: StorePool) -> Self {
        Self {
            pool,
            policy: RetryPolicy::default(),
        }
    }

    /// Override the retry policy (mainly for tests).
    #[must_use]
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Compute the account's current balance, applying any accrued
    /// credits, and return it with the next-credit ETA.
    ///
    /// The accrual persist is conditional on the anchor we read; if a
    /// concurrent accrual moved it first we re-read and recompute, so the
    /// same elapsed interval is never granted twice.
    ///
    /// # Errors
    ///
    /// Returns [`CreditError::UnknownAccount`] for a missing account and
    /// [`CreditError::Store`] for data-layer failures.
    pub async fn current_balance(
        &self,
        id: AccountId,
        now: DateTime<Utc>,
        interval: Duration,
        cap: i64,
        cancel: &CancellationSignal,
    ) -> Result<BalanceView, CreditError> {
        for _ in 0..MAX_ACCRUAL_ROUNDS {
            let account = self
                .policy
                .run("account_get", cancel, || async {
                    AccountStore::new(self.pool.pool()).get(id).await
                })
                .await?
                .ok_or(CreditError::UnknownAccount(id))?;

            let accrual = accrue(account.credit_balance, account.last_accrual_at, now, interval, cap);

            if !accrual.changed {
                return Ok(BalanceView {
                    balance: accrual.new_balance,
                    next_credit_in: accrual.next_credit_in,
                });
            }

            let persisted = self
                .policy
                .run("accrual_persist", cancel, || async {
                    AccountStore::new(self.pool.pool())
                        .persist_accrual(
                            id,
                            account.last_accrual_at,
                            accrual.new_balance,
                            accrual.new_anchor,
                        )
                        .await
                })
                .await?;

            if persisted {
                if accrual.granted > 0 {
                    tracing::debug!(account = %id, granted = accrual.granted, balance = accrual.new_balance, "credits accrued");
                }
                return Ok(BalanceView {
                    balance: accrual.new_balance,
                    next_credit_in: accrual.next_credit_in,
                });
            }
            // Anchor moved underneath us; loop and re-read.
        }

        // Persist kept losing races; serve the freshest read without
        // granting anything ourselves.
        let account = self
            .policy
            .run("account_get", cancel, || async {
                AccountStore::new(self.pool.pool()).get(id).await
            })
            .await?
            .ok_or(CreditError::UnknownAccount(id))?;
        let accrual = accrue(account.credit_balance, account.last_accrual_at, now, interval, cap);
        Ok(BalanceView {
            balance: account.credit_balance,
            next_credit_in: accrual.next_credit_in,
        })
    }

    /// Atomically charge `amount` credits if the balance covers it.
    ///
    /// # Errors
    ///
    /// Returns [`CreditError::Store`] for data-layer failures; an
    /// unaffordable charge is [`ChargeOutcome::Insufficient`], not an error.
    pub async fn charge(
        &self,
        id: AccountId,
        amount: i64,
        cancel: &CancellationSignal,
    ) -> Result<ChargeOutcome, CreditError> {
        let remaining = self
            .policy
            .run("credit_charge", cancel, || async {
                AccountStore::new(self.pool.pool()).charge(id, amount).await
            })
            .await?;

        Ok(remaining.map_or(ChargeOutcome::Insufficient, |remaining| {
            ChargeOutcome::Charged { remaining }
        }))
    }

    /// Shift every account's accrual anchor forward by the time spent
    /// paused, capped at `now`, so paused wall-clock time never counts
    /// toward the next credit.
    ///
    /// Bulk and best-effort: a per-account failure is logged and skipped,
    /// never fatal to the resume. Returns the number of accounts shifted.
    ///
    /// # Errors
    ///
    /// Returns [`CreditError::Store`] only if the account roster itself
    /// cannot be read or the operation is cancelled.
    pub async fn resume(
        &self,
        pause_started_at: DateTime<Utc>,
        now: DateTime<Utc>,
        cancel: &CancellationSignal,
    ) -> Result<u64, CreditError> {
        let pause_secs = now
            .signed_duration_since(pause_started_at)
            .num_seconds()
            .max(0);

        let ids = self
            .policy
            .run("account_list_ids", cancel, || async {
                AccountStore::new(self.pool.pool()).list_ids().await
            })
            .await?;

        let mut shifted: u64 = 0;
        for id in ids {
            if cancel.is_cancelled() {
                return Err(CreditError::Store(StoreError::Cancelled));
            }
            let result = self
                .policy
                .run("accrual_shift", cancel, || async {
                    AccountStore::new(self.pool.pool())
                        .shift_accrual_anchor(id, pause_secs, now)
                        .await
                })
                .await;
            match result {
                Ok(true) => shifted = shifted.saturating_add(1),
                Ok(false) => {
                    tracing::warn!(account = %id, "account vanished during pause-resume shift");
                }
                Err(e) => {
                    tracing::warn!(account = %id, error = %e, "failed to shift accrual anchor");
                }
            }
        }

        tracing::info!(shifted, pause_secs, "accrual anchors shifted after pause");
        Ok(shifted)
    }

    /// Grant one credit to every account below `cap`. Returns the
    /// affected count.
    ///
    /// # Errors
    ///
    /// Returns [`CreditError::Store`] for data-layer failures.
    pub async fn give_all(
        &self,
        cap: i64,
        cancel: &CancellationSignal,
    ) -> Result<u64, CreditError> {
        let affected = self
            .policy
            .run("credits_give_all", cancel, || async {
                AccountStore::new(self.pool.pool()).give_all(cap).await
            })
            .await?;
        tracing::info!(affected, "granted one credit to all accounts below cap");
        Ok(affected)
    }

    /// Reset every balance to zero. Returns the affected count.
    ///
    /// # Errors
    ///
    /// Returns [`CreditError::Store`] for data-layer failures.
    pub async fn reset_all(&self, cancel: &CancellationSignal) -> Result<u64, CreditError> {
        let affected = self
            .policy
            .run("credits_reset_all", cancel, || async {
                AccountStore::new(self.pool.pool()).reset_all().await
            })
            .await?;
        tracing::info!(affected, "reset all credit balances to zero");
        Ok(affected)
    }
}
