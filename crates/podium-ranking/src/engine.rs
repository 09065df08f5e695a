//! Store-backed ranking engine.
//!
//! Fetches the roster and the valid vote set through the retry wrapper
//! and hands them to the pure computation in [`crate::ranking`]. No
//! caching: every call reflects the vote table as of the read.

use podium_store::{AccountStore, CancellationSignal, RetryPolicy, StoreError, StorePool, VoteStore};
use podium_types::{RankingRow, TopThree};

use crate::ranking::{global_ranking, is_active, top_three};

/// Errors from ranking reads.
#[derive(Debug, thiserror::Error)]
pub enum RankingError {
    /// The data layer failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The computed standings plus the activation gate input.
#[derive(Debug, Clone)]
pub struct Standings {
    /// Ranked rows, best first.
    pub rows: Vec<RankingRow>,
    /// Valid votes recorded so far.
    pub total_votes: u64,
}

impl Standings {
    /// Whether the ranking may be displayed with ranks.
    pub const fn is_active(&self, min_votes: u64) -> bool {
        is_active(self.total_votes, min_votes)
    }

    /// The current podium.
    pub fn top_three(&self) -> TopThree {
        top_three(&self.rows)
    }
}

/// Read-only standings computation over the store.
///
/// Cheap to clone; safe to call at any rate from any number of tasks.
#[derive(Clone)]
pub struct RankingEngine {
    pool: StorePool,
    policy: RetryPolicy,
}

impl RankingEngine {
    /// Create an engine over a store pool with the default retry policy.
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

    /// Compute the current standings from a fresh read of the store.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::Store`] if either read fails.
    pub async fn standings(&self, cancel: &CancellationSignal) -> Result<Standings, RankingError> {
        let roster = self
            .policy
            .run("ranking_roster", cancel, || async {
                AccountStore::new(self.pool.pool()).list().await
            })
            .await?;

        let votes = self
            .policy
            .run("ranking_votes", cancel, || async {
                VoteStore::new(self.pool.pool()).fetch_valid().await
            })
            .await?;

        let total_votes = u64::try_from(votes.len()).unwrap_or(u64::MAX);
        let rows = global_ranking(&roster, &votes);

        Ok(Standings { rows, total_votes })
    }
}
