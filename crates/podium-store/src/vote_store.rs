//! Vote persistence and the atomic charge-and-record transaction.
//!
//! A vote must never be recorded unpaid, and a charge must never be
//! stranded without its vote. [`VoteStore::charge_and_insert`] therefore
//! runs the conditional balance decrement and the vote insert inside one
//! database transaction: if the insert fails after the charge succeeded,
//! the whole transaction rolls back and the credit is returned.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use podium_types::{AccountId, Vote, VoteId};

use crate::error::StoreError;

/// Result of attempting to pay for and record a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaidVote {
    /// The charge went through and the vote row is durable.
    Recorded {
        /// The actor's balance after the charge.
        remaining_credits: i64,
    },
    /// The conditional charge matched no row: the actor lost the race or
    /// never had the credits. Nothing was written.
    Insufficient,
}

/// Raw row shape of the `votes` table.
#[derive(Debug, sqlx::FromRow)]
pub struct VoteRow {
    /// Internal identifier.
    pub id: Uuid,
    /// Voting account.
    pub from_account: Uuid,
    /// Receiving account.
    pub to_account: Uuid,
    /// Catalog identifier.
    pub achievement_id: String,
    /// Point weight.
    pub points: i16,
    /// Voter's secrecy choice.
    pub is_secret: bool,
    /// Admin soft-exclusion flag.
    pub invalidated: bool,
    /// Insertion timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<VoteRow> for Vote {
    fn from(row: VoteRow) -> Self {
        Self {
            id: VoteId::from(row.id),
            from_account: AccountId::from(row.from_account),
            to_account: AccountId::from(row.to_account),
            achievement_id: row.achievement_id,
            points: row.points,
            is_secret: row.is_secret,
            invalidated: row.invalidated,
            created_at: row.created_at,
        }
    }
}

/// Operations on the `votes` table.
pub struct VoteStore<'a> {
    pool: &'a PgPool,
}

impl<'a> VoteStore<'a> {
    /// Create a new vote store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Charge the voter and record the vote in a single transaction.
    ///
    /// The charge is the same conditional decrement as
    /// [`AccountStore::charge`](crate::AccountStore::charge); when it
    /// matches no row the transaction is rolled back and
    /// [`PaidVote::Insufficient`] is returned with no side effects.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if either statement or the commit
    /// fails; the transaction is rolled back on drop in that case.
    pub async fn charge_and_insert(&self, vote: &Vote) -> Result<PaidVote, StoreError> {
        let mut tx = self.pool.begin().await?;

        let remaining: Option<(i64,)> = sqlx::query_as(
            r"UPDATE accounts
              SET credit_balance = credit_balance - $2
              WHERE id = $1 AND credit_balance >= $2
              RETURNING credit_balance",
        )
        .bind(vote.from_account.into_inner())
        .bind(i64::from(vote.points))
        .fetch_optional(&mut *tx)
        .await?;

        let Some((remaining_credits,)) = remaining else {
            tx.rollback().await?;
            return Ok(PaidVote::Insufficient);
        };

        sqlx::query(
            r"INSERT INTO votes (id, from_account, to_account, achievement_id, points, is_secret, created_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(vote.id.into_inner())
        .bind(vote.from_account.into_inner())
        .bind(vote.to_account.into_inner())
        .bind(&vote.achievement_id)
        .bind(vote.points)
        .bind(vote.is_secret)
        .bind(vote.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(
            vote_id = %vote.id,
            from = %vote.from_account,
            to = %vote.to_account,
            achievement = vote.achievement_id,
            points = vote.points,
            remaining_credits,
            "vote recorded"
        );

        Ok(PaidVote::Recorded { remaining_credits })
    }

    /// Fetch every non-invalidated vote, oldest first.
    ///
    /// This is the ranking engine's working set; the `created_at` order
    /// makes the bonus tie-break deterministic without re-sorting.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the query fails.
    pub async fn fetch_valid(&self) -> Result<Vec<Vote>, StoreError> {
        let rows = sqlx::query_as::<_, VoteRow>(
            r"SELECT id, from_account, to_account, achievement_id, points, is_secret, invalidated, created_at
              FROM votes
              WHERE invalidated = FALSE
              ORDER BY created_at, id",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Count non-invalidated votes (the ranking activation gate input).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the query fails.
    pub async fn count_valid(&self) -> Result<u64, StoreError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM votes WHERE invalidated = FALSE")
                .fetch_one(self.pool)
                .await?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Delete every vote row (admin reset). Returns the removed count.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the delete fails.
    pub async fn reset_all(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM votes").execute(self.pool).await?;
        Ok(result.rows_affected())
    }
}
