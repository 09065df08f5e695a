//! Account persistence and conditional balance updates.
//!
//! The credit balance is the most contended row in the system. It is never
//! mutated through read-modify-write at the application layer: every
//! mutation here is a single conditional `UPDATE` whose affected-row count
//! (or `RETURNING` row) tells the caller whether the precondition held.
//! Concurrent chargers therefore cannot both succeed against a stale read.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use podium_types::{Account, AccountId};

use crate::error::StoreError;

/// Operations on the `accounts` table.
pub struct AccountStore<'a> {
    pool: &'a PgPool,
}

/// Raw row shape of the `accounts` table.
#[derive(Debug, sqlx::FromRow)]
pub struct AccountRow {
    /// Internal identifier.
    pub id: Uuid,
    /// External authentication identity.
    pub external_id: String,
    /// Display name.
    pub username: String,
    /// Cached avatar URL.
    pub avatar_url: Option<String>,
    /// Current credit balance.
    pub credit_balance: i64,
    /// Accrual anchor timestamp.
    pub last_accrual_at: DateTime<Utc>,
    /// Admin flag.
    pub is_admin: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Self {
            id: AccountId::from(row.id),
            external_id: row.external_id,
            username: row.username,
            avatar_url: row.avatar_url,
            credit_balance: row.credit_balance,
            last_accrual_at: row.last_accrual_at,
            is_admin: row.is_admin,
            created_at: row.created_at,
        }
    }
}

/// Columns selected for every account read.
const ACCOUNT_COLUMNS: &str =
    "id, external_id, username, avatar_url, credit_balance, last_accrual_at, is_admin, created_at";

impl<'a> AccountStore<'a> {
    /// Create a new account store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create the account for an external identity, or refresh its profile
    /// fields if it already exists.
    ///
    /// Called by the authentication collaborator on every successful login.
    /// The credit fields are untouched on conflict.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the upsert fails.
    pub async fn upsert_on_login(
        &self,
        external_id: &str,
        username: &str,
        avatar_url: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Account, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r"INSERT INTO accounts (id, external_id, username, avatar_url, credit_balance, last_accrual_at, created_at)
              VALUES ($1, $2, $3, $4, 0, $5, $5)
              ON CONFLICT (external_id)
              DO UPDATE SET username = EXCLUDED.username, avatar_url = EXCLUDED.avatar_url
              RETURNING id, external_id, username, avatar_url, credit_balance, last_accrual_at, is_admin, created_at",
        )
        .bind(AccountId::new().into_inner())
        .bind(external_id)
        .bind(username)
        .bind(avatar_url)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Fetch a single account by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the query fails.
    pub async fn get(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Fetch every account, username ascending.
    ///
    /// The ranking engine uses this as the roster: accounts with zero
    /// votes still appear in the standings.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the query fails.
    pub async fn list(&self) -> Result<Vec<Account>, StoreError> {
        let rows = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY username"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Every account id, for bulk per-row operations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the query fails.
    pub async fn list_ids(&self) -> Result<Vec<AccountId>, StoreError> {
        let ids: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM accounts")
            .fetch_all(self.pool)
            .await?;

        Ok(ids.into_iter().map(|(id,)| AccountId::from(id)).collect())
    }

    /// Persist an accrual computed by the credit ledger.
    ///
    /// Conditional on the accrual anchor still matching what the ledger
    /// read, so two concurrent accruals for the same account cannot both
    /// grant the same elapsed intervals. Returns `false` when the anchor
    /// moved underneath us -- the caller simply re-reads.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the update fails.
    pub async fn persist_accrual(
        &self,
        id: AccountId,
        expected_anchor: DateTime<Utc>,
        new_balance: i64,
        new_anchor: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r"UPDATE accounts
              SET credit_balance = $3, last_accrual_at = $4
              WHERE id = $1 AND last_accrual_at = $2",
        )
        .bind(id.into_inner())
        .bind(expected_anchor)
        .bind(new_balance)
        .bind(new_anchor)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Atomically charge `amount` credits if the balance covers it.
    ///
    /// A single conditional `UPDATE ... WHERE credit_balance >= amount
    /// RETURNING credit_balance`. Returns the remaining balance on success,
    /// or `None` when the account could not afford the charge -- a business
    /// outcome, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the update fails.
    pub async fn charge(&self, id: AccountId, amount: i64) -> Result<Option<i64>, StoreError> {
        let remaining: Option<(i64,)> = sqlx::query_as(
            r"UPDATE accounts
              SET credit_balance = credit_balance - $2
              WHERE id = $1 AND credit_balance >= $2
              RETURNING credit_balance",
        )
        .bind(id.into_inner())
        .bind(amount)
        .fetch_optional(self.pool)
        .await?;

        Ok(remaining.map(|(balance,)| balance))
    }

    /// Shift one account's accrual anchor forward by `shift_secs`, capped
    /// at `now` so the anchor can never land in the future.
    ///
    /// Used when resuming from a global pause: paused wall-clock time must
    /// not count toward the next credit.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the update fails.
    pub async fn shift_accrual_anchor(
        &self,
        id: AccountId,
        shift_secs: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r"UPDATE accounts
              SET last_accrual_at = LEAST(last_accrual_at + make_interval(secs => $2), $3)
              WHERE id = $1",
        )
        .bind(id.into_inner())
        .bind(f64::from(u32::try_from(shift_secs.max(0)).unwrap_or(u32::MAX)))
        .bind(now)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Grant one credit to every account below `cap`.
    ///
    /// Returns the affected-row count; accounts already at the cap are
    /// untouched, keeping the balance-bound invariant.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the update fails.
    pub async fn give_all(&self, cap: i64) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE accounts SET credit_balance = credit_balance + 1 WHERE credit_balance < $1",
        )
        .bind(cap)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Reset every non-zero balance to zero. Returns the affected count.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the update fails.
    pub async fn reset_all(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("UPDATE accounts SET credit_balance = 0 WHERE credit_balance <> 0")
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Remove an account by moderation. Cascades to its votes (both sent
    /// and received) via the foreign-key constraints.
    ///
    /// Returns `false` if the account did not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the delete fails.
    pub async fn delete(&self, id: AccountId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id.into_inner())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
