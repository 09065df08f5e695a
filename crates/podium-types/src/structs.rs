//! Core entity structs for the Podium voting service.
//!
//! Covers the persisted entities (`Account`, `Vote`), the derived ranking
//! rows, and the global settings snapshot passed into every vote
//! transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::VisibilityMode;
use crate::ids::{AccountId, VoteId};

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// A participant identity with a credit balance and vote history.
///
/// Created on first successful external authentication; the credit fields
/// are only ever mutated through conditional updates at the store layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Account {
    /// Internal identifier.
    pub id: AccountId,
    /// Stable identity from the external authentication provider.
    pub external_id: String,
    /// Display name shown on the leaderboard.
    pub username: String,
    /// Cached avatar URL, populated by the profile-fetch collaborator.
    pub avatar_url: Option<String>,
    /// Spendable credit balance. Invariant: `0 <= credit_balance <= cap`.
    pub credit_balance: i64,
    /// Anchor timestamp for credit accrual. Advanced by whole intervals,
    /// never snapped to "now", so partial-interval progress is kept.
    pub last_accrual_at: DateTime<Utc>,
    /// Whether the account may call admin operations.
    pub is_admin: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Vote
// ---------------------------------------------------------------------------

/// A recorded vote: an edge from one account to another.
///
/// Immutable after insert except for the admin-controlled `invalidated`
/// flag, which soft-excludes the row from ranking and broadcasts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Vote {
    /// Internal identifier.
    pub id: VoteId,
    /// The voting account. Invariant: `from_account != to_account`.
    pub from_account: AccountId,
    /// The account receiving the vote.
    pub to_account: AccountId,
    /// Catalog identifier of the targeted achievement.
    pub achievement_id: String,
    /// Point weight. Invariant: `1 <= points <= 3`.
    pub points: i16,
    /// The voter's own secrecy choice, as resolved at cast time.
    pub is_secret: bool,
    /// Admin soft-exclusion flag.
    pub invalidated: bool,
    /// Insertion timestamp; the bonus tie-break key.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Ranking rows
// ---------------------------------------------------------------------------

/// One account's standing in the derived global ranking.
///
/// Recomputed on demand from the vote table; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RankingRow {
    /// The ranked account.
    pub account_id: AccountId,
    /// Display name, also the deterministic tie-break key.
    pub username: String,
    /// Positive points received minus negative points received.
    pub net_votes: i64,
    /// Cumulative top-3 bonus across bonus-eligible achievements.
    pub bonus_points: i64,
    /// `net_votes + bonus_points`; the sort key.
    pub total_score: i64,
    /// 1-based competition rank (equal scores share a rank).
    pub rank: u32,
}

/// The current podium: up to three leading entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TopThree {
    /// Rank-1 entry, if anyone has been ranked.
    pub first: Option<RankingRow>,
    /// Rank-2 entry.
    pub second: Option<RankingRow>,
    /// Rank-3 entry.
    pub third: Option<RankingRow>,
}

// ---------------------------------------------------------------------------
// Settings snapshot
// ---------------------------------------------------------------------------

/// Point-in-time copy of the global mutable settings.
///
/// Read once at the start of each vote transaction so a concurrent admin
/// change cannot alter the outcome mid-operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SettingsSnapshot {
    /// Whether vote casting is globally paused.
    pub voting_paused: bool,
    /// Broadcast-time sender visibility mode.
    pub visibility: VisibilityMode,
    /// Seconds per accrued credit.
    pub credit_interval_secs: u64,
    /// Maximum credit balance any account may hold.
    pub credit_cap: i64,
    /// Total recorded votes required before ranks are displayed.
    pub min_votes_for_ranking: u64,
}

impl SettingsSnapshot {
    /// The accrual interval as a [`chrono::Duration`].
    pub fn credit_interval(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.credit_interval_secs).unwrap_or(i64::MAX))
    }
}

impl Default for SettingsSnapshot {
    fn default() -> Self {
        Self {
            voting_paused: false,
            visibility: VisibilityMode::PerVoter,
            credit_interval_secs: 1800,
            credit_cap: 10,
            min_votes_for_ranking: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_sane() {
        let s = SettingsSnapshot::default();
        assert!(!s.voting_paused);
        assert!(s.credit_cap > 0);
        assert_eq!(s.credit_interval(), chrono::Duration::seconds(1800));
    }
}
