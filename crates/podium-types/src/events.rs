//! The hub event catalog.
//!
//! Every message the notification hub routes to live sessions is a
//! [`HubEvent`]. The hub treats these as opaque named payloads -- it
//! routes them without interpreting their contents. Producers are the
//! vote transaction and the admin operations in the gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::AchievementInfo;
use crate::ids::AccountId;
use crate::structs::SettingsSnapshot;

/// A participant as rendered inside a broadcast payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Participant {
    /// The account the payload refers to.
    pub account_id: AccountId,
    /// Display name at broadcast time.
    pub username: String,
}

/// An event fanned out to live client sessions.
///
/// Serialized as internally tagged JSON (`{"type": "new_vote", ...}`) so
/// dashboard clients can switch on the `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HubEvent {
    /// A vote was recorded.
    NewVote {
        /// The sender, or `None` when the resolved visibility redacts it.
        sender: Option<Participant>,
        /// The vote's target.
        target: Participant,
        /// Metadata of the targeted achievement.
        achievement: AchievementInfo,
        /// Point weight of the vote.
        points: i16,
        /// When the vote was recorded.
        created_at: DateTime<Utc>,
    },
    /// Rank 1 of the global ranking changed hands.
    NewLeader {
        /// The new leader.
        leader: Participant,
        /// The leader's total score after the triggering vote.
        total_score: i64,
    },
    /// An admin changed the global settings.
    SettingsChanged {
        /// The settings now in effect.
        settings: SettingsSnapshot,
    },
    /// An admin reset every account's credits to zero.
    CreditsReset {
        /// Number of accounts affected.
        affected: u64,
    },
    /// An admin granted every account a credit.
    CreditsGiven {
        /// Number of accounts affected.
        affected: u64,
    },
    /// An admin removed all recorded votes.
    VotesReset {
        /// Number of vote rows removed.
        removed: u64,
    },
    /// An account was removed by moderation.
    UserKicked {
        /// The removed account.
        account: Participant,
    },
    /// Progress notification for a long-running admin sync.
    SyncProgress {
        /// Items completed so far.
        done: u64,
        /// Total items in the batch.
        total: u64,
    },
    /// A long-running admin sync finished.
    SyncComplete,
}

impl HubEvent {
    /// Short name of the event variant, used in structured log fields.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NewVote { .. } => "new_vote",
            Self::NewLeader { .. } => "new_leader",
            Self::SettingsChanged { .. } => "settings_changed",
            Self::CreditsReset { .. } => "credits_reset",
            Self::CreditsGiven { .. } => "credits_given",
            Self::VotesReset { .. } => "votes_reset",
            Self::UserKicked { .. } => "user_kicked",
            Self::SyncProgress { .. } => "sync_progress",
            Self::SyncComplete => "sync_complete",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn events_tag_with_type_field() {
        let event = HubEvent::SyncComplete;
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "sync_complete");
    }

    #[test]
    fn new_vote_omits_sender_when_redacted() {
        let event = HubEvent::NewVote {
            sender: None,
            target: Participant {
                account_id: AccountId::new(),
                username: String::from("alice"),
            },
            achievement: crate::catalog::CATALOG
                .first()
                .map(crate::catalog::Achievement::info)
                .unwrap(),
            points: 2,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "new_vote");
        assert!(json["sender"].is_null());
    }

    #[test]
    fn kind_matches_serde_tag() {
        let event = HubEvent::CreditsGiven { affected: 3 };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.kind());
    }
}
