//! Enumeration types for the Podium voting service.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Achievement polarity
// ---------------------------------------------------------------------------

/// Whether an achievement adds to or subtracts from the target's net votes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Points received count toward the target's score.
    Positive,
    /// Points received count against the target's score.
    Negative,
}

impl Polarity {
    /// Returns `true` for [`Polarity::Positive`].
    pub const fn is_positive(self) -> bool {
        matches!(self, Self::Positive)
    }
}

// ---------------------------------------------------------------------------
// Vote visibility mode
// ---------------------------------------------------------------------------

/// Global broadcast-visibility mode for vote sender identities.
///
/// Evaluated at broadcast time, never stored on the vote row, so changing
/// the mode affects how future broadcasts render and nothing in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum VisibilityMode {
    /// Every vote is broadcast anonymously regardless of the voter's choice.
    AllSecret,
    /// Every vote is broadcast with the sender attributed.
    AllPublic,
    /// The voter's own `is_secret` flag decides.
    PerVoter,
}

// ---------------------------------------------------------------------------
// Vote rejection reasons
// ---------------------------------------------------------------------------

/// Why a vote request was rejected.
///
/// Rejections are expected business outcomes, returned as ordinary values
/// for callers to branch on -- never surfaced as errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum VoteRejection {
    /// The actor targeted their own account.
    SelfVote,
    /// The point value was outside the allowed 1..=3 range.
    InvalidPoints {
        /// The point value that was submitted.
        points: i16,
    },
    /// The achievement identifier does not exist in the catalog.
    UnknownAchievement {
        /// The identifier that failed lookup.
        achievement_id: String,
    },
    /// Voting is globally paused.
    VotingPaused,
    /// The actor cannot afford the vote.
    InsufficientCredits {
        /// The actor's current balance, so the client can render it
        /// without a second round-trip.
        balance: i64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polarity_positive_check() {
        assert!(Polarity::Positive.is_positive());
        assert!(!Polarity::Negative.is_positive());
    }

    #[test]
    fn rejection_serializes_with_reason_tag() {
        let json = serde_json::to_value(VoteRejection::InsufficientCredits { balance: 2 })
            .unwrap_or_default();
        assert_eq!(json["reason"], "insufficient_credits");
        assert_eq!(json["balance"], 2);
    }
}
