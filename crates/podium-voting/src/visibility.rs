//! Broadcast-time sender visibility.
//!
//! Visibility is a pure function of the global mode and the vote's own
//! secrecy flag, evaluated when the broadcast is built -- never stored.
//! Changing the global mode therefore affects how future broadcasts
//! render and nothing already in storage or already queued.

use podium_types::{Polarity, VisibilityMode};

/// Whether the sender must be redacted from a broadcast.
///
/// - `AllSecret` forces anonymity regardless of the voter's choice.
/// - `AllPublic` forces attribution regardless of the voter's choice.
/// - `PerVoter` honors the vote's resolved `is_secret` flag.
pub const fn sender_redacted(mode: VisibilityMode, is_secret: bool) -> bool {
    match mode {
        VisibilityMode::AllSecret => true,
        VisibilityMode::AllPublic => false,
        VisibilityMode::PerVoter => is_secret,
    }
}

/// Default secrecy when the voter expressed no preference: negative
/// achievements default to secret, positive ones to attributed.
pub const fn default_secrecy(polarity: Polarity) -> bool {
    !polarity.is_positive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_secret_overrides_a_public_vote() {
        // Global mode "all secret": even a vote cast with is_secret=false
        // is broadcast with the sender redacted.
        assert!(sender_redacted(VisibilityMode::AllSecret, false));
        assert!(sender_redacted(VisibilityMode::AllSecret, true));
    }

    #[test]
    fn all_public_overrides_a_secret_vote() {
        assert!(!sender_redacted(VisibilityMode::AllPublic, true));
        assert!(!sender_redacted(VisibilityMode::AllPublic, false));
    }

    #[test]
    fn per_voter_honors_the_flag() {
        assert!(sender_redacted(VisibilityMode::PerVoter, true));
        assert!(!sender_redacted(VisibilityMode::PerVoter, false));
    }

    #[test]
    fn negative_votes_default_to_secret() {
        assert!(default_secrecy(Polarity::Negative));
        assert!(!default_secrecy(Polarity::Positive));
    }
}
