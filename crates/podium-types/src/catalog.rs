//! The static achievement catalog.
//!
//! Achievements are a small, versioned table compiled into the binary.
//! They change with deploys, not user action, so there is no runtime
//! mutation path: the catalog is a `&'static` slice with lookup helpers.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::Polarity;

/// A catalog entry that votes can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Achievement {
    /// Stable string identifier stored on vote rows.
    pub id: &'static str,
    /// Human-readable name shown to clients.
    pub display_name: &'static str,
    /// Whether received points count for or against the target.
    pub polarity: Polarity,
    /// Whether top-3 standing on this achievement awards bonus points.
    pub bonus_eligible: bool,
}

impl Achievement {
    /// Build the serializable projection used in API payloads and
    /// hub broadcasts.
    pub fn info(&self) -> AchievementInfo {
        AchievementInfo {
            id: self.id.to_owned(),
            display_name: self.display_name.to_owned(),
            polarity: self.polarity,
            bonus_eligible: self.bonus_eligible,
        }
    }
}

/// Serializable projection of an [`Achievement`] for wire payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AchievementInfo {
    /// Stable string identifier.
    pub id: String,
    /// Human-readable name.
    pub display_name: String,
    /// Polarity of the achievement.
    pub polarity: Polarity,
    /// Whether top-3 standing awards bonus points.
    pub bonus_eligible: bool,
}

/// The compiled-in achievement table.
///
/// Identifiers must stay stable across deploys -- vote rows reference them
/// by string. Add new entries at the end; never reuse a retired id.
pub const CATALOG: &[Achievement] = &[
    Achievement {
        id: "mvp",
        display_name: "Most Valuable Player",
        polarity: Polarity::Positive,
        bonus_eligible: true,
    },
    Achievement {
        id: "clutch",
        display_name: "Clutch Moment",
        polarity: Polarity::Positive,
        bonus_eligible: true,
    },
    Achievement {
        id: "team_player",
        display_name: "Team Player",
        polarity: Polarity::Positive,
        bonus_eligible: true,
    },
    Achievement {
        id: "strategist",
        display_name: "Master Strategist",
        polarity: Polarity::Positive,
        bonus_eligible: true,
    },
    Achievement {
        id: "good_sport",
        display_name: "Good Sport",
        polarity: Polarity::Positive,
        bonus_eligible: false,
    },
    Achievement {
        id: "rage_quit",
        display_name: "Rage Quit",
        polarity: Polarity::Negative,
        bonus_eligible: false,
    },
    Achievement {
        id: "afk",
        display_name: "Away From Keyboard",
        polarity: Polarity::Negative,
        bonus_eligible: false,
    },
    Achievement {
        id: "friendly_fire",
        display_name: "Friendly Fire",
        polarity: Polarity::Negative,
        bonus_eligible: false,
    },
];

/// Look up an achievement by its stable identifier.
///
/// Returns `None` for unknown identifiers; callers translate that into
/// the `unknown_achievement` rejection.
pub fn find(id: &str) -> Option<&'static Achievement> {
    CATALOG.iter().find(|a| a.id == id)
}

/// All bonus-eligible achievements, in catalog order.
pub fn bonus_eligible() -> impl Iterator<Item = &'static Achievement> {
    CATALOG.iter().filter(|a| a.bonus_eligible)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_known_id() {
        let mvp = find("mvp");
        assert!(mvp.is_some_and(|a| a.polarity == Polarity::Positive));
    }

    #[test]
    fn find_unknown_id_is_none() {
        assert!(find("does_not_exist").is_none());
    }

    #[test]
    fn catalog_ids_are_unique() {
        for (i, a) in CATALOG.iter().enumerate() {
            for b in CATALOG.iter().skip(i.saturating_add(1)) {
                assert_ne!(a.id, b.id, "duplicate catalog id {}", a.id);
            }
        }
    }

    #[test]
    fn bonus_eligible_entries_are_positive() {
        // Negative achievements never award podium bonuses.
        for a in bonus_eligible() {
            assert_eq!(a.polarity, Polarity::Positive);
        }
    }
}
