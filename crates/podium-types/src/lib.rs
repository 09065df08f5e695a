//! Shared type definitions for the Podium voting service.
//!
//! This crate is the single source of truth for all types used across the
//! Podium workspace. Types defined here flow downstream to `TypeScript`
//! via `ts-rs` for the dashboard client.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for entity identifiers
//! - [`enums`] -- Polarity, visibility mode, and rejection reasons
//! - [`catalog`] -- The static achievement catalog
//! - [`structs`] -- Core entity structs (accounts, votes, ranking, settings)
//! - [`events`] -- The hub event catalog fanned out to live sessions

pub mod catalog;
pub mod enums;
pub mod events;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use catalog::{Achievement, AchievementInfo, CATALOG};
pub use enums::{Polarity, VisibilityMode, VoteRejection};
pub use events::{HubEvent, Participant};
pub use ids::{AccountId, SessionId, VoteId};
pub use structs::{Account, RankingRow, SettingsSnapshot, TopThree, Vote};

#[cfg(test)]
mod tests {
    //! Integration tests for type exports and `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs generates TypeScript bindings when types with
        // #[ts(export)] are used. Importing them here triggers generation.
        // The actual files are written to the `bindings/` directory
        // relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::AccountId::export_all();
        let _ = crate::ids::VoteId::export_all();
        let _ = crate::ids::SessionId::export_all();

        // Enums
        let _ = crate::enums::Polarity::export_all();
        let _ = crate::enums::VisibilityMode::export_all();
        let _ = crate::enums::VoteRejection::export_all();

        // Structs
        let _ = crate::catalog::AchievementInfo::export_all();
        let _ = crate::structs::Account::export_all();
        let _ = crate::structs::Vote::export_all();
        let _ = crate::structs::RankingRow::export_all();
        let _ = crate::structs::TopThree::export_all();
        let _ = crate::structs::SettingsSnapshot::export_all();

        // Events
        let _ = crate::events::Participant::export_all();
        let _ = crate::events::HubEvent::export_all();
    }
}
