//! Deterministic standings computation for the Podium voting service.
//!
//! The ranking is derived, never persisted: net votes from the vote
//! table, positional bonuses from top-3 standings on bonus-eligible
//! achievements, competition ranks with deterministic tie-breaks.
//!
//! # Modules
//!
//! - [`bonus`] -- Positional bonus points per achievement
//! - [`ranking`] -- Pure global ranking, podium, and activation gate
//! - [`engine`] -- Store-backed [`engine::RankingEngine`]

pub mod bonus;
pub mod engine;
pub mod ranking;

pub use bonus::bonus_points;
pub use engine::{RankingEngine, RankingError, Standings};
pub use ranking::{current_leader, global_ranking, is_active, top_three};
