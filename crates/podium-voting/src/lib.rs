//! Atomic vote transaction orchestration for the Podium voting service.
//!
//! [`cast::VoteTransaction`] is the single path through which votes enter
//! the system: it validates the request, gates on the settings snapshot,
//! charges credits and records the vote in one durable transaction, and
//! drives the notification hub -- including the new-leader re-check.
//!
//! # Modules
//!
//! - [`visibility`] -- Pure broadcast-time sender visibility
//! - [`cast`] -- The transaction itself and its outcome types

pub mod cast;
pub mod visibility;

pub use cast::{
    leader_changed, validate_request, VoteError, VoteOutcome, VoteRequest, VoteTransaction,
};
pub use visibility::{default_secrecy, sender_redacted};
