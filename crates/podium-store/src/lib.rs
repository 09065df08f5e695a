//! `PostgreSQL` data layer for the Podium voting service.
//!
//! The relational store is the system's single serialization point for
//! balance and vote mutations: everything contended goes through
//! conditional updates with affected-row checks, wrapped in the
//! transient-contention retry policy.
//!
//! # Modules
//!
//! - [`pool`] -- Connection pool and migrations
//! - [`account_store`] -- Account rows and conditional balance updates
//! - [`vote_store`] -- Vote rows and the atomic charge-and-record transaction
//! - [`retry`] -- Exponential-backoff retry wrapper and cancellation signal
//! - [`error`] -- [`StoreError`]

pub mod account_store;
pub mod error;
pub mod pool;
pub mod retry;
pub mod vote_store;

pub use account_store::{AccountRow, AccountStore};
pub use error::StoreError;
pub use pool::{StoreConfig, StorePool};
pub use retry::{is_transient, CancellationSignal, RetryPolicy};
pub use vote_store::{PaidVote, VoteRow, VoteStore};
