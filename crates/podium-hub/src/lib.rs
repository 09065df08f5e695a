//! In-process notification hub for the Podium voting service.
//!
//! The hub is the serialization point for the live-session registry: the
//! vote transaction and admin operations push [`podium_types::HubEvent`]s
//! in, and every registered client session receives them without polling.
//! The hub routes payloads without interpreting them.

pub mod hub;

pub use hub::{HubHandle, SessionHandle, SESSION_QUEUE_CAPACITY};
