//! HTTP and `WebSocket` gateway for the Podium voting service.
//!
//! This crate provides an Axum server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws`) streaming [`HubEvent`]s from the
//!   notification hub as JSON text frames
//! - **REST endpoints** for casting votes and reading the catalog,
//!   credits, settings, and standings
//! - **Admin REST endpoints** for runtime control (pause, resume, bulk
//!   credit operations, vote reset, visibility mode, moderation removal)
//! - **Minimal HTML status page** (`GET /`)
//!
//! # Identity
//!
//! The gateway performs no authentication itself. A fronting auth proxy
//! installs the caller's account id in the `x-account-id` header;
//! authorization (the admin gate) is checked against the account row on
//! every admin request.
//!
//! [`HubEvent`]: podium_types::HubEvent

pub mod admin;
pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod settings;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use config::{ConfigError, GatewayConfig};
pub use error::GatewayError;
pub use router::build_router;
pub use server::{start_server, ServerError};
pub use settings::SettingsState;
pub use state::AppState;
