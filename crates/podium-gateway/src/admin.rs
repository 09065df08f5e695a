//! Admin endpoint handlers.
//!
//! Every handler here first resolves the caller through
//! [`require_admin`]; the `is_admin` flag lives on the account row, so
//! a revoked admin loses access on their next request. All mutations
//! broadcast a [`HubEvent`] so connected dashboards update live.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/admin/voting/pause` | Pause vote casting |
//! | `POST` | `/api/admin/voting/resume` | Resume and shift accrual anchors |
//! | `POST` | `/api/admin/credits/give` | Grant every account a credit |
//! | `POST` | `/api/admin/credits/reset` | Zero every balance |
//! | `POST` | `/api/admin/votes/reset` | Remove all recorded votes |
//! | `PUT` | `/api/admin/settings` | Change the visibility mode |
//! | `DELETE` | `/api/admin/accounts/{id}` | Remove an account |

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use podium_store::{AccountStore, VoteStore};
use podium_types::{Account, AccountId, HubEvent, Participant, SettingsSnapshot, VisibilityMode};

use crate::error::GatewayError;
use crate::handlers::account_from_headers;
use crate::state::AppState;

/// Resolve the caller and verify the `is_admin` flag on their account.
///
/// # Errors
///
/// `401` without an identity header, `403` when the account exists but
/// is not an admin, `404` when it does not exist.
pub async fn require_admin(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Account, GatewayError> {
    let id = account_from_headers(headers)?;

    let account = AccountStore::new(state.pool.pool())
        .get(id)
        .await?
        .ok_or_else(|| GatewayError::NotFound(format!("account {id}")))?;

    if !account.is_admin {
        tracing::warn!(account = %id, "non-admin called an admin endpoint");
        return Err(GatewayError::Forbidden(String::from(
            "admin rights required",
        )));
    }

    Ok(account)
}

/// Response body for bulk operations: how many rows were touched.
#[derive(Debug, Serialize)]
pub struct AffectedResponse {
    /// Number of rows the operation touched.
    pub affected: u64,
}

// ---------------------------------------------------------------------------
// Pause / resume
// ---------------------------------------------------------------------------

/// Pause vote casting globally.
///
/// Idempotent: pausing an already-paused service keeps the original
/// pause start so the eventual resume shifts by the full paused span.
///
/// # Errors
///
/// Admin-gate errors only.
pub async fn pause_voting(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<SettingsSnapshot>, GatewayError> {
    let admin = require_admin(&state, &headers).await?;

    let newly_paused = state.settings.pause(Utc::now());
    let settings = state.settings.snapshot();

    if newly_paused {
        tracing::info!(admin = %admin.id, "voting paused");
        state.hub.broadcast(HubEvent::SettingsChanged {
            settings: settings.clone(),
        });
    }

    Ok(Json(settings))
}

/// Resume vote casting and shift every accrual anchor by the paused
/// span, so paused wall-clock time never counts toward a credit.
///
/// # Errors
///
/// Admin-gate errors, plus storage errors from the anchor shift.
pub async fn resume_voting(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<SettingsSnapshot>, GatewayError> {
    let admin = require_admin(&state, &headers).await?;

    if let Some(pause_started_at) = state.settings.resume() {
        let shifted = state
            .ledger
            .resume(pause_started_at, Utc::now(), &state.cancel)
            .await?;
        tracing::info!(admin = %admin.id, shifted, "voting resumed");

        let settings = state.settings.snapshot();
        state.hub.broadcast(HubEvent::SettingsChanged {
            settings: settings.clone(),
        });
        Ok(Json(settings))
    } else {
        // Resume without a pause is a no-op, not an error.
        Ok(Json(state.settings.snapshot()))
    }
}

// ---------------------------------------------------------------------------
// Bulk credit operations
// ---------------------------------------------------------------------------

/// Grant one credit to every account below the cap.
///
/// # Errors
///
/// Admin-gate and storage errors.
pub async fn give_all_credits(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<AffectedResponse>, GatewayError> {
    let admin = require_admin(&state, &headers).await?;
    let settings = state.settings.snapshot();

    let affected = state
        .ledger
        .give_all(settings.credit_cap, &state.cancel)
        .await?;
    tracing::info!(admin = %admin.id, affected, "credits granted to all");

    state.hub.broadcast(HubEvent::CreditsGiven { affected });
    Ok(Json(AffectedResponse { affected }))
}

/// Reset every credit balance to zero.
///
/// # Errors
///
/// Admin-gate and storage errors.
pub async fn reset_all_credits(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<AffectedResponse>, GatewayError> {
    let admin = require_admin(&state, &headers).await?;

    let affected = state.ledger.reset_all(&state.cancel).await?;
    tracing::info!(admin = %admin.id, affected, "all credit balances reset");

    state.hub.broadcast(HubEvent::CreditsReset { affected });
    Ok(Json(AffectedResponse { affected }))
}

// ---------------------------------------------------------------------------
// Vote reset
// ---------------------------------------------------------------------------

/// Remove all recorded votes. Balances are untouched.
///
/// # Errors
///
/// Admin-gate and storage errors.
pub async fn reset_all_votes(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<AffectedResponse>, GatewayError> {
    let admin = require_admin(&state, &headers).await?;

    let removed = VoteStore::new(state.pool.pool()).reset_all().await?;
    tracing::info!(admin = %admin.id, removed, "all votes removed");

    state.hub.broadcast(HubEvent::VotesReset { removed });
    Ok(Json(AffectedResponse { affected: removed }))
}

// ---------------------------------------------------------------------------
// Visibility mode
// ---------------------------------------------------------------------------

/// Request body for `PUT /api/admin/settings`.
#[derive(Debug, Deserialize)]
pub struct UpdateSettingsBody {
    /// The visibility mode to switch to.
    pub visibility: VisibilityMode,
}

/// Change the broadcast-time sender visibility mode.
///
/// Takes effect for votes cast after the change; already-broadcast
/// events are not rewritten.
///
/// # Errors
///
/// Admin-gate errors only.
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<UpdateSettingsBody>,
) -> Result<Json<SettingsSnapshot>, GatewayError> {
    let admin = require_admin(&state, &headers).await?;

    state.settings.set_visibility(body.visibility);
    let settings = state.settings.snapshot();
    tracing::info!(admin = %admin.id, visibility = ?body.visibility, "visibility mode changed");

    state.hub.broadcast(HubEvent::SettingsChanged {
        settings: settings.clone(),
    });
    Ok(Json(settings))
}

// ---------------------------------------------------------------------------
// Account removal
// ---------------------------------------------------------------------------

/// Remove an account. Its votes cascade away with it.
///
/// # Errors
///
/// Admin-gate errors, `404` for an unknown account.
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<AffectedResponse>, GatewayError> {
    let admin = require_admin(&state, &headers).await?;
    let target = AccountId::from(id);

    let store = AccountStore::new(state.pool.pool());
    let account = store
        .get(target)
        .await?
        .ok_or_else(|| GatewayError::NotFound(format!("account {target}")))?;

    let removed = store.delete(target).await?;
    if !removed {
        return Err(GatewayError::NotFound(format!("account {target}")));
    }
    tracing::info!(admin = %admin.id, account = %target, "account removed");

    state.hub.broadcast(HubEvent::UserKicked {
        account: Participant {
            account_id: account.id,
            username: account.username,
        },
    });
    Ok(Json(AffectedResponse { affected: 1 }))
}
