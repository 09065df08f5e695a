//! REST endpoint handlers for the gateway.
//!
//! Identity comes from the `x-account-id` header installed by the
//! fronting auth proxy; the gateway never talks to the identity
//! provider itself.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/achievements` | The static achievement catalog |
//! | `GET` | `/api/settings` | Current global settings |
//! | `GET` | `/api/credits` | Caller's balance and next-credit ETA |
//! | `GET` | `/api/ranking` | Current standings |
//! | `POST` | `/api/votes` | Cast a vote |

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use podium_types::{
    AccountId, AchievementInfo, RankingRow, SettingsSnapshot, TopThree, VoteRejection, CATALOG,
};
use podium_voting::{VoteOutcome, VoteRequest};

use crate::error::GatewayError;
use crate::state::AppState;

/// Header the fronting auth proxy sets to the caller's account id.
pub const ACCOUNT_HEADER: &str = "x-account-id";

/// Resolve the calling account from the request headers.
///
/// # Errors
///
/// Returns [`GatewayError::Unauthorized`] when the header is absent and
/// [`GatewayError::BadRequest`] when it is not a UUID.
pub fn account_from_headers(headers: &HeaderMap) -> Result<AccountId, GatewayError> {
    let raw = headers
        .get(ACCOUNT_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| GatewayError::Unauthorized(format!("missing {ACCOUNT_HEADER} header")))?;

    let uuid = Uuid::parse_str(raw)
        .map_err(|e| GatewayError::BadRequest(format!("malformed {ACCOUNT_HEADER}: {e}")))?;

    Ok(AccountId::from(uuid))
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing service status and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let settings = state.settings.snapshot();
    let sessions = state.hub.register_count();
    let paused = if settings.voting_paused { "paused" } else { "open" };

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Podium</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; }}
        a {{ color: #58a6ff; }}
        .stat {{ color: #7ee787; }}
    </style>
</head>
<body>
    <h1>Podium</h1>
    <p>Voting is <span class="stat">{paused}</span>.
       Live sessions: <span class="stat">{sessions}</span>.</p>
    <ul>
        <li><a href="/api/achievements">/api/achievements</a></li>
        <li><a href="/api/settings">/api/settings</a></li>
        <li><a href="/api/ranking">/api/ranking</a></li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /api/achievements
// ---------------------------------------------------------------------------

/// List the static achievement catalog.
pub async fn list_achievements() -> Json<Vec<AchievementInfo>> {
    Json(CATALOG.iter().map(podium_types::Achievement::info).collect())
}

// ---------------------------------------------------------------------------
// GET /api/settings
// ---------------------------------------------------------------------------

/// Return the current global settings snapshot.
pub async fn get_settings(State(state): State<Arc<AppState>>) -> Json<SettingsSnapshot> {
    Json(state.settings.snapshot())
}

// ---------------------------------------------------------------------------
// GET /api/credits
// ---------------------------------------------------------------------------

/// The caller's balance and time until the next credit.
#[derive(Debug, Serialize)]
pub struct CreditsResponse {
    /// Spendable credits right now.
    pub balance: i64,
    /// Seconds until the next credit accrues.
    pub next_credit_in_secs: i64,
}

/// Return the caller's up-to-date credit balance, applying any accrual.
///
/// While voting is paused the accrual clock is clamped to the pause
/// start, so polling this endpoint mid-pause cannot bank credits the
/// resume anchor shift would otherwise have to claw back.
///
/// # Errors
///
/// `401` without an identity header, `404` for an unknown account.
pub async fn get_credits(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<CreditsResponse>, GatewayError> {
    let account = account_from_headers(&headers)?;
    let settings = state.settings.snapshot();
    let now = state.settings.accrual_instant(Utc::now());

    let view = state
        .ledger
        .current_balance(
            account,
            now,
            settings.credit_interval(),
            settings.credit_cap,
            &state.cancel,
        )
        .await?;

    Ok(Json(CreditsResponse {
        balance: view.balance,
        next_credit_in_secs: view.next_credit_in.num_seconds(),
    }))
}

// ---------------------------------------------------------------------------
// GET /api/ranking
// ---------------------------------------------------------------------------

/// The current standings as served to clients.
///
/// While the activation gate holds (too few votes recorded), `rows` and
/// `top_three` are withheld so early votes cannot be inferred from rank
/// movement.
#[derive(Debug, Serialize)]
pub struct RankingResponse {
    /// Whether enough votes exist for ranks to be displayed.
    pub active: bool,
    /// Valid votes recorded so far.
    pub total_votes: u64,
    /// Ranked rows, best first. Empty while inactive.
    pub rows: Vec<RankingRow>,
    /// The podium. All `None` while inactive.
    pub top_three: TopThree,
}

/// Compute and return the current standings.
///
/// # Errors
///
/// `503` when the store stays contended, `500` on storage failure.
pub async fn get_ranking(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RankingResponse>, GatewayError> {
    let settings = state.settings.snapshot();
    let standings = state.engine.standings(&state.cancel).await?;
    let active = standings.is_active(settings.min_votes_for_ranking);

    let (rows, top_three) = if active {
        let top_three = standings.top_three();
        (standings.rows, top_three)
    } else {
        (Vec::new(), TopThree::default())
    };

    Ok(Json(RankingResponse {
        active,
        total_votes: standings.total_votes,
        rows,
        top_three,
    }))
}

// ---------------------------------------------------------------------------
// POST /api/votes
// ---------------------------------------------------------------------------

/// Request body for `POST /api/votes`.
#[derive(Debug, Deserialize)]
pub struct CastVoteBody {
    /// The account being voted for.
    pub target: Uuid,
    /// Catalog identifier of the achievement.
    pub achievement_id: String,
    /// Point weight, 1 to 3. Defaults to 1.
    pub points: Option<i16>,
    /// Explicit secrecy choice; polarity default when omitted.
    pub is_secret: Option<bool>,
}

/// Response body for a recorded vote.
#[derive(Debug, Serialize)]
pub struct VoteCreatedResponse {
    /// Identifier of the recorded vote.
    pub vote_id: podium_types::VoteId,
    /// The caller's balance after the charge.
    pub remaining_credits: i64,
}

/// Body returned with `409 Conflict` when a vote is rejected.
#[derive(Debug, Serialize)]
pub struct VoteRejectedResponse {
    /// Why the vote was not recorded.
    pub rejection: VoteRejection,
}

/// Cast a vote on behalf of the calling account.
///
/// A recorded vote answers `201 Created`; a business rejection answers
/// `409 Conflict` with the reason in the body. Nothing is written on a
/// rejection.
///
/// # Errors
///
/// `401` without an identity header, `404` for unknown accounts, `503`
/// when the store stays contended.
pub async fn cast_vote(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CastVoteBody>,
) -> Result<axum::response::Response, GatewayError> {
    let actor = account_from_headers(&headers)?;
    let settings = state.settings.snapshot();

    let request = VoteRequest {
        actor,
        target: AccountId::from(body.target),
        achievement_id: body.achievement_id,
        points: body.points,
        is_secret: body.is_secret,
    };

    let outcome = state
        .voting
        .cast(request, &settings, Utc::now(), &state.cancel)
        .await?;

    match outcome {
        VoteOutcome::Created {
            vote,
            remaining_credits,
        } => {
            let body = VoteCreatedResponse {
                vote_id: vote.id,
                remaining_credits,
            };
            Ok((StatusCode::CREATED, Json(body)).into_response())
        }
        VoteOutcome::Rejected(rejection) => {
            tracing::debug!(actor = %actor, ?rejection, "vote rejected");
            let body = VoteRejectedResponse { rejection };
            Ok((StatusCode::CONFLICT, Json(body)).into_response())
        }
    }
}
