//! Error types for the gateway API layer.
//!
//! [`GatewayError`] unifies all failure modes into a single enum that
//! can be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.
//! Business rejections never pass through here -- they are ordinary
//! response bodies; this enum carries authentication problems and real
//! storage failures only.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use podium_credits::CreditError;
use podium_ranking::RankingError;
use podium_store::StoreError;
use podium_voting::VoteError;

/// Errors that can occur in the gateway API layer.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// No account identity on the request.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The account lacks admin rights.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A malformed request (bad UUID, bad body).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The store kept rejecting under contention; try again later.
    #[error("store busy")]
    Busy,

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Busy => (
                StatusCode::SERVICE_UNAVAILABLE,
                String::from("store busy, try again later"),
            ),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<StoreError> for GatewayError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::StillBusy { .. } => Self::Busy,
            StoreError::Cancelled => Self::Internal(String::from("operation cancelled")),
            StoreError::NotFound(what) => Self::NotFound(what),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<CreditError> for GatewayError {
    fn from(e: CreditError) -> Self {
        match e {
            CreditError::Store(store) => store.into(),
            CreditError::UnknownAccount(id) => Self::NotFound(format!("account {id}")),
        }
    }
}

impl From<RankingError> for GatewayError {
    fn from(e: RankingError) -> Self {
        match e {
            RankingError::Store(store) => store.into(),
        }
    }
}

impl From<VoteError> for GatewayError {
    fn from(e: VoteError) -> Self {
        match e {
            VoteError::Credit(credit) => credit.into(),
            VoteError::Ranking(ranking) => ranking.into(),
            VoteError::Store(store) => store.into(),
            VoteError::UnknownAccount(id) => Self::NotFound(format!("account {id}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn still_busy_maps_to_service_unavailable() {
        let err: GatewayError = StoreError::StillBusy { attempts: 5 }.into();
        assert!(matches!(err, GatewayError::Busy));
    }

    #[test]
    fn unknown_account_maps_to_not_found() {
        let id = podium_types::AccountId::new();
        let err: GatewayError = CreditError::UnknownAccount(id).into();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }
}
