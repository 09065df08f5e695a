//! `WebSocket` handler for the live event stream.
//!
//! Clients connect to `GET /ws` with their `x-account-id` header. The
//! handshake registers a session with the notification hub; the loop
//! then drains the session's bounded queue into JSON text frames. A
//! client that stops reading fills its queue and is evicted by the hub,
//! which this loop observes as a closed queue.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use tracing::{debug, warn};

use crate::error::GatewayError;
use crate::handlers::account_from_headers;
use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming hub events for the calling account.
///
/// # Route
///
/// `GET /ws`
///
/// # Errors
///
/// `401` without an identity header, `400` for a malformed one. The
/// account is not checked against the store here; an unknown id simply
/// receives broadcasts and no targeted sends.
pub async fn ws_events(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, GatewayError> {
    let account = account_from_headers(&headers)?;
    Ok(ws.on_upgrade(move |socket| handle_ws(socket, state, account)))
}

/// Handle the `WebSocket` lifecycle: register with the hub, forward
/// each queued event as a text frame, unregister on any exit path.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>, account: podium_types::AccountId) {
    let mut session = state.hub.register(account);
    debug!(account = %account, session = %session.session_id, "WebSocket client connected");

    loop {
        tokio::select! {
            // Drain the hub queue into the socket.
            event = session.events.recv() => {
                match event {
                    Some(event) => {
                        let json = match serde_json::to_string(&event) {
                            Ok(j) => j,
                            Err(e) => {
                                warn!(kind = event.kind(), "failed to serialize hub event: {e}");
                                continue;
                            }
                        };
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            debug!(account = %account, "WebSocket client disconnected (send failed)");
                            break;
                        }
                    }
                    // Queue closed: the hub evicted this session
                    // (slow consumer or re-registration elsewhere).
                    None => {
                        debug!(account = %account, "session evicted by hub, closing socket");
                        let _ = socket.send(Message::Close(None)).await;
                        return;
                    }
                }
            }
            // Watch for client-side close or ping.
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(account = %account, "WebSocket client disconnected");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!(account = %account, "WebSocket client disconnected (pong failed)");
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        debug!(account = %account, "WebSocket error: {e}");
                        break;
                    }
                    _ => {
                        // The stream is one-way; inbound text/binary is ignored.
                    }
                }
            }
        }
    }

    state.hub.unregister(session.session_id);
}
