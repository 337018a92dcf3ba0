//! WebSocket upgrade handler.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{info, warn};

use keygate_auth::AuthContext;
use keygate_core::error::AppError;

use crate::cookies::{ACCESS_COOKIE, bearer_token, cookie_value};
use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters for WebSocket authentication.
///
/// Browsers cannot set headers on the upgrade request, so the token may
/// arrive as a query parameter instead of the cookie.
#[derive(Debug, serde::Deserialize)]
pub struct WsQuery {
    /// Access token.
    pub token: Option<String>,
}

/// GET /ws — WebSocket upgrade
///
/// Authenticates before upgrading; a dead token is refused with 401
/// while the request is still plain HTTP.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let token = query
        .token
        .or_else(|| bearer_token(&headers))
        .or_else(|| cookie_value(&headers, ACCESS_COOKIE))
        .ok_or_else(|| AppError::invalid_credentials("Missing access token"))?;

    let context = state.tokens.verify_access(&token).await?;

    Ok(ws.on_upgrade(move |socket| drive_connection(state, context, socket)))
}

/// Drives an established WebSocket connection until either side closes.
async fn drive_connection(state: AppState, context: AuthContext, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let (handle, mut outbound_rx) = state
        .realtime
        .register(context.identity.id, context.claims.session_id());
    let conn_id = handle.id;

    // Forward queued events to the wire. Serialization failures skip the
    // event; a closed socket ends the task.
    let outbound_task = tokio::spawn(async move {
        while let Some(event) = outbound_rx.recv().await {
            let Ok(text) = serde_json::to_string(&event) else {
                continue;
            };
            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(Message::Text(text)) => state.realtime.handle_inbound(&conn_id, &text),
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(err) => {
                warn!(conn_id = %conn_id, error = %err, "WebSocket error");
                break;
            }
        }
    }

    outbound_task.abort();
    state.realtime.unregister(&conn_id);

    info!(
        conn_id = %conn_id,
        identity_id = %context.identity.id,
        "WebSocket connection closed"
    );
}
