//! WebSocket upgrade handler.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{info, warn};

use classhub_core::types::id::UserId;
use classhub_entity::user::Role;

use crate::state::AppState;

/// Query parameters identifying the connecting participant.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsQuery {
    pub user_id: UserId,
    pub name: String,
    pub role: Role,
}

/// GET /ws?userId={uuid}&name={name}&role={teacher|student} — WebSocket upgrade
pub async fn ws_upgrade(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
) -> Response {
    ws.on_upgrade(move |socket| handle_ws_connection(state, query, socket))
}

/// Drives an established WebSocket connection until the peer goes away.
async fn handle_ws_connection(state: AppState, query: WsQuery, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let (handle, mut outbound_rx) =
        state
            .coordinator
            .connect(query.user_id, &query.name, query.role);

    let conn_id = handle.id;

    info!(
        conn_id = %conn_id,
        user_id = %query.user_id,
        role = %query.role,
        "WebSocket connection established"
    );

    // Spawn outbound message forwarder
    let outbound_task = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            if ws_tx.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    // Process inbound messages
    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(Message::Text(text)) => {
                state.coordinator.handle_frame(&conn_id, &text).await;
            }
            Ok(Message::Close(_)) => {
                break;
            }
            // Ping/pong is handled by axum automatically
            Ok(_) => {}
            Err(e) => {
                warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Cleanup
    outbound_task.abort();
    state.coordinator.disconnect(&conn_id);

    info!(
        conn_id = %conn_id,
        user_id = %query.user_id,
        "WebSocket connection closed"
    );
}
