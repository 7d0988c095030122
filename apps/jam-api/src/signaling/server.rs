//! WebSocket upgrade handler and per-connection event loop.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use jamlink_common::id;

use crate::AppState;

use super::events::{ClientEvent, ServerEvent};

pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(ws_upgrade))
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

/// Per-connection loop: inbound frames go to the relay, outbound events come
/// from the fanout hub filtered by recipient. The connection id is minted
/// here and is the client's identity for its whole lifetime.
async fn handle_connection(socket: WebSocket, state: AppState) {
    let connection_id = id::prefixed_ulid(id::prefix::CONNECTION);

    // Subscribe before handling any traffic so no broadcast is missed.
    let mut outbound_rx = state.broadcast.subscribe();
    let (mut ws_tx, mut ws_rx) = socket.split();

    tracing::info!(%connection_id, "client connected");

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let client_event: ClientEvent = match serde_json::from_str(&text) {
                            Ok(event) => event,
                            Err(err) => {
                                tracing::debug!(%connection_id, %err, "ignoring malformed frame");
                                continue;
                            }
                        };
                        state
                            .relay
                            .handle_event(&connection_id, &client_event.event, client_event.data);
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        tracing::debug!(%connection_id, %err, "ws read error");
                        break;
                    }
                    _ => continue,
                }
            }

            result = outbound_rx.recv() => {
                match result {
                    Ok(outbound) => {
                        if !outbound.recipient.includes(&connection_id) {
                            continue;
                        }
                        let frame = ServerEvent {
                            event: outbound.event,
                            data: &outbound.data,
                        };
                        let json = serde_json::to_string(&frame).unwrap();
                        if ws_tx.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(%connection_id, skipped, "connection lagged behind broadcast");
                        // Continue — the skipped events are simply dropped.
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    state.relay.handle_disconnect(&connection_id);
    tracing::info!(%connection_id, "client disconnected");
}
