use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::time;
use tokio_tungstenite::tungstenite;

use jam_api::config::Config;
use jam_api::AppState;

pub type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

pub fn test_config() -> Config {
    Config {
        port: 0,
        default_max_participants: 10,
    }
}

/// Start an actual TCP server for WebSocket testing. Returns (addr, state);
/// the server runs in the background.
pub async fn start_server() -> (SocketAddr, AppState) {
    let state = AppState::new(test_config());
    let app = jam_api::routes::router().with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, state)
}

/// Connect a raw signaling client.
pub async fn connect(addr: SocketAddr) -> WsStream {
    let url = format!("ws://{addr}/ws");
    let (ws, _) = tokio_tungstenite::connect_async(&url)
        .await
        .expect("ws connect");
    ws
}

/// Send one signaling frame.
pub async fn send_event(ws: &mut WsStream, event: &str, data: serde_json::Value) {
    let frame = serde_json::json!({ "event": event, "data": data });
    ws.send(tungstenite::Message::Text(frame.to_string().into()))
        .await
        .expect("send event");
}

/// Read frames until one with the given event name arrives (5s timeout).
/// Returns its data payload.
pub async fn recv_event(ws: &mut WsStream, event: &str) -> serde_json::Value {
    loop {
        let msg = time::timeout(Duration::from_secs(5), ws.next())
            .await
            .unwrap_or_else(|_| panic!("timeout waiting for {event}"))
            .expect("stream ended")
            .expect("ws read error");

        if let tungstenite::Message::Text(text) = msg {
            let frame: serde_json::Value = serde_json::from_str(&text).expect("parse frame");
            if frame["event"] == event {
                return frame["data"].clone();
            }
        }
    }
}

/// Assert that no frame with the given event name arrives within `wait`.
pub async fn assert_no_event(ws: &mut WsStream, event: &str, wait: Duration) {
    let deadline = time::Instant::now() + wait;
    loop {
        let remaining = deadline.saturating_duration_since(time::Instant::now());
        if remaining.is_zero() {
            return;
        }
        match time::timeout(remaining, ws.next()).await {
            Err(_) | Ok(None) => return,
            Ok(Some(Ok(tungstenite::Message::Text(text)))) => {
                let frame: serde_json::Value = serde_json::from_str(&text).expect("parse frame");
                assert_ne!(frame["event"], event, "unexpected {event} frame: {frame}");
            }
            Ok(Some(Ok(_))) => {}
            Ok(Some(Err(_))) => return,
        }
    }
}

/// Block until the server-side loop for this client is live (broadcast
/// subscription included) by provoking a targeted reply.
pub async fn ensure_connected(ws: &mut WsStream) {
    send_event(
        ws,
        "join-request",
        serde_json::json!({ "sessionCode": "......", "userName": "sync" }),
    )
    .await;
    recv_event(ws, "join-error").await;
}

/// Connect a host and create a session. Returns the host stream and the join
/// code.
pub async fn create_session(addr: SocketAddr, host_name: &str, is_public: bool) -> (WsStream, String) {
    let mut host = connect(addr).await;
    send_event(
        &mut host,
        "create-session",
        serde_json::json!({ "hostName": host_name, "isPublic": is_public }),
    )
    .await;
    let data = recv_event(&mut host, "session-created").await;
    let code = data["sessionCode"].as_str().expect("session code").to_string();
    (host, code)
}

/// Connect a guest, request to join, and have the host approve it. Returns
/// the guest stream after `join-approved`.
pub async fn join_and_approve(
    addr: SocketAddr,
    host: &mut WsStream,
    code: &str,
    user_name: &str,
) -> WsStream {
    let mut guest = connect(addr).await;
    send_event(
        &mut guest,
        "join-request",
        serde_json::json!({ "sessionCode": code, "userName": user_name }),
    )
    .await;

    let pending = recv_event(host, "pending-request").await;
    let user_id = pending["userId"].as_str().expect("userId").to_string();
    send_event(
        host,
        "approve-user",
        serde_json::json!({ "userId": user_id, "approve": true }),
    )
    .await;

    recv_event(&mut guest, "join-approved").await;
    guest
}
