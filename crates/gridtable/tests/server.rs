//! Integration tests for the Gridtable server, handler, and full connection flow.
//!
//! Each test starts a real server on an OS-assigned port and drives it
//! with `tokio-tungstenite` clients speaking the JSON wire format.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use gridtable::prelude::*;
use serde_json::{Value, json};
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// How long to wait before deciding a client received nothing.
const QUIET: Duration = Duration::from_millis(200);

/// Starts a server on a random port and returns its address and hub.
async fn start_server(builder: GridtableServerBuilder) -> (String, HubHandle) {
    let server = builder
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();
    let hub = server.hub();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    (addr, hub)
}

async fn default_server() -> String {
    let builder = GridtableServer::builder().gm_grace(Duration::from_millis(200));
    start_server(builder).await.0
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send(ws: &mut ClientWs, frame: Value) {
    ws.send(Message::Text(frame.to_string().into()))
        .await
        .expect("send");
}

/// Receives the next JSON event, failing the test after two seconds.
async fn recv(ws: &mut ClientWs) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for an event")
            .expect("stream ended")
            .expect("websocket error");
        if msg.is_text() || msg.is_binary() {
            return serde_json::from_slice(&msg.into_data()).expect("event should be JSON");
        }
    }
}

/// Asserts that nothing arrives within [`QUIET`].
async fn assert_quiet(ws: &mut ClientWs) {
    if let Ok(Some(Ok(msg))) = tokio::time::timeout(QUIET, ws.next()).await {
        panic!("expected no event, got {msg:?}");
    }
}

async fn create(ws: &mut ClientWs, session_id: &str, gm_name: &str) -> Value {
    send(
        ws,
        json!({"event": "create-session", "data": {"sessionId": session_id, "gmName": gm_name}}),
    )
    .await;
    recv(ws).await
}

async fn join(ws: &mut ClientWs, session_id: &str, player_name: &str) -> Value {
    send(
        ws,
        json!({"event": "join-session", "data": {"sessionId": session_id, "playerName": player_name}}),
    )
    .await;
    recv(ws).await
}

/// A GM and one player ("Bob") at table "abc", with joins acknowledged.
async fn table(addr: &str) -> (ClientWs, ClientWs) {
    let mut gm = connect(addr).await;
    let mut bob = connect(addr).await;
    assert_eq!(create(&mut gm, "abc", "GM").await["event"], "session-created");
    assert_eq!(join(&mut bob, "abc", "Bob").await["event"], "session-joined");
    assert_eq!(recv(&mut gm).await["event"], "player-joined");
    (gm, bob)
}

fn add_token(id: Value, col: i64, row: i64) -> Value {
    json!({"event": "add-token", "data": {"id": id, "type": "pc", "col": col, "row": row, "label": "PC"}})
}

// =========================================================================
// Session lifecycle
// =========================================================================

#[tokio::test]
async fn test_create_session_wire_format() {
    let addr = default_server().await;
    let mut gm = connect(&addr).await;

    let reply = create(&mut gm, "abc", "GM").await;

    assert_eq!(
        reply,
        json!({
            "event": "session-created",
            "data": {
                "sessionId": "abc",
                "isGM": true,
                "players": [{"name": "GM", "isGM": true}],
                "tokens": []
            }
        })
    );
}

#[tokio::test]
async fn test_create_session_twice_is_rejected() {
    let addr = default_server().await;
    let mut gm = connect(&addr).await;
    let mut other = connect(&addr).await;
    create(&mut gm, "abc", "GM").await;

    let reply = create(&mut other, "abc", "Other").await;

    assert_eq!(
        reply,
        json!({"event": "session-error", "data": {"message": "Session already exists"}})
    );
    assert_quiet(&mut gm).await;
}

#[tokio::test]
async fn test_join_unknown_session_is_rejected() {
    let addr = default_server().await;
    let mut bob = connect(&addr).await;

    let reply = join(&mut bob, "nope", "Bob").await;

    assert_eq!(reply["event"], "session-error");
    assert_eq!(reply["data"]["message"], "Session not found");
}

#[tokio::test]
async fn test_join_session_snapshot_and_broadcast() {
    let addr = default_server().await;
    let mut gm = connect(&addr).await;
    let mut bob = connect(&addr).await;
    create(&mut gm, "abc", "GM").await;

    let reply = join(&mut bob, "abc", "Bob").await;

    assert_eq!(reply["event"], "session-joined");
    assert_eq!(reply["data"]["isGM"], false);
    assert_eq!(
        reply["data"]["players"],
        json!([{"name": "GM", "isGM": true}, {"name": "Bob", "isGM": false}])
    );

    let notice = recv(&mut gm).await;
    assert_eq!(notice["event"], "player-joined");
    assert_eq!(notice["data"]["playerName"], "Bob");
    assert_eq!(notice["data"]["players"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_list_sessions_without_joining() {
    let addr = default_server().await;
    let (_gm, _bob) = table(&addr).await;
    let mut visitor = connect(&addr).await;

    send(&mut visitor, json!({"event": "list-sessions", "data": {}})).await;
    let reply = recv(&mut visitor).await;

    assert_eq!(reply["event"], "sessions-list");
    let list = reply["data"].as_array().expect("list is an array");
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], "abc");
    assert_eq!(list[0]["gmName"], "GM");
    assert_eq!(list[0]["playerCount"], 2);
    assert!(list[0]["createdAt"].is_string());
}

// =========================================================================
// Tokens
// =========================================================================

#[tokio::test]
async fn test_add_token_reaches_gm_and_players() {
    let addr = default_server().await;
    let (mut gm, mut bob) = table(&addr).await;

    send(&mut gm, add_token(json!(1), 5, 5)).await;

    let expected = json!({
        "event": "token-added",
        "data": {"id": 1, "type": "pc", "col": 5, "row": 5, "label": "PC"}
    });
    assert_eq!(recv(&mut gm).await, expected);
    assert_eq!(recv(&mut bob).await, expected);
}

#[tokio::test]
async fn test_string_token_id_is_normalized() {
    let addr = default_server().await;
    let (mut gm, mut bob) = table(&addr).await;
    send(&mut gm, add_token(json!(1), 5, 5)).await;
    recv(&mut gm).await;
    recv(&mut bob).await;

    // The browser reads ids back from DOM attributes, so they arrive as strings.
    send(&mut gm, json!({"event": "delete-token", "data": {"id": "1"}})).await;

    let expected = json!({"event": "token-deleted", "data": {"id": 1}});
    assert_eq!(recv(&mut gm).await, expected);
    assert_eq!(recv(&mut bob).await, expected);
}

#[tokio::test]
async fn test_move_token_skips_the_mover() {
    let addr = default_server().await;
    let (mut gm, mut bob) = table(&addr).await;
    send(&mut gm, add_token(json!(1), 5, 5)).await;
    recv(&mut gm).await;
    recv(&mut bob).await;

    send(&mut gm, json!({"event": "move-token", "data": {"id": 1, "col": 6, "row": 5}})).await;

    assert_eq!(
        recv(&mut bob).await,
        json!({"event": "token-moved", "data": {"id": 1, "col": 6, "row": 5}})
    );
    assert_quiet(&mut gm).await;
}

#[tokio::test]
async fn test_player_cannot_move_tokens() {
    let addr = default_server().await;
    let (mut gm, mut bob) = table(&addr).await;
    send(&mut gm, add_token(json!(1), 5, 5)).await;
    recv(&mut gm).await;
    recv(&mut bob).await;

    send(&mut bob, json!({"event": "move-token", "data": {"id": 1, "col": 9, "row": 9}})).await;

    assert_eq!(
        recv(&mut bob).await,
        json!({"event": "permission-denied", "data": {"message": "Only the GM can move tokens"}})
    );
    assert_quiet(&mut gm).await;

    // The token did not move: a late joiner sees the original position.
    let mut carol = connect(&addr).await;
    let snapshot = join(&mut carol, "abc", "Carol").await;
    assert_eq!(snapshot["data"]["tokens"][0]["col"], 5);
    assert_eq!(snapshot["data"]["tokens"][0]["row"], 5);
}

#[tokio::test]
async fn test_player_cannot_add_or_delete_tokens() {
    let addr = default_server().await;
    let (mut gm, mut bob) = table(&addr).await;

    send(&mut bob, add_token(json!(7), 0, 0)).await;
    assert_eq!(
        recv(&mut bob).await["data"]["message"],
        "Only the GM can add tokens"
    );

    send(&mut bob, json!({"event": "delete-token", "data": {"id": 7}})).await;
    assert_eq!(
        recv(&mut bob).await["data"]["message"],
        "Only the GM can delete tokens"
    );

    assert_quiet(&mut gm).await;
}

#[tokio::test]
async fn test_player_add_token_without_type_is_denied() {
    let addr = default_server().await;
    let (mut gm, mut bob) = table(&addr).await;

    send(&mut bob, json!({"event": "add-token", "data": {"id": 3, "col": 0, "row": 0}})).await;

    assert_eq!(recv(&mut bob).await["event"], "permission-denied");
    assert_quiet(&mut gm).await;
}

#[tokio::test]
async fn test_malformed_frames_are_dropped() {
    let addr = default_server().await;
    let (mut gm, mut bob) = table(&addr).await;

    gm.send(Message::Text("not json".into())).await.unwrap();
    send(&mut gm, json!({"event": "delete-token", "data": {"id": "goblin"}})).await;
    send(&mut gm, json!({"event": "summon-dragon", "data": {}})).await;
    assert_quiet(&mut bob).await;

    // The connection survives and keeps working.
    send(&mut gm, add_token(json!(2), 1, 1)).await;
    assert_eq!(recv(&mut gm).await["event"], "token-added");
}

// =========================================================================
// Disconnects
// =========================================================================

#[tokio::test]
async fn test_player_disconnect_notifies_gm() {
    let addr = default_server().await;
    let (mut gm, mut bob) = table(&addr).await;

    bob.close(None).await.unwrap();

    let notice = recv(&mut gm).await;
    assert_eq!(notice["event"], "player-left");
    assert_eq!(notice["data"]["playerName"], "Bob");
    assert_eq!(notice["data"]["players"], json!([{"name": "GM", "isGM": true}]));
}

#[tokio::test]
async fn test_gm_disconnect_closes_session_after_grace() {
    let addr = default_server().await;
    let (mut gm, mut bob) = table(&addr).await;
    send(&mut gm, add_token(json!(1), 5, 5)).await;
    recv(&mut gm).await;
    recv(&mut bob).await;

    gm.close(None).await.unwrap();

    assert_eq!(
        recv(&mut bob).await,
        json!({
            "event": "gm-disconnected",
            "data": {"message": "Game Master has disconnected. Session will be closed."}
        })
    );

    tokio::time::sleep(Duration::from_millis(500)).await;

    let mut late = connect(&addr).await;
    let reply = join(&mut late, "abc", "Late").await;
    assert_eq!(reply["data"]["message"], "Session not found");
}

// =========================================================================
// Server behavior
// =========================================================================

#[tokio::test]
async fn test_silent_tcp_peer_does_not_block_other_clients() {
    let addr = default_server().await;
    let _silent = tokio::net::TcpStream::connect(&addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let served = tokio::time::timeout(Duration::from_secs(2), async {
        let mut gm = connect(&addr).await;
        create(&mut gm, "abc", "GM").await
    })
    .await
    .expect("a stalled handshake should not hold up the accept loop");

    assert_eq!(served["event"], "session-created");
}

#[tokio::test]
async fn test_idle_connection_is_closed() {
    let builder = GridtableServer::builder().idle_timeout(Duration::from_millis(100));
    let (addr, _hub) = start_server(builder).await;
    let mut ws = connect(&addr).await;

    let end = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;

    assert!(end.is_ok(), "idle connection should be closed by the server");
}

#[tokio::test]
async fn test_hub_status_tracks_sessions() {
    let builder = GridtableServer::builder();
    let (addr, hub) = start_server(builder).await;
    let (_gm, _bob) = table(&addr).await;

    let status = hub.status().await;

    assert_eq!(status.status, "ok");
    assert_eq!(status.active_sessions, 1);
    assert_eq!(status.connections, 2);
}

#[tokio::test]
async fn test_run_until_shutdown_closes_clients() {
    let server = GridtableServer::builder()
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should build");
    let addr = server.local_addr().unwrap().to_string();
    let hub = server.hub();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let running = tokio::spawn(server.run_until(async {
        let _ = stop_rx.await;
    }));

    let (_gm, mut bob) = table(&addr).await;
    stop_tx.send(()).unwrap();
    running
        .await
        .expect("server task should not panic")
        .expect("server should stop cleanly");

    assert_eq!(hub.status().await.active_sessions, 0);
    let closed = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match bob.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "clients should be disconnected on shutdown");
}
