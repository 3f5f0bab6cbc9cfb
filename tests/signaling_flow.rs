//! End-to-end tests: a real server on an ephemeral port driven by WebSocket clients.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use concierge::signaling::{IceServer, SignalingServer};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

fn ice_servers() -> Vec<IceServer> {
    vec![IceServer {
        urls: "stun:stun.l.google.com:19302".to_string(),
        username: String::new(),
        credential: String::new(),
        location: Some("Google".to_string()),
    }]
}

/// Start a server on 127.0.0.1 with a random port and return its base URL.
async fn start_server() -> String {
    let server = SignalingServer::bind("127.0.0.1:0", ice_servers())
        .await
        .expect("bind");
    let addr = server.local_addr().expect("local addr");
    tokio::spawn(server.run());
    format!("ws://{}", addr)
}

async fn connect(base: &str, room: &str) -> Client {
    let url = format!("{}/api/v1/session/{}", base, room);
    let (ws, _) = tokio_tungstenite::connect_async(url).await.expect("connect");
    ws
}

async fn recv_json(ws: &mut Client) -> Value {
    loop {
        let msg = tokio::time::timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for message")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).expect("server sent invalid json");
        }
    }
}

/// Assert nothing arrives within a short window.
async fn assert_silent(ws: &mut Client) {
    if let Ok(Some(Ok(Message::Text(text)))) =
        tokio::time::timeout(Duration::from_millis(200), ws.next()).await
    {
        panic!("unexpected message: {}", text);
    }
}

async fn send(ws: &mut Client, text: &str) {
    ws.send(Message::Text(text.into())).await.expect("send");
}

fn flags(info: &Value) -> (bool, bool) {
    (
        info["canHost"].as_bool().expect("canHost"),
        info["canJoin"].as_bool().expect("canJoin"),
    )
}

#[tokio::test]
async fn host_and_joiner_exchange_offer_and_answer() {
    let base = start_server().await;

    let mut c1 = connect(&base, "r1").await;
    let info = recv_json(&mut c1).await;
    assert_eq!(flags(&info), (true, true));
    assert_eq!(
        info["iceServers"],
        json!([{
            "urls": "stun:stun.l.google.com:19302",
            "username": "",
            "credential": "",
            "location": "Google"
        }])
    );

    send(&mut c1, "host").await;
    assert_eq!(flags(&recv_json(&mut c1).await), (false, true));

    let mut c2 = connect(&base, "r1").await;
    assert_eq!(flags(&recv_json(&mut c2).await), (false, true));

    send(&mut c2, "join").await;
    assert_eq!(flags(&recv_json(&mut c1).await), (false, false));
    assert_eq!(flags(&recv_json(&mut c2).await), (false, false));

    send(&mut c1, "answerRequest:OFFER1").await;
    assert_eq!(recv_json(&mut c2).await, json!({"answerRequest": "OFFER1"}));

    send(&mut c2, "answerResponse:ANSWER1").await;
    assert_eq!(recv_json(&mut c1).await, json!({"answerResponse": "ANSWER1"}));

    c1.close(None).await.expect("close");
    assert_eq!(flags(&recv_json(&mut c2).await), (true, false));
}

#[tokio::test]
async fn connect_error_reaches_the_peer_only() {
    let base = start_server().await;
    let mut host = connect(&base, "errors").await;
    recv_json(&mut host).await;
    send(&mut host, "host").await;
    recv_json(&mut host).await;

    let mut joiner = connect(&base, "errors").await;
    recv_json(&mut joiner).await;
    send(&mut joiner, "join").await;
    recv_json(&mut host).await;
    recv_json(&mut joiner).await;

    let mut watcher = connect(&base, "errors").await;
    assert_eq!(flags(&recv_json(&mut watcher).await), (false, false));

    send(&mut watcher, "connectError:not mine").await;
    send(&mut joiner, "connectError:ice failed").await;

    assert_eq!(recv_json(&mut host).await, json!({"connectError": "ice failed"}));
    assert_silent(&mut joiner).await;
    assert_silent(&mut watcher).await;
}

#[tokio::test]
async fn rooms_are_isolated() {
    let base = start_server().await;
    let mut a = connect(&base, "alpha").await;
    let mut b = connect(&base, "beta").await;
    recv_json(&mut a).await;
    recv_json(&mut b).await;

    send(&mut a, "host").await;
    assert_eq!(flags(&recv_json(&mut a).await), (false, true));
    assert_silent(&mut b).await;

    send(&mut b, "answerRequest:stray").await;
    assert_silent(&mut a).await;
}

#[tokio::test]
async fn leave_frees_the_role_for_others() {
    let base = start_server().await;
    let mut a = connect(&base, "swap").await;
    let mut b = connect(&base, "swap").await;
    recv_json(&mut a).await;
    recv_json(&mut b).await;

    send(&mut a, "host").await;
    recv_json(&mut a).await;
    assert_eq!(flags(&recv_json(&mut b).await), (false, true));

    send(&mut a, "leave").await;
    assert_eq!(flags(&recv_json(&mut a).await), (true, true));
    assert_eq!(flags(&recv_json(&mut b).await), (true, true));

    send(&mut b, "host").await;
    assert_eq!(flags(&recv_json(&mut b).await), (false, true));
}

#[tokio::test]
async fn escaped_session_names_share_a_room() {
    let base = start_server().await;
    let mut plain = connect(&base, "abc").await;
    let mut escaped = connect(&base, "a%62c").await;
    recv_json(&mut plain).await;
    recv_json(&mut escaped).await;

    send(&mut escaped, "host").await;
    assert_eq!(flags(&recv_json(&mut escaped).await), (false, true));
    assert_eq!(flags(&recv_json(&mut plain).await), (false, true));
}

#[tokio::test]
async fn unknown_paths_are_rejected_at_handshake() {
    let base = start_server().await;

    let err = tokio_tungstenite::connect_async(format!("{}/not/a/session", base))
        .await
        .expect_err("handshake should fail");

    match err {
        WsError::Http(response) => assert_eq!(response.status().as_u16(), 404),
        other => panic!("unexpected error: {}", other),
    }
}
