//! Test fixtures for integration tests.
//!
//! Starts the router in-process on an ephemeral port and provides small
//! WebSocket client helpers.

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use keeper_server::{
    build_router,
    domain::{AuthGateway, Identity, MessageRepository, MessageText, NewMessage},
    infrastructure::{auth::StaticTokenGateway, repository::InMemoryMessageRepository},
    ui::state::AppState,
};
use tokio::{net::TcpStream, task::JoinHandle};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{self, client::IntoClientRequest, http::HeaderValue},
};

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const ALICE_TOKEN: &str = "alice-token";
pub const BOB_TOKEN: &str = "bob-token";
pub const TEST_ORIGIN: &str = "http://localhost:8081";

const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

/// Gateway accepting [`ALICE_TOKEN`] and [`BOB_TOKEN`].
pub fn test_gateway() -> StaticTokenGateway {
    [
        (ALICE_TOKEN.to_string(), identity("alice")),
        (BOB_TOKEN.to_string(), identity("bob")),
    ]
    .into_iter()
    .collect()
}

pub fn identity(name: &str) -> Identity {
    Identity::new(name.to_string()).unwrap()
}

/// Save `texts` in order, authored by `author`.
pub async fn seed(repository: &dyn MessageRepository, author: &str, texts: &[&str]) {
    for text in texts {
        let text = MessageText::new(text.to_string()).unwrap();
        repository
            .save(NewMessage::new(identity(author), text))
            .await
            .expect("Failed to seed message");
    }
}

/// In-process server; aborted on drop.
pub struct TestServer {
    addr: SocketAddr,
    pub state: Arc<AppState>,
    task: JoinHandle<()>,
}

impl TestServer {
    /// Empty in-memory store, the test gateway and the default history limit.
    pub async fn start() -> Self {
        Self::start_with(
            Arc::new(InMemoryMessageRepository::new()),
            Arc::new(test_gateway()),
            50,
        )
        .await
    }

    pub async fn start_with(
        repository: Arc<dyn MessageRepository>,
        gateway: Arc<dyn AuthGateway>,
        history_limit: i64,
    ) -> Self {
        let state = Arc::new(AppState::new(repository, gateway, history_limit));
        let app = build_router(state.clone(), axum::http::HeaderValue::from_static(TEST_ORIGIN));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");

        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server error");
        });

        Self { addr, state, task }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Connect with `?token=`.
    pub async fn connect(&self, token: &str) -> WsClient {
        let (ws, _) = connect_async(format!("{}?token={}", self.ws_url(), token))
            .await
            .expect("Failed to connect");
        ws
    }

    /// Connect with the session cookie instead of a query parameter.
    pub async fn connect_with_cookie(&self, token: &str) -> WsClient {
        self.connect_with_cookie_and_query("", token).await
    }

    /// Connect with the session cookie; `query` (e.g. `?token=`) is appended
    /// to the URL as-is.
    pub async fn connect_with_cookie_and_query(&self, query: &str, token: &str) -> WsClient {
        let mut request = format!("{}{}", self.ws_url(), query)
            .into_client_request()
            .expect("Failed to build request");
        request.headers_mut().insert(
            "cookie",
            HeaderValue::from_str(&format!("keeper_session={token}")).unwrap(),
        );
        let (ws, _) = connect_async(request).await.expect("Failed to connect");
        ws
    }

    /// Send a bare upgrade request over plain HTTP so the rejection status
    /// and body can be inspected.
    pub async fn upgrade_request(&self, query: &str) -> reqwest::Response {
        reqwest::Client::new()
            .get(format!("{}/ws{}", self.base_url(), query))
            .header("connection", "upgrade")
            .header("upgrade", "websocket")
            .header("sec-websocket-version", "13")
            .header("sec-websocket-key", "dGhlIHNhbXBsZSBub25jZQ==")
            .send()
            .await
            .expect("Failed to send request")
    }

    /// Poll `/api/health` until the live connection count equals `expected`.
    pub async fn wait_for_connections(&self, expected: u64) {
        let client = reqwest::Client::new();
        for _ in 0..50 {
            let body: serde_json::Value = client
                .get(format!("{}/api/health", self.base_url()))
                .send()
                .await
                .expect("Failed to send request")
                .json()
                .await
                .expect("Failed to parse JSON");
            if body["connections"] == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("connection count never reached {expected}");
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Next JSON envelope from the server, skipping control frames.
pub async fn next_envelope(ws: &mut WsClient) -> serde_json::Value {
    loop {
        let frame = tokio::time::timeout(FRAME_TIMEOUT, ws.next())
            .await
            .expect("Timed out waiting for a frame")
            .expect("Connection closed")
            .expect("WebSocket error");
        match frame {
            tungstenite::Message::Text(text) => {
                return serde_json::from_str(text.as_str()).expect("Failed to parse envelope");
            }
            tungstenite::Message::Ping(_) | tungstenite::Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

/// Send a `sendMessage` envelope.
pub async fn send_message(ws: &mut WsClient, text: &str) {
    let envelope = serde_json::json!({ "type": "sendMessage", "payload": { "text": text } });
    send_raw(ws, &envelope.to_string()).await;
}

pub async fn send_raw(ws: &mut WsClient, frame: &str) {
    ws.send(tungstenite::Message::text(frame))
        .await
        .expect("Failed to send frame");
}
