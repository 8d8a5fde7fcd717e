use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use reqwest::StatusCode;
use slotsync::config::ServerConfig;
use slotsync::server::{self, state::AppState};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

const READ_TIMEOUT: Duration = Duration::from_secs(5);

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct TestServer {
    addr: SocketAddr,
    state: Arc<AppState>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(AppState::new(ServerConfig::default()));
        let (tx, rx) = oneshot::channel();

        let served = Arc::clone(&state);
        tokio::spawn(async move {
            server::serve(listener, served, async move {
                let _ = rx.await;
            })
            .await
            .unwrap();
        });

        Self {
            addr,
            state,
            shutdown: Some(tx),
        }
    }

    async fn connect(&self) -> Client {
        let (client, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws", self.addr))
            .await
            .unwrap();
        client
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        let url = format!("http://{}{path}", self.addr);
        timeout(READ_TIMEOUT, reqwest::get(url))
            .await
            .expect("timed out waiting for response")
            .unwrap()
    }

    async fn wait_until(&self, what: &str, check: impl Fn(&AppState) -> bool) {
        let waited = timeout(READ_TIMEOUT, async {
            while !check(self.state.as_ref()) {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(waited.is_ok(), "timed out waiting for {what}");
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn next_text(client: &mut Client) -> String {
    loop {
        let msg = timeout(READ_TIMEOUT, client.next())
            .await
            .expect("timed out waiting for message")
            .expect("stream ended")
            .unwrap();
        if let Message::Text(text) = msg {
            return text;
        }
    }
}

async fn send_text(client: &mut Client, text: &str) {
    client.send(Message::Text(text.to_string())).await.unwrap();
}

async fn assert_silent(client: &mut Client) {
    let next = timeout(Duration::from_millis(200), client.next()).await;
    assert!(next.is_err(), "unexpected message: {next:?}");
}

fn numbered_update(index: u32, seq: usize) -> String {
    format!(
        r#"{{"index":{index},"value":"Option {}","seq":{seq}}}"#,
        seq % 11 + 1
    )
}

#[tokio::test]
async fn test_bootstrap_and_fan_out() {
    let server = TestServer::start().await;

    let mut a = server.connect().await;
    assert_eq!(next_text(&mut a).await, "{}");

    send_text(&mut a, r#"{"index":3,"value":"Option 2"}"#).await;
    server
        .wait_until("first write", |s| {
            s.engine.store().snapshot().get(3) == Some("Option 2")
        })
        .await;

    let mut b = server.connect().await;
    assert_eq!(next_text(&mut b).await, r#"{"3":"Option 2"}"#);

    // Forwarded byte-for-byte, sender excluded
    let update = r#"{"index":3, "value":"Option 5"}"#;
    send_text(&mut a, update).await;
    assert_eq!(next_text(&mut b).await, update);
    assert_silent(&mut a).await;
    assert_eq!(server.state.engine.store().snapshot().get(3), Some("Option 5"));
}

#[tokio::test]
async fn test_concurrent_senders_reach_every_observer() {
    const PER_SENDER: usize = 200;

    let server = TestServer::start().await;
    let mut a = server.connect().await;
    let mut b = server.connect().await;
    let mut c = server.connect().await;
    for client in [&mut a, &mut b, &mut c] {
        assert_eq!(next_text(client).await, "{}");
    }

    // A and B send at the same time; C does not read until both are done
    let burst = |mut client: Client, index: u32| async move {
        for seq in 0..PER_SENDER {
            send_text(&mut client, &numbered_update(index, seq)).await;
        }
        client
    };
    let (a, b) = tokio::join!(
        tokio::spawn(burst(a, 1)),
        tokio::spawn(burst(b, 2))
    );
    let (_a, _b) = (a.unwrap(), b.unwrap());

    let mut seen = [Vec::new(), Vec::new()];
    for _ in 0..2 * PER_SENDER {
        let value: serde_json::Value = serde_json::from_str(&next_text(&mut c).await).unwrap();
        let slot = value["index"].as_u64().unwrap() as usize - 1;
        seen[slot].push(value["seq"].as_u64().unwrap() as usize);
    }

    let expected: Vec<usize> = (0..PER_SENDER).collect();
    assert_eq!(seen[0], expected);
    assert_eq!(seen[1], expected);
    assert_eq!(server.state.engine.registry().len(), 3);

    let last = format!("Option {}", (PER_SENDER - 1) % 11 + 1);
    let snapshot = server.state.engine.store().snapshot();
    assert_eq!(snapshot.get(1), Some(last.as_str()));
    assert_eq!(snapshot.get(2), Some(last.as_str()));
}

#[tokio::test]
async fn test_invalid_updates_are_discarded() {
    let server = TestServer::start().await;
    let mut a = server.connect().await;
    let mut b = server.connect().await;
    next_text(&mut a).await;
    next_text(&mut b).await;

    send_text(&mut a, "not json").await;
    send_text(&mut a, r#"{"index":99,"value":"Option 2"}"#).await;
    send_text(&mut a, r#"{"index":2,"value":"Option 404"}"#).await;
    send_text(&mut a, r#"{"index":2}"#).await;
    let valid = r#"{"index":2,"value":"Option 4"}"#;
    send_text(&mut a, valid).await;

    assert_eq!(next_text(&mut b).await, valid);
    let snapshot = server.state.engine.store().snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.get(2), Some("Option 4"));
}

#[tokio::test]
async fn test_disconnect_removes_connection() {
    let server = TestServer::start().await;
    let mut a = server.connect().await;
    let mut b = server.connect().await;
    next_text(&mut a).await;
    next_text(&mut b).await;
    assert_eq!(server.state.engine.registry().len(), 2);

    b.close(None).await.unwrap();
    server
        .wait_until("registry to drop b", |s| s.engine.registry().len() == 1)
        .await;

    let health = server.get("/health").await;
    assert_eq!(health.status(), StatusCode::OK);
    let health: serde_json::Value = health.json().await.unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["connections"], 1);
    assert_eq!(health["slots"], 14);

    // Remaining connection keeps working
    let mut c = server.connect().await;
    next_text(&mut c).await;
    let update = r#"{"index":14,"value":"Option 11"}"#;
    send_text(&mut a, update).await;
    assert_eq!(next_text(&mut c).await, update);
}

#[tokio::test]
async fn test_dead_peer_is_evicted_without_affecting_others() {
    let server = TestServer::start().await;
    let mut a = server.connect().await;
    let mut b = server.connect().await;
    let mut c = server.connect().await;
    for client in [&mut a, &mut b, &mut c] {
        next_text(client).await;
    }

    // Drop B's socket without a close handshake
    drop(b);

    for seq in 0..20 {
        send_text(&mut a, &numbered_update(5, seq)).await;
    }
    for seq in 0..20 {
        assert_eq!(next_text(&mut c).await, numbered_update(5, seq));
    }

    server
        .wait_until("registry to drop b", |s| s.engine.registry().len() == 2)
        .await;

    // Later updates still reach the live observer
    let update = r#"{"index":6,"value":"Option 7"}"#;
    send_text(&mut a, update).await;
    assert_eq!(next_text(&mut c).await, update);
}

#[tokio::test]
async fn test_page_and_state_api_reflect_store() {
    let server = TestServer::start().await;
    let mut a = server.connect().await;
    next_text(&mut a).await;
    send_text(&mut a, r#"{"index":1,"value":"Option 6"}"#).await;
    server
        .wait_until("write", |s| !s.engine.store().snapshot().is_empty())
        .await;

    let state = server.get("/api/state").await;
    assert_eq!(state.status(), StatusCode::OK);
    let state: serde_json::Value = state.json().await.unwrap();
    assert_eq!(state, serde_json::json!({ "1": "Option 6" }));

    let page = server.get("/").await;
    assert_eq!(page.status(), StatusCode::OK);
    let page = page.text().await.unwrap();
    assert!(page.contains(r#"<option value="Option 6" selected>Ln</option>"#));
    assert!(page.contains(r#"id="slot14""#));
}

#[tokio::test]
async fn test_plain_get_on_ws_is_rejected() {
    let server = TestServer::start().await;
    let response = server.get("/ws").await;
    assert!(response.status().is_client_error(), "{}", response.status());
    assert!(server.state.engine.registry().is_empty());
}
