//! End-to-end tests over real WebSocket connections.
//!
//! Each test serves the app on an ephemeral port with its own store and
//! clock, then drives it with tokio-tungstenite clients.

use std::sync::Arc;
use std::time::Duration;

use banter_server::build_app;
use banter_server::domain::ChatMessage;
use banter_server::state::AppState;
use banter_server::store::{InMemoryMessageStore, MessageStore, StoreError};
use banter_shared::time::{Clock, FixedClock, SystemClock};
use chrono::{TimeZone, Utc};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Serve the app on an ephemeral port; returns the ws URL and the state.
async fn spawn_server(store: Arc<dyn MessageStore>, clock: Arc<dyn Clock>) -> (String, Arc<AppState>) {
    let (app, state) = build_app(store, clock);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("ws://{addr}/ws"), state)
}

async fn connect(url: &str) -> WsClient {
    let (client, _response) = connect_async(url).await.expect("failed to connect");
    client
}

async fn send_json(client: &mut WsClient, payload: &str) {
    client
        .send(Message::Text(payload.to_string().into()))
        .await
        .expect("failed to send");
}

/// Next text frame, decoded as a chat message. Panics after five seconds.
async fn next_message(client: &mut WsClient) -> ChatMessage {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("connection closed")
            .expect("transport error");
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).expect("broadcast was not a chat message");
        }
    }
}

#[tokio::test]
async fn test_end_to_end_join_send_broadcast_persist() {
    // given: an empty store and a pinned server clock
    let store = Arc::new(InMemoryMessageStore::new());
    let stamp = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let (url, _state) = spawn_server(store.clone(), Arc::new(FixedClock::new(stamp))).await;

    // when: a client joins (empty history) and sends a message claiming its
    // own timestamp
    let mut client = connect(&url).await;
    send_json(
        &mut client,
        r#"{"username":"alice","text":"hi","time":"1999-01-01T00:00:00Z"}"#,
    )
    .await;

    // then: the broadcast comes back stamped with the server's time
    let broadcast = next_message(&mut client).await;
    assert_eq!(broadcast.username, "alice");
    assert_eq!(broadcast.text, "hi");
    assert_eq!(broadcast.sent_at, stamp);

    // and: the message lands in the store (persistence is fire-and-forget,
    // so poll briefly)
    let mut history = store.fetch_all().await.unwrap();
    for _ in 0..100 {
        if !history.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        history = store.fetch_all().await.unwrap();
    }
    assert_eq!(history, vec![broadcast]);
}

#[tokio::test]
async fn test_joining_client_replays_history_in_store_order() {
    // given: a store holding three messages whose timestamps are NOT in
    // insertion order
    let store = Arc::new(InMemoryMessageStore::new());
    let t = |h| Utc.with_ymd_and_hms(2024, 5, 1, h, 0, 0).unwrap();
    store
        .append(&ChatMessage::new("alice".into(), "first".into(), t(9)))
        .await
        .unwrap();
    store
        .append(&ChatMessage::new("bob".into(), "second".into(), t(7)))
        .await
        .unwrap();
    store
        .append(&ChatMessage::new("carol".into(), "third".into(), t(8)))
        .await
        .unwrap();
    let (url, _state) = spawn_server(store, Arc::new(SystemClock)).await;

    // when:
    let mut client = connect(&url).await;

    // then: history arrives in store-return order, untouched by timestamps
    assert_eq!(next_message(&mut client).await.text, "first");
    assert_eq!(next_message(&mut client).await.text, "second");
    assert_eq!(next_message(&mut client).await.text, "third");
}

#[tokio::test]
async fn test_history_precedes_live_traffic_for_a_new_joiner() {
    // given: one resident client and some history
    let store = Arc::new(InMemoryMessageStore::new());
    store
        .append(&ChatMessage::new(
            "alice".into(),
            "old news".into(),
            Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
        ))
        .await
        .unwrap();
    let (url, _state) = spawn_server(store, Arc::new(SystemClock)).await;
    let mut resident = connect(&url).await;
    assert_eq!(next_message(&mut resident).await.text, "old news");

    // when: a second client joins and, once its replay is done, the
    // resident speaks
    let mut joiner = connect(&url).await;
    assert_eq!(next_message(&mut joiner).await.text, "old news");
    send_json(&mut resident, r#"{"username":"alice","text":"fresh"}"#).await;

    // then: both see the live message after the history
    assert_eq!(next_message(&mut joiner).await.text, "fresh");
    assert_eq!(next_message(&mut resident).await.text, "fresh");
}

#[tokio::test]
async fn test_broadcast_reaches_every_client_including_the_sender() {
    // given:
    let store = Arc::new(InMemoryMessageStore::new());
    let (url, state) = spawn_server(store, Arc::new(SystemClock)).await;
    let mut alice = connect(&url).await;
    let mut bob = connect(&url).await;
    let mut carol = connect(&url).await;
    wait_for_registry_len(&state, 3).await;

    // when:
    send_json(&mut alice, r#"{"username":"alice","text":"hello all"}"#).await;

    // then:
    assert_eq!(next_message(&mut alice).await.text, "hello all");
    assert_eq!(next_message(&mut bob).await.text, "hello all");
    assert_eq!(next_message(&mut carol).await.text, "hello all");
}

#[tokio::test]
async fn test_disconnected_client_is_unregistered_and_others_still_receive() {
    // given: three clients, one of which drops its connection
    let store = Arc::new(InMemoryMessageStore::new());
    let (url, state) = spawn_server(store, Arc::new(SystemClock)).await;
    let mut alice = connect(&url).await;
    let mut bob = connect(&url).await;
    let quitter = connect(&url).await;

    // wait for all three sessions to register
    wait_for_registry_len(&state, 3).await;

    // when: the quitter goes away and alice speaks
    drop(quitter);
    wait_for_registry_len(&state, 2).await;
    send_json(&mut alice, r#"{"username":"alice","text":"anyone there?"}"#).await;

    // then: the survivors both get the message
    assert_eq!(next_message(&mut alice).await.text, "anyone there?");
    assert_eq!(next_message(&mut bob).await.text, "anyone there?");
}

#[tokio::test]
async fn test_store_outage_degrades_join_and_never_blocks_broadcast() {
    // given: a store that fails every operation
    struct FailingStore;

    #[async_trait::async_trait]
    impl MessageStore for FailingStore {
        async fn append(&self, _message: &ChatMessage) -> Result<(), StoreError> {
            Err(StoreError::Write("store unavailable".to_string()))
        }

        async fn fetch_all(&self) -> Result<Vec<ChatMessage>, StoreError> {
            Err(StoreError::Query("store unavailable".to_string()))
        }
    }

    let (url, state) = spawn_server(Arc::new(FailingStore), Arc::new(SystemClock)).await;

    // when: clients join during the outage and one of them speaks
    let mut alice = connect(&url).await;
    let mut bob = connect(&url).await;
    wait_for_registry_len(&state, 2).await;
    send_json(&mut alice, r#"{"username":"alice","text":"still here"}"#).await;

    // then: no history, no hard failure, and the broadcast still goes out
    assert_eq!(next_message(&mut alice).await.text, "still here");
    assert_eq!(next_message(&mut bob).await.text, "still here");
}

#[tokio::test]
async fn test_malformed_payload_is_skipped_without_killing_the_session() {
    // given:
    let store = Arc::new(InMemoryMessageStore::new());
    let (url, _state) = spawn_server(store, Arc::new(SystemClock)).await;
    let mut client = connect(&url).await;

    // when: garbage, then a valid message on the same connection
    send_json(&mut client, "this is not json").await;
    send_json(&mut client, r#"{"username":"alice","text":"recovered"}"#).await;

    // then: the session survived and only the valid message is broadcast
    assert_eq!(next_message(&mut client).await.text, "recovered");
}

async fn wait_for_registry_len(state: &Arc<AppState>, expected: usize) {
    for _ in 0..200 {
        if state.registry.len().await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "registry never reached {} members (now {})",
        expected,
        state.registry.len().await
    );
}
