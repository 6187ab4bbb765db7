//! End-to-end tests: a real server on an ephemeral port, driven over `/ws`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use iopanel_adapter_http_axum::router;
use iopanel_adapter_http_axum::state::AppState;
use iopanel_adapter_virtual::VirtualBoard;
use iopanel_app::observer_hub::ObserverHub;
use iopanel_app::registry::{Declarations, OutputRegistry};
use iopanel_domain::entity::{AnalogChannel, AnalogRange, BinaryMode, Level, NamedVariable, Toggle};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const TIMEOUT: Duration = Duration::from_secs(5);

struct Server {
    addr: SocketAddr,
    board: Arc<VirtualBoard>,
    hub: Arc<ObserverHub>,
}

fn stock_panel() -> Declarations {
    Declarations {
        modes: vec![
            BinaryMode::builder()
                .token("STATE")
                .pin(2)
                .high("bON", "ON")
                .low("bOFF", "OFF")
                .build()
                .unwrap(),
            BinaryMode::builder()
                .token("MODE")
                .pin(4)
                .high("bAUTO", "AUTO")
                .low("bMAN", "MAN")
                .build()
                .unwrap(),
        ],
        toggles: vec![Toggle::new(12), Toggle::new(14)],
        analog: vec![
            AnalogChannel::new(5, AnalogRange::new(0, 1000).unwrap(), 0),
            AnalogChannel::new(15, AnalogRange::new(50, 350).unwrap(), 0),
        ],
        variables: vec![
            NamedVariable::new("tSET", 0).unwrap(),
            NamedVariable::new("rhSET", 0).unwrap(),
        ],
    }
}

async fn start() -> Server {
    let board = Arc::new(VirtualBoard::new());
    let registry = OutputRegistry::new(Arc::clone(&board), 255, stock_panel()).unwrap();
    let hub = Arc::new(ObserverHub::new(32));
    let state = AppState::new(Arc::new(registry), Arc::clone(&hub), std::env::temp_dir());
    let app = router::build(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Server { addr, board, hub }
}

impl Server {
    /// Connect `n` clients and wait until all of them are registered.
    async fn connect(&self, n: usize) -> Vec<Client> {
        let before = self.hub.len();
        let mut clients = Vec::with_capacity(n);
        for _ in 0..n {
            let (client, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws", self.addr))
                .await
                .unwrap();
            clients.push(client);
        }
        self.wait_for_observers(before + n).await;
        clients
    }

    async fn wait_for_observers(&self, expected: usize) {
        tokio::time::timeout(TIMEOUT, async {
            while self.hub.len() != expected {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }
}

async fn send(client: &mut Client, text: &str) {
    client.send(Message::text(text.to_string())).await.unwrap();
}

async fn next_text(client: &mut Client) -> String {
    loop {
        let message = tokio::time::timeout(TIMEOUT, client.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        if let Message::Text(text) = message {
            return text.as_str().to_string();
        }
    }
}

async fn next_texts(client: &mut Client, n: usize) -> Vec<String> {
    let mut frames = Vec::with_capacity(n);
    for _ in 0..n {
        frames.push(next_text(client).await);
    }
    frames
}

fn full_sync_frames() -> Vec<String> {
    [
        "OFF",
        "MAN",
        r#"{"dfb":"12","state":"0"}"#,
        r#"{"dfb":"14","state":"0"}"#,
        r#"{"afb":"5","value":"0"}"#,
        r#"{"afb":"15","value":"50"}"#,
        r#"{"afb":"tSET","value":"0"}"#,
        r#"{"afb":"rhSET","value":"0"}"#,
    ]
    .map(String::from)
    .to_vec()
}

#[tokio::test]
async fn should_broadcast_toggle_to_every_observer() {
    let server = start().await;
    let mut clients = server.connect(2).await;

    send(&mut clients[0], r#"{"d_o":"12"}"#).await;

    let expected = r#"{"dfb":"12","state":"1"}"#;
    assert_eq!(next_text(&mut clients[0]).await, expected);
    assert_eq!(next_text(&mut clients[1]).await, expected);
    assert_eq!(server.board.level(12), Some(Level::High));
}

#[tokio::test]
async fn should_tune_analog_channel_and_drive_pwm() {
    let server = start().await;
    let mut clients = server.connect(1).await;

    send(&mut clients[0], r#"{"a_o":"5","value":"15"}"#).await;

    assert_eq!(
        next_text(&mut clients[0]).await,
        r#"{"afb":"5","value":"15"}"#
    );
    assert_eq!(server.board.duty(5), Some(3));
}

#[tokio::test]
async fn should_store_variable_without_clamping() {
    let server = start().await;
    let mut clients = server.connect(1).await;

    send(&mut clients[0], r#"{"set":"rhSET","value":"55"}"#).await;

    assert_eq!(
        next_text(&mut clients[0]).await,
        r#"{"afb":"rhSET","value":"55"}"#
    );
}

#[tokio::test]
async fn should_send_one_frame_per_entity_on_full_sync() {
    let server = start().await;
    let mut clients = server.connect(1).await;

    send(&mut clients[0], r#"{"all":"update"}"#).await;

    assert_eq!(next_texts(&mut clients[0], 8).await, full_sync_frames());
}

#[tokio::test]
async fn should_ignore_malformed_frames() {
    let server = start().await;
    let mut clients = server.connect(1).await;

    for payload in ["garbage", "[]", r#"{"foo":1}"#, r#"{"d_o":"99"}"#] {
        send(&mut clients[0], payload).await;
    }
    send(&mut clients[0], r#"{"but":"bAUTO"}"#).await;

    assert_eq!(next_text(&mut clients[0]).await, "AUTO");
    assert_eq!(server.board.level(4), Some(Level::High));
}

#[tokio::test]
async fn should_echo_unknown_button_with_first_character_stripped() {
    let server = start().await;
    let mut clients = server.connect(1).await;

    send(&mut clients[0], r#"{"but":"bXYZ"}"#).await;

    assert_eq!(next_text(&mut clients[0]).await, "XYZ");
}

#[tokio::test]
async fn should_complete_full_sync_for_others_when_one_observer_leaves() {
    let server = start().await;
    let mut clients = server.connect(3).await;
    let mut leaving = clients.pop().unwrap();

    send(&mut clients[0], r#"{"all":"update"}"#).await;
    leaving.close(None).await.unwrap();
    drop(leaving);

    assert_eq!(next_texts(&mut clients[0], 8).await, full_sync_frames());
    assert_eq!(next_texts(&mut clients[1], 8).await, full_sync_frames());
    server.wait_for_observers(2).await;

    send(&mut clients[1], r#"{"d_o":"14"}"#).await;
    let expected = r#"{"dfb":"14","state":"1"}"#;
    assert_eq!(next_text(&mut clients[0]).await, expected);
    assert_eq!(next_text(&mut clients[1]).await, expected);
}

async fn next_message(client: &mut Client) -> Message {
    tokio::time::timeout(TIMEOUT, client.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn should_answer_ping_with_exactly_one_pong() {
    let server = start().await;
    let mut clients = server.connect(1).await;

    clients[0]
        .send(Message::Ping("hello".into()))
        .await
        .unwrap();
    send(&mut clients[0], r#"{"d_o":"12"}"#).await;

    let message = next_message(&mut clients[0]).await;
    assert!(matches!(message, Message::Pong(data) if data.as_ref() == b"hello"));
    assert_eq!(
        next_message(&mut clients[0]).await,
        Message::text(r#"{"dfb":"12","state":"1"}"#.to_string())
    );
}

#[tokio::test]
async fn should_deregister_observer_on_close() {
    let server = start().await;
    let mut clients = server.connect(2).await;

    clients[1].close(None).await.unwrap();
    server.wait_for_observers(1).await;

    send(&mut clients[0], r#"{"set":"tSET","value":"215"}"#).await;
    assert_eq!(
        next_text(&mut clients[0]).await,
        r#"{"afb":"tSET","value":"215"}"#
    );
}
