/// End-to-end sessions: a real listener, real websocket clients, and the
/// client reconciler rendering into a virtual DOM.

use futures::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use trellis_client::types::{ClientEvent, ClientMessage, Op, ServerMessage, WidgetId, WidgetKind};
use trellis_client::{ClientSession, VirtualDom};
use trellis_server::demo::demo_ui_with_clock;
use trellis_server::{UiFactory, serve_with_listener};
use trellis_ui::widgets::{button, label};
use trellis_ui::{SharedUi, Ui, handler};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start(factory: UiFactory) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve_with_listener(listener, factory, Duration::from_millis(10)));
    addr
}

fn quiet_demo() -> UiFactory {
    Arc::new(|| demo_ui_with_clock(None))
}

/// A label and a button whose handler marks the label, waits, and marks it
/// again, numbering each run.
fn slow_handler_ui() -> SharedUi {
    let mut ui = Ui::new();
    let root = ui.root();
    let status = ui.attach(&root, label("idle")).unwrap();
    let go = ui.attach(&root, button("Go")).unwrap();
    let runs = Arc::new(AtomicUsize::new(0));
    ui.on_click(
        &go,
        handler(move |ctx| {
            let status = status.clone();
            let run = runs.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                ctx.update(|ui| ui.set_property(&status, "text", format!("start-{run}")))?;
                tokio::time::sleep(Duration::from_millis(50)).await;
                ctx.update(|ui| ui.set_property(&status, "text", format!("end-{run}")))?;
                Ok(())
            }
        }),
    );
    ui.into_shared()
}

async fn next_frame(socket: &mut Socket) -> Message {
    tokio::time::timeout(Duration::from_secs(5), socket.next())
        .await
        .expect("timed out waiting for the server")
        .expect("socket closed")
        .unwrap()
}

async fn next_text(socket: &mut Socket) -> String {
    loop {
        if let Message::Text(text) = next_frame(socket).await {
            return text;
        }
    }
}

struct TestClient {
    socket: Socket,
    session: ClientSession<VirtualDom>,
}

impl TestClient {
    async fn connect(addr: SocketAddr) -> Self {
        let (mut socket, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
        let text = next_text(&mut socket).await;
        assert!(matches!(
            ServerMessage::from_json(&text).unwrap(),
            ServerMessage::InitialState(_)
        ));
        let mut session = ClientSession::new(VirtualDom::new());
        session.handle_message(&text).unwrap();
        Self { socket, session }
    }

    async fn send(&mut self, message: ClientMessage) {
        let text = message.to_json().unwrap();
        self.socket.send(Message::Text(text)).await.unwrap();
    }

    async fn send_event(&mut self, event: ClientEvent) {
        self.send(ClientMessage::Event(event)).await;
    }

    /// Read one frame and feed it to the reconciler.
    async fn receive(&mut self) -> ServerMessage {
        let text = next_text(&mut self.socket).await;
        self.session.handle_message(&text).unwrap();
        ServerMessage::from_json(&text).unwrap()
    }

    fn find(&self, kind: WidgetKind, text: &str) -> WidgetId {
        let cache = self.session.cache();
        cache
            .ids()
            .find(|id| {
                cache.get(id).is_some_and(|w| {
                    w.kind.as_ref() == Some(&kind) && w.str_property("text") == Some(text)
                })
            })
            .cloned()
            .unwrap_or_else(|| panic!("no {kind} with text {text:?}"))
    }

    async fn click(&mut self, widget: &WidgetId) {
        let event = self.session.dom_mut().click(widget).unwrap();
        self.send_event(event).await;
    }
}

#[tokio::test]
async fn test_initial_state_shows_home_page() {
    let addr = start(quiet_demo()).await;
    let client = TestClient::connect(addr).await;

    assert_eq!(client.session.current_path(), Some("home"));
    assert_eq!(client.session.dom().title(), "Trellis - Home");
    let count = client.find(WidgetKind::Label, "Count: 0");
    assert_eq!(client.session.dom().text_of(&count), Some("Count: 0"));
}

#[tokio::test]
async fn test_counter_click_round_trip() {
    let addr = start(quiet_demo()).await;
    let mut client = TestClient::connect(addr).await;
    let count = client.find(WidgetKind::Label, "Count: 0");
    let increment = client.find(WidgetKind::Button, "Increment");

    client.click(&increment).await;
    let message = client.receive().await;

    assert_eq!(
        message,
        ServerMessage::Updates(vec![Op::Update {
            id: count.clone(),
            property: "text".to_string(),
            value: "Count: 1".into(),
        }])
    );
    assert_eq!(client.session.dom().text_of(&count), Some("Count: 1"));
}

#[tokio::test]
async fn test_nav_link_switches_page() {
    let addr = start(quiet_demo()).await;
    let mut client = TestClient::connect(addr).await;
    let about = client.find(WidgetKind::NavLink, "About");

    client.click(&about).await;
    let ServerMessage::Updates(ops) = client.receive().await else {
        panic!("expected updates");
    };

    let actions: Vec<_> = ops.iter().map(Op::action).collect();
    assert!(actions.contains(&"navigation"));
    assert!(actions.contains(&"page_widgets"));
    assert_eq!(client.session.current_path(), Some("about"));
    assert_eq!(client.session.dom().title(), "Trellis - About");
    assert_eq!(client.session.dom().location(), Some("?page=about"));

    let back = client.find(WidgetKind::NavLink, "Back to Home");
    assert!(client.session.dom().text_of(&back).is_some());
}

#[tokio::test]
async fn test_browser_navigation_event() {
    let addr = start(quiet_demo()).await;
    let mut client = TestClient::connect(addr).await;

    let event = client.session.location_changed("contact").unwrap();
    client.send_event(event).await;
    client.receive().await;

    assert_eq!(client.session.current_path(), Some("contact"));
    let send = client.find(WidgetKind::Button, "Send");
    assert!(client.session.dom().text_of(&send).is_some());
}

#[tokio::test]
async fn test_resync_resends_snapshot() {
    let addr = start(quiet_demo()).await;
    let mut client = TestClient::connect(addr).await;
    let increment = client.find(WidgetKind::Button, "Increment");
    client.click(&increment).await;
    client.receive().await;

    client.session.reset();
    client.send(ClientMessage::resync()).await;
    let ServerMessage::InitialState(snapshot) = client.receive().await else {
        panic!("expected a snapshot");
    };

    assert_eq!(snapshot.path.as_deref(), Some("home"));
    let count = client.find(WidgetKind::Label, "Count: 1");
    assert_eq!(client.session.dom().text_of(&count), Some("Count: 1"));
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let addr = start(quiet_demo()).await;
    let mut first = TestClient::connect(addr).await;
    let mut second = TestClient::connect(addr).await;

    let increment = first.find(WidgetKind::Button, "Increment");
    first.click(&increment).await;
    first.receive().await;
    first.click(&increment).await;
    first.receive().await;

    let increment = second.find(WidgetKind::Button, "Increment");
    second.click(&increment).await;
    second.receive().await;

    first.find(WidgetKind::Label, "Count: 2");
    second.find(WidgetKind::Label, "Count: 1");
}

#[tokio::test]
async fn test_background_changes_are_flushed() {
    let addr = start(Arc::new(|| demo_ui_with_clock(Some(Duration::from_millis(20))))).await;
    let mut client = TestClient::connect(addr).await;
    let clock = client.find(WidgetKind::Label, "Seconds connected: 0");

    let ServerMessage::Updates(ops) = client.receive().await else {
        panic!("expected updates");
    };

    assert!(ops.iter().all(|op| matches!(op, Op::Update { id, .. } if *id == clock)));
    assert_ne!(client.session.dom().text_of(&clock), Some("Seconds connected: 0"));
}

#[tokio::test]
async fn test_malformed_frames_are_ignored() {
    let addr = start(quiet_demo()).await;
    let mut client = TestClient::connect(addr).await;

    client
        .socket
        .send(Message::Text("{not json".to_string()))
        .await
        .unwrap();
    client
        .send_event(ClientEvent::click("no-such-widget"))
        .await;

    let increment = client.find(WidgetKind::Button, "Increment");
    client.click(&increment).await;
    let ServerMessage::Updates(ops) = client.receive().await else {
        panic!("expected updates");
    };
    assert_eq!(ops.len(), 1);
}

#[tokio::test]
async fn test_events_are_handled_one_at_a_time() {
    let addr = start(Arc::new(slow_handler_ui)).await;
    let mut client = TestClient::connect(addr).await;
    let status = client.find(WidgetKind::Label, "idle");
    let go = client.find(WidgetKind::Button, "Go");

    client.click(&go).await;
    client.click(&go).await;

    let mut texts = Vec::new();
    while texts.len() < 4 {
        let ServerMessage::Updates(ops) = client.receive().await else {
            panic!("expected updates");
        };
        for op in ops {
            match op {
                Op::Update { id, value, .. } => {
                    assert_eq!(id, status);
                    texts.push(value.as_str().unwrap_or_default().to_string());
                }
                other => panic!("unexpected op {other:?}"),
            }
        }
    }

    assert_eq!(texts, ["start-1", "end-1", "start-2", "end-2"]);
    assert_eq!(client.session.dom().text_of(&status), Some("end-2"));
}

#[tokio::test]
async fn test_ping_gets_pong_and_session_continues() {
    let addr = start(quiet_demo()).await;
    let mut client = TestClient::connect(addr).await;

    client
        .socket
        .send(Message::Ping(b"beat".to_vec()))
        .await
        .unwrap();
    match next_frame(&mut client.socket).await {
        Message::Pong(payload) => assert_eq!(payload, b"beat".to_vec()),
        other => panic!("unexpected frame {other:?}"),
    }

    let increment = client.find(WidgetKind::Button, "Increment");
    client.click(&increment).await;
    let ServerMessage::Updates(ops) = client.receive().await else {
        panic!("expected updates");
    };
    assert_eq!(ops.len(), 1);
}
