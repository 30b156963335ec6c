//! Shared fixtures for client integration tests: a loopback notification
//! channel, a canned REST responder, and a toaster that records calls.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::Message;

use ustaz_client::{NotificationBridge, RouteTracker, StaticTokenStore, Toaster};
use ustaz_realtime::{ChannelConfig, ChannelManager, ReconnectConfig};
use ustaz_store::NotificationStore;

pub const GOOD_TOKEN: &str = "good-token";

// ---------------------------------------------------------------------------
// Toasts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toast {
    Success { title: String, message: String },
    Error(String),
}

#[derive(Debug, Default)]
pub struct RecordingToaster {
    toasts: Mutex<Vec<Toast>>,
}

impl RecordingToaster {
    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().unwrap().clone()
    }
}

impl Toaster for RecordingToaster {
    fn success(&self, title: &str, message: &str) {
        self.toasts.lock().unwrap().push(Toast::Success {
            title: title.to_string(),
            message: message.to_string(),
        });
    }

    fn error(&self, message: &str) {
        self.toasts.lock().unwrap().push(Toast::Error(message.to_string()));
    }
}

// ---------------------------------------------------------------------------
// Loopback notification channel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Command {
    Text(String),
    Close,
}

pub struct ChannelServer {
    pub url: String,
    handshakes: Arc<AtomicUsize>,
    live: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<String>>>,
    commands: broadcast::Sender<Command>,
    task: JoinHandle<()>,
}

impl ChannelServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}/ws/notifications", listener.local_addr().unwrap());
        let handshakes = Arc::new(AtomicUsize::new(0));
        let live = Arc::new(AtomicUsize::new(0));
        let received = Arc::new(Mutex::new(Vec::new()));
        let (commands, _) = broadcast::channel(64);

        let task = {
            let (handshakes, live, received) = (handshakes.clone(), live.clone(), received.clone());
            let commands = commands.clone();
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let (handshakes, live, received) = (handshakes.clone(), live.clone(), received.clone());
                    let mut rx = commands.subscribe();
                    tokio::spawn(async move {
                        let Ok(ws) = accept_hdr_async(stream, check_bearer).await else {
                            return;
                        };
                        handshakes.fetch_add(1, Ordering::SeqCst);
                        live.fetch_add(1, Ordering::SeqCst);
                        let (mut sink, mut frames) = ws.split();
                        loop {
                            tokio::select! {
                                frame = frames.next() => match frame {
                                    Some(Ok(Message::Text(text))) => received.lock().unwrap().push(text),
                                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                                    Some(Ok(_)) => {}
                                },
                                cmd = rx.recv() => match cmd {
                                    Ok(Command::Text(text)) => {
                                        if sink.send(Message::Text(text)).await.is_err() {
                                            break;
                                        }
                                    }
                                    Ok(Command::Close) | Err(_) => {
                                        let _ = sink.send(Message::Close(None)).await;
                                        break;
                                    }
                                },
                            }
                        }
                        live.fetch_sub(1, Ordering::SeqCst);
                    });
                }
            })
        };

        Self {
            url,
            handshakes,
            live,
            received,
            commands,
            task,
        }
    }

    pub fn handshakes(&self) -> usize {
        self.handshakes.load(Ordering::SeqCst)
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }

    pub fn push(&self, frame: impl Into<String>) {
        let _ = self.commands.send(Command::Text(frame.into()));
    }

    pub fn close_all(&self) {
        let _ = self.commands.send(Command::Close);
    }

    pub fn manager(&self) -> Arc<ChannelManager> {
        ChannelManager::new(ChannelConfig {
            ws_url: self.url.clone(),
            reconnect: ReconnectConfig {
                initial_delay: Duration::from_millis(50),
                max_delay: Duration::from_millis(200),
                multiplier: 2.0,
            },
        })
    }
}

impl Drop for ChannelServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[allow(clippy::result_large_err)]
fn check_bearer(request: &Request, response: Response) -> Result<Response, ErrorResponse> {
    let expected = format!("Bearer {GOOD_TOKEN}");
    let ok = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    if ok {
        return Ok(response);
    }
    let mut rejection = ErrorResponse::new(Some("unauthorized".to_string()));
    *rejection.status_mut() = StatusCode::UNAUTHORIZED;
    Err(rejection)
}

// ---------------------------------------------------------------------------
// Bridge fixture
// ---------------------------------------------------------------------------

pub struct Harness {
    pub server: ChannelServer,
    pub manager: Arc<ChannelManager>,
    pub store: NotificationStore,
    pub toaster: Arc<RecordingToaster>,
    pub route: RouteTracker,
}

impl Harness {
    pub async fn start() -> Self {
        let server = ChannelServer::start().await;
        let manager = server.manager();
        Self {
            server,
            manager,
            store: NotificationStore::new(),
            toaster: Arc::new(RecordingToaster::default()),
            route: RouteTracker::new("/student/dashboard"),
        }
    }

    pub fn bridge_with_token(&self, token: Option<&str>) -> NotificationBridge {
        let tokens = match token {
            Some(token) => StaticTokenStore::new(token),
            None => StaticTokenStore::empty(),
        };
        NotificationBridge::new(
            Arc::clone(&self.manager),
            self.store.clone(),
            Arc::new(tokens),
            self.toaster.clone(),
        )
        .with_route(self.route.clone())
    }

    pub fn bridge(&self) -> NotificationBridge {
        self.bridge_with_token(Some(GOOD_TOKEN))
    }
}

// ---------------------------------------------------------------------------
// Canned REST responder
// ---------------------------------------------------------------------------

/// Serve the given `(status line, body)` replies, one per connection, in
/// order. The task yields each request's head.
pub async fn serve_http(replies: Vec<(&'static str, String)>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/api", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let mut heads = Vec::new();
        for (status, body) in replies {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            let reply = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            heads.push(String::from_utf8_lossy(&buf).into_owned());
        }
        heads
    });

    (url, handle)
}

// ---------------------------------------------------------------------------
// Frames and helpers
// ---------------------------------------------------------------------------

pub fn notification_json(id: &str, is_read: bool) -> serde_json::Value {
    serde_json::json!({
        "_id": id,
        "type": "consultation_request",
        "title": { "ar": "استشارة جديدة", "en": "New consultation" },
        "message": { "ar": "لديك طلب استشارة جديد", "en": "You have a new consultation request" },
        "relatedId": "inq-7",
        "relatedModel": "Inquiry",
        "isRead": is_read,
        "createdAt": "2026-04-12T08:15:00Z"
    })
}

pub fn new_notification_frame(id: &str, is_read: bool) -> String {
    serde_json::json!({ "event": "new-notification", "data": notification_json(id, is_read) }).to_string()
}

pub fn marked_read_frame(id: &str) -> String {
    serde_json::json!({
        "event": "notification-marked-read",
        "data": { "notificationId": id, "isRead": true }
    })
    .to_string()
}

pub fn all_marked_read_frame(success: bool) -> String {
    serde_json::json!({ "event": "all-notifications-marked-read", "data": { "success": success } }).to_string()
}

pub fn error_frame(message: &str) -> String {
    serde_json::json!({ "event": "error", "data": { "message": message } }).to_string()
}

/// Poll `condition` every 10ms until it holds or five seconds pass.
pub async fn wait_until<F: FnMut() -> bool>(mut condition: F) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// Let in-flight frames land before asserting that nothing happened.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(150)).await;
}
