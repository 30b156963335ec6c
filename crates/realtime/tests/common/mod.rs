//! Loopback notification server for integration tests.
//!
//! Accepts WebSocket upgrades that carry `Authorization: Bearer <token>`,
//! rejects everything else with 401, records every text frame it receives,
//! and lets a test push frames or close all live sockets.

#![allow(dead_code)]

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::Message;

use ustaz_realtime::{ChannelConfig, ReconnectConfig};

pub const GOOD_TOKEN: &str = "good-token";

#[derive(Debug, Clone)]
enum Command {
    Text(String),
    Close,
}

pub struct TestServer {
    pub url: String,
    handshakes: Arc<AtomicUsize>,
    live: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<String>>>,
    commands: broadcast::Sender<Command>,
    task: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}/ws/notifications", listener.local_addr().unwrap());

        let handshakes = Arc::new(AtomicUsize::new(0));
        let live = Arc::new(AtomicUsize::new(0));
        let received = Arc::new(Mutex::new(Vec::new()));
        let (commands, _) = broadcast::channel(64);

        let task = {
            let handshakes = Arc::clone(&handshakes);
            let live = Arc::clone(&live);
            let received = Arc::clone(&received);
            let commands = commands.clone();
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let handshakes = Arc::clone(&handshakes);
                    let live = Arc::clone(&live);
                    let received = Arc::clone(&received);
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
                                    Some(Ok(Message::Text(text))) => {
                                        received.lock().unwrap().push(text);
                                    }
                                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                                    Some(Ok(_)) => {}
                                },
                                cmd = rx.recv() => match cmd {
                                    Ok(Command::Text(text)) => {
                                        if sink.send(Message::Text(text)).await.is_err() {
                                            break;
                                        }
                                    }
                                    Ok(Command::Close) => {
                                        let _ = sink.send(Message::Close(None)).await;
                                        break;
                                    }
                                    Err(_) => break,
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

    /// Successful upgrades since start.
    pub fn handshakes(&self) -> usize {
        self.handshakes.load(Ordering::SeqCst)
    }

    /// Sockets currently open.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Text frames received from clients, in arrival order.
    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }

    /// Push a text frame to every live socket.
    pub fn push(&self, text: impl Into<String>) {
        let _ = self.commands.send(Command::Text(text.into()));
    }

    /// Send a Close frame on every live socket.
    pub fn close_all(&self) {
        let _ = self.commands.send(Command::Close);
    }

    /// Channel config pointing at this server with a short backoff.
    pub fn config(&self) -> ChannelConfig {
        ChannelConfig {
            ws_url: self.url.clone(),
            reconnect: ReconnectConfig {
                initial_delay: Duration::from_millis(50),
                max_delay: Duration::from_millis(200),
                multiplier: 2.0,
            },
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[allow(clippy::result_large_err)]
fn check_bearer(request: &Request, response: Response) -> Result<Response, ErrorResponse> {
    let expected = format!("Bearer {GOOD_TOKEN}");
    let authorized = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);

    if authorized {
        Ok(response)
    } else {
        let mut rejection = ErrorResponse::new(Some("unauthorized".to_string()));
        *rejection.status_mut() = StatusCode::UNAUTHORIZED;
        Err(rejection)
    }
}

/// Poll `condition` every 10ms until it holds or five seconds pass.
pub async fn wait_until<F>(mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// Await `fut` with a five second ceiling.
pub async fn within<F: Future>(fut: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(5), fut)
        .await
        .expect("timed out")
}

pub fn new_notification_frame(id: &str, is_read: bool) -> String {
    serde_json::json!({
        "event": "new-notification",
        "data": {
            "_id": id,
            "type": "lesson_booked",
            "title": { "ar": "حجز درس جديد", "en": "New lesson booking" },
            "message": { "ar": "قام طالب بحجز درس", "en": "A student booked a lesson" },
            "isRead": is_read,
            "createdAt": "2026-03-01T09:30:00Z"
        }
    })
    .to_string()
}
