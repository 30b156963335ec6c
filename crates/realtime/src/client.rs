//! WebSocket handshake against the notification channel endpoint.
//!
//! [`ChannelClient`] holds the endpoint URL. Call
//! [`ChannelClient::connect`] with the user's token to obtain a live
//! [`ChannelConnection`].

use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::{HeaderValue, StatusCode};
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// The raw stream type used for a live channel.
pub type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Endpoint configuration for the notification channel.
#[derive(Debug, Clone)]
pub struct ChannelClient {
    ws_url: String,
}

/// A live, authenticated channel connection.
pub struct ChannelConnection {
    /// Random id generated per handshake, for log correlation.
    pub client_id: String,
    pub ws_stream: WsStream,
}

impl ChannelClient {
    /// * `ws_url` - full endpoint, e.g. `wss://api.example.com/ws/notifications`.
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
        }
    }

    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    /// Open the WebSocket, authenticating with `Authorization: Bearer`.
    ///
    /// A 401/403 handshake response maps to
    /// [`ClientError::Unauthorized`]; anything else that prevents the
    /// upgrade maps to [`ClientError::Connection`].
    pub async fn connect(&self, token: &str) -> Result<ChannelConnection, ClientError> {
        let client_id = uuid::Uuid::new_v4().to_string();

        let mut request = self
            .ws_url
            .as_str()
            .into_client_request()
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {e}", self.ws_url)))?;

        let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ClientError::InvalidToken)?;
        request.headers_mut().insert(AUTHORIZATION, bearer);

        let ws_stream = match connect_async(request).await {
            Ok((ws_stream, _response)) => ws_stream,
            Err(WsError::Http(response))
                if response.status() == StatusCode::UNAUTHORIZED
                    || response.status() == StatusCode::FORBIDDEN =>
            {
                return Err(ClientError::Unauthorized(format!(
                    "handshake returned {}",
                    response.status()
                )));
            }
            Err(e) => {
                return Err(ClientError::Connection(format!(
                    "Failed to connect to notification channel at {}: {e}",
                    self.ws_url
                )));
            }
        };

        tracing::info!(
            client_id = %client_id,
            "Connected to notification channel at {}",
            self.ws_url,
        );

        Ok(ChannelConnection {
            client_id,
            ws_stream,
        })
    }
}

/// Errors that can occur while establishing the channel.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The configured endpoint is not a valid WebSocket URL.
    #[error("Invalid channel URL: {0}")]
    InvalidUrl(String),

    /// The token contains characters that cannot go in an HTTP header.
    #[error("Auth token is not a valid header value")]
    InvalidToken,

    /// The server refused the handshake credentials.
    #[error("Authentication rejected: {0}")]
    Unauthorized(String),

    /// Network-level failure establishing the connection.
    #[error("Connection error: {0}")]
    Connection(String),
}
