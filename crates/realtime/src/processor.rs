//! Per-session frame loop.
//!
//! Reads frames from a live channel, parses text frames into
//! [`InboundEvent`]s and fans them out to the matching handler list, while
//! writing queued [`OutboundEvent`]s. Returns when the session ends, with
//! the reason it ended.

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::client::WsStream;
use crate::events::{ChannelError, ChannelHandlers, DisconnectReason};
use crate::messages::{parse_message, InboundEvent, OutboundEvent};

/// Drive one session until it closes or `cancel` fires.
pub async fn run_session(
    ws_stream: WsStream,
    handlers: &ChannelHandlers,
    outbound: &mut mpsc::UnboundedReceiver<OutboundEvent>,
    cancel: &CancellationToken,
) -> DisconnectReason {
    let (mut sink, mut stream) = ws_stream.split();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                if let Err(e) = sink.send(Message::Close(None)).await {
                    tracing::debug!(error = %e, "Close frame not delivered");
                }
                return DisconnectReason::ClientInitiated;
            }
            Some(event) = outbound.recv() => {
                let json = match event.encode() {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!(event = event.name(), error = %e, "Failed to encode outbound event");
                        continue;
                    }
                };
                tracing::debug!(event = event.name(), "Sending channel event");
                if let Err(e) = sink.send(Message::Text(json)).await {
                    tracing::warn!(error = %e, "Channel write failed");
                    handlers.error.emit(&ChannelError::new(format!("Channel write failed: {e}")));
                    return DisconnectReason::Transport;
                }
            }
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_text_message(&text, handlers);
                    }
                    Some(Ok(Message::Binary(_))) => {
                        tracing::trace!("Ignoring binary frame");
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                        // Handled automatically by tungstenite.
                    }
                    Some(Ok(Message::Close(frame))) => {
                        tracing::info!(?frame, "Server closed notification channel");
                        return DisconnectReason::ServerInitiated;
                    }
                    Some(Ok(Message::Frame(_))) => {}
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Channel receive error");
                        handlers.error.emit(&ChannelError::new(format!("Channel receive error: {e}")));
                        return DisconnectReason::Transport;
                    }
                    None => {
                        tracing::info!("Channel stream ended");
                        return DisconnectReason::Transport;
                    }
                }
            }
        }
    }
}

/// Dispatch one text frame to the matching handler list.
///
/// Malformed or unknown frames are logged and dropped.
pub fn handle_text_message(text: &str, handlers: &ChannelHandlers) {
    match parse_message(text) {
        Ok(InboundEvent::NewNotification(notification)) => {
            let delivered = handlers.notification.emit(&notification);
            tracing::debug!(
                notification_id = %notification.id,
                kind = ?notification.kind,
                delivered,
                "New notification",
            );
        }
        Ok(InboundEvent::NotificationMarkedRead(data)) => {
            tracing::debug!(notification_id = %data.notification_id, "Notification marked read");
            handlers.marked_read.emit(&data);
        }
        Ok(InboundEvent::AllNotificationsMarkedRead(data)) => {
            tracing::debug!(success = data.success, "All notifications marked read");
            handlers.all_marked_read.emit(&data);
        }
        Ok(InboundEvent::Error(data)) => {
            tracing::warn!(message = %data.message, detail = ?data.error, "Channel error event");
            handlers.error.emit(&ChannelError::from(data));
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                raw_message = %text,
                "Failed to parse channel message",
            );
        }
    }
}
