//! WebSocket relay transport.
//!
//! Each fetch opens a fresh connection, sends one `REQ`, collects stored
//! events until `EOSE`, sends `CLOSE` and disconnects. Queries are one-shot,
//! so there is no connection pool and no reconnection logic.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, trace};
use url::Url;

use super::message::{ClientMessage, RelayMessage};
use super::{RelayError, RelayTransport};
use crate::event::{Event, Filter};

/// Default timeout for establishing a relay connection
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// NIP-01 transport over `ws://` / `wss://`.
pub struct WebSocketTransport {
    connect_timeout: Duration,
    next_subscription: AtomicU64,
}

impl WebSocketTransport {
    /// Create a transport with default timeouts.
    pub fn new() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            next_subscription: AtomicU64::new(1),
        }
    }

    /// Set the connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    fn subscription_id(&self) -> String {
        let n = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        format!("trustgraph-{n}")
    }
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Check that `url` names a WebSocket endpoint.
pub fn validate_relay_url(url: &str) -> Result<Url, RelayError> {
    let parsed = Url::parse(url).map_err(|e| RelayError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "ws" | "wss" => Ok(parsed),
        other => Err(RelayError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme {other}"),
        }),
    }
}

#[async_trait]
impl RelayTransport for WebSocketTransport {
    async fn fetch(&self, url: &str, filter: &Filter) -> Result<Vec<Event>, RelayError> {
        let endpoint = validate_relay_url(url)?;

        let (ws_stream, _) =
            tokio::time::timeout(self.connect_timeout, connect_async(endpoint.as_str()))
                .await
                .map_err(|_| RelayError::Timeout(self.connect_timeout))?
                .map_err(|e| RelayError::Connect(e.to_string()))?;

        let (mut write, mut read) = ws_stream.split();

        let subscription_id = self.subscription_id();
        let req = ClientMessage::Req {
            subscription_id: &subscription_id,
            filter,
        }
        .to_json()
        .map_err(|e| RelayError::Protocol(e.to_string()))?;

        write
            .send(Message::Text(req))
            .await
            .map_err(|e| RelayError::Protocol(format!("Failed to send REQ: {e}")))?;

        let mut events = Vec::new();
        let outcome = loop {
            let Some(frame) = read.next().await else {
                break Err(RelayError::Protocol(
                    "connection ended before end of stored events".to_string(),
                ));
            };

            let text = match frame {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) => {
                    break Err(RelayError::Protocol("relay closed the connection".to_string()))
                }
                Ok(_) => continue,
                Err(e) => break Err(RelayError::Protocol(e.to_string())),
            };

            match RelayMessage::parse(&text) {
                Ok(RelayMessage::Event {
                    subscription_id: sid,
                    event,
                }) if sid == subscription_id => events.push(*event),
                Ok(RelayMessage::EndOfStoredEvents { subscription_id: sid })
                    if sid == subscription_id =>
                {
                    break Ok(())
                }
                Ok(RelayMessage::Closed {
                    subscription_id: sid,
                    message,
                }) if sid == subscription_id => break Err(RelayError::Closed(message)),
                Ok(RelayMessage::Notice { message }) => {
                    debug!(relay = url, notice = %message, "Relay notice");
                }
                Ok(other) => trace!(relay = url, frame = ?other, "Ignoring frame"),
                Err(e) => debug!(relay = url, error = %e, "Skipping malformed frame"),
            }
        };

        if outcome.is_ok() {
            if let Ok(close) = (ClientMessage::Close {
                subscription_id: &subscription_id,
            })
            .to_json()
            {
                let _ = write.send(Message::Text(close)).await;
            }
        }
        let _ = write.close().await;

        outcome.map(|()| events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_relay_url() {
        assert!(validate_relay_url("wss://relay.damus.io").is_ok());
        assert!(validate_relay_url("ws://localhost:7777").is_ok());
        assert!(matches!(
            validate_relay_url("https://relay.damus.io"),
            Err(RelayError::InvalidUrl { .. })
        ));
        assert!(matches!(
            validate_relay_url("relay.damus.io"),
            Err(RelayError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_subscription_ids_are_unique() {
        let transport = WebSocketTransport::new();
        assert_ne!(transport.subscription_id(), transport.subscription_id());
    }

    #[tokio::test]
    async fn test_unreachable_relay_fails() {
        let transport = WebSocketTransport::new().with_connect_timeout(Duration::from_secs(2));
        // Port 9 (discard) on loopback is not listening in test environments.
        let result = transport
            .fetch("ws://127.0.0.1:9", &Filter::default())
            .await;
        assert!(matches!(
            result,
            Err(RelayError::Connect(_)) | Err(RelayError::Timeout(_))
        ));
    }
}
