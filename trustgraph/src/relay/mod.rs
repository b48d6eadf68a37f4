//! Relay query client.
//!
//! Fans a single filter out to every configured relay, tolerates relays that
//! fail or time out, and reduces the combined answer to at most one event per
//! (author, kind).
//!
//! ```text
//!            ┌──────────────┐
//!  Filter ──▶│  RelayPool   │── join_all ──┬──▶ relay A ──┐
//!            └──────────────┘              ├──▶ relay B ──┼──▶ dedup ──▶ Vec<Event>
//!                                          └──▶ relay C ──┘
//! ```

pub mod message;
pub mod mock;
pub mod websocket;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, warn};

use crate::event::{Event, EventKind, Filter};
use crate::identity::PublicKey;

pub use mock::MockTransport;
pub use websocket::WebSocketTransport;

/// Default per-relay timeout.
pub const DEFAULT_RELAY_TIMEOUT: Duration = Duration::from_secs(10);

/// Failure talking to a single relay.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RelayError {
    /// Endpoint is not a usable relay URL
    #[error("Invalid relay URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Connection could not be established
    #[error("Connection failed: {0}")]
    Connect(String),

    /// Relay did not answer in time
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Relay ended the subscription with an error
    #[error("Subscription closed by relay: {0}")]
    Closed(String),

    /// Protocol or transport failure mid-request
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Failure of a whole query.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RelayQueryError {
    /// Nothing to ask, or nobody to ask
    #[error("Invalid relay query: {0}")]
    InvalidFilter(&'static str),

    /// No relay produced an answer
    #[error("All {count} relays failed")]
    AllRelaysFailed {
        count: usize,
        errors: Vec<(String, RelayError)>,
    },
}

/// Transport used to run one filtered read against one relay.
///
/// Implementations return every stored event the relay sends for the filter
/// and stop at end-of-stored-events. They do not deduplicate.
#[async_trait]
pub trait RelayTransport: Send + Sync {
    /// Fetch stored events matching `filter` from the relay at `url`.
    async fn fetch(&self, url: &str, filter: &Filter) -> Result<Vec<Event>, RelayError>;
}

/// Queries a set of relays in parallel.
#[derive(Clone)]
pub struct RelayPool {
    relays: Vec<String>,
    transport: Arc<dyn RelayTransport>,
    timeout: Duration,
}

impl RelayPool {
    /// Create a pool over the given endpoints.
    pub fn new(relays: Vec<String>, transport: Arc<dyn RelayTransport>) -> Self {
        Self {
            relays,
            transport,
            timeout: DEFAULT_RELAY_TIMEOUT,
        }
    }

    /// Set the per-relay timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configured endpoints.
    pub fn relays(&self) -> &[String] {
        &self.relays
    }

    /// Query every relay and return the deduplicated union of their events.
    ///
    /// Individual relay failures are logged and ignored. The call fails only
    /// if the filter is unbounded, no relays are configured, or every relay
    /// fails.
    pub async fn query(&self, filter: &Filter) -> Result<Vec<Event>, RelayQueryError> {
        if self.relays.is_empty() {
            return Err(RelayQueryError::InvalidFilter("no relays configured"));
        }
        if filter.authors.is_empty() {
            return Err(RelayQueryError::InvalidFilter("empty author set"));
        }
        if filter.kinds.is_empty() {
            return Err(RelayQueryError::InvalidFilter("empty kind set"));
        }

        let requests = self.relays.iter().map(|url| async move {
            let outcome =
                match tokio::time::timeout(self.timeout, self.transport.fetch(url, filter)).await {
                    Ok(result) => result,
                    Err(_) => Err(RelayError::Timeout(self.timeout)),
                };
            (url.as_str(), outcome)
        });

        // Merge only once every relay has answered or given up.
        let outcomes = join_all(requests).await;

        let mut received = Vec::new();
        let mut errors = Vec::new();
        for (url, outcome) in outcomes {
            match outcome {
                Ok(events) => {
                    debug!(relay = url, events = events.len(), "Relay answered");
                    received.extend(events.into_iter().filter(|e| filter.matches(e)));
                }
                Err(e) => {
                    warn!(relay = url, error = %e, "Relay query failed, continuing without it");
                    errors.push((url.to_string(), e));
                }
            }
        }

        if errors.len() == self.relays.len() {
            return Err(RelayQueryError::AllRelaysFailed {
                count: errors.len(),
                errors,
            });
        }

        let events = dedup_latest(received);
        debug!(
            relays = self.relays.len(),
            failed = errors.len(),
            events = events.len(),
            "Relay query complete"
        );
        Ok(events)
    }
}

/// Keep only the winning event per (author, kind), ordered by that key.
pub fn dedup_latest(events: impl IntoIterator<Item = Event>) -> Vec<Event> {
    let mut latest: BTreeMap<(PublicKey, EventKind), Event> = BTreeMap::new();
    for event in events {
        let replace = latest
            .get(&event.slot())
            .map_or(true, |current| event.supersedes(current));
        if replace {
            latest.insert(event.slot(), event);
        }
    }
    latest.into_values().collect()
}
