//! In-memory relay transport for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{RelayError, RelayTransport};
use crate::event::{Event, Filter};

enum Canned {
    Events(Vec<Event>),
    Failure(RelayError),
}

/// Mock transport.
///
/// Each endpoint is configured with a fixed set of stored events or a
/// failure. Unknown endpoints fail to connect.
pub struct MockTransport {
    relays: HashMap<String, Canned>,
    delays: HashMap<String, Duration>,
    apply_filter: bool,
    call_count: AtomicU32,
}

impl MockTransport {
    /// Create a transport with no relays.
    pub fn new() -> Self {
        Self {
            relays: HashMap::new(),
            delays: HashMap::new(),
            apply_filter: true,
            call_count: AtomicU32::new(0),
        }
    }

    /// Serve these stored events from `url`.
    pub fn with_events(mut self, url: impl Into<String>, events: Vec<Event>) -> Self {
        self.relays.insert(url.into(), Canned::Events(events));
        self
    }

    /// Make `url` fail with `error`.
    pub fn with_failure(mut self, url: impl Into<String>, error: RelayError) -> Self {
        self.relays.insert(url.into(), Canned::Failure(error));
        self
    }

    /// Delay answers from `url`.
    pub fn with_delay(mut self, url: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(url.into(), delay);
        self
    }

    /// Return every stored event regardless of the filter, like a
    /// misbehaving relay would.
    pub fn unfiltered(mut self) -> Self {
        self.apply_filter = false;
        self
    }

    /// Number of fetches performed.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RelayTransport for MockTransport {
    async fn fetch(&self, url: &str, filter: &Filter) -> Result<Vec<Event>, RelayError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }

        match self.relays.get(url) {
            Some(Canned::Events(events)) => Ok(events
                .iter()
                .filter(|e| !self.apply_filter || filter.matches(e))
                .cloned()
                .collect()),
            Some(Canned::Failure(error)) => Err(error.clone()),
            None => Err(RelayError::Connect(format!("no mock relay at {url}"))),
        }
    }
}
