//! Ranking API client.
//!
//! The trustgraph "follows who follow" endpoint answers
//! `GET <endpoint>/<source>/<target>[?all=true]` with a JSON object keyed by
//! `npub`, ordered by rank. Values are opaque scoring data and are not
//! decoded. The service is untrusted: its answer is a claim to be checked
//! against relays, never a result in itself.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::identity::PublicKey;

/// Public trustgraph API endpoint.
pub const DEFAULT_RANKING_ENDPOINT: &str = "https://trustgraph.live/api/fwf";

/// Default timeout for ranking API calls
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from the ranking API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClaimError {
    /// The service rejected the request; the message is the service's own
    #[error("{0}")]
    InvalidRequest(String),

    /// The service could not be reached or answered with a server error
    #[error("Ranking service unreachable: {0}")]
    Unreachable(String),

    /// The service answered 2xx with a body we cannot interpret
    #[error("Malformed ranking response: {0}")]
    Malformed(String),
}

/// The service's claim about a source/target pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimResult {
    intermediaries: Vec<PublicKey>,
    direct_follow: bool,
}

impl ClaimResult {
    /// Interpret a decoded response body.
    ///
    /// Keys equal to `source` or `target` are not intermediaries; a `source`
    /// key is the service's way of saying source follows target directly.
    pub fn from_response(
        source: &PublicKey,
        target: &PublicKey,
        body: &Map<String, Value>,
    ) -> Result<Self, ClaimError> {
        let mut intermediaries = Vec::with_capacity(body.len());
        let mut direct_follow = false;

        for key in body.keys() {
            let identity = PublicKey::parse(key)
                .map_err(|e| ClaimError::Malformed(format!("key {key:?}: {e}")))?;
            if identity == *source {
                direct_follow = true;
            } else if identity != *target && !intermediaries.contains(&identity) {
                intermediaries.push(identity);
            }
        }

        Ok(Self {
            intermediaries,
            direct_follow,
        })
    }

    /// Claimed intermediaries in rank order.
    pub fn intermediaries(&self) -> &[PublicKey] {
        &self.intermediaries
    }

    /// Whether the service claims source follows target directly.
    pub fn direct_follow(&self) -> bool {
        self.direct_follow
    }

    pub fn is_empty(&self) -> bool {
        self.intermediaries.is_empty()
    }
}

impl IntoIterator for ClaimResult {
    type Item = PublicKey;
    type IntoIter = std::vec::IntoIter<PublicKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.intermediaries.into_iter()
    }
}

/// HTTP client for the ranking API.
#[derive(Clone)]
pub struct ClaimFetcher {
    client: Client,
    endpoint: String,
}

impl ClaimFetcher {
    /// Create a fetcher for the given endpoint.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, ClaimError> {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    /// Create a fetcher with a request timeout.
    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ClaimError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClaimError::Unreachable(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn claim_url(&self, source: &PublicKey, target: &PublicKey, include_all: bool) -> String {
        let mut url = format!("{}/{}/{}", self.endpoint, source.to_npub(), target.to_npub());
        if include_all {
            url.push_str("?all=true");
        }
        url
    }

    /// Ask the service which of `source`'s follows follow `target`.
    ///
    /// With `include_all` unset the service returns its top five.
    pub async fn fetch_claim(
        &self,
        source: &PublicKey,
        target: &PublicKey,
        include_all: bool,
    ) -> Result<ClaimResult, ClaimError> {
        let url = self.claim_url(source, target, include_all);
        debug!(%url, "Requesting claim");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ClaimError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST {
            let message = response
                .text()
                .await
                .map_err(|e| ClaimError::Unreachable(e.to_string()))?;
            return Err(ClaimError::InvalidRequest(message));
        }
        if !status.is_success() {
            return Err(ClaimError::Unreachable(format!("HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ClaimError::Unreachable(e.to_string()))?;
        let body: Map<String, Value> =
            serde_json::from_str(&body).map_err(|e| ClaimError::Malformed(e.to_string()))?;

        let claim = ClaimResult::from_response(source, target, &body)?;
        info!(
            intermediaries = claim.intermediaries.len(),
            direct_follow = claim.direct_follow,
            include_all,
            "Received claim"
        );
        Ok(claim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::fixtures::key;

    fn body(keys: &[PublicKey]) -> Map<String, Value> {
        keys.iter()
            .enumerate()
            .map(|(i, k)| (k.to_npub(), serde_json::json!({ "rank": i })))
            .collect()
    }

    #[test]
    fn test_direct_follow_detection() {
        let (s, t, x) = (key(1), key(2), key(3));
        let claim = ClaimResult::from_response(&s, &t, &body(&[s, x])).unwrap();
        assert!(claim.direct_follow());
        assert_eq!(claim.intermediaries(), &[x]);
    }

    #[test]
    fn test_source_and_target_are_not_intermediaries() {
        let (s, t) = (key(1), key(2));
        let claim = ClaimResult::from_response(&s, &t, &body(&[t, key(3), key(4)])).unwrap();
        assert!(!claim.direct_follow());
        assert_eq!(claim.intermediaries(), &[key(3), key(4)]);
    }

    #[test]
    fn test_rank_order_preserved() {
        let order = [key(9), key(3), key(7), key(5)];
        let claim = ClaimResult::from_response(&key(1), &key(2), &body(&order)).unwrap();
        assert_eq!(claim.into_iter().collect::<Vec<_>>(), order.to_vec());
    }

    #[test]
    fn test_empty_response_is_not_an_error() {
        let claim = ClaimResult::from_response(&key(1), &key(2), &Map::new()).unwrap();
        assert!(claim.is_empty());
        assert!(!claim.direct_follow());
    }

    #[test]
    fn test_hex_keys_accepted() {
        let mut map = Map::new();
        map.insert(key(3).to_hex(), Value::Null);
        let claim = ClaimResult::from_response(&key(1), &key(2), &map).unwrap();
        assert_eq!(claim.intermediaries(), &[key(3)]);
    }

    #[test]
    fn test_bad_key_is_malformed() {
        let mut map = Map::new();
        map.insert("npub1garbage".to_string(), Value::Null);
        assert!(matches!(
            ClaimResult::from_response(&key(1), &key(2), &map),
            Err(ClaimError::Malformed(_))
        ));
    }

    #[test]
    fn test_claim_url() {
        let fetcher = ClaimFetcher::new("https://example.com/api/fwf/").unwrap();
        let url = fetcher.claim_url(&key(1), &key(2), false);
        assert_eq!(
            url,
            format!("https://example.com/api/fwf/{}/{}", key(1).to_npub(), key(2).to_npub())
        );
        assert!(fetcher.claim_url(&key(1), &key(2), true).ends_with("?all=true"));
    }
}
