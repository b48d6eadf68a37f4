//! Client configuration

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::claim::DEFAULT_RANKING_ENDPOINT;

/// Configuration loading error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustgraphConfig {
    /// Relay WebSocket URLs to verify against
    #[serde(default = "default_relays")]
    pub relays: Vec<String>,

    /// Ranking API base URL
    #[serde(default = "default_ranking_endpoint")]
    pub ranking_endpoint: String,

    /// Per-relay timeout in seconds
    #[serde(default = "default_relay_timeout")]
    pub relay_timeout_secs: u64,

    /// Ranking API timeout in seconds
    #[serde(default = "default_api_timeout")]
    pub api_timeout_secs: u64,
}

fn default_relays() -> Vec<String> {
    vec![
        "wss://relay.damus.io".to_string(),
        "wss://relay.nostr.band".to_string(),
    ]
}
fn default_ranking_endpoint() -> String { DEFAULT_RANKING_ENDPOINT.to_string() }
fn default_relay_timeout() -> u64 { 10 }
fn default_api_timeout() -> u64 { 30 }

impl Default for TrustgraphConfig {
    fn default() -> Self {
        Self {
            relays: default_relays(),
            ranking_endpoint: default_ranking_endpoint(),
            relay_timeout_secs: default_relay_timeout(),
            api_timeout_secs: default_api_timeout(),
        }
    }
}

impl TrustgraphConfig {
    /// Parse a TOML document; missing fields take defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Replace the relay list from a comma-separated string.
    pub fn set_relays_from_list(&mut self, list: &str) {
        self.relays = parse_relay_list(list);
    }

    pub fn relay_timeout(&self) -> Duration {
        Duration::from_secs(self.relay_timeout_secs)
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.relays.is_empty() {
            return Err(ConfigError::Invalid("at least one relay is required".into()));
        }
        for relay in &self.relays {
            crate::relay::websocket::validate_relay_url(relay)
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        if self.ranking_endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("ranking endpoint is empty".into()));
        }
        if self.relay_timeout_secs == 0 || self.api_timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be non-zero".into()));
        }
        Ok(())
    }
}

/// Split a comma-separated relay list, trimming blanks.
pub fn parse_relay_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrustgraphConfig::default();
        assert_eq!(config.relays.len(), 2);
        assert_eq!(config.ranking_endpoint, DEFAULT_RANKING_ENDPOINT);
        assert_eq!(config.relay_timeout(), Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        assert_eq!(
            TrustgraphConfig::from_toml("").unwrap(),
            TrustgraphConfig::default()
        );
    }

    #[test]
    fn test_partial_toml() {
        let config = TrustgraphConfig::from_toml(
            r#"
relays = ["wss://nos.lol"]
relay_timeout_secs = 3
"#,
        )
        .unwrap();
        assert_eq!(config.relays, vec!["wss://nos.lol".to_string()]);
        assert_eq!(config.relay_timeout_secs, 3);
        assert_eq!(config.api_timeout_secs, 30);
    }

    #[test]
    fn test_invalid_relay_rejected() {
        assert!(matches!(
            TrustgraphConfig::from_toml(r#"relays = ["https://not-a-relay"]"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            TrustgraphConfig::from_toml("relays = []"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"relays = ["wss://nos.lol", "wss://relay.primal.net"]
api_timeout_secs = 5"#
        )
        .unwrap();

        let config = TrustgraphConfig::load(file.path()).unwrap();
        assert_eq!(config.relays, vec!["wss://nos.lol", "wss://relay.primal.net"]);
        assert_eq!(config.api_timeout(), Duration::from_secs(5));
        assert_eq!(config.ranking_endpoint, DEFAULT_RANKING_ENDPOINT);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        match TrustgraphConfig::load(&path) {
            Err(ConfigError::Read { path: reported, .. }) => {
                assert_eq!(reported, path.display().to_string());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_relay_list() {
        assert_eq!(
            parse_relay_list("wss://relay.damus.io, wss://relay.nostr.band ,,"),
            vec!["wss://relay.damus.io", "wss://relay.nostr.band"]
        );
        assert!(parse_relay_list(" , ").is_empty());
    }
}
