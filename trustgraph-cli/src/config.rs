//! Command-line arguments and environment handling using clap.
//!
//! Settings resolve in order: built-in defaults, then the TOML config file
//! if one is given, then flags and environment variables.

use std::path::PathBuf;

use clap::Parser;
use trustgraph::{PublicKey, TrustgraphConfig};

/// Verify which of source's follows follow target, sorted by PageRank
#[derive(Parser, Debug, Clone)]
#[command(name = "trustgraph")]
#[command(about = "Check a trustgraph follow path against Nostr relays")]
pub struct Args {
    /// Source identity (npub or hex)
    pub source: String,

    /// Target identity (npub or hex)
    pub target: String,

    /// Return every intermediary instead of the top five
    #[arg(long)]
    pub all: bool,

    /// Skip pulling follow-lists from relays (show the unverified claim)
    #[arg(long)]
    pub no_verify: bool,

    /// Comma-separated list of relays
    #[arg(long, env = "TRUSTGRAPH_RELAYS")]
    pub relays: Option<String>,

    /// Ranking API base URL
    #[arg(long, env = "TRUSTGRAPH_API")]
    pub api: Option<String>,

    /// Per-relay timeout in seconds
    #[arg(long, env = "TRUSTGRAPH_RELAY_TIMEOUT")]
    pub relay_timeout: Option<u64>,

    /// Path to a TOML configuration file
    #[arg(short, long, env = "TRUSTGRAPH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    pub log_level: String,
}

impl Args {
    /// Merge file configuration with command-line overrides.
    pub fn resolve_config(&self) -> anyhow::Result<TrustgraphConfig> {
        let mut config = match &self.config {
            Some(path) => TrustgraphConfig::load(path)?,
            None => TrustgraphConfig::default(),
        };

        if let Some(relays) = &self.relays {
            config.set_relays_from_list(relays);
        }
        if let Some(api) = &self.api {
            config.ranking_endpoint = api.clone();
        }
        if let Some(timeout) = self.relay_timeout {
            config.relay_timeout_secs = timeout;
        }

        config.validate()?;
        Ok(config)
    }

    /// Decode the two identities.
    pub fn identities(&self) -> Result<(PublicKey, PublicKey), trustgraph::DecodeError> {
        Ok((PublicKey::parse(&self.source)?, PublicKey::parse(&self.target)?))
    }
}
