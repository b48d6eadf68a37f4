//! One source/target check from claim to verified result.
//!
//! ```text
//! calculate()     ranking API ──▶ claim ──▶ relays (kind 0) ──▶ directory
//! verify_follows()                          relays (kind 3) ──▶ directory
//! report()        directory + chain requirements ──▶ VerificationReport
//! ```
//!
//! The session owns its directory outright; every mutation goes through
//! `&mut self`, so there is exactly one writer. Each `calculate` starts from
//! an empty directory, so nothing learned about an earlier pair leaks into
//! the next report.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::claim::{ClaimFetcher, ClaimResult};
use crate::config::TrustgraphConfig;
use crate::directory::ProfileDirectory;
use crate::error::{Error, Result};
use crate::event::Filter;
use crate::identity::PublicKey;
use crate::relay::{RelayPool, WebSocketTransport};
use crate::verify::{verify, RequiredFollowees, VerificationReport, VerificationStatus};

/// Claim under examination.
#[derive(Debug, Clone)]
struct PathQuery {
    source: PublicKey,
    target: PublicKey,
    claim: ClaimResult,
}

/// Drives the claim / metadata / follow-list / verify sequence.
pub struct TrustPathSession {
    relays: RelayPool,
    fetcher: ClaimFetcher,
    directory: ProfileDirectory,
    query: Option<PathQuery>,
    follows_fetched: bool,
}

impl TrustPathSession {
    pub fn new(relays: RelayPool, fetcher: ClaimFetcher) -> Self {
        Self {
            relays,
            fetcher,
            directory: ProfileDirectory::new(),
            query: None,
            follows_fetched: false,
        }
    }

    /// Build a session talking to real relays over WebSocket.
    pub fn from_config(config: &TrustgraphConfig) -> Result<Self> {
        config.validate()?;
        let relays = RelayPool::new(config.relays.clone(), Arc::new(WebSocketTransport::new()))
            .with_timeout(config.relay_timeout());
        let fetcher = ClaimFetcher::with_timeout(&config.ranking_endpoint, config.api_timeout())?;
        Ok(Self::new(relays, fetcher))
    }

    pub fn directory(&self) -> &ProfileDirectory {
        &self.directory
    }

    /// The fetched claim, if any.
    pub fn claim(&self) -> Option<&ClaimResult> {
        self.query.as_ref().map(|q| &q.claim)
    }

    pub fn follows_fetched(&self) -> bool {
        self.follows_fetched
    }

    /// Fetch the claim for `source`/`target` and the profiles of everyone
    /// involved.
    pub async fn calculate(
        &mut self,
        source: PublicKey,
        target: PublicKey,
        include_all: bool,
    ) -> Result<&ClaimResult> {
        let claim = self.fetcher.fetch_claim(&source, &target, include_all).await?;

        self.query = None;
        self.follows_fetched = false;
        self.directory = ProfileDirectory::new();

        let authors = [source, target]
            .into_iter()
            .chain(claim.intermediaries().iter().copied());
        let events = self.relays.query(&Filter::metadata(authors)).await?;
        let applied = self.directory.merge(&events);
        info!(events = events.len(), applied, "Merged profile metadata");

        let query = self.query.insert(PathQuery {
            source,
            target,
            claim,
        });
        Ok(&query.claim)
    }

    /// Pull follow-lists for the source and every intermediary.
    pub async fn verify_follows(&mut self) -> Result<VerificationReport> {
        let query = self.query.as_ref().ok_or(Error::NoClaim)?;
        let events = self
            .relays
            .query(&Filter::follow_lists(candidates(query)))
            .await?;
        let applied = self.directory.merge(&events);
        info!(events = events.len(), applied, "Merged follow lists");

        self.follows_fetched = true;
        self.report()
    }

    /// Current verification status, recomputed from the directory.
    pub fn report(&self) -> Result<VerificationReport> {
        let query = self.query.as_ref().ok_or(Error::NoClaim)?;
        let required =
            RequiredFollowees::for_chain(query.source, query.target, query.claim.intermediaries());
        Ok(verify(&self.directory, &candidates(query), &required))
    }

    /// Presentation-ready rows for the current claim.
    pub fn summary(&self) -> Result<PathSummary> {
        let query = self.query.as_ref().ok_or(Error::NoClaim)?;
        let report = self.report()?;

        let row = |identity: &PublicKey| {
            ProfileRow::build(identity, &self.directory, report.status(identity).cloned())
        };

        Ok(PathSummary {
            source: row(&query.source),
            target: row(&query.target),
            intermediaries: query.claim.intermediaries().iter().map(row).collect(),
            direct_follow: query.claim.direct_follow(),
            follows_fetched: self.follows_fetched,
            fully_verified: self.follows_fetched && report.is_fully_verified(),
        })
    }
}

/// Source first, then intermediaries in rank order.
fn candidates(query: &PathQuery) -> Vec<PublicKey> {
    std::iter::once(query.source)
        .chain(query.claim.intermediaries().iter().copied())
        .collect()
}

/// One identity as it should be shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileRow {
    pub pubkey: PublicKey,
    pub npub: String,
    pub display_name: Option<String>,
    pub nip05: Option<String>,
    pub avatar_url: Option<String>,
    /// Size of the fetched follow-list
    pub following: Option<usize>,
    /// `None` for identities that are not checked (the target)
    pub status: Option<VerificationStatus>,
}

impl ProfileRow {
    fn build(
        identity: &PublicKey,
        directory: &ProfileDirectory,
        status: Option<VerificationStatus>,
    ) -> Self {
        let record = directory.get(identity);
        Self {
            pubkey: *identity,
            npub: identity.to_npub(),
            display_name: record.and_then(|r| r.display_name()).map(str::to_string),
            nip05: record.and_then(|r| r.nip05()).map(str::to_string),
            avatar_url: record.and_then(|r| r.avatar_url()).map(str::to_string),
            following: record.and_then(|r| r.follows()).map(|f| f.len()),
            status,
        }
    }

    /// Display name, else a shortened npub.
    pub fn label(&self) -> String {
        self.display_name
            .clone()
            .unwrap_or_else(|| self.pubkey.short_npub())
    }

    /// NIP-05 identifier, else a shortened npub.
    pub fn handle(&self) -> String {
        self.nip05.clone().unwrap_or_else(|| self.pubkey.short_npub())
    }
}

/// Whole result for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathSummary {
    pub source: ProfileRow,
    pub target: ProfileRow,
    pub intermediaries: Vec<ProfileRow>,
    pub direct_follow: bool,
    pub follows_fetched: bool,
    pub fully_verified: bool,
}
