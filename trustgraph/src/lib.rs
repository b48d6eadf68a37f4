//! Trustgraph - client-side verification of follow paths
//!
//! Answers "does *source* follow someone who follows *target*?" by taking the
//! trustgraph ranking service's answer as an untrusted claim and checking
//! every link of it against follow-lists pulled live from Nostr relays.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            TrustPathSession             │
//! └───────┬──────────────┬──────────────┬───┘
//!         ▼              ▼              ▼
//! ┌──────────────┐ ┌────────────┐ ┌──────────────┐
//! │ ClaimFetcher │ │ RelayPool  │ │   verify()   │
//! │ (ranking API)│ │ (relays)   │ │ (pure check) │
//! └──────────────┘ └─────┬──────┘ └──────▲───────┘
//!                        ▼               │
//!                 ┌────────────────────┐ │
//!                 │  ProfileDirectory  │─┘
//!                 └────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use trustgraph::{PublicKey, TrustPathSession, TrustgraphConfig};
//!
//! # async fn example() -> trustgraph::Result<()> {
//! let mut session = TrustPathSession::from_config(&TrustgraphConfig::default())?;
//! let source = PublicKey::parse("npub1sg6plzptd64u62a878hep2kev88swjh3tw00gjsfl8f237lmu63q0uf63m")?;
//! let target = PublicKey::parse("82341f882b6eabcd2ba7f1ef90aad961cf074af15b9ef44a09f9d2a8fbfbe6a2")?;
//!
//! session.calculate(source, target, false).await?;
//! let report = session.verify_follows().await?;
//! println!("fully verified: {}", report.is_fully_verified());
//! # Ok(())
//! # }
//! ```

pub mod claim;
pub mod config;
pub mod directory;
pub mod error;
pub mod event;
pub mod identity;
pub mod relay;
pub mod session;
pub mod verify;

// Re-export main types for convenience
pub use claim::{ClaimError, ClaimFetcher, ClaimResult, DEFAULT_RANKING_ENDPOINT};
pub use config::{parse_relay_list, ConfigError, TrustgraphConfig};
pub use directory::{ProfileDirectory, ProfileMetadata, ProfileRecord};
pub use error::{Error, ErrorKind, Result};
pub use event::{Event, EventKind, Filter};
pub use identity::{DecodeError, PublicKey};
pub use relay::{
    MockTransport, RelayError, RelayPool, RelayQueryError, RelayTransport, WebSocketTransport,
};
pub use session::{PathSummary, ProfileRow, TrustPathSession};
pub use verify::{verify, RequiredFollowees, VerificationReport, VerificationStatus};
