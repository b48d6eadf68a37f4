//! Crate-level error type

use thiserror::Error;

use crate::claim::ClaimError;
use crate::config::ConfigError;
use crate::identity::DecodeError;
use crate::relay::RelayQueryError;

/// Result type for trustgraph operations
pub type Result<T> = std::result::Result<T, Error>;

/// Short machine-readable tag for an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidRequest,
    Unreachable,
    MalformedResponse,
    RelayQuery,
    Decode,
    Config,
    NoClaim,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::Unreachable => "unreachable",
            ErrorKind::MalformedResponse => "malformed_response",
            ErrorKind::RelayQuery => "relay_query",
            ErrorKind::Decode => "decode",
            ErrorKind::Config => "config",
            ErrorKind::NoClaim => "no_claim",
        }
    }
}

/// Any error that ends an in-progress request.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Claim(#[from] ClaimError),

    #[error(transparent)]
    Relay(#[from] RelayQueryError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Verification was requested before a claim was fetched
    #[error("No claim has been fetched yet")]
    NoClaim,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Claim(ClaimError::InvalidRequest(_)) => ErrorKind::InvalidRequest,
            Error::Claim(ClaimError::Unreachable(_)) => ErrorKind::Unreachable,
            Error::Claim(ClaimError::Malformed(_)) => ErrorKind::MalformedResponse,
            Error::Relay(_) => ErrorKind::RelayQuery,
            Error::Decode(_) => ErrorKind::Decode,
            Error::Config(_) => ErrorKind::Config,
            Error::NoClaim => ErrorKind::NoClaim,
        }
    }
}
