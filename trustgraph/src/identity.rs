//! Public key identities and their `npub` encoding.
//!
//! A [`PublicKey`] is the 32-byte x-only key that identifies a Nostr
//! participant. Relays and the ranking API speak different dialects: relays
//! use 64-character lower-case hex, the ranking API and humans use bech32
//! with the `npub` prefix (NIP-19). Both forms decode to the same value.

use std::fmt;
use std::str::FromStr;

use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};

/// Human-readable prefix for encoded public keys.
const NPUB_HRP: Hrp = Hrp::parse_unchecked("npub");

/// Length of a public key in bytes.
pub const PUBLIC_KEY_LEN: usize = 32;

/// Errors decoding an identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Not a valid bech32 string
    #[error("Invalid bech32 identifier: {0}")]
    InvalidBech32(String),

    /// Valid bech32 but not an `npub`
    #[error("Expected npub prefix, got {0}")]
    WrongPrefix(String),

    /// Payload is not 32 bytes
    #[error("Invalid key length: expected 32 bytes, got {0}")]
    InvalidLength(usize),

    /// Not valid hex
    #[error("Invalid hex identifier: {0}")]
    InvalidHex(String),
}

/// A participant's public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PublicKey([u8; PUBLIC_KEY_LEN]);

impl PublicKey {
    /// Wrap raw key bytes.
    pub const fn from_bytes(bytes: [u8; PUBLIC_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.0
    }

    /// Decode the canonical 64-character hex form.
    pub fn from_hex(s: &str) -> Result<Self, DecodeError> {
        let bytes = hex::decode(s).map_err(|e| DecodeError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// Canonical lower-case hex form, as relays expect it.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Decode a bech32 `npub1...` identifier.
    pub fn from_npub(s: &str) -> Result<Self, DecodeError> {
        let (hrp, data) =
            bech32::decode(s).map_err(|e| DecodeError::InvalidBech32(e.to_string()))?;
        if hrp.to_lowercase() != NPUB_HRP.to_lowercase() {
            return Err(DecodeError::WrongPrefix(hrp.to_string()));
        }
        Self::from_slice(&data)
    }

    /// Encode as a bech32 `npub1...` identifier.
    pub fn to_npub(&self) -> String {
        // Encoding only fails when the payload exceeds the bech32 length
        // limit, which 32 bytes never does.
        bech32::encode::<Bech32>(NPUB_HRP, &self.0).unwrap_or_else(|_| self.to_hex())
    }

    /// Decode either an `npub` or a hex identifier.
    pub fn parse(s: &str) -> Result<Self, DecodeError> {
        let s = s.trim();
        if s.len() == PUBLIC_KEY_LEN * 2 && s.bytes().all(|b| b.is_ascii_hexdigit()) {
            Self::from_hex(s)
        } else {
            Self::from_npub(s)
        }
    }

    /// Shortened `npub` for display when no profile name is known.
    pub fn short_npub(&self) -> String {
        let npub = self.to_npub();
        format!("{}...", &npub[..14.min(npub.len())])
    }

    fn from_slice(bytes: &[u8]) -> Result<Self, DecodeError> {
        let key: [u8; PUBLIC_KEY_LEN] = bytes
            .try_into()
            .map_err(|_| DecodeError::InvalidLength(bytes.len()))?;
        Ok(Self(key))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl FromStr for PublicKey {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PublicKey {
    type Error = DecodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<PublicKey> for String {
    fn from(key: PublicKey) -> Self {
        key.to_hex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JACK_HEX: &str = "82341f882b6eabcd2ba7f1ef90aad961cf074af15b9ef44a09f9d2a8fbfbe6a2";
    const JACK_NPUB: &str = "npub1sg6plzptd64u62a878hep2kev88swjh3tw00gjsfl8f237lmu63q0uf63m";

    #[test]
    fn test_npub_round_trip() {
        for seed in [0u8, 1, 7, 0x7f, 0xff] {
            let key = PublicKey::from_bytes([seed; PUBLIC_KEY_LEN]);
            let npub = key.to_npub();
            assert!(npub.starts_with("npub1"));
            assert_eq!(PublicKey::from_npub(&npub).unwrap(), key);
        }
    }

    #[test]
    fn test_known_vector() {
        let key = PublicKey::from_hex(JACK_HEX).unwrap();
        assert_eq!(key.to_npub(), JACK_NPUB);
        assert_eq!(PublicKey::from_npub(JACK_NPUB).unwrap(), key);
    }

    #[test]
    fn test_parse_accepts_both_forms() {
        let a = PublicKey::parse(JACK_HEX).unwrap();
        let b = PublicKey::parse(JACK_NPUB).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_hex(), JACK_HEX);
    }

    #[test]
    fn test_wrong_prefix_rejected() {
        let key = PublicKey::from_bytes([3; PUBLIC_KEY_LEN]);
        let nsec = bech32::encode::<Bech32>(Hrp::parse_unchecked("nsec"), key.as_bytes()).unwrap();
        assert!(matches!(
            PublicKey::from_npub(&nsec),
            Err(DecodeError::WrongPrefix(_))
        ));
    }

    #[test]
    fn test_malformed_inputs() {
        assert!(matches!(
            PublicKey::from_npub("npub1notvalid"),
            Err(DecodeError::InvalidBech32(_))
        ));
        assert!(matches!(
            PublicKey::from_hex("abcd"),
            Err(DecodeError::InvalidLength(2))
        ));
        assert!(matches!(
            PublicKey::from_hex("zz"),
            Err(DecodeError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_serde_uses_hex() {
        let key = PublicKey::from_hex(JACK_HEX).unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, format!("\"{}\"", JACK_HEX));
        let back: PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn test_short_npub() {
        let key = PublicKey::from_hex(JACK_HEX).unwrap();
        assert_eq!(key.short_npub(), "npub1sg6plzptd...");
    }
}
