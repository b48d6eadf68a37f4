//! Nostr event and filter wire types (NIP-01).

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::identity::PublicKey;

/// Event kinds this crate understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "u16", into = "u16")]
pub enum EventKind {
    /// Profile metadata (kind 0)
    Metadata,
    /// Contact/follow list (kind 3)
    FollowList,
    /// Anything else, carried through untouched
    Other(u16),
}

impl EventKind {
    /// Numeric kind on the wire.
    pub fn as_u16(self) -> u16 {
        match self {
            EventKind::Metadata => 0,
            EventKind::FollowList => 3,
            EventKind::Other(k) => k,
        }
    }
}

impl From<u16> for EventKind {
    fn from(kind: u16) -> Self {
        match kind {
            0 => EventKind::Metadata,
            3 => EventKind::FollowList,
            k => EventKind::Other(k),
        }
    }
}

impl From<EventKind> for u16 {
    fn from(kind: EventKind) -> Self {
        kind.as_u16()
    }
}

/// A relay-delivered event.
///
/// Signatures are carried but never checked; trust comes from cross-relay
/// consistency and the follow-list check itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event id (hex)
    pub id: String,
    /// Author
    pub pubkey: PublicKey,
    /// Unix timestamp (seconds)
    pub created_at: u64,
    /// Event kind
    pub kind: EventKind,
    /// Tags, each an array of strings
    #[serde(default)]
    pub tags: Vec<Vec<String>>,
    /// Raw content
    #[serde(default)]
    pub content: String,
    /// Schnorr signature (hex), unchecked
    #[serde(default)]
    pub sig: String,
}

impl Event {
    /// Grouping key used for deduplication.
    pub fn slot(&self) -> (PublicKey, EventKind) {
        (self.pubkey, self.kind)
    }

    /// Whether this event should replace `other` for the same slot.
    ///
    /// Newest `created_at` wins; ties go to the greater event id so the
    /// choice is stable no matter which relay answered first.
    pub fn supersedes(&self, other: &Event) -> bool {
        self.precedence(other) == Ordering::Greater
    }

    fn precedence(&self, other: &Event) -> Ordering {
        self.created_at
            .cmp(&other.created_at)
            .then_with(|| self.id.cmp(&other.id))
    }

    /// Keys referenced by `p` tags, skipping malformed entries.
    pub fn tagged_pubkeys(&self) -> BTreeSet<PublicKey> {
        self.tags
            .iter()
            .filter(|tag| tag.first().map(String::as_str) == Some("p"))
            .filter_map(|tag| tag.get(1))
            .filter_map(|value| PublicKey::from_hex(value).ok())
            .collect()
    }
}

/// Subscription filter sent in a `REQ`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// Kinds to match
    pub kinds: BTreeSet<EventKind>,
    /// Authors to match
    pub authors: BTreeSet<PublicKey>,
}

impl Filter {
    /// Filter for one kind across several authors.
    pub fn new(kind: EventKind, authors: impl IntoIterator<Item = PublicKey>) -> Self {
        Self {
            kinds: BTreeSet::from([kind]),
            authors: authors.into_iter().collect(),
        }
    }

    /// Profile metadata for the given authors.
    pub fn metadata(authors: impl IntoIterator<Item = PublicKey>) -> Self {
        Self::new(EventKind::Metadata, authors)
    }

    /// Follow lists for the given authors.
    pub fn follow_lists(authors: impl IntoIterator<Item = PublicKey>) -> Self {
        Self::new(EventKind::FollowList, authors)
    }

    /// A filter must name at least one kind and one author.
    pub fn is_bounded(&self) -> bool {
        !self.kinds.is_empty() && !self.authors.is_empty()
    }

    /// Whether an event satisfies this filter.
    pub fn matches(&self, event: &Event) -> bool {
        self.kinds.contains(&event.kind) && self.authors.contains(&event.pubkey)
    }
}
