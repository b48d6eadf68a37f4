//! Profile directory: what relays have told us about each identity.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::event::{Event, EventKind};
use crate::identity::PublicKey;

/// Fields of a kind-0 metadata payload we care about.
///
/// Clients disagree on field names, so several aliases are kept and resolved
/// by priority when read. A field holding anything but a string reads as
/// absent without taking the rest of the payload down with it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileMetadata {
    #[serde(default, rename = "displayName", deserialize_with = "lenient_string")]
    display_name_camel: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    display_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    image: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    picture: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    nip05: Option<String>,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().map(str::to_string))
}

impl ProfileMetadata {
    /// Parse the JSON content of a metadata event.
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Preferred display name: `displayName`, then `display_name`, then `name`.
    pub fn display_name(&self) -> Option<&str> {
        first_present([&self.display_name_camel, &self.display_name, &self.name])
    }

    /// Avatar URL: `image`, then `picture`.
    pub fn avatar_url(&self) -> Option<&str> {
        first_present([&self.image, &self.picture])
    }

    /// NIP-05 verified-domain identifier.
    pub fn nip05(&self) -> Option<&str> {
        first_present([&self.nip05])
    }
}

fn first_present<const N: usize>(fields: [&Option<String>; N]) -> Option<&str> {
    fields
        .into_iter()
        .filter_map(|f| f.as_deref())
        .find(|s| !s.trim().is_empty())
}

/// Everything known about one identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileRecord {
    metadata: ProfileMetadata,
    metadata_event: Option<Event>,
    follows: Option<BTreeSet<PublicKey>>,
    follows_event: Option<Event>,
}

impl ProfileRecord {
    /// Profile metadata (empty if only a follow-list has been seen).
    pub fn metadata(&self) -> &ProfileMetadata {
        &self.metadata
    }

    pub fn display_name(&self) -> Option<&str> {
        self.metadata.display_name()
    }

    pub fn avatar_url(&self) -> Option<&str> {
        self.metadata.avatar_url()
    }

    pub fn nip05(&self) -> Option<&str> {
        self.metadata.nip05()
    }

    /// Follow-set, or `None` if no follow-list has been fetched.
    pub fn follows(&self) -> Option<&BTreeSet<PublicKey>> {
        self.follows.as_ref()
    }

    /// Timestamp of the applied metadata event.
    pub fn metadata_updated_at(&self) -> Option<u64> {
        self.metadata_event.as_ref().map(|e| e.created_at)
    }

    /// Timestamp of the applied follow-list event.
    pub fn follows_updated_at(&self) -> Option<u64> {
        self.follows_event.as_ref().map(|e| e.created_at)
    }

    fn is_newer(current: &Option<Event>, incoming: &Event) -> bool {
        match current {
            Some(current) => incoming.supersedes(current),
            None => true,
        }
    }

    fn apply_metadata(&mut self, event: &Event) -> bool {
        if !Self::is_newer(&self.metadata_event, event) {
            return false;
        }
        match ProfileMetadata::parse(&event.content) {
            Ok(metadata) => {
                self.metadata = metadata;
                self.metadata_event = Some(event.clone());
                true
            }
            Err(e) => {
                warn!(author = %event.pubkey, error = %e, "Ignoring unparseable metadata");
                false
            }
        }
    }

    fn apply_follow_list(&mut self, event: &Event) -> bool {
        if !Self::is_newer(&self.follows_event, event) {
            return false;
        }
        self.follows = Some(event.tagged_pubkeys());
        self.follows_event = Some(event.clone());
        true
    }
}

/// Keyed store of profile records built from relay events.
///
/// Records are created on first sight and never removed. Each field only
/// moves forward in time: an event older than the one already applied for
/// the same (author, kind) is ignored, so merging is idempotent and
/// insensitive to arrival order.
#[derive(Debug, Clone, Default)]
pub struct ProfileDirectory {
    records: HashMap<PublicKey, ProfileRecord>,
}

impl ProfileDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold events into the directory. Returns how many changed a record.
    pub fn merge<'a>(&mut self, events: impl IntoIterator<Item = &'a Event>) -> usize {
        let mut applied = 0;
        for event in events {
            let changed = match event.kind {
                EventKind::Metadata => self.record_mut(event.pubkey).apply_metadata(event),
                EventKind::FollowList => self.record_mut(event.pubkey).apply_follow_list(event),
                EventKind::Other(kind) => {
                    debug!(kind, author = %event.pubkey, "Ignoring event of unhandled kind");
                    false
                }
            };
            if changed {
                applied += 1;
            }
        }
        applied
    }

    /// Record for `identity`, or `None` if never seen.
    pub fn get(&self, identity: &PublicKey) -> Option<&ProfileRecord> {
        self.records.get(identity)
    }

    /// Follow-set for `identity`, if one has been fetched.
    pub fn follows(&self, identity: &PublicKey) -> Option<&BTreeSet<PublicKey>> {
        self.get(identity).and_then(ProfileRecord::follows)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn record_mut(&mut self, identity: PublicKey) -> &mut ProfileRecord {
        self.records.entry(identity).or_default()
    }
}
