//! Shared fixtures for integration tests

#![allow(dead_code)]

use serde_json::{Map, Value};
use trustgraph::{Event, EventKind, PublicKey};

pub fn key(n: u8) -> PublicKey {
    PublicKey::from_bytes([n; 32])
}

pub fn metadata(author: PublicKey, created_at: u64, name: &str) -> Event {
    Event {
        id: format!("{:064x}", created_at),
        pubkey: author,
        created_at,
        kind: EventKind::Metadata,
        tags: Vec::new(),
        content: serde_json::json!({ "name": name }).to_string(),
        sig: String::new(),
    }
}

pub fn follow_list(author: PublicKey, created_at: u64, follows: &[PublicKey]) -> Event {
    Event {
        id: format!("{:064x}", created_at),
        pubkey: author,
        created_at,
        kind: EventKind::FollowList,
        tags: follows
            .iter()
            .map(|k| vec!["p".to_string(), k.to_hex()])
            .collect(),
        content: String::new(),
        sig: String::new(),
    }
}

/// Ranking API body keyed by npub, in the given order.
pub fn ranking_body(keys: &[PublicKey]) -> Value {
    let mut body = Map::new();
    for (rank, k) in keys.iter().enumerate() {
        body.insert(k.to_npub(), serde_json::json!({ "rank": rank, "score": 0.5 }));
    }
    Value::Object(body)
}

/// Path the ranking API is called on.
pub fn claim_path(source: &PublicKey, target: &PublicKey) -> String {
    format!("/api/fwf/{}/{}", source.to_npub(), target.to_npub())
}
