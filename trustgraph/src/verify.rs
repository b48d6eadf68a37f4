//! Verification engine.
//!
//! Pure functions over directory state: no I/O, no stored status. Calling
//! [`verify`] again after more follow-lists are merged simply yields the
//! newer answer, and since follow-sets are never removed a Verified or
//! Contradicted identity can never fall back to Unverified.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::directory::ProfileDirectory;
use crate::identity::PublicKey;

/// Verification outcome for one identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerificationStatus {
    /// No follow-list fetched yet
    Unverified,
    /// Follow-list contains every required identity
    Verified,
    /// Follow-list is present but lacks these required identities
    Contradicted { missing: BTreeSet<PublicKey> },
}

impl VerificationStatus {
    pub fn is_verified(&self) -> bool {
        matches!(self, VerificationStatus::Verified)
    }

    pub fn is_contradicted(&self) -> bool {
        matches!(self, VerificationStatus::Contradicted { .. })
    }

    /// Classify a follow-set against a requirement.
    pub fn classify(follows: Option<&BTreeSet<PublicKey>>, required: &BTreeSet<PublicKey>) -> Self {
        match follows {
            None => VerificationStatus::Unverified,
            Some(follows) => {
                let missing: BTreeSet<PublicKey> = required.difference(follows).copied().collect();
                if missing.is_empty() {
                    VerificationStatus::Verified
                } else {
                    VerificationStatus::Contradicted { missing }
                }
            }
        }
    }
}

/// Identities each candidate must follow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredFollowees {
    required: HashMap<PublicKey, BTreeSet<PublicKey>>,
}

impl RequiredFollowees {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requirements for a claimed source -> intermediary -> target chain.
    ///
    /// The source must follow the target and every intermediary credited to
    /// it; each intermediary must follow the target. Every link is checked
    /// from its own outbound follow-list.
    pub fn for_chain(source: PublicKey, target: PublicKey, intermediaries: &[PublicKey]) -> Self {
        let mut required = Self::new();

        let mut source_set = BTreeSet::from([target]);
        source_set.extend(intermediaries.iter().copied());
        required.insert(source, source_set);

        for intermediary in intermediaries {
            required.require(*intermediary, target);
        }
        required
    }

    /// Replace the requirement for `identity`.
    pub fn insert(&mut self, identity: PublicKey, followees: BTreeSet<PublicKey>) {
        self.required.insert(identity, followees);
    }

    /// Add one followee to `identity`'s requirement.
    pub fn require(&mut self, identity: PublicKey, followee: PublicKey) {
        self.required.entry(identity).or_default().insert(followee);
    }

    /// Requirement for `identity`; empty if none was set.
    pub fn get(&self, identity: &PublicKey) -> Option<&BTreeSet<PublicKey>> {
        self.required.get(identity)
    }
}

/// Per-candidate statuses in candidate order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    entries: Vec<(PublicKey, VerificationStatus)>,
}

impl VerificationReport {
    /// Status of `identity`, if it was a candidate.
    pub fn status(&self, identity: &PublicKey) -> Option<&VerificationStatus> {
        self.entries
            .iter()
            .find(|(id, _)| id == identity)
            .map(|(_, status)| status)
    }

    pub fn entries(&self) -> &[(PublicKey, VerificationStatus)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when every candidate is Verified (vacuously true when empty).
    pub fn is_fully_verified(&self) -> bool {
        self.entries.iter().all(|(_, s)| s.is_verified())
    }

    pub fn has_contradictions(&self) -> bool {
        self.entries.iter().any(|(_, s)| s.is_contradicted())
    }

    pub fn verified_count(&self) -> usize {
        self.count(VerificationStatus::is_verified)
    }

    pub fn contradicted_count(&self) -> usize {
        self.count(VerificationStatus::is_contradicted)
    }

    pub fn unverified_count(&self) -> usize {
        self.count(|s| matches!(s, VerificationStatus::Unverified))
    }

    fn count(&self, pred: impl Fn(&VerificationStatus) -> bool) -> usize {
        self.entries.iter().filter(|(_, s)| pred(s)).count()
    }
}

/// Classify each candidate against its requirement.
///
/// Candidates repeated in the input are reported once, at first position.
pub fn verify(
    directory: &ProfileDirectory,
    candidates: &[PublicKey],
    required: &RequiredFollowees,
) -> VerificationReport {
    let empty = BTreeSet::new();
    let mut seen = BTreeSet::new();
    let entries = candidates
        .iter()
        .filter(|c| seen.insert(**c))
        .map(|candidate| {
            let requirement = required.get(candidate).unwrap_or(&empty);
            let status = VerificationStatus::classify(directory.follows(candidate), requirement);
            (*candidate, status)
        })
        .collect();

    VerificationReport { entries }
}
