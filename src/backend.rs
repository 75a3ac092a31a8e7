//! The optional backend hook consulted for descriptors the evaluator
//! cannot compute from the entry alone (`hasSubordinates`).

use crate::model::Entry;

/// Backend-provided facts about an entry that aren't stored as ordinary
/// attributes. The only one this crate's evaluator consults is whether
/// an entry has subordinates — per `spec.md`'s design note, this is a
/// presence check only ("backend hook present ⇒ TRUE"), not a live
/// computation of child existence.
pub trait BackendHook: Send + Sync {
    /// Whether `entry` has at least one subordinate (child) entry.
    /// Returning `None` means the backend cannot answer (the evaluator
    /// treats this the same as no backend hook being installed at all).
    fn has_subordinates(&self, entry: &Entry) -> Option<bool>;
}

/// A test double that answers from a fixed set of DNs known to have
/// subordinates, for scenarios and unit tests that need a concrete
/// backend without a real directory behind it.
pub struct StaticBackendHook {
    dns_with_subordinates: Vec<String>,
}

impl StaticBackendHook {
    pub fn new(dns_with_subordinates: Vec<String>) -> Self {
        Self {
            dns_with_subordinates: dns_with_subordinates
                .into_iter()
                .map(|d| d.to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn none() -> Self {
        Self {
            dns_with_subordinates: Vec::new(),
        }
    }
}

impl BackendHook for StaticBackendHook {
    fn has_subordinates(&self, entry: &Entry) -> Option<bool> {
        Some(self.dns_with_subordinates.contains(&entry.dn_normalized))
    }
}
