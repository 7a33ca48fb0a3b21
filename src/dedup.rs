//! Per-call uniqueness of emitted records

use std::collections::HashSet;

use crate::markup;

/// Remembers which normalized keys one pipeline call has already emitted.
///
/// First-seen wins: a later candidate with the same key is dropped, never
/// merged into the earlier record. Matching is exact on the normalized key;
/// near-duplicate spellings stay distinct.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key; true if it had not been seen before
    pub fn add(&mut self, key: &str) -> bool {
        self.seen.insert(key.to_string())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.seen.contains(key)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Dedup key for names and questions: whitespace-collapsed, case-folded
pub fn name_key(name: &str) -> String {
    markup::collapse_whitespace(name).to_lowercase()
}

/// Dedup key for resolved URLs: fragment and trailing slash removed
pub fn url_key(url: &str) -> String {
    let without_fragment = url.split('#').next().unwrap_or(url);
    without_fragment.trim_end_matches('/').to_string()
}
