//! Write-once store for the derived artifacts of an article.

use std::collections::HashMap;
use std::fmt;

/// The artifacts an article computes lazily.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKey {
    /// Inner markup of `<body>` right after sanitization.
    BodySnapshot,
    Content,
    Title,
    TextBody,
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BodySnapshot => "body_snapshot",
            Self::Content => "content",
            Self::Title => "title",
            Self::TextBody => "text_body",
        };
        f.write_str(name)
    }
}

/// What the cache knows about one artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState<'a> {
    NotComputed,
    Computed(&'a str),
    /// Computed, and the computation found nothing.
    ComputedEmpty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    Value(String),
    Empty,
}

/// Maps each [`ArtifactKey`] to at most one result.
///
/// The first write for a key wins; later writes are ignored and reported.
#[derive(Debug, Default)]
pub struct ArtifactCache {
    entries: HashMap<ArtifactKey, Entry>,
}

impl ArtifactCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: ArtifactKey) -> CacheState<'_> {
        match self.entries.get(&key) {
            None => CacheState::NotComputed,
            Some(Entry::Value(value)) => CacheState::Computed(value),
            Some(Entry::Empty) => CacheState::ComputedEmpty,
        }
    }

    /// Stores a value. Returns `false` if the key was already computed.
    pub fn store(&mut self, key: ArtifactKey, value: String) -> bool {
        self.insert(key, Entry::Value(value))
    }

    /// Records that the computation for `key` produced nothing.
    /// Returns `false` if the key was already computed.
    pub fn store_empty(&mut self, key: ArtifactKey) -> bool {
        self.insert(key, Entry::Empty)
    }

    pub fn is_computed(&self, key: ArtifactKey) -> bool {
        self.entries.contains_key(&key)
    }

    fn insert(&mut self, key: ArtifactKey, entry: Entry) -> bool {
        if self.entries.contains_key(&key) {
            tracing::debug!(artifact = %key, "ignoring second write to computed artifact");
            return false;
        }
        self.entries.insert(key, entry);
        true
    }
}
