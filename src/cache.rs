//! Result Cache Module
//!
//! Remembers the classification of each resource so repeated responses
//! skip inspection. In Wasm the cache is scoped to the Envoy worker VM.

use std::collections::HashMap;

use crate::webp::{ClassificationResult, Subtype};

/// Per-resource classification cache
pub struct ResultCache {
    entries: HashMap<String, ClassificationResult>,
    /// Flush threshold
    max_entries: usize,
}

impl ResultCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            max_entries,
        }
    }

    /// Store a result unless the resource is already known
    ///
    /// Returns false if an entry existed. The whole cache is flushed once
    /// it has grown past `max_entries`.
    pub fn insert(&mut self, resource: &str, result: ClassificationResult) -> bool {
        if self.entries.contains_key(resource) {
            return false;
        }
        if self.entries.len() > self.max_entries {
            self.entries.clear();
        }
        self.entries.insert(resource.to_string(), result);
        true
    }

    /// Store a result emitted by a stream, if it is worth remembering
    ///
    /// Results still `Unknown` (bodiless or truncated responses) are
    /// skipped so they cannot pin a resource.
    pub fn record(&mut self, resource: &str, result: ClassificationResult) -> bool {
        if !is_cacheable(&result) {
            return false;
        }
        self.insert(resource, result)
    }

    pub fn get(&self, resource: &str) -> Option<ClassificationResult> {
        self.entries.get(resource).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Change the flush threshold, e.g. after reconfiguration
    pub fn set_max_entries(&mut self, max_entries: usize) {
        self.max_entries = max_entries;
    }
}

/// Whether a stream's result may be cached
pub fn is_cacheable(result: &ClassificationResult) -> bool {
    result.subtype != Subtype::Unknown
}
