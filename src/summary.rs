//! Set of WebP subtypes seen by this filter instance

use crate::webp::Subtype;

#[derive(Debug, Clone, Default)]
pub struct SubtypeSummary {
    /// In first-seen order
    seen: Vec<Subtype>,
}

impl SubtypeSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a subtype, returning true if it had not been seen before
    ///
    /// Only the three WebP variants are tracked.
    pub fn record(&mut self, subtype: Subtype) -> bool {
        if !subtype.is_webp() || self.seen.contains(&subtype) {
            return false;
        }
        self.seen.push(subtype);
        true
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.seen.iter().map(|s| s.label()).collect()
    }

    /// e.g. "lossy, extended"
    pub fn describe(&self) -> String {
        self.labels().join(", ")
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
