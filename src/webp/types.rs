//! Classification result types
//!
//! Every outcome of inspecting a byte stream is a value of these types,
//! including "not enough bytes yet". There is no error channel.

use serde::Serialize;

/// Quality code reported while the estimate is not yet known
pub const QUALITY_INDETERMINATE: i32 = -1;

/// Quality code reported for lossless payloads
pub const QUALITY_NOT_APPLICABLE: i32 = 101;

/// Kind of stream, as far as it can be told from the bytes seen so far
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Subtype {
    /// Fewer than 16 bytes seen, nothing decided yet
    Unknown,
    /// Not a RIFF/WEBP stream (terminal)
    #[serde(rename = "not_webp")]
    NotWebP,
    /// "VP8 " simple lossy file
    Lossy,
    /// "VP8L" lossless file
    Lossless,
    /// "VP8X" extended container
    Extended,
}

impl Subtype {
    /// True for the three WebP variants
    pub fn is_webp(&self) -> bool {
        matches!(self, Subtype::Lossy | Subtype::Lossless | Subtype::Extended)
    }

    /// Short lowercase label used in logs and headers
    pub fn label(&self) -> &'static str {
        match self {
            Subtype::Unknown => "unknown",
            Subtype::NotWebP => "not-webp",
            Subtype::Lossy => "lossy",
            Subtype::Lossless => "lossless",
            Subtype::Extended => "extended",
        }
    }

    /// The chunk FourCC this subtype was read from
    pub fn fourcc(&self) -> Option<&'static str> {
        match self {
            Subtype::Lossy => Some("VP8 "),
            Subtype::Lossless => Some("VP8L"),
            Subtype::Extended => Some("VP8X"),
            Subtype::Unknown | Subtype::NotWebP => None,
        }
    }
}

/// Estimated encoder quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quality {
    /// Not computed yet; more bytes may resolve it
    Indeterminate,
    /// Lossless payloads have no quality setting
    NotApplicable,
    /// Lossy estimate, a multiple of 10 in 0..=100
    Estimated(u8),
}

impl Quality {
    /// Integer code: -1 indeterminate, 101 not applicable, else 0..=100
    pub fn code(&self) -> i32 {
        match self {
            Quality::Indeterminate => QUALITY_INDETERMINATE,
            Quality::NotApplicable => QUALITY_NOT_APPLICABLE,
            Quality::Estimated(q) => i32::from(*q),
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, Quality::Indeterminate)
    }
}

/// Result of classifying the bytes of one stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassificationResult {
    pub subtype: Subtype,
    pub quality: Quality,
}

impl ClassificationResult {
    /// Nothing can be said yet
    pub const UNKNOWN: Self = Self {
        subtype: Subtype::Unknown,
        quality: Quality::Indeterminate,
    };

    /// Definitively not a WebP stream
    pub const NOT_WEBP: Self = Self {
        subtype: Subtype::NotWebP,
        quality: Quality::Indeterminate,
    };

    pub fn new(subtype: Subtype, quality: Quality) -> Self {
        Self { subtype, quality }
    }

    /// Whether this result can no longer change as more bytes arrive
    ///
    /// NotWebP is final, as is any WebP subtype with a resolved quality.
    pub fn is_final(&self) -> bool {
        match self.subtype {
            Subtype::NotWebP => true,
            Subtype::Lossy | Subtype::Lossless | Subtype::Extended => self.quality.is_resolved(),
            Subtype::Unknown => false,
        }
    }

    /// Human-readable one-liner, e.g. "WebP lossy, quality ~70"
    pub fn describe(&self) -> String {
        let quality = match self.quality {
            Quality::Estimated(q) => format!("quality ~{}", q),
            _ => "quality unknown".to_string(),
        };
        match self.subtype {
            Subtype::Lossy => format!("WebP lossy, {}", quality),
            Subtype::Extended => format!("WebP extended, {}", quality),
            Subtype::Lossless => "WebP lossless".to_string(),
            Subtype::NotWebP => "not WebP".to_string(),
            Subtype::Unknown => "undetermined".to_string(),
        }
    }
}
