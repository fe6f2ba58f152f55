//! WebP stream classification
//!
//! This module provides:
//! - MSB-first bit reading over partial buffers
//! - RIFF/WEBP container and subtype detection
//! - Lossy quality estimation from the VP8 frame header

pub mod bit_reader;
pub mod container;
pub mod quality;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use bit_reader::BitReader;
pub use container::{classify, FourCc};
pub use quality::{estimate_quality, quality_from_quantizer};
pub use types::{ClassificationResult, Quality, Subtype};
