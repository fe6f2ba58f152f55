//! RIFF/WEBP container classification
//!
//! `classify` is a pure function of the bytes received so far. Calling it
//! again on a longer buffer re-parses from scratch.

use super::quality::estimate_quality;
use super::types::{ClassificationResult, Quality, Subtype};

/// "RIFF" + length + "WEBP" + chunk FourCC
pub const PREFIX_LEN: usize = 16;

pub const RIFF_MAGIC: &[u8; 4] = b"RIFF";
pub const WEBP_MAGIC: &[u8; 4] = b"WEBP";

/// Lossy key frame start code
pub const VP8_START_CODE: [u8; 3] = [0x9D, 0x01, 0x2A];

/// First chunk FourCC of a WebP file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FourCc {
    /// "VP8 "
    Vp8,
    /// "VP8L"
    Vp8L,
    /// "VP8X"
    Vp8X,
}

impl FourCc {
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes {
            b"VP8 " => Some(FourCc::Vp8),
            b"VP8L" => Some(FourCc::Vp8L),
            b"VP8X" => Some(FourCc::Vp8X),
            _ => None,
        }
    }

    pub fn subtype(self) -> Subtype {
        match self {
            FourCc::Vp8 => Subtype::Lossy,
            FourCc::Vp8L => Subtype::Lossless,
            FourCc::Vp8X => Subtype::Extended,
        }
    }
}

/// Classify a (possibly partial) stream
///
/// Buffers shorter than the 16-byte prefix are always `Unknown`, even when
/// the bytes present already rule out RIFF.
pub fn classify(data: &[u8]) -> ClassificationResult {
    if data.len() < PREFIX_LEN {
        return ClassificationResult::UNKNOWN;
    }
    if &data[0..4] != RIFF_MAGIC || &data[8..12] != WEBP_MAGIC {
        return ClassificationResult::NOT_WEBP;
    }

    let fourcc = match FourCc::from_bytes(&data[12..16]) {
        Some(fourcc) => fourcc,
        None => return ClassificationResult::NOT_WEBP,
    };

    match fourcc {
        FourCc::Vp8L => ClassificationResult::new(Subtype::Lossless, Quality::NotApplicable),
        // VP8X is expected to carry a lossy frame further in; both take the
        // same start code scan.
        FourCc::Vp8 | FourCc::Vp8X => {
            let quality = match find_start_code(data) {
                Some(pos) => estimate_quality(data, pos + VP8_START_CODE.len()),
                None => Quality::Indeterminate,
            };
            ClassificationResult::new(fourcc.subtype(), quality)
        }
    }
}

/// Index of the first lossy frame start code
pub fn find_start_code(data: &[u8]) -> Option<usize> {
    data.windows(VP8_START_CODE.len())
        .position(|w| w == VP8_START_CODE)
}
