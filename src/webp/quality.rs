//! VP8 frame header quality estimation
//!
//! Walks the uncompressed-order fields of a lossy frame header up to the
//! quantizer block and maps the recovered quantizer to a 0-100 quality
//! bucket. Fields that do not affect the estimate are skipped, but still
//! consumed so the cursor stays aligned.

use super::bit_reader::BitReader;
use super::types::Quality;

/// Width and height fields following the start code
pub const FRAME_DIMENSIONS_LEN: usize = 4;

/// Largest quantizer index
const MAX_QUANTIZER: i32 = 127;

/// Below this mapped value the linear mapping is power-law corrected
const POWER_LAW_KNEE: f64 = 80.0;
const POWER_LAW_EXPONENT: f64 = 0.38;

const NUM_SEGMENTS: usize = 4;
const NUM_SEGMENT_PROBS: usize = 3;
const NUM_LF_DELTAS: usize = 4 + 4;
const NUM_QUANT_DELTAS: usize = 5;

/// Estimate quality from a frame header starting at `offset`
///
/// `offset` is the byte index just past the `9D 01 2A` start code. Returns
/// `Quality::Indeterminate` when the buffer ends before the quantizer block
/// has been read.
pub fn estimate_quality(data: &[u8], offset: usize) -> Quality {
    if offset + FRAME_DIMENSIONS_LEN > data.len() {
        return Quality::Indeterminate;
    }

    let mut reader = BitReader::at_byte(data, offset + FRAME_DIMENSIONS_LEN);
    let q = read_effective_quantizer(&mut reader);

    if !reader.is_valid() {
        return Quality::Indeterminate;
    }
    Quality::Estimated(quality_from_quantizer(q))
}

/// Parse the header up to the quantizer block, returning the quantizer
/// that drives the estimate
///
/// Only meaningful while `reader.is_valid()` holds afterwards.
fn read_effective_quantizer(reader: &mut BitReader<'_>) -> i32 {
    // color space + clamping type
    reader.read_bits(2);

    let segment_override = read_segment_header(reader);
    skip_filter_header(reader);

    // partition count
    reader.read_bits(2);

    let base_q = reader.read_bits(7) as i32;
    // y1 dc, y2 dc, y2 ac, uv dc, uv ac deltas
    for _ in 0..NUM_QUANT_DELTAS {
        reader.conditional_skip(5);
    }

    match segment_override {
        Some(q) if q >= 0 => q,
        _ => base_q,
    }
}

/// Returns segment 0's quantizer when the segment data is absolute
fn read_segment_header(reader: &mut BitReader<'_>) -> Option<i32> {
    if !reader.read_flag() {
        return None;
    }

    let update_map = reader.read_flag();
    let mut override_q = None;

    if reader.read_flag() {
        let absolute_delta = reader.read_flag();
        let mut quantizers = [0i32; NUM_SEGMENTS];
        for q in quantizers.iter_mut() {
            if reader.read_flag() {
                *q = reader.read_signed(7);
            }
        }
        // filter strengths
        for _ in 0..NUM_SEGMENTS {
            reader.conditional_skip(7);
        }
        if absolute_delta {
            override_q = Some(quantizers[0]);
        }
    }

    if update_map {
        for _ in 0..NUM_SEGMENT_PROBS {
            reader.conditional_skip(8);
        }
    }

    override_q
}

fn skip_filter_header(reader: &mut BitReader<'_>) {
    // simple flag + level + sharpness
    reader.read_bits(1 + 6 + 3);
    if reader.read_flag() && reader.read_flag() {
        for _ in 0..NUM_LF_DELTAS {
            reader.conditional_skip(6);
        }
    }
}

/// Map a quantizer index to a quality bucket (multiple of 10)
///
/// The linear mapping undershoots in the low range, where the quantizer
/// scale is strongly nonlinear, so values under 80 get a power-law
/// correction.
pub fn quality_from_quantizer(q: i32) -> u8 {
    let q = q.clamp(0, MAX_QUANTIZER);
    let mut mapped = f64::from((MAX_QUANTIZER - q) * 100 / MAX_QUANTIZER);
    if mapped < POWER_LAW_KNEE {
        mapped = (mapped / POWER_LAW_KNEE).powf(1.0 / POWER_LAW_EXPONENT) * POWER_LAW_KNEE;
    }
    ((mapped / 10.0).floor() * 10.0) as u8
}
