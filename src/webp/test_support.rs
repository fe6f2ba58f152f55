//! Builders for synthetic WebP streams used across the test modules

use super::container::VP8_START_CODE;

/// MSB-first bit writer
#[derive(Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    bit_len: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, value: u32, n: u32) {
        for i in (0..n).rev() {
            if self.bit_len % 8 == 0 {
                self.bytes.push(0);
            }
            let bit = ((value >> i) & 1) as u8;
            let last = self.bytes.len() - 1;
            self.bytes[last] |= bit << (7 - (self.bit_len % 8));
            self.bit_len += 1;
        }
    }

    pub fn flag(&mut self, set: bool) {
        self.put(set as u32, 1);
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Segment header contents
pub struct Segmentation {
    pub absolute_delta: bool,
    pub quantizers: [Option<i32>; 4],
    pub update_map: bool,
}

/// Lossy frame header, starting at the dimensions after the start code
pub struct FrameHeader {
    base_q: u32,
    segmentation: Option<Segmentation>,
    lf_deltas: bool,
}

impl FrameHeader {
    pub fn new(base_q: u32) -> Self {
        Self {
            base_q,
            segmentation: None,
            lf_deltas: false,
        }
    }

    pub fn with_segmentation(mut self, segmentation: Segmentation) -> Self {
        self.segmentation = Some(segmentation);
        self
    }

    pub fn with_lf_deltas(mut self) -> Self {
        self.lf_deltas = true;
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = BitWriter::new();
        // width, height
        w.put(0x0140, 16);
        w.put(0x00F0, 16);

        // color space, clamping
        w.put(0b01, 2);

        match &self.segmentation {
            None => w.flag(false),
            Some(seg) => {
                w.flag(true);
                w.flag(seg.update_map);
                // update data
                w.flag(true);
                w.flag(seg.absolute_delta);
                for q in seg.quantizers {
                    match q {
                        Some(q) => {
                            w.flag(true);
                            w.put(q.unsigned_abs(), 7);
                            w.flag(q < 0);
                        }
                        None => w.flag(false),
                    }
                }
                // filter strengths: first two present
                for s in 0..4 {
                    if s < 2 {
                        w.flag(true);
                        w.put(0x55, 7);
                    } else {
                        w.flag(false);
                    }
                }
                if seg.update_map {
                    w.flag(true);
                    w.put(0xAB, 8);
                    w.flag(false);
                    w.flag(true);
                    w.put(0x0F, 8);
                }
            }
        }

        // simple, level, sharpness
        w.put(0b1_010101_011, 10);
        if self.lf_deltas {
            w.flag(true);
            w.flag(true);
            for n in 0..8 {
                let present = n % 2 == 0;
                w.flag(present);
                if present {
                    w.put(0b101010, 6);
                }
            }
        } else {
            w.flag(false);
        }

        // partitions
        w.put(0b11, 2);

        w.put(self.base_q, 7);
        for n in 0..5 {
            let present = n == 1 || n == 4;
            w.flag(present);
            if present {
                w.put(0b10011, 5);
            }
        }

        w.into_bytes()
    }
}

/// RIFF/WEBP prefix with the given FourCC and a zero RIFF length
pub fn riff_prefix(fourcc: &[u8; 4]) -> Vec<u8> {
    let mut out = Vec::with_capacity(16);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&[0, 0, 0, 0]);
    out.extend_from_slice(b"WEBP");
    out.extend_from_slice(fourcc);
    out
}

/// Complete simple-format lossy file around `header`
pub fn lossy_file(header: &FrameHeader) -> Vec<u8> {
    let mut out = riff_prefix(b"VP8 ");
    // chunk size
    out.extend_from_slice(&[0, 0, 0, 0]);
    // frame tag
    out.extend_from_slice(&[0x10, 0x02, 0x00]);
    out.extend_from_slice(&VP8_START_CODE);
    out.extend_from_slice(&header.to_bytes());
    out
}

/// Extended-format file with a lossy frame embedded after the VP8X chunk
pub fn extended_file(header: &FrameHeader) -> Vec<u8> {
    let mut out = riff_prefix(b"VP8X");
    out.extend_from_slice(&[10, 0, 0, 0]);
    out.extend_from_slice(&[0u8; 10]);
    out.extend_from_slice(b"VP8 ");
    out.extend_from_slice(&[0, 0, 0, 0]);
    out.extend_from_slice(&[0x10, 0x02, 0x00]);
    out.extend_from_slice(&VP8_START_CODE);
    out.extend_from_slice(&header.to_bytes());
    out
}

#[test]
fn test_bit_writer_layout() {
    let mut w = BitWriter::new();
    w.put(0b101, 3);
    w.put(0xFF, 8);
    assert_eq!(w.into_bytes(), vec![0b1011_1111, 0b1110_0000]);
}
