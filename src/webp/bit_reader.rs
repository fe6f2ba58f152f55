//! MSB-first bit cursor over a partially received buffer
//!
//! Running past the end of the buffer is expected while bytes are still
//! arriving. It flips the reader to invalid instead of failing; every later
//! read returns 0 and the caller re-parses once more data exists.

/// Bit-granular read position into a byte slice
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Absolute bit position from the start of `data`
    bit_pos: usize,
    valid: bool,
}

impl<'a> BitReader<'a> {
    /// Create a reader positioned at the first bit of byte `offset`
    pub fn at_byte(data: &'a [u8], offset: usize) -> Self {
        Self {
            data,
            bit_pos: offset * 8,
            valid: offset <= data.len(),
        }
    }

    /// Read `n` bits (at most 32), most significant first
    pub fn read_bits(&mut self, n: u32) -> u32 {
        debug_assert!(n <= 32, "read_bits supports at most 32 bits");
        if !self.valid {
            return 0;
        }
        let n = n as usize;
        if self.bit_pos + n > self.data.len() * 8 {
            self.valid = false;
            return 0;
        }

        let mut value = 0u32;
        for _ in 0..n {
            let byte = self.data[self.bit_pos >> 3];
            let bit = (byte >> (7 - (self.bit_pos & 7))) & 1;
            value = (value << 1) | u32::from(bit);
            self.bit_pos += 1;
        }
        value
    }

    /// Read a single bit as a flag
    pub fn read_flag(&mut self) -> bool {
        self.read_bits(1) == 1
    }

    /// Read a `magnitude_bits` wide magnitude followed by a sign bit
    pub fn read_signed(&mut self, magnitude_bits: u32) -> i32 {
        let magnitude = self.read_bits(magnitude_bits) as i32;
        if self.read_flag() {
            -magnitude
        } else {
            magnitude
        }
    }

    /// Read a flag and, if set, skip the `n` bits that follow it
    pub fn conditional_skip(&mut self, n: u32) {
        if self.read_flag() {
            self.read_bits(n);
        }
    }

    /// False once any read ran past the available bits
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Current absolute bit position
    pub fn bit_position(&self) -> usize {
        self.bit_pos
    }
}
