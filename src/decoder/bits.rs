//! Bit field extraction over raw navigation message words.
//!
//! Every constellation ICD numbers its bits differently: GPS and
//! Galileo count 1-based from the most significant bit of the frame,
//! GLONASS counts 1-based from the least significant bit of its 85 bit
//! string. Both conventions are handled here so call sites can quote
//! the ICD bit numbers verbatim.

/// Fixed size bit buffer over receiver delivered 32 bit words,
/// most significant word first.
#[derive(Clone, Debug)]
pub struct NavBits {
    words: Vec<u32>,
}

impl NavBits {
    pub fn new(words: &[u32]) -> Self {
        Self {
            words: words.to_vec(),
        }
    }

    /// Total buffer capacity in bits
    pub fn capacity(&self) -> usize {
        self.words.len() * 32
    }

    /* 0-based offset from the buffer MSB */
    fn field(&self, offset: usize, width: usize) -> u32 {
        debug_assert!(width <= 32);
        let mut value = 0_u64;
        for i in 0..width {
            let pos = offset + i;
            let bit = match self.words.get(pos / 32) {
                Some(word) => (word >> (31 - (pos % 32))) & 1,
                None => 0,
            };
            value = (value << 1) | (bit as u64);
        }
        value as u32
    }

    /// Unsigned field, `start` is the 1-based bit number counted from
    /// the buffer MSB (GPS / Galileo ICD convention)
    pub fn msb_field(&self, start: usize, width: usize) -> u32 {
        self.field(start - 1, width)
    }

    /// Two's complement field, `start` counted as in [Self::msb_field]
    pub fn msb_field_signed(&self, start: usize, width: usize) -> i32 {
        twos_complement(self.msb_field(start, width), width)
    }

    /// Unsigned field addressed GLONASS style: bit 1 is the string LSB,
    /// the string is right aligned within the buffer. `msb`/`lsb` are
    /// the ICD bit numbers bounding the field, inclusive.
    pub fn glo_field(&self, msb: usize, lsb: usize) -> u32 {
        self.field(self.capacity() - msb, msb - lsb + 1)
    }

    /// Sign-magnitude field (GLONASS numeric convention): the field MSB
    /// carries the sign, the remaining bits the magnitude.
    pub fn glo_field_sm(&self, msb: usize, lsb: usize) -> i32 {
        let magnitude = self.glo_field(msb - 1, lsb) as i32;
        if self.glo_field(msb, msb) == 1 {
            -magnitude
        } else {
            magnitude
        }
    }
}

/// Reinterprets the `width` low bits of `raw` as two's complement
pub fn twos_complement(raw: u32, width: usize) -> i32 {
    debug_assert!(width >= 1 && width <= 32);
    let shift = 32 - width;
    ((raw << shift) as i32) >> shift
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn msb_addressing() {
        // bits 1..8 = 0xA5, bits 9..16 = 0x3C
        let bits = NavBits::new(&[0xA53C_0000, 0x0000_0001]);
        assert_eq!(bits.msb_field(1, 8), 0xA5);
        assert_eq!(bits.msb_field(9, 8), 0x3C);
        // crossing the word boundary
        assert_eq!(bits.msb_field(29, 8), 0x00);
        assert_eq!(bits.msb_field(64, 1), 1);
    }

    #[test]
    fn signed_fields() {
        assert_eq!(twos_complement(0xFF, 8), -1);
        assert_eq!(twos_complement(0x7F, 8), 127);
        assert_eq!(twos_complement(0b11101, 5), -3);

        let bits = NavBits::new(&[0xFFFF_FFFF]);
        assert_eq!(bits.msb_field_signed(1, 16), -1);
    }

    #[test]
    fn glonass_addressing() {
        // 96 bit buffer, string right aligned: ICD bit 1 is the last
        // bit of the last word
        let bits = NavBits::new(&[0, 0, 1]);
        assert_eq!(bits.glo_field(1, 1), 1);
        assert_eq!(bits.glo_field(2, 1), 1);
        assert_eq!(bits.glo_field(2, 2), 0);

        // nA = 5 planted at bits 77..73
        let bits = NavBits::new(&[0x0000_0005 << 8, 0, 0]);
        assert_eq!(bits.glo_field(77, 73), 5);
    }

    #[test]
    fn glonass_sign_magnitude() {
        // bits 5..1 = 0b10011: sign set, magnitude 3
        let bits = NavBits::new(&[0, 0, 0b10011]);
        assert_eq!(bits.glo_field_sm(5, 1), -3);
        let bits = NavBits::new(&[0, 0, 0b00011]);
        assert_eq!(bits.glo_field_sm(5, 1), 3);
    }
}
