//! Fletcher-32 checksum used by the PolarPro 3 trailer.

/// Modulus of both running sums.
const MODULUS: u32 = 65_535;

/// Computes Fletcher-32 over `data`.
///
/// The data is consumed as little-endian 16-bit words; an odd final byte is
/// padded with a zero high byte. Both sums start at 0 and the result is
/// `sum2 << 16 | sum1`.
pub fn fletcher32(data: &[u8]) -> u32 {
    let mut sum1: u32 = 0;
    let mut sum2: u32 = 0;
    for pair in data.chunks(2) {
        let word = u16::from_le_bytes([pair[0], pair.get(1).copied().unwrap_or(0)]) as u32;
        sum1 = (sum1 + word) % MODULUS;
        sum2 = (sum2 + sum1) % MODULUS;
    }
    (sum2 << 16) | sum1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty() {
        assert_eq!(fletcher32(&[]), 0);
    }

    #[test]
    fn known_vectors() {
        assert_eq!(fletcher32(b"abcde"), 0xF04F_C729);
        assert_eq!(fletcher32(b"abcdef"), 0x5650_2D2A);
        assert_eq!(fletcher32(b"abcdefgh"), 0xEBE1_9591);
    }

    #[test]
    fn odd_length_pads_with_zero() {
        assert_eq!(fletcher32(&[0x01, 0x02, 0x03]), fletcher32(&[0x01, 0x02, 0x03, 0x00]));
    }

    #[test]
    fn deterministic_and_sensitive() {
        let data: Vec<u8> = (0..=255).collect();
        assert_eq!(fletcher32(&data), fletcher32(&data));
        let mut flipped = data.clone();
        flipped[100] ^= 0x01;
        assert_ne!(fletcher32(&data), fletcher32(&flipped));
    }

    #[test]
    fn all_ones_words_reduce_modulo() {
        // 0xFFFF ≡ 0 (mod 65535).
        assert_eq!(fletcher32(&[0xFF, 0xFF, 0xFF, 0xFF]), 0);
    }
}
