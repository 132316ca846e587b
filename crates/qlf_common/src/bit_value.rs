//! Arbitrary-width 2-state integers for FASM values and RAM initialization data.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An unsigned integer of fixed bit width, packed 64 bits per word.
///
/// FASM values range from single-bit enables up to whole RAM block
/// initializations (`9216'h…`), so a plain `u64` is not enough. Bit 0 is the
/// least significant bit and corresponds to the low end of a feature's
/// `[hi:lo]` range.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitValue {
    width: u32,
    data: Vec<u64>,
}

/// Number of bits packed per storage word.
const BITS_PER_WORD: u32 = 64;

impl BitValue {
    /// Creates a zero value of the given width.
    pub fn new(width: u32) -> Self {
        Self {
            width,
            data: vec![0; word_count(width)],
        }
    }

    /// Returns the width of this value in bits.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Gets the bit at the given index. Bits at or beyond the width read as 0.
    pub fn get(&self, index: u32) -> bool {
        if index >= self.width {
            return false;
        }
        let word = self.data[(index / BITS_PER_WORD) as usize];
        (word >> (index % BITS_PER_WORD)) & 1 != 0
    }

    /// Sets the bit at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn set(&mut self, index: u32, value: bool) {
        assert!(
            index < self.width,
            "index {index} out of bounds for width {}",
            self.width
        );
        let word = &mut self.data[(index / BITS_PER_WORD) as usize];
        let mask = 1u64 << (index % BITS_PER_WORD);
        if value {
            *word |= mask;
        } else {
            *word &= !mask;
        }
    }

    /// Creates a value from the low `width` bits of a `u64`.
    pub fn from_u64(value: u64, width: u32) -> Self {
        let mut v = Self::new(width);
        if let Some(first) = v.data.first_mut() {
            *first = if width >= BITS_PER_WORD {
                value
            } else {
                value & ((1u64 << width) - 1)
            };
        }
        v
    }

    /// Returns the value as a `u64` if no bit above bit 63 is set.
    pub fn to_u64(&self) -> Option<u64> {
        if self.data.iter().skip(1).any(|&w| w != 0) {
            return None;
        }
        Some(self.data.first().copied().unwrap_or(0))
    }

    /// Returns true if every bit is zero.
    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|&w| w == 0)
    }

    /// Returns the number of bits needed to represent this value (0 for zero).
    pub fn significant_bits(&self) -> u32 {
        for (idx, &word) in self.data.iter().enumerate().rev() {
            if word != 0 {
                return idx as u32 * BITS_PER_WORD + (BITS_PER_WORD - word.leading_zeros());
            }
        }
        0
    }

    /// Extracts `count` bits (at most 64) starting at `offset`.
    ///
    /// Bits beyond the width read as 0, so slicing past the end is allowed.
    pub fn bits(&self, offset: u32, count: u32) -> u64 {
        assert!(count <= BITS_PER_WORD, "cannot extract {count} bits at once");
        let mut out = 0u64;
        for i in 0..count {
            if self.get(offset + i) {
                out |= 1 << i;
            }
        }
        out
    }

    /// Writes the low `count` bits of `value` starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the written range extends past the width.
    pub fn set_bits(&mut self, offset: u32, count: u32, value: u64) {
        for i in 0..count {
            self.set(offset + i, (value >> i) & 1 != 0);
        }
    }

    /// Returns a copy truncated or zero-extended to `width` bits.
    pub fn resized(&self, width: u32) -> Self {
        let mut v = Self::new(width);
        let words = v.data.len().min(self.data.len());
        v.data[..words].copy_from_slice(&self.data[..words]);
        v.clear_unused_bits();
        v
    }

    /// Parses a binary digit string, most significant digit first.
    ///
    /// The width equals the number of digits. Returns `None` on an invalid
    /// digit or an empty string.
    pub fn from_binary_str(s: &str) -> Option<Self> {
        Self::from_radix_pow2(s, 1)
    }

    /// Parses an octal digit string, most significant digit first.
    pub fn from_octal_str(s: &str) -> Option<Self> {
        Self::from_radix_pow2(s, 3)
    }

    /// Parses a hex digit string, most significant digit first.
    ///
    /// Each digit contributes 4 bits to the width.
    pub fn from_hex_str(s: &str) -> Option<Self> {
        Self::from_radix_pow2(s, 4)
    }

    /// Parses a decimal digit string of any length.
    ///
    /// The resulting width is the minimal width holding the value (at least 1).
    pub fn from_decimal_str(s: &str) -> Option<Self> {
        if s.is_empty() {
            return None;
        }
        // Little-endian words, grown as the value needs them.
        let mut words: Vec<u64> = vec![0];
        for c in s.chars() {
            let digit = c.to_digit(10)? as u128;
            let mut carry = digit;
            for word in words.iter_mut() {
                let acc = (*word as u128) * 10 + carry;
                *word = acc as u64;
                carry = acc >> 64;
            }
            if carry != 0 {
                words.push(carry as u64);
            }
        }
        let raw = Self {
            width: words.len() as u32 * BITS_PER_WORD,
            data: words,
        };
        Some(raw.resized(raw.significant_bits().max(1)))
    }

    /// Formats the value as lowercase hex digits, `ceil(width / 4)` of them.
    pub fn to_hex_string(&self) -> String {
        let digits = self.width.div_ceil(4).max(1);
        let mut out = String::with_capacity(digits as usize);
        for d in (0..digits).rev() {
            let nibble = self.bits(d * 4, 4) as u32;
            out.push(char::from_digit(nibble, 16).unwrap_or('0'));
        }
        out
    }

    fn from_radix_pow2(s: &str, bits_per_digit: u32) -> Option<Self> {
        if s.is_empty() {
            return None;
        }
        let radix = 1u32 << bits_per_digit;
        let width = s.chars().count() as u32 * bits_per_digit;
        let mut v = Self::new(width);
        for (idx, c) in s.chars().rev().enumerate() {
            let digit = c.to_digit(radix)? as u64;
            v.set_bits(idx as u32 * bits_per_digit, bits_per_digit, digit);
        }
        Some(v)
    }

    fn clear_unused_bits(&mut self) {
        let used = self.width % BITS_PER_WORD;
        if used != 0 {
            if let Some(last) = self.data.last_mut() {
                *last &= (1u64 << used) - 1;
            }
        }
    }
}

impl fmt::Display for BitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}'h{}", self.width, self.to_hex_string())
    }
}

impl fmt::Debug for BitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitValue({self})")
    }
}

/// Returns the number of u64 words needed to store `width` bits.
fn word_count(width: u32) -> usize {
    width.div_ceil(BITS_PER_WORD) as usize
}
