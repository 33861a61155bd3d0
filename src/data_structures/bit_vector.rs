use super::BitIter;
use crate::error::ValidationError;
use bitvec::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::iter::FromIterator;
use std::str::FromStr;

/// Fixed length sequence of bits, stored and displayed most significant bit first,
/// the way the value of a component is written: `"0110"`.
///
/// # Example
/// ```
/// # use circuitsim::data_structures::BitVector;
/// let mut v = BitVector::normalized("10x1", 6);
/// assert_eq!(v.to_string(), "100100");
///
/// v.resize(2);
/// assert_eq!(v.to_string(), "10");
/// assert_eq!(v.any(), true);
/// ```
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct BitVector {
    bits: BitVec<u8, Msb0>,
}

impl BitVector {
    /// Returns a [BitVector] of `width` zeros.
    pub fn zeros(width: usize) -> Self {
        Self {
            bits: BitVec::repeat(false, width),
        }
    }

    /// Returns the lowest `width` bits of `value` as a [BitVector].
    ///
    /// ```
    /// # use circuitsim::data_structures::BitVector;
    /// assert_eq!(BitVector::from_u64(1, 4).to_string(), "0001");
    /// ```
    pub fn from_u64(value: u64, width: usize) -> Self {
        BitIter::new(value, width).collect()
    }

    /// Parses `s` permissively: every character other than `'1'` is a 0 bit,
    /// then the result is padded with zeros on the right or truncated to `width`.
    pub fn normalized(s: &str, width: usize) -> Self {
        let mut v: Self = s.chars().map(|c| c == '1').collect();
        v.resize(width);
        v
    }

    /// Parses `s` strictly, it must contain exactly `width` characters, all `'0'` or `'1'`.
    pub fn strict(s: &str, width: usize) -> Result<Self, ValidationError> {
        let v: Self = s.parse()?;
        if v.width() != width {
            return Err(ValidationError::MalformedBits {
                bits: s.into(),
                width,
            });
        }
        Ok(v)
    }

    /// Returns the number of bits.
    pub fn width(&self) -> usize {
        self.bits.len()
    }

    /// Returns the bit at `index`, bits past the end read as 0.
    pub fn get(&self, index: usize) -> bool {
        self.bits.get(index).map_or(false, |bit| *bit)
    }

    /// Pads with zeros on the right or truncates from the right until the width is `width`.
    pub fn resize(&mut self, width: usize) {
        self.bits.resize(width, false);
    }

    /// Returns a copy of `self` [resized](BitVector::resize) to `width`.
    pub fn resized(&self, width: usize) -> Self {
        let mut v = self.clone();
        v.resize(width);
        v
    }

    /// Returns true if at least one bit is 1.
    pub fn any(&self) -> bool {
        self.bits.any()
    }

    /// Flips every bit.
    pub fn toggle(&mut self) {
        self.bits = self.bits.iter().by_vals().map(|bit| !bit).collect();
    }

    /// Sets every bit to 0 without changing the width.
    pub fn clear(&mut self) {
        self.bits.fill(false);
    }

    /// Appends `bit` to the end.
    pub fn push(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    /// Returns a new [BitVector] with the bits in `range`.
    ///
    /// # Panics
    ///
    /// Panics if `range` is out of bounds.
    pub fn slice(&self, range: std::ops::Range<usize>) -> Self {
        Self {
            bits: self.bits[range].to_bitvec(),
        }
    }

    /// Returns an iterator over the bits, most significant first.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().by_vals()
    }

    /// Returns the numeric value of the bits, the excess high bits are ignored if width > 64.
    pub fn to_u64(&self) -> u64 {
        self.iter().fold(0, |acc, bit| (acc << 1) | bit as u64)
    }
}

impl FromIterator<bool> for BitVector {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self {
            bits: iter.into_iter().collect(),
        }
    }
}

impl FromStr for BitVector {
    type Err = ValidationError;

    /// Parses a string of `'0'` and `'1'` characters, the width is the length of the string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                _ => Err(ValidationError::MalformedBits {
                    bits: s.into(),
                    width: s.chars().count(),
                }),
            })
            .collect()
    }
}

impl From<String> for BitVector {
    fn from(s: String) -> Self {
        let width = s.chars().count();
        Self::normalized(&s, width)
    }
}

impl From<BitVector> for String {
    fn from(v: BitVector) -> Self {
        v.to_string()
    }
}

impl Display for BitVector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for bit in self.iter() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_pads_and_truncates() {
        assert_eq!(BitVector::normalized("1", 4).to_string(), "1000");
        assert_eq!(BitVector::normalized("0110", 2).to_string(), "01");
        assert_eq!(BitVector::normalized("1a2?", 4).to_string(), "1000");
        assert_eq!(BitVector::normalized("", 3).to_string(), "000");
    }

    #[test]
    fn test_strict() {
        assert_eq!(BitVector::strict("0101", 4).unwrap().to_u64(), 5);
        assert!(BitVector::strict("010", 4).is_err());
        assert!(BitVector::strict("01x1", 4).is_err());
    }

    #[test]
    fn test_get_out_of_range_is_zero() {
        let v: BitVector = "11".parse().unwrap();
        assert_eq!(v.get(0), true);
        assert_eq!(v.get(1), true);
        assert_eq!(v.get(2), false);
        assert_eq!(v.get(100), false);
    }

    #[test]
    fn test_toggle() {
        let mut v: BitVector = "0011".parse().unwrap();
        v.toggle();
        assert_eq!(v.to_string(), "1100");
        assert_eq!(v.width(), 4);
    }

    #[test]
    fn test_clear_keeps_width() {
        let mut v: BitVector = "1011".parse().unwrap();
        v.clear();
        assert_eq!(v, BitVector::zeros(4));
        assert_eq!(v.any(), false);
    }

    #[test]
    fn test_slice_and_push() {
        let mut v = BitVector::from_u64(0b101100, 6);
        assert_eq!(v.slice(1..4).to_string(), "011");
        v.push(true);
        assert_eq!(v.to_string(), "1011001");
    }

    #[test]
    fn test_json() {
        let v = BitVector::from_u64(9, 4);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "\"1001\"");

        let back: BitVector = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }
}
