//! Named-bit view over a fixed-size byte region.
//!
//! Bit `i` lives in byte `i / 8` at position `i % 8` (LSB first). Names are bound by index;
//! an empty name marks an unnamed (reserved) bit, which can be addressed by index but is never
//! reported by [`Bitmap::bits`].

use crate::codec::{self, CodecError};
use std::fmt;
use std::sync::Arc;

/// Ordered bit names shared between a bitmap descriptor and the bitmaps it decodes.
pub type BitNames = Arc<[String]>;

/// Build a [`BitNames`] list from anything yielding names.
pub fn bit_names<I, S>(names: I) -> BitNames
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names.into_iter().map(Into::into).collect()
}

#[derive(Debug, Clone)]
pub struct Bitmap {
    bytes: Vec<u8>,
    names: BitNames,
}

impl Bitmap {
    /// All-clear bitmap of `len` bytes.
    pub fn new(len: usize, names: BitNames) -> Self {
        Bitmap {
            bytes: vec![0; len],
            names,
        }
    }

    pub fn from_bytes(bytes: Vec<u8>, names: BitNames) -> Self {
        Bitmap { bytes, names }
    }

    /// View `len` bytes of `buf` starting at `offset`; bytes past the end read as zero.
    pub fn from_slice(buf: &[u8], offset: usize, len: usize, names: BitNames) -> Self {
        Bitmap::from_bytes(codec::read_block(buf, offset, len), names)
    }

    pub fn with_mask(mut self, mask: u64) -> Self {
        self.set_mask(mask);
        self
    }

    pub fn with_bits<I, S>(mut self, names: I) -> Result<Self, CodecError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.set_bits(names)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn names(&self) -> &BitNames {
        &self.names
    }

    /// Out-of-range indices read as clear.
    pub fn get_bit(&self, index: usize) -> bool {
        self.bytes
            .get(index / 8)
            .map(|b| b & (1 << (index % 8)) != 0)
            .unwrap_or(false)
    }

    /// Out-of-range indices are ignored.
    pub fn set_bit(&mut self, index: usize, value: bool) {
        if let Some(b) = self.bytes.get_mut(index / 8) {
            if value {
                *b |= 1 << (index % 8);
            } else {
                *b &= !(1 << (index % 8));
            }
        }
    }

    pub fn clear_bit(&mut self, index: usize) {
        self.set_bit(index, false);
    }

    /// Overwrite the whole region with a little-endian mask. Bits beyond the region are dropped.
    pub fn set_mask(&mut self, mask: u64) {
        for (i, b) in self.bytes.iter_mut().enumerate() {
            *b = if i < 8 { (mask >> (8 * i)) as u8 } else { 0 };
        }
    }

    /// Little-endian mask of the first 8 bytes.
    pub fn mask(&self) -> u64 {
        self.bytes
            .iter()
            .take(8)
            .enumerate()
            .fold(0u64, |acc, (i, b)| acc | (*b as u64) << (8 * i))
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| !n.is_empty() && n == name)
    }

    /// Set every named bit. All names are resolved before any bit changes.
    pub fn set_bits<I, S>(&mut self, names: I) -> Result<(), CodecError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let indices = names
            .into_iter()
            .map(|n| {
                let n = n.as_ref();
                self.index_of(n)
                    .ok_or_else(|| CodecError::UnknownBitName(n.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        for i in indices {
            self.set_bit(i, true);
        }
        Ok(())
    }

    /// Named-bit read; `None` if the name is not bound.
    pub fn get(&self, name: &str) -> Option<bool> {
        self.index_of(name).map(|i| self.get_bit(i))
    }

    pub fn set(&mut self, name: &str, value: bool) -> Result<(), CodecError> {
        let i = self
            .index_of(name)
            .ok_or_else(|| CodecError::UnknownBitName(name.to_string()))?;
        self.set_bit(i, value);
        Ok(())
    }

    /// Names of the set bits, in bit order. Unnamed bits are skipped.
    pub fn bits(&self) -> Vec<&str> {
        (0..self.bytes.len() * 8)
            .filter(|&i| self.get_bit(i))
            .filter_map(|i| self.names.get(i))
            .filter(|n| !n.is_empty())
            .map(String::as_str)
            .collect()
    }

    pub fn to_array(&self) -> Vec<String> {
        self.bits().into_iter().map(str::to_string).collect()
    }

    /// Copy the raw bytes into `target` at `offset`; returns the number of bytes written.
    pub fn write_to(&self, target: &mut [u8], offset: usize) -> Result<usize, CodecError> {
        codec::write_block(target, offset, &self.bytes)?;
        Ok(self.bytes.len())
    }
}

/// Bitmaps compare by their set named bits, not by raw bytes.
impl PartialEq for Bitmap {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits()
    }
}

impl fmt::Display for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bitmap [ {} ]", self.bits().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> BitNames {
        bit_names(["bit1", "bit2", "", "bit4", "", "", "", "", "bit9"])
    }

    #[test]
    fn bit_addressing_is_lsb_first() {
        let mut bm = Bitmap::new(2, names());
        bm.set_bit(1, true);
        bm.set_bit(8, true);
        assert_eq!(bm.as_bytes(), &[0x02, 0x01]);
        assert!(bm.get_bit(8));
        bm.clear_bit(8);
        assert_eq!(bm.as_bytes(), &[0x02, 0x00]);
    }

    #[test]
    fn out_of_range_bits_are_ignored() {
        let mut bm = Bitmap::new(1, names());
        bm.set_bit(12, true);
        assert!(!bm.get_bit(12));
        assert_eq!(bm.as_bytes(), &[0]);
    }

    #[test]
    fn bits_skip_unnamed_indices() {
        let bm = Bitmap::new(2, names()).with_mask(0b1_0000_0111);
        assert_eq!(bm.bits(), vec!["bit1", "bit2", "bit9"]);
        assert_eq!(bm.mask(), 0x107);
    }

    #[test]
    fn set_bits_rejects_unknown_name_without_side_effects() {
        let mut bm = Bitmap::new(2, names());
        let err = bm.set_bits(["bit1", "nope"]).unwrap_err();
        assert!(matches!(err, CodecError::UnknownBitName(ref n) if n == "nope"));
        assert_eq!(bm.as_bytes(), &[0, 0]);
        assert!(bm.set_bits([""]).is_err(), "empty placeholder is not addressable by name");
    }

    #[test]
    fn named_access() {
        let mut bm = Bitmap::new(2, names());
        bm.set("bit4", true).expect("bit4 is named");
        assert_eq!(bm.get("bit4"), Some(true));
        assert_eq!(bm.get("bit2"), Some(false));
        assert_eq!(bm.get("bit3"), None);
        assert_eq!(bm.as_bytes(), &[0x08, 0x00]);
    }

    #[test]
    fn set_mask_truncates_to_region() {
        let bm = Bitmap::new(1, names()).with_mask(0x1ff);
        assert_eq!(bm.as_bytes(), &[0xff]);
    }

    #[test]
    fn write_to_offset() {
        let bm = Bitmap::from_slice(&[0b0101], 0, 1, names());
        let mut buf = [0u8; 8];
        assert_eq!(bm.write_to(&mut buf, 4).expect("fits"), 1);
        assert_eq!(buf, [0, 0, 0, 0, 0b0101, 0, 0, 0]);
        assert!(bm.write_to(&mut buf, 8).is_err());
    }

    #[test]
    fn equality_and_display_use_set_names() {
        let a = Bitmap::new(1, names()).with_bits(["bit2"]).expect("known");
        let b = Bitmap::from_bytes(vec![0x06], names());
        assert_eq!(a, b, "bit 2 is unnamed and ignored for equality");
        assert_eq!(a.to_string(), "Bitmap [ bit2 ]");
    }
}
