//! Decoding of the packed bitmaps returned by `EVIOCGBIT`.

use std::collections::BTreeSet;
use std::collections::btree_set;

/// Set of codes a device supports for one event type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeSet(BTreeSet<u16>);

impl CodeSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn contains(&self, code: u16) -> bool {
        self.0.contains(&code)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.0.iter().copied()
    }

    pub(crate) fn insert(&mut self, code: u16) {
        self.0.insert(code);
    }
}

impl FromIterator<u16> for CodeSet {
    fn from_iter<I: IntoIterator<Item = u16>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a CodeSet {
    type Item = u16;
    type IntoIter = std::iter::Copied<btree_set::Iter<'a, u16>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}

/// Number of bytes needed to hold bits `0..=max_code`.
pub const fn bitmap_len(max_code: u16) -> usize {
    (max_code as usize + 1).div_ceil(8)
}

/// Decodes a little-endian packed bitmap: code `i` is present iff bit `i % 8` of byte `i / 8`
/// is set. Bits above `max_code` are ignored and bytes missing from a short buffer read as zero.
pub fn decode(buffer: &[u8], max_code: u16) -> CodeSet {
    let mut set = CodeSet::new();
    let len = buffer.len().min(bitmap_len(max_code));
    for (index, &byte) in buffer[..len].iter().enumerate() {
        if byte == 0 {
            continue;
        }
        for bit in 0..8 {
            let code = index * 8 + bit;
            if code > max_code as usize {
                break;
            }
            if byte & (1 << bit) != 0 {
                set.insert(code as u16);
            }
        }
    }
    set
}

#[cfg(test)]
pub(crate) fn encode(codes: &[u16], max_code: u16) -> Vec<u8> {
    let mut buf = vec![0u8; bitmap_len(max_code)];
    for &code in codes {
        buf[code as usize / 8] |= 1 << (code % 8);
    }
    buf
}
