//! Byte helpers shared by the packet and frame codecs.

/// Extends byte iterators with methods for reading the little-endian
/// integers used in packet and frame headers.
///
/// ```
/// # use stopwait_core::utility::BytesExt;
/// let bytes = [0x09, 0x01, 0x00, 0x00, 0x00];
/// let mut iter = bytes.iter().cloned();
/// assert_eq!(iter.next_u8(), Some(0x09));
/// assert_eq!(iter.next_u32_le(), Some(1));
/// assert_eq!(iter.next_u32_le(), None);
/// ```
pub trait BytesExt: Iterator<Item = u8> {
    /// Advances the iterator and returns the next value.
    fn next_u8(&mut self) -> Option<u8> {
        self.next()
    }

    /// Advances the iterator by 4 bytes and combines them in little-endian
    /// order. Returns None if there were fewer than 4 bytes left.
    fn next_u32_le(&mut self) -> Option<u32> {
        let arr = [self.next()?, self.next()?, self.next()?, self.next()?];
        Some(u32::from_le_bytes(arr))
    }

    /// Advances the iterator by 8 bytes and combines them in little-endian
    /// order. Returns None if there were fewer than 8 bytes left.
    fn next_u64_le(&mut self) -> Option<u64> {
        let low = self.next_u32_le()? as u64;
        let high = self.next_u32_le()? as u64;
        Some(high << 32 | low)
    }
}

impl<T: Iterator<Item = u8>> BytesExt for T {}

/// A CRC-32 calculator for frames.
///
/// The checksum covers the whole frame with the checksum field itself zeroed,
/// so the field is fed to the hasher as zeros regardless of its contents.
#[derive(Clone, Default)]
pub struct Checksum(crc32fast::Hasher);

impl Checksum {
    /// Creates a new checksum calculator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds bytes to the checksum.
    pub fn add_bytes(&mut self, bytes: &[u8]) {
        self.0.update(bytes);
    }

    /// Adds a zeroed checksum field to the checksum.
    pub fn add_zeroed_field(&mut self) {
        self.0.update(&[0; 4]);
    }

    /// Computes the final checksum value.
    pub fn as_u32(self) -> u32 {
        self.0.finalize()
    }
}
