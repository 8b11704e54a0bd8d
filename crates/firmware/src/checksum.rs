//! FX3 image checksum
//!
//! The boot loader checksum is the wrapping sum of every section data word,
//! read as little-endian `u32`.

/// Running checksum over section data
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Checksum {
    value: u32,
}

impl Checksum {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a run of section data
    ///
    /// Trailing bytes that do not fill a whole word are ignored; the image
    /// parser only ever passes whole words.
    pub fn update(&mut self, data: &[u8]) {
        for word in data.chunks_exact(4) {
            let word = u32::from_le_bytes([word[0], word[1], word[2], word[3]]);
            self.value = self.value.wrapping_add(word);
        }
    }

    pub fn value(&self) -> u32 {
        self.value
    }
}

/// Compute the checksum of a single buffer
#[inline]
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut checksum = Checksum::new();
    checksum.update(data);
    checksum.value()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_checksum_is_zero() {
        assert_eq!(compute_checksum(&[]), 0);
    }

    #[test]
    fn test_words_are_little_endian() {
        assert_eq!(compute_checksum(&[0x01, 0x00, 0x00, 0x00]), 1);
        assert_eq!(compute_checksum(&[0x00, 0x00, 0x00, 0x01]), 0x0100_0000);
    }

    #[test]
    fn test_sum_wraps() {
        let data = [0xff, 0xff, 0xff, 0xff, 0x02, 0x00, 0x00, 0x00];
        assert_eq!(compute_checksum(&data), 1);
    }

    #[test]
    fn test_incremental_matches_single_pass() {
        let data: Vec<u8> = (0u8..64).collect();

        let mut checksum = Checksum::new();
        checksum.update(&data[..16]);
        checksum.update(&data[16..]);

        assert_eq!(checksum.value(), compute_checksum(&data));
    }

    #[test]
    fn test_partial_word_ignored() {
        assert_eq!(compute_checksum(&[0x05, 0x00, 0x00, 0x00, 0xaa]), 5);
    }
}
