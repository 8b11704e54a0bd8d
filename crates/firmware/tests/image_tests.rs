//! Integration tests for FX3 image parsing
//!
//! Covers:
//! - Multi-section images and entry address extraction
//! - Every validation failure on a corrupted copy of a good image
//! - Truncation at arbitrary offsets never panicking

use firmware::{Error, Fx3Image, Section};

/// Build raw image bytes by hand, independent of `Fx3Image::to_bytes`
fn raw_image(sections: &[(u32, Vec<u32>)], entry: u32) -> Vec<u8> {
    let mut out = b"CY\x00\xb0".to_vec();
    let mut sum: u32 = 0;
    for (address, words) in sections {
        out.extend_from_slice(&(words.len() as u32).to_le_bytes());
        out.extend_from_slice(&address.to_le_bytes());
        for word in words {
            sum = sum.wrapping_add(*word);
            out.extend_from_slice(&word.to_le_bytes());
        }
    }
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&entry.to_le_bytes());
    out.extend_from_slice(&sum.to_le_bytes());
    out
}

#[test]
fn test_parse_multi_section_image() {
    let bytes = raw_image(
        &[
            (0x4000_0000, vec![0xdead_beef, 0x0000_0001]),
            (0x4000_1000, vec![0x1234_5678]),
        ],
        0x4000_0020,
    );

    let image = Fx3Image::parse(&bytes).unwrap();

    assert_eq!(image.entry_address, 0x4000_0020);
    assert_eq!(image.sections.len(), 2);
    assert_eq!(image.sections[0].address, 0x4000_0000);
    assert_eq!(image.sections[0].data, vec![0xef, 0xbe, 0xad, 0xde, 1, 0, 0, 0]);
    assert_eq!(image.sections[1].address, 0x4000_1000);
    assert_eq!(image.payload_len(), 12);
    assert_eq!(
        image.checksum,
        0xdead_beefu32.wrapping_add(1).wrapping_add(0x1234_5678)
    );
}

#[test]
fn test_parse_image_without_sections() {
    let bytes = raw_image(&[], 0x100);
    let image = Fx3Image::parse(&bytes).unwrap();

    assert!(image.sections.is_empty());
    assert_eq!(image.entry_address, 0x100);
    assert_eq!(image.checksum, 0);
}

#[test]
fn test_control_byte_other_bits_allowed() {
    let mut bytes = raw_image(&[(0, vec![7])], 0);
    bytes[2] = 0x1c;
    assert!(Fx3Image::parse(&bytes).is_ok());
}

#[test]
fn test_checksum_mismatch() {
    let mut bytes = raw_image(&[(0, vec![1, 2, 3])], 0);
    let last = bytes.len() - 1;
    bytes[last] ^= 0x80;

    match Fx3Image::parse(&bytes) {
        Err(Error::ChecksumMismatch { expected, computed }) => {
            assert_eq!(computed, 6);
            assert_eq!(expected, 6 ^ 0x8000_0000);
        }
        other => panic!("Expected checksum mismatch, got {:?}", other),
    }
}

#[test]
fn test_corrupted_data_word_fails_checksum() {
    let mut bytes = raw_image(&[(0, vec![1, 2, 3])], 0);
    // first data byte follows header + len + addr
    bytes[12] = 0xff;

    assert!(matches!(
        Fx3Image::parse(&bytes),
        Err(Error::ChecksumMismatch { .. })
    ));
}

#[test]
fn test_missing_checksum_is_truncated() {
    let mut bytes = raw_image(&[(0, vec![1])], 0);
    bytes.truncate(bytes.len() - 4);

    assert_eq!(
        Fx3Image::parse(&bytes),
        Err(Error::Truncated {
            offset: bytes.len(),
            needed: 4
        })
    );
}

#[test]
fn test_oversized_section_length_is_truncated() {
    let mut bytes = b"CY\x00\xb0".to_vec();
    bytes.extend_from_slice(&u32::MAX.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&[0; 16]);

    assert!(matches!(
        Fx3Image::parse(&bytes),
        Err(Error::Truncated { offset: 12, .. })
    ));
}

#[test]
fn test_every_truncation_is_an_error() {
    let bytes = raw_image(&[(0x10, vec![1, 2]), (0x20, vec![3])], 0x10);

    for len in 0..bytes.len() {
        let result = Fx3Image::parse(&bytes[..len]);
        assert!(
            matches!(result, Err(Error::Truncated { .. })),
            "length {} gave {:?}",
            len,
            result
        );
    }
}

#[test]
fn test_to_bytes_matches_hand_built_layout() {
    let image = Fx3Image::new(
        vec![
            Section::new(0x10, vec![1, 0, 0, 0, 2, 0, 0, 0]).unwrap(),
            Section::new(0x20, vec![3, 0, 0, 0]).unwrap(),
        ],
        0x10,
    );

    assert_eq!(image.to_bytes(), raw_image(&[(0x10, vec![1, 2]), (0x20, vec![3])], 0x10));
}
