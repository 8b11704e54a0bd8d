//! Firmware image error types

use thiserror::Error;

/// Errors raised while validating an FX3 boot image
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Image does not start with the "CY" signature
    #[error("Invalid image prefix (expected \"CY\")")]
    MissingMagic,

    /// Image control byte marks the image as data only
    #[error("Image is not executable")]
    NotExecutable,

    /// Image type byte is not a normal firmware image with checksum
    #[error("Abnormal image type {0:#04x} (expected 0xb0)")]
    AbnormalImage(u8),

    /// Input ended before a complete field could be read
    #[error("Truncated image: needed {needed} bytes at offset {offset}")]
    Truncated { offset: usize, needed: usize },

    /// Stored checksum disagrees with the section data
    #[error("Invalid checksum: image says {expected:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { expected: u32, computed: u32 },

    /// Section payload is not a whole number of 32-bit words
    #[error("Section at {address:#010x} has {len} bytes, not a multiple of 4")]
    UnalignedSection { address: u32, len: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
