//! FX3 boot image parsing
//!
//! Layout (all words little-endian `u32`):
//!
//! ```text
//! +------+---------+------+------------------------------------+----------+
//! | "CY" | control | 0xb0 | sections: len, addr, data[len] ... | checksum |
//! +------+---------+------+------------------------------------+----------+
//! ```
//!
//! A section with `len == 0` ends the list; its `addr` is the entry point.

use crate::checksum::Checksum;
use crate::error::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

/// Signature every image starts with
pub const IMAGE_MAGIC: [u8; 2] = *b"CY";

/// Image type byte for a normal firmware binary with checksum
pub const IMAGE_TYPE_NORMAL: u8 = 0xb0;

/// Bit 0 of the control byte: image holds data only
const CONTROL_DATA_ONLY: u8 = 0x01;

const HEADER_LEN: usize = 4;
const WORD_LEN: usize = 4;

/// One contiguous block of RAM to download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub address: u32,
    pub data: Vec<u8>,
}

impl Section {
    /// Create a section, rejecting payloads that are not whole words
    pub fn new(address: u32, data: Vec<u8>) -> Result<Self> {
        if data.len() % WORD_LEN != 0 {
            return Err(Error::UnalignedSection {
                address,
                len: data.len(),
            });
        }
        Ok(Self { address, data })
    }

    /// Length in 32-bit words, as stored in the image
    pub fn word_len(&self) -> u32 {
        (self.data.len() / WORD_LEN) as u32
    }
}

/// A validated FX3 RAM image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fx3Image {
    pub sections: Vec<Section>,
    pub entry_address: u32,
    pub checksum: u32,
}

impl Fx3Image {
    /// Build an image from sections, computing its checksum
    pub fn new(sections: Vec<Section>, entry_address: u32) -> Self {
        let mut checksum = Checksum::new();
        for section in &sections {
            checksum.update(&section.data);
        }

        Self {
            sections,
            entry_address,
            checksum: checksum.value(),
        }
    }

    /// Parse and validate an image
    ///
    /// Never panics on malformed input; every short read is reported as
    /// [`Error::Truncated`].
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::Truncated {
                offset: 0,
                needed: HEADER_LEN,
            });
        }

        if bytes[..2] != IMAGE_MAGIC {
            return Err(Error::MissingMagic);
        }

        if bytes[2] & CONTROL_DATA_ONLY != 0 {
            return Err(Error::NotExecutable);
        }

        if bytes[3] != IMAGE_TYPE_NORMAL {
            return Err(Error::AbnormalImage(bytes[3]));
        }

        let mut cursor = Cursor::new(bytes);
        cursor.set_position(HEADER_LEN as u64);

        let mut checksum = Checksum::new();
        let mut sections = Vec::new();

        let entry_address = loop {
            let length = read_word(&mut cursor)?;
            let address = read_word(&mut cursor)?;

            if length == 0 {
                break address;
            }

            let data = read_bytes(&mut cursor, (length as usize).saturating_mul(WORD_LEN))?;
            checksum.update(&data);
            sections.push(Section { address, data });
        };

        let expected = read_word(&mut cursor)?;
        if expected != checksum.value() {
            return Err(Error::ChecksumMismatch {
                expected,
                computed: checksum.value(),
            });
        }

        Ok(Self {
            sections,
            entry_address,
            checksum: expected,
        })
    }

    /// Serialize back to the on-disk layout
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.payload_len() + 12);
        out.extend_from_slice(&IMAGE_MAGIC);
        out.push(0x00);
        out.push(IMAGE_TYPE_NORMAL);

        for section in &self.sections {
            out.extend_from_slice(&section.word_len().to_le_bytes());
            out.extend_from_slice(&section.address.to_le_bytes());
            out.extend_from_slice(&section.data);
        }
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&self.entry_address.to_le_bytes());
        out.extend_from_slice(&self.checksum.to_le_bytes());

        out
    }

    /// Total number of section bytes to download
    pub fn payload_len(&self) -> usize {
        self.sections.iter().map(|s| s.data.len()).sum()
    }
}

fn read_word(cursor: &mut Cursor<&[u8]>) -> Result<u32> {
    let offset = cursor.position() as usize;
    cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| Error::Truncated {
            offset,
            needed: WORD_LEN,
        })
}

fn read_bytes(cursor: &mut Cursor<&[u8]>, len: usize) -> Result<Vec<u8>> {
    let offset = cursor.position() as usize;
    let remaining = cursor.get_ref().len().saturating_sub(offset);
    // Check before allocating so a corrupt length cannot request gigabytes
    if remaining < len {
        return Err(Error::Truncated {
            offset,
            needed: len,
        });
    }

    let mut data = vec![0u8; len];
    cursor
        .read_exact(&mut data)
        .map_err(|_| Error::Truncated {
            offset,
            needed: len,
        })?;
    Ok(data)
}
