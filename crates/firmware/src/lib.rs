//! Cypress FX3 boot image support for fx-bootstrap
//!
//! This crate parses and validates the `.img` RAM images that the FX3 boot
//! loader accepts over USB. It performs no I/O: callers hand it the image
//! bytes and get back the sections to download plus the entry address.
//!
//! # Example
//!
//! ```
//! use firmware::{Fx3Image, Section};
//!
//! let image = Fx3Image::new(
//!     vec![Section::new(0x4000_0000, vec![0x11, 0x22, 0x33, 0x44]).unwrap()],
//!     0x4000_0000,
//! );
//! let bytes = image.to_bytes();
//!
//! let parsed = Fx3Image::parse(&bytes).unwrap();
//! assert_eq!(parsed.entry_address, 0x4000_0000);
//! assert_eq!(parsed.sections.len(), 1);
//! ```

pub mod checksum;
pub mod error;
pub mod image;

pub use checksum::Checksum;
pub use error::{Error, Result};
pub use image::{Fx3Image, IMAGE_MAGIC, IMAGE_TYPE_NORMAL, Section};
