//! USB subsystem
//!
//! This module implements the USB side of the loader:
//! - Device enumeration through libusb
//! - Device selection against the known device table
//! - Opening the selected device
//!
//! Everything runs synchronously on the calling thread.

pub mod selector;
pub mod session;

// Re-export public types
pub use selector::{Candidate, Selection, matching_devices, select_device};
pub use session::{KnownMatch, OpenedDevice, UsbSession};
