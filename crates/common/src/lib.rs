//! Common utilities for fx-bootstrap
//!
//! This crate provides the types shared between the firmware loader and its
//! tests: EZ-USB device types, the known device table, selection criteria,
//! error handling and logging setup.

pub mod error;
pub mod logging;
pub mod test_utils;
pub mod usb_types;

pub use error::{Error, Result};
pub use logging::setup_logging;
pub use usb_types::{
    CandidateDevice, DeviceIdentity, DeviceType, KnownDevice, SelectionCriteria,
    builtin_known_devices,
};
