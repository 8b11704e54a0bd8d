//! Common error types

use crate::usb_types::{DeviceIdentity, DeviceType};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to enumerate USB devices: {0}")]
    EnumerationFailed(String),

    #[error(
        "Could not find a known device - please specify type and/or vid:pid and/or bus,addr"
    )]
    NoMatchFound,

    #[error("Failed to open {identity}: {reason}")]
    OpenFailed {
        identity: DeviceIdentity,
        reason: String,
    },

    #[error("USB error: {0}")]
    Usb(String),

    #[error("Device accepted no data at {address:#010x} ({offset} bytes into the section)")]
    ShortWrite { address: u32, offset: usize },

    #[error("Firmware upload is not supported for {0} devices")]
    UnsupportedDevice(DeviceType),

    #[error("Firmware error: {0}")]
    Firmware(#[from] firmware::Error),

    #[error("Invalid device selector: {0}")]
    InvalidSelector(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
