//! USB type abstractions and utilities
//!
//! Device types, the known device table and the selection criteria used to
//! pick one attached EZ-USB device.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// EZ-USB family member, which decides how firmware is loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    /// AN21xx series (original EZ-USB)
    An21,
    /// EZ-USB FX / FX1
    Fx,
    /// EZ-USB FX2
    Fx2,
    /// EZ-USB FX2LP
    Fx2Lp,
    /// EZ-USB FX3
    Fx3,
}

impl DeviceType {
    pub const ALL: [DeviceType; 5] = [
        DeviceType::An21,
        DeviceType::Fx,
        DeviceType::Fx2,
        DeviceType::Fx2Lp,
        DeviceType::Fx3,
    ];

    /// Name used on the command line and in configuration files
    pub fn name(&self) -> &'static str {
        match self {
            DeviceType::An21 => "an21",
            DeviceType::Fx => "fx",
            DeviceType::Fx2 => "fx2",
            DeviceType::Fx2Lp => "fx2lp",
            DeviceType::Fx3 => "fx3",
        }
    }

    /// Whether firmware can be downloaded as an FX3 RAM image
    pub fn supports_ram_image(&self) -> bool {
        matches!(self, DeviceType::Fx3)
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DeviceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_ascii_lowercase();
        DeviceType::ALL
            .into_iter()
            .find(|t| t.name() == lowered)
            .ok_or_else(|| {
                let names: Vec<&str> = DeviceType::ALL.iter().map(|t| t.name()).collect();
                Error::InvalidSelector(format!(
                    "unknown device type '{}', expected one of: {}",
                    s,
                    names.join(", ")
                ))
            })
    }
}

/// Entry of the known device table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownDevice {
    pub vendor_id: u16,
    pub product_id: u16,
    pub device_type: DeviceType,
    pub name: String,
}

impl KnownDevice {
    pub fn new(vendor_id: u16, product_id: u16, device_type: DeviceType, name: &str) -> Self {
        Self {
            vendor_id,
            product_id,
            device_type,
            name: name.to_string(),
        }
    }

    /// Check a descriptor's VID/PID against this entry
    pub fn matches_ids(&self, vendor_id: u16, product_id: u16) -> bool {
        self.vendor_id == vendor_id && self.product_id == product_id
    }
}

/// Devices recognized without any configuration
pub fn builtin_known_devices() -> Vec<KnownDevice> {
    use DeviceType::*;

    vec![
        KnownDevice::new(0x0547, 0x2122, An21, "Cypress EZ-USB (2122S)"),
        KnownDevice::new(0x0547, 0x2125, An21, "Cypress EZ-USB (2121S/2125S)"),
        KnownDevice::new(0x0547, 0x2126, An21, "Cypress EZ-USB (2126S)"),
        KnownDevice::new(0x0547, 0x2131, An21, "Cypress EZ-USB (2131Q/2131S/2135S)"),
        KnownDevice::new(0x0547, 0x2136, An21, "Cypress EZ-USB (2136S)"),
        KnownDevice::new(0x0547, 0x2225, An21, "Cypress EZ-USB (2225)"),
        KnownDevice::new(0x0547, 0x2226, An21, "Cypress EZ-USB (2226)"),
        KnownDevice::new(0x0547, 0x2235, An21, "Cypress EZ-USB (2235)"),
        KnownDevice::new(0x0547, 0x2236, An21, "Cypress EZ-USB (2236)"),
        KnownDevice::new(0x04b4, 0x6473, Fx, "Cypress EZ-USB FX1"),
        KnownDevice::new(0x04b4, 0x8613, Fx2Lp, "Cypress EZ-USB FX2LP (68013A/68014A/68015A/68016A)"),
        KnownDevice::new(0x04b4, 0x00f3, Fx3, "Cypress FX3"),
    ]
}

/// One attached USB device as seen during a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateDevice {
    pub bus_number: u8,
    pub device_address: u8,
    pub vendor_id: u16,
    pub product_id: u16,
}

/// How the user narrowed down the device to pick
///
/// Only one mode can be active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionCriteria {
    /// First known device found
    #[default]
    Any,
    /// First known device of this type
    Type(DeviceType),
    /// Known device with this VID:PID
    Id { vendor_id: u16, product_id: u16 },
    /// Known device at this bus number and address
    Path { bus_number: u8, device_address: u8 },
}

impl SelectionCriteria {
    /// Parse a `VID:PID` pair, hex with optional `0x` prefix
    pub fn parse_id(s: &str) -> Result<Self> {
        let (vid, pid) = s
            .split_once(':')
            .ok_or_else(|| Error::InvalidSelector(format!("expected VID:PID, got '{}'", s)))?;

        Ok(SelectionCriteria::Id {
            vendor_id: parse_hex_u16(vid)?,
            product_id: parse_hex_u16(pid)?,
        })
    }

    /// Parse a `BUS,ADDR` pair, both decimal
    pub fn parse_path(s: &str) -> Result<Self> {
        let (bus, addr) = s
            .split_once(',')
            .ok_or_else(|| Error::InvalidSelector(format!("expected BUS,ADDR, got '{}'", s)))?;

        let parse = |part: &str, what: &str| {
            part.trim().parse::<u8>().map_err(|_| {
                Error::InvalidSelector(format!("invalid {} '{}' in '{}'", what, part, s))
            })
        };

        Ok(SelectionCriteria::Path {
            bus_number: parse(bus, "bus number")?,
            device_address: parse(addr, "device address")?,
        })
    }

    /// Parse a device type name
    pub fn parse_type(s: &str) -> Result<Self> {
        Ok(SelectionCriteria::Type(s.parse()?))
    }
}

impl fmt::Display for SelectionCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionCriteria::Any => write!(f, "any known device"),
            SelectionCriteria::Type(t) => write!(f, "type {}", t),
            SelectionCriteria::Id {
                vendor_id,
                product_id,
            } => write!(f, "id {:04x}:{:04x}", vendor_id, product_id),
            SelectionCriteria::Path {
                bus_number,
                device_address,
            } => write!(f, "path {},{}", bus_number, device_address),
        }
    }
}

/// Parse a 16-bit hex id, with or without a `0x` prefix
pub fn parse_hex_u16(s: &str) -> Result<u16> {
    let trimmed = s.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.is_empty() || digits.len() > 4 {
        return Err(Error::InvalidSelector(format!(
            "'{}' is not a 1-4 digit hex id",
            s
        )));
    }

    u16::from_str_radix(digits, 16)
        .map_err(|_| Error::InvalidSelector(format!("'{}' is not a valid hex id", s)))
}

/// Resolved identity of the selected device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub vendor_id: u16,
    pub product_id: u16,
    pub bus_number: u8,
    pub device_address: u8,
    pub device_type: DeviceType,
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} device {:04x}:{:04x} at bus {:03} address {:03}",
            self.device_type, self.vendor_id, self.product_id, self.bus_number, self.device_address
        )
    }
}
