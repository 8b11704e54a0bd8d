//! Test utilities for fx-bootstrap
//!
//! Provides mock candidates and known device tables for testing across crates.
//!
//! # Example
//!
//! ```
//! use common::test_utils::{create_mock_candidate, mock_known_table};
//!
//! let candidate = create_mock_candidate(1, 2, 0x04b4, 0x8613);
//! assert_eq!(candidate.vendor_id, 0x04b4);
//! assert_eq!(mock_known_table().len(), 3);
//! ```

use crate::usb_types::{CandidateDevice, DeviceType, KnownDevice};

pub const FX2LP_VID: u16 = 0x04b4;
pub const FX2LP_PID: u16 = 0x8613;
pub const FX3_VID: u16 = 0x04b4;
pub const FX3_PID: u16 = 0x00f3;
pub const AN21_VID: u16 = 0x0547;
pub const AN21_PID: u16 = 0x2131;

/// Create a mock CandidateDevice for testing
///
/// # Arguments
/// * `bus_number` - USB bus number
/// * `device_address` - Address on that bus
/// * `vendor_id` - USB Vendor ID
/// * `product_id` - USB Product ID
pub fn create_mock_candidate(
    bus_number: u8,
    device_address: u8,
    vendor_id: u16,
    product_id: u16,
) -> CandidateDevice {
    CandidateDevice {
        bus_number,
        device_address,
        vendor_id,
        product_id,
    }
}

/// Small known table: one FX2LP, one FX3 and one AN21 entry, in that order
pub fn mock_known_table() -> Vec<KnownDevice> {
    vec![
        KnownDevice::new(FX2LP_VID, FX2LP_PID, DeviceType::Fx2Lp, "Test FX2LP"),
        KnownDevice::new(FX3_VID, FX3_PID, DeviceType::Fx3, "Test FX3"),
        KnownDevice::new(AN21_VID, AN21_PID, DeviceType::An21, "Test AN21"),
    ]
}

/// Create a list of attached devices with consecutive addresses on bus 1
///
/// # Example
/// ```
/// use common::test_utils::create_mock_bus;
///
/// let bus = create_mock_bus(&[(0x1d6b, 0x0002), (0x04b4, 0x8613)]);
/// assert_eq!(bus[1].device_address, 2);
/// ```
pub fn create_mock_bus(ids: &[(u16, u16)]) -> Vec<CandidateDevice> {
    ids.iter()
        .enumerate()
        .map(|(i, (vid, pid))| create_mock_candidate(1, (i + 1) as u8, *vid, *pid))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_mock_candidate() {
        let candidate = create_mock_candidate(3, 7, 0x1234, 0x5678);
        assert_eq!(candidate.bus_number, 3);
        assert_eq!(candidate.device_address, 7);
        assert_eq!(candidate.vendor_id, 0x1234);
        assert_eq!(candidate.product_id, 0x5678);
    }

    #[test]
    fn test_create_mock_bus_addresses() {
        let bus = create_mock_bus(&[(1, 1), (2, 2), (3, 3)]);
        let addresses: Vec<u8> = bus.iter().map(|c| c.device_address).collect();
        assert_eq!(addresses, vec![1, 2, 3]);
        assert!(bus.iter().all(|c| c.bus_number == 1));
    }
}
