//! Device selection
//!
//! Scans attached devices in enumeration order against the known device
//! table and picks the first pair that satisfies the user's criteria.

use common::{CandidateDevice, DeviceIdentity, KnownDevice, SelectionCriteria};
use rusb::{Device, UsbContext};
use std::convert::Infallible;
use std::fmt;
use tracing::{debug, trace, warn};

/// Anything the selector can scan
///
/// Bus number and address are always available; the descriptor read may
/// fail for an individual device.
pub trait Candidate {
    type Error: fmt::Display;

    fn bus_number(&self) -> u8;

    fn device_address(&self) -> u8;

    /// Read `(vendor_id, product_id)` from the device descriptor
    fn read_ids(&self) -> Result<(u16, u16), Self::Error>;
}

impl Candidate for CandidateDevice {
    type Error = Infallible;

    fn bus_number(&self) -> u8 {
        self.bus_number
    }

    fn device_address(&self) -> u8 {
        self.device_address
    }

    fn read_ids(&self) -> Result<(u16, u16), Infallible> {
        Ok((self.vendor_id, self.product_id))
    }
}

impl<T: UsbContext> Candidate for Device<T> {
    type Error = rusb::Error;

    fn bus_number(&self) -> u8 {
        Device::bus_number(self)
    }

    fn device_address(&self) -> u8 {
        self.address()
    }

    fn read_ids(&self) -> Result<(u16, u16), rusb::Error> {
        let descriptor = self.device_descriptor()?;
        Ok((descriptor.vendor_id(), descriptor.product_id()))
    }
}

/// Outcome of a successful scan
#[derive(Debug)]
pub struct Selection<'a, D> {
    /// The attached device that matched, ready to be opened
    pub candidate: &'a D,
    /// Table entry it matched
    pub known: &'a KnownDevice,
    pub identity: DeviceIdentity,
}

/// Pick the first attached device that matches a known entry and the criteria
///
/// Devices are visited in the order given, and for each device the table is
/// visited in order; the first matching pair ends the scan. Devices whose
/// descriptor cannot be read are skipped. Returns `None` when nothing matched.
pub fn select_device<'a, D: Candidate>(
    known_devices: &'a [KnownDevice],
    attached_devices: &'a [D],
    criteria: &SelectionCriteria,
) -> Option<Selection<'a, D>> {
    for candidate in attached_devices {
        if let Some(selection) = match_candidate(known_devices, candidate, criteria) {
            debug!("Selected {} ({})", selection.identity, selection.known.name);
            return Some(selection);
        }
    }

    debug!(
        "No match for {} among {} attached devices",
        criteria,
        attached_devices.len()
    );
    None
}

/// Every attached device matching some known entry under the criteria
///
/// Each device is reported once, against its first matching table entry.
pub fn matching_devices<'a, D: Candidate>(
    known_devices: &'a [KnownDevice],
    attached_devices: &'a [D],
    criteria: &SelectionCriteria,
) -> Vec<Selection<'a, D>> {
    attached_devices
        .iter()
        .filter_map(|candidate| match_candidate(known_devices, candidate, criteria))
        .collect()
}

fn match_candidate<'a, D: Candidate>(
    known_devices: &'a [KnownDevice],
    candidate: &'a D,
    criteria: &SelectionCriteria,
) -> Option<Selection<'a, D>> {
    let bus_number = candidate.bus_number();
    let device_address = candidate.device_address();

    let (vendor_id, product_id) = match candidate.read_ids() {
        Ok(ids) => ids,
        Err(e) => {
            warn!(
                "Skipping device at bus {:03} address {:03}: cannot read descriptor: {}",
                bus_number, device_address, e
            );
            return None;
        }
    };

    trace!(
        "Checking {:04x}:{:04x} at bus {:03} address {:03}",
        vendor_id, product_id, bus_number, device_address
    );

    known_devices
        .iter()
        .filter(|known| known.matches_ids(vendor_id, product_id))
        .find(|known| criteria_accepts(criteria, known, bus_number, device_address))
        .map(|known| Selection {
            candidate,
            known,
            identity: DeviceIdentity {
                vendor_id,
                product_id,
                bus_number,
                device_address,
                device_type: known.device_type,
            },
        })
}

/// Check the criteria for a candidate whose ids already equal `known`'s
pub fn criteria_accepts(
    criteria: &SelectionCriteria,
    known: &KnownDevice,
    bus_number: u8,
    device_address: u8,
) -> bool {
    match *criteria {
        SelectionCriteria::Any => true,
        SelectionCriteria::Type(device_type) => device_type == known.device_type,
        SelectionCriteria::Id {
            vendor_id,
            product_id,
        } => known.matches_ids(vendor_id, product_id),
        SelectionCriteria::Path {
            bus_number: bus,
            device_address: addr,
        } => bus == bus_number && addr == device_address,
    }
}
