//! USB session
//!
//! Owns the libusb context and the known device table, enumerates attached
//! devices and opens the selected one.

use crate::usb::selector::{matching_devices, select_device};
use common::{DeviceIdentity, Error, KnownDevice, Result, SelectionCriteria};
use rusb::{Context, Device, DeviceHandle, UsbContext};
use tracing::{debug, info, warn};

/// A known device found during listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownMatch {
    pub identity: DeviceIdentity,
    pub name: String,
}

/// Entry point for everything that touches the USB bus
pub struct UsbSession {
    context: Context,
    known_devices: Vec<KnownDevice>,
}

impl UsbSession {
    /// Create a libusb context for the given known device table
    pub fn new(known_devices: Vec<KnownDevice>) -> Result<Self> {
        let context = Context::new()
            .map_err(|e| Error::EnumerationFailed(format!("cannot initialize libusb: {}", e)))?;

        debug!(
            "USB session created with {} known device entries",
            known_devices.len()
        );
        Ok(Self {
            context,
            known_devices,
        })
    }

    pub fn known_devices(&self) -> &[KnownDevice] {
        &self.known_devices
    }

    /// Snapshot of the attached devices in enumeration order
    ///
    /// The libusb device list is released before returning; each `Device`
    /// keeps its own reference.
    fn attached_devices(&self) -> Result<Vec<Device<Context>>> {
        let list = self
            .context
            .devices()
            .map_err(|e| Error::EnumerationFailed(e.to_string()))?;

        let devices: Vec<Device<Context>> = list.iter().collect();
        debug!("Enumerated {} devices", devices.len());
        Ok(devices)
    }

    /// Find the device described by `criteria` and open it
    pub fn find_and_open(&self, criteria: &SelectionCriteria) -> Result<OpenedDevice> {
        let attached = self.attached_devices()?;

        let selection = select_device(&self.known_devices, &attached, criteria)
            .ok_or(Error::NoMatchFound)?;
        let identity = selection.identity;

        info!("Found {} ({})", identity, selection.known.name);

        let handle = selection.candidate.open().map_err(|e| {
            warn!("Failed to open device: {}", e);
            Error::OpenFailed {
                identity,
                reason: e.to_string(),
            }
        })?;

        let product = read_product_string(selection.candidate, &handle);
        if let Some(product) = &product {
            debug!("Product string: {}", product);
        }

        Ok(OpenedDevice {
            handle,
            identity,
            product,
        })
    }

    /// List every attached device that matches a known table entry
    pub fn list_known(&self) -> Result<Vec<KnownMatch>> {
        let attached = self.attached_devices()?;

        Ok(
            matching_devices(&self.known_devices, &attached, &SelectionCriteria::Any)
                .into_iter()
                .map(|selection| KnownMatch {
                    identity: selection.identity,
                    name: selection.known.name.clone(),
                })
                .collect(),
        )
    }
}

fn read_product_string<T: UsbContext>(device: &Device<T>, handle: &DeviceHandle<T>) -> Option<String> {
    let descriptor = device.device_descriptor().ok()?;
    handle.read_product_string_ascii(&descriptor).ok()
}

/// An opened device
///
/// The handle is closed when this value is dropped.
pub struct OpenedDevice {
    handle: DeviceHandle<Context>,
    identity: DeviceIdentity,
    product: Option<String>,
}

impl OpenedDevice {
    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// Product string descriptor, if the device has one
    pub fn product(&self) -> Option<&str> {
        self.product.as_deref()
    }

    pub fn handle_mut(&mut self) -> &mut DeviceHandle<Context> {
        &mut self.handle
    }

    /// Reset the device
    ///
    /// Firmware that re-enumerates will show up under a new address.
    pub fn reset(&mut self) -> Result<()> {
        self.handle
            .reset()
            .map_err(|e| Error::Usb(format!("reset of {} failed: {}", self.identity, e)))?;
        debug!("Reset {}", self.identity);
        Ok(())
    }
}

impl Drop for OpenedDevice {
    fn drop(&mut self) {
        debug!("Closing {}", self.identity);
    }
}
