//! FX3 RAM programming
//!
//! Downloads an [`Fx3Image`] through the boot loader's vendor request and
//! jumps to the image entry point.

use crate::usb::OpenedDevice;
use common::{Error, Result};
use firmware::Fx3Image;
use rusb::{DeviceHandle, Direction, Recipient, RequestType, UsbContext};
use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// Boot loader vendor request for RAM reads/writes
pub const FX3_REQUEST_RAM: u8 = 0xa0;

/// Largest payload sent in one control request
pub const MAX_CHUNK_LEN: usize = 4096;

/// Default timeout for each control request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Default pause between the download and the jump
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Sink for OUT control requests
pub trait ControlWriter {
    /// Send one OUT control request and return how many bytes were accepted
    fn control_out(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
        timeout: Duration,
    ) -> std::result::Result<usize, rusb::Error>;
}

impl<T: UsbContext> ControlWriter for DeviceHandle<T> {
    fn control_out(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
        timeout: Duration,
    ) -> std::result::Result<usize, rusb::Error> {
        self.write_control(request_type, request, value, index, data, timeout)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramOptions {
    pub timeout: Duration,
    pub settle_delay: Duration,
}

impl Default for ProgramOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

/// Summary of a completed download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgramReport {
    pub sections: usize,
    pub bytes: usize,
    pub requests: usize,
    pub entry_address: u32,
}

/// Read and validate an image file
pub fn load_image(path: &Path) -> Result<Fx3Image> {
    let bytes = fs::read(path)?;
    let image = Fx3Image::parse(&bytes)?;

    debug!(
        "Image {}: {} sections, entry {:#010x}, checksum {:#010x}",
        path.display(),
        image.sections.len(),
        image.entry_address,
        image.checksum
    );
    Ok(image)
}

/// Whether the device already runs the wanted firmware
///
/// True only when a product name to skip is configured and the device
/// reports exactly that product string.
pub fn firmware_already_running(product: Option<&str>, skip_if_product: Option<&str>) -> bool {
    match (product, skip_if_product) {
        (Some(product), Some(skip)) => !skip.is_empty() && product.trim_end() == skip,
        _ => false,
    }
}

/// Program an opened device, refusing device types without RAM image support
pub fn program_device(
    device: &mut OpenedDevice,
    image: &Fx3Image,
    options: &ProgramOptions,
) -> Result<ProgramReport> {
    let device_type = device.identity().device_type;
    if !device_type.supports_ram_image() {
        return Err(Error::UnsupportedDevice(device_type));
    }

    info!("Programming {}", device.identity());
    program_ram(device.handle_mut(), image, options)
}

/// Download every section of `image`, then start it
pub fn program_ram<W: ControlWriter>(
    writer: &mut W,
    image: &Fx3Image,
    options: &ProgramOptions,
) -> Result<ProgramReport> {
    let mut report = ProgramReport {
        entry_address: image.entry_address,
        ..ProgramReport::default()
    };

    info!(
        "Transferring {} bytes in {} sections",
        image.payload_len(),
        image.sections.len()
    );

    for section in &image.sections {
        debug!(
            "Section at {:#010x}, {} bytes",
            section.address,
            section.data.len()
        );
        report.requests += download(writer, section.address, &section.data, options.timeout)?;
        report.bytes += section.data.len();
        report.sections += 1;
    }

    if !options.settle_delay.is_zero() {
        thread::sleep(options.settle_delay);
    }

    info!("Starting firmware at {:#010x}", image.entry_address);
    write_ram(writer, image.entry_address, &[], options.timeout)?;
    report.requests += 1;

    Ok(report)
}

/// Write `data` starting at `address`, in chunks the device will take
///
/// Returns the number of requests issued.
fn download<W: ControlWriter>(
    writer: &mut W,
    mut address: u32,
    data: &[u8],
    timeout: Duration,
) -> Result<usize> {
    let mut offset = 0;
    let mut requests = 0;

    while offset < data.len() {
        let end = (offset + MAX_CHUNK_LEN).min(data.len());
        let written = write_ram(writer, address, &data[offset..end], timeout)?;
        requests += 1;

        if written == 0 {
            return Err(Error::ShortWrite { address, offset });
        }

        address = address.wrapping_add(written as u32);
        offset += written;
    }

    Ok(requests)
}

fn write_ram<W: ControlWriter>(
    writer: &mut W,
    address: u32,
    data: &[u8],
    timeout: Duration,
) -> Result<usize> {
    let request_type = rusb::request_type(Direction::Out, RequestType::Vendor, Recipient::Device);
    let (value, index) = split_address(address);

    writer
        .control_out(request_type, FX3_REQUEST_RAM, value, index, data, timeout)
        .map_err(|e| {
            Error::Usb(format!(
                "RAM write of {} bytes at {:#010x} failed: {}",
                data.len(),
                address,
                e
            ))
        })
}

/// Split a 32-bit RAM address into `(wValue, wIndex)`
pub fn split_address(address: u32) -> (u16, u16) {
    ((address & 0xffff) as u16, (address >> 16) as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_address() {
        assert_eq!(split_address(0x4000_1234), (0x1234, 0x4000));
        assert_eq!(split_address(0), (0, 0));
        assert_eq!(split_address(0xffff_ffff), (0xffff, 0xffff));
    }

    #[test]
    fn test_vendor_out_request_type() {
        assert_eq!(
            rusb::request_type(Direction::Out, RequestType::Vendor, Recipient::Device),
            0x40
        );
    }

    #[test]
    fn test_firmware_already_running() {
        assert!(firmware_already_running(Some("fx3lafw"), Some("fx3lafw")));
        assert!(firmware_already_running(Some("fx3lafw "), Some("fx3lafw")));

        assert!(!firmware_already_running(Some("WestBridge"), Some("fx3lafw")));
        assert!(!firmware_already_running(None, Some("fx3lafw")));
        assert!(!firmware_already_running(Some("fx3lafw"), None));
        assert!(!firmware_already_running(Some(""), Some("")));
    }

    #[test]
    fn test_default_options() {
        let options = ProgramOptions::default();
        assert_eq!(options.timeout, Duration::from_secs(1));
        assert_eq!(options.settle_delay, Duration::from_secs(1));
    }
}
