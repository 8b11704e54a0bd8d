//! fx-bootstrap loader
//!
//! Finds a Cypress EZ-USB device on the host, opens it and downloads an FX3
//! RAM image into it. The binary in `main.rs` is a thin CLI over this
//! library.

pub mod config;
pub mod programmer;
pub mod usb;

pub use config::LoaderConfig;
pub use programmer::{
    ControlWriter, ProgramOptions, ProgramReport, firmware_already_running, load_image,
    program_device, program_ram,
};
pub use usb::{OpenedDevice, UsbSession, select_device};
