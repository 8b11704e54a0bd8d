//! fx-bootstrap
//!
//! Finds a Cypress EZ-USB device, opens it and downloads an FX3 RAM image.

use anyhow::{Context, Result};
use clap::Parser;
use common::{DeviceType, SelectionCriteria, setup_logging};
use loader::config::{LoaderConfig, expand_path};
use loader::programmer::{firmware_already_running, load_image, program_device};
use loader::usb::UsbSession;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "fx-bootstrap")]
#[command(
    author,
    version,
    about = "Find a Cypress EZ-USB device and load firmware into its RAM"
)]
#[command(long_about = "
Scans the USB bus for a known Cypress EZ-USB device, opens it and, when an
image is given, downloads an FX3 RAM image and starts it.

Without a selector the first known device found is used. At most one of
--type, --device and --path may be given.

EXAMPLES:
    # List attached known devices
    fx-bootstrap --list

    # Load firmware into the first FX3 found
    fx-bootstrap --type fx3 --image fw/fx3lafw.img

    # Load firmware into the device at bus 1, address 12
    fx-bootstrap --path 1,12 --image fw/fx3lafw.img

    # Select by VID:PID and reset afterwards
    fx-bootstrap --device 04b4:00f3 --image fw/fx3lafw.img --reset

CONFIGURATION:
    The loader looks for configuration files in the following order:
    1. Path specified with --config
    2. ~/.config/fx-bootstrap/loader.toml
    3. /etc/fx-bootstrap/loader.toml
    4. Built-in defaults
")]
struct Args {
    /// Select the first known device of this type (an21, fx, fx2, fx2lp, fx3)
    #[arg(short = 't', long = "type", value_name = "TYPE", value_parser = parse_type, conflicts_with_all = ["device", "path"])]
    device_type: Option<DeviceType>,

    /// Select the known device with this VID:PID (hex)
    #[arg(short, long, value_name = "VID:PID", value_parser = parse_id, conflicts_with = "path")]
    device: Option<SelectionCriteria>,

    /// Select the known device at BUS,ADDR (decimal)
    #[arg(short, long, value_name = "BUS,ADDR", value_parser = parse_path)]
    path: Option<SelectionCriteria>,

    /// FX3 firmware image to load
    #[arg(short, long, value_name = "PATH")]
    image: Option<String>,

    /// Reset the device after starting the firmware
    #[arg(long)]
    reset: bool,

    /// Skip the download when the device already reports this product string
    #[arg(long, value_name = "NAME")]
    skip_if_product: Option<String>,

    /// List attached known devices and exit
    #[arg(long)]
    list: bool,

    /// Path to configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Save default configuration to default location and exit
    #[arg(long)]
    save_config: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,
}

impl Args {
    fn criteria(&self) -> SelectionCriteria {
        if let Some(device_type) = self.device_type {
            SelectionCriteria::Type(device_type)
        } else if let Some(criteria) = self.device.or(self.path) {
            criteria
        } else {
            SelectionCriteria::Any
        }
    }
}

fn parse_type(s: &str) -> std::result::Result<DeviceType, String> {
    s.parse().map_err(|e: common::Error| e.to_string())
}

fn parse_id(s: &str) -> std::result::Result<SelectionCriteria, String> {
    SelectionCriteria::parse_id(s).map_err(|e| e.to_string())
}

fn parse_path(s: &str) -> std::result::Result<SelectionCriteria, String> {
    SelectionCriteria::parse_path(s).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Handle --save-config flag early (before loading config)
    if args.save_config {
        let config = LoaderConfig::default();
        let path = LoaderConfig::default_path();
        config.save(&path).context("Failed to save configuration")?;
        println!("Configuration saved to: {}", path.display());
        return Ok(());
    }

    let config = if let Some(ref path) = args.config {
        LoaderConfig::load(Some(path.clone())).context("Failed to load configuration")?
    } else {
        LoaderConfig::load_or_default()
    };

    let log_level = args
        .log_level
        .as_deref()
        .unwrap_or(&config.loader.log_level);
    setup_logging(log_level).context("Failed to setup logging")?;

    debug!("fx-bootstrap v{}", env!("CARGO_PKG_VERSION"));

    let known_devices = config
        .known_devices()
        .context("Invalid known device table")?;
    let session = UsbSession::new(known_devices).context("Failed to initialize USB")?;

    if args.list {
        return list_devices_mode(&session);
    }

    let criteria = args.criteria();
    info!("Looking for {}", criteria);

    let mut device = session
        .find_and_open(&criteria)
        .context("Device selection failed")?;

    let image_path = args
        .image
        .as_deref()
        .map(expand_path)
        .or_else(|| config.default_image());

    let Some(image_path) = image_path else {
        println!(
            "Selected {}{}",
            device.identity(),
            device
                .product()
                .map(|p| format!(" \"{}\"", p))
                .unwrap_or_default()
        );
        return Ok(());
    };

    let skip_if_product = args
        .skip_if_product
        .as_deref()
        .or(config.loader.skip_if_product.as_deref());
    if firmware_already_running(device.product(), skip_if_product) {
        info!("{} already runs the requested firmware", device.identity());
        println!("Firmware already running on {}", device.identity());
        return Ok(());
    }

    let image = load_image(&image_path)
        .with_context(|| format!("Failed to load image: {}", image_path.display()))?;
    let report = program_device(&mut device, &image, &config.program_options())
        .with_context(|| format!("Failed to program {}", device.identity()))?;

    info!(
        "Loaded {} bytes in {} sections ({} requests), started at {:#010x}",
        report.bytes, report.sections, report.requests, report.entry_address
    );

    if args.reset || config.loader.reset_after_upload {
        device.reset().context("Failed to reset device")?;
    }

    Ok(())
}

/// List attached known devices and exit
fn list_devices_mode(session: &UsbSession) -> Result<()> {
    let devices = session.list_known().context("Failed to list devices")?;

    if devices.is_empty() {
        println!("No known devices found.");
    } else {
        println!("Found {} known device(s):\n", devices.len());
        for device in devices {
            let identity = device.identity;
            println!(
                "  {:04x}:{:04x} [{}] - {}",
                identity.vendor_id, identity.product_id, identity.device_type, device.name
            );
            println!(
                "      Bus {:03} Device {:03}",
                identity.bus_number, identity.device_address
            );
        }
    }

    Ok(())
}
