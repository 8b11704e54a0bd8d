//! Loader configuration management

use crate::programmer::{DEFAULT_SETTLE_DELAY, DEFAULT_TIMEOUT, ProgramOptions};
use anyhow::{Context, Result, anyhow};
use common::usb_types::parse_hex_u16;
use common::{DeviceType, KnownDevice, builtin_known_devices};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoaderConfig {
    #[serde(default)]
    pub loader: LoaderSettings,
    /// Known device table overrides
    #[serde(default)]
    pub devices: DeviceSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderSettings {
    #[serde(default = "LoaderSettings::default_log_level")]
    pub log_level: String,
    /// Timeout for each control request in milliseconds
    #[serde(default = "LoaderSettings::default_transfer_timeout_ms")]
    pub transfer_timeout_ms: u64,
    /// Pause between the download and the jump to the entry point
    #[serde(default = "LoaderSettings::default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Reset the device after starting the firmware
    #[serde(default)]
    pub reset_after_upload: bool,
    /// Image used when none is given on the command line (`~` is expanded)
    #[serde(default)]
    pub default_image: Option<String>,
    /// Leave the device alone when it already reports this product string
    #[serde(default)]
    pub skip_if_product: Option<String>,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
            transfer_timeout_ms: Self::default_transfer_timeout_ms(),
            settle_delay_ms: Self::default_settle_delay_ms(),
            reset_after_upload: false,
            default_image: None,
            skip_if_product: None,
        }
    }
}

impl LoaderSettings {
    fn default_log_level() -> String {
        "info".to_string()
    }

    fn default_transfer_timeout_ms() -> u64 {
        DEFAULT_TIMEOUT.as_millis() as u64
    }

    fn default_settle_delay_ms() -> u64 {
        DEFAULT_SETTLE_DELAY.as_millis() as u64
    }
}

/// Known device table configuration
///
/// # Example Configuration
/// ```toml
/// [devices]
/// replace_builtin = false
///
/// [[devices.known]]
/// vendor_id = "0x04b4"
/// product_id = "0x00f1"
/// type = "fx3"
/// name = "Custom FX3 board"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DeviceSettings {
    /// Use only the entries below instead of adding them to the built-in table
    #[serde(default)]
    pub replace_builtin: bool,
    #[serde(default)]
    pub known: Vec<KnownDeviceEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KnownDeviceEntry {
    /// Vendor ID, hex with `0x` prefix
    pub vendor_id: String,
    /// Product ID, hex with `0x` prefix
    pub product_id: String,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    #[serde(default)]
    pub name: Option<String>,
}

impl KnownDeviceEntry {
    fn to_known_device(&self) -> Result<KnownDevice> {
        let vendor_id = parse_config_id(&self.vendor_id, "vendor_id")?;
        let product_id = parse_config_id(&self.product_id, "product_id")?;
        let name = self
            .name
            .clone()
            .unwrap_or_else(|| format!("{:04x}:{:04x}", vendor_id, product_id));

        Ok(KnownDevice::new(vendor_id, product_id, self.device_type, &name))
    }
}

impl LoaderConfig {
    /// Load configuration from the specified path
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p
        } else {
            // Try standard locations in order
            let candidates = vec![
                Self::default_path(),
                PathBuf::from("/etc/fx-bootstrap/loader.toml"),
            ];

            candidates
                .into_iter()
                .find(|p| p.exists())
                .ok_or_else(|| anyhow!("No configuration file found, using defaults"))?
        };

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: LoaderConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        config.validate()?;

        tracing::info!("Loaded configuration from: {}", config_path.display());
        Ok(config)
    }

    /// Load configuration or return defaults if not found
    pub fn load_or_default() -> Self {
        match Self::load(None) {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!("Failed to load config: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Save configuration to the specified path
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!("Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("fx-bootstrap").join("loader.toml")
        } else {
            PathBuf::from(".config/fx-bootstrap/loader.toml")
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.loader.log_level.as_str()) {
            return Err(anyhow!(
                "Invalid log level '{}', must be one of: {}",
                self.loader.log_level,
                valid_levels.join(", ")
            ));
        }

        if self.loader.transfer_timeout_ms == 0 {
            return Err(anyhow!("transfer_timeout_ms must be greater than 0"));
        }

        if self.devices.replace_builtin && self.devices.known.is_empty() {
            return Err(anyhow!(
                "replace_builtin is set but no [[devices.known]] entries are given"
            ));
        }

        for entry in &self.devices.known {
            entry.to_known_device()?;
        }

        Ok(())
    }

    /// Known device table to scan against
    ///
    /// Configured entries come first so they take precedence over built-in
    /// entries with the same ids.
    pub fn known_devices(&self) -> Result<Vec<KnownDevice>> {
        let mut table = self
            .devices
            .known
            .iter()
            .map(KnownDeviceEntry::to_known_device)
            .collect::<Result<Vec<_>>>()?;

        if !self.devices.replace_builtin {
            table.extend(builtin_known_devices());
        }

        Ok(table)
    }

    pub fn program_options(&self) -> ProgramOptions {
        ProgramOptions {
            timeout: Duration::from_millis(self.loader.transfer_timeout_ms),
            settle_delay: Duration::from_millis(self.loader.settle_delay_ms),
        }
    }

    /// Configured default image with `~` expanded
    pub fn default_image(&self) -> Option<PathBuf> {
        self.loader.default_image.as_deref().map(expand_path)
    }
}

/// Expand a leading `~` in a user supplied path
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Parse a `0x`-prefixed VID or PID from the config file
fn parse_config_id(id: &str, name: &str) -> Result<u16> {
    if !id.starts_with("0x") && !id.starts_with("0X") {
        return Err(anyhow!(
            "Invalid {} '{}', must start with '0x' (e.g., '0x04b4')",
            name,
            id
        ));
    }

    parse_hex_u16(id).with_context(|| format!("Invalid {}", name))
}
