//! Integration tests for configuration loading
//!
//! Tests loader configuration files, including:
//! - Minimal and full configurations
//! - Known device table extension and replacement
//! - Invalid configuration handling
//! - Save and reload

use common::DeviceType;
use loader::LoaderConfig;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

const FULL_CONFIG: &str = r#"
[loader]
log_level = "debug"
transfer_timeout_ms = 2500
settle_delay_ms = 200
reset_after_upload = true
default_image = "/opt/fw/fx3lafw.img"
skip_if_product = "fx3lafw"

[devices]
replace_builtin = false

[[devices.known]]
vendor_id = "0x04b4"
product_id = "0x00f1"
type = "fx3"
name = "Custom FX3 board"

[[devices.known]]
vendor_id = "0x1d50"
product_id = "0x608c"
type = "fx2lp"
"#;

fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("loader.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_full_config() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, FULL_CONFIG);

    let config = LoaderConfig::load(Some(path)).unwrap();

    assert_eq!(config.loader.log_level, "debug");
    assert!(config.loader.reset_after_upload);
    assert_eq!(config.loader.skip_if_product.as_deref(), Some("fx3lafw"));
    assert_eq!(
        config.default_image(),
        Some(std::path::PathBuf::from("/opt/fw/fx3lafw.img"))
    );

    let options = config.program_options();
    assert_eq!(options.timeout, Duration::from_millis(2500));
    assert_eq!(options.settle_delay, Duration::from_millis(200));

    let table = config.known_devices().unwrap();
    assert_eq!(table[0].name, "Custom FX3 board");
    assert_eq!(table[0].device_type, DeviceType::Fx3);
    assert_eq!(table[1].name, "1d50:608c");
    assert_eq!(table[1].device_type, DeviceType::Fx2Lp);
    assert_eq!(table.len(), common::builtin_known_devices().len() + 2);
}

#[test]
fn test_empty_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");

    let config = LoaderConfig::load(Some(path)).unwrap();

    assert_eq!(config.loader.log_level, "info");
    assert_eq!(config.loader.transfer_timeout_ms, 1000);
    assert!(config.default_image().is_none());
    assert!(config.loader.skip_if_product.is_none());
    assert_eq!(
        config.known_devices().unwrap(),
        common::builtin_known_devices()
    );
}

#[test]
fn test_replace_builtin_table() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[devices]
replace_builtin = true

[[devices.known]]
vendor_id = "0x1234"
product_id = "0x5678"
type = "fx2"
"#,
    );

    let config = LoaderConfig::load(Some(path)).unwrap();
    let table = config.known_devices().unwrap();

    assert_eq!(table.len(), 1);
    assert!(table[0].matches_ids(0x1234, 0x5678));
}

#[test]
fn test_invalid_log_level_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[loader]\nlog_level = \"loud\"\n");

    assert!(LoaderConfig::load(Some(path)).is_err());
}

#[test]
fn test_unknown_device_type_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[[devices.known]]
vendor_id = "0x04b4"
product_id = "0x00f3"
type = "fx9"
"#,
    );

    assert!(LoaderConfig::load(Some(path)).is_err());
}

#[test]
fn test_unprefixed_id_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[[devices.known]]
vendor_id = "04b4"
product_id = "0x00f3"
type = "fx3"
"#,
    );

    let err = LoaderConfig::load(Some(path)).unwrap_err();
    assert!(format!("{:#}", err).contains("must start with '0x'"));
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("does-not-exist.toml");

    assert!(LoaderConfig::load(Some(path)).is_err());
}

#[test]
fn test_save_and_reload() {
    let dir = TempDir::new().unwrap();
    let original = LoaderConfig::load(Some(write_config(&dir, FULL_CONFIG))).unwrap();

    let saved_path = dir.path().join("nested").join("saved.toml");
    original.save(&saved_path).unwrap();
    let reloaded = LoaderConfig::load(Some(saved_path)).unwrap();

    assert_eq!(reloaded.loader.log_level, original.loader.log_level);
    assert_eq!(reloaded.loader.default_image, original.loader.default_image);
    assert_eq!(
        reloaded.loader.skip_if_product,
        original.loader.skip_if_product
    );
    assert_eq!(reloaded.devices.known, original.devices.known);
    assert_eq!(
        reloaded.known_devices().unwrap(),
        original.known_devices().unwrap()
    );
}
