//! Logging setup and configuration
//!
//! Events go to stderr so that listing output on stdout stays clean.

use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Crates whose events follow the requested level; dependencies stay at `warn`
const WORKSPACE_CRATES: &[&str] = &["common", "firmware", "loader", "fx_bootstrap"];

/// Build the filter directives for a bare level such as `debug`
pub fn filter_directives(level: &str) -> crate::Result<String> {
    let level: Level = level
        .parse()
        .map_err(|_| crate::Error::Config(format!("Invalid log level: {}", level)))?;
    let level = level.as_str().to_lowercase();

    let mut directives = String::from("warn");
    for name in WORKSPACE_CRATES {
        directives.push_str(&format!(",{}={}", name, level));
    }
    Ok(directives)
}

/// Setup tracing subscriber for the application
///
/// `RUST_LOG` takes precedence over `default_level` when set.
pub fn setup_logging(default_level: &str) -> crate::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(filter_directives(default_level)?)
            .map_err(|e| crate::Error::Config(format!("Invalid log filter: {}", e)))?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .map_err(|e| crate::Error::Config(format!("Logging already initialized: {}", e)))
}
