//! Embedded configuration loading

use defmt::*;

use tambor_core::config::{parse_config, WasherConfig};

/// Embedded configuration (compiled into firmware)
/// Edit washer.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../washer.toml");

/// Parse the embedded configuration, falling back to stock values
pub fn load() -> WasherConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!("Loaded embedded washer.toml");
            config
        }
        Err(e) => {
            error!("Failed to parse embedded config: {:?}, using defaults", e);
            WasherConfig::default()
        }
    }
}
