//! Configuration types and management
//!
//! Defines which device interfaces are scanned, how far layout queries may grow,
//! and how results are rendered. Values come from defaults, an optional TOML
//! file, and finally the command line.

use crate::error::{FindfsError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest accepted `max_partition_entries`
pub const MAX_PARTITION_ENTRIES_LIMIT: usize = 4096;

/// Device interface class to enumerate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    /// Disk drives (`GUID_DEVINTERFACE_DISK`)
    #[default]
    Disk,
    /// Volumes (`GUID_DEVINTERFACE_VOLUME`)
    Volume,
}

impl DeviceClass {
    /// Device interface class GUID, as its numeric value
    pub fn interface_guid(&self) -> u128 {
        match self {
            Self::Disk => 0x53f56307_b6bf_11d0_94f2_00a0c91efb8b,
            Self::Volume => 0x53f5630d_b6bf_11d0_94f2_00a0c91efb8b,
        }
    }
}

impl std::fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disk => write!(f, "disk"),
            Self::Volume => write!(f, "volume"),
        }
    }
}

/// Rendering of `--list` output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ListFormat {
    /// findfs-style lines
    #[default]
    Text,
    /// JSON array of devices
    Json,
}

/// Resolver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device interface class to enumerate
    pub device_class: DeviceClass,

    /// Upper bound on partition entries a layout query may grow to
    pub max_partition_entries: usize,

    /// Report only the physical drive for partition matches
    pub bare: bool,

    /// Output format for listings
    pub list_format: ListFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device_class: DeviceClass::default(),
            max_partition_entries: 256,
            bare: false,
            list_format: ListFormat::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| FindfsError::config(e.to_string()))
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_PARTITION_ENTRIES_LIMIT).contains(&self.max_partition_entries) {
            return Err(FindfsError::config(format!(
                "max_partition_entries must be between 1 and {}, got {}",
                MAX_PARTITION_ENTRIES_LIMIT, self.max_partition_entries
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.device_class, DeviceClass::Disk);
        assert!(!config.bare);
    }

    #[test]
    fn test_config_from_toml() {
        let config = Config::from_toml(
            r#"
            device_class = "volume"
            max_partition_entries = 128
            bare = true
            "#,
        )
        .unwrap();
        assert_eq!(config.device_class, DeviceClass::Volume);
        assert_eq!(config.max_partition_entries, 128);
        assert!(config.bare);
        assert_eq!(config.list_format, ListFormat::Text);
    }

    #[test]
    fn test_config_rejects_unknown_class() {
        let result = Config::from_toml(r#"device_class = "cdrom""#);
        assert!(matches!(result, Err(FindfsError::ConfigError(_))));
    }

    #[test]
    fn test_config_validation_entry_bounds() {
        let mut config = Config::default();
        config.max_partition_entries = 0;
        assert!(config.validate().is_err());

        config.max_partition_entries = MAX_PARTITION_ENTRIES_LIMIT + 1;
        assert!(config.validate().is_err());

        config.max_partition_entries = MAX_PARTITION_ENTRIES_LIMIT;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_interface_guids() {
        assert_eq!(
            crate::guid::Guid::from_u128(DeviceClass::Disk.interface_guid()).to_string(),
            "53f56307-b6bf-11d0-94f2-00a0c91efb8b"
        );
        assert_eq!(DeviceClass::Volume.to_string(), "volume");
    }
}
