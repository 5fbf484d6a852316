//! Race and resolution configuration
//!
//! [`RaceConfig`] carries the timing knobs of the CDN race, the Swagger UI
//! versions substituted into path templates, and where the race result is
//! cached on disk. Every field has a default matching the behaviour of the
//! public CDNs in the built-in catalog.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Default product name, used for the cache directory
pub const DEFAULT_PRODUCT_NAME: &str = "docs-cdn-host";

/// Major Swagger UI version used by `@`-style templates (unpkg, jsdelivr)
pub const DEFAULT_SWAGGER_UI_VERSION: &str = "5";

/// Full Swagger UI version used by numbered-path templates (cdnjs, staticfile)
pub const DEFAULT_SWAGGER_UI_FULL_VERSION: &str = "5.17.14";

/// Configuration for the CDN race and its on-disk cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceConfig {
    /// Polling interval of the fastest-host race
    pub fastest_interval: Duration,
    /// Deadline of the fastest-host race
    pub fastest_timeout: Duration,
    /// Polling interval of bulk probes
    pub probe_interval: Duration,
    /// Deadline of bulk probes
    pub probe_timeout: Duration,
    /// Version substituted into `@`-style templates
    pub swagger_ui_version: String,
    /// Version substituted into numbered-path templates
    pub swagger_ui_full_version: String,
    /// Name of the cache subdirectory
    pub product_name: String,
    /// Explicit cache file, bypassing the platform cache directory
    pub cache_file: Option<PathBuf>,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            fastest_interval: Duration::from_millis(100),
            fastest_timeout: Duration::from_secs(5),
            probe_interval: Duration::from_millis(800),
            probe_timeout: Duration::from_secs(3),
            swagger_ui_version: DEFAULT_SWAGGER_UI_VERSION.to_string(),
            swagger_ui_full_version: DEFAULT_SWAGGER_UI_FULL_VERSION.to_string(),
            product_name: DEFAULT_PRODUCT_NAME.to_string(),
            cache_file: None,
        }
    }
}

impl RaceConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set polling interval and deadline of the fastest-host race
    pub fn with_fastest_timing(mut self, interval: Duration, timeout: Duration) -> Self {
        self.fastest_interval = interval;
        self.fastest_timeout = timeout;
        self
    }

    /// Set polling interval and deadline of bulk probes
    pub fn with_probe_timing(mut self, interval: Duration, timeout: Duration) -> Self {
        self.probe_interval = interval;
        self.probe_timeout = timeout;
        self
    }

    /// Set the Swagger UI versions substituted into templates
    pub fn with_swagger_ui_versions(
        mut self,
        major: impl Into<String>,
        full: impl Into<String>,
    ) -> Self {
        self.swagger_ui_version = major.into();
        self.swagger_ui_full_version = full.into();
        self
    }

    /// Set the product name used for the cache directory
    pub fn with_product_name(mut self, name: impl Into<String>) -> Self {
        self.product_name = name.into();
        self
    }

    /// Pin the cache file to an explicit path
    pub fn with_cache_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_file = Some(path.into());
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.fastest_interval.is_zero() || self.probe_interval.is_zero() {
            return Err(Error::invalid_config("polling intervals must be non-zero"));
        }
        if self.fastest_timeout < self.fastest_interval {
            return Err(Error::invalid_config(
                "fastest_timeout must not be shorter than fastest_interval",
            ));
        }
        if self.probe_timeout < self.probe_interval {
            return Err(Error::invalid_config(
                "probe_timeout must not be shorter than probe_interval",
            ));
        }
        if self.swagger_ui_version.is_empty() || self.swagger_ui_full_version.is_empty() {
            return Err(Error::invalid_config("Swagger UI versions must not be empty"));
        }
        if self.product_name.is_empty() || self.product_name.contains(['/', '\\']) {
            return Err(Error::invalid_config(
                "product_name must be a single non-empty path component",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RaceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fastest_interval, Duration::from_millis(100));
        assert_eq!(config.probe_timeout, Duration::from_secs(3));
        assert_eq!(config.swagger_ui_full_version, "5.17.14");
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = RaceConfig::new().with_probe_timing(Duration::ZERO, Duration::from_secs(1));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_product_name_with_separator_rejected() {
        let config = RaceConfig::new().with_product_name("a/b");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RaceConfig =
            serde_json::from_str(r#"{"product_name": "my-docs"}"#).unwrap();
        assert_eq!(config.product_name, "my-docs");
        assert_eq!(config.swagger_ui_version, "5");
        assert!(config.cache_file.is_none());
    }
}
