//! Installation configuration

use crate::error::ConfigError;
use crate::host::ImageSize;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Taxonomy images configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TaxonomyImagesConfig {
    /// Host-wide debug flag; gates diagnostics
    pub debug: bool,
    /// Use term meta when the host supports it
    pub term_meta_enabled: bool,
    /// Mirror term meta writes into the legacy table
    pub bridge_enabled: bool,
    /// Option key of the legacy association table
    pub legacy_option_key: String,
    /// Option key of the settings record
    pub settings_option_key: String,
    /// Admin preview size
    pub detail_size: ImageSize,
    /// Base URL of bundled assets
    pub plugin_url: String,
    /// Admin placeholder, relative to `plugin_url`
    pub default_image: String,
    /// Public placeholder, relative to `plugin_url`
    pub blank_image: String,
    /// Anti-replay token lifetime in seconds
    pub token_lifetime_secs: u64,
}

impl TaxonomyImagesConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With debug diagnostics
    #[inline]
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// With term meta opt-out
    #[inline]
    #[must_use]
    pub fn with_term_meta(mut self, enabled: bool) -> Self {
        self.term_meta_enabled = enabled;
        self
    }

    /// With bridge opt-out
    #[inline]
    #[must_use]
    pub fn with_bridge(mut self, enabled: bool) -> Self {
        self.bridge_enabled = enabled;
        self
    }

    /// With asset base URL
    #[inline]
    #[must_use]
    pub fn with_plugin_url(mut self, url: impl Into<String>) -> Self {
        self.plugin_url = url.into();
        self
    }

    /// With token lifetime
    #[inline]
    #[must_use]
    pub fn with_token_lifetime(mut self, secs: u64) -> Self {
        self.token_lifetime_secs = secs;
        self
    }

    /// Parse from TOML; missing keys take defaults
    ///
    /// # Errors
    /// Returns error on malformed TOML or unknown keys
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::io_error(path, e))?;
        Self::from_toml_str(&raw)
    }

    /// Absolute URL of a bundled asset
    #[must_use]
    pub fn asset_url(&self, file: &str) -> String {
        format!(
            "{}/{}",
            self.plugin_url.trim_end_matches('/'),
            file.trim_start_matches('/')
        )
    }

    /// Admin placeholder URL
    #[inline]
    #[must_use]
    pub fn default_image_url(&self) -> String {
        self.asset_url(&self.default_image)
    }

    /// Public placeholder URL
    #[inline]
    #[must_use]
    pub fn blank_image_url(&self) -> String {
        self.asset_url(&self.blank_image)
    }
}

impl Default for TaxonomyImagesConfig {
    fn default() -> Self {
        Self {
            debug: false,
            term_meta_enabled: true,
            bridge_enabled: true,
            legacy_option_key: "taxonomy_image_plugin".into(),
            settings_option_key: "taxonomy_image_plugin_settings".into(),
            detail_size: ImageSize {
                name: "detail".into(),
                width: 150,
                height: 150,
                crop: true,
            },
            plugin_url: "https://example.test/wp-content/plugins/taxonomy-images".into(),
            default_image: "images/default.png".into(),
            blank_image: "images/blank.png".into(),
            token_lifetime_secs: 86_400,
        }
    }
}
