//! Image support settings
//!
//! One persisted record listing the taxonomies that have the image UI
//! enabled. Saved values are sanitized against the taxonomies that are
//! registered at save time.

use crate::error::{HostError, SettingsError};
use crate::host::{Host, TermRegistry};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Display};

/// Settings record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Taxonomies with image support, in submission order
    #[serde(default)]
    pub taxonomies: Vec<String>,
}

/// Outcome message shown after saving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingsNotice {
    /// At least one taxonomy is enabled
    Updated,
    /// Nothing is enabled
    Disabled,
}

impl Display for SettingsNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Updated => "Image support for taxonomies successfully updated",
            Self::Disabled => "Image support has been disabled for all taxonomies.",
        })
    }
}

impl Settings {
    /// Create settings for the given taxonomies, unsanitized
    #[must_use]
    pub fn new(taxonomies: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            taxonomies: taxonomies.into_iter().map(Into::into).collect(),
        }
    }

    /// Load the persisted record; missing or unreadable means no support
    #[must_use]
    pub fn load(host: &dyn Host, option_key: &str) -> Self {
        host.get_option(option_key)
            .and_then(|raw| serde_json::from_value(raw).ok())
            .unwrap_or_default()
    }

    /// Check if a taxonomy has image support
    #[inline]
    #[must_use]
    pub fn has_image_support(&self, taxonomy: &str) -> bool {
        self.taxonomies.iter().any(|t| t == taxonomy)
    }

    /// Sanitize a submitted record against registered taxonomies
    ///
    /// Unknown names are dropped, duplicates keep their first position.
    /// A scalar `taxonomies` value is treated as a one-element list and a
    /// missing one as empty.
    ///
    /// # Errors
    /// Returns [`SettingsError::Malformed`] if `dirty` is not an object
    pub fn sanitize<R: TermRegistry + ?Sized>(
        dirty: &Value,
        registry: &R,
    ) -> Result<(Self, SettingsNotice), SettingsError> {
        let Value::Object(fields) = dirty else {
            return Err(SettingsError::Malformed(format!("expected an object, got {dirty}")));
        };

        let submitted: Vec<&str> = match fields.get("taxonomies") {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            Some(Value::String(single)) => vec![single.as_str()],
            _ => Vec::new(),
        };

        let registered = registry.taxonomies();
        let mut clean = Self::default();
        for name in submitted {
            if registered.iter().any(|t| t.name == name) && !clean.has_image_support(name) {
                clean.taxonomies.push(name.to_string());
            }
        }

        let notice = if clean.taxonomies.is_empty() {
            SettingsNotice::Disabled
        } else {
            SettingsNotice::Updated
        };
        Ok((clean, notice))
    }

    /// Persist the record
    ///
    /// # Errors
    /// Returns error if the host cannot persist the option
    pub fn save(&self, host: &dyn Host, option_key: &str) -> Result<(), SettingsError> {
        let value = serde_json::to_value(self).map_err(HostError::from)?;
        host.update_option(option_key, value)?;
        tracing::info!(taxonomies = ?self.taxonomies, "saved image support settings");
        Ok(())
    }

    /// Persist an empty record if none exists; returns `true` if created
    ///
    /// # Errors
    /// Returns error if the host cannot persist the option
    pub fn ensure_initialized(host: &dyn Host, option_key: &str) -> Result<bool, SettingsError> {
        let value = serde_json::to_value(Self::default()).map_err(HostError::from)?;
        Ok(host.add_option(option_key, value)?)
    }
}
