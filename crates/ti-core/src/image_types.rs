//! Image type registry
//!
//! Provides [`ImageTypeRegistry`], the per-request list of image slots.
//! The featured slot is always first; extensions may register more.

use crate::types::{sanitize_key, ImageType};
use serde::{Deserialize, Serialize};

/// A registered image slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageTypeDescriptor {
    /// Slot id
    pub id: ImageType,
    /// Admin label
    pub label: String,
    /// Supported taxonomies; empty means all
    #[serde(default)]
    pub taxonomies: Vec<String>,
}

impl ImageTypeDescriptor {
    /// Create descriptor from untrusted input
    #[must_use]
    pub fn new(id: &str, label: &str, taxonomies: &[&str]) -> Self {
        Self {
            id: ImageType::new(id),
            label: label.trim().to_string(),
            taxonomies: taxonomies
                .iter()
                .map(|t| sanitize_key(t))
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    /// The default slot
    #[must_use]
    pub fn featured() -> Self {
        Self {
            id: ImageType::featured(),
            label: "Featured".into(),
            taxonomies: Vec::new(),
        }
    }

    /// Check if the slot applies to a taxonomy
    #[inline]
    #[must_use]
    pub fn supports_taxonomy(&self, taxonomy: &str) -> bool {
        self.taxonomies.is_empty() || self.taxonomies.iter().any(|t| t == taxonomy)
    }
}

/// Registry of image slots
#[derive(Debug, Clone)]
pub struct ImageTypeRegistry {
    types: Vec<ImageTypeDescriptor>,
}

impl Default for ImageTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageTypeRegistry {
    /// Create registry holding only the featured slot
    #[must_use]
    pub fn new() -> Self {
        Self {
            types: vec![ImageTypeDescriptor::featured()],
        }
    }

    /// Create registry with extension slots
    ///
    /// Slots with an empty id are skipped; the first registration of an
    /// id wins.
    #[must_use]
    pub fn with_extra(extra: impl IntoIterator<Item = ImageTypeDescriptor>) -> Self {
        let mut registry = Self::new();
        for descriptor in extra {
            registry.register(descriptor);
        }
        registry
    }

    /// Register a slot; returns `false` if skipped
    pub fn register(&mut self, descriptor: ImageTypeDescriptor) -> bool {
        if descriptor.id.is_featured() || self.get(&descriptor.id).is_some() {
            tracing::debug!(image_type = %descriptor.id, "skipped image type registration");
            return false;
        }
        self.types.push(descriptor);
        true
    }

    /// Look up a slot
    #[must_use]
    pub fn get(&self, id: &ImageType) -> Option<&ImageTypeDescriptor> {
        self.types.iter().find(|t| &t.id == id)
    }

    /// Slots applicable to a taxonomy, in registration order
    #[must_use]
    pub fn for_taxonomy(&self, taxonomy: &str) -> Vec<&ImageTypeDescriptor> {
        self.types
            .iter()
            .filter(|t| t.supports_taxonomy(taxonomy))
            .collect()
    }

    /// Iterate all slots
    pub fn iter(&self) -> impl Iterator<Item = &ImageTypeDescriptor> {
        self.types.iter()
    }

    /// Number of slots
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Always false: the featured slot is permanent
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
