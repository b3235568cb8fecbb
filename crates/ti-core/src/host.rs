//! Host platform capabilities
//!
//! Everything this crate needs from the content-management host is
//! reached through the narrow traits below. Nothing here is
//! reimplemented: the host owns terms, metadata, options, media and
//! permissions.

use crate::error::HostError;
use crate::types::{AttachmentId, TermId, TermTaxonomyId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Post (content object) identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub u64);

/// A term bound to one taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermRecord {
    /// Primary identifier
    pub term_id: TermId,
    /// Composite identifier of this binding
    pub term_taxonomy_id: TermTaxonomyId,
    /// Taxonomy name
    pub taxonomy: String,
    /// Display name
    pub name: String,
    /// URL slug
    #[serde(default)]
    pub slug: String,
}

/// A registered taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyInfo {
    /// Registered name
    pub name: String,
    /// Plural label
    pub label: String,
    /// Singular label
    #[serde(default)]
    pub singular_name: String,
    /// Whether the host shows admin screens for it
    #[serde(default = "default_show_ui")]
    pub show_ui: bool,
}

fn default_show_ui() -> bool {
    true
}

/// Result of a term meta write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetaWrite {
    /// No previous value existed
    Created,
    /// An existing value was replaced
    Updated,
}

/// A named image size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    /// Registered size name
    pub name: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Hard crop to exact dimensions
    pub crop: bool,
}

/// Resolved image source at some size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSrc {
    /// Public URL
    pub url: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// Attachment record as stored by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentPost {
    /// Attachment id
    pub id: AttachmentId,
    /// Title
    pub title: String,
    /// MIME type
    pub mime_type: String,
    /// URL of the original upload
    pub url: String,
}

/// Term and taxonomy lookups
pub trait TermRegistry: Send + Sync {
    /// Look up a binding by composite identifier
    fn term_by_composite(&self, id: TermTaxonomyId) -> Option<TermRecord>;

    /// All bindings of a primary identifier, one per taxonomy
    fn terms_by_id(&self, id: TermId) -> Vec<TermRecord>;

    /// Registered taxonomies
    fn taxonomies(&self) -> Vec<TaxonomyInfo>;

    /// Look up one taxonomy
    fn taxonomy(&self, name: &str) -> Option<TaxonomyInfo> {
        self.taxonomies().into_iter().find(|t| t.name == name)
    }

    /// Check if a taxonomy is registered
    fn taxonomy_exists(&self, name: &str) -> bool {
        self.taxonomy(name).is_some()
    }

    /// All terms of the given taxonomies
    fn terms(&self, taxonomies: &[String]) -> Vec<TermRecord>;

    /// Terms of one taxonomy attached to a post
    fn object_terms(&self, post: PostId, taxonomy: &str) -> Vec<TermRecord>;

    /// Taxonomies registered for a post's type
    fn object_taxonomies(&self, post: PostId) -> Vec<String>;

    /// Public archive link for a term
    fn term_link(&self, term: &TermRecord) -> String;
}

/// Per-term metadata
pub trait TermMetaStore: Send + Sync {
    /// Feature detection: older hosts have no term meta
    fn supports_term_meta(&self) -> bool;

    /// Read a single value
    fn get_term_meta(&self, term: TermId, key: &str) -> Option<String>;

    /// Create or replace a single value
    ///
    /// # Errors
    /// Returns error if the host cannot persist the value
    fn update_term_meta(&self, term: TermId, key: &str, value: &str)
        -> Result<MetaWrite, HostError>;

    /// Remove a value; `Ok(false)` if there was nothing to remove
    ///
    /// # Errors
    /// Returns error if the host cannot persist the removal
    fn delete_term_meta(&self, term: TermId, key: &str) -> Result<bool, HostError>;
}

/// Key-value persisted options, one blob per key
pub trait OptionsStore: Send + Sync {
    /// Read an option
    fn get_option(&self, key: &str) -> Option<Value>;

    /// Persist an option only if absent; `Ok(false)` if it already existed
    ///
    /// # Errors
    /// Returns error if the host cannot persist the value
    fn add_option(&self, key: &str, value: Value) -> Result<bool, HostError>;

    /// Replace an option
    ///
    /// # Errors
    /// Returns error if the host cannot persist the value
    fn update_option(&self, key: &str, value: Value) -> Result<(), HostError>;
}

/// Attachment storage and resizing
pub trait MediaLibrary: Send + Sync {
    /// Check that the attachment exists
    fn attachment_exists(&self, id: AttachmentId) -> bool;

    /// Source of an already generated intermediate size
    fn intermediate_src(&self, id: AttachmentId, size: &str) -> Option<ImageSrc>;

    /// Source of the original upload
    fn full_src(&self, id: AttachmentId) -> Option<ImageSrc>;

    /// Ask the host resize pipeline to generate a size
    fn generate_intermediate(&self, id: AttachmentId, size: &ImageSize) -> Option<ImageSrc>;

    /// Host-rendered image markup
    fn attachment_image(
        &self,
        id: AttachmentId,
        size: &str,
        attrs: &BTreeMap<String, String>,
    ) -> Option<String>;

    /// Attachment record
    fn attachment_post(&self, id: AttachmentId) -> Option<AttachmentPost>;

    /// Warm the host object cache for a batch of attachments
    fn prime_attachments(&self, _ids: &[AttachmentId]) {}
}

/// Capability checks for the current actor
pub trait Permissions: Send + Sync {
    /// Can the current actor edit terms of this taxonomy
    fn can_edit_terms(&self, taxonomy: &str) -> bool;
}

/// Everything the association layer consumes from the host
pub trait Host: TermRegistry + TermMetaStore + OptionsStore + MediaLibrary + Permissions {}

impl<T> Host for T where
    T: TermRegistry + TermMetaStore + OptionsStore + MediaLibrary + Permissions + ?Sized
{
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_info_defaults_show_ui() {
        let info: TaxonomyInfo =
            serde_json::from_str(r#"{"name":"category","label":"Categories"}"#).unwrap();
        assert!(info.show_ui);
        assert!(info.singular_name.is_empty());
    }

    #[test]
    fn meta_write_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&MetaWrite::Created).unwrap(), "\"created\"");
    }
}
