//! In-memory host
//!
//! [`InMemoryHost`] implements every host capability over a serializable
//! [`HostSnapshot`]. Tests drive it directly; the CLI persists the
//! snapshot as JSON between invocations.

use crate::error::HostError;
use crate::host::{
    AttachmentPost, ImageSize, ImageSrc, MediaLibrary, MetaWrite, OptionsStore, Permissions,
    PostId, TaxonomyInfo, TermMetaStore, TermRecord, TermRegistry,
};
use crate::types::{AttachmentId, TermId, TermTaxonomyId};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Attachment held by the in-memory media library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAttachment {
    /// Attachment id
    pub id: AttachmentId,
    /// Title
    #[serde(default)]
    pub title: String,
    /// MIME type
    #[serde(default = "default_mime_type")]
    pub mime_type: String,
    /// URL of the original upload
    pub url: String,
    /// Original width
    #[serde(default)]
    pub width: u32,
    /// Original height
    #[serde(default)]
    pub height: u32,
    /// Generated intermediate sizes by name
    #[serde(default)]
    pub sizes: BTreeMap<String, ImageSrc>,
    /// Whether the original file is on disk, so new sizes can be generated
    #[serde(default)]
    pub source_available: bool,
}

fn default_mime_type() -> String {
    "image/jpeg".to_string()
}

impl StoredAttachment {
    /// Create an attachment with only its original upload
    #[must_use]
    pub fn new(id: AttachmentId, url: impl Into<String>) -> Self {
        Self {
            id,
            title: String::new(),
            mime_type: default_mime_type(),
            url: url.into(),
            width: 1024,
            height: 768,
            sizes: BTreeMap::new(),
            source_available: false,
        }
    }

    /// Add an already generated size
    #[must_use]
    pub fn with_size(mut self, name: &str, width: u32, height: u32) -> Self {
        let url = sized_url(&self.url, width, height);
        self.sizes.insert(
            name.to_string(),
            ImageSrc {
                url,
                width,
                height,
            },
        );
        self
    }

    /// Mark the original file as available for resizing
    #[inline]
    #[must_use]
    pub fn with_source(mut self) -> Self {
        self.source_available = true;
        self
    }
}

/// `photo.jpg` at 150x150 becomes `photo-150x150.jpg`
fn sized_url(url: &str, width: u32, height: u32) -> String {
    match url.rfind('.') {
        Some(dot) if dot > url.rfind('/').unwrap_or(0) => {
            format!("{}-{width}x{height}{}", &url[..dot], &url[dot..])
        }
        _ => format!("{url}-{width}x{height}"),
    }
}

/// Complete host state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSnapshot {
    /// Feature flag for per-term metadata
    pub term_meta_supported: bool,
    /// Base URL for term links
    pub site_url: String,
    /// Registered taxonomies
    pub taxonomies: Vec<TaxonomyInfo>,
    /// Term bindings
    pub terms: Vec<TermRecord>,
    /// Term meta: term id -> key -> value
    pub term_meta: BTreeMap<u64, BTreeMap<String, String>>,
    /// Persisted options
    pub options: BTreeMap<String, Value>,
    /// Media library
    pub attachments: Vec<StoredAttachment>,
    /// Post id -> attached term bindings
    pub object_terms: BTreeMap<u64, Vec<TermTaxonomyId>>,
    /// Taxonomies the current actor may edit
    pub editable_taxonomies: Vec<String>,
}

impl Default for HostSnapshot {
    fn default() -> Self {
        Self {
            term_meta_supported: true,
            site_url: "https://example.test".to_string(),
            taxonomies: Vec::new(),
            terms: Vec::new(),
            term_meta: BTreeMap::new(),
            options: BTreeMap::new(),
            attachments: Vec::new(),
            object_terms: BTreeMap::new(),
            editable_taxonomies: Vec::new(),
        }
    }
}

/// Host implementation backed by process memory
#[derive(Debug, Default)]
pub struct InMemoryHost {
    state: RwLock<HostSnapshot>,
    option_writes: AtomicUsize,
    reject_option_writes: AtomicBool,
    primed: RwLock<Vec<AttachmentId>>,
}

impl InMemoryHost {
    /// Create an empty host with term meta support
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from a saved snapshot
    #[must_use]
    pub fn from_snapshot(snapshot: HostSnapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
            option_writes: AtomicUsize::new(0),
            reject_option_writes: AtomicBool::new(false),
            primed: RwLock::new(Vec::new()),
        }
    }

    /// Copy of the current state
    #[must_use]
    pub fn snapshot(&self) -> HostSnapshot {
        self.state.read().clone()
    }

    /// Toggle per-term metadata support
    pub fn set_term_meta_supported(&self, supported: bool) {
        self.state.write().term_meta_supported = supported;
    }

    /// Register a taxonomy
    pub fn register_taxonomy(&self, name: &str, label: &str, singular_name: &str) {
        let mut state = self.state.write();
        state.taxonomies.retain(|t| t.name != name);
        state.taxonomies.push(TaxonomyInfo {
            name: name.to_string(),
            label: label.to_string(),
            singular_name: singular_name.to_string(),
            show_ui: true,
        });
    }

    /// Insert or replace a term binding
    pub fn insert_term(&self, term_id: u64, term_taxonomy_id: u64, taxonomy: &str, name: &str) {
        let mut state = self.state.write();
        state
            .terms
            .retain(|t| t.term_taxonomy_id != TermTaxonomyId(term_taxonomy_id));
        state.terms.push(TermRecord {
            term_id: TermId(term_id),
            term_taxonomy_id: TermTaxonomyId(term_taxonomy_id),
            taxonomy: taxonomy.to_string(),
            name: name.to_string(),
            slug: crate::types::sanitize_key(&name.replace(' ', "-")),
        });
    }

    /// Remove a term binding
    pub fn remove_term(&self, term_taxonomy_id: u64) {
        self.state
            .write()
            .terms
            .retain(|t| t.term_taxonomy_id != TermTaxonomyId(term_taxonomy_id));
    }

    /// Add or replace an attachment
    pub fn add_attachment(&self, attachment: StoredAttachment) {
        let mut state = self.state.write();
        state.attachments.retain(|a| a.id != attachment.id);
        state.attachments.push(attachment);
    }

    /// Delete an attachment, leaving any association dangling
    pub fn remove_attachment(&self, id: AttachmentId) {
        self.state.write().attachments.retain(|a| a.id != id);
    }

    /// Attach term bindings to a post
    pub fn attach_terms(&self, post: PostId, term_taxonomy_ids: &[u64]) {
        let mut state = self.state.write();
        let entry = state.object_terms.entry(post.0).or_default();
        for id in term_taxonomy_ids {
            let id = TermTaxonomyId(*id);
            if !entry.contains(&id) {
                entry.push(id);
            }
        }
    }

    /// Allow the current actor to edit terms of a taxonomy
    pub fn grant_edit_terms(&self, taxonomy: &str) {
        let mut state = self.state.write();
        if !state.editable_taxonomies.iter().any(|t| t == taxonomy) {
            state.editable_taxonomies.push(taxonomy.to_string());
        }
    }

    /// Read a term meta value, ignoring the feature flag
    #[must_use]
    pub fn raw_term_meta(&self, term: TermId, key: &str) -> Option<String> {
        self.state
            .read()
            .term_meta
            .get(&term.0)
            .and_then(|m| m.get(key).cloned())
    }

    /// Number of option writes performed
    #[must_use]
    pub fn option_writes(&self) -> usize {
        self.option_writes.load(Ordering::Relaxed)
    }

    /// Make every following option write fail with a storage error
    pub fn reject_option_writes(&self, reject: bool) {
        self.reject_option_writes.store(reject, Ordering::Relaxed);
    }

    fn check_option_write(&self, key: &str) -> Result<(), HostError> {
        if self.reject_option_writes.load(Ordering::Relaxed) {
            return Err(HostError::storage(format!("option {key} is read-only")));
        }
        Ok(())
    }

    /// Attachment ids passed to the last cache priming call
    #[must_use]
    pub fn primed_attachments(&self) -> Vec<AttachmentId> {
        self.primed.read().clone()
    }

    fn with_attachment<T>(&self, id: AttachmentId, f: impl FnOnce(&StoredAttachment) -> T) -> Option<T> {
        let state = self.state.read();
        state.attachments.iter().find(|a| a.id == id).map(f)
    }
}

impl TermRegistry for InMemoryHost {
    fn term_by_composite(&self, id: TermTaxonomyId) -> Option<TermRecord> {
        self.state
            .read()
            .terms
            .iter()
            .find(|t| t.term_taxonomy_id == id)
            .cloned()
    }

    fn terms_by_id(&self, id: TermId) -> Vec<TermRecord> {
        self.state
            .read()
            .terms
            .iter()
            .filter(|t| t.term_id == id)
            .cloned()
            .collect()
    }

    fn taxonomies(&self) -> Vec<TaxonomyInfo> {
        self.state.read().taxonomies.clone()
    }

    fn terms(&self, taxonomies: &[String]) -> Vec<TermRecord> {
        self.state
            .read()
            .terms
            .iter()
            .filter(|t| taxonomies.contains(&t.taxonomy))
            .cloned()
            .collect()
    }

    fn object_terms(&self, post: PostId, taxonomy: &str) -> Vec<TermRecord> {
        let state = self.state.read();
        let Some(ids) = state.object_terms.get(&post.0) else {
            return Vec::new();
        };
        ids.iter()
            .filter_map(|id| state.terms.iter().find(|t| t.term_taxonomy_id == *id))
            .filter(|t| t.taxonomy == taxonomy)
            .cloned()
            .collect()
    }

    fn object_taxonomies(&self, _post: PostId) -> Vec<String> {
        self.state
            .read()
            .taxonomies
            .iter()
            .map(|t| t.name.clone())
            .collect()
    }

    fn term_link(&self, term: &TermRecord) -> String {
        let state = self.state.read();
        let slug = if term.slug.is_empty() {
            term.term_id.to_string()
        } else {
            term.slug.clone()
        };
        format!("{}/{}/{}/", state.site_url.trim_end_matches('/'), term.taxonomy, slug)
    }
}

impl TermMetaStore for InMemoryHost {
    fn supports_term_meta(&self) -> bool {
        self.state.read().term_meta_supported
    }

    fn get_term_meta(&self, term: TermId, key: &str) -> Option<String> {
        if !self.supports_term_meta() {
            return None;
        }
        self.raw_term_meta(term, key)
    }

    fn update_term_meta(
        &self,
        term: TermId,
        key: &str,
        value: &str,
    ) -> Result<MetaWrite, HostError> {
        let mut state = self.state.write();
        if !state.term_meta_supported {
            return Err(HostError::TermMetaUnsupported);
        }
        let previous = state
            .term_meta
            .entry(term.0)
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(if previous.is_some() {
            MetaWrite::Updated
        } else {
            MetaWrite::Created
        })
    }

    fn delete_term_meta(&self, term: TermId, key: &str) -> Result<bool, HostError> {
        let mut state = self.state.write();
        if !state.term_meta_supported {
            return Err(HostError::TermMetaUnsupported);
        }
        let Some(meta) = state.term_meta.get_mut(&term.0) else {
            return Ok(false);
        };
        let removed = meta.remove(key).is_some();
        if meta.is_empty() {
            state.term_meta.remove(&term.0);
        }
        Ok(removed)
    }
}

impl OptionsStore for InMemoryHost {
    fn get_option(&self, key: &str) -> Option<Value> {
        self.state.read().options.get(key).cloned()
    }

    fn add_option(&self, key: &str, value: Value) -> Result<bool, HostError> {
        self.check_option_write(key)?;
        let mut state = self.state.write();
        if state.options.contains_key(key) {
            return Ok(false);
        }
        state.options.insert(key.to_string(), value);
        self.option_writes.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }

    fn update_option(&self, key: &str, value: Value) -> Result<(), HostError> {
        self.check_option_write(key)?;
        self.state.write().options.insert(key.to_string(), value);
        self.option_writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

impl MediaLibrary for InMemoryHost {
    fn attachment_exists(&self, id: AttachmentId) -> bool {
        self.with_attachment(id, |_| ()).is_some()
    }

    fn intermediate_src(&self, id: AttachmentId, size: &str) -> Option<ImageSrc> {
        self.with_attachment(id, |a| a.sizes.get(size).cloned())
            .flatten()
    }

    fn full_src(&self, id: AttachmentId) -> Option<ImageSrc> {
        self.with_attachment(id, |a| ImageSrc {
            url: a.url.clone(),
            width: a.width,
            height: a.height,
        })
    }

    fn generate_intermediate(&self, id: AttachmentId, size: &ImageSize) -> Option<ImageSrc> {
        let mut state = self.state.write();
        let attachment = state.attachments.iter_mut().find(|a| a.id == id)?;
        if !attachment.source_available {
            return None;
        }
        let src = ImageSrc {
            url: sized_url(&attachment.url, size.width, size.height),
            width: size.width,
            height: size.height,
        };
        attachment.sizes.insert(size.name.clone(), src.clone());
        Some(src)
    }

    fn attachment_image(
        &self,
        id: AttachmentId,
        size: &str,
        attrs: &BTreeMap<String, String>,
    ) -> Option<String> {
        let src = if matches!(size, "full" | "fullsize") {
            self.full_src(id)?
        } else {
            self.intermediate_src(id, size)?
        };

        let mut all = BTreeMap::new();
        all.insert("alt".to_string(), String::new());
        all.insert("class".to_string(), format!("attachment-{size} size-{size}"));
        for (name, value) in attrs {
            all.insert(name.clone(), value.clone());
        }

        let mut html = format!(
            "<img width=\"{}\" height=\"{}\" src=\"{}\"",
            src.width, src.height, src.url
        );
        for (name, value) in &all {
            let _ = write!(html, " {name}=\"{value}\"");
        }
        html.push_str(" />");
        Some(html)
    }

    fn attachment_post(&self, id: AttachmentId) -> Option<AttachmentPost> {
        self.with_attachment(id, |a| AttachmentPost {
            id: a.id,
            title: a.title.clone(),
            mime_type: a.mime_type.clone(),
            url: a.url.clone(),
        })
    }

    fn prime_attachments(&self, ids: &[AttachmentId]) {
        *self.primed.write() = ids.to_vec();
    }
}

impl Permissions for InMemoryHost {
    fn can_edit_terms(&self, taxonomy: &str) -> bool {
        self.state
            .read()
            .editable_taxonomies
            .iter()
            .any(|t| t == taxonomy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment(id: u64) -> AttachmentId {
        AttachmentId::new(id).unwrap()
    }

    #[test]
    fn sized_url_inserts_dimensions() {
        assert_eq!(
            sized_url("https://cdn.test/uploads/photo.jpg", 150, 150),
            "https://cdn.test/uploads/photo-150x150.jpg"
        );
        assert_eq!(sized_url("https://cdn.test/raw", 10, 20), "https://cdn.test/raw-10x20");
    }

    #[test]
    fn term_meta_create_then_update() {
        let host = InMemoryHost::new();
        assert_eq!(
            host.update_term_meta(TermId(1), "k", "5").unwrap(),
            MetaWrite::Created
        );
        assert_eq!(
            host.update_term_meta(TermId(1), "k", "6").unwrap(),
            MetaWrite::Updated
        );
        assert_eq!(host.get_term_meta(TermId(1), "k").as_deref(), Some("6"));
        assert!(host.delete_term_meta(TermId(1), "k").unwrap());
        assert!(!host.delete_term_meta(TermId(1), "k").unwrap());
    }

    #[test]
    fn term_meta_unsupported_hides_values() {
        let host = InMemoryHost::new();
        host.update_term_meta(TermId(1), "k", "5").unwrap();
        host.set_term_meta_supported(false);
        assert!(host.get_term_meta(TermId(1), "k").is_none());
        assert!(host.update_term_meta(TermId(1), "k", "6").is_err());
        assert_eq!(host.raw_term_meta(TermId(1), "k").as_deref(), Some("5"));
    }

    #[test]
    fn add_option_only_when_absent() {
        let host = InMemoryHost::new();
        assert!(host.add_option("k", Value::from(1)).unwrap());
        assert!(!host.add_option("k", Value::from(2)).unwrap());
        assert_eq!(host.get_option("k"), Some(Value::from(1)));
        assert_eq!(host.option_writes(), 1);
    }

    #[test]
    fn generate_intermediate_requires_source() {
        let host = InMemoryHost::new();
        host.add_attachment(StoredAttachment::new(attachment(3), "https://cdn.test/a.png"));
        let size = ImageSize {
            name: "detail".into(),
            width: 150,
            height: 150,
            crop: true,
        };
        assert!(host.generate_intermediate(attachment(3), &size).is_none());

        host.add_attachment(StoredAttachment::new(attachment(3), "https://cdn.test/a.png").with_source());
        let src = host.generate_intermediate(attachment(3), &size).unwrap();
        assert_eq!(src.url, "https://cdn.test/a-150x150.png");
        assert_eq!(host.intermediate_src(attachment(3), "detail"), Some(src));
    }

    #[test]
    fn object_terms_filter_by_taxonomy() {
        let host = InMemoryHost::new();
        host.register_taxonomy("category", "Categories", "Category");
        host.insert_term(7, 42, "category", "News");
        host.insert_term(8, 43, "post_tag", "Rust");
        host.attach_terms(PostId(1), &[42, 43]);

        let terms = host.object_terms(PostId(1), "category");
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].term_id, TermId(7));
        assert_eq!(host.term_link(&terms[0]), "https://example.test/category/news/");
    }

    #[test]
    fn snapshot_roundtrips_through_json() {
        let host = InMemoryHost::new();
        host.insert_term(7, 42, "category", "News");
        host.update_term_meta(TermId(7), "taxonomy_image_id", "99").unwrap();
        let json = serde_json::to_string(&host.snapshot()).unwrap();
        let restored: HostSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, host.snapshot());
    }
}
