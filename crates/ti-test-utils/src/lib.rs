//! Testing utilities for the taxonomy images workspace
//!
//! Shared fixtures on top of [`InMemoryHost`].

#![allow(missing_docs)]

use serde_json::json;
use std::sync::Arc;
use ti_core::{
    AttachmentId, Host, InMemoryHost, OptionsStore, PostId, RequestContext, StoredAttachment,
    TaxonomyImagesConfig,
};

pub const LEGACY_KEY: &str = "taxonomy_image_plugin";
pub const SETTINGS_KEY: &str = "taxonomy_image_plugin_settings";

pub fn attachment(id: u64) -> AttachmentId {
    AttachmentId::new(id).unwrap()
}

pub fn upload_url(id: u64) -> String {
    format!("https://example.test/uploads/image-{id}.jpg")
}

/// Attachment with thumbnail and detail sizes already generated
pub fn imaged_attachment(id: u64) -> StoredAttachment {
    StoredAttachment::new(attachment(id), upload_url(id))
        .with_size("thumbnail", 150, 150)
        .with_size("detail", 150, 150)
        .with_source()
}

/// `category` term 7 (composite 42) with image support enabled,
/// editable by the current actor
pub fn category_fixture() -> Arc<InMemoryHost> {
    let host = Arc::new(InMemoryHost::new());
    host.register_taxonomy("category", "Categories", "Category");
    host.register_taxonomy("post_tag", "Tags", "Tag");
    host.insert_term(7, 42, "category", "News");
    host.insert_term(8, 43, "category", "Sports");
    host.insert_term(9, 44, "post_tag", "Rust");
    host.grant_edit_terms("category");
    host.update_option(SETTINGS_KEY, json!({"taxonomies": ["category"]}))
        .unwrap();
    host.add_attachment(imaged_attachment(99));
    host.add_attachment(imaged_attachment(100));
    host.attach_terms(PostId(1), &[42, 43, 44]);
    host
}

/// Term 5 bound to both `category` (composite 50) and `post_tag` (51)
pub fn shared_term_fixture() -> Arc<InMemoryHost> {
    let host = category_fixture();
    host.insert_term(5, 50, "category", "Shared");
    host.insert_term(5, 51, "post_tag", "Shared");
    host.grant_edit_terms("post_tag");
    host
}

/// Host without term meta, with `{42: 99}` already in the legacy table
pub fn legacy_only_fixture() -> Arc<InMemoryHost> {
    let host = category_fixture();
    host.set_term_meta_supported(false);
    host.update_option(LEGACY_KEY, json!({"42": 99})).unwrap();
    host
}

pub fn as_host(host: &Arc<InMemoryHost>) -> Arc<dyn Host> {
    host.clone()
}

pub fn context(host: &Arc<InMemoryHost>) -> RequestContext {
    RequestContext::begin(as_host(host), TaxonomyImagesConfig::default().with_debug(true))
}

pub fn context_with(host: &Arc<InMemoryHost>, config: TaxonomyImagesConfig) -> RequestContext {
    RequestContext::begin(as_host(host), config)
}
