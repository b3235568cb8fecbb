//! Taxonomy Images Core
//!
//! Associates one image (an attachment) with each taxonomy term, per
//! image type, on top of a content-management host.
//!
//! # Core Concepts
//!
//! - [`TermRef`]: how callers name a term, normalized once by [`IdentifierResolver`]
//! - [`AssociationStore`]: storage backend for associations
//! - [`LegacyBackend`]: one option blob keyed by composite identifier
//! - [`ModernBackend`]: one term meta record per term and image type
//! - [`TermMetaBridge`]: keeps the legacy blob mirroring term meta
//! - [`TermImages`]: the facade every surface goes through
//! - [`RequestContext`]: per-request state, built at request start
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ti_core::prelude::*;
//!
//! let host = Arc::new(InMemoryHost::new());
//! host.insert_term(7, 42, "category", "News");
//!
//! let context = RequestContext::begin(host, TaxonomyImagesConfig::new());
//! context.images().update_image_id(&TermRef::by_id(7), 99, &ImageType::featured())?;
//!
//! assert_eq!(context.images().get_taxonomy(&TermRef::by_id(7)), "category");
//! assert_eq!(context.legacy().get().len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod facade;
pub mod host;
pub mod html;
pub mod image_types;
pub mod memory;
pub mod resolver;
pub mod settings;
pub mod store;
pub mod types;

// Re-exports
pub use config::TaxonomyImagesConfig;
pub use context::{install, RequestContext, RequestContextBuilder};
pub use diagnostics::{Diagnostics, DIAGNOSTICS_TARGET};
pub use error::{ConfigError, HostError, ResolveError, SettingsError, StoreError, StoreResult};
pub use facade::TermImages;
pub use host::{
    AttachmentPost, Host, ImageSize, ImageSrc, MediaLibrary, MetaWrite, OptionsStore, Permissions,
    PostId, TaxonomyInfo, TermMetaStore, TermRecord, TermRegistry,
};
pub use image_types::{ImageTypeDescriptor, ImageTypeRegistry};
pub use memory::{HostSnapshot, InMemoryHost, StoredAttachment};
pub use resolver::{IdentifierResolver, ResolvedTerm, TermKey};
pub use settings::{Settings, SettingsNotice};
pub use store::{
    select_store, AssociationStore, Backend, LegacyAssociations, LegacyBackend, LegacyTable,
    ModernBackend, TermMetaBridge, WriteOutcome,
};
pub use types::{
    sanitize_key, AttachmentId, ImageType, TermId, TermRef, TermTaxonomyId, FEATURED_META_KEY,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with taxonomy images
    pub use crate::{
        AssociationStore, AttachmentId, Backend, Host, ImageType, InMemoryHost, RequestContext,
        TaxonomyImagesConfig, TermId, TermImages, TermRef, TermTaxonomyId, WriteOutcome,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
