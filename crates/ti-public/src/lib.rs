//! Taxonomy Images Public
//!
//! Read-only accessors for themes: term listings carrying image ids,
//! linked image markup, and the image of the queried term archive.
//!
//! # Core Concepts
//!
//! - [`PublicFilters`]: accessors addressable by filter name
//! - [`QueriedObject`]: what the current page was queried for
//! - [`prime_queried_images`]: one batched cache warm-up per request
//!
//! # Example
//!
//! ```rust,ignore
//! use ti_public::{PublicFilters, QueriedObject, GET_TERMS};
//!
//! let filters = PublicFilters::new(&context);
//! let terms = filters.apply(GET_TERMS, &QueriedObject::Other, &serde_json::json!({
//!     "taxonomy": "category",
//!     "having_images": false,
//! }))?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod args;
pub mod cache;
pub mod error;
pub mod filters;

// Re-exports
pub use args::{GetTermsArgs, GetTheTermsArgs, ImageSizeArgs, ListTheTermsArgs, QueriedImageArgs};
pub use cache::prime_queried_images;
pub use error::FilterError;
pub use filters::{
    ImagedTerm, PublicFilters, QueriedObject, FILTER_NAMES, GET_TERMS, GET_THE_TERMS,
    LIST_THE_TERMS, QUERIED_TERM_IMAGE, QUERIED_TERM_IMAGE_DATA, QUERIED_TERM_IMAGE_ID,
    QUERIED_TERM_IMAGE_OBJECT, QUERIED_TERM_IMAGE_URL,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
