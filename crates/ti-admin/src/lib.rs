//! Taxonomy Images Admin
//!
//! Administrative surfaces on top of [`ti_core`]: the per-term image
//! control, the AJAX endpoints that change associations and the
//! settings page.
//!
//! # Core Concepts
//!
//! - [`NonceIssuer`]: signed, single-use anti-replay tokens
//! - [`AjaxHandler`]: `update_term_image` and `delete_term_image`
//! - [`TermImageUrl`]: preview URL lookup with a [`PreviewStrategy`]
//! - [`ImageControl`]: view model rendered in term lists and edit screens
//!
//! # Example
//!
//! ```rust,ignore
//! use ti_admin::{AjaxHandler, AjaxRequest, NonceAction, NonceIssuer};
//!
//! let nonces = NonceIssuer::generate(context.config().token_lifetime_secs);
//! let token = nonces.issue(NonceAction::CreateAssociation, "1");
//!
//! let request = AjaxRequest::new(7, token).with_attachment("99");
//! let response = AjaxHandler::new(&context, &nonces, "1").update_term_image(&request);
//! assert!(response.is_good());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod ajax;
pub mod control;
pub mod error;
pub mod nonce;
pub mod settings_form;
pub mod url;

// Re-exports
pub use ajax::{AjaxHandler, AjaxRequest, AjaxResponse, AjaxStatus};
pub use control::{enabled_taxonomies, taxonomy_columns, term_row, ImageControl, IMAGE_COLUMN};
pub use error::{AjaxError, NonceError};
pub use nonce::{NonceAction, NonceIssuer};
pub use settings_form::TaxonomyOption;
pub use url::{PreviewStrategy, TermImageUrl};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
