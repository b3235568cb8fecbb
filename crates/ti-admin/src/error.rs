//! Error types for admin surfaces

use ti_core::{ImageType, StoreError};

/// Anti-replay token rejections
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NonceError {
    /// Not hex, or the wrong length
    #[error("malformed token")]
    Malformed,

    /// Signature does not match the action, actor or issuer
    #[error("token signature does not match")]
    Forged,

    /// Older than the configured lifetime
    #[error("token expired")]
    Expired,

    /// Already consumed by an earlier request
    #[error("token already used")]
    Replayed,
}

/// Reasons an AJAX request is turned down
///
/// The display text is the `why` field of the response.
#[derive(Debug, thiserror::Error)]
pub enum AjaxError {
    /// No `term_id` field
    #[error("term_id not sent")]
    TermIdMissing,

    /// `term_id` is zero, negative or non-numeric
    #[error("term_id is empty")]
    TermIdEmpty,

    /// No `wp_nonce` field
    #[error("No nonce included.")]
    NonceMissing,

    /// Token failed verification
    #[error("Nonce did not match")]
    NonceMismatch(#[source] NonceError),

    /// Actor may not edit the term's taxonomy, or the term does not exist
    #[error("You do not have the correct capability to manage this term")]
    Capability,

    /// Image type not registered, or not offered for the term's taxonomy
    #[error("Unknown image type: {0}")]
    UnknownImageType(ImageType),

    /// No `attachment_id` field
    #[error("Image id not sent")]
    ImageIdMissing,

    /// `attachment_id` is zero, negative or non-numeric
    #[error("Image id is not a positive integer")]
    ImageIdInvalid,

    /// Bare term id bound to several taxonomies
    #[error("Term id is shared by several taxonomies; include the taxonomy")]
    AmbiguousTerm(#[source] StoreError),

    /// Store refused or failed the write
    #[error("Association could not be created")]
    CreateFailed(#[source] StoreError),

    /// Store refused or failed the removal
    #[error("Association could not be removed")]
    RemoveFailed(#[source] StoreError),
}

impl AjaxError {
    /// Check if rejected before any storage was touched
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        match self {
            Self::CreateFailed(err) | Self::RemoveFailed(err) => err.is_rejection(),
            _ => true,
        }
    }
}
