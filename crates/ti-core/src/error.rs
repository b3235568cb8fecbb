//! Error types for term image associations
//!
//! Provides error handling for:
//! - Host capability failures (options, term meta)
//! - Identifier resolution (not found, ambiguous)
//! - Store writes (validation, ambiguity, unsupported backends)
//! - Configuration and settings loading

use crate::types::{ImageType, TermId, TermRef};
use std::path::PathBuf;

/// Errors reported by the host platform
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Persistence layer rejected the write
    #[error("storage error: {0}")]
    Storage(String),

    /// Host has no per-term metadata
    #[error("term meta is not supported by this host")]
    TermMetaUnsupported,

    /// Value could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HostError {
    /// Create storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }
}

/// Errors during identifier resolution
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// Reference does not resolve to any term binding
    #[error("{0} not found")]
    NotFound(TermRef),

    /// Primary identifier is bound to more than one taxonomy
    #[error("term {term_id} is shared by taxonomies {taxonomies:?}")]
    Ambiguous {
        /// Shared primary identifier
        term_id: TermId,
        /// Taxonomies the term is bound to
        taxonomies: Vec<String>,
    },
}

/// Errors during association writes
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Attachment id is zero, negative or non-numeric
    #[error("invalid image id")]
    InvalidImageId,

    /// Term reference did not resolve
    #[error("term not found: {0}")]
    TermNotFound(TermRef),

    /// Primary identifier could not pick exactly one taxonomy
    #[error("ambiguous term reference: term {term_id} is shared by {taxonomies:?}")]
    AmbiguousTerm {
        /// Shared primary identifier
        term_id: TermId,
        /// Taxonomies the term is bound to
        taxonomies: Vec<String>,
    },

    /// Per-term metadata is unavailable or disabled
    #[error("term meta is not supported")]
    Unsupported,

    /// Image type has no representation in the legacy table
    #[error("image type '{0}' cannot be stored in the legacy table")]
    UnsupportedImageType(ImageType),

    /// Host failure
    #[error("host error: {0}")]
    Host(#[from] HostError),
}

impl StoreError {
    /// Check if error signals an ambiguous identifier
    #[inline]
    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::AmbiguousTerm { .. })
    }

    /// Check if error was raised before any storage was touched
    #[inline]
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Self::Host(_))
    }
}

impl From<ResolveError> for StoreError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NotFound(term) => Self::TermNotFound(term),
            ResolveError::Ambiguous {
                term_id,
                taxonomies,
            } => Self::AmbiguousTerm {
                term_id,
                taxonomies,
            },
        }
    }
}

/// Errors while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error during file read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML could not be parsed
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ConfigError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors while saving settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Submitted value is not a settings record
    #[error("malformed settings: {0}")]
    Malformed(String),

    /// Host failure
    #[error("host error: {0}")]
    Host(#[from] HostError),
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display() {
        assert_eq!(StoreError::InvalidImageId.to_string(), "invalid image id");
        let err = StoreError::UnsupportedImageType(ImageType::new("hero"));
        assert!(err.to_string().contains("hero"));
    }

    #[test]
    fn resolve_error_conversions() {
        let err: StoreError = ResolveError::Ambiguous {
            term_id: TermId(4),
            taxonomies: vec!["category".into(), "post_tag".into()],
        }
        .into();
        assert!(err.is_ambiguous());
        assert!(err.is_rejection());

        let err: StoreError = ResolveError::NotFound(TermRef::by_id(9)).into();
        assert!(matches!(err, StoreError::TermNotFound(_)));
    }

    #[test]
    fn host_errors_are_not_rejections() {
        let err: StoreError = HostError::storage("disk full").into();
        assert!(!err.is_rejection());
        assert_eq!(err.to_string(), "host error: storage error: disk full");
    }
}
