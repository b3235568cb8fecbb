//! Identifier primitives
//!
//! Provides the strongly-typed identifiers shared by every store:
//! [`TermId`], [`TermTaxonomyId`], [`AttachmentId`] and [`ImageType`],
//! plus the [`TermRef`] sum type callers hand to the facade.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::num::NonZeroU64;

/// Meta key used for the default (featured) image slot
pub const FEATURED_META_KEY: &str = "taxonomy_image_id";

/// Primary term identifier
///
/// Unique per term, but a single term row may be bound to several
/// taxonomies on older hosts, so it does not always pick one binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermId(pub u64);

impl Display for TermId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Composite identifier of a (term, taxonomy) binding
///
/// Unambiguous. The legacy association table is keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermTaxonomyId(pub u64);

impl Display for TermTaxonomyId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to an image attachment
///
/// Always positive: zero and negative values mean "no association"
/// and cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct AttachmentId(NonZeroU64);

impl AttachmentId {
    /// Create from an unsigned value, `None` for zero
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Option<Self> {
        match NonZeroU64::new(raw) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    /// Create from a signed value
    ///
    /// Negative values are rejected rather than folded to their absolute value.
    #[inline]
    #[must_use]
    pub fn from_signed(raw: i64) -> Option<Self> {
        u64::try_from(raw).ok().and_then(Self::new)
    }

    /// Parse user input (form fields, stored meta values)
    ///
    /// Surrounding whitespace is ignored. Non-numeric, zero and negative
    /// input yields `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse::<i64>().ok().and_then(Self::from_signed)
    }

    /// Raw value
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl Display for AttachmentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u64> for AttachmentId {
    type Error = String;

    fn try_from(raw: u64) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or_else(|| "attachment id must be positive".to_string())
    }
}

impl From<AttachmentId> for u64 {
    fn from(id: AttachmentId) -> Self {
        id.get()
    }
}

/// Image slot discriminator
///
/// The empty type is the default (featured) image. Any other value names
/// an alternate slot registered by an extension.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageType(String);

impl ImageType {
    /// The default (featured) image slot
    #[inline]
    #[must_use]
    pub fn featured() -> Self {
        Self(String::new())
    }

    /// Create a type from untrusted input, sanitized as a key
    #[must_use]
    pub fn new(raw: &str) -> Self {
        Self(sanitize_key(raw))
    }

    /// Whether this is the default slot
    #[inline]
    #[must_use]
    pub fn is_featured(&self) -> bool {
        self.0.is_empty()
    }

    /// Sanitized type id
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Term meta key this slot is persisted under
    #[must_use]
    pub fn meta_key(&self) -> String {
        if self.is_featured() {
            FEATURED_META_KEY.to_string()
        } else {
            format!("taxonomy_image_{}_id", self.0)
        }
    }
}

impl Display for ImageType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_featured() {
            f.write_str("featured")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// Sanitize a key: lowercase ASCII letters, digits, `_` and `-` only
#[must_use]
pub fn sanitize_key(raw: &str) -> String {
    raw.chars()
        .map(|c| c.to_ascii_lowercase())
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_' || *c == '-')
        .collect()
}

/// Reference to a taxonomy term as supplied by a caller
///
/// Normalized once at the boundary by
/// [`IdentifierResolver::normalize`](crate::resolver::IdentifierResolver::normalize).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "by")]
pub enum TermRef {
    /// Primary identifier only; may be ambiguous across taxonomies
    ById {
        /// Primary identifier
        term_id: TermId,
    },

    /// Composite identifier from legacy code paths
    ByComposite {
        /// Composite identifier
        term_taxonomy_id: TermTaxonomyId,
    },

    /// Primary identifier disambiguated by taxonomy
    Resolved {
        /// Primary identifier
        term_id: TermId,
        /// Taxonomy the caller means
        taxonomy: String,
    },
}

impl TermRef {
    /// Reference by primary identifier
    #[inline]
    #[must_use]
    pub const fn by_id(term_id: u64) -> Self {
        Self::ById {
            term_id: TermId(term_id),
        }
    }

    /// Reference by composite identifier
    #[inline]
    #[must_use]
    pub const fn by_composite(term_taxonomy_id: u64) -> Self {
        Self::ByComposite {
            term_taxonomy_id: TermTaxonomyId(term_taxonomy_id),
        }
    }

    /// Reference by primary identifier within a taxonomy
    #[must_use]
    pub fn resolved(term_id: u64, taxonomy: impl Into<String>) -> Self {
        Self::Resolved {
            term_id: TermId(term_id),
            taxonomy: taxonomy.into(),
        }
    }

    /// Build from an optional taxonomy hint, as sent by admin forms
    #[must_use]
    pub fn with_hint(term_id: TermId, taxonomy: Option<&str>) -> Self {
        match taxonomy.map(str::trim).filter(|t| !t.is_empty()) {
            Some(taxonomy) => Self::Resolved {
                term_id,
                taxonomy: taxonomy.to_string(),
            },
            None => Self::ById { term_id },
        }
    }
}

impl From<TermId> for TermRef {
    fn from(term_id: TermId) -> Self {
        Self::ById { term_id }
    }
}

impl From<TermTaxonomyId> for TermRef {
    fn from(term_taxonomy_id: TermTaxonomyId) -> Self {
        Self::ByComposite { term_taxonomy_id }
    }
}

impl Display for TermRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::ById { term_id } => write!(f, "term {term_id}"),
            Self::ByComposite { term_taxonomy_id } => {
                write!(f, "term_taxonomy {term_taxonomy_id}")
            }
            Self::Resolved { term_id, taxonomy } => write!(f, "term {term_id} in '{taxonomy}'"),
        }
    }
}
