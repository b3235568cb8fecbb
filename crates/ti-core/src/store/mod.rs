//! Association stores
//!
//! An association maps a (term, image type) pair to an attachment. Two
//! backends exist:
//!
//! - [`LegacyBackend`]: one serialized option blob keyed by composite
//!   identifier, default image type only
//! - [`ModernBackend`]: one term meta record per (term, image type)
//!
//! [`TermMetaBridge`] decorates the modern backend and mirrors every
//! default-type write into the legacy blob. The active store is selected
//! once per request by [`select_store`].

mod bridge;
mod legacy;
mod modern;

pub use bridge::TermMetaBridge;
pub use legacy::{encode, LegacyAssociations, LegacyBackend, LegacyTable};
pub use modern::ModernBackend;

use crate::config::TaxonomyImagesConfig;
use crate::error::StoreError;
use crate::host::{Host, MetaWrite};
use crate::resolver::TermKey;
use crate::types::{AttachmentId, ImageType};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Display};
use std::sync::Arc;

/// Which storage mechanism is the path of record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Serialized option blob
    Legacy,
    /// Term meta without mirroring
    Modern,
    /// Term meta mirrored into the option blob
    Bridged,
}

impl Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Legacy => "legacy",
            Self::Modern => "modern",
            Self::Bridged => "bridged",
        })
    }
}

/// Successful write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
    /// No association existed before
    Created,
    /// An existing association was replaced
    Updated,
}

impl From<MetaWrite> for WriteOutcome {
    fn from(write: MetaWrite) -> Self {
        match write {
            MetaWrite::Created => Self::Created,
            MetaWrite::Updated => Self::Updated,
        }
    }
}

/// Storage backend for term image associations
///
/// Reads never fail: anything that cannot be resolved reads as `None`.
pub trait AssociationStore: Send + Sync + Debug {
    /// Backend kind
    fn backend(&self) -> Backend;

    /// Read the association for a term and image type
    fn get(&self, term: &TermKey, image_type: &ImageType) -> Option<AttachmentId>;

    /// Create or replace an association
    ///
    /// # Errors
    /// Returns error if the term reference is ambiguous, the backend
    /// cannot hold this image type, or the host rejects the write
    fn set(
        &self,
        term: &TermKey,
        image_type: &ImageType,
        attachment: AttachmentId,
    ) -> Result<WriteOutcome, StoreError>;

    /// Remove an association; succeeds if none existed
    ///
    /// # Errors
    /// Same conditions as [`AssociationStore::set`]
    fn delete(&self, term: &TermKey, image_type: &ImageType) -> Result<bool, StoreError>;
}

/// Pick the store for this request from detected host capability
#[must_use]
pub fn select_store(
    host: &Arc<dyn Host>,
    config: &TaxonomyImagesConfig,
    legacy: &Arc<LegacyAssociations>,
) -> Box<dyn AssociationStore> {
    let modern = ModernBackend::new(Arc::clone(host), config.term_meta_enabled);
    let store: Box<dyn AssociationStore> = if !modern.supported() {
        Box::new(LegacyBackend::new(Arc::clone(legacy)))
    } else if config.bridge_enabled {
        Box::new(TermMetaBridge::new(modern, Arc::clone(legacy)))
    } else {
        Box::new(modern)
    };
    tracing::debug!(backend = %store.backend(), "selected association store");
    store
}
