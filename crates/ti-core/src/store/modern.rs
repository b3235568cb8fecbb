//! Term meta store
//!
//! One record per (term, image type), keyed by the term's primary
//! identifier and the image type's meta key. Hosts without term meta
//! (or installations that opted out) get a store that reads nothing and
//! refuses every write.

use super::{AssociationStore, Backend, WriteOutcome};
use crate::error::StoreError;
use crate::host::Host;
use crate::resolver::TermKey;
use crate::types::{AttachmentId, ImageType, TermId};
use std::fmt;
use std::sync::Arc;

/// Store over per-term metadata
#[derive(Clone)]
pub struct ModernBackend {
    host: Arc<dyn Host>,
    enabled: bool,
}

impl fmt::Debug for ModernBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModernBackend")
            .field("enabled", &self.enabled)
            .field("supported", &self.supported())
            .finish()
    }
}

impl ModernBackend {
    /// Create store; `enabled = false` is the installation opt-out
    #[inline]
    #[must_use]
    pub fn new(host: Arc<dyn Host>, enabled: bool) -> Self {
        Self { host, enabled }
    }

    /// Term meta is available and not opted out
    #[inline]
    #[must_use]
    pub fn supported(&self) -> bool {
        self.enabled && self.host.supports_term_meta()
    }

    /// Read the raw record for a primary identifier
    #[must_use]
    pub fn read(&self, term_id: TermId, meta_key: &str) -> Option<AttachmentId> {
        if !self.supported() {
            return None;
        }
        self.host
            .get_term_meta(term_id, meta_key)
            .as_deref()
            .and_then(AttachmentId::parse)
    }
}

impl AssociationStore for ModernBackend {
    fn backend(&self) -> Backend {
        Backend::Modern
    }

    fn get(&self, term: &TermKey, image_type: &ImageType) -> Option<AttachmentId> {
        self.read(term.term_id(), &image_type.meta_key())
    }

    fn set(
        &self,
        term: &TermKey,
        image_type: &ImageType,
        attachment: AttachmentId,
    ) -> Result<WriteOutcome, StoreError> {
        if !self.supported() {
            return Err(StoreError::Unsupported);
        }
        let term = term.bound()?;
        let key = image_type.meta_key();
        let write = self
            .host
            .update_term_meta(term.term_id, &key, &attachment.to_string())?;
        tracing::info!(
            term_id = term.term_id.0,
            meta_key = %key,
            attachment_id = attachment.get(),
            ?write,
            "stored term image"
        );
        Ok(write.into())
    }

    fn delete(&self, term: &TermKey, image_type: &ImageType) -> Result<bool, StoreError> {
        if !self.supported() {
            return Err(StoreError::Unsupported);
        }
        let term = term.bound()?;
        let key = image_type.meta_key();
        if self.host.delete_term_meta(term.term_id, &key)? {
            tracing::info!(term_id = term.term_id.0, meta_key = %key, "removed term image");
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::TermMetaStore;
    use crate::memory::InMemoryHost;
    use crate::resolver::ResolvedTerm;
    use crate::types::TermTaxonomyId;

    fn attachment(id: u64) -> AttachmentId {
        AttachmentId::new(id).unwrap()
    }

    fn bound(term_id: u64) -> TermKey {
        TermKey::Bound(ResolvedTerm {
            term_id: TermId(term_id),
            term_taxonomy_id: TermTaxonomyId(term_id + 100),
            taxonomy: "category".into(),
        })
    }

    fn shared(term_id: u64) -> TermKey {
        TermKey::Shared {
            term_id: TermId(term_id),
            candidates: vec![
                ResolvedTerm {
                    term_id: TermId(term_id),
                    term_taxonomy_id: TermTaxonomyId(1),
                    taxonomy: "category".into(),
                },
                ResolvedTerm {
                    term_id: TermId(term_id),
                    term_taxonomy_id: TermTaxonomyId(2),
                    taxonomy: "post_tag".into(),
                },
            ],
        }
    }

    #[test]
    fn set_reports_created_then_updated() {
        let host = Arc::new(InMemoryHost::new());
        let store = ModernBackend::new(host.clone(), true);
        let featured = ImageType::featured();

        assert_eq!(store.set(&bound(7), &featured, attachment(9)).unwrap(), WriteOutcome::Created);
        assert_eq!(store.set(&bound(7), &featured, attachment(10)).unwrap(), WriteOutcome::Updated);
        assert_eq!(store.get(&bound(7), &featured), Some(attachment(10)));
        assert_eq!(host.raw_term_meta(TermId(7), "taxonomy_image_id").as_deref(), Some("10"));
    }

    #[test]
    fn image_types_are_independent() {
        let store = ModernBackend::new(Arc::new(InMemoryHost::new()), true);
        let hero = ImageType::new("hero");

        store.set(&bound(7), &hero, attachment(3)).unwrap();
        assert_eq!(store.get(&bound(7), &hero), Some(attachment(3)));
        assert!(store.get(&bound(7), &ImageType::featured()).is_none());
    }

    #[test]
    fn shared_term_write_is_ambiguous() {
        let store = ModernBackend::new(Arc::new(InMemoryHost::new()), true);
        let err = store.set(&shared(5), &ImageType::featured(), attachment(1)).unwrap_err();
        assert!(err.is_ambiguous());
        assert!(store.delete(&shared(5), &ImageType::featured()).unwrap_err().is_ambiguous());
    }

    #[test]
    fn shared_term_read_uses_primary_id() {
        let host = Arc::new(InMemoryHost::new());
        host.update_term_meta(TermId(5), "taxonomy_image_id", "8").unwrap();
        let store = ModernBackend::new(host, true);
        assert_eq!(store.get(&shared(5), &ImageType::featured()), Some(attachment(8)));
    }

    #[test]
    fn unsupported_degrades_without_panicking() {
        let host = Arc::new(InMemoryHost::new());
        host.update_term_meta(TermId(7), "taxonomy_image_id", "8").unwrap();
        host.set_term_meta_supported(false);
        let store = ModernBackend::new(host, true);
        let featured = ImageType::featured();

        assert!(!store.supported());
        assert!(store.get(&bound(7), &featured).is_none());
        assert!(matches!(store.set(&bound(7), &featured, attachment(1)), Err(StoreError::Unsupported)));
        assert!(matches!(store.delete(&bound(7), &featured), Err(StoreError::Unsupported)));
    }

    #[test]
    fn opt_out_disables_store() {
        let store = ModernBackend::new(Arc::new(InMemoryHost::new()), false);
        assert!(!store.supported());
        assert!(store.set(&bound(7), &ImageType::featured(), attachment(1)).is_err());
    }

    #[test]
    fn garbage_meta_reads_as_absent() {
        let host = Arc::new(InMemoryHost::new());
        host.update_term_meta(TermId(7), "taxonomy_image_id", "nope").unwrap();
        host.update_term_meta(TermId(8), "taxonomy_image_id", "0").unwrap();
        let store = ModernBackend::new(host, true);
        assert!(store.get(&bound(7), &ImageType::featured()).is_none());
        assert!(store.get(&bound(8), &ImageType::featured()).is_none());
    }

    #[test]
    fn delete_absent_succeeds() {
        let store = ModernBackend::new(Arc::new(InMemoryHost::new()), true);
        assert!(store.delete(&bound(7), &ImageType::featured()).unwrap());
    }
}
