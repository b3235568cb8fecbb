//! Compatibility bridge
//!
//! Decorates [`ModernBackend`] so the legacy table stays a mirror of
//! default-type term meta:
//!
//! - writes are propagated eagerly (create, update, delete)
//! - legacy data is surfaced lazily on read and never copied back
//!
//! Custom image types have no legacy representation and pass straight
//! through to term meta.

use super::{AssociationStore, Backend, LegacyAssociations, ModernBackend, WriteOutcome};
use crate::error::StoreError;
use crate::resolver::{ResolvedTerm, TermKey};
use crate::types::{AttachmentId, ImageType, FEATURED_META_KEY};
use std::sync::Arc;

/// Term meta store mirrored into the legacy table
#[derive(Debug, Clone)]
pub struct TermMetaBridge {
    inner: ModernBackend,
    legacy: Arc<LegacyAssociations>,
}

impl TermMetaBridge {
    /// Wrap a term meta store
    #[inline]
    #[must_use]
    pub fn new(inner: ModernBackend, legacy: Arc<LegacyAssociations>) -> Self {
        Self { inner, legacy }
    }

    /// Wrapped store
    #[inline]
    #[must_use]
    pub fn inner(&self) -> &ModernBackend {
        &self.inner
    }

    fn applies(&self, meta_key: &str) -> bool {
        meta_key == FEATURED_META_KEY && self.inner.supported()
    }

    /// Mirror a newly created term meta record
    ///
    /// # Errors
    /// Returns error if the legacy table cannot be persisted
    pub fn on_meta_added(
        &self,
        term: &ResolvedTerm,
        meta_key: &str,
        attachment: AttachmentId,
    ) -> Result<(), StoreError> {
        if !self.applies(meta_key) {
            return Ok(());
        }
        self.legacy.set(term.term_taxonomy_id, attachment)?;
        Ok(())
    }

    /// Mirror a replaced term meta record
    ///
    /// # Errors
    /// Returns error if the legacy table cannot be persisted
    pub fn on_meta_updated(
        &self,
        term: &ResolvedTerm,
        meta_key: &str,
        attachment: AttachmentId,
    ) -> Result<(), StoreError> {
        self.on_meta_added(term, meta_key, attachment)
    }

    /// Mirror a removed term meta record
    ///
    /// # Errors
    /// Returns error if the legacy table cannot be persisted
    pub fn on_meta_deleted(&self, term: &ResolvedTerm, meta_key: &str) -> Result<(), StoreError> {
        if !self.applies(meta_key) {
            return Ok(());
        }
        self.legacy.delete(term.term_taxonomy_id)?;
        Ok(())
    }

    /// Fill an absent term meta read from the legacy table
    #[must_use]
    pub fn filter_meta_read(
        &self,
        term: &ResolvedTerm,
        meta_key: &str,
        value: Option<AttachmentId>,
    ) -> Option<AttachmentId> {
        if value.is_some() || !self.applies(meta_key) {
            return value;
        }
        let synthesized = self.legacy.image_id(term.term_taxonomy_id);
        if let Some(id) = synthesized {
            tracing::debug!(
                term_id = term.term_id.0,
                term_taxonomy_id = term.term_taxonomy_id.0,
                attachment_id = id.get(),
                "surfaced legacy association"
            );
        }
        synthesized
    }
}

impl AssociationStore for TermMetaBridge {
    fn backend(&self) -> Backend {
        Backend::Bridged
    }

    fn get(&self, term: &TermKey, image_type: &ImageType) -> Option<AttachmentId> {
        let value = self.inner.get(term, image_type);
        self.filter_meta_read(term.primary(), &image_type.meta_key(), value)
    }

    /// Write term meta, then mirror it
    ///
    /// If the mirror cannot be persisted the term meta record is put
    /// back the way it was and the mirror error is returned.
    fn set(
        &self,
        term: &TermKey,
        image_type: &ImageType,
        attachment: AttachmentId,
    ) -> Result<WriteOutcome, StoreError> {
        let previous = self.inner.get(term, image_type);
        let outcome = self.inner.set(term, image_type, attachment)?;
        let bound = term.bound()?;
        let key = image_type.meta_key();
        let mirrored = match outcome {
            WriteOutcome::Created => self.on_meta_added(bound, &key, attachment),
            WriteOutcome::Updated => self.on_meta_updated(bound, &key, attachment),
        };
        if let Err(err) = mirrored {
            self.restore(term, image_type, previous);
            return Err(err);
        }
        Ok(outcome)
    }

    /// Remove term meta, then the mirrored entry; term meta is restored if the mirror fails
    fn delete(&self, term: &TermKey, image_type: &ImageType) -> Result<bool, StoreError> {
        let previous = self.inner.get(term, image_type);
        let deleted = self.inner.delete(term, image_type)?;
        if let Err(err) = self.on_meta_deleted(term.bound()?, &image_type.meta_key()) {
            self.restore(term, image_type, previous);
            return Err(err);
        }
        Ok(deleted)
    }
}

impl TermMetaBridge {
    fn restore(&self, term: &TermKey, image_type: &ImageType, previous: Option<AttachmentId>) {
        let restored = match previous {
            Some(id) => self.inner.set(term, image_type, id).map(|_| ()),
            None => self.inner.delete(term, image_type).map(|_| ()),
        };
        match restored {
            Ok(()) => tracing::warn!(
                term_id = term.term_id().0,
                image_type = %image_type,
                "legacy mirror failed, term meta restored"
            ),
            Err(err) => tracing::error!(
                term_id = term.term_id().0,
                image_type = %image_type,
                error = %err,
                "legacy mirror failed and term meta could not be restored"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Host, TermMetaStore};
    use crate::memory::InMemoryHost;
    use crate::types::{TermId, TermTaxonomyId};
    use pretty_assertions::assert_eq;

    fn attachment(id: u64) -> AttachmentId {
        AttachmentId::new(id).unwrap()
    }

    fn news() -> ResolvedTerm {
        ResolvedTerm {
            term_id: TermId(7),
            term_taxonomy_id: TermTaxonomyId(42),
            taxonomy: "category".into(),
        }
    }

    fn setup() -> (Arc<InMemoryHost>, Arc<LegacyAssociations>, TermMetaBridge) {
        let host = Arc::new(InMemoryHost::new());
        let dyn_host: Arc<dyn Host> = host.clone();
        let legacy = Arc::new(LegacyAssociations::new(Arc::clone(&dyn_host), "taxonomy_image_plugin"));
        let bridge = TermMetaBridge::new(ModernBackend::new(dyn_host, true), Arc::clone(&legacy));
        (host, legacy, bridge)
    }

    #[test]
    fn writes_mirror_into_legacy() {
        let (_host, legacy, bridge) = setup();
        let key = TermKey::Bound(news());
        let featured = ImageType::featured();

        assert_eq!(bridge.set(&key, &featured, attachment(99)).unwrap(), WriteOutcome::Created);
        assert_eq!(legacy.image_id(TermTaxonomyId(42)), Some(attachment(99)));

        assert_eq!(bridge.set(&key, &featured, attachment(100)).unwrap(), WriteOutcome::Updated);
        assert_eq!(legacy.image_id(TermTaxonomyId(42)), Some(attachment(100)));

        assert!(bridge.delete(&key, &featured).unwrap());
        assert!(legacy.image_id(TermTaxonomyId(42)).is_none());
    }

    #[test]
    fn custom_types_are_not_mirrored() {
        let (host, legacy, bridge) = setup();
        let key = TermKey::Bound(news());

        bridge.set(&key, &ImageType::new("hero"), attachment(5)).unwrap();
        assert!(legacy.get().is_empty());
        assert_eq!(host.option_writes(), 0);
        assert_eq!(bridge.get(&key, &ImageType::new("hero")), Some(attachment(5)));
    }

    #[test]
    fn failed_mirror_restores_term_meta() {
        let (host, legacy, bridge) = setup();
        let key = TermKey::Bound(news());
        let featured = ImageType::featured();
        bridge.set(&key, &featured, attachment(99)).unwrap();

        host.reject_option_writes(true);
        assert!(bridge.set(&key, &featured, attachment(100)).is_err());
        assert_eq!(host.raw_term_meta(TermId(7), FEATURED_META_KEY).as_deref(), Some("99"));

        assert!(bridge.delete(&key, &featured).is_err());
        assert_eq!(host.raw_term_meta(TermId(7), FEATURED_META_KEY).as_deref(), Some("99"));
        assert_eq!(legacy.image_id(TermTaxonomyId(42)), Some(attachment(99)));

        let fresh = TermKey::Bound(ResolvedTerm {
            term_id: TermId(8),
            term_taxonomy_id: TermTaxonomyId(43),
            taxonomy: "category".into(),
        });
        assert!(bridge.set(&fresh, &featured, attachment(5)).is_err());
        assert!(host.raw_term_meta(TermId(8), FEATURED_META_KEY).is_none());

        host.reject_option_writes(false);
        assert_eq!(bridge.set(&key, &featured, attachment(100)).unwrap(), WriteOutcome::Updated);
        assert_eq!(legacy.image_id(TermTaxonomyId(42)), Some(attachment(100)));
    }

    #[test]
    fn read_synthesizes_without_persisting() {
        let (host, legacy, bridge) = setup();
        legacy.set(TermTaxonomyId(42), attachment(99)).unwrap();
        let key = TermKey::Bound(news());

        assert_eq!(bridge.get(&key, &ImageType::featured()), Some(attachment(99)));
        assert!(host.get_term_meta(TermId(7), FEATURED_META_KEY).is_none());
    }

    #[test]
    fn modern_value_wins_over_legacy() {
        let (host, legacy, bridge) = setup();
        legacy.set(TermTaxonomyId(42), attachment(1)).unwrap();
        host.update_term_meta(TermId(7), FEATURED_META_KEY, "2").unwrap();

        assert_eq!(bridge.get(&TermKey::Bound(news()), &ImageType::featured()), Some(attachment(2)));
    }

    #[test]
    fn delete_clears_synthesized_entry() {
        let (_host, legacy, bridge) = setup();
        legacy.set(TermTaxonomyId(42), attachment(99)).unwrap();
        let key = TermKey::Bound(news());

        assert!(bridge.delete(&key, &ImageType::featured()).unwrap());
        assert!(bridge.get(&key, &ImageType::featured()).is_none());
    }

    #[test]
    fn hooks_ignore_unrelated_keys() {
        let (host, legacy, bridge) = setup();
        bridge.on_meta_added(&news(), "color", attachment(3)).unwrap();
        bridge.on_meta_deleted(&news(), "color").unwrap();
        assert!(legacy.get().is_empty());
        assert_eq!(host.option_writes(), 0);
        assert!(bridge.filter_meta_read(&news(), "color", None).is_none());
    }

    #[test]
    fn hooks_stand_down_without_term_meta() {
        let (host, legacy, bridge) = setup();
        legacy.set(TermTaxonomyId(42), attachment(99)).unwrap();
        host.set_term_meta_supported(false);

        assert!(bridge.filter_meta_read(&news(), FEATURED_META_KEY, None).is_none());
        bridge.on_meta_deleted(&news(), FEATURED_META_KEY).unwrap();
        assert_eq!(legacy.image_id(TermTaxonomyId(42)), Some(attachment(99)));
    }
}
