//! Association facade
//!
//! Provides [`TermImages`], the surface admin controls, AJAX handlers
//! and query accessors go through. It normalizes term references once,
//! validates attachment ids before touching storage, and delegates to
//! whichever [`AssociationStore`] was selected for the request.

use crate::error::StoreError;
use crate::resolver::IdentifierResolver;
use crate::store::{AssociationStore, Backend, WriteOutcome};
use crate::types::{AttachmentId, ImageType, TermRef};
use std::sync::Arc;

/// Term image associations for one request
#[derive(Debug, Clone)]
pub struct TermImages {
    resolver: Arc<IdentifierResolver>,
    store: Arc<dyn AssociationStore>,
}

impl TermImages {
    /// Create facade over a resolver and the selected store
    #[must_use]
    pub fn new(resolver: Arc<IdentifierResolver>, store: Arc<dyn AssociationStore>) -> Self {
        Self { resolver, store }
    }

    /// Active backend
    #[inline]
    #[must_use]
    pub fn backend(&self) -> Backend {
        self.store.backend()
    }

    /// Attachment associated with a term, `None` if there is none
    ///
    /// Unresolvable references read as `None`.
    #[must_use]
    pub fn get_image_id(&self, term: &TermRef, image_type: &ImageType) -> Option<AttachmentId> {
        let key = self.resolver.normalize(term).ok()?;
        self.store.get(&key, image_type)
    }

    /// Create or replace an association from an untrusted attachment id
    ///
    /// # Errors
    /// [`StoreError::InvalidImageId`] for zero or negative ids, then any
    /// error from [`TermImages::set_image`]
    pub fn update_image_id(
        &self,
        term: &TermRef,
        attachment: i64,
        image_type: &ImageType,
    ) -> Result<WriteOutcome, StoreError> {
        let Some(attachment) = AttachmentId::from_signed(attachment) else {
            tracing::warn!(%term, attachment, "rejected invalid image id");
            return Err(StoreError::InvalidImageId);
        };
        self.set_image(term, attachment, image_type)
    }

    /// Create or replace an association
    ///
    /// # Errors
    /// Returns error if the term does not resolve, resolves ambiguously,
    /// the backend cannot store the image type, or the host write fails
    pub fn set_image(
        &self,
        term: &TermRef,
        attachment: AttachmentId,
        image_type: &ImageType,
    ) -> Result<WriteOutcome, StoreError> {
        let result = self
            .resolver
            .normalize(term)
            .map_err(StoreError::from)
            .and_then(|key| self.store.set(&key, image_type, attachment));
        if let Err(err) = &result {
            tracing::warn!(%term, %image_type, error = %err, "term image write rejected");
        }
        result
    }

    /// Remove an association; succeeds if none existed
    ///
    /// # Errors
    /// Same conditions as [`TermImages::set_image`]
    pub fn delete_image(&self, term: &TermRef, image_type: &ImageType) -> Result<bool, StoreError> {
        let result = self
            .resolver
            .normalize(term)
            .map_err(StoreError::from)
            .and_then(|key| self.store.delete(&key, image_type));
        if let Err(err) = &result {
            tracing::warn!(%term, %image_type, error = %err, "term image delete rejected");
        }
        result
    }

    /// Taxonomy of a term, empty if it cannot be resolved
    ///
    /// A bare identifier shared by several taxonomies reports the first
    /// binding.
    #[must_use]
    pub fn get_taxonomy(&self, term: &TermRef) -> String {
        self.resolver
            .normalize(term)
            .map(|key| key.primary().taxonomy.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Host;
    use crate::memory::InMemoryHost;
    use crate::store::{LegacyAssociations, ModernBackend, TermMetaBridge};

    fn facade() -> (Arc<InMemoryHost>, TermImages) {
        let host = Arc::new(InMemoryHost::new());
        host.insert_term(7, 42, "category", "News");
        host.insert_term(5, 50, "category", "Shared");
        host.insert_term(5, 51, "post_tag", "Shared");
        let dyn_host: Arc<dyn Host> = host.clone();
        let legacy = Arc::new(LegacyAssociations::new(Arc::clone(&dyn_host), "taxonomy_image_plugin"));
        let store = TermMetaBridge::new(ModernBackend::new(Arc::clone(&dyn_host), true), legacy);
        let images = TermImages::new(Arc::new(IdentifierResolver::new(dyn_host)), Arc::new(store));
        (host, images)
    }

    #[test]
    fn invalid_ids_rejected_before_resolution() {
        let (host, images) = facade();
        let featured = ImageType::featured();
        for raw in [0, -5] {
            assert!(matches!(
                images.update_image_id(&TermRef::by_id(404), raw, &featured),
                Err(StoreError::InvalidImageId)
            ));
        }
        assert_eq!(host.option_writes(), 0);
    }

    #[test]
    fn unknown_term_reads_none_and_rejects_writes() {
        let (_host, images) = facade();
        let featured = ImageType::featured();
        assert!(images.get_image_id(&TermRef::by_composite(999), &featured).is_none());
        assert!(matches!(
            images.update_image_id(&TermRef::by_composite(999), 3, &featured),
            Err(StoreError::TermNotFound(_))
        ));
        assert_eq!(images.get_taxonomy(&TermRef::by_id(999)), "");
    }

    #[test]
    fn shared_id_needs_taxonomy_for_writes() {
        let (_host, images) = facade();
        let featured = ImageType::featured();
        let err = images.update_image_id(&TermRef::by_id(5), 3, &featured).unwrap_err();
        assert!(err.is_ambiguous());

        images.update_image_id(&TermRef::resolved(5, "post_tag"), 3, &featured).unwrap();
        assert_eq!(
            images.get_image_id(&TermRef::by_composite(51), &featured),
            AttachmentId::new(3)
        );
        assert_eq!(images.get_taxonomy(&TermRef::by_id(5)), "category");
    }

    #[test]
    fn composite_and_primary_refs_agree() {
        let (_host, images) = facade();
        let featured = ImageType::featured();
        images.update_image_id(&TermRef::by_composite(42), 99, &featured).unwrap();
        assert_eq!(images.get_image_id(&TermRef::by_id(7), &featured), AttachmentId::new(99));
        assert!(images.delete_image(&TermRef::by_id(7), &featured).unwrap());
        assert!(images.get_image_id(&TermRef::by_composite(42), &featured).is_none());
    }
}
