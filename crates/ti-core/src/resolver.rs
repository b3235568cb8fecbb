//! Identifier resolution
//!
//! Provides [`IdentifierResolver`], which maps composite identifiers to
//! (term, taxonomy) pairs and back, and [`TermKey`], the normalized form
//! of a [`TermRef`] every store operates on.
//!
//! Resolutions are cached for the lifetime of the resolver, which is one
//! request. Term-taxonomy bindings do not change mid-request, so the
//! cache is never invalidated.

use crate::error::ResolveError;
use crate::host::{Host, TermRecord};
use crate::types::{TermId, TermRef, TermTaxonomyId};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A term binding known to exist
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedTerm {
    /// Primary identifier
    pub term_id: TermId,
    /// Composite identifier
    pub term_taxonomy_id: TermTaxonomyId,
    /// Taxonomy name
    pub taxonomy: String,
}

impl From<&TermRecord> for ResolvedTerm {
    fn from(record: &TermRecord) -> Self {
        Self {
            term_id: record.term_id,
            term_taxonomy_id: record.term_taxonomy_id,
            taxonomy: record.taxonomy.clone(),
        }
    }
}

/// Normalized term reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermKey {
    /// Exactly one binding
    Bound(ResolvedTerm),

    /// Bare primary identifier bound to several taxonomies
    Shared {
        /// Shared primary identifier
        term_id: TermId,
        /// All bindings, in registry order (never empty)
        candidates: Vec<ResolvedTerm>,
    },
}

impl TermKey {
    /// Primary identifier
    #[inline]
    #[must_use]
    pub fn term_id(&self) -> TermId {
        match self {
            Self::Bound(term) => term.term_id,
            Self::Shared { term_id, .. } => *term_id,
        }
    }

    /// Binding used for reads: the bound one, or the first candidate
    #[must_use]
    pub fn primary(&self) -> &ResolvedTerm {
        match self {
            Self::Bound(term) => term,
            Self::Shared { candidates, .. } => &candidates[0],
        }
    }

    /// Binding used for writes
    ///
    /// # Errors
    /// Returns [`ResolveError::Ambiguous`] for a shared primary identifier
    pub fn bound(&self) -> Result<&ResolvedTerm, ResolveError> {
        match self {
            Self::Bound(term) => Ok(term),
            Self::Shared {
                term_id,
                candidates,
            } => Err(ResolveError::Ambiguous {
                term_id: *term_id,
                taxonomies: candidates.iter().map(|c| c.taxonomy.clone()).collect(),
            }),
        }
    }
}

/// Resolves term references against the host registry, with a request cache
pub struct IdentifierResolver {
    host: Arc<dyn Host>,
    by_composite: DashMap<TermTaxonomyId, ResolvedTerm>,
    by_term: DashMap<TermId, Vec<ResolvedTerm>>,
}

impl fmt::Debug for IdentifierResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentifierResolver")
            .field("cached_composites", &self.by_composite.len())
            .field("cached_terms", &self.by_term.len())
            .finish_non_exhaustive()
    }
}

impl IdentifierResolver {
    /// Create resolver with an empty cache
    #[must_use]
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self {
            host,
            by_composite: DashMap::new(),
            by_term: DashMap::new(),
        }
    }

    /// Resolve a composite identifier to its (term, taxonomy) pair
    ///
    /// `None` if the binding does not exist (the term may have been deleted).
    #[must_use]
    pub fn resolve_composite(&self, id: TermTaxonomyId) -> Option<ResolvedTerm> {
        if let Some(hit) = self.by_composite.get(&id) {
            return Some(hit.clone());
        }

        let resolved = self.host.term_by_composite(id).map(|r| ResolvedTerm::from(&r));
        match &resolved {
            Some(term) => {
                tracing::debug!(
                    term_taxonomy_id = id.0,
                    term_id = term.term_id.0,
                    taxonomy = %term.taxonomy,
                    "resolved composite identifier"
                );
                self.by_composite.insert(id, term.clone());
            }
            None => tracing::debug!(term_taxonomy_id = id.0, "composite identifier not found"),
        }
        resolved
    }

    /// All bindings of a primary identifier
    #[must_use]
    pub fn bindings(&self, id: TermId) -> Vec<ResolvedTerm> {
        if let Some(hit) = self.by_term.get(&id) {
            return hit.clone();
        }

        let bindings: Vec<ResolvedTerm> = self
            .host
            .terms_by_id(id)
            .iter()
            .map(ResolvedTerm::from)
            .collect();
        if !bindings.is_empty() {
            for binding in &bindings {
                self.by_composite
                    .insert(binding.term_taxonomy_id, binding.clone());
            }
            self.by_term.insert(id, bindings.clone());
        }
        bindings
    }

    /// Taxonomy of a term given only its primary identifier
    ///
    /// # Errors
    /// Returns [`ResolveError::NotFound`] if the term does not exist and
    /// [`ResolveError::Ambiguous`] if it is bound to several taxonomies
    pub fn taxonomy_of(&self, id: TermId) -> Result<String, ResolveError> {
        self.normalize(&TermRef::ById { term_id: id })?
            .bound()
            .map(|term| term.taxonomy.clone())
    }

    /// Composite identifier of a term within a taxonomy
    #[must_use]
    pub fn composite_for(&self, id: TermId, taxonomy: &str) -> Option<TermTaxonomyId> {
        self.bindings(id)
            .into_iter()
            .find(|b| b.taxonomy == taxonomy)
            .map(|b| b.term_taxonomy_id)
    }

    /// Normalize a caller reference
    ///
    /// # Errors
    /// Returns [`ResolveError::NotFound`] when nothing matches. A bare
    /// primary identifier bound to several taxonomies is not an error
    /// here; it yields [`TermKey::Shared`] and writes reject it later.
    pub fn normalize(&self, term: &TermRef) -> Result<TermKey, ResolveError> {
        let not_found = || ResolveError::NotFound(term.clone());
        match term {
            TermRef::ByComposite { term_taxonomy_id } => self
                .resolve_composite(*term_taxonomy_id)
                .map(TermKey::Bound)
                .ok_or_else(not_found),
            TermRef::ById { term_id } => {
                let mut bindings = self.bindings(*term_id);
                match bindings.len() {
                    0 => Err(not_found()),
                    1 => Ok(TermKey::Bound(bindings.remove(0))),
                    _ => Ok(TermKey::Shared {
                        term_id: *term_id,
                        candidates: bindings,
                    }),
                }
            }
            TermRef::Resolved { term_id, taxonomy } => self
                .bindings(*term_id)
                .into_iter()
                .find(|b| &b.taxonomy == taxonomy)
                .map(TermKey::Bound)
                .ok_or_else(not_found),
        }
    }

    /// Number of cached composite resolutions
    #[must_use]
    pub fn cached(&self) -> usize {
        self.by_composite.len()
    }
}
