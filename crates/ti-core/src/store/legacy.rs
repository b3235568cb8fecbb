//! Legacy association table
//!
//! A flat mapping of composite identifier to attachment id, persisted as
//! a single option blob. Only the default image type lives here.
//!
//! The blob is read-modify-written as a whole. Writes are serialized
//! within one process, but two processes writing concurrently still race
//! at the blob level: the last writer wins.

use super::{AssociationStore, Backend, WriteOutcome};
use crate::error::{HostError, StoreError};
use crate::host::Host;
use crate::resolver::TermKey;
use crate::types::{AttachmentId, ImageType, TermTaxonomyId};
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Sanitized legacy table
pub type LegacyTable = BTreeMap<TermTaxonomyId, AttachmentId>;

/// Access to the serialized association blob
pub struct LegacyAssociations {
    host: Arc<dyn Host>,
    option_key: String,
    cache: RwLock<Option<LegacyTable>>,
    write_lock: Mutex<()>,
}

impl fmt::Debug for LegacyAssociations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LegacyAssociations")
            .field("option_key", &self.option_key)
            .field("cached", &self.cache.read().as_ref().map(BTreeMap::len))
            .finish_non_exhaustive()
    }
}

impl LegacyAssociations {
    /// Create accessor for the blob stored under `option_key`
    #[must_use]
    pub fn new(host: Arc<dyn Host>, option_key: impl Into<String>) -> Self {
        Self {
            host,
            option_key: option_key.into(),
            cache: RwLock::new(None),
            write_lock: Mutex::new(()),
        }
    }

    /// Option key of the blob
    #[inline]
    #[must_use]
    pub fn option_key(&self) -> &str {
        &self.option_key
    }

    /// Current table, loaded once per request
    #[must_use]
    pub fn get(&self) -> LegacyTable {
        if let Some(table) = self.cache.read().as_ref() {
            return table.clone();
        }
        self.refresh()
    }

    /// Reload the table from the host, replacing the cached copy
    #[must_use]
    pub fn refresh(&self) -> LegacyTable {
        let raw = self.host.get_option(&self.option_key).unwrap_or(Value::Null);
        let table = Self::sanitize(&raw);
        tracing::debug!(
            option = %self.option_key,
            entries = table.len(),
            "loaded legacy association table"
        );
        *self.cache.write() = Some(table.clone());
        table
    }

    /// Keep only pairs whose key and value are positive integers
    ///
    /// Accepts the blob as an object keyed by identifier or as a list
    /// indexed by identifier. Anything else sanitizes to an empty table.
    /// Idempotent: sanitizing an [`encode`]d table returns it unchanged.
    #[must_use]
    pub fn sanitize(raw: &Value) -> LegacyTable {
        let pairs: Vec<(u64, u64)> = match raw {
            Value::Object(map) => map
                .iter()
                .map(|(key, value)| (coerce_str(key), coerce(value)))
                .collect(),
            Value::Array(list) => list
                .iter()
                .enumerate()
                .map(|(index, value)| (index as u64, coerce(value)))
                .collect(),
            _ => Vec::new(),
        };

        pairs
            .into_iter()
            .filter_map(|(key, value)| {
                let attachment = AttachmentId::new(value)?;
                (key > 0).then_some((TermTaxonomyId(key), attachment))
            })
            .collect()
    }

    /// Attachment associated with a composite identifier
    #[must_use]
    pub fn image_id(&self, id: TermTaxonomyId) -> Option<AttachmentId> {
        self.get().get(&id).copied()
    }

    /// Merge one entry and persist the whole table
    ///
    /// # Errors
    /// Returns error if the host cannot persist the blob
    pub fn set(
        &self,
        id: TermTaxonomyId,
        attachment: AttachmentId,
    ) -> Result<WriteOutcome, HostError> {
        let _guard = self.write_lock.lock();
        let mut table = self.refresh();
        let previous = table.insert(id, attachment);
        self.persist(table)?;
        tracing::info!(
            term_taxonomy_id = id.0,
            attachment_id = attachment.get(),
            "stored legacy association"
        );
        Ok(if previous.is_some() {
            WriteOutcome::Updated
        } else {
            WriteOutcome::Created
        })
    }

    /// Remove one entry; `Ok(false)` if it was absent (nothing is written)
    ///
    /// # Errors
    /// Returns error if the host cannot persist the blob
    pub fn delete(&self, id: TermTaxonomyId) -> Result<bool, HostError> {
        let _guard = self.write_lock.lock();
        let mut table = self.refresh();
        if table.remove(&id).is_none() {
            return Ok(false);
        }
        self.persist(table)?;
        tracing::info!(term_taxonomy_id = id.0, "removed legacy association");
        Ok(true)
    }

    /// Persist an empty table if the option has never been written
    ///
    /// Returns `true` if the option was created.
    ///
    /// # Errors
    /// Returns error if the host cannot persist the blob
    pub fn ensure_initialized(&self) -> Result<bool, HostError> {
        let created = self
            .host
            .add_option(&self.option_key, Value::Object(Map::new()))?;
        if created {
            tracing::info!(option = %self.option_key, "initialized legacy association table");
        }
        Ok(created)
    }

    fn persist(&self, table: LegacyTable) -> Result<(), HostError> {
        self.host.update_option(&self.option_key, encode(&table))?;
        *self.cache.write() = Some(table);
        Ok(())
    }
}

/// Serialize a table to its persisted form
#[must_use]
pub fn encode(table: &LegacyTable) -> Value {
    Value::Object(
        table
            .iter()
            .map(|(id, attachment)| (id.0.to_string(), Value::from(attachment.get())))
            .collect(),
    )
}

/// Coerce a stored value to a non-negative integer, zero when unusable
fn coerce(value: &Value) -> u64 {
    match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().and_then(positive_float))
            .unwrap_or(0),
        Value::String(text) => coerce_str(text),
        _ => 0,
    }
}

fn coerce_str(text: &str) -> u64 {
    let text = text.trim();
    text.parse::<u64>()
        .ok()
        .or_else(|| text.parse::<f64>().ok().and_then(positive_float))
        .unwrap_or(0)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn positive_float(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 1.0).then(|| value.trunc() as u64)
}

/// Default-type-only store over the legacy blob
#[derive(Debug, Clone)]
pub struct LegacyBackend {
    associations: Arc<LegacyAssociations>,
}

impl LegacyBackend {
    /// Create backend over a shared blob accessor
    #[inline]
    #[must_use]
    pub fn new(associations: Arc<LegacyAssociations>) -> Self {
        Self { associations }
    }
}

impl AssociationStore for LegacyBackend {
    fn backend(&self) -> Backend {
        Backend::Legacy
    }

    fn get(&self, term: &TermKey, image_type: &ImageType) -> Option<AttachmentId> {
        if !image_type.is_featured() {
            return None;
        }
        self.associations.image_id(term.primary().term_taxonomy_id)
    }

    fn set(
        &self,
        term: &TermKey,
        image_type: &ImageType,
        attachment: AttachmentId,
    ) -> Result<WriteOutcome, StoreError> {
        if !image_type.is_featured() {
            return Err(StoreError::UnsupportedImageType(image_type.clone()));
        }
        let term = term.bound()?;
        Ok(self.associations.set(term.term_taxonomy_id, attachment)?)
    }

    fn delete(&self, term: &TermKey, image_type: &ImageType) -> Result<bool, StoreError> {
        if !image_type.is_featured() {
            return Err(StoreError::UnsupportedImageType(image_type.clone()));
        }
        let term = term.bound()?;
        self.associations.delete(term.term_taxonomy_id)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::OptionsStore;
    use crate::memory::InMemoryHost;
    use crate::resolver::ResolvedTerm;
    use crate::types::TermId;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    const KEY: &str = "taxonomy_image_plugin";

    fn attachment(id: u64) -> AttachmentId {
        AttachmentId::new(id).unwrap()
    }

    fn accessor() -> (Arc<InMemoryHost>, LegacyAssociations) {
        let host = Arc::new(InMemoryHost::new());
        let legacy = LegacyAssociations::new(host.clone(), KEY);
        (host, legacy)
    }

    fn bound(term_id: u64, tt_id: u64) -> TermKey {
        TermKey::Bound(ResolvedTerm {
            term_id: TermId(term_id),
            term_taxonomy_id: TermTaxonomyId(tt_id),
            taxonomy: "category".into(),
        })
    }

    #[test]
    fn sanitize_discards_non_positive() {
        let raw = json!({
            "42": 99,
            "0": 5,
            "43": 0,
            "44": -3,
            "45": "17",
            "abc": 8,
            "46": "x",
            "47": 2.9,
            "48": null
        });
        let table = LegacyAssociations::sanitize(&raw);
        let expected: LegacyTable = [
            (TermTaxonomyId(42), attachment(99)),
            (TermTaxonomyId(45), attachment(17)),
            (TermTaxonomyId(47), attachment(2)),
        ]
        .into_iter()
        .collect();
        assert_eq!(table, expected);
    }

    #[test]
    fn sanitize_accepts_list_form() {
        let table = LegacyAssociations::sanitize(&json!([5, 6, 0]));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&TermTaxonomyId(1)), Some(&attachment(6)));
    }

    #[test]
    fn sanitize_non_collection_is_empty() {
        assert!(LegacyAssociations::sanitize(&Value::Null).is_empty());
        assert!(LegacyAssociations::sanitize(&json!("a:0:{}")).is_empty());
    }

    #[test]
    fn get_defaults_to_empty_and_caches() {
        let (host, legacy) = accessor();
        assert!(legacy.get().is_empty());

        host.update_option(KEY, json!({"42": 99})).unwrap();
        assert!(legacy.get().is_empty(), "cached for the request");
        assert_eq!(legacy.refresh().len(), 1);
    }

    #[test]
    fn set_merges_and_persists_sanitized() {
        let (host, legacy) = accessor();
        host.update_option(KEY, json!({"10": 1, "11": -1})).unwrap();

        assert_eq!(legacy.set(TermTaxonomyId(42), attachment(99)).unwrap(), WriteOutcome::Created);
        assert_eq!(legacy.set(TermTaxonomyId(42), attachment(100)).unwrap(), WriteOutcome::Updated);
        assert_eq!(host.get_option(KEY), Some(json!({"10": 1, "42": 100})));
    }

    #[test]
    fn delete_absent_is_noop() {
        let (host, legacy) = accessor();
        assert!(!legacy.delete(TermTaxonomyId(42)).unwrap());
        assert_eq!(host.option_writes(), 0);

        legacy.set(TermTaxonomyId(42), attachment(9)).unwrap();
        assert!(legacy.delete(TermTaxonomyId(42)).unwrap());
        assert_eq!(host.get_option(KEY), Some(json!({})));
    }

    #[test]
    fn ensure_initialized_only_once() {
        let (host, legacy) = accessor();
        assert!(legacy.ensure_initialized().unwrap());
        assert!(!legacy.ensure_initialized().unwrap());
        assert_eq!(host.get_option(KEY), Some(json!({})));
    }

    #[test]
    fn backend_rejects_custom_types() {
        let (_host, legacy) = accessor();
        let backend = LegacyBackend::new(Arc::new(legacy));
        let hero = ImageType::new("hero");

        assert!(matches!(
            backend.set(&bound(7, 42), &hero, attachment(1)),
            Err(StoreError::UnsupportedImageType(_))
        ));
        assert!(backend.get(&bound(7, 42), &hero).is_none());
    }

    #[test]
    fn backend_roundtrip() {
        let (_host, legacy) = accessor();
        let backend = LegacyBackend::new(Arc::new(legacy));
        let featured = ImageType::featured();

        backend.set(&bound(7, 42), &featured, attachment(99)).unwrap();
        assert_eq!(backend.get(&bound(7, 42), &featured), Some(attachment(99)));
        assert!(backend.delete(&bound(7, 42), &featured).unwrap());
        assert!(backend.get(&bound(7, 42), &featured).is_none());
        assert!(backend.delete(&bound(7, 42), &featured).unwrap());
    }

    fn raw_blob() -> impl Strategy<Value = Value> {
        let key = prop_oneof![
            (0u64..200).prop_map(|k| k.to_string()),
            "[a-z]{1,3}",
            (-50i64..0).prop_map(|k| k.to_string()),
        ];
        let value = prop_oneof![
            (-20i64..200).prop_map(Value::from),
            (0u64..200).prop_map(|v| Value::from(v.to_string())),
            Just(Value::Null),
            Just(Value::from("junk")),
        ];
        prop::collection::btree_map(key, value, 0..24)
            .prop_map(|map| Value::Object(map.into_iter().collect()))
    }

    proptest! {
        #[test]
        fn prop_sanitize_idempotent(raw in raw_blob()) {
            let once = LegacyAssociations::sanitize(&raw);
            let twice = LegacyAssociations::sanitize(&encode(&once));
            prop_assert_eq!(&once, &twice);
            prop_assert!(once.keys().all(|k| k.0 > 0));
        }
    }
}
