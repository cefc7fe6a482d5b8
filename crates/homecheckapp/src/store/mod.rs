//! # Local Store
//!
//! Durable, keyed record storage for the five homecheck collections. The store
//! is the single source of truth: every mutation lands here before anything is
//! attempted against a remote system.
//!
//! ## Layers
//!
//! - [`backend::StorageBackend`]: raw, untyped record I/O (filesystem or memory).
//! - [`LocalStore`]: typed access through the [`Record`] trait, secondary index
//!   lookups, partial updates and batch upserts.
//!
//! ## Collections
//!
//! | Collection | Record | Declared indexes |
//! |------------|--------|------------------|
//! | `templates` | `Template` | `propertyType`, `isActive`, `updatedAt` |
//! | `inspections` | `Inspection` | `status`, `updatedAt` |
//! | `photos` | `Photo` | `inspectionId`, `inspectionId+sectionId`, `inspectionId+itemId` |
//! | `sync_queue` | `SyncQueueItem` | `status`, `entityType+entityId`, `createdAt` |
//! | `settings` | `AppSettings` | none |
//!
//! Every record is keyed by a string `id`. Queries against an index the record
//! type does not declare fail with [`HomecheckError::UnknownIndex`] instead of
//! silently scanning on a misspelled field.
//!
//! ## Guarantees
//!
//! - Writes are durable before the call returns (the fs backend fsyncs and
//!   renames a temp file into place).
//! - Single-record operations are atomic. There are no cross-collection
//!   transactions; `bulk_put` is a sequence of idempotent upserts.
//! - `update` is a read-merge-write performed without yielding, so callers never
//!   merge into a stale copy.
//!
//! ## Implementations
//!
//! - [`fs_backend::FsBackend`]: production, one JSON file per record.
//! - [`mem_backend::MemBackend`]: for testing logic without filesystem I/O.

use crate::error::{HomecheckError, Result};
use crate::sync::SyncState;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::ops::RangeBounds;

pub mod backend;
pub mod fs_backend;
pub mod mem_backend;

use backend::StorageBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Templates,
    Inspections,
    Photos,
    SyncQueue,
    Settings,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Templates,
        Collection::Inspections,
        Collection::Photos,
        Collection::SyncQueue,
        Collection::Settings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Templates => "templates",
            Collection::Inspections => "inspections",
            Collection::Photos => "photos",
            Collection::SyncQueue => "sync_queue",
            Collection::Settings => "settings",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An orderable secondary-index value.
///
/// Compound keys compare element-wise, so a compound index can be queried for
/// an exact tuple or scanned over a range.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum IndexKey {
    Flag(bool),
    Text(String),
    Time(DateTime<Utc>),
    Compound(Vec<IndexKey>),
}

impl IndexKey {
    pub fn compound<I, K>(parts: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<IndexKey>,
    {
        IndexKey::Compound(parts.into_iter().map(Into::into).collect())
    }
}

impl From<&str> for IndexKey {
    fn from(value: &str) -> Self {
        IndexKey::Text(value.to_string())
    }
}

impl From<String> for IndexKey {
    fn from(value: String) -> Self {
        IndexKey::Text(value)
    }
}

impl From<bool> for IndexKey {
    fn from(value: bool) -> Self {
        IndexKey::Flag(value)
    }
}

impl From<DateTime<Utc>> for IndexKey {
    fn from(value: DateTime<Utc>) -> Self {
        IndexKey::Time(value)
    }
}

/// A typed record living in one collection.
pub trait Record: Serialize + DeserializeOwned + Clone {
    const COLLECTION: Collection;

    /// Secondary indexes this record type can be queried by.
    const INDEXES: &'static [&'static str];

    fn id(&self) -> &str;

    /// Index value for one of [`Self::INDEXES`]. Returns `None` when the record
    /// has no value for that index (e.g. a photo not attached to a section).
    fn index_key(&self, index: &str) -> Option<IndexKey>;
}

pub struct LocalStore<B: StorageBackend> {
    /// The underlying storage backend.
    /// Exposed as pub(crate) for testing and internal access only.
    pub(crate) backend: B,
    sync: SyncState,
}

impl<B: StorageBackend> LocalStore<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            sync: SyncState::default(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn sync_state(&self) -> &SyncState {
        &self.sync
    }

    pub fn get<R: Record>(&self, id: &str) -> Result<Option<R>> {
        match self.backend.read_record(R::COLLECTION, id)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Insert or fully replace a record, keyed by its id.
    pub fn put<R: Record>(&self, record: &R) -> Result<()> {
        if !is_valid_record_id(record.id()) {
            return Err(HomecheckError::Store(format!(
                "Invalid record id: {:?}",
                record.id()
            )));
        }
        let value = serde_json::to_value(record)?;
        self.backend.write_record(R::COLLECTION, record.id(), &value)?;
        tracing::debug!(collection = %R::COLLECTION, id = record.id(), "put record");
        Ok(())
    }

    /// Merge the fields of a JSON object into an existing record.
    ///
    /// The merge is shallow: each top-level field in `patch` replaces the stored
    /// one, and `null` clears optional fields. The `id` field is never changed.
    /// The merged value must still deserialize as `R`, otherwise nothing is
    /// written. Returns the merged record, or `None` if `id` does not exist.
    pub fn update<R: Record>(&self, id: &str, patch: Value) -> Result<Option<R>> {
        let Value::Object(fields) = patch else {
            return Err(HomecheckError::Store(format!(
                "Update patch for {} {} must be a JSON object",
                R::COLLECTION,
                id
            )));
        };

        let Some(mut stored) = self.backend.read_record(R::COLLECTION, id)? else {
            return Ok(None);
        };
        let Some(target) = stored.as_object_mut() else {
            return Err(HomecheckError::Store(format!(
                "Stored {} record {} is not an object",
                R::COLLECTION,
                id
            )));
        };

        for (key, value) in fields {
            if key != "id" {
                target.insert(key, value);
            }
        }

        let merged: R = serde_json::from_value(stored)?;
        self.put(&merged)?;
        Ok(Some(merged))
    }

    /// Remove a record. Returns whether it existed.
    pub fn delete<R: Record>(&self, id: &str) -> Result<bool> {
        let removed = self.backend.delete_record(R::COLLECTION, id)?;
        if removed {
            tracing::debug!(collection = %R::COLLECTION, id, "deleted record");
        }
        Ok(removed)
    }

    /// All records of a collection, ordered by id.
    pub fn all<R: Record>(&self) -> Result<Vec<R>> {
        let mut records = Vec::new();
        for id in self.backend.list_ids(R::COLLECTION)? {
            // A record removed between listing and reading is simply skipped
            if let Some(record) = self.get::<R>(&id)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Records whose `index` value equals `value`.
    pub fn query<R: Record>(&self, index: &str, value: impl Into<IndexKey>) -> Result<Vec<R>> {
        check_index::<R>(index)?;
        let value = value.into();
        Ok(self
            .all::<R>()?
            .into_iter()
            .filter(|r| r.index_key(index).as_ref() == Some(&value))
            .collect())
    }

    /// Records whose `index` value falls within `range`, in ascending index order.
    pub fn query_range<R: Record>(
        &self,
        index: &str,
        range: impl RangeBounds<IndexKey>,
    ) -> Result<Vec<R>> {
        check_index::<R>(index)?;
        let mut keyed: Vec<(IndexKey, R)> = self
            .all::<R>()?
            .into_iter()
            .filter_map(|r| r.index_key(index).map(|k| (k, r)))
            .filter(|(k, _)| range.contains(k))
            .collect();
        keyed.sort_by(|(a, ra), (b, rb)| a.cmp(b).then_with(|| ra.id().cmp(rb.id())));
        Ok(keyed.into_iter().map(|(_, r)| r).collect())
    }

    pub fn count<R: Record>(&self) -> Result<usize> {
        Ok(self.backend.list_ids(R::COLLECTION)?.len())
    }

    pub fn count_where<R: Record, F>(&self, predicate: F) -> Result<usize>
    where
        F: Fn(&R) -> bool,
    {
        Ok(self.all::<R>()?.iter().filter(|r| predicate(r)).count())
    }

    /// Upsert a batch of records. Existing keys are replaced, never rejected.
    pub fn bulk_put<R: Record>(&self, records: &[R]) -> Result<usize> {
        for record in records {
            self.put(record)?;
        }
        Ok(records.len())
    }

    pub fn clear<R: Record>(&self) -> Result<()> {
        self.backend.clear(R::COLLECTION)?;
        tracing::debug!(collection = %R::COLLECTION, "cleared collection");
        Ok(())
    }
}

/// Record ids become file names, so they must not be able to escape the
/// collection directory or collide with temp files.
pub fn is_valid_record_id(id: &str) -> bool {
    !id.is_empty() && !id.starts_with('.') && !id.contains(['/', '\\'])
}

fn check_index<R: Record>(index: &str) -> Result<()> {
    if R::INDEXES.contains(&index) {
        Ok(())
    } else {
        Err(HomecheckError::UnknownIndex {
            collection: R::COLLECTION,
            index: index.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::mem_backend::MemBackend;
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Note {
        id: String,
        kind: String,
        pinned: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        rank: u32,
    }

    impl Record for Note {
        const COLLECTION: Collection = Collection::Settings;
        const INDEXES: &'static [&'static str] = &["kind", "pinned", "kind+label"];

        fn id(&self) -> &str {
            &self.id
        }

        fn index_key(&self, index: &str) -> Option<IndexKey> {
            match index {
                "kind" => Some(self.kind.as_str().into()),
                "pinned" => Some(self.pinned.into()),
                "kind+label" => {
                    let label = self.label.as_deref()?;
                    Some(IndexKey::compound([self.kind.as_str(), label]))
                }
                _ => None,
            }
        }
    }

    fn note(id: &str, kind: &str, pinned: bool) -> Note {
        Note {
            id: id.to_string(),
            kind: kind.to_string(),
            pinned,
            label: None,
            rank: 0,
        }
    }

    fn make_store() -> LocalStore<MemBackend> {
        LocalStore::with_backend(MemBackend::new())
    }

    #[test]
    fn test_put_and_get() {
        let store = make_store();
        store.put(&note("a", "x", false)).unwrap();

        let fetched: Note = store.get("a").unwrap().unwrap();
        assert_eq!(fetched, note("a", "x", false));
        assert!(store.get::<Note>("missing").unwrap().is_none());
    }

    #[test]
    fn test_put_rejects_unusable_ids() {
        let store = make_store();
        for id in ["", ".tmp", "a/b", "a\\b"] {
            assert!(store.put(&note(id, "x", false)).is_err(), "{:?}", id);
        }
        assert_eq!(store.count::<Note>().unwrap(), 0);
    }

    #[test]
    fn test_put_replaces_whole_record() {
        let store = make_store();
        let mut first = note("a", "x", false);
        first.label = Some("old".to_string());
        store.put(&first).unwrap();

        store.put(&note("a", "y", true)).unwrap();

        let fetched: Note = store.get("a").unwrap().unwrap();
        assert_eq!(fetched.kind, "y");
        assert_eq!(fetched.label, None);
        assert_eq!(store.count::<Note>().unwrap(), 1);
    }

    #[test]
    fn test_update_merges_fields() {
        let store = make_store();
        store.put(&note("a", "x", false)).unwrap();

        let merged: Note = store
            .update("a", json!({"pinned": true, "label": "kitchen"}))
            .unwrap()
            .unwrap();

        assert!(merged.pinned);
        assert_eq!(merged.kind, "x");
        assert_eq!(merged.label.as_deref(), Some("kitchen"));
        assert_eq!(store.get::<Note>("a").unwrap().unwrap(), merged);
    }

    #[test]
    fn test_update_null_clears_optional_field() {
        let store = make_store();
        let mut n = note("a", "x", false);
        n.label = Some("gone soon".to_string());
        store.put(&n).unwrap();

        let merged: Note = store.update("a", json!({"label": null})).unwrap().unwrap();
        assert_eq!(merged.label, None);
    }

    #[test]
    fn test_update_never_changes_id() {
        let store = make_store();
        store.put(&note("a", "x", false)).unwrap();

        let merged: Note = store.update("a", json!({"id": "b"})).unwrap().unwrap();
        assert_eq!(merged.id, "a");
        assert!(store.get::<Note>("b").unwrap().is_none());
    }

    #[test]
    fn test_update_missing_record_is_noop() {
        let store = make_store();
        let result = store.update::<Note>("nope", json!({"pinned": true})).unwrap();
        assert!(result.is_none());
        assert_eq!(store.count::<Note>().unwrap(), 0);
    }

    #[test]
    fn test_update_rejects_invalid_merge() {
        let store = make_store();
        store.put(&note("a", "x", false)).unwrap();

        let result = store.update::<Note>("a", json!({"rank": "not a number"}));
        assert!(result.is_err());

        // Nothing written
        assert_eq!(store.get::<Note>("a").unwrap().unwrap().rank, 0);
    }

    #[test]
    fn test_update_rejects_non_object_patch() {
        let store = make_store();
        store.put(&note("a", "x", false)).unwrap();
        assert!(store.update::<Note>("a", json!([1, 2])).is_err());
    }

    #[test]
    fn test_delete() {
        let store = make_store();
        store.put(&note("a", "x", false)).unwrap();

        assert!(store.delete::<Note>("a").unwrap());
        assert!(!store.delete::<Note>("a").unwrap());
        assert!(store.get::<Note>("a").unwrap().is_none());
    }

    #[test]
    fn test_query_by_index() {
        let store = make_store();
        store.put(&note("a", "x", true)).unwrap();
        store.put(&note("b", "y", false)).unwrap();
        store.put(&note("c", "x", false)).unwrap();

        let xs: Vec<Note> = store.query("kind", "x").unwrap();
        let ids: Vec<&str> = xs.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);

        let pinned: Vec<Note> = store.query("pinned", true).unwrap();
        assert_eq!(pinned.len(), 1);
        assert_eq!(pinned[0].id, "a");
    }

    #[test]
    fn test_query_compound_index_skips_missing_parts() {
        let store = make_store();
        let mut labelled = note("a", "x", false);
        labelled.label = Some("l1".to_string());
        store.put(&labelled).unwrap();
        store.put(&note("b", "x", false)).unwrap();

        let found: Vec<Note> = store
            .query("kind+label", IndexKey::compound(["x", "l1"]))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "a");
    }

    #[test]
    fn test_query_unknown_index_fails() {
        let store = make_store();
        let result = store.query::<Note>("rank", "1");
        assert!(matches!(
            result,
            Err(HomecheckError::UnknownIndex { ref index, .. }) if index == "rank"
        ));
    }

    #[test]
    fn test_query_range_orders_by_key() {
        let store = make_store();
        store.put(&note("a", "m", false)).unwrap();
        store.put(&note("b", "c", false)).unwrap();
        store.put(&note("c", "z", false)).unwrap();

        let lower = IndexKey::from("b");
        let upper = IndexKey::from("n");
        let found: Vec<Note> = store.query_range("kind", lower..upper).unwrap();
        let kinds: Vec<&str> = found.iter().map(|n| n.kind.as_str()).collect();
        assert_eq!(kinds, vec!["c", "m"]);

        let everything: Vec<Note> = store.query_range("kind", ..).unwrap();
        assert_eq!(everything.len(), 3);
        assert_eq!(everything[2].kind, "z");
    }

    #[test]
    fn test_count_where() {
        let store = make_store();
        store.put(&note("a", "x", true)).unwrap();
        store.put(&note("b", "x", false)).unwrap();

        assert_eq!(store.count::<Note>().unwrap(), 2);
        assert_eq!(store.count_where::<Note, _>(|n| n.pinned).unwrap(), 1);
    }

    #[test]
    fn test_bulk_put_is_upsert() {
        let store = make_store();
        store.put(&note("a", "old", false)).unwrap();

        let written = store
            .bulk_put(&[note("a", "new", false), note("b", "x", false)])
            .unwrap();
        assert_eq!(written, 2);

        // Re-running the same batch must not fail
        store
            .bulk_put(&[note("a", "new", false), note("b", "x", false)])
            .unwrap();

        assert_eq!(store.count::<Note>().unwrap(), 2);
        assert_eq!(store.get::<Note>("a").unwrap().unwrap().kind, "new");
    }

    #[test]
    fn test_clear() {
        let store = make_store();
        store.put(&note("a", "x", false)).unwrap();
        store.put(&note("b", "x", false)).unwrap();

        store.clear::<Note>().unwrap();
        assert_eq!(store.count::<Note>().unwrap(), 0);
    }

    #[test]
    fn test_put_fails_on_write_error() {
        let store = make_store();
        store.backend.set_simulate_write_error(true);
        assert!(store.put(&note("a", "x", false)).is_err());
    }
}
