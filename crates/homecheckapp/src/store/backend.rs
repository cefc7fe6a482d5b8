use super::Collection;
use crate::error::Result;
use serde_json::Value;

/// Abstract interface for raw record I/O.
/// This trait handles the "how" of storage (filesystem vs memory),
/// while [`super::LocalStore`] handles the "what" (typing, indexes, merging).
///
/// All methods take `&self`: backends are either stateless I/O or use
/// interior mutability, since the store runs on a single thread.
pub trait StorageBackend {
    /// Read one record. Returns Ok(None) if no record exists under `id`.
    /// Returns Err only on actual I/O or decoding errors.
    fn read_record(&self, collection: Collection, id: &str) -> Result<Option<Value>>;

    /// Insert or fully replace one record.
    /// MUST be atomic (e.g. write to tmp then rename) and durable on return.
    fn write_record(&self, collection: Collection, id: &str, record: &Value) -> Result<()>;

    /// Remove one record. Returns whether a record was removed.
    fn delete_record(&self, collection: Collection, id: &str) -> Result<bool>;

    /// List all record ids present in a collection.
    fn list_ids(&self, collection: Collection) -> Result<Vec<String>>;

    /// Remove every record of a collection.
    fn clear(&self, collection: Collection) -> Result<()>;
}
