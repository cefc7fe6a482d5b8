use super::backend::StorageBackend;
use super::Collection;
use crate::error::{HomecheckError, Result};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};

/// In-memory storage backend for testing.
///
/// Uses `RefCell` for interior mutability since the store is single-threaded.
/// This avoids the overhead of `RwLock` while still allowing the
/// `StorageBackend` trait to use `&self` for all methods.
#[derive(Default)]
pub struct MemBackend {
    records: RefCell<HashMap<Collection, BTreeMap<String, Value>>>,
    simulate_write_error: Cell<bool>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.set(simulate);
    }

    fn check_writable(&self) -> Result<()> {
        if self.simulate_write_error.get() {
            return Err(HomecheckError::Store("Simulated write error".to_string()));
        }
        Ok(())
    }
}

impl StorageBackend for MemBackend {
    fn read_record(&self, collection: Collection, id: &str) -> Result<Option<Value>> {
        let records = self.records.borrow();
        Ok(records
            .get(&collection)
            .and_then(|c| c.get(id))
            .cloned())
    }

    fn write_record(&self, collection: Collection, id: &str, record: &Value) -> Result<()> {
        self.check_writable()?;
        let mut records = self.records.borrow_mut();
        records
            .entry(collection)
            .or_default()
            .insert(id.to_string(), record.clone());
        Ok(())
    }

    fn delete_record(&self, collection: Collection, id: &str) -> Result<bool> {
        self.check_writable()?;
        let mut records = self.records.borrow_mut();
        Ok(records
            .get_mut(&collection)
            .map(|c| c.remove(id).is_some())
            .unwrap_or(false))
    }

    fn list_ids(&self, collection: Collection) -> Result<Vec<String>> {
        let records = self.records.borrow();
        Ok(records
            .get(&collection)
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn clear(&self, collection: Collection) -> Result<()> {
        self.check_writable()?;
        self.records.borrow_mut().remove(&collection);
        Ok(())
    }
}
