use super::backend::StorageBackend;
use super::{is_valid_record_id, Collection};
use crate::error::{HomecheckError, Result};
use serde_json::Value;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const RECORD_EXT: &str = "json";

/// Filesystem backend: one directory per collection, one JSON file per record.
///
/// ```text
/// <root>/
/// ├── templates/<id>.json
/// ├── inspections/<id>.json
/// ├── photos/<id>.json
/// ├── sync_queue/<id>.json
/// └── settings/<id>.json
/// ```
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_dir(&self, collection: Collection) -> PathBuf {
        self.root.join(collection.as_str())
    }

    fn record_path(&self, collection: Collection, id: &str) -> Result<PathBuf> {
        check_record_id(id)?;
        Ok(self
            .collection_dir(collection)
            .join(format!("{}.{}", id, RECORD_EXT)))
    }

    fn ensure_dir(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).map_err(HomecheckError::Io)?;
        }
        Ok(())
    }
}

fn check_record_id(id: &str) -> Result<()> {
    if !is_valid_record_id(id) {
        return Err(HomecheckError::Store(format!("Invalid record id: {:?}", id)));
    }
    Ok(())
}

impl StorageBackend for FsBackend {
    fn read_record(&self, collection: Collection, id: &str) -> Result<Option<Value>> {
        let path = self.record_path(collection, id)?;
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).map_err(HomecheckError::Io)?;
        let value = serde_json::from_str(&content).map_err(HomecheckError::Serialization)?;
        Ok(Some(value))
    }

    fn write_record(&self, collection: Collection, id: &str, record: &Value) -> Result<()> {
        let target = self.record_path(collection, id)?;
        let dir = self.collection_dir(collection);
        self.ensure_dir(&dir)?;

        let content = serde_json::to_vec_pretty(record).map_err(HomecheckError::Serialization)?;

        // Atomic write: flush the tmp file to disk, then rename over the target
        let tmp_path = dir.join(format!(".{}-{}.tmp", id, Uuid::new_v4()));
        let mut file = File::create(&tmp_path).map_err(HomecheckError::Io)?;
        file.write_all(&content).map_err(HomecheckError::Io)?;
        file.sync_all().map_err(HomecheckError::Io)?;
        fs::rename(&tmp_path, &target).map_err(HomecheckError::Io)?;

        Ok(())
    }

    fn delete_record(&self, collection: Collection, id: &str) -> Result<bool> {
        let path = self.record_path(collection, id)?;
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path).map_err(HomecheckError::Io)?;
        Ok(true)
    }

    fn list_ids(&self, collection: Collection) -> Result<Vec<String>> {
        let dir = self.collection_dir(collection);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        let entries = fs::read_dir(&dir).map_err(HomecheckError::Io)?;

        for entry in entries {
            let entry = entry.map_err(HomecheckError::Io)?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let is_record = path.extension().and_then(|e| e.to_str()) == Some(RECORD_EXT);
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if is_record && !stem.starts_with('.') {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn clear(&self, collection: Collection) -> Result<()> {
        for id in self.list_ids(collection)? {
            self.delete_record(collection, &id)?;
        }
        Ok(())
    }
}
