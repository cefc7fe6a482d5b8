//! Restore templates, inspections and photos from an export document.
//!
//! Import replaces those three collections wholesale; settings and the sync
//! queue are left alone, and nothing is enqueued. Every failure, from an
//! unreadable file to a missing field, is reported in the [`ImportReport`]
//! instead of being returned as an error.

use flate2::read::GzDecoder;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::io::Read;
use std::path::Path;

use super::export::ExportDocument;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{HomecheckError, Result};
use crate::model::{Inspection, Photo, Template};
use crate::store::backend::StorageBackend;
use crate::store::{is_valid_record_id, LocalStore, Record};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const REQUIRED_FIELDS: [&str; 3] = ["version", "templates", "inspections"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub success: bool,
    pub message: String,
    pub templates: usize,
    pub inspections: usize,
    pub photos: usize,
}

impl ImportReport {
    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            ..Default::default()
        }
    }
}

/// Import an export document given as JSON text.
pub fn import_json<B: StorageBackend>(store: &LocalStore<B>, json: &str) -> ImportReport {
    match parse_document(json).and_then(|document| replace_records(store, &document)) {
        Ok(report) => report,
        Err(e) => {
            tracing::warn!(error = %e, "import failed");
            ImportReport::failed(e.to_string())
        }
    }
}

/// Import from a file, plain or gzip-compressed.
pub fn import_file<B: StorageBackend>(store: &LocalStore<B>, path: &Path) -> ImportReport {
    match read_text(path) {
        Ok(json) => import_json(store, &json),
        Err(e) => ImportReport::failed(format!("Could not read {}: {}", path.display(), e)),
    }
}

pub fn run<B: StorageBackend>(store: &LocalStore<B>, path: &Path) -> Result<CmdResult> {
    let report = import_file(store, path);
    let mut result = CmdResult::default();
    if report.success {
        result.add_message(CmdMessage::success(report.message));
    } else {
        result.add_message(CmdMessage::error(report.message));
    }
    Ok(result)
}

fn parse_document(json: &str) -> Result<ExportDocument> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| HomecheckError::Import(format!("Invalid JSON: {}", e)))?;
    let Some(fields) = value.as_object() else {
        return Err(HomecheckError::Import(
            "Invalid backup file: expected a JSON object".to_string(),
        ));
    };
    if let Some(missing) = REQUIRED_FIELDS.iter().find(|f| !fields.contains_key(**f)) {
        return Err(HomecheckError::Import(format!(
            "Invalid backup file: missing '{}'",
            missing
        )));
    }
    let document: ExportDocument = serde_json::from_value(value)
        .map_err(|e| HomecheckError::Import(format!("Invalid backup file: {}", e)))?;
    check_ids(&document.templates)?;
    check_ids(&document.inspections)?;
    check_ids(&document.photos)?;
    Ok(document)
}

/// Every id must be usable as a record key and appear once per collection.
fn check_ids<R: Record>(records: &[R]) -> Result<()> {
    let mut seen = HashSet::new();
    for record in records {
        let id = record.id();
        if !is_valid_record_id(id) {
            return Err(HomecheckError::Import(format!(
                "Invalid backup file: bad {} id {:?}",
                R::COLLECTION,
                id
            )));
        }
        if !seen.insert(id) {
            return Err(HomecheckError::Import(format!(
                "Invalid backup file: duplicate {} id {:?}",
                R::COLLECTION,
                id
            )));
        }
    }
    Ok(())
}

fn replace_records<B: StorageBackend>(
    store: &LocalStore<B>,
    document: &ExportDocument,
) -> Result<ImportReport> {
    let previous = (
        store.all::<Template>()?,
        store.all::<Inspection>()?,
        store.all::<Photo>()?,
    );
    if let Err(e) = write_collections(
        store,
        &document.templates,
        &document.inspections,
        &document.photos,
    ) {
        tracing::warn!(error = %e, "import write failed, restoring previous records");
        write_collections(store, &previous.0, &previous.1, &previous.2)?;
        return Err(e);
    }

    let templates = document.templates.len();
    let inspections = document.inspections.len();
    let photos = document.photos.len();
    tracing::info!(templates, inspections, photos, "imported backup");

    Ok(ImportReport {
        success: true,
        message: format!(
            "Imported {} templates, {} inspections and {} photos",
            templates, inspections, photos
        ),
        templates,
        inspections,
        photos,
    })
}

fn write_collections<B: StorageBackend>(
    store: &LocalStore<B>,
    templates: &[Template],
    inspections: &[Inspection],
    photos: &[Photo],
) -> Result<()> {
    store.clear::<Template>()?;
    store.clear::<Inspection>()?;
    store.clear::<Photo>()?;
    store.bulk_put(templates)?;
    store.bulk_put(inspections)?;
    store.bulk_put(photos)?;
    Ok(())
}

fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    if bytes.starts_with(&GZIP_MAGIC) {
        let mut text = String::new();
        GzDecoder::new(bytes.as_slice()).read_to_string(&mut text)?;
        Ok(text)
    } else {
        String::from_utf8(bytes)
            .map_err(|e| HomecheckError::Import(format!("Backup is not UTF-8: {}", e)))
    }
}
