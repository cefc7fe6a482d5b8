//! Whole-store export.
//!
//! The export is a single JSON document:
//!
//! ```json
//! {
//!   "exportedAt": "2024-05-01T09:30:00Z",
//!   "version": 1,
//!   "templates": [...],
//!   "inspections": [...],
//!   "photos": [...],
//!   "settings": [...]
//! }
//! ```
//!
//! Dates are ISO-8601 strings. A target path ending in `.gz` is written
//! gzip-compressed.

use chrono::{DateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::{AppSettings, Inspection, Photo, Template};
use crate::store::backend::StorageBackend;
use crate::store::LocalStore;

pub const EXPORT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub exported_at: DateTime<Utc>,
    pub version: u32,
    pub templates: Vec<Template>,
    pub inspections: Vec<Inspection>,
    #[serde(default)]
    pub photos: Vec<Photo>,
    #[serde(default)]
    pub settings: Vec<AppSettings>,
}

impl ExportDocument {
    pub fn record_count(&self) -> usize {
        self.templates.len() + self.inspections.len() + self.photos.len()
    }
}

/// Snapshot every exported collection.
pub fn export_document<B: StorageBackend>(store: &LocalStore<B>) -> Result<ExportDocument> {
    Ok(ExportDocument {
        exported_at: Utc::now(),
        version: EXPORT_VERSION,
        templates: store.all()?,
        inspections: store.all()?,
        photos: store.all()?,
        settings: store.all()?,
    })
}

/// Write a document to `path`, gzip-compressed when the name ends in `.gz`.
pub fn write_document(document: &ExportDocument, path: &Path) -> Result<()> {
    let file = BufWriter::new(File::create(path)?);
    if is_gzip_path(path) {
        let mut encoder = GzEncoder::new(file, Compression::default());
        serde_json::to_writer_pretty(&mut encoder, document)?;
        encoder.finish()?.flush()?;
    } else {
        let mut file = file;
        serde_json::to_writer_pretty(&mut file, document)?;
        file.flush()?;
    }
    Ok(())
}

pub fn default_filename(now: DateTime<Utc>) -> String {
    format!("homecheck-export-{}.json", now.format("%Y-%m-%d_%H%M%S"))
}

pub fn run<B: StorageBackend>(store: &LocalStore<B>, path: Option<PathBuf>) -> Result<CmdResult> {
    let document = export_document(store)?;
    let path = path.unwrap_or_else(|| PathBuf::from(default_filename(document.exported_at)));
    write_document(&document, &path)?;
    tracing::info!(
        path = %path.display(),
        templates = document.templates.len(),
        inspections = document.inspections.len(),
        photos = document.photos.len(),
        "exported store"
    );

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Exported {} templates, {} inspections and {} photos to {}",
        document.templates.len(),
        document.inspections.len(),
        document.photos.len(),
        path.display()
    )));
    Ok(result.with_paths(vec![path]))
}

fn is_gzip_path(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}
