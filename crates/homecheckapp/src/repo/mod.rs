//! # Repositories
//!
//! Typed CRUD facades over the [`LocalStore`](crate::store::LocalStore). All
//! user mutations go through a repository so the sync queue is never bypassed.
//!
//! ## Write protocol
//!
//! - `create` persists the record, then enqueues a `create` entry carrying a
//!   full snapshot.
//! - `update` merges the patch plus `updatedAt = now` into the stored record,
//!   and enqueues an `update` entry carrying the *merged* record, not the delta.
//! - `delete` removes the record and enqueues a `delete` entry with no data.
//!
//! The local write always happens first, so a failed enqueue never loses data.
//! Store errors propagate to the caller.
//!
//! ## Missing records
//!
//! Operating on an id that does not exist is not an error: updates return
//! `Ok(None)`, deletes return `Ok(false)`, and nothing is enqueued.
//!
//! ## Modules
//!
//! - [`template`]: templates, including duplication and soft deletion.
//! - [`inspection`]: inspections and their status lifecycle.
//! - [`photo`]: photos, capture processing and inspection linking.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

pub mod inspection;
pub mod photo;
pub mod template;

pub use inspection::{InspectionPatch, InspectionRepository, ItemPatch};
pub use photo::{PhotoCapture, PhotoPatch, PhotoRepository};
pub use template::{TemplatePatch, TemplateRepository};

/// Serialize a patch struct into a JSON object and stamp `updatedAt`.
pub(crate) fn stamped_patch<P: Serialize>(patch: &P, now: DateTime<Utc>) -> Result<Value> {
    let mut value = serde_json::to_value(patch)?;
    if let Value::Object(fields) = &mut value {
        fields.insert("updatedAt".to_string(), serde_json::to_value(now)?);
    }
    Ok(value)
}
