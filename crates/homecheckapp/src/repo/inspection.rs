use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::stamped_patch;
use crate::error::{HomecheckError, Result};
use crate::model::{
    Inspection, InspectionSection, InspectionStats, InspectionStatus, ItemStatus, NewInspection,
    Photo, Template,
};
use crate::store::backend::StorageBackend;
use crate::store::LocalStore;
use crate::sync::queue::SyncQueue;
use crate::sync::{EntityType, SyncAction, SyncPayload};

/// Partial inspection update. `Some(None)` clears an optional field.
///
/// There is no status field: status only moves through
/// [`InspectionRepository::complete`], [`InspectionRepository::reopen`] and
/// the first [`InspectionRepository::update_item`] on a draft.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_name: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inspector_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<InspectionSection>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general_notes: Option<Option<String>>,
}

/// Status change written by `complete` and `reopen`. `completedAt` is always
/// written, so `None` clears it.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Transition {
    status: InspectionStatus,
    completed_at: Option<DateTime<Utc>>,
}

/// Change to a single checklist item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPatch {
    pub status: Option<ItemStatus>,
    pub notes: Option<String>,
}

impl ItemPatch {
    pub fn status(status: ItemStatus) -> Self {
        Self {
            status: Some(status),
            notes: None,
        }
    }

    pub fn notes(notes: impl Into<String>) -> Self {
        Self {
            status: None,
            notes: Some(notes.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.notes.is_none()
    }
}

pub struct InspectionRepository<'a, B: StorageBackend> {
    store: &'a LocalStore<B>,
    queue: SyncQueue<'a, B>,
}

impl<'a, B: StorageBackend> InspectionRepository<'a, B> {
    pub fn new(store: &'a LocalStore<B>) -> Self {
        Self {
            store,
            queue: SyncQueue::new(store),
        }
    }

    pub fn create(&self, inspection: &Inspection) -> Result<String> {
        self.store.put(inspection)?;
        self.enqueue(SyncAction::Create, inspection)?;
        tracing::info!(id = %inspection.id, address = %inspection.address, "created inspection");
        Ok(inspection.id.clone())
    }

    /// Start a draft inspection from a snapshot of the template.
    /// Returns `None` if the template does not exist.
    pub fn create_from_template(
        &self,
        template_id: &str,
        details: NewInspection,
    ) -> Result<Option<Inspection>> {
        let Some(template) = self.store.get::<Template>(template_id)? else {
            return Ok(None);
        };
        let inspection = Inspection::from_template(&template, details);
        self.create(&inspection)?;
        Ok(Some(inspection))
    }

    pub fn get(&self, id: &str) -> Result<Option<Inspection>> {
        self.store.get(id)
    }

    /// Every inspection, most recently updated first.
    pub fn list(&self) -> Result<Vec<Inspection>> {
        let mut inspections: Vec<Inspection> = self.store.query_range("updatedAt", ..)?;
        inspections.reverse();
        Ok(inspections)
    }

    pub fn recent(&self, limit: usize) -> Result<Vec<Inspection>> {
        let mut inspections = self.list()?;
        inspections.truncate(limit);
        Ok(inspections)
    }

    pub fn by_status(&self, status: InspectionStatus) -> Result<Vec<Inspection>> {
        let mut inspections: Vec<Inspection> = self.store.query("status", status.as_str())?;
        inspections.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(inspections)
    }

    pub fn stats(&self, id: &str) -> Result<Option<InspectionStats>> {
        Ok(self.get(id)?.map(|i| i.stats()))
    }

    /// Patch visit details, notes or the checklist. Replacement sections are
    /// renumbered densely; a completed inspection rejects sections that still
    /// have pending items.
    pub fn update(&self, id: &str, patch: &InspectionPatch) -> Result<Option<Inspection>> {
        if let Some(sections) = &patch.sections {
            let Some(current) = self.get(id)? else {
                return Ok(None);
            };
            if current.status == InspectionStatus::Completed {
                let stats = Inspection {
                    sections: sections.clone(),
                    ..current
                }
                .stats();
                if !stats.can_complete() {
                    return Err(HomecheckError::NotCompletable {
                        id: id.to_string(),
                        pending: stats.pending,
                        total: stats.total,
                    });
                }
            }
        }
        self.apply(id, stamped_patch(patch, Utc::now())?, patch.sections.is_some())
    }

    pub fn set_general_notes(&self, id: &str, notes: Option<String>) -> Result<Option<Inspection>> {
        self.update(
            id,
            &InspectionPatch {
                general_notes: Some(notes.filter(|n| !n.trim().is_empty())),
                ..Default::default()
            },
        )
    }

    /// Delete the inspection and every photo it owns. Each removal gets its
    /// own `delete` sync entry.
    pub fn delete(&self, id: &str) -> Result<bool> {
        if self.store.get::<Inspection>(id)?.is_none() {
            return Ok(false);
        }

        let photos: Vec<Photo> = self.store.query("inspectionId", id)?;
        for photo in &photos {
            if self.store.delete::<Photo>(&photo.id)? {
                self.queue
                    .add(SyncAction::Delete, EntityType::Photo, &photo.id, None)?;
            }
        }

        self.store.delete::<Inspection>(id)?;
        self.queue
            .add(SyncAction::Delete, EntityType::Inspection, id, None)?;
        tracing::info!(id, photos = photos.len(), "deleted inspection");
        Ok(true)
    }

    /// Mark the inspection completed.
    ///
    /// Fails with [`HomecheckError::NotCompletable`] while any item is still
    /// `pending` or when the inspection has no items at all.
    pub fn complete(&self, id: &str) -> Result<Option<Inspection>> {
        let Some(current) = self.get(id)? else {
            return Ok(None);
        };
        let stats = current.stats();
        if !stats.can_complete() {
            return Err(HomecheckError::NotCompletable {
                id: id.to_string(),
                pending: stats.pending,
                total: stats.total,
            });
        }
        let now = Utc::now();
        let transition = Transition {
            status: InspectionStatus::Completed,
            completed_at: Some(now),
        };
        self.apply(id, stamped_patch(&transition, now)?, false)
    }

    /// Return a completed inspection to `in_progress` and clear `completedAt`.
    /// Inspections that are not completed are returned unchanged.
    pub fn reopen(&self, id: &str) -> Result<Option<Inspection>> {
        let Some(current) = self.get(id)? else {
            return Ok(None);
        };
        if current.status != InspectionStatus::Completed {
            return Ok(Some(current));
        }
        let transition = Transition {
            status: InspectionStatus::InProgress,
            completed_at: None,
        };
        self.apply(id, stamped_patch(&transition, Utc::now())?, false)
    }

    /// Change one checklist item. A draft moves to `in_progress` on the first
    /// status or notes change. A completed inspection refuses to put an item
    /// back to `pending` with [`HomecheckError::NotCompletable`]; reopen it
    /// first. Returns `None` if the inspection, section or item does not
    /// exist.
    pub fn update_item(
        &self,
        inspection_id: &str,
        section_id: &str,
        item_id: &str,
        patch: ItemPatch,
    ) -> Result<Option<Inspection>> {
        let mut found = false;
        let mut blocked = None;
        let updated = self.modify(inspection_id, |inspection| {
            let Some(item) = inspection.item_mut(section_id, item_id) else {
                return false;
            };
            found = true;
            if patch.is_empty() {
                return false;
            }
            if let Some(status) = patch.status {
                item.status = status;
            }
            if let Some(notes) = patch.notes {
                item.notes = notes;
            }
            match inspection.status {
                InspectionStatus::Draft => inspection.status = InspectionStatus::InProgress,
                InspectionStatus::Completed if !inspection.stats().can_complete() => {
                    blocked = Some(inspection.stats());
                    return false;
                }
                _ => {}
            }
            true
        })?;
        if let Some(stats) = blocked {
            return Err(HomecheckError::NotCompletable {
                id: inspection_id.to_string(),
                pending: stats.pending,
                total: stats.total,
            });
        }
        Ok(updated.filter(|_| found))
    }

    /// Link a photo to an item. Returns whether the id was added; linking a
    /// photo twice is a no-op.
    pub fn add_photo_to_item(
        &self,
        inspection_id: &str,
        section_id: &str,
        item_id: &str,
        photo_id: &str,
    ) -> Result<bool> {
        let mut added = false;
        self.modify(inspection_id, |inspection| {
            if let Some(item) = inspection.item_mut(section_id, item_id) {
                added = push_unique(&mut item.photo_ids, photo_id);
            }
            added
        })?;
        Ok(added)
    }

    /// Link a photo to a section. Returns whether the id was added.
    pub fn add_photo_to_section(
        &self,
        inspection_id: &str,
        section_id: &str,
        photo_id: &str,
    ) -> Result<bool> {
        let mut added = false;
        self.modify(inspection_id, |inspection| {
            if let Some(section) = inspection.section_mut(section_id) {
                added = push_unique(&mut section.photo_ids, photo_id);
            }
            added
        })?;
        Ok(added)
    }

    /// Drop every reference to a photo. Returns whether anything changed.
    pub(crate) fn scrub_photo(&self, inspection_id: &str, photo_id: &str) -> Result<bool> {
        let mut changed = false;
        self.modify(inspection_id, |inspection| {
            changed = inspection.scrub_photo(photo_id);
            changed
        })?;
        Ok(changed)
    }

    /// Merge a stamped patch, optionally renumber, then enqueue the result.
    fn apply(&self, id: &str, patch: Value, renumber: bool) -> Result<Option<Inspection>> {
        let Some(mut updated) = self.store.update::<Inspection>(id, patch)? else {
            return Ok(None);
        };
        if renumber {
            updated.normalize_order();
            self.store.put(&updated)?;
        }
        self.enqueue(SyncAction::Update, &updated)?;
        Ok(Some(updated))
    }

    /// Re-read the inspection, apply `change`, and persist and enqueue it only
    /// if `change` reports a modification.
    fn modify<F>(&self, id: &str, change: F) -> Result<Option<Inspection>>
    where
        F: FnOnce(&mut Inspection) -> bool,
    {
        let Some(mut inspection) = self.store.get::<Inspection>(id)? else {
            return Ok(None);
        };
        if !change(&mut inspection) {
            return Ok(Some(inspection));
        }
        inspection.updated_at = Utc::now();
        self.store.put(&inspection)?;
        self.enqueue(SyncAction::Update, &inspection)?;
        Ok(Some(inspection))
    }

    fn enqueue(&self, action: SyncAction, inspection: &Inspection) -> Result<String> {
        self.queue.add(
            action,
            EntityType::Inspection,
            &inspection.id,
            Some(SyncPayload::Inspection(inspection.clone())),
        )
    }
}

fn push_unique(ids: &mut Vec<String>, id: &str) -> bool {
    if ids.iter().any(|existing| existing == id) {
        return false;
    }
    ids.push(id.to_string());
    true
}
