use chrono::Utc;
use serde::Serialize;

use super::inspection::InspectionRepository;
use crate::error::Result;
use crate::media::{self, PhotoOptions};
use crate::model::{new_id, Geolocation, Photo};
use crate::store::backend::StorageBackend;
use crate::store::{IndexKey, LocalStore};
use crate::sync::queue::SyncQueue;
use crate::sync::{EntityType, SyncAction, SyncPayload};

pub use crate::geo::acquire_location;
pub use crate::media::{compress_image, generate_thumbnail};

/// Partial photo update. `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotated_image_data: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_annotations: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geolocation: Option<Option<Geolocation>>,
}

/// A raw camera or file capture, before compression.
#[derive(Debug, Clone, Default)]
pub struct PhotoCapture {
    pub inspection_id: String,
    pub section_id: Option<String>,
    pub item_id: Option<String>,
    /// Encoded source image as a `data:` URL.
    pub image_data: String,
    pub caption: Option<String>,
    pub geolocation: Option<Geolocation>,
}

pub struct PhotoRepository<'a, B: StorageBackend> {
    store: &'a LocalStore<B>,
    queue: SyncQueue<'a, B>,
    inspections: InspectionRepository<'a, B>,
}

impl<'a, B: StorageBackend> PhotoRepository<'a, B> {
    pub fn new(store: &'a LocalStore<B>) -> Self {
        Self {
            store,
            queue: SyncQueue::new(store),
            inspections: InspectionRepository::new(store),
        }
    }

    pub fn create(&self, photo: &Photo) -> Result<String> {
        self.store.put(photo)?;
        self.enqueue(SyncAction::Create, photo)?;
        tracing::debug!(id = %photo.id, inspection = %photo.inspection_id, "created photo");
        Ok(photo.id.clone())
    }

    /// Compress a capture, build its thumbnail, store it, and link it to its
    /// item (or section when no item is given).
    pub fn create_from_capture(&self, capture: PhotoCapture, options: &PhotoOptions) -> Result<Photo> {
        let image_data =
            media::compress_image(&capture.image_data, options.max_dimension, options.quality)?;
        let thumbnail_data = media::generate_thumbnail(
            &capture.image_data,
            options.thumbnail_dimension,
            options.thumbnail_quality,
        )?;
        let photo = Photo {
            id: new_id(),
            inspection_id: capture.inspection_id,
            section_id: capture.section_id,
            item_id: capture.item_id,
            file_size: media::payload_size(&image_data)?,
            image_data,
            annotated_image_data: None,
            has_annotations: false,
            timestamp: Utc::now(),
            geolocation: capture.geolocation,
            caption: capture.caption.filter(|c| !c.trim().is_empty()),
            thumbnail_data: Some(thumbnail_data),
            mime_type: media::JPEG_MIME.to_string(),
        };
        self.create(&photo)?;

        match (&photo.section_id, &photo.item_id) {
            (Some(section), Some(item)) => {
                self.inspections
                    .add_photo_to_item(&photo.inspection_id, section, item, &photo.id)?;
            }
            (Some(section), None) => {
                self.inspections
                    .add_photo_to_section(&photo.inspection_id, section, &photo.id)?;
            }
            _ => {}
        }
        Ok(photo)
    }

    pub fn get(&self, id: &str) -> Result<Option<Photo>> {
        self.store.get(id)
    }

    /// Photos of an inspection, oldest first.
    pub fn by_inspection(&self, inspection_id: &str) -> Result<Vec<Photo>> {
        Ok(oldest_first(self.store.query("inspectionId", inspection_id)?))
    }

    pub fn by_section(&self, inspection_id: &str, section_id: &str) -> Result<Vec<Photo>> {
        Ok(oldest_first(self.store.query(
            "inspectionId+sectionId",
            IndexKey::compound([inspection_id, section_id]),
        )?))
    }

    pub fn by_item(&self, inspection_id: &str, item_id: &str) -> Result<Vec<Photo>> {
        Ok(oldest_first(self.store.query(
            "inspectionId+itemId",
            IndexKey::compound([inspection_id, item_id]),
        )?))
    }

    pub fn update(&self, id: &str, patch: &PhotoPatch) -> Result<Option<Photo>> {
        let Some(updated) = self
            .store
            .update::<Photo>(id, serde_json::to_value(patch)?)?
        else {
            return Ok(None);
        };
        self.enqueue(SyncAction::Update, &updated)?;
        Ok(Some(updated))
    }

    /// Store the output of the annotation editor alongside the original.
    pub fn annotate(&self, id: &str, annotated_image_data: String) -> Result<Option<Photo>> {
        self.update(
            id,
            &PhotoPatch {
                annotated_image_data: Some(Some(annotated_image_data)),
                has_annotations: Some(true),
                ..Default::default()
            },
        )
    }

    pub fn clear_annotations(&self, id: &str) -> Result<Option<Photo>> {
        self.update(
            id,
            &PhotoPatch {
                annotated_image_data: Some(None),
                has_annotations: Some(false),
                ..Default::default()
            },
        )
    }

    pub fn set_caption(&self, id: &str, caption: Option<String>) -> Result<Option<Photo>> {
        self.update(
            id,
            &PhotoPatch {
                caption: Some(caption.filter(|c| !c.trim().is_empty())),
                ..Default::default()
            },
        )
    }

    /// Delete a photo and drop its id from the owning inspection's section and
    /// item lists. Returns whether the photo existed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let Some(photo) = self.store.get::<Photo>(id)? else {
            return Ok(false);
        };
        self.store.delete::<Photo>(id)?;
        self.queue
            .add(SyncAction::Delete, EntityType::Photo, id, None)?;
        self.inspections.scrub_photo(&photo.inspection_id, id)?;
        tracing::debug!(id, inspection = %photo.inspection_id, "deleted photo");
        Ok(true)
    }

    fn enqueue(&self, action: SyncAction, photo: &Photo) -> Result<String> {
        self.queue.add(
            action,
            EntityType::Photo,
            &photo.id,
            Some(SyncPayload::Photo(photo.clone())),
        )
    }
}

fn oldest_first(mut photos: Vec<Photo>) -> Vec<Photo> {
    photos.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
    photos
}
