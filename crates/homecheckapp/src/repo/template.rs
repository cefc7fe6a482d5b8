use chrono::Utc;
use serde::Serialize;

use super::stamped_patch;
use crate::error::Result;
use crate::model::{PropertyType, Section, Template};
use crate::store::backend::StorageBackend;
use crate::store::LocalStore;
use crate::sync::queue::SyncQueue;
use crate::sync::{EntityType, SyncAction, SyncPayload};

/// Partial template update. Unset fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_type: Option<PropertyType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<Section>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

pub struct TemplateRepository<'a, B: StorageBackend> {
    store: &'a LocalStore<B>,
    queue: SyncQueue<'a, B>,
}

impl<'a, B: StorageBackend> TemplateRepository<'a, B> {
    pub fn new(store: &'a LocalStore<B>) -> Self {
        Self {
            store,
            queue: SyncQueue::new(store),
        }
    }

    pub fn create(&self, template: &Template) -> Result<String> {
        self.store.put(template)?;
        self.enqueue(SyncAction::Create, template)?;
        tracing::info!(id = %template.id, name = %template.name, "created template");
        Ok(template.id.clone())
    }

    pub fn get(&self, id: &str) -> Result<Option<Template>> {
        self.store.get(id)
    }

    /// Every template, active or not, sorted by name.
    pub fn list_all(&self) -> Result<Vec<Template>> {
        let mut templates: Vec<Template> = self.store.all()?;
        sort_by_name(&mut templates);
        Ok(templates)
    }

    pub fn list_active(&self) -> Result<Vec<Template>> {
        let mut templates: Vec<Template> = self.store.query("isActive", true)?;
        sort_by_name(&mut templates);
        Ok(templates)
    }

    pub fn by_property_type(&self, property_type: PropertyType) -> Result<Vec<Template>> {
        let mut templates: Vec<Template> =
            self.store.query("propertyType", property_type.as_str())?;
        sort_by_name(&mut templates);
        Ok(templates)
    }

    /// Active templates whose name or property type contains `query`,
    /// ignoring case.
    pub fn search(&self, query: &str) -> Result<Vec<Template>> {
        Ok(self
            .list_active()?
            .into_iter()
            .filter(|t| t.matches(query))
            .collect())
    }

    /// Merge `patch` into the stored template. Replacement sections are
    /// sorted by their `order` and renumbered densely before anything is
    /// enqueued.
    pub fn update(&self, id: &str, patch: &TemplatePatch) -> Result<Option<Template>> {
        let Some(mut updated) = self
            .store
            .update::<Template>(id, stamped_patch(patch, Utc::now())?)?
        else {
            return Ok(None);
        };
        if patch.sections.is_some() {
            updated.normalize_order();
            self.store.put(&updated)?;
        }
        self.enqueue(SyncAction::Update, &updated)?;
        Ok(Some(updated))
    }

    /// Read-modify-write with the structural editing helpers on [`Template`].
    ///
    /// The record is re-read right before `edit` runs and sibling `order`
    /// values are renumbered afterwards.
    pub fn edit<F>(&self, id: &str, edit: F) -> Result<Option<Template>>
    where
        F: FnOnce(&mut Template),
    {
        let Some(mut template) = self.store.get::<Template>(id)? else {
            return Ok(None);
        };
        edit(&mut template);
        template.id = id.to_string();
        template.renumber();
        template.updated_at = Utc::now();
        self.store.put(&template)?;
        self.enqueue(SyncAction::Update, &template)?;
        Ok(Some(template))
    }

    /// Hard delete. Returns whether the template existed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        if !self.store.delete::<Template>(id)? {
            return Ok(false);
        }
        self.queue
            .add(SyncAction::Delete, EntityType::Template, id, None)?;
        tracing::info!(id, "deleted template");
        Ok(true)
    }

    /// Hide the template from active listings while keeping the record.
    pub fn soft_delete(&self, id: &str) -> Result<Option<Template>> {
        self.update(
            id,
            &TemplatePatch {
                is_active: Some(false),
                ..Default::default()
            },
        )
    }

    /// Deep copy with fresh ids throughout. The copy is created like any new
    /// template, so it gets its own `create` sync entry.
    pub fn duplicate(&self, id: &str, new_name: Option<String>) -> Result<Option<String>> {
        let Some(original) = self.store.get::<Template>(id)? else {
            return Ok(None);
        };
        let copy = original.duplicate(new_name);
        self.create(&copy).map(Some)
    }

    fn enqueue(&self, action: SyncAction, template: &Template) -> Result<String> {
        self.queue.add(
            action,
            EntityType::Template,
            &template.id,
            Some(SyncPayload::Template(template.clone())),
        )
    }
}

fn sort_by_name(templates: &mut [Template]) {
    templates.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });
}
