//! # Domain Model
//!
//! This module defines the records homecheck persists: [`Template`],
//! [`Inspection`], [`Photo`] and [`AppSettings`].
//!
//! ## Templates
//!
//! A template is a reusable checklist: sections of items for a property type.
//! Sibling `order` values are a dense, zero-based ranking. Every editing helper
//! here (`add_*`, `remove_*`, `move_*`) renumbers siblings, so the invariant
//! holds after any mutation.
//!
//! ## Inspections
//!
//! An inspection is a value-copy of a template taken at creation time
//! ([`Inspection::from_template`]). Later template edits never reach existing
//! inspections.
//!
//! Status lifecycle:
//!
//! ```text
//! draft ──(first item status/notes change)──► in_progress ──(no pending items)──► completed
//!                                                  ▲                                  │
//!                                                  └──────────────(reopen)────────────┘
//! ```
//!
//! ## Photos
//!
//! Photos belong to exactly one inspection and are referenced (not owned) by the
//! `photo_ids` lists of inspection sections and items.
//!
//! ## Identifiers
//!
//! All ids are UUID v4 strings, generated at creation and never reused.
//! Serialized field names are camelCase, matching the export format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::store::{Collection, IndexKey, Record};

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Apartment,
    House,
    Condo,
    Townhouse,
    Commercial,
    Other,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Apartment => "apartment",
            PropertyType::House => "house",
            PropertyType::Condo => "condo",
            PropertyType::Townhouse => "townhouse",
            PropertyType::Commercial => "commercial",
            PropertyType::Other => "other",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Templates ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_notes: Option<String>,
    pub order: u32,
}

impl Item {
    pub fn new(text: impl Into<String>, order: u32) -> Self {
        Self {
            id: new_id(),
            text: text.into(),
            default_notes: None,
            order,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub name: String,
    pub items: Vec<Item>,
    pub order: u32,
}

impl Section {
    pub fn new(name: impl Into<String>, order: u32) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            items: Vec::new(),
            order,
        }
    }

    /// Append an item at the end. Returns the new item id.
    pub fn add_item(&mut self, text: impl Into<String>) -> String {
        let item = Item::new(text, self.items.len() as u32);
        let id = item.id.clone();
        self.items.push(item);
        id
    }

    pub fn remove_item(&mut self, item_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != item_id);
        let removed = self.items.len() != before;
        if removed {
            self.renumber();
        }
        removed
    }

    /// Move an item to position `to` (clamped to the last slot).
    pub fn move_item(&mut self, item_id: &str, to: usize) -> bool {
        let moved = move_within(&mut self.items, |i| i.id == item_id, to);
        if moved {
            self.renumber();
        }
        moved
    }

    /// Rewrite item `order` values from their position in the list.
    pub fn renumber(&mut self) {
        for (idx, item) in self.items.iter_mut().enumerate() {
            item.order = idx as u32;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    pub property_type: PropertyType,
    pub sections: Vec<Section>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}

impl Template {
    pub fn new(name: impl Into<String>, property_type: PropertyType) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            name: name.into(),
            property_type,
            sections: Vec::new(),
            created_at: now,
            updated_at: now,
            is_active: true,
        }
    }

    /// Append a section at the end. Returns the new section id.
    pub fn add_section(&mut self, name: impl Into<String>) -> String {
        let section = Section::new(name, self.sections.len() as u32);
        let id = section.id.clone();
        self.sections.push(section);
        id
    }

    pub fn section_mut(&mut self, section_id: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.id == section_id)
    }

    pub fn remove_section(&mut self, section_id: &str) -> bool {
        let before = self.sections.len();
        self.sections.retain(|s| s.id != section_id);
        let removed = self.sections.len() != before;
        if removed {
            self.renumber();
        }
        removed
    }

    /// Move a section to position `to` (clamped to the last slot).
    pub fn move_section(&mut self, section_id: &str, to: usize) -> bool {
        let moved = move_within(&mut self.sections, |s| s.id == section_id, to);
        if moved {
            self.renumber();
        }
        moved
    }

    /// Rewrite section and item `order` values from their list positions.
    pub fn renumber(&mut self) {
        for (idx, section) in self.sections.iter_mut().enumerate() {
            section.order = idx as u32;
            section.renumber();
        }
    }

    /// Sort sections and items by their current `order` (ties keep list
    /// position), then make the ranking dense and zero-based. Used on
    /// structures coming from outside the editing helpers.
    pub fn normalize_order(&mut self) {
        self.sections.sort_by_key(|s| s.order);
        for section in &mut self.sections {
            section.items.sort_by_key(|i| i.order);
        }
        self.renumber();
    }

    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }

    /// Deep copy with fresh ids for the template, every section and every item.
    pub fn duplicate(&self, new_name: Option<String>) -> Template {
        let now = Utc::now();
        Template {
            id: new_id(),
            name: new_name.unwrap_or_else(|| format!("{} (Copy)", self.name)),
            property_type: self.property_type,
            sections: self
                .sections
                .iter()
                .map(|s| Section {
                    id: new_id(),
                    name: s.name.clone(),
                    order: s.order,
                    items: s
                        .items
                        .iter()
                        .map(|i| Item {
                            id: new_id(),
                            text: i.text.clone(),
                            default_notes: i.default_notes.clone(),
                            order: i.order,
                        })
                        .collect(),
                })
                .collect(),
            created_at: now,
            updated_at: now,
            is_active: true,
        }
    }

    /// Case-insensitive substring match on name or property type.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        needle.is_empty()
            || self.name.to_lowercase().contains(&needle)
            || self.property_type.as_str().contains(&needle)
    }
}

/// Move the element matching `pred` to index `to`. Returns false if absent.
fn move_within<T>(list: &mut Vec<T>, pred: impl Fn(&T) -> bool, to: usize) -> bool {
    let Some(from) = list.iter().position(pred) else {
        return false;
    };
    let element = list.remove(from);
    let to = to.min(list.len());
    list.insert(to, element);
    true
}

impl Record for Template {
    const COLLECTION: Collection = Collection::Templates;
    const INDEXES: &'static [&'static str] = &["propertyType", "isActive", "updatedAt"];

    fn id(&self) -> &str {
        &self.id
    }

    fn index_key(&self, index: &str) -> Option<IndexKey> {
        match index {
            "propertyType" => Some(self.property_type.as_str().into()),
            "isActive" => Some(self.is_active.into()),
            "updatedAt" => Some(self.updated_at.into()),
            _ => None,
        }
    }
}

// --- Inspections ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionStatus {
    Draft,
    InProgress,
    Completed,
}

impl InspectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InspectionStatus::Draft => "draft",
            InspectionStatus::InProgress => "in_progress",
            InspectionStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for InspectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Pending,
    Ok,
    Attention,
    Na,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionItem {
    pub item_id: String,
    pub text: String,
    pub status: ItemStatus,
    pub notes: String,
    pub photo_ids: Vec<String>,
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionSection {
    pub section_id: String,
    pub name: String,
    pub items: Vec<InspectionItem>,
    pub photo_ids: Vec<String>,
    pub order: u32,
}

/// Visit details supplied when starting an inspection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewInspection {
    pub address: String,
    pub unit: Option<String>,
    pub tenant_name: Option<String>,
    pub inspector_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inspection {
    pub id: String,
    pub template_id: String,
    pub template_name: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_name: Option<String>,
    pub inspector_name: String,
    pub status: InspectionStatus,
    pub sections: Vec<InspectionSection>,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub general_notes: Option<String>,
}

/// Item tallies for an inspection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InspectionStats {
    pub total: usize,
    pub pending: usize,
    pub ok: usize,
    pub attention: usize,
    pub na: usize,
}

impl InspectionStats {
    pub fn completed(&self) -> usize {
        self.total - self.pending
    }

    pub fn can_complete(&self) -> bool {
        self.total > 0 && self.pending == 0
    }
}

impl Inspection {
    /// Snapshot a template into a fresh draft inspection.
    pub fn from_template(template: &Template, details: NewInspection) -> Self {
        let now = Utc::now();
        let mut sections: Vec<InspectionSection> = template
            .sections
            .iter()
            .map(|s| InspectionSection {
                section_id: s.id.clone(),
                name: s.name.clone(),
                items: s
                    .items
                    .iter()
                    .map(|i| InspectionItem {
                        item_id: i.id.clone(),
                        text: i.text.clone(),
                        status: ItemStatus::Pending,
                        notes: i.default_notes.clone().unwrap_or_default(),
                        photo_ids: Vec::new(),
                        order: i.order,
                    })
                    .collect(),
                photo_ids: Vec::new(),
                order: s.order,
            })
            .collect();
        sections.sort_by_key(|s| s.order);
        for section in &mut sections {
            section.items.sort_by_key(|i| i.order);
        }

        Self {
            id: new_id(),
            template_id: template.id.clone(),
            template_name: template.name.clone(),
            address: details.address,
            unit: details.unit,
            tenant_name: details.tenant_name,
            inspector_name: details.inspector_name,
            status: InspectionStatus::Draft,
            sections,
            started_at: now,
            completed_at: None,
            updated_at: now,
            general_notes: None,
        }
    }

    /// Sort sections and items by `order` (ties keep list position), then
    /// rewrite `order` densely from zero.
    pub fn normalize_order(&mut self) {
        self.sections.sort_by_key(|s| s.order);
        for (idx, section) in self.sections.iter_mut().enumerate() {
            section.order = idx as u32;
            section.items.sort_by_key(|i| i.order);
            for (item_idx, item) in section.items.iter_mut().enumerate() {
                item.order = item_idx as u32;
            }
        }
    }

    pub fn section_mut(&mut self, section_id: &str) -> Option<&mut InspectionSection> {
        self.sections.iter_mut().find(|s| s.section_id == section_id)
    }

    pub fn item_mut(&mut self, section_id: &str, item_id: &str) -> Option<&mut InspectionItem> {
        self.section_mut(section_id)?
            .items
            .iter_mut()
            .find(|i| i.item_id == item_id)
    }

    pub fn item(&self, section_id: &str, item_id: &str) -> Option<&InspectionItem> {
        self.sections
            .iter()
            .find(|s| s.section_id == section_id)?
            .items
            .iter()
            .find(|i| i.item_id == item_id)
    }

    pub fn stats(&self) -> InspectionStats {
        let mut stats = InspectionStats::default();
        for item in self.sections.iter().flat_map(|s| s.items.iter()) {
            stats.total += 1;
            match item.status {
                ItemStatus::Pending => stats.pending += 1,
                ItemStatus::Ok => stats.ok += 1,
                ItemStatus::Attention => stats.attention += 1,
                ItemStatus::Na => stats.na += 1,
            }
        }
        stats
    }

    /// Remove a photo id from every section and item list. Returns whether
    /// anything referenced it.
    pub fn scrub_photo(&mut self, photo_id: &str) -> bool {
        let mut changed = false;
        for section in &mut self.sections {
            let before = section.photo_ids.len();
            section.photo_ids.retain(|p| p != photo_id);
            changed |= section.photo_ids.len() != before;
            for item in &mut section.items {
                let before = item.photo_ids.len();
                item.photo_ids.retain(|p| p != photo_id);
                changed |= item.photo_ids.len() != before;
            }
        }
        changed
    }
}

impl Record for Inspection {
    const COLLECTION: Collection = Collection::Inspections;
    const INDEXES: &'static [&'static str] = &["status", "updatedAt"];

    fn id(&self) -> &str {
        &self.id
    }

    fn index_key(&self, index: &str) -> Option<IndexKey> {
        match index {
            "status" => Some(self.status.as_str().into()),
            "updatedAt" => Some(self.updated_at.into()),
            _ => None,
        }
    }
}

// --- Photos ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Geolocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: String,
    pub inspection_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    /// Encoded image as a `data:` URL.
    pub image_data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotated_image_data: Option<String>,
    pub has_annotations: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geolocation: Option<Geolocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_data: Option<String>,
    pub file_size: u64,
    pub mime_type: String,
}

impl Record for Photo {
    const COLLECTION: Collection = Collection::Photos;
    const INDEXES: &'static [&'static str] = &[
        "inspectionId",
        "inspectionId+sectionId",
        "inspectionId+itemId",
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn index_key(&self, index: &str) -> Option<IndexKey> {
        match index {
            "inspectionId" => Some(self.inspection_id.as_str().into()),
            "inspectionId+sectionId" => {
                let section = self.section_id.as_deref()?;
                Some(IndexKey::compound([self.inspection_id.as_str(), section]))
            }
            "inspectionId+itemId" => {
                let item = self.item_id.as_deref()?;
                Some(IndexKey::compound([self.inspection_id.as_str(), item]))
            }
            _ => None,
        }
    }
}

// --- Settings ---

pub const SETTINGS_ID: &str = "app";

/// User preferences. Stored as a single record keyed [`SETTINGS_ID`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspector_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default = "default_true")]
    pub include_photos_in_report: bool,
    #[serde(default)]
    pub capture_geolocation: bool,
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            id: SETTINGS_ID.to_string(),
            inspector_name: None,
            company_name: None,
            include_photos_in_report: true,
            capture_geolocation: false,
            updated_at: Utc::now(),
        }
    }
}

impl Record for AppSettings {
    const COLLECTION: Collection = Collection::Settings;
    const INDEXES: &'static [&'static str] = &[];

    fn id(&self) -> &str {
        &self.id
    }

    fn index_key(&self, _index: &str) -> Option<IndexKey> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn studio() -> Template {
        let mut t = Template::new("Studio", PropertyType::Apartment);
        let kitchen = t.add_section("Kitchen");
        let section = t.section_mut(&kitchen).unwrap();
        section.add_item("Check sink");
        section.add_item("Check oven");
        let bath = t.add_section("Bathroom");
        t.section_mut(&bath).unwrap().add_item("Check shower");
        t
    }

    fn orders<T>(list: &[T], f: impl Fn(&T) -> u32) -> Vec<u32> {
        list.iter().map(f).collect()
    }

    #[test]
    fn test_new_template_is_empty_and_active() {
        let t = Template::new("Blank", PropertyType::House);
        assert!(t.sections.is_empty());
        assert!(t.is_active);
        assert_eq!(t.created_at, t.updated_at);
    }

    #[test]
    fn test_add_sections_and_items_are_dense() {
        let t = studio();
        assert_eq!(orders(&t.sections, |s| s.order), vec![0, 1]);
        assert_eq!(orders(&t.sections[0].items, |i| i.order), vec![0, 1]);
        assert_eq!(t.item_count(), 3);
    }

    #[test]
    fn test_remove_section_renumbers() {
        let mut t = studio();
        t.add_section("Bedroom");
        let first = t.sections[0].id.clone();

        assert!(t.remove_section(&first));
        assert_eq!(orders(&t.sections, |s| s.order), vec![0, 1]);
        assert_eq!(t.sections[0].name, "Bathroom");
        assert!(!t.remove_section("missing"));
    }

    #[test]
    fn test_move_section_renumbers() {
        let mut t = studio();
        t.add_section("Bedroom");
        let bedroom = t.sections[2].id.clone();

        assert!(t.move_section(&bedroom, 0));
        let names: Vec<&str> = t.sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Bedroom", "Kitchen", "Bathroom"]);
        assert_eq!(orders(&t.sections, |s| s.order), vec![0, 1, 2]);
    }

    #[test]
    fn test_move_item_clamps_target() {
        let mut t = studio();
        let section = &mut t.sections[0];
        let sink = section.items[0].id.clone();

        assert!(section.move_item(&sink, 99));
        assert_eq!(section.items[1].text, "Check sink");
        assert_eq!(orders(&section.items, |i| i.order), vec![0, 1]);
    }

    #[test]
    fn test_remove_item_renumbers() {
        let mut t = studio();
        let section = &mut t.sections[0];
        let sink = section.items[0].id.clone();

        assert!(section.remove_item(&sink));
        assert_eq!(section.items.len(), 1);
        assert_eq!(section.items[0].order, 0);
    }

    #[test]
    fn test_normalize_order_makes_sparse_ranking_dense() {
        let mut t = studio();
        t.sections[0].order = 7;
        t.sections[1].order = 3;
        t.sections[0].items[0].order = 10;
        t.sections[0].items[1].order = 4;

        t.normalize_order();

        assert_eq!(t.sections[0].name, "Bathroom");
        assert_eq!(orders(&t.sections, |s| s.order), vec![0, 1]);
        assert_eq!(t.sections[1].items[0].text, "Check oven");
        assert_eq!(orders(&t.sections[1].items, |i| i.order), vec![0, 1]);
    }

    #[test]
    fn test_duplicate_uses_fresh_ids() {
        let original = studio();
        let copy = original.duplicate(None);

        let ids = |t: &Template| -> HashSet<String> {
            let mut ids = HashSet::new();
            ids.insert(t.id.clone());
            for s in &t.sections {
                ids.insert(s.id.clone());
                for i in &s.items {
                    ids.insert(i.id.clone());
                }
            }
            ids
        };

        assert!(ids(&original).is_disjoint(&ids(&copy)));
        assert_eq!(copy.name, "Studio (Copy)");
        assert_eq!(copy.sections.len(), original.sections.len());
        for (a, b) in original.sections.iter().zip(&copy.sections) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.order, b.order);
            let texts_a: Vec<&str> = a.items.iter().map(|i| i.text.as_str()).collect();
            let texts_b: Vec<&str> = b.items.iter().map(|i| i.text.as_str()).collect();
            assert_eq!(texts_a, texts_b);
        }
    }

    #[test]
    fn test_duplicate_with_name() {
        let copy = studio().duplicate(Some("Loft".to_string()));
        assert_eq!(copy.name, "Loft");
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let t = studio();
        assert!(t.matches("stud"));
        assert!(t.matches("APART"));
        assert!(t.matches(""));
        assert!(!t.matches("warehouse"));
    }

    #[test]
    fn test_inspection_snapshot_copies_structure() {
        let mut template = studio();
        template.sections[0].items[0].default_notes = Some("Check under the sink too".into());
        let inspection = Inspection::from_template(
            &template,
            NewInspection {
                address: "123 Main St".into(),
                inspector_name: "Sam".into(),
                ..Default::default()
            },
        );

        assert_eq!(inspection.status, InspectionStatus::Draft);
        assert_eq!(inspection.template_name, "Studio");
        assert_eq!(inspection.sections.len(), 2);
        assert_eq!(inspection.sections[0].section_id, template.sections[0].id);
        let first = &inspection.sections[0].items[0];
        assert_eq!(first.item_id, template.sections[0].items[0].id);
        assert_eq!(first.status, ItemStatus::Pending);
        assert_eq!(first.notes, "Check under the sink too");

        // Later template edits don't reach the snapshot
        template.sections[0].items[0].text = "Changed".into();
        assert_eq!(inspection.sections[0].items[0].text, "Check sink");
    }

    #[test]
    fn test_stats() {
        let mut inspection = Inspection::from_template(&studio(), NewInspection::default());
        inspection.sections[0].items[0].status = ItemStatus::Ok;
        inspection.sections[0].items[1].status = ItemStatus::Attention;

        let stats = inspection.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.ok, 1);
        assert_eq!(stats.attention, 1);
        assert_eq!(stats.completed(), 2);
        assert!(!stats.can_complete());

        inspection.sections[1].items[0].status = ItemStatus::Na;
        assert!(inspection.stats().can_complete());
    }

    #[test]
    fn test_empty_inspection_cannot_complete() {
        let template = Template::new("Empty", PropertyType::Other);
        let inspection = Inspection::from_template(&template, NewInspection::default());
        assert!(!inspection.stats().can_complete());
    }

    #[test]
    fn test_scrub_photo() {
        let mut inspection = Inspection::from_template(&studio(), NewInspection::default());
        inspection.sections[0].photo_ids.push("p1".into());
        inspection.sections[0].items[1].photo_ids.push("p1".into());
        inspection.sections[1].items[0].photo_ids.push("p2".into());

        assert!(inspection.scrub_photo("p1"));
        assert!(inspection.sections[0].photo_ids.is_empty());
        assert!(inspection.sections[0].items[1].photo_ids.is_empty());
        assert_eq!(inspection.sections[1].items[0].photo_ids, vec!["p2"]);
        assert!(!inspection.scrub_photo("p1"));
    }

    #[test]
    fn test_serialized_field_names_are_camel_case() {
        let inspection = Inspection::from_template(&studio(), NewInspection::default());
        let value = serde_json::to_value(&inspection).unwrap();
        assert!(value.get("templateName").is_some());
        assert!(value.get("startedAt").is_some());
        assert_eq!(value["status"], "draft");
        assert!(value.get("completedAt").is_none());
        assert!(value["sections"][0]["items"][0].get("photoIds").is_some());
    }

    #[test]
    fn test_photo_compound_index_requires_section() {
        let photo = Photo {
            id: "p".into(),
            inspection_id: "i".into(),
            section_id: None,
            item_id: Some("it".into()),
            image_data: String::new(),
            annotated_image_data: None,
            has_annotations: false,
            timestamp: Utc::now(),
            geolocation: None,
            caption: None,
            thumbnail_data: None,
            file_size: 0,
            mime_type: "image/jpeg".into(),
        };
        assert!(photo.index_key("inspectionId+sectionId").is_none());
        assert_eq!(
            photo.index_key("inspectionId+itemId"),
            Some(IndexKey::compound(["i", "it"]))
        );
    }

    #[test]
    fn test_settings_defaults_on_sparse_json() {
        let json = r#"{"id": "app", "updatedAt": "2024-01-01T00:00:00Z"}"#;
        let settings: AppSettings = serde_json::from_str(json).unwrap();
        assert!(settings.include_photos_in_report);
        assert!(!settings.capture_geolocation);
        assert_eq!(settings.inspector_name, None);
    }
}
