//! # Sync
//!
//! Every mutation made through the repositories is recorded in a durable queue
//! so it can eventually reach a remote system. The local store stays the source
//! of truth; the queue only describes what the remote has not seen yet.
//!
//! ## Coalescing
//!
//! At most one `pending` entry exists per `(entity type, entity id)`. Adding a
//! mutation for an entity that already has one merges into it:
//!
//! | pending | incoming | result |
//! |---------|----------|--------|
//! | any | `delete` | `delete`, data cleared |
//! | `create` | `create`/`update` | `create`, latest data |
//! | `update`/`delete` | `create`/`update` | incoming action, latest data |
//!
//! A create followed by a delete before any drain therefore syncs as a single
//! `delete`. The remote is expected to accept deletes for ids it never saw.
//!
//! ## Entry lifecycle
//!
//! ```text
//! pending ──► syncing ──► (removed on success)
//!    ▲           │
//!    │           └──► failed ──(retry_failed)──┐
//!    └─────────────────────────────────────────┘
//! ```
//!
//! Entries left in `syncing` by an interrupted drain are reset to `pending` at
//! the start of the next drain.
//!
//! ## Modules
//!
//! - [`queue`]: the durable queue and its coalescing rules.
//! - [`processor`]: drains the queue against a [`remote::RemoteEffect`].
//! - [`remote`]: the remote capability and a logging stub.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;

use crate::model::{Inspection, Photo, Template};
use crate::store::{Collection, IndexKey, Record};

pub mod processor;
pub mod queue;
pub mod remote;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncAction {
    Create,
    Update,
    Delete,
}

impl SyncAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncAction::Create => "create",
            SyncAction::Update => "update",
            SyncAction::Delete => "delete",
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Template,
    Inspection,
    Photo,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Template => "template",
            EntityType::Inspection => "inspection",
            EntityType::Photo => "photo",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Pending,
    Syncing,
    Synced,
    Failed,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Pending => "pending",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Synced => "synced",
            SyncStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full snapshot of the entity a queue entry refers to, tagged by entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entityType", content = "record", rename_all = "lowercase")]
pub enum SyncPayload {
    Template(Template),
    Inspection(Inspection),
    Photo(Photo),
}

impl SyncPayload {
    pub fn entity_type(&self) -> EntityType {
        match self {
            SyncPayload::Template(_) => EntityType::Template,
            SyncPayload::Inspection(_) => EntityType::Inspection,
            SyncPayload::Photo(_) => EntityType::Photo,
        }
    }

    pub fn entity_id(&self) -> &str {
        match self {
            SyncPayload::Template(t) => &t.id,
            SyncPayload::Inspection(i) => &i.id,
            SyncPayload::Photo(p) => &p.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncQueueItem {
    pub id: String,
    pub action: SyncAction,
    pub entity_type: EntityType,
    pub entity_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<SyncPayload>,
    pub created_at: DateTime<Utc>,
    pub status: SyncStatus,
    pub retry_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_attempt_at: Option<DateTime<Utc>>,
}

impl SyncQueueItem {
    pub fn entity_key(&self) -> IndexKey {
        entity_key(self.entity_type, &self.entity_id)
    }
}

pub(crate) fn entity_key(entity_type: EntityType, entity_id: &str) -> IndexKey {
    IndexKey::compound([entity_type.as_str(), entity_id])
}

impl Record for SyncQueueItem {
    const COLLECTION: Collection = Collection::SyncQueue;
    const INDEXES: &'static [&'static str] = &["status", "entityType+entityId", "createdAt"];

    fn id(&self) -> &str {
        &self.id
    }

    fn index_key(&self, index: &str) -> Option<IndexKey> {
        match index {
            "status" => Some(self.status.as_str().into()),
            "entityType+entityId" => Some(self.entity_key()),
            "createdAt" => Some(self.created_at.into()),
            _ => None,
        }
    }
}

/// In-memory sync bookkeeping shared by everything working on one store.
///
/// Holds the newest queue timestamp handed out, so enqueueing does not rescan
/// the queue, and the drain lock that keeps drains over the store exclusive
/// no matter how many processors exist.
#[derive(Debug, Default)]
pub struct SyncState {
    last_queued_at: Cell<Option<DateTime<Utc>>>,
    draining: Cell<bool>,
}

impl SyncState {
    pub(crate) fn last_queued_at(&self) -> Option<DateTime<Utc>> {
        self.last_queued_at.get()
    }

    pub(crate) fn set_last_queued_at(&self, at: DateTime<Utc>) {
        self.last_queued_at.set(Some(at));
    }

    pub fn is_draining(&self) -> bool {
        self.draining.get()
    }

    /// Take the drain lock. Returns `None` if a drain already holds it.
    pub(crate) fn try_lock_drain(&self) -> Option<DrainLock<'_>> {
        if self.draining.replace(true) {
            None
        } else {
            Some(DrainLock(&self.draining))
        }
    }
}

/// Releases the drain lock when a drain finishes or its future is dropped.
pub(crate) struct DrainLock<'s>(&'s Cell<bool>);

impl Drop for DrainLock<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Merge an incoming mutation into a pending one for the same entity.
pub fn coalesce(existing: SyncAction, incoming: SyncAction) -> SyncAction {
    match (existing, incoming) {
        (_, SyncAction::Delete) => SyncAction::Delete,
        (SyncAction::Create, _) => SyncAction::Create,
        (_, incoming) => incoming,
    }
}
