use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::{coalesce, entity_key, EntityType, SyncAction, SyncPayload, SyncQueueItem, SyncStatus};
use crate::error::{HomecheckError, Result};
use crate::model::new_id;
use crate::store::backend::StorageBackend;
use crate::store::LocalStore;

/// Counts per queue state, for sync indicators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueueSummary {
    pub pending: usize,
    pub syncing: usize,
    pub failed: usize,
    pub last_error: Option<String>,
}

/// Durable queue of mutations awaiting the remote.
pub struct SyncQueue<'a, B: StorageBackend> {
    store: &'a LocalStore<B>,
}

impl<'a, B: StorageBackend> SyncQueue<'a, B> {
    pub fn new(store: &'a LocalStore<B>) -> Self {
        Self { store }
    }

    /// Record a mutation, coalescing with the entity's pending entry if any.
    /// Returns the id of the entry now carrying the mutation.
    pub fn add(
        &self,
        action: SyncAction,
        entity_type: EntityType,
        entity_id: &str,
        data: Option<SyncPayload>,
    ) -> Result<String> {
        if let Some(payload) = &data {
            if payload.entity_type() != entity_type || payload.entity_id() != entity_id {
                return Err(HomecheckError::PayloadMismatch {
                    expected: format!("{} {}", entity_type, entity_id),
                    found: format!("{} {}", payload.entity_type(), payload.entity_id()),
                });
            }
        }

        let created_at = self.next_timestamp()?;
        let data = if action == SyncAction::Delete { None } else { data };

        if let Some(mut existing) = self.pending_for(entity_type, entity_id)? {
            let merged = coalesce(existing.action, action);
            tracing::debug!(
                entity = %entity_type,
                entity_id,
                from = %existing.action,
                incoming = %action,
                merged = %merged,
                "coalesced sync entry"
            );
            existing.action = merged;
            existing.data = if merged == SyncAction::Delete { None } else { data };
            existing.created_at = created_at;
            self.store.put(&existing)?;
            return Ok(existing.id);
        }

        let item = SyncQueueItem {
            id: new_id(),
            action,
            entity_type,
            entity_id: entity_id.to_string(),
            data,
            created_at,
            status: SyncStatus::Pending,
            retry_count: 0,
            last_error: None,
            last_attempt_at: None,
        };
        self.store.put(&item)?;
        tracing::debug!(entity = %entity_type, entity_id, action = %action, "queued sync entry");
        Ok(item.id)
    }

    pub fn get(&self, id: &str) -> Result<Option<SyncQueueItem>> {
        self.store.get(id)
    }

    /// Pending entries, oldest first.
    pub fn get_pending(&self) -> Result<Vec<SyncQueueItem>> {
        self.by_status(SyncStatus::Pending)
    }

    pub fn get_pending_count(&self) -> Result<usize> {
        Ok(self.get_pending()?.len())
    }

    pub fn get_failed(&self) -> Result<Vec<SyncQueueItem>> {
        self.by_status(SyncStatus::Failed)
    }

    /// Every entry regardless of state, oldest first.
    pub fn all(&self) -> Result<Vec<SyncQueueItem>> {
        self.store.query_range("createdAt", ..)
    }

    /// Move an entry to `status`. Passing an error records a failed attempt:
    /// `retry_count` is incremented and `last_error`/`last_attempt_at` are set.
    /// Returns false if the entry no longer exists.
    pub fn update_status(&self, id: &str, status: SyncStatus, error: Option<&str>) -> Result<bool> {
        let Some(mut item) = self.store.get::<SyncQueueItem>(id)? else {
            return Ok(false);
        };
        item.status = status;
        if let Some(message) = error {
            item.retry_count += 1;
            item.last_error = Some(message.to_string());
            item.last_attempt_at = Some(Utc::now());
        }
        self.store.put(&item)?;
        Ok(true)
    }

    /// Synced entries are not retained: the entry is removed.
    pub fn mark_synced(&self, id: &str) -> Result<bool> {
        self.store.delete::<SyncQueueItem>(id)
    }

    pub fn mark_failed(&self, id: &str, error: &str) -> Result<bool> {
        self.update_status(id, SyncStatus::Failed, Some(error))
    }

    /// Put every failed entry back in `pending` with a fresh retry count.
    ///
    /// If the entity gained a new pending entry after the failure, the failed
    /// entry is folded into it instead, so the one-pending-per-entity rule holds.
    pub fn retry_failed(&self) -> Result<usize> {
        let failed = self.get_failed()?;
        let count = failed.len();
        for item in failed {
            self.requeue(item, true)?;
        }
        if count > 0 {
            tracing::info!(count, "requeued failed sync entries");
        }
        Ok(count)
    }

    /// Reset entries stuck in `syncing` (left behind by an interrupted drain).
    pub fn reset_stale_syncing(&self) -> Result<usize> {
        let stale = self.by_status(SyncStatus::Syncing)?;
        let count = stale.len();
        for item in stale {
            self.requeue(item, false)?;
        }
        if count > 0 {
            tracing::warn!(count, "reset stale syncing entries to pending");
        }
        Ok(count)
    }

    pub fn clear_synced(&self) -> Result<usize> {
        let synced = self.by_status(SyncStatus::Synced)?;
        for item in &synced {
            self.store.delete::<SyncQueueItem>(&item.id)?;
        }
        Ok(synced.len())
    }

    pub fn clear_all(&self) -> Result<()> {
        self.store.clear::<SyncQueueItem>()
    }

    pub fn summary(&self) -> Result<QueueSummary> {
        let mut summary = QueueSummary::default();
        let mut last_failure: Option<(DateTime<Utc>, String)> = None;
        for item in self.store.all::<SyncQueueItem>()? {
            match item.status {
                SyncStatus::Pending => summary.pending += 1,
                SyncStatus::Syncing => summary.syncing += 1,
                SyncStatus::Failed => summary.failed += 1,
                SyncStatus::Synced => {}
            }
            if let (Some(at), Some(err)) = (item.last_attempt_at, item.last_error) {
                if last_failure.as_ref().map_or(true, |(prev, _)| at > *prev) {
                    last_failure = Some((at, err));
                }
            }
        }
        summary.last_error = last_failure.map(|(_, err)| err);
        Ok(summary)
    }

    fn by_status(&self, status: SyncStatus) -> Result<Vec<SyncQueueItem>> {
        let mut items: Vec<SyncQueueItem> = self.store.query("status", status.as_str())?;
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(items)
    }

    fn pending_for(&self, entity_type: EntityType, entity_id: &str) -> Result<Option<SyncQueueItem>> {
        let mut matches: Vec<SyncQueueItem> = self
            .store
            .query::<SyncQueueItem>("entityType+entityId", entity_key(entity_type, entity_id))?
            .into_iter()
            .filter(|item| item.status == SyncStatus::Pending)
            .collect();
        matches.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(matches.into_iter().next())
    }

    fn requeue(&self, mut item: SyncQueueItem, reset_retries: bool) -> Result<()> {
        if let Some(mut pending) = self.pending_for(item.entity_type, &item.entity_id)? {
            // The pending entry is newer and already carries the latest data
            pending.action = coalesce(item.action, pending.action);
            if pending.action == SyncAction::Delete {
                pending.data = None;
            }
            self.store.put(&pending)?;
            self.store.delete::<SyncQueueItem>(&item.id)?;
            return Ok(());
        }

        item.status = SyncStatus::Pending;
        if reset_retries {
            item.retry_count = 0;
        }
        self.store.put(&item)
    }

    /// Strictly increasing timestamps keep FIFO order stable even when two
    /// entries are added within the clock's resolution.
    ///
    /// The newest timestamp is remembered on the store, so only the first
    /// enqueue after opening reads the queue.
    fn next_timestamp(&self) -> Result<DateTime<Utc>> {
        let state = self.store.sync_state();
        let latest = match state.last_queued_at() {
            Some(latest) => Some(latest),
            None => self
                .store
                .query_range::<SyncQueueItem>("createdAt", ..)?
                .pop()
                .map(|item| item.created_at),
        };
        let now = Utc::now();
        let next = match latest {
            Some(latest) if latest >= now => latest + Duration::nanoseconds(1),
            _ => now,
        };
        state.set_last_queued_at(next);
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PropertyType, Template};
    use crate::store::mem_backend::MemBackend;

    fn make_store() -> LocalStore<MemBackend> {
        LocalStore::with_backend(MemBackend::new())
    }

    fn template_payload(template: &Template) -> Option<SyncPayload> {
        Some(SyncPayload::Template(template.clone()))
    }

    #[test]
    fn test_add_creates_pending_entry() {
        let store = make_store();
        let queue = SyncQueue::new(&store);
        let t = Template::new("Studio", PropertyType::Apartment);

        let id = queue
            .add(SyncAction::Create, EntityType::Template, &t.id, template_payload(&t))
            .unwrap();

        let item = queue.get(&id).unwrap().unwrap();
        assert_eq!(item.status, SyncStatus::Pending);
        assert_eq!(item.retry_count, 0);
        assert_eq!(item.action, SyncAction::Create);
        assert_eq!(queue.get_pending_count().unwrap(), 1);
    }

    #[test]
    fn test_create_then_update_stays_create_with_latest_data() {
        let store = make_store();
        let queue = SyncQueue::new(&store);
        let mut t = Template::new("Studio", PropertyType::Apartment);

        let first = queue
            .add(SyncAction::Create, EntityType::Template, &t.id, template_payload(&t))
            .unwrap();
        t.name = "Studio v2".to_string();
        let second = queue
            .add(SyncAction::Update, EntityType::Template, &t.id, template_payload(&t))
            .unwrap();

        assert_eq!(first, second);
        let pending = queue.get_pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].action, SyncAction::Create);
        match &pending[0].data {
            Some(SyncPayload::Template(data)) => assert_eq!(data.name, "Studio v2"),
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn test_create_then_delete_becomes_delete() {
        let store = make_store();
        let queue = SyncQueue::new(&store);
        let t = Template::new("Studio", PropertyType::Apartment);

        queue
            .add(SyncAction::Create, EntityType::Template, &t.id, template_payload(&t))
            .unwrap();
        queue
            .add(SyncAction::Delete, EntityType::Template, &t.id, None)
            .unwrap();

        let pending = queue.get_pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].action, SyncAction::Delete);
        assert!(pending[0].data.is_none());
    }

    #[test]
    fn test_many_updates_collapse_to_one_entry() {
        let store = make_store();
        let queue = SyncQueue::new(&store);
        let mut t = Template::new("Studio", PropertyType::Apartment);
        store.put(&t).unwrap();

        for n in 0..5 {
            t.name = format!("Studio {}", n);
            queue
                .add(SyncAction::Update, EntityType::Template, &t.id, template_payload(&t))
                .unwrap();
        }

        let pending = queue.get_pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].action, SyncAction::Update);
        match &pending[0].data {
            Some(SyncPayload::Template(data)) => assert_eq!(data.name, "Studio 4"),
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn test_unrelated_entities_do_not_coalesce() {
        let store = make_store();
        let queue = SyncQueue::new(&store);
        let a = Template::new("A", PropertyType::House);
        let b = Template::new("B", PropertyType::House);

        queue
            .add(SyncAction::Create, EntityType::Template, &a.id, template_payload(&a))
            .unwrap();
        queue
            .add(SyncAction::Create, EntityType::Template, &b.id, template_payload(&b))
            .unwrap();

        assert_eq!(queue.get_pending_count().unwrap(), 2);
    }

    #[test]
    fn test_same_id_different_entity_type_is_separate() {
        let store = make_store();
        let queue = SyncQueue::new(&store);

        queue
            .add(SyncAction::Delete, EntityType::Template, "shared", None)
            .unwrap();
        queue
            .add(SyncAction::Delete, EntityType::Photo, "shared", None)
            .unwrap();

        assert_eq!(queue.get_pending_count().unwrap(), 2);
    }

    #[test]
    fn test_payload_mismatch_is_rejected() {
        let store = make_store();
        let queue = SyncQueue::new(&store);
        let t = Template::new("Studio", PropertyType::Apartment);

        let wrong_type = queue.add(SyncAction::Create, EntityType::Photo, &t.id, template_payload(&t));
        assert!(matches!(wrong_type, Err(HomecheckError::PayloadMismatch { .. })));

        let wrong_id = queue.add(SyncAction::Create, EntityType::Template, "other", template_payload(&t));
        assert!(wrong_id.is_err());
        assert_eq!(queue.get_pending_count().unwrap(), 0);
    }

    #[test]
    fn test_pending_is_fifo_and_coalescing_moves_to_back() {
        let store = make_store();
        let queue = SyncQueue::new(&store);

        queue.add(SyncAction::Delete, EntityType::Photo, "a", None).unwrap();
        queue.add(SyncAction::Delete, EntityType::Photo, "b", None).unwrap();
        queue.add(SyncAction::Delete, EntityType::Photo, "c", None).unwrap();
        queue.add(SyncAction::Delete, EntityType::Photo, "a", None).unwrap();

        let order: Vec<String> = queue
            .get_pending()
            .unwrap()
            .into_iter()
            .map(|i| i.entity_id)
            .collect();
        assert_eq!(order, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_timestamps_increase_across_queue_handles() {
        let store = make_store();
        let mut stamps = Vec::new();
        for n in 0..50 {
            let id = SyncQueue::new(&store)
                .add(SyncAction::Delete, EntityType::Photo, &format!("p{}", n), None)
                .unwrap();
            stamps.push(SyncQueue::new(&store).get(&id).unwrap().unwrap().created_at);
        }
        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(store.sync_state().last_queued_at(), stamps.last().copied());
    }

    #[test]
    fn test_reopened_store_continues_after_stored_entries() {
        let store = make_store();
        let future = Utc::now() + Duration::hours(1);
        store
            .put(&SyncQueueItem {
                id: "from-last-session".into(),
                action: SyncAction::Delete,
                entity_type: EntityType::Photo,
                entity_id: "old".into(),
                data: None,
                created_at: future,
                status: SyncStatus::Pending,
                retry_count: 0,
                last_error: None,
                last_attempt_at: None,
            })
            .unwrap();

        let queue = SyncQueue::new(&store);
        queue.add(SyncAction::Delete, EntityType::Photo, "new", None).unwrap();

        let order: Vec<String> = queue
            .get_pending()
            .unwrap()
            .into_iter()
            .map(|i| i.entity_id)
            .collect();
        assert_eq!(order, vec!["old", "new"]);
    }

    #[test]
    fn test_update_status_with_error_counts_retry() {
        let store = make_store();
        let queue = SyncQueue::new(&store);
        let id = queue.add(SyncAction::Delete, EntityType::Photo, "p", None).unwrap();

        queue.mark_failed(&id, "timeout").unwrap();

        let item = queue.get(&id).unwrap().unwrap();
        assert_eq!(item.status, SyncStatus::Failed);
        assert_eq!(item.retry_count, 1);
        assert_eq!(item.last_error.as_deref(), Some("timeout"));
        assert!(item.last_attempt_at.is_some());
        assert!(!queue.update_status("missing", SyncStatus::Failed, None).unwrap());
    }

    #[test]
    fn test_mark_synced_removes_entry() {
        let store = make_store();
        let queue = SyncQueue::new(&store);
        let id = queue.add(SyncAction::Delete, EntityType::Photo, "p", None).unwrap();

        assert!(queue.mark_synced(&id).unwrap());
        assert!(queue.get(&id).unwrap().is_none());
        assert!(queue.all().unwrap().is_empty());
    }

    #[test]
    fn test_new_mutation_after_failure_gets_own_entry() {
        let store = make_store();
        let queue = SyncQueue::new(&store);
        let failed = queue.add(SyncAction::Delete, EntityType::Photo, "p", None).unwrap();
        queue.mark_failed(&failed, "offline").unwrap();

        let fresh = queue.add(SyncAction::Delete, EntityType::Photo, "p", None).unwrap();
        assert_ne!(failed, fresh);
        assert_eq!(queue.get_pending_count().unwrap(), 1);
    }

    #[test]
    fn test_retry_failed_resets_to_pending() {
        let store = make_store();
        let queue = SyncQueue::new(&store);
        let id = queue.add(SyncAction::Delete, EntityType::Photo, "p", None).unwrap();
        queue.mark_failed(&id, "offline").unwrap();
        queue.mark_failed(&id, "offline again").unwrap();

        assert_eq!(queue.retry_failed().unwrap(), 1);

        let item = queue.get(&id).unwrap().unwrap();
        assert_eq!(item.status, SyncStatus::Pending);
        assert_eq!(item.retry_count, 0);
        assert!(queue.get_failed().unwrap().is_empty());
    }

    #[test]
    fn test_retry_failed_folds_into_newer_pending_entry() {
        let store = make_store();
        let queue = SyncQueue::new(&store);
        let mut t = Template::new("Studio", PropertyType::Apartment);

        let failed = queue
            .add(SyncAction::Create, EntityType::Template, &t.id, template_payload(&t))
            .unwrap();
        queue.mark_failed(&failed, "offline").unwrap();

        t.name = "Studio v2".to_string();
        let fresh = queue
            .add(SyncAction::Update, EntityType::Template, &t.id, template_payload(&t))
            .unwrap();

        queue.retry_failed().unwrap();

        let pending = queue.get_pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, fresh);
        // The remote never saw the create, so the merged entry must still create
        assert_eq!(pending[0].action, SyncAction::Create);
        assert!(queue.get(&failed).unwrap().is_none());
    }

    #[test]
    fn test_reset_stale_syncing() {
        let store = make_store();
        let queue = SyncQueue::new(&store);
        let id = queue.add(SyncAction::Delete, EntityType::Photo, "p", None).unwrap();
        queue.update_status(&id, SyncStatus::Syncing, None).unwrap();

        assert_eq!(queue.get_pending_count().unwrap(), 0);
        assert_eq!(queue.reset_stale_syncing().unwrap(), 1);
        assert_eq!(queue.get_pending_count().unwrap(), 1);
    }

    #[test]
    fn test_clear_synced_and_clear_all() {
        let store = make_store();
        let queue = SyncQueue::new(&store);
        let a = queue.add(SyncAction::Delete, EntityType::Photo, "a", None).unwrap();
        queue.add(SyncAction::Delete, EntityType::Photo, "b", None).unwrap();
        queue.update_status(&a, SyncStatus::Synced, None).unwrap();

        assert_eq!(queue.clear_synced().unwrap(), 1);
        assert_eq!(queue.all().unwrap().len(), 1);

        queue.clear_all().unwrap();
        assert!(queue.all().unwrap().is_empty());
    }

    #[test]
    fn test_summary() {
        let store = make_store();
        let queue = SyncQueue::new(&store);
        let a = queue.add(SyncAction::Delete, EntityType::Photo, "a", None).unwrap();
        queue.add(SyncAction::Delete, EntityType::Photo, "b", None).unwrap();
        queue.mark_failed(&a, "server said no").unwrap();

        let summary = queue.summary().unwrap();
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.syncing, 0);
        assert_eq!(summary.last_error.as_deref(), Some("server said no"));
    }
}
