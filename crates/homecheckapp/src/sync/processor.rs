use serde::Serialize;

use super::queue::SyncQueue;
use super::remote::RemoteEffect;
use super::SyncStatus;
use crate::store::backend::StorageBackend;
use crate::store::LocalStore;

/// Outcome of one drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub success: usize,
    pub failed: usize,
    /// Set when the drain did not run because another one was in flight.
    pub skipped: bool,
}

/// Drains the sync queue against a remote, one entry at a time, oldest first.
///
/// Drains are mutually exclusive per store: the lock lives on the store's
/// [`SyncState`](super::SyncState), so separate processors over the same store
/// never drain at once.
pub struct SyncProcessor<'a, B: StorageBackend, R: RemoteEffect> {
    store: &'a LocalStore<B>,
    queue: SyncQueue<'a, B>,
    remote: R,
}

impl<'a, B: StorageBackend, R: RemoteEffect> SyncProcessor<'a, B, R> {
    pub fn new(store: &'a LocalStore<B>, remote: R) -> Self {
        Self {
            store,
            queue: SyncQueue::new(store),
            remote,
        }
    }

    pub fn is_running(&self) -> bool {
        self.store.sync_state().is_draining()
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Push every currently pending entry to the remote.
    ///
    /// Never fails: per-entry remote or store errors turn the entry `failed`
    /// and the drain moves on. Entries added while the drain runs are left for
    /// the next call. Dropping the returned future between entries is safe;
    /// anything left in `syncing` is reset at the start of the next drain.
    pub async fn process_queue(&self) -> SyncReport {
        let mut report = SyncReport::default();

        let Some(_lock) = self.store.sync_state().try_lock_drain() else {
            tracing::debug!("sync drain already in flight, skipping");
            report.skipped = true;
            return report;
        };

        if let Err(e) = self.queue.reset_stale_syncing() {
            tracing::warn!(error = %e, "could not reset stale syncing entries");
        }

        let batch = match self.queue.get_pending() {
            Ok(batch) => batch,
            Err(e) => {
                tracing::error!(error = %e, "could not read pending sync entries");
                return report;
            }
        };
        if batch.is_empty() {
            return report;
        }
        tracing::info!(count = batch.len(), "draining sync queue");

        for snapshot in batch {
            // Re-read: the entry may have been coalesced or removed since the
            // batch was taken.
            let item = match self.queue.get(&snapshot.id) {
                Ok(Some(item)) if item.status == SyncStatus::Pending => item,
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!(id = %snapshot.id, error = %e, "could not re-read sync entry");
                    report.failed += 1;
                    continue;
                }
            };

            if let Err(e) = self.queue.update_status(&item.id, SyncStatus::Syncing, None) {
                self.record_failure(&item.id, &e.to_string());
                report.failed += 1;
                continue;
            }

            let outcome = self
                .remote
                .apply(
                    item.action,
                    item.entity_type,
                    &item.entity_id,
                    item.data.as_ref(),
                )
                .await;

            match outcome {
                Ok(()) => match self.queue.mark_synced(&item.id) {
                    Ok(_) => report.success += 1,
                    Err(e) => {
                        self.record_failure(&item.id, &e.to_string());
                        report.failed += 1;
                    }
                },
                Err(err) => {
                    self.record_failure(&item.id, &err.to_string());
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            success = report.success,
            failed = report.failed,
            "sync drain finished"
        );
        report
    }

    fn record_failure(&self, id: &str, message: &str) {
        tracing::warn!(id, error = message, "sync entry failed");
        if let Err(e) = self.queue.mark_failed(id, message) {
            tracing::error!(id, error = %e, "could not mark sync entry failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mem_backend::MemBackend;
    use crate::sync::remote::RemoteError;
    use crate::sync::{EntityType, SyncAction, SyncPayload};
    use async_trait::async_trait;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeRemote {
        calls: RefCell<Vec<(SyncAction, String)>>,
        failing: HashSet<String>,
        latency: Duration,
    }

    impl FakeRemote {
        fn failing(ids: &[&str]) -> Self {
            Self {
                failing: ids.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }
        }

        fn slow(latency: Duration) -> Self {
            Self {
                latency,
                ..Default::default()
            }
        }

        fn called_ids(&self) -> Vec<String> {
            self.calls.borrow().iter().map(|(_, id)| id.clone()).collect()
        }
    }

    #[async_trait(?Send)]
    impl RemoteEffect for FakeRemote {
        async fn apply(
            &self,
            action: SyncAction,
            _entity_type: EntityType,
            entity_id: &str,
            _data: Option<&SyncPayload>,
        ) -> Result<(), RemoteError> {
            self.calls.borrow_mut().push((action, entity_id.to_string()));
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            if self.failing.contains(entity_id) {
                return Err(RemoteError::new(format!("rejected {}", entity_id)));
            }
            Ok(())
        }
    }

    fn make_store() -> LocalStore<MemBackend> {
        LocalStore::with_backend(MemBackend::new())
    }

    fn enqueue(store: &LocalStore<MemBackend>, ids: &[&str]) {
        let queue = SyncQueue::new(store);
        for id in ids {
            queue
                .add(SyncAction::Delete, EntityType::Photo, id, None)
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_drain_empties_queue_in_fifo_order() {
        let store = make_store();
        enqueue(&store, &["a", "b", "c"]);

        let processor = SyncProcessor::new(&store, FakeRemote::default());
        let report = processor.process_queue().await;

        assert_eq!(report.success, 3);
        assert_eq!(report.failed, 0);
        assert!(!report.skipped);
        assert_eq!(processor.remote().called_ids(), vec!["a", "b", "c"]);
        assert!(SyncQueue::new(&store).all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_batch() {
        let store = make_store();
        enqueue(&store, &["a", "b", "c", "d"]);

        let processor = SyncProcessor::new(&store, FakeRemote::failing(&["b"]));
        let report = processor.process_queue().await;

        assert_eq!(report.success, 3);
        assert_eq!(report.failed, 1);
        assert_eq!(processor.remote().called_ids(), vec!["a", "b", "c", "d"]);

        let queue = SyncQueue::new(&store);
        let remaining = queue.all().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].entity_id, "b");
        assert_eq!(remaining[0].status, SyncStatus::Failed);
        assert_eq!(remaining[0].retry_count, 1);
        assert_eq!(remaining[0].last_error.as_deref(), Some("rejected b"));
    }

    #[tokio::test]
    async fn test_failed_entries_wait_for_explicit_retry() {
        let store = make_store();
        enqueue(&store, &["a"]);

        let failing = SyncProcessor::new(&store, FakeRemote::failing(&["a"]));
        assert_eq!(failing.process_queue().await.failed, 1);

        // A second drain does not pick up failed entries on its own
        let healthy = SyncProcessor::new(&store, FakeRemote::default());
        let report = healthy.process_queue().await;
        assert_eq!(report.success + report.failed, 0);

        SyncQueue::new(&store).retry_failed().unwrap();
        assert_eq!(healthy.process_queue().await.success, 1);
    }

    #[tokio::test]
    async fn test_empty_queue_reports_nothing() {
        let store = make_store();
        let processor = SyncProcessor::new(&store, FakeRemote::default());
        assert_eq!(processor.process_queue().await, SyncReport::default());
    }

    #[tokio::test]
    async fn test_concurrent_drain_is_skipped() {
        let store = make_store();
        enqueue(&store, &["a", "b"]);

        let processor = SyncProcessor::new(&store, FakeRemote::slow(Duration::from_millis(20)));
        let (first, second) = tokio::join!(processor.process_queue(), processor.process_queue());

        // Exactly one of the two ran
        assert!(first.skipped != second.skipped);
        assert_eq!(first.success + second.success, 2);
        assert_eq!(processor.remote().called_ids(), vec!["a", "b"]);
        assert!(!processor.is_running());
    }

    #[tokio::test]
    async fn test_processors_over_one_store_share_the_drain_lock() {
        let store = make_store();
        enqueue(&store, &["a", "b"]);

        let first = SyncProcessor::new(&store, FakeRemote::slow(Duration::from_millis(20)));
        let second = SyncProcessor::new(&store, FakeRemote::default());
        let start_second = async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            assert!(second.is_running());
            second.process_queue().await
        };
        let (ran, skipped) = tokio::join!(first.process_queue(), start_second);

        assert_eq!(ran.success, 2);
        assert!(skipped.skipped);
        assert!(second.remote().called_ids().is_empty());
        assert!(!first.is_running() && !second.is_running());
    }

    #[tokio::test]
    async fn test_entries_added_mid_drain_wait_for_next_drain() {
        let store = make_store();
        enqueue(&store, &["a"]);

        let processor = SyncProcessor::new(&store, FakeRemote::slow(Duration::from_millis(20)));
        let add_during_drain = async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            enqueue(&store, &["late"]);
        };
        let (report, _) = tokio::join!(processor.process_queue(), add_during_drain);

        assert_eq!(report.success, 1);
        let queue = SyncQueue::new(&store);
        let pending = queue.get_pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].entity_id, "late");

        assert_eq!(processor.process_queue().await.success, 1);
        assert_eq!(queue.get_pending_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_interrupted_drain_is_recovered() {
        let store = make_store();
        enqueue(&store, &["a", "b"]);

        let slow = SyncProcessor::new(&store, FakeRemote::slow(Duration::from_secs(5)));
        let interrupted =
            tokio::time::timeout(Duration::from_millis(10), slow.process_queue()).await;
        assert!(interrupted.is_err());
        assert!(!slow.is_running());

        let queue = SyncQueue::new(&store);
        let stuck = queue.all().unwrap();
        assert_eq!(stuck[0].status, SyncStatus::Syncing);
        assert_eq!(stuck[1].status, SyncStatus::Pending);

        let fresh = SyncProcessor::new(&store, FakeRemote::default());
        let report = fresh.process_queue().await;
        assert_eq!(report.success, 2);
        assert!(queue.all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_during_drain_does_not_propagate() {
        let store = make_store();
        enqueue(&store, &["a", "b"]);
        store.backend().set_simulate_write_error(true);

        let processor = SyncProcessor::new(&store, FakeRemote::default());
        let report = processor.process_queue().await;

        assert_eq!(report.success, 0);
        assert_eq!(report.failed, 2);
        // Nothing could be written, so the entries are still pending locally
        store.backend().set_simulate_write_error(false);
        assert_eq!(SyncQueue::new(&store).get_pending_count().unwrap(), 2);
    }
}
