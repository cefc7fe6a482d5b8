//! # Sync Queue Commands
//!
//! - [`show`]: queue summary and entries
//! - [`run`]: drain pending entries against a remote
//! - [`retry`]: put failed entries back in the queue
//! - [`clear`]: drop every queued entry

use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::store::backend::StorageBackend;
use crate::store::LocalStore;
use crate::sync::processor::SyncProcessor;
use crate::sync::queue::SyncQueue;
use crate::sync::remote::RemoteEffect;

pub fn show<B: StorageBackend>(store: &LocalStore<B>) -> Result<CmdResult> {
    let queue = SyncQueue::new(store);
    let summary = queue.summary()?;

    let mut result = CmdResult::default();
    if summary.pending + summary.syncing + summary.failed == 0 {
        result.add_message(CmdMessage::info("Everything is synced."));
    }
    result.sync_entries = queue.all()?;
    result.sync_summary = Some(summary);
    Ok(result)
}

pub async fn run<B, R>(processor: &SyncProcessor<'_, B, R>, store: &LocalStore<B>) -> Result<CmdResult>
where
    B: StorageBackend,
    R: RemoteEffect,
{
    let report = processor.process_queue().await;

    let mut result = CmdResult::default();
    if report.skipped {
        result.add_message(CmdMessage::warning("A sync is already running."));
    } else if report.success + report.failed == 0 {
        result.add_message(CmdMessage::info("Nothing to sync."));
    } else if report.failed == 0 {
        result.add_message(CmdMessage::success(format!("Synced {} changes", report.success)));
    } else {
        result.add_message(CmdMessage::warning(format!(
            "Synced {} changes, {} failed",
            report.success, report.failed
        )));
    }
    result.sync_report = Some(report);
    result.sync_summary = Some(SyncQueue::new(store).summary()?);
    Ok(result)
}

pub fn retry<B: StorageBackend>(store: &LocalStore<B>) -> Result<CmdResult> {
    let count = SyncQueue::new(store).retry_failed()?;
    let mut result = CmdResult::default();
    result.add_message(if count == 0 {
        CmdMessage::info("No failed changes to retry.")
    } else {
        CmdMessage::success(format!("Requeued {} failed changes", count))
    });
    Ok(result)
}

pub fn clear<B: StorageBackend>(store: &LocalStore<B>) -> Result<CmdResult> {
    let queue = SyncQueue::new(store);
    let count = queue.all()?.len();
    queue.clear_all()?;
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Dropped {} queued changes",
        count
    )));
    Ok(result)
}
