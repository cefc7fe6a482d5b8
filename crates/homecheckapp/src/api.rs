//! # API Facade
//!
//! [`HomecheckApi`] is the single entry point for clients (the CLI, a desktop
//! shell, a test harness). It owns the [`LocalStore`] and the loaded
//! [`HomecheckConfig`] and dispatches to the command layer; it holds no
//! business logic of its own.
//!
//! ## Generic Over the Backend
//!
//! - Production: `HomecheckApi<FsBackend>`, built with [`HomecheckApi::open`].
//! - Testing: `HomecheckApi<MemBackend>`, built with [`HomecheckApi::new`].
//!
//! ## Sync
//!
//! Draining needs a remote, so [`HomecheckApi::sync_run`] takes one per call.
//! The drain lock lives on the store, so overlapping `sync_run` calls (a timer
//! and a reconnect handler, say) never drain at once: the later one reports
//! that a sync is already running.

use chrono::Utc;
use std::path::{Path, PathBuf};

use crate::commands::{self, CmdResult};
use crate::config::{resolve_data_dir, HomecheckConfig};
use crate::error::Result;
use crate::media::PhotoOptions;
use crate::model::{AppSettings, InspectionStatus, NewInspection, SETTINGS_ID};
use crate::repo::{InspectionRepository, PhotoRepository, TemplateRepository};
use crate::store::backend::StorageBackend;
use crate::store::fs_backend::FsBackend;
use crate::store::LocalStore;
use crate::sync::processor::SyncProcessor;
use crate::sync::queue::SyncQueue;
use crate::sync::remote::RemoteEffect;

pub struct HomecheckApi<B: StorageBackend> {
    store: LocalStore<B>,
    config: HomecheckConfig,
    data_dir: PathBuf,
}

impl HomecheckApi<FsBackend> {
    /// Open the filesystem store in `data_dir` (or the resolved default) with
    /// its layered config.
    pub fn open(data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = resolve_data_dir(data_dir)?;
        let config = HomecheckConfig::load(&data_dir)?;
        let store = LocalStore::with_backend(FsBackend::new(data_dir.clone()));
        tracing::debug!(data_dir = %data_dir.display(), "opened store");
        Ok(Self::new(store, config, data_dir))
    }
}

impl<B: StorageBackend> HomecheckApi<B> {
    pub fn new(store: LocalStore<B>, config: HomecheckConfig, data_dir: PathBuf) -> Self {
        Self {
            store,
            config,
            data_dir,
        }
    }

    pub fn store(&self) -> &LocalStore<B> {
        &self.store
    }

    pub fn config(&self) -> &HomecheckConfig {
        &self.config
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn templates(&self) -> TemplateRepository<'_, B> {
        TemplateRepository::new(&self.store)
    }

    pub fn inspections(&self) -> InspectionRepository<'_, B> {
        InspectionRepository::new(&self.store)
    }

    pub fn photos(&self) -> PhotoRepository<'_, B> {
        PhotoRepository::new(&self.store)
    }

    pub fn photo_options(&self) -> PhotoOptions {
        PhotoOptions::from(&self.config)
    }

    pub fn init(&self) -> Result<CmdResult> {
        commands::init::run(&self.store, &self.data_dir, self.config.seed_defaults)
    }

    // --- Templates ---

    pub fn list_templates(&self, query: Option<&str>, include_inactive: bool) -> Result<CmdResult> {
        commands::templates::list(&self.store, query, include_inactive)
    }

    pub fn duplicate_template(&self, id: &str, new_name: Option<String>) -> Result<CmdResult> {
        commands::templates::duplicate(&self.store, id, new_name)
    }

    pub fn delete_template(&self, id: &str, purge: bool) -> Result<CmdResult> {
        commands::templates::delete(&self.store, id, purge)
    }

    // --- Inspections ---

    pub fn list_inspections(
        &self,
        status: Option<InspectionStatus>,
        limit: Option<usize>,
    ) -> Result<CmdResult> {
        commands::inspections::list(&self.store, status, limit)
    }

    pub fn start_inspection(&self, template_id: &str, details: NewInspection) -> Result<CmdResult> {
        commands::inspections::start(&self.store, template_id, details)
    }

    pub fn complete_inspection(&self, id: &str) -> Result<CmdResult> {
        commands::inspections::complete(&self.store, id)
    }

    pub fn reopen_inspection(&self, id: &str) -> Result<CmdResult> {
        commands::inspections::reopen(&self.store, id)
    }

    pub fn delete_inspection(&self, id: &str) -> Result<CmdResult> {
        commands::inspections::delete(&self.store, id)
    }

    // --- Backup ---

    pub fn export(&self, path: Option<PathBuf>) -> Result<CmdResult> {
        commands::export::run(&self.store, path)
    }

    pub fn import(&self, path: &Path) -> Result<CmdResult> {
        commands::import::run(&self.store, path)
    }

    // --- Settings ---

    /// Stored settings, or defaults when none were saved yet.
    pub fn settings(&self) -> Result<AppSettings> {
        Ok(self
            .store
            .get::<AppSettings>(SETTINGS_ID)?
            .unwrap_or_default())
    }

    /// Settings are device-local and are not synced.
    pub fn save_settings(&self, mut settings: AppSettings) -> Result<AppSettings> {
        settings.id = SETTINGS_ID.to_string();
        settings.updated_at = Utc::now();
        self.store.put(&settings)?;
        Ok(settings)
    }

    // --- Sync ---

    pub fn processor<R: RemoteEffect>(&self, remote: R) -> SyncProcessor<'_, B, R> {
        SyncProcessor::new(&self.store, remote)
    }

    pub fn pending_changes(&self) -> Result<usize> {
        SyncQueue::new(&self.store).get_pending_count()
    }

    pub fn sync_status(&self) -> Result<CmdResult> {
        commands::status::show(&self.store)
    }

    pub async fn sync_run<R: RemoteEffect>(&self, remote: R) -> Result<CmdResult> {
        let processor = self.processor(remote);
        commands::status::run(&processor, &self.store).await
    }

    pub fn sync_retry(&self) -> Result<CmdResult> {
        commands::status::retry(&self.store)
    }

    pub fn sync_clear(&self) -> Result<CmdResult> {
        commands::status::clear(&self.store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mem_backend::MemBackend;
    use crate::sync::remote::StubRemote;
    use crate::test_utils::TestEnv;

    fn make_api() -> HomecheckApi<MemBackend> {
        HomecheckApi::new(
            LocalStore::with_backend(MemBackend::new()),
            HomecheckConfig::default(),
            PathBuf::from("/data"),
        )
    }

    #[test]
    fn test_init_dispatches_with_config() {
        let api = make_api();
        api.init().unwrap();
        assert_eq!(api.list_templates(None, false).unwrap().templates.len(), 2);

        let quiet = HomecheckApi::new(
            LocalStore::with_backend(MemBackend::new()),
            HomecheckConfig {
                seed_defaults: false,
                ..Default::default()
            },
            PathBuf::from("/data"),
        );
        quiet.init().unwrap();
        assert!(quiet.list_templates(None, false).unwrap().templates.is_empty());
    }

    #[test]
    fn test_settings_default_then_saved() {
        let api = make_api();
        let mut settings = api.settings().unwrap();
        assert!(settings.include_photos_in_report);

        settings.inspector_name = Some("Ana".into());
        settings.id = "ignored".into();
        api.save_settings(settings).unwrap();

        let stored = api.settings().unwrap();
        assert_eq!(stored.id, SETTINGS_ID);
        assert_eq!(stored.inspector_name.as_deref(), Some("Ana"));
        assert_eq!(api.pending_changes().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sync_run_dispatches() {
        let api = make_api();
        let template_id = {
            api.init().unwrap();
            api.list_templates(None, false).unwrap().templates[0].id.clone()
        };
        api.start_inspection(&template_id, NewInspection::default())
            .unwrap();
        assert_eq!(api.pending_changes().unwrap(), 1);

        let result = api.sync_run(StubRemote::new()).await.unwrap();

        assert_eq!(result.sync_report.unwrap().success, 1);
        assert_eq!(api.pending_changes().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_overlapping_sync_runs_drain_once() {
        let api = make_api();
        api.init().unwrap();
        let template_id = api.list_templates(None, false).unwrap().templates[0].id.clone();
        api.start_inspection(&template_id, NewInspection::default())
            .unwrap();

        let slow = StubRemote::with_latency(std::time::Duration::from_millis(20));
        let (first, second) = tokio::join!(api.sync_run(slow), api.sync_run(StubRemote::new()));

        let reports = [
            first.unwrap().sync_report.unwrap(),
            second.unwrap().sync_report.unwrap(),
        ];
        assert_eq!(reports.iter().filter(|r| r.skipped).count(), 1);
        assert_eq!(reports.iter().map(|r| r.success).sum::<usize>(), 1);
        assert_eq!(api.pending_changes().unwrap(), 0);
    }

    #[test]
    fn test_fs_store_survives_restart() {
        let env = TestEnv::new();
        env.api().init().unwrap();
        let settings = AppSettings {
            company_name: Some("Acme".into()),
            ..Default::default()
        };
        env.api().save_settings(settings).unwrap();

        let reopened = env.api();
        assert_eq!(reopened.list_templates(None, false).unwrap().templates.len(), 2);
        assert_eq!(
            reopened.settings().unwrap().company_name.as_deref(),
            Some("Acme")
        );
    }

    #[test]
    fn test_photo_options_follow_config() {
        let api = make_api();
        assert_eq!(api.photo_options(), PhotoOptions::default());
    }
}
