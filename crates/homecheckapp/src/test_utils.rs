use std::path::PathBuf;
use tempfile::TempDir;

use crate::api::HomecheckApi;
use crate::config::HomecheckConfig;
use crate::store::fs_backend::FsBackend;
use crate::store::LocalStore;

/// A filesystem-backed store in a temp dir, removed when dropped.
pub struct TestEnv {
    // Keeps the directory alive for the duration of the test
    pub _temp_dir: TempDir,
    pub root: PathBuf,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        Self {
            _temp_dir: temp_dir,
            root,
        }
    }

    /// A fresh store handle over the same directory, as after a restart.
    pub fn store(&self) -> LocalStore<FsBackend> {
        LocalStore::with_backend(FsBackend::new(self.root.clone()))
    }

    pub fn api(&self) -> HomecheckApi<FsBackend> {
        HomecheckApi::new(self.store(), HomecheckConfig::default(), self.root.clone())
    }
}
