//! # Command Layer
//!
//! Each command lives in its own submodule as plain functions over a
//! [`LocalStore`](crate::store::LocalStore). Commands return a structured
//! [`CmdResult`]; they never print, prompt or pick exit codes. That is the
//! client's job.
//!
//! ## Command Modules
//!
//! - [`init`]: seed defaults into an empty store
//! - [`templates`]: list and search templates
//! - [`inspections`]: list, start and complete inspections
//! - [`export`]: write the whole store as one JSON document
//! - [`import`]: replace templates, inspections and photos from an export
//! - [`status`]: inspect, drain, retry and clear the sync queue
//!
//! Command tests run over `MemBackend`; the filesystem is exercised by the
//! integration tests.

use serde::Serialize;
use std::path::PathBuf;

use crate::model::{Inspection, Template};
use crate::sync::processor::SyncReport;
use crate::sync::queue::QueueSummary;
use crate::sync::SyncQueueItem;

pub mod export;
pub mod import;
pub mod init;
pub mod inspections;
pub mod status;
pub mod templates;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct CmdResult {
    pub templates: Vec<Template>,
    pub inspections: Vec<Inspection>,
    pub sync_entries: Vec<SyncQueueItem>,
    pub sync_summary: Option<QueueSummary>,
    pub sync_report: Option<SyncReport>,
    pub paths: Vec<PathBuf>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_templates(mut self, templates: Vec<Template>) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_inspections(mut self, inspections: Vec<Inspection>) -> Self {
        self.inspections = inspections;
        self
    }

    pub fn with_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.paths = paths;
        self
    }

    /// Whether any message was reported at error level.
    pub fn has_errors(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.level == MessageLevel::Error)
    }
}
