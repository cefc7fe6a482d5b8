use crate::commands::{CmdMessage, CmdResult};
use crate::error::{HomecheckError, Result};
use crate::model::{InspectionStatus, NewInspection};
use crate::repo::InspectionRepository;
use crate::store::backend::StorageBackend;
use crate::store::LocalStore;

pub fn list<B: StorageBackend>(
    store: &LocalStore<B>,
    status: Option<InspectionStatus>,
    limit: Option<usize>,
) -> Result<CmdResult> {
    let repo = InspectionRepository::new(store);
    let mut inspections = match status {
        Some(status) => repo.by_status(status)?,
        None => repo.list()?,
    };
    if let Some(limit) = limit {
        inspections.truncate(limit);
    }

    let mut result = CmdResult::default();
    if inspections.is_empty() {
        result.add_message(CmdMessage::info("No inspections found."));
    }
    Ok(result.with_inspections(inspections))
}

pub fn start<B: StorageBackend>(
    store: &LocalStore<B>,
    template_id: &str,
    details: NewInspection,
) -> Result<CmdResult> {
    let repo = InspectionRepository::new(store);
    let mut result = CmdResult::default();
    match repo.create_from_template(template_id, details)? {
        Some(inspection) => {
            result.add_message(CmdMessage::success(format!(
                "Started inspection of {}",
                inspection.address
            )));
            Ok(result.with_inspections(vec![inspection]))
        }
        None => {
            result.add_message(CmdMessage::error(format!(
                "No template with id {}",
                template_id
            )));
            Ok(result)
        }
    }
}

/// Complete an inspection. An inspection with pending items is reported as
/// a warning rather than an error of the command itself.
pub fn complete<B: StorageBackend>(store: &LocalStore<B>, id: &str) -> Result<CmdResult> {
    let repo = InspectionRepository::new(store);
    let mut result = CmdResult::default();
    match repo.complete(id) {
        Ok(Some(inspection)) => {
            result.add_message(CmdMessage::success("Inspection completed"));
            Ok(result.with_inspections(vec![inspection]))
        }
        Ok(None) => {
            result.add_message(CmdMessage::error(format!("No inspection with id {}", id)));
            Ok(result)
        }
        Err(HomecheckError::NotCompletable { pending, total, .. }) => {
            result.add_message(CmdMessage::warning(format!(
                "{} of {} items are still pending",
                pending, total
            )));
            Ok(result)
        }
        Err(e) => Err(e),
    }
}

pub fn reopen<B: StorageBackend>(store: &LocalStore<B>, id: &str) -> Result<CmdResult> {
    let repo = InspectionRepository::new(store);
    let mut result = CmdResult::default();
    match repo.reopen(id)? {
        Some(inspection) => Ok(result.with_inspections(vec![inspection])),
        None => {
            result.add_message(CmdMessage::error(format!("No inspection with id {}", id)));
            Ok(result)
        }
    }
}

pub fn delete<B: StorageBackend>(store: &LocalStore<B>, id: &str) -> Result<CmdResult> {
    let repo = InspectionRepository::new(store);
    let mut result = CmdResult::default();
    if repo.delete(id)? {
        result.add_message(CmdMessage::success("Inspection deleted"));
    } else {
        result.add_message(CmdMessage::error(format!("No inspection with id {}", id)));
    }
    Ok(result)
}
