use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::repo::TemplateRepository;
use crate::store::backend::StorageBackend;
use crate::store::LocalStore;

/// List templates. With a query, only active templates matching it; with
/// `include_inactive`, soft-deleted templates are listed too.
pub fn list<B: StorageBackend>(
    store: &LocalStore<B>,
    query: Option<&str>,
    include_inactive: bool,
) -> Result<CmdResult> {
    let repo = TemplateRepository::new(store);
    let templates = match query {
        Some(q) => repo.search(q)?,
        None if include_inactive => repo.list_all()?,
        None => repo.list_active()?,
    };

    let mut result = CmdResult::default();
    if templates.is_empty() {
        result.add_message(CmdMessage::info("No templates found."));
    }
    Ok(result.with_templates(templates))
}

pub fn duplicate<B: StorageBackend>(
    store: &LocalStore<B>,
    id: &str,
    new_name: Option<String>,
) -> Result<CmdResult> {
    let repo = TemplateRepository::new(store);
    let mut result = CmdResult::default();
    match repo.duplicate(id, new_name)? {
        Some(copy_id) => {
            let copy = repo.get(&copy_id)?;
            result.add_message(CmdMessage::success("Template duplicated"));
            Ok(result.with_templates(copy.into_iter().collect()))
        }
        None => {
            result.add_message(CmdMessage::error(format!("No template with id {}", id)));
            Ok(result)
        }
    }
}

/// Soft-delete by default; `purge` removes the record for good.
pub fn delete<B: StorageBackend>(store: &LocalStore<B>, id: &str, purge: bool) -> Result<CmdResult> {
    let repo = TemplateRepository::new(store);
    let mut result = CmdResult::default();
    let found = if purge {
        repo.delete(id)?
    } else {
        repo.soft_delete(id)?.is_some()
    };
    if found {
        result.add_message(CmdMessage::success(if purge {
            "Template deleted"
        } else {
            "Template archived"
        }));
    } else {
        result.add_message(CmdMessage::error(format!("No template with id {}", id)));
    }
    Ok(result)
}
