//! # Rendering
//!
//! Turns a [`CmdResult`] into terminal text. Every function returns a
//! `String` so tests can compare output without capturing stdout.
//!
//! Sections appear in a fixed order: templates, inspections, sync summary,
//! queue entries, paths, then messages. Empty sections print nothing.

use chrono::{DateTime, Utc};
use homecheckapp::commands::{CmdMessage, CmdResult, MessageLevel};
use homecheckapp::model::{Inspection, InspectionStatus, Template};
use homecheckapp::sync::queue::QueueSummary;
use homecheckapp::sync::{SyncQueueItem, SyncStatus};

use super::styles;

const NAME_WIDTH: usize = 28;
const ADDRESS_WIDTH: usize = 32;

pub const STATUS_DRAFT: &str = "○";
pub const STATUS_IN_PROGRESS: &str = "◐";
pub const STATUS_COMPLETED: &str = "●";

pub fn render_result(result: &CmdResult) -> String {
    let mut out = String::new();
    for template in &result.templates {
        out.push_str(&template_line(template));
    }
    for inspection in &result.inspections {
        out.push_str(&inspection_line(inspection));
    }
    if let Some(summary) = &result.sync_summary {
        out.push_str(&summary_line(summary));
    }
    for entry in &result.sync_entries {
        out.push_str(&entry_line(entry));
    }
    for path in &result.paths {
        out.push_str(&format!("{}\n", styles::muted().apply_to(path.display())));
    }
    out.push_str(&render_messages(&result.messages));
    out
}

pub fn render_json(result: &CmdResult) -> serde_json::Result<String> {
    let mut out = serde_json::to_string_pretty(result)?;
    out.push('\n');
    Ok(out)
}

pub fn render_messages(messages: &[CmdMessage]) -> String {
    messages
        .iter()
        .map(|message| {
            let style = match message.level {
                MessageLevel::Info => styles::info(),
                MessageLevel::Success => styles::success(),
                MessageLevel::Warning => styles::warning(),
                MessageLevel::Error => styles::error(),
            };
            format!("{}\n", style.apply_to(&message.content))
        })
        .collect()
}

fn template_line(template: &Template) -> String {
    let archived = if template.is_active { "" } else { " (archived)" };
    format!(
        "{}  {:<11} {:>2} sections {:>3} items  {}{}\n",
        styles::title().apply_to(pad(&template.name, NAME_WIDTH)),
        template.property_type.as_str(),
        template.sections.len(),
        template.item_count(),
        styles::id().apply_to(&template.id),
        styles::muted().apply_to(archived),
    )
}

fn inspection_line(inspection: &Inspection) -> String {
    let icon = match inspection.status {
        InspectionStatus::Draft => STATUS_DRAFT,
        InspectionStatus::InProgress => STATUS_IN_PROGRESS,
        InspectionStatus::Completed => STATUS_COMPLETED,
    };
    let address = match &inspection.unit {
        Some(unit) => format!("{}, {}", inspection.address, unit),
        None => inspection.address.clone(),
    };
    let stats = inspection.stats();
    format!(
        "{} {}  {:>3}/{:<3} {}  {}\n",
        icon,
        styles::title().apply_to(pad(&address, ADDRESS_WIDTH)),
        stats.completed(),
        stats.total,
        styles::muted().apply_to(format_time_ago(inspection.updated_at)),
        styles::id().apply_to(&inspection.id),
    )
}

fn summary_line(summary: &QueueSummary) -> String {
    let mut line = format!(
        "{} pending, {} syncing, {} failed\n",
        summary.pending, summary.syncing, summary.failed
    );
    if let Some(error) = &summary.last_error {
        line.push_str(&format!(
            "{} {}\n",
            styles::muted().apply_to("last error:"),
            styles::error().apply_to(error)
        ));
    }
    line
}

fn entry_line(entry: &SyncQueueItem) -> String {
    let status = match entry.status {
        SyncStatus::Failed => styles::error().apply_to(entry.status.as_str()),
        _ => styles::muted().apply_to(entry.status.as_str()),
    };
    let retries = if entry.retry_count > 0 {
        format!(" (retried {})", entry.retry_count)
    } else {
        String::new()
    };
    format!(
        "  {:<7} {:<6} {:<10} {}{}\n",
        status,
        entry.action.as_str(),
        entry.entity_type.as_str(),
        styles::id().apply_to(&entry.entity_id),
        retries
    )
}

fn pad(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count > width {
        let mut truncated: String = text.chars().take(width.saturating_sub(1)).collect();
        truncated.push('…');
        truncated
    } else {
        format!("{}{}", text, " ".repeat(width - count))
    }
}

fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);
    timeago::Formatter::new().convert(duration.to_std().unwrap_or_default())
}
