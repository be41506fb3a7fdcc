use anyhow::anyhow;
use chrono::NaiveDate;

use crate::task::{Period, StoredTask, TaskDraft, TodoType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionMode {
    Complete,
    CompleteFull,
}

impl CompletionMode {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "complete" => Ok(CompletionMode::Complete),
            "complete_full" | "full" => Ok(CompletionMode::CompleteFull),
            other => Err(anyhow!(
                "unknown completion mode: {other} (expected complete/complete_full)"
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompletionEvent {
    pub date: NaiveDate,
    pub period: Period,
    pub mode: CompletionMode,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The to-do stays in place, reusable or tracking partial progress.
    Keep,
    /// The to-do is consumed by the completion.
    Delete,
}

/// The engine's whole output: a draft log entry to insert, and what the
/// caller must do with the source to-do. The engine itself writes nothing.
#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    pub log_entry: TaskDraft,
    pub disposition: Disposition,
}

/// Decides the outcome of marking a to-do done.
///
/// | type     | mode          | label        | to-do      |
/// |----------|---------------|--------------|------------|
/// | one_time | complete      | `[Complete]` | deleted    |
/// | always   | complete      | `[Complete]` | kept       |
/// | progress | complete      | `[Update]`   | kept       |
/// | progress | complete_full | `[Complete]` | deleted    |
///
/// The caller must insert the log entry first and only delete the to-do
/// once the insert has succeeded; a failed delete leaves valid history
/// behind, never the other way around.
pub fn complete(task: &StoredTask, event: &CompletionEvent) -> anyhow::Result<CompletionOutcome> {
    let description = task.description.trim();
    if description.is_empty() {
        return Err(anyhow!("cannot complete a to-do without a description"));
    }
    if event.mode == CompletionMode::CompleteFull && task.to_do_type != TodoType::Progress {
        return Err(anyhow!(
            "complete_full is only valid for progress to-dos, not {}",
            task.to_do_type.as_str()
        ));
    }

    let marker = match (task.to_do_type, event.mode) {
        (TodoType::Progress, CompletionMode::Complete) => "Update",
        _ => "Complete",
    };

    let mut label = format!("[{marker}] {description}");
    if let Some(note) = event.note.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        label.push_str(&format!(" [{note}]"));
    }

    let disposition = match (task.to_do_type, event.mode) {
        (TodoType::OneTime, CompletionMode::Complete)
        | (TodoType::Progress, CompletionMode::CompleteFull) => Disposition::Delete,
        _ => Disposition::Keep,
    };

    Ok(CompletionOutcome {
        log_entry: TaskDraft {
            task: label,
            task_period: event.period,
            task_tag: task.task_tag,
            date: event.date,
        },
        disposition,
    })
}
