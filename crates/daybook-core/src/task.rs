use anyhow::anyhow;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::datastore::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Morning,
    Day,
    Night,
}

impl Period {
    pub const ALL: [Period; 3] = [Period::Morning, Period::Day, Period::Night];

    pub fn as_str(self) -> &'static str {
        match self {
            Period::Morning => "morning",
            Period::Day => "day",
            Period::Night => "night",
        }
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "morning" => Ok(Period::Morning),
            "day" => Ok(Period::Day),
            "night" => Ok(Period::Night),
            other => Err(anyhow!("unknown period: {other} (expected morning/day/night)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoType {
    OneTime,
    Always,
    Progress,
}

impl TodoType {
    pub const ALL: [TodoType; 3] = [TodoType::OneTime, TodoType::Always, TodoType::Progress];

    pub fn as_str(self) -> &'static str {
        match self {
            TodoType::OneTime => "one_time",
            TodoType::Always => "always",
            TodoType::Progress => "progress",
        }
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "one_time" | "one-time" | "once" => Ok(TodoType::OneTime),
            "always" => Ok(TodoType::Always),
            "progress" => Ok(TodoType::Progress),
            other => Err(anyhow!(
                "unknown to-do type: {other} (expected one_time/always/progress)"
            )),
        }
    }
}

/// A log entry: a record of work done on a given date and period, created
/// either directly by the user or by completing a stored to-do.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,

    pub task: String,

    #[serde(default)]
    pub task_tag: Option<Uuid>,

    pub task_period: Period,

    pub date: NaiveDate,

    pub user_id: Uuid,

    pub created_at: DateTime<Utc>,
}

impl Record for Task {
    const TABLE: &'static str = "task";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Uuid {
        self.user_id
    }
}

#[derive(Debug, Clone)]
pub struct TaskDraft {
    pub task: String,
    pub task_period: Period,
    pub task_tag: Option<Uuid>,
    pub date: NaiveDate,
}

impl TaskDraft {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            task: String::new(),
            task_period: Period::Morning,
            task_tag: None,
            date,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.task.trim().is_empty() {
            return Err(anyhow!("task body must not be empty"));
        }
        Ok(())
    }

    pub fn build(&self, user_id: Uuid, now: DateTime<Utc>) -> anyhow::Result<Task> {
        self.validate()?;
        Ok(Task {
            id: Uuid::new_v4(),
            task: self.task.trim().to_string(),
            task_tag: self.task_tag,
            task_period: self.task_period,
            date: self.date,
            user_id,
            created_at: now,
        })
    }

    pub fn apply_to(&self, task: &mut Task) -> anyhow::Result<()> {
        self.validate()?;
        task.task = self.task.trim().to_string();
        task.task_tag = self.task_tag;
        task.task_period = self.task_period;
        task.date = self.date;
        Ok(())
    }
}

/// A to-do item whose declared type governs what happens when it is
/// marked done (see the lifecycle module).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTask {
    pub id: Uuid,

    pub to_do_type: TodoType,

    #[serde(default)]
    pub parent: Option<Uuid>,

    pub description: String,

    #[serde(default)]
    pub note: Option<String>,

    #[serde(default)]
    pub task_tag: Option<Uuid>,

    pub archived: bool,

    pub user_id: Uuid,

    pub created_at: DateTime<Utc>,
}

impl Record for StoredTask {
    const TABLE: &'static str = "to_do_task";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Uuid {
        self.user_id
    }
}

#[derive(Debug, Clone)]
pub struct StoredTaskDraft {
    pub description: String,
    pub note: Option<String>,
    pub to_do_type: TodoType,
    pub task_tag: Option<Uuid>,
}

impl StoredTaskDraft {
    pub fn new() -> Self {
        Self {
            description: String::new(),
            note: None,
            to_do_type: TodoType::OneTime,
            task_tag: None,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.description.trim().is_empty() {
            return Err(anyhow!("to-do description must not be empty"));
        }
        Ok(())
    }

    pub fn build(&self, user_id: Uuid, now: DateTime<Utc>) -> anyhow::Result<StoredTask> {
        self.validate()?;
        Ok(StoredTask {
            id: Uuid::new_v4(),
            to_do_type: self.to_do_type,
            parent: None,
            description: self.description.trim().to_string(),
            note: normalize_optional(self.note.as_deref()),
            task_tag: self.task_tag,
            archived: false,
            user_id,
            created_at: now,
        })
    }

    pub fn apply_to(&self, task: &mut StoredTask) -> anyhow::Result<()> {
        self.validate()?;
        task.description = self.description.trim().to_string();
        task.note = normalize_optional(self.note.as_deref());
        task.to_do_type = self.to_do_type;
        task.task_tag = self.task_tag;
        Ok(())
    }
}

impl Default for StoredTaskDraft {
    fn default() -> Self {
        Self::new()
    }
}

/// A named, colored label. Tasks hold a weak reference: deleting a tag
/// leaves referencing tasks in place and they render without a tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Record for Tag {
    const TABLE: &'static str = "task_tag";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Uuid {
        self.user_id
    }
}

#[derive(Debug, Clone)]
pub struct TagDraft {
    pub name: String,
    pub color: String,
}

impl TagDraft {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.name.trim().is_empty() {
            return Err(anyhow!("tag name must not be empty"));
        }
        Ok(())
    }

    pub fn build(&self, user_id: Uuid, now: DateTime<Utc>) -> anyhow::Result<Tag> {
        self.validate()?;
        Ok(Tag {
            id: Uuid::new_v4(),
            name: self.name.trim().to_string(),
            color: self.color.clone(),
            user_id,
            created_at: now,
        })
    }

    pub fn apply_to(&self, tag: &mut Tag) -> anyhow::Result<()> {
        self.validate()?;
        tag.name = self.name.trim().to_string();
        tag.color = self.color.clone();
        Ok(())
    }
}

/// A second user-managed label vocabulary, CRUD-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskType {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Record for TaskType {
    const TABLE: &'static str = "task_type";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Uuid {
        self.user_id
    }
}

#[derive(Debug, Clone)]
pub struct TaskTypeDraft {
    pub name: String,
    pub color: String,
}

impl TaskTypeDraft {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.name.trim().is_empty() {
            return Err(anyhow!("type name must not be empty"));
        }
        Ok(())
    }

    pub fn build(&self, user_id: Uuid, now: DateTime<Utc>) -> anyhow::Result<TaskType> {
        self.validate()?;
        Ok(TaskType {
            id: Uuid::new_v4(),
            name: self.name.trim().to_string(),
            color: self.color.clone(),
            user_id,
            created_at: now,
        })
    }

    pub fn apply_to(&self, task_type: &mut TaskType) -> anyhow::Result<()> {
        self.validate()?;
        task_type.name = self.name.trim().to_string();
        task_type.color = self.color.clone();
        Ok(())
    }
}

pub(crate) fn normalize_optional(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    use super::{Period, StoredTaskDraft, TaskDraft, TodoType};

    #[test]
    fn empty_task_body_is_rejected() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).expect("valid date");
        let mut draft = TaskDraft::new(date);
        draft.task = "   ".to_string();
        assert!(draft.build(Uuid::new_v4(), Utc::now()).is_err());
    }

    #[test]
    fn draft_trims_body_and_note() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).expect("valid date");
        let mut draft = TaskDraft::new(date);
        draft.task = "  water the plants  ".to_string();
        let task = draft.build(Uuid::new_v4(), Utc::now()).expect("build task");
        assert_eq!(task.task, "water the plants");

        let mut todo = StoredTaskDraft::new();
        todo.description = "read".to_string();
        todo.note = Some("   ".to_string());
        let stored = todo.build(Uuid::new_v4(), Utc::now()).expect("build to-do");
        assert_eq!(stored.note, None);
        assert!(!stored.archived);
    }

    #[test]
    fn enum_spellings_round_trip() {
        assert_eq!(Period::parse("Night").expect("parse period"), Period::Night);
        assert_eq!(
            TodoType::parse("one_time").expect("parse type"),
            TodoType::OneTime
        );
        assert_eq!(
            serde_json::to_string(&TodoType::OneTime).expect("serialize"),
            "\"one_time\""
        );
        assert_eq!(
            serde_json::to_string(&Period::Morning).expect("serialize"),
            "\"morning\""
        );
    }
}
