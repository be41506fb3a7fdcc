use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::datastore::DataStore;
use crate::filter::StoredTaskFilter;
use crate::lifecycle::{self, CompletionEvent, Disposition};
use crate::notify::{Confirm, Notifier};
use crate::task::{StoredTask, StoredTaskDraft, Tag, TodoType};

/// Controller for the to-do store: typed to-dos, their filters, and the
/// mark-done flow that feeds the lifecycle engine.
pub struct TaskStorePage {
    user_id: Uuid,
    pub tasks: Vec<StoredTask>,
    pub tags: Vec<Tag>,
    pub tag_filter: Option<Uuid>,
    pub archived: bool,
    pub notifier: Notifier,
    pub confirm: Confirm,
    editing: Option<Uuid>,
    pending_delete: Option<Uuid>,
}

impl TaskStorePage {
    #[tracing::instrument(skip(store))]
    pub fn open(store: &DataStore, user_id: Uuid) -> anyhow::Result<Self> {
        let mut page = Self {
            user_id,
            tasks: vec![],
            tags: vec![],
            tag_filter: None,
            archived: false,
            notifier: Notifier::new(),
            confirm: Confirm::new(),
            editing: None,
            pending_delete: None,
        };
        page.reload(store)?;
        Ok(page)
    }

    #[tracing::instrument(skip(self, store))]
    pub fn reload(&mut self, store: &DataStore) -> anyhow::Result<()> {
        self.tags = store.list_for(self.user_id)?;
        let mut tasks: Vec<StoredTask> = store.list_for(self.user_id)?;
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.tasks = tasks;
        Ok(())
    }

    pub fn begin_edit(&mut self, id: Uuid) -> anyhow::Result<StoredTaskDraft> {
        let task = self
            .tasks
            .iter()
            .find(|task| task.id == id)
            .ok_or_else(|| anyhow!("no to-do with id {id}"))?;
        self.editing = Some(id);
        Ok(StoredTaskDraft {
            description: task.description.clone(),
            note: task.note.clone(),
            to_do_type: task.to_do_type,
            task_tag: task.task_tag,
        })
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    pub fn editing(&self) -> Option<Uuid> {
        self.editing
    }

    #[tracing::instrument(skip(self, store, draft))]
    pub fn save(
        &mut self,
        store: &DataStore,
        draft: &StoredTaskDraft,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        match self.editing {
            Some(id) => {
                let mut task = self
                    .tasks
                    .iter()
                    .find(|task| task.id == id)
                    .cloned()
                    .ok_or_else(|| anyhow!("no to-do with id {id}"))?;
                draft.apply_to(&mut task)?;
                if let Err(err) = store.update(&task) {
                    self.notifier.error(format!("{err:#}"), now);
                    return Err(err);
                }
                self.editing = None;
                self.notifier.success("Successfully updated!", now);
            }
            None => {
                let task = draft.build(self.user_id, now)?;
                if let Err(err) = store.insert(&task) {
                    self.notifier.error(format!("{err:#}"), now);
                    return Err(err);
                }
                self.notifier.success("Successfully created!", now);
            }
        }
        self.reload(store)
    }

    /// Marks a to-do done. Two independent writes, strictly ordered: the
    /// log entry is inserted first, and the to-do is only removed once
    /// the insert has succeeded. A failed delete leaves the to-do and the
    /// already-valid log entry in place; there is no rollback.
    #[tracing::instrument(skip(self, store, event))]
    pub fn complete(
        &mut self,
        store: &DataStore,
        id: Uuid,
        event: &CompletionEvent,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let task = self
            .tasks
            .iter()
            .find(|task| task.id == id)
            .cloned()
            .ok_or_else(|| anyhow!("no to-do with id {id}"))?;

        let outcome = lifecycle::complete(&task, event)?;
        let log_entry = outcome.log_entry.build(self.user_id, now)?;

        if let Err(err) = store.insert(&log_entry) {
            self.notifier.error(format!("{err:#}"), now);
            return Err(err.context("failed to record completion; to-do left unchanged"));
        }

        if outcome.disposition == Disposition::Delete {
            if let Err(err) = store.delete::<StoredTask>(id) {
                self.notifier.error(
                    "Completion was recorded, but the to-do could not be removed",
                    now,
                );
                return Err(err.context("completion recorded, but removing the to-do failed"));
            }
        }

        self.notifier.success("Successfully completed!", now);
        self.reload(store)
    }

    pub fn request_delete(&mut self, id: Uuid) {
        self.pending_delete = Some(id);
        self.confirm.request("Are you sure?");
    }

    #[tracing::instrument(skip(self, store))]
    pub fn confirm_delete(&mut self, store: &DataStore, now: DateTime<Utc>) -> anyhow::Result<()> {
        if !self.confirm.confirm() {
            return Ok(());
        }
        let Some(id) = self.pending_delete.take() else {
            return Ok(());
        };
        if let Err(err) = store.delete::<StoredTask>(id) {
            self.notifier.error(format!("{err:#}"), now);
            return Err(err);
        }
        self.notifier.info("Successfully deleted!", now);
        self.reload(store)
    }

    pub fn cancel_delete(&mut self) {
        self.confirm.cancel();
        self.pending_delete = None;
    }

    pub fn visible(&self) -> Vec<&StoredTask> {
        let filter = StoredTaskFilter {
            tag: self.tag_filter,
            archived: self.archived,
        };
        self.tasks.iter().filter(|task| filter.matches(task)).collect()
    }

    /// Visible to-dos bucketed by declared type, in one_time/always/
    /// progress display order.
    pub fn grouped(&self) -> Vec<(TodoType, Vec<&StoredTask>)> {
        let visible = self.visible();
        TodoType::ALL
            .into_iter()
            .map(|to_do_type| {
                let rows: Vec<&StoredTask> = visible
                    .iter()
                    .copied()
                    .filter(|task| task.to_do_type == to_do_type)
                    .collect();
                (to_do_type, rows)
            })
            .collect()
    }

    pub fn find(&self, id: Uuid) -> anyhow::Result<&StoredTask> {
        self.tasks
            .iter()
            .find(|task| task.id == id)
            .with_context(|| format!("no to-do with id {id}"))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use tempfile::tempdir;
    use uuid::Uuid;

    use crate::datastore::DataStore;
    use crate::lifecycle::{CompletionEvent, CompletionMode};
    use crate::task::{Period, StoredTaskDraft, Task, TodoType};

    use super::TaskStorePage;

    fn setup() -> (tempfile::TempDir, DataStore, Uuid) {
        let temp = tempdir().expect("tempdir");
        let store = DataStore::open(temp.path()).expect("open datastore");
        (temp, store, Uuid::new_v4())
    }

    fn event(mode: CompletionMode, note: Option<&str>) -> CompletionEvent {
        CompletionEvent {
            date: NaiveDate::from_ymd_opt(2024, 3, 10).expect("valid date"),
            period: Period::Day,
            mode,
            note: note.map(str::to_string),
        }
    }

    fn add_todo(
        page: &mut TaskStorePage,
        store: &DataStore,
        description: &str,
        to_do_type: TodoType,
    ) -> Uuid {
        let draft = StoredTaskDraft {
            description: description.to_string(),
            note: None,
            to_do_type,
            task_tag: None,
        };
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).single().expect("now");
        page.save(store, &draft, now).expect("save to-do");
        page.tasks
            .iter()
            .find(|task| task.description == description)
            .map(|task| task.id)
            .expect("created to-do")
    }

    #[test]
    fn completing_one_time_logs_and_removes_it() {
        let (_temp, store, user) = setup();
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).single().expect("now");
        let mut page = TaskStorePage::open(&store, user).expect("open page");
        let id = add_todo(&mut page, &store, "Pay rent", TodoType::OneTime);

        page.complete(&store, id, &event(CompletionMode::Complete, None), now)
            .expect("complete");

        assert!(page.tasks.is_empty());
        let log: Vec<Task> = store.list_for(user).expect("list tasks");
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].task, "[Complete] Pay rent");
        assert_eq!(log[0].task_period, Period::Day);
    }

    #[test]
    fn completing_always_keeps_it_reusable() {
        let (_temp, store, user) = setup();
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).single().expect("now");
        let mut page = TaskStorePage::open(&store, user).expect("open page");
        let id = add_todo(&mut page, &store, "Morning run", TodoType::Always);

        page.complete(&store, id, &event(CompletionMode::Complete, None), now)
            .expect("complete");

        assert_eq!(page.tasks.len(), 1);
        assert_eq!(page.tasks[0].id, id);
        let log: Vec<Task> = store.list_for(user).expect("list tasks");
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].task, "[Complete] Morning run");
    }

    #[test]
    fn progress_update_then_complete_full() {
        let (_temp, store, user) = setup();
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).single().expect("now");
        let mut page = TaskStorePage::open(&store, user).expect("open page");
        let id = add_todo(&mut page, &store, "Read book", TodoType::Progress);

        page.complete(&store, id, &event(CompletionMode::Complete, Some("ch.3")), now)
            .expect("partial");
        assert_eq!(page.tasks.len(), 1);

        page.complete(&store, id, &event(CompletionMode::CompleteFull, Some("done")), now)
            .expect("full");
        assert!(page.tasks.is_empty());

        let mut log: Vec<Task> = store.list_for(user).expect("list tasks");
        log.sort_by(|a, b| a.task.cmp(&b.task));
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].task, "[Complete] Read book [done]");
        assert_eq!(log[1].task, "[Update] Read book [ch.3]");
    }

    #[test]
    fn complete_full_is_rejected_for_one_time() {
        let (_temp, store, user) = setup();
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).single().expect("now");
        let mut page = TaskStorePage::open(&store, user).expect("open page");
        let id = add_todo(&mut page, &store, "Pay rent", TodoType::OneTime);

        assert!(
            page.complete(&store, id, &event(CompletionMode::CompleteFull, None), now)
                .is_err()
        );
        assert_eq!(page.tasks.len(), 1);
        let log: Vec<Task> = store.list_for(user).expect("list tasks");
        assert!(log.is_empty());
    }

    #[test]
    fn failed_delete_still_keeps_the_log_entry() {
        let (_temp, store, user) = setup();
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).single().expect("now");
        let mut page = TaskStorePage::open(&store, user).expect("open page");
        let id = add_todo(&mut page, &store, "Pay rent", TodoType::OneTime);

        // The to-do disappears underneath the page (stale in-memory
        // copy), so the insert succeeds and the delete fails.
        store
            .delete::<crate::task::StoredTask>(id)
            .expect("outside delete");

        let result = page.complete(&store, id, &event(CompletionMode::Complete, None), now);
        assert!(result.is_err());

        let log: Vec<Task> = store.list_for(user).expect("list tasks");
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].task, "[Complete] Pay rent");
    }

    #[test]
    fn visible_respects_tag_and_archived_filters() {
        let (_temp, store, user) = setup();
        let mut page = TaskStorePage::open(&store, user).expect("open page");
        let id = add_todo(&mut page, &store, "Pay rent", TodoType::OneTime);
        add_todo(&mut page, &store, "Morning run", TodoType::Always);

        assert_eq!(page.visible().len(), 2);

        let mut archived = page.find(id).expect("find").clone();
        archived.archived = true;
        store.update(&archived).expect("archive");
        page.reload(&store).expect("reload");

        assert_eq!(page.visible().len(), 1);
        page.archived = true;
        assert_eq!(page.visible().len(), 1);
        assert_eq!(page.visible()[0].id, id);

        page.archived = false;
        let grouped = page.grouped();
        assert_eq!(grouped.len(), 3);
        assert_eq!(grouped[0].0, TodoType::OneTime);
        assert!(grouped[0].1.is_empty());
        assert_eq!(grouped[1].1.len(), 1);
    }
}
