use anyhow::anyhow;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::datastore::DataStore;
use crate::daterange::{self, DateRange, RangeMode};
use crate::filter::TaskFilter;
use crate::notify::{Confirm, Notifier};
use crate::task::{Period, Tag, Task, TaskDraft};

/// Controller for the task board: loaded rows, the active filters, and
/// every mutation the page offers. Owns fetching and persistence; the
/// decision logic lives in the daterange and filter modules.
pub struct TaskManagerPage {
    user_id: Uuid,
    pub tasks: Vec<Task>,
    pub tags: Vec<Tag>,
    pub reference: NaiveDate,
    pub mode: RangeMode,
    pub period: Option<Period>,
    pub tag: Option<Uuid>,
    pub notifier: Notifier,
    pub confirm: Confirm,
    editing: Option<Uuid>,
    pending_delete: Option<Uuid>,
}

impl TaskManagerPage {
    #[tracing::instrument(skip(store))]
    pub fn open(store: &DataStore, user_id: Uuid, today: NaiveDate) -> anyhow::Result<Self> {
        let mut page = Self {
            user_id,
            tasks: vec![],
            tags: vec![],
            reference: today,
            mode: RangeMode::Day,
            period: None,
            tag: None,
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
        let mut tasks: Vec<Task> = store.list_for(self.user_id)?;
        tasks.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        self.tasks = tasks;
        Ok(())
    }

    pub fn begin_edit(&mut self, id: Uuid) -> anyhow::Result<TaskDraft> {
        let task = self
            .tasks
            .iter()
            .find(|task| task.id == id)
            .ok_or_else(|| anyhow!("no task with id {id}"))?;
        self.editing = Some(id);
        Ok(TaskDraft {
            task: task.task.clone(),
            task_period: task.task_period,
            task_tag: task.task_tag,
            date: task.date,
        })
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    pub fn editing(&self) -> Option<Uuid> {
        self.editing
    }

    /// Creates a task, or updates the one being edited.
    #[tracing::instrument(skip(self, store, draft))]
    pub fn submit(
        &mut self,
        store: &DataStore,
        draft: &TaskDraft,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        match self.editing {
            Some(id) => {
                let mut task = self
                    .tasks
                    .iter()
                    .find(|task| task.id == id)
                    .cloned()
                    .ok_or_else(|| anyhow!("no task with id {id}"))?;
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
        if let Err(err) = store.delete::<Task>(id) {
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

    /// Picking an explicit date drops the board back to day mode.
    pub fn set_date(&mut self, date: NaiveDate) {
        self.reference = date;
        self.mode = RangeMode::Day;
    }

    pub fn set_mode(&mut self, mode: RangeMode) {
        self.mode = mode;
    }

    pub fn advance_range(&mut self, today: NaiveDate) {
        self.reference = daterange::advance(self.reference, self.mode, today);
    }

    pub fn retreat_range(&mut self) {
        self.reference = daterange::retreat(self.reference, self.mode);
    }

    pub fn range(&self) -> DateRange {
        daterange::resolve(self.reference, self.mode)
    }

    pub fn range_label(&self) -> String {
        daterange::label(self.reference, self.mode)
    }

    pub fn visible(&self) -> Vec<&Task> {
        let filter = TaskFilter {
            range: self.range(),
            period: self.period,
            tag: self.tag,
        };
        self.tasks.iter().filter(|task| filter.matches(task)).collect()
    }

    /// Visible tasks bucketed by period in display order; empty periods
    /// are omitted.
    pub fn grouped(&self) -> Vec<(Period, Vec<&Task>)> {
        let visible = self.visible();
        Period::ALL
            .into_iter()
            .filter_map(|period| {
                let rows: Vec<&Task> = visible
                    .iter()
                    .copied()
                    .filter(|task| task.task_period == period)
                    .collect();
                if rows.is_empty() {
                    None
                } else {
                    Some((period, rows))
                }
            })
            .collect()
    }

    /// Dangling tag references degrade to "no tag".
    pub fn tag_name(&self, id: Option<Uuid>) -> Option<&str> {
        let id = id?;
        self.tags
            .iter()
            .find(|tag| tag.id == id)
            .map(|tag| tag.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use tempfile::tempdir;
    use uuid::Uuid;

    use crate::datastore::DataStore;
    use crate::daterange::RangeMode;
    use crate::task::{Period, Tag, TagDraft, TaskDraft};

    use super::TaskManagerPage;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn setup() -> (tempfile::TempDir, DataStore, Uuid) {
        let temp = tempdir().expect("tempdir");
        let store = DataStore::open(temp.path()).expect("open datastore");
        (temp, store, Uuid::new_v4())
    }

    #[test]
    fn create_edit_and_delete_round_trip() {
        let (_temp, store, user) = setup();
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).single().expect("now");
        let today = date(2024, 3, 10);

        let mut page = TaskManagerPage::open(&store, user, today).expect("open page");
        let mut draft = TaskDraft::new(today);
        draft.task = "water the plants".to_string();
        draft.task_period = Period::Night;
        page.submit(&store, &draft, now).expect("create");
        assert_eq!(page.tasks.len(), 1);

        let id = page.tasks[0].id;
        let mut edit = page.begin_edit(id).expect("begin edit");
        edit.task = "water the garden".to_string();
        page.submit(&store, &edit, now).expect("update");
        assert_eq!(page.tasks[0].task, "water the garden");
        assert_eq!(page.editing(), None);

        page.request_delete(id);
        assert!(page.confirm.pending().is_some());
        page.confirm_delete(&store, now).expect("delete");
        assert!(page.tasks.is_empty());
    }

    #[test]
    fn cancelled_confirmation_leaves_the_task() {
        let (_temp, store, user) = setup();
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).single().expect("now");
        let today = date(2024, 3, 10);

        let mut page = TaskManagerPage::open(&store, user, today).expect("open page");
        let mut draft = TaskDraft::new(today);
        draft.task = "keep me".to_string();
        page.submit(&store, &draft, now).expect("create");

        let id = page.tasks[0].id;
        page.request_delete(id);
        page.cancel_delete();
        page.confirm_delete(&store, now).expect("no-op");
        assert_eq!(page.tasks.len(), 1);
    }

    #[test]
    fn visible_respects_range_period_and_tag() {
        let (_temp, store, user) = setup();
        let now = Utc.with_ymd_and_hms(2024, 3, 13, 9, 0, 0).single().expect("now");
        let today = date(2024, 3, 13);

        let tag = TagDraft {
            name: "health".to_string(),
            color: "#4cd137".to_string(),
        }
        .build(user, now)
        .expect("build tag");
        store.insert(&tag).expect("insert tag");

        let mut page = TaskManagerPage::open(&store, user, today).expect("open page");

        let mut monday = TaskDraft::new(date(2024, 3, 11));
        monday.task = "run".to_string();
        monday.task_period = Period::Morning;
        monday.task_tag = Some(tag.id);
        page.submit(&store, &monday, now).expect("create");

        let mut last_month = TaskDraft::new(date(2024, 2, 11));
        last_month.task = "old entry".to_string();
        page.submit(&store, &last_month, now).expect("create");

        assert_eq!(page.visible().len(), 0);

        page.set_mode(RangeMode::Week);
        assert_eq!(page.visible().len(), 1);

        page.period = Some(Period::Night);
        assert_eq!(page.visible().len(), 0);
        page.period = None;

        page.tag = Some(tag.id);
        assert_eq!(page.visible().len(), 1);
        page.tag = Some(Uuid::new_v4());
        assert_eq!(page.visible().len(), 0);

        page.set_mode(RangeMode::Month);
        page.tag = None;
        let grouped = page.grouped();
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].0, Period::Morning);
    }

    #[test]
    fn navigation_clamps_at_today() {
        let (_temp, store, user) = setup();
        let today = date(2024, 3, 10);
        let mut page = TaskManagerPage::open(&store, user, today).expect("open page");

        page.advance_range(today);
        assert_eq!(page.reference, today);

        page.retreat_range();
        assert_eq!(page.reference, date(2024, 3, 9));
        page.advance_range(today);
        assert_eq!(page.reference, today);
    }

    #[test]
    fn dangling_tag_renders_as_no_tag() {
        let (_temp, store, user) = setup();
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).single().expect("now");
        let today = date(2024, 3, 10);

        let tag = TagDraft {
            name: "errands".to_string(),
            color: "#00a8ff".to_string(),
        }
        .build(user, now)
        .expect("build tag");
        store.insert(&tag).expect("insert tag");

        let mut page = TaskManagerPage::open(&store, user, today).expect("open page");
        let mut draft = TaskDraft::new(today);
        draft.task = "post office".to_string();
        draft.task_tag = Some(tag.id);
        page.submit(&store, &draft, now).expect("create");
        assert_eq!(page.tag_name(page.tasks[0].task_tag), Some("errands"));

        store.delete::<Tag>(tag.id).expect("delete tag");
        page.reload(&store).expect("reload");

        assert_eq!(page.tasks.len(), 1);
        assert_eq!(page.tag_name(page.tasks[0].task_tag), None);
    }
}
