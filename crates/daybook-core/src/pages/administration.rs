use anyhow::anyhow;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::datastore::DataStore;
use crate::notify::{Confirm, Notifier};
use crate::task::{Tag, TagDraft, TaskType, TaskTypeDraft};

pub const PREDEFINED_COLORS: [&str; 20] = [
    "#00a8ff", "#9c88ff", "#fbc531", "#4cd137", "#487eb0", "#0097e6", "#8c7ae6", "#e1b12c",
    "#44bd32", "#40739e", "#e84118", "#f5f6fa", "#7f8fa6", "#273c75", "#353b48", "#c23616",
    "#dcdde1", "#718093", "#192a56", "#2f3640",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AdminTarget {
    Tag(Uuid),
    Type(Uuid),
}

/// Controller for the administration page: CRUD over the two label
/// vocabularies (tags and task types). Deleting either never cascades
/// to referencing tasks.
pub struct AdministrationPage {
    user_id: Uuid,
    pub tags: Vec<Tag>,
    pub types: Vec<TaskType>,
    pub notifier: Notifier,
    pub confirm: Confirm,
    editing_tag: Option<Uuid>,
    editing_type: Option<Uuid>,
    pending_delete: Option<AdminTarget>,
}

impl AdministrationPage {
    #[tracing::instrument(skip(store))]
    pub fn open(store: &DataStore, user_id: Uuid) -> anyhow::Result<Self> {
        let mut page = Self {
            user_id,
            tags: vec![],
            types: vec![],
            notifier: Notifier::new(),
            confirm: Confirm::new(),
            editing_tag: None,
            editing_type: None,
            pending_delete: None,
        };
        page.reload(store)?;
        Ok(page)
    }

    #[tracing::instrument(skip(self, store))]
    pub fn reload(&mut self, store: &DataStore) -> anyhow::Result<()> {
        let mut tags: Vec<Tag> = store.list_for(self.user_id)?;
        tags.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.tags = tags;

        let mut types: Vec<TaskType> = store.list_for(self.user_id)?;
        types.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.types = types;
        Ok(())
    }

    pub fn begin_edit_tag(&mut self, id: Uuid) -> anyhow::Result<TagDraft> {
        let tag = self
            .tags
            .iter()
            .find(|tag| tag.id == id)
            .ok_or_else(|| anyhow!("no tag with id {id}"))?;
        self.editing_tag = Some(id);
        Ok(TagDraft {
            name: tag.name.clone(),
            color: tag.color.clone(),
        })
    }

    pub fn cancel_edit_tag(&mut self) {
        self.editing_tag = None;
    }

    #[tracing::instrument(skip(self, store, draft))]
    pub fn save_tag(
        &mut self,
        store: &DataStore,
        draft: &TagDraft,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        match self.editing_tag {
            Some(id) => {
                let mut tag = self
                    .tags
                    .iter()
                    .find(|tag| tag.id == id)
                    .cloned()
                    .ok_or_else(|| anyhow!("no tag with id {id}"))?;
                draft.apply_to(&mut tag)?;
                if let Err(err) = store.update(&tag) {
                    self.notifier.error(format!("{err:#}"), now);
                    return Err(err);
                }
                self.editing_tag = None;
                self.notifier.success("Successfully updated!", now);
            }
            None => {
                let tag = draft.build(self.user_id, now)?;
                if let Err(err) = store.insert(&tag) {
                    self.notifier.error(format!("{err:#}"), now);
                    return Err(err);
                }
                self.notifier.success("Successfully created!", now);
            }
        }
        self.reload(store)
    }

    pub fn begin_edit_type(&mut self, id: Uuid) -> anyhow::Result<TaskTypeDraft> {
        let task_type = self
            .types
            .iter()
            .find(|task_type| task_type.id == id)
            .ok_or_else(|| anyhow!("no task type with id {id}"))?;
        self.editing_type = Some(id);
        Ok(TaskTypeDraft {
            name: task_type.name.clone(),
            color: task_type.color.clone(),
        })
    }

    pub fn cancel_edit_type(&mut self) {
        self.editing_type = None;
    }

    #[tracing::instrument(skip(self, store, draft))]
    pub fn save_type(
        &mut self,
        store: &DataStore,
        draft: &TaskTypeDraft,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        match self.editing_type {
            Some(id) => {
                let mut task_type = self
                    .types
                    .iter()
                    .find(|task_type| task_type.id == id)
                    .cloned()
                    .ok_or_else(|| anyhow!("no task type with id {id}"))?;
                draft.apply_to(&mut task_type)?;
                if let Err(err) = store.update(&task_type) {
                    self.notifier.error(format!("{err:#}"), now);
                    return Err(err);
                }
                self.editing_type = None;
                self.notifier.success("Successfully updated!", now);
            }
            None => {
                let task_type = draft.build(self.user_id, now)?;
                if let Err(err) = store.insert(&task_type) {
                    self.notifier.error(format!("{err:#}"), now);
                    return Err(err);
                }
                self.notifier.success("Successfully created!", now);
            }
        }
        self.reload(store)
    }

    pub fn request_delete_tag(&mut self, id: Uuid) {
        self.pending_delete = Some(AdminTarget::Tag(id));
        self.confirm.request("Are you sure?");
    }

    pub fn request_delete_type(&mut self, id: Uuid) {
        self.pending_delete = Some(AdminTarget::Type(id));
        self.confirm.request("Are you sure?");
    }

    #[tracing::instrument(skip(self, store))]
    pub fn confirm_delete(&mut self, store: &DataStore, now: DateTime<Utc>) -> anyhow::Result<()> {
        if !self.confirm.confirm() {
            return Ok(());
        }
        let Some(target) = self.pending_delete.take() else {
            return Ok(());
        };

        let result = match target {
            AdminTarget::Tag(id) => store.delete::<Tag>(id),
            AdminTarget::Type(id) => store.delete::<TaskType>(id),
        };
        if let Err(err) = result {
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

    pub fn find_tag_by_name(&self, name: &str) -> Option<&Tag> {
        self.tags
            .iter()
            .find(|tag| tag.name.eq_ignore_ascii_case(name.trim()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;
    use uuid::Uuid;

    use crate::datastore::DataStore;
    use crate::task::{TagDraft, TaskTypeDraft};

    use super::{AdministrationPage, PREDEFINED_COLORS};

    fn setup() -> (tempfile::TempDir, DataStore, Uuid) {
        let temp = tempdir().expect("tempdir");
        let store = DataStore::open(temp.path()).expect("open datastore");
        (temp, store, Uuid::new_v4())
    }

    #[test]
    fn tag_crud_round_trip() {
        let (_temp, store, user) = setup();
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).single().expect("now");
        let mut page = AdministrationPage::open(&store, user).expect("open page");

        let draft = TagDraft {
            name: "health".to_string(),
            color: PREDEFINED_COLORS[0].to_string(),
        };
        page.save_tag(&store, &draft, now).expect("create");
        assert_eq!(page.tags.len(), 1);

        let id = page.tags[0].id;
        let mut edit = page.begin_edit_tag(id).expect("begin edit");
        edit.name = "wellness".to_string();
        page.save_tag(&store, &edit, now).expect("update");
        assert_eq!(page.tags[0].name, "wellness");

        page.request_delete_tag(id);
        page.confirm_delete(&store, now).expect("delete");
        assert!(page.tags.is_empty());
    }

    #[test]
    fn type_crud_round_trip() {
        let (_temp, store, user) = setup();
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).single().expect("now");
        let mut page = AdministrationPage::open(&store, user).expect("open page");

        let draft = TaskTypeDraft {
            name: "chore".to_string(),
            color: PREDEFINED_COLORS[3].to_string(),
        };
        page.save_type(&store, &draft, now).expect("create");
        assert_eq!(page.types.len(), 1);

        let blank = TaskTypeDraft {
            name: "  ".to_string(),
            color: PREDEFINED_COLORS[0].to_string(),
        };
        assert!(page.save_type(&store, &blank, now).is_err());
        assert_eq!(page.types.len(), 1);
    }

    #[test]
    fn one_confirmation_at_a_time() {
        let (_temp, store, user) = setup();
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).single().expect("now");
        let mut page = AdministrationPage::open(&store, user).expect("open page");

        page.save_tag(
            &store,
            &TagDraft {
                name: "a".to_string(),
                color: PREDEFINED_COLORS[0].to_string(),
            },
            now,
        )
        .expect("create");
        page.save_type(
            &store,
            &TaskTypeDraft {
                name: "b".to_string(),
                color: PREDEFINED_COLORS[1].to_string(),
            },
            now,
        )
        .expect("create");

        let tag_id = page.tags[0].id;
        let type_id = page.types[0].id;

        // The second request replaces the first; only the type goes.
        page.request_delete_tag(tag_id);
        page.request_delete_type(type_id);
        page.confirm_delete(&store, now).expect("delete");

        assert_eq!(page.tags.len(), 1);
        assert!(page.types.is_empty());
    }
}
