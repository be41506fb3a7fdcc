use anyhow::anyhow;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

use crate::datastore::DataStore;
use crate::filter::VocabFilter;
use crate::notify::{Confirm, Debouncer, Notifier};
use crate::vocab::{LanguageCode, VocabDraft, VocabEntry};

const SUGGESTION_LIMIT: usize = 8;

/// Controller for the vocabulary notebook: entries, the search/language/
/// range/sort filter, and the debounced suggestion lookup behind the
/// entry form.
pub struct VocabularyPage {
    user_id: Uuid,
    pub entries: Vec<VocabEntry>,
    pub filter: VocabFilter,
    pub suggestions: Vec<VocabEntry>,
    pub notifier: Notifier,
    pub confirm: Confirm,
    pub debounce: Debouncer,
    editing: Option<Uuid>,
    pending_delete: Option<Uuid>,
}

impl VocabularyPage {
    #[tracing::instrument(skip(store))]
    pub fn open(store: &DataStore, user_id: Uuid) -> anyhow::Result<Self> {
        let mut page = Self {
            user_id,
            entries: vec![],
            filter: VocabFilter::new(LanguageCode::En),
            suggestions: vec![],
            notifier: Notifier::new(),
            confirm: Confirm::new(),
            debounce: Debouncer::default(),
            editing: None,
            pending_delete: None,
        };
        page.reload(store)?;
        Ok(page)
    }

    #[tracing::instrument(skip(self, store))]
    pub fn reload(&mut self, store: &DataStore) -> anyhow::Result<()> {
        let mut entries: Vec<VocabEntry> = store.list_for(self.user_id)?;
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.entries = entries;
        Ok(())
    }

    pub fn begin_edit(&mut self, id: Uuid) -> anyhow::Result<VocabDraft> {
        let entry = self
            .entries
            .iter()
            .find(|entry| entry.id == id)
            .ok_or_else(|| anyhow!("no vocabulary entry with id {id}"))?;
        self.editing = Some(id);
        Ok(VocabDraft {
            text: entry.text.clone(),
            phonetic: entry.phonetic.clone(),
            part_of_speech: entry.part_of_speech.clone(),
            sentences: entry.sentences.clone(),
            note: entry.note.clone(),
            language_code: entry.language_code,
            is_draft: entry.is_draft,
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
        draft: &VocabDraft,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        match self.editing {
            Some(id) => {
                let mut entry = self
                    .entries
                    .iter()
                    .find(|entry| entry.id == id)
                    .cloned()
                    .ok_or_else(|| anyhow!("no vocabulary entry with id {id}"))?;
                draft.apply_to(&mut entry, now)?;
                if let Err(err) = store.update(&entry) {
                    self.notifier.error(format!("{err:#}"), now);
                    return Err(err);
                }
                self.editing = None;
                self.notifier.success("Successfully updated!", now);
            }
            None => {
                let entry = draft.build(self.user_id, now)?;
                if let Err(err) = store.insert(&entry) {
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
        if let Err(err) = store.delete::<VocabEntry>(id) {
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

    /// A keystroke: the list filter updates immediately, the suggestion
    /// lookup restarts its debounce delay.
    pub fn input_search(&mut self, text: &str, now: DateTime<Utc>) {
        self.filter.search = text.to_string();
        self.debounce.input(text, now);
    }

    /// Runs the suggestion query once the debounce delay has elapsed;
    /// a no-op while a newer keystroke is still pending.
    #[tracing::instrument(skip(self, store))]
    pub fn poll_suggestions(&mut self, store: &DataStore, now: DateTime<Utc>) -> anyhow::Result<()> {
        let Some(query) = self.debounce.poll(now) else {
            return Ok(());
        };

        let needle = query.trim().to_lowercase();
        let rows: Vec<VocabEntry> = store.list_for(self.user_id)?;
        self.suggestions = rows
            .into_iter()
            .filter(|entry| {
                entry.language_code == self.filter.language
                    && entry.text.to_lowercase().contains(&needle)
            })
            .take(SUGGESTION_LIMIT)
            .collect();
        Ok(())
    }

    pub fn visible(&self, now: DateTime<Utc>, tz: &Tz) -> Vec<&VocabEntry> {
        let mut rows: Vec<&VocabEntry> = self
            .entries
            .iter()
            .filter(|entry| self.filter.matches(entry, now, tz))
            .collect();
        self.filter.sort(&mut rows);
        rows
    }
}
