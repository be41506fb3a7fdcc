use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

use crate::daterange::{DateRange, today_in};
use crate::task::{Period, StoredTask, Task};
use crate::vocab::{LanguageCode, VocabEntry};

/// Board filter: date window AND period AND tag. `None` means "all".
#[derive(Debug, Clone, Copy)]
pub struct TaskFilter {
    pub range: DateRange,
    pub period: Option<Period>,
    pub tag: Option<Uuid>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        let in_range = self.range.contains(task.date);
        let period_match = self.period.is_none_or(|period| task.task_period == period);
        let tag_match = self.tag.is_none_or(|tag| task.task_tag == Some(tag));
        in_range && period_match && tag_match
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StoredTaskFilter {
    pub tag: Option<Uuid>,
    pub archived: bool,
}

impl StoredTaskFilter {
    pub fn matches(&self, task: &StoredTask) -> bool {
        let tag_match = self.tag.is_none_or(|tag| task.task_tag == Some(tag));
        tag_match && task.archived == self.archived
    }
}

/// Vocabulary windows are trailing (ending today), unlike the task
/// board's calendar windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VocabRange {
    All,
    Week,
    Month,
    Date(NaiveDate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VocabSort {
    Alphabetical,
    Date,
}

#[derive(Debug, Clone)]
pub struct VocabFilter {
    pub search: String,
    pub language: LanguageCode,
    pub range: VocabRange,
    pub sort: VocabSort,
}

impl VocabFilter {
    pub fn new(language: LanguageCode) -> Self {
        Self {
            search: String::new(),
            language,
            range: VocabRange::All,
            sort: VocabSort::Alphabetical,
        }
    }

    pub fn matches(&self, entry: &VocabEntry, now: DateTime<Utc>, tz: &Tz) -> bool {
        let search_match = self.search.trim().is_empty()
            || entry
                .text
                .to_lowercase()
                .contains(&self.search.trim().to_lowercase());
        let language_match = entry.language_code == self.language;
        let date_match = match self.resolve_window(now, tz) {
            Some(window) => window.contains_instant(entry.created_at, tz),
            None => true,
        };
        search_match && language_match && date_match
    }

    fn resolve_window(&self, now: DateTime<Utc>, tz: &Tz) -> Option<DateRange> {
        let today = today_in(now, tz);
        match self.range {
            VocabRange::All => None,
            VocabRange::Week => Some(DateRange {
                start: today.checked_sub_days(Days::new(7)).unwrap_or(today),
                end: today,
            }),
            VocabRange::Month => Some(DateRange {
                start: today.checked_sub_months(Months::new(1)).unwrap_or(today),
                end: today,
            }),
            VocabRange::Date(date) => Some(DateRange {
                start: date,
                end: date,
            }),
        }
    }

    pub fn sort(&self, entries: &mut [&VocabEntry]) {
        match self.sort {
            VocabSort::Alphabetical => {
                entries.sort_by(|a, b| a.text.to_lowercase().cmp(&b.text.to_lowercase()));
            }
            VocabSort::Date => {
                entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            }
        }
    }
}
