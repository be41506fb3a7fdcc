use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::datastore::Record;
use crate::task::normalize_optional;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageCode {
    En,
    Bn,
}

impl LanguageCode {
    pub fn as_str(self) -> &'static str {
        match self {
            LanguageCode::En => "en",
            LanguageCode::Bn => "bn",
        }
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(LanguageCode::En),
            "bn" => Ok(LanguageCode::Bn),
            other => Err(anyhow!("unknown language code: {other} (expected en/bn)")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabEntry {
    pub id: Uuid,

    pub language_code: LanguageCode,

    pub text: String,

    #[serde(default)]
    pub phonetic: Option<String>,

    #[serde(default)]
    pub part_of_speech: Option<String>,

    #[serde(default)]
    pub sentences: Vec<String>,

    #[serde(default)]
    pub note: Option<String>,

    #[serde(default)]
    pub is_draft: bool,

    pub created_by: Uuid,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Record for VocabEntry {
    const TABLE: &'static str = "vocabulary";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Uuid {
        self.created_by
    }
}

#[derive(Debug, Clone)]
pub struct VocabDraft {
    pub text: String,
    pub phonetic: Option<String>,
    pub part_of_speech: Option<String>,
    pub sentences: Vec<String>,
    pub note: Option<String>,
    pub language_code: LanguageCode,
    pub is_draft: bool,
}

impl VocabDraft {
    pub fn new(language_code: LanguageCode) -> Self {
        Self {
            text: String::new(),
            phonetic: None,
            part_of_speech: None,
            sentences: vec![],
            note: None,
            language_code,
            is_draft: false,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.text.trim().is_empty() {
            return Err(anyhow!("vocabulary text must not be empty"));
        }
        Ok(())
    }

    pub fn build(&self, created_by: Uuid, now: DateTime<Utc>) -> anyhow::Result<VocabEntry> {
        self.validate()?;
        Ok(VocabEntry {
            id: Uuid::new_v4(),
            language_code: self.language_code,
            text: self.text.trim().to_string(),
            phonetic: normalize_optional(self.phonetic.as_deref()),
            part_of_speech: normalize_optional(self.part_of_speech.as_deref()),
            sentences: clean_sentences(&self.sentences),
            note: normalize_optional(self.note.as_deref()),
            is_draft: self.is_draft,
            created_by,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_to(&self, entry: &mut VocabEntry, now: DateTime<Utc>) -> anyhow::Result<()> {
        self.validate()?;
        entry.language_code = self.language_code;
        entry.text = self.text.trim().to_string();
        entry.phonetic = normalize_optional(self.phonetic.as_deref());
        entry.part_of_speech = normalize_optional(self.part_of_speech.as_deref());
        entry.sentences = clean_sentences(&self.sentences);
        entry.note = normalize_optional(self.note.as_deref());
        entry.is_draft = self.is_draft;
        entry.updated_at = now;
        Ok(())
    }
}

fn clean_sentences(sentences: &[String]) -> Vec<String> {
    sentences
        .iter()
        .map(|sentence| sentence.trim())
        .filter(|sentence| !sentence.is_empty())
        .map(str::to_string)
        .collect()
}
