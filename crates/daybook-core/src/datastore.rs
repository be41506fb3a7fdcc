use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use tracing::{debug, info};
use uuid::Uuid;

/// A row in one of the store's tables. Every table is scoped by owner;
/// list queries never cross user boundaries.
pub trait Record: Clone + Serialize + DeserializeOwned {
    const TABLE: &'static str;

    fn id(&self) -> Uuid;
    fn owner(&self) -> Uuid;
}

const TABLES: [&str; 6] = [
    "task",
    "to_do_task",
    "task_tag",
    "task_type",
    "vocabulary",
    "user",
];

/// Local stand-in for the hosted data service: one JSONL file per table,
/// whole-table atomic rewrites, and the four record operations the pages
/// consume (list-by-owner, insert, update-by-id, delete-by-id).
#[derive(Debug)]
pub struct DataStore {
    pub data_dir: PathBuf,
    session_path: PathBuf,
}

impl DataStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        for table in TABLES {
            let path = data_dir.join(format!("{table}.data"));
            if !path.exists() {
                fs::write(&path, "")?;
            }
        }

        let session_path = data_dir.join("session.data");
        if !session_path.exists() {
            fs::write(&session_path, "")?;
        }

        info!(data_dir = %data_dir.display(), "opened datastore");

        Ok(Self {
            data_dir,
            session_path,
        })
    }

    fn table_path<R: Record>(&self) -> PathBuf {
        self.data_dir.join(format!("{}.data", R::TABLE))
    }

    #[tracing::instrument(skip(self), fields(table = R::TABLE))]
    pub fn list_all<R: Record>(&self) -> anyhow::Result<Vec<R>> {
        load_jsonl(&self.table_path::<R>())
            .with_context(|| format!("failed to load table {}", R::TABLE))
    }

    #[tracing::instrument(skip(self, owner), fields(table = R::TABLE, owner = %owner))]
    pub fn list_for<R: Record>(&self, owner: Uuid) -> anyhow::Result<Vec<R>> {
        let rows = self.list_all::<R>()?;
        Ok(rows.into_iter().filter(|row| row.owner() == owner).collect())
    }

    #[tracing::instrument(skip(self, row), fields(table = R::TABLE, id = %row.id()))]
    pub fn insert<R: Record>(&self, row: &R) -> anyhow::Result<()> {
        let mut rows = self.list_all::<R>()?;
        rows.push(row.clone());
        self.save_table(&rows)
    }

    #[tracing::instrument(skip(self, row), fields(table = R::TABLE, id = %row.id()))]
    pub fn update<R: Record>(&self, row: &R) -> anyhow::Result<()> {
        let mut rows = self.list_all::<R>()?;
        let idx = rows
            .iter()
            .position(|existing| existing.id() == row.id())
            .ok_or_else(|| anyhow!("no {} record with id {}", R::TABLE, row.id()))?;
        rows[idx] = row.clone();
        self.save_table(&rows)
    }

    #[tracing::instrument(skip(self, id), fields(table = R::TABLE, id = %id))]
    pub fn delete<R: Record>(&self, id: Uuid) -> anyhow::Result<()> {
        let mut rows = self.list_all::<R>()?;
        let before = rows.len();
        rows.retain(|existing| existing.id() != id);
        if rows.len() == before {
            return Err(anyhow!("no {} record with id {id}", R::TABLE));
        }
        self.save_table(&rows)
    }

    fn save_table<R: Record>(&self, rows: &[R]) -> anyhow::Result<()> {
        save_jsonl_atomic(&self.table_path::<R>(), rows)
            .with_context(|| format!("failed to save table {}", R::TABLE))
    }

    #[tracing::instrument(skip(self))]
    pub fn active_session(&self) -> anyhow::Result<Option<Uuid>> {
        let raw = fs::read_to_string(&self.session_path)
            .with_context(|| format!("failed reading {}", self.session_path.display()))?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let id = trimmed
            .parse::<Uuid>()
            .context("session file holds an invalid user id")?;
        Ok(Some(id))
    }

    #[tracing::instrument(skip(self))]
    pub fn set_active_session(&self, user: Option<Uuid>) -> anyhow::Result<()> {
        let payload = user.map(|id| id.to_string()).unwrap_or_default();
        fs::write(&self.session_path, payload)
            .with_context(|| format!("failed writing {}", self.session_path.display()))?;
        Ok(())
    }
}

#[tracing::instrument(skip(path))]
fn load_jsonl<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    debug!(file = %path.display(), "loading jsonl");
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let row: T = serde_json::from_str(trimmed)
            .with_context(|| format!("failed parsing {} line {}", path.display(), idx + 1))?;
        out.push(row);
    }

    debug!(count = out.len(), "loaded rows from jsonl");
    Ok(out)
}

#[tracing::instrument(skip(path, rows))]
fn save_jsonl_atomic<T: Serialize>(path: &Path, rows: &[T]) -> anyhow::Result<()> {
    debug!(file = %path.display(), count = rows.len(), "saving jsonl atomically");

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    for row in rows {
        let serialized = serde_json::to_string(row)?;
        writeln!(temp, "{serialized}")?;
    }
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    Ok(())
}
