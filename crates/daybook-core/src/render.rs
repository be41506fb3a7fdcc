use std::io::{self, IsTerminal, Write};

use unicode_width::UnicodeWidthStr;
use uuid::Uuid;

use crate::config::{Preferences, Theme};
use crate::notify::{Notification, NotifyKind};
use crate::pages::{TaskManagerPage, TaskStorePage};
use crate::task::{Period, Tag, TaskType};
use crate::vocab::VocabEntry;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    theme: Theme,
}

impl Renderer {
    pub fn new(prefs: &Preferences) -> Self {
        Self {
            color: io::stdout().is_terminal(),
            theme: prefs.theme,
        }
    }

    #[tracing::instrument(skip(self, page))]
    pub fn print_task_board(&mut self, page: &TaskManagerPage) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        let visible = page.visible();

        writeln!(out, "{}", page.range_label())?;
        writeln!(out, "Tasks ({})", visible.len())?;

        if visible.is_empty() {
            writeln!(out, "No tasks found")?;
            return Ok(());
        }

        for (period, rows) in page.grouped() {
            writeln!(out)?;
            writeln!(out, "{}", self.paint(period.as_str(), self.period_code(period)))?;

            let table_rows: Vec<Vec<String>> = rows
                .iter()
                .map(|task| {
                    vec![
                        self.paint(&short_id(task.id), "33"),
                        task.date.format("%Y-%m-%d").to_string(),
                        task.task.clone(),
                        page.tag_name(task.task_tag).unwrap_or_default().to_string(),
                    ]
                })
                .collect();
            write_table(
                &mut out,
                vec![
                    "ID".to_string(),
                    "Date".to_string(),
                    "Task".to_string(),
                    "Tag".to_string(),
                ],
                table_rows,
            )?;
        }

        Ok(())
    }

    #[tracing::instrument(skip(self, page))]
    pub fn print_todo_board(&mut self, page: &TaskStorePage) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        let visible = page.visible();

        writeln!(out, "To-dos ({})", visible.len())?;
        if visible.is_empty() {
            writeln!(out, "No tasks found")?;
            return Ok(());
        }

        for (to_do_type, rows) in page.grouped() {
            if rows.is_empty() {
                continue;
            }
            writeln!(out)?;
            writeln!(out, "{}", self.paint(to_do_type.as_str(), "36"))?;

            let table_rows: Vec<Vec<String>> = rows
                .iter()
                .map(|task| {
                    let tag = task
                        .task_tag
                        .and_then(|id| page.tags.iter().find(|tag| tag.id == id))
                        .map(|tag| tag.name.clone())
                        .unwrap_or_default();
                    vec![
                        self.paint(&short_id(task.id), "33"),
                        task.description.clone(),
                        task.note.clone().unwrap_or_default(),
                        tag,
                    ]
                })
                .collect();
            write_table(
                &mut out,
                vec![
                    "ID".to_string(),
                    "Description".to_string(),
                    "Note".to_string(),
                    "Tag".to_string(),
                ],
                table_rows,
            )?;
        }

        Ok(())
    }

    #[tracing::instrument(skip(self, entries))]
    pub fn print_vocab_list(&mut self, entries: &[&VocabEntry]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "Vocabulary ({})", entries.len())?;
        if entries.is_empty() {
            writeln!(out, "No results found")?;
            return Ok(());
        }

        let table_rows: Vec<Vec<String>> = entries
            .iter()
            .map(|entry| {
                vec![
                    self.paint(&short_id(entry.id), "33"),
                    entry.text.clone(),
                    entry.phonetic.clone().unwrap_or_default(),
                    entry.part_of_speech.clone().unwrap_or_default(),
                    entry.language_code.as_str().to_string(),
                    if entry.is_draft { "draft".to_string() } else { String::new() },
                ]
            })
            .collect();
        write_table(
            &mut out,
            vec![
                "ID".to_string(),
                "Text".to_string(),
                "Phonetic".to_string(),
                "POS".to_string(),
                "Lang".to_string(),
                "".to_string(),
            ],
            table_rows,
        )?;
        Ok(())
    }

    #[tracing::instrument(skip(self, tags))]
    pub fn print_tags(&mut self, tags: &[Tag]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        let rows: Vec<Vec<String>> = tags
            .iter()
            .map(|tag| {
                vec![
                    self.paint(&short_id(tag.id), "33"),
                    tag.name.clone(),
                    tag.color.clone(),
                ]
            })
            .collect();
        write_table(
            &mut out,
            vec!["ID".to_string(), "Name".to_string(), "Color".to_string()],
            rows,
        )?;
        Ok(())
    }

    #[tracing::instrument(skip(self, types))]
    pub fn print_types(&mut self, types: &[TaskType]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        let rows: Vec<Vec<String>> = types
            .iter()
            .map(|task_type| {
                vec![
                    self.paint(&short_id(task_type.id), "33"),
                    task_type.name.clone(),
                    task_type.color.clone(),
                ]
            })
            .collect();
        write_table(
            &mut out,
            vec!["ID".to_string(), "Name".to_string(), "Color".to_string()],
            rows,
        )?;
        Ok(())
    }

    pub fn print_notifications(&mut self, notifications: &[Notification]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        for notification in notifications {
            let (label, code) = match notification.kind {
                NotifyKind::Success => ("ok", "32"),
                NotifyKind::Error => ("error", "31"),
                NotifyKind::Info => ("info", "34"),
                NotifyKind::Warning => ("warning", "33"),
            };
            writeln!(out, "{}: {}", self.paint(label, code), notification.message)?;
        }
        Ok(())
    }

    fn period_code(&self, period: Period) -> &'static str {
        match (self.theme, period) {
            (Theme::Light, Period::Morning) => "33",
            (Theme::Light, Period::Day) => "32",
            (Theme::Light, Period::Night) => "35",
            (Theme::Dark, Period::Morning) => "93",
            (Theme::Dark, Period::Day) => "92",
            (Theme::Dark, Period::Night) => "95",
        }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn short_id(id: Uuid) -> String {
    id.to_string().chars().take(8).collect()
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
