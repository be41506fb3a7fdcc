pub mod administration;
pub mod task_manager;
pub mod task_store;
pub mod vocabulary;

pub use administration::AdministrationPage;
pub use task_manager::TaskManagerPage;
pub use task_store::TaskStorePage;
pub use vocabulary::VocabularyPage;

use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::anyhow;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::{self, User};
use crate::cli::{self, Command, LabelCmd, PrefsCmd, TaskCmd, TodoCmd, VocabCmd};
use crate::config::{Language, Preferences, Theme};
use crate::datastore::DataStore;
use crate::daterange::{self, RangeMode};
use crate::filter::{VocabRange, VocabSort};
use crate::lifecycle::{CompletionEvent, CompletionMode};
use crate::notify::SEARCH_DEBOUNCE_MS;
use crate::render::Renderer;
use crate::task::{Period, Tag, TaskDraft, TodoType};
use crate::vocab::LanguageCode;

#[tracing::instrument(skip_all)]
pub fn dispatch(
    store: &DataStore,
    prefs: &mut Preferences,
    config_path: Option<&Path>,
    renderer: &mut Renderer,
    command: Command,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    debug!(?command, "dispatching command");

    match command {
        Command::Signup {
            user_name,
            password,
        } => {
            let user = auth::sign_up(store, &user_name, &password, now)?;
            println!("Created account {}.", user.user_name);
            Ok(())
        }
        Command::Signin {
            user_name,
            password,
        } => {
            let user = auth::sign_in(store, &user_name, &password)?;
            println!("Signed in as {}.", user.user_name);
            Ok(())
        }
        Command::Signout => {
            auth::sign_out(store)?;
            println!("Signed out.");
            Ok(())
        }
        Command::Whoami => {
            match auth::current_user(store)? {
                Some(user) => println!("{}", user.user_name),
                None => println!("not signed in"),
            }
            Ok(())
        }
        Command::Task(cmd) => {
            let user = require_user(store)?;
            task_command(store, prefs, renderer, &user, cmd, now)
        }
        Command::Todo(cmd) => {
            let user = require_user(store)?;
            todo_command(store, prefs, renderer, &user, cmd, now)
        }
        Command::Tag(cmd) => {
            let user = require_user(store)?;
            label_command(store, renderer, &user, cmd, LabelKind::Tag, now)
        }
        Command::Type(cmd) => {
            let user = require_user(store)?;
            label_command(store, renderer, &user, cmd, LabelKind::Type, now)
        }
        Command::Vocab(cmd) => {
            let user = require_user(store)?;
            vocab_command(store, prefs, renderer, &user, cmd, now)
        }
        Command::Prefs(cmd) => prefs_command(prefs, config_path, cmd),
    }
}

fn require_user(store: &DataStore) -> anyhow::Result<User> {
    auth::current_user(store)?
        .ok_or_else(|| anyhow!("not signed in; run `daybook signin` first"))
}

#[tracing::instrument(skip(store, prefs, renderer, user, cmd))]
fn task_command(
    store: &DataStore,
    prefs: &Preferences,
    renderer: &mut Renderer,
    user: &User,
    cmd: TaskCmd,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    let tz = prefs.timezone();
    let today = daterange::today_in(now, &tz);
    let mut page = TaskManagerPage::open(store, user.id, today)?;

    match cmd {
        TaskCmd::Add {
            body,
            period,
            tag,
            date,
        } => {
            let mut draft = TaskDraft::new(today);
            draft.task = body;
            draft.task_period = Period::parse(&period)?;
            draft.task_tag = resolve_tag(&page.tags, tag.as_deref())?;
            if let Some(raw) = date {
                draft.date = cli::parse_date_expr(&raw, now, &tz)?;
            }
            page.submit(store, &draft, now)?;
        }
        TaskCmd::List {
            range,
            date,
            period,
            tag,
            back,
            forward,
        } => {
            if let Some(raw) = date {
                page.set_date(cli::parse_date_expr(&raw, now, &tz)?);
            }
            if range != "day" {
                page.set_mode(RangeMode::parse(&range)?);
            }
            for _ in 0..back {
                page.retreat_range();
            }
            for _ in 0..forward {
                page.advance_range(today);
            }
            page.period = period.as_deref().map(Period::parse).transpose()?;
            page.tag = resolve_tag(&page.tags, tag.as_deref())?;
            renderer.print_task_board(&page)?;
        }
        TaskCmd::Edit {
            id,
            body,
            period,
            tag,
            date,
        } => {
            let id = resolve_id(page.tasks.iter().map(|task| task.id), &id)?;
            let mut draft = page.begin_edit(id)?;
            if let Some(body) = body {
                draft.task = body;
            }
            if let Some(raw) = period {
                draft.task_period = Period::parse(&raw)?;
            }
            if let Some(raw) = tag {
                draft.task_tag = resolve_tag(&page.tags, Some(&raw))?;
            }
            if let Some(raw) = date {
                draft.date = cli::parse_date_expr(&raw, now, &tz)?;
            }
            page.submit(store, &draft, now)?;
        }
        TaskCmd::Delete { id, yes } => {
            let id = resolve_id(page.tasks.iter().map(|task| task.id), &id)?;
            page.request_delete(id);
            if yes || prompt_confirmation(page.confirm.pending())? {
                page.confirm_delete(store, now)?;
            } else {
                page.cancel_delete();
                println!("Cancelled.");
            }
        }
    }

    renderer.print_notifications(page.notifier.active(now))?;
    Ok(())
}

#[tracing::instrument(skip(store, prefs, renderer, user, cmd))]
fn todo_command(
    store: &DataStore,
    prefs: &Preferences,
    renderer: &mut Renderer,
    user: &User,
    cmd: TodoCmd,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    let tz = prefs.timezone();
    let today = daterange::today_in(now, &tz);
    let mut page = TaskStorePage::open(store, user.id)?;

    match cmd {
        TodoCmd::Add {
            description,
            to_do_type,
            note,
            tag,
        } => {
            let draft = crate::task::StoredTaskDraft {
                description,
                note,
                to_do_type: TodoType::parse(&to_do_type)?,
                task_tag: resolve_tag(&page.tags, tag.as_deref())?,
            };
            page.save(store, &draft, now)?;
        }
        TodoCmd::List { tag, archived } => {
            page.tag_filter = resolve_tag(&page.tags, tag.as_deref())?;
            page.archived = archived;
            renderer.print_todo_board(&page)?;
        }
        TodoCmd::Edit {
            id,
            description,
            note,
            to_do_type,
            tag,
        } => {
            let id = resolve_id(page.tasks.iter().map(|task| task.id), &id)?;
            let mut draft = page.begin_edit(id)?;
            if let Some(description) = description {
                draft.description = description;
            }
            if let Some(note) = note {
                draft.note = Some(note);
            }
            if let Some(raw) = to_do_type {
                draft.to_do_type = TodoType::parse(&raw)?;
            }
            if let Some(raw) = tag {
                draft.task_tag = resolve_tag(&page.tags, Some(&raw))?;
            }
            page.save(store, &draft, now)?;
        }
        TodoCmd::Done {
            id,
            date,
            period,
            full,
            note,
        } => {
            let id = resolve_id(page.tasks.iter().map(|task| task.id), &id)?;
            let event = CompletionEvent {
                date: match date {
                    Some(raw) => cli::parse_date_expr(&raw, now, &tz)?,
                    None => today,
                },
                period: Period::parse(&period)?,
                mode: if full {
                    CompletionMode::CompleteFull
                } else {
                    CompletionMode::Complete
                },
                note,
            };
            page.complete(store, id, &event, now)?;
        }
        TodoCmd::Delete { id, yes } => {
            let id = resolve_id(page.tasks.iter().map(|task| task.id), &id)?;
            page.request_delete(id);
            if yes || prompt_confirmation(page.confirm.pending())? {
                page.confirm_delete(store, now)?;
            } else {
                page.cancel_delete();
                println!("Cancelled.");
            }
        }
    }

    renderer.print_notifications(page.notifier.active(now))?;
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum LabelKind {
    Tag,
    Type,
}

#[tracing::instrument(skip(store, renderer, user, cmd))]
fn label_command(
    store: &DataStore,
    renderer: &mut Renderer,
    user: &User,
    cmd: LabelCmd,
    kind: LabelKind,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    let mut page = AdministrationPage::open(store, user.id)?;

    match cmd {
        LabelCmd::Add { name, color } => {
            let color = color.unwrap_or_else(|| administration::PREDEFINED_COLORS[0].to_string());
            match kind {
                LabelKind::Tag => {
                    page.save_tag(store, &crate::task::TagDraft { name, color }, now)?;
                }
                LabelKind::Type => {
                    page.save_type(store, &crate::task::TaskTypeDraft { name, color }, now)?;
                }
            }
        }
        LabelCmd::List => match kind {
            LabelKind::Tag => renderer.print_tags(&page.tags)?,
            LabelKind::Type => renderer.print_types(&page.types)?,
        },
        LabelCmd::Edit { id, name, color } => match kind {
            LabelKind::Tag => {
                let id = resolve_id(page.tags.iter().map(|tag| tag.id), &id)?;
                let mut draft = page.begin_edit_tag(id)?;
                if let Some(name) = name {
                    draft.name = name;
                }
                if let Some(color) = color {
                    draft.color = color;
                }
                page.save_tag(store, &draft, now)?;
            }
            LabelKind::Type => {
                let id = resolve_id(page.types.iter().map(|task_type| task_type.id), &id)?;
                let mut draft = page.begin_edit_type(id)?;
                if let Some(name) = name {
                    draft.name = name;
                }
                if let Some(color) = color {
                    draft.color = color;
                }
                page.save_type(store, &draft, now)?;
            }
        },
        LabelCmd::Delete { id, yes } => {
            match kind {
                LabelKind::Tag => {
                    let id = resolve_id(page.tags.iter().map(|tag| tag.id), &id)?;
                    page.request_delete_tag(id);
                }
                LabelKind::Type => {
                    let id = resolve_id(page.types.iter().map(|task_type| task_type.id), &id)?;
                    page.request_delete_type(id);
                }
            }
            if yes || prompt_confirmation(page.confirm.pending())? {
                page.confirm_delete(store, now)?;
            } else {
                page.cancel_delete();
                println!("Cancelled.");
            }
        }
    }

    renderer.print_notifications(page.notifier.active(now))?;
    Ok(())
}

#[tracing::instrument(skip(store, prefs, renderer, user, cmd))]
fn vocab_command(
    store: &DataStore,
    prefs: &Preferences,
    renderer: &mut Renderer,
    user: &User,
    cmd: VocabCmd,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    let tz = prefs.timezone();
    let mut page = VocabularyPage::open(store, user.id)?;

    match cmd {
        VocabCmd::Add {
            text,
            lang,
            phonetic,
            part_of_speech,
            sentences,
            note,
            draft,
        } => {
            let draft = crate::vocab::VocabDraft {
                text,
                phonetic,
                part_of_speech,
                sentences,
                note,
                language_code: LanguageCode::parse(&lang)?,
                is_draft: draft,
            };
            page.save(store, &draft, now)?;
        }
        VocabCmd::List {
            search,
            lang,
            range,
            date,
            sort,
        } => {
            page.filter.language = LanguageCode::parse(&lang)?;
            page.filter.search = search.unwrap_or_default();
            page.filter.range = parse_vocab_range(&range, date.as_deref(), now, &tz)?;
            page.filter.sort = parse_vocab_sort(&sort)?;
            renderer.print_vocab_list(&page.visible(now, &tz))?;
        }
        VocabCmd::Search { text, lang } => {
            page.filter.language = LanguageCode::parse(&lang)?;
            page.input_search(&text, now);
            // There is no event loop here, so poll at the instant the
            // debounce delay elapses.
            page.poll_suggestions(store, now + Duration::milliseconds(SEARCH_DEBOUNCE_MS))?;
            let suggestions: Vec<&crate::vocab::VocabEntry> = page.suggestions.iter().collect();
            renderer.print_vocab_list(&suggestions)?;
        }
        VocabCmd::Edit {
            id,
            text,
            lang,
            phonetic,
            part_of_speech,
            sentences,
            note,
            draft,
        } => {
            let id = resolve_id(page.entries.iter().map(|entry| entry.id), &id)?;
            let mut edit = page.begin_edit(id)?;
            if let Some(text) = text {
                edit.text = text;
            }
            if let Some(raw) = lang {
                edit.language_code = LanguageCode::parse(&raw)?;
            }
            if let Some(phonetic) = phonetic {
                edit.phonetic = Some(phonetic);
            }
            if let Some(part_of_speech) = part_of_speech {
                edit.part_of_speech = Some(part_of_speech);
            }
            if !sentences.is_empty() {
                edit.sentences = sentences;
            }
            if let Some(note) = note {
                edit.note = Some(note);
            }
            if let Some(draft) = draft {
                edit.is_draft = draft;
            }
            page.save(store, &edit, now)?;
        }
        VocabCmd::Delete { id, yes } => {
            let id = resolve_id(page.entries.iter().map(|entry| entry.id), &id)?;
            page.request_delete(id);
            if yes || prompt_confirmation(page.confirm.pending())? {
                page.confirm_delete(store, now)?;
            } else {
                page.cancel_delete();
                println!("Cancelled.");
            }
        }
    }

    renderer.print_notifications(page.notifier.active(now))?;
    Ok(())
}

#[tracing::instrument(skip(prefs, config_path))]
fn prefs_command(
    prefs: &mut Preferences,
    config_path: Option<&Path>,
    cmd: PrefsCmd,
) -> anyhow::Result<()> {
    match cmd {
        PrefsCmd::Show => {
            println!("theme     {}", prefs.theme.as_str());
            println!("language  {}", prefs.language.as_str());
            println!("timezone  {}", prefs.timezone());
            println!("data      {}", prefs.data.clone().unwrap_or_default());
            return Ok(());
        }
        PrefsCmd::Theme { value } => {
            prefs.theme = Theme::parse(&value)?;
            println!("Theme set to {}.", prefs.theme.as_str());
        }
        PrefsCmd::Lang { value } => {
            prefs.language = Language::parse(&value)?;
            println!("Language set to {}.", prefs.language.as_str());
        }
        PrefsCmd::Timezone { value } => {
            let tz: chrono_tz::Tz = value
                .trim()
                .parse()
                .map_err(|_| anyhow!("unknown timezone id: {value}"))?;
            prefs.timezone = Some(tz.to_string());
            println!("Timezone set to {tz}.");
        }
        PrefsCmd::Data { value } => {
            prefs.data = Some(value.trim().to_string());
            println!("Data directory set.");
        }
    }

    prefs.save(config_path)?;
    info!("saved preferences");
    Ok(())
}

fn parse_vocab_range(
    raw: &str,
    date: Option<&str>,
    now: DateTime<Utc>,
    tz: &chrono_tz::Tz,
) -> anyhow::Result<VocabRange> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "all" => Ok(VocabRange::All),
        "week" => Ok(VocabRange::Week),
        "month" => Ok(VocabRange::Month),
        "date" => {
            let raw = date.ok_or_else(|| anyhow!("--range date requires --date"))?;
            Ok(VocabRange::Date(cli::parse_date_expr(raw, now, tz)?))
        }
        other => Err(anyhow!(
            "unknown vocabulary range: {other} (expected all/week/month/date)"
        )),
    }
}

fn parse_vocab_sort(raw: &str) -> anyhow::Result<VocabSort> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "alphabetical" | "alpha" => Ok(VocabSort::Alphabetical),
        "date" => Ok(VocabSort::Date),
        other => Err(anyhow!(
            "unknown sort order: {other} (expected alphabetical/date)"
        )),
    }
}

/// Resolves a full or unambiguous short id prefix against the loaded rows.
fn resolve_id(ids: impl Iterator<Item = Uuid>, raw: &str) -> anyhow::Result<Uuid> {
    let needle = raw.trim().to_ascii_lowercase();
    if let Ok(id) = needle.parse::<Uuid>() {
        return Ok(id);
    }
    if needle.is_empty() {
        return Err(anyhow!("empty id"));
    }

    let mut matches = ids.filter(|id| id.to_string().starts_with(&needle));
    let first = matches
        .next()
        .ok_or_else(|| anyhow!("no record matches id {raw}"))?;
    if matches.next().is_some() {
        return Err(anyhow!("id prefix {raw} is ambiguous"));
    }
    Ok(first)
}

fn resolve_tag(tags: &[Tag], raw: Option<&str>) -> anyhow::Result<Option<Uuid>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return Ok(None);
    }

    let tag = tags
        .iter()
        .find(|tag| tag.name.eq_ignore_ascii_case(trimmed))
        .ok_or_else(|| anyhow!("unknown tag: {trimmed}"))?;
    Ok(Some(tag.id))
}

fn prompt_confirmation(message: Option<&str>) -> anyhow::Result<bool> {
    let message = message.unwrap_or("Are you sure?");
    print!("{message} [y/N] ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes" | "Yes"))
}
