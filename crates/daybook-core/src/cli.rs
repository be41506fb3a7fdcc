use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, anyhow};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use clap::{ArgAction, Parser, Subcommand};
use regex::Regex;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::daterange::today_in;

#[derive(Parser, Debug)]
#[command(
    name = "daybook",
    version,
    about = "Daybook: period-bucketed task log, typed to-do store, and vocabulary notebook",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,

    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    #[arg(long = "data")]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an account
    Signup { user_name: String, password: String },

    /// Sign in and persist the session
    Signin { user_name: String, password: String },

    /// Clear the persisted session
    Signout,

    /// Show the signed-in user
    Whoami,

    /// The task board: period-bucketed log entries
    #[command(subcommand)]
    Task(TaskCmd),

    /// The to-do store: typed items completed into log entries
    #[command(subcommand)]
    Todo(TodoCmd),

    /// Tag administration
    #[command(subcommand)]
    Tag(LabelCmd),

    /// Task type administration
    #[command(subcommand)]
    Type(LabelCmd),

    /// The vocabulary notebook
    #[command(subcommand)]
    Vocab(VocabCmd),

    /// Show or change preferences
    #[command(subcommand)]
    Prefs(PrefsCmd),
}

#[derive(Subcommand, Debug)]
pub enum TaskCmd {
    Add {
        body: String,
        #[arg(long, default_value = "morning")]
        period: String,
        #[arg(long)]
        tag: Option<String>,
        #[arg(long)]
        date: Option<String>,
    },
    List {
        #[arg(long, default_value = "day")]
        range: String,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        period: Option<String>,
        #[arg(long)]
        tag: Option<String>,
        /// Move the window back N units before listing
        #[arg(long, default_value_t = 0)]
        back: u32,
        /// Move the window forward N units (clamped at today)
        #[arg(long, default_value_t = 0)]
        forward: u32,
    },
    Edit {
        id: String,
        #[arg(long)]
        body: Option<String>,
        #[arg(long)]
        period: Option<String>,
        #[arg(long)]
        tag: Option<String>,
        #[arg(long)]
        date: Option<String>,
    },
    Delete {
        id: String,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum TodoCmd {
    Add {
        description: String,
        #[arg(long = "type", default_value = "one_time")]
        to_do_type: String,
        #[arg(long)]
        note: Option<String>,
        #[arg(long)]
        tag: Option<String>,
    },
    List {
        #[arg(long)]
        tag: Option<String>,
        #[arg(long)]
        archived: bool,
    },
    Edit {
        id: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        note: Option<String>,
        #[arg(long = "type")]
        to_do_type: Option<String>,
        #[arg(long)]
        tag: Option<String>,
    },
    /// Mark a to-do done, logging it onto the task board
    Done {
        id: String,
        #[arg(long)]
        date: Option<String>,
        #[arg(long, default_value = "morning")]
        period: String,
        /// Fully complete a progress to-do instead of logging an update
        #[arg(long)]
        full: bool,
        #[arg(long)]
        note: Option<String>,
    },
    Delete {
        id: String,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum LabelCmd {
    Add {
        name: String,
        #[arg(long)]
        color: Option<String>,
    },
    List,
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    Delete {
        id: String,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum VocabCmd {
    Add {
        text: String,
        #[arg(long, default_value = "en")]
        lang: String,
        #[arg(long)]
        phonetic: Option<String>,
        #[arg(long = "pos")]
        part_of_speech: Option<String>,
        #[arg(long = "sentence")]
        sentences: Vec<String>,
        #[arg(long)]
        note: Option<String>,
        #[arg(long)]
        draft: bool,
    },
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value = "en")]
        lang: String,
        #[arg(long, default_value = "all")]
        range: String,
        #[arg(long)]
        date: Option<String>,
        #[arg(long, default_value = "alphabetical")]
        sort: String,
    },
    /// Debounced suggestion lookup, as the entry form runs it
    Search {
        text: String,
        #[arg(long, default_value = "en")]
        lang: String,
    },
    Edit {
        id: String,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        lang: Option<String>,
        #[arg(long)]
        phonetic: Option<String>,
        #[arg(long = "pos")]
        part_of_speech: Option<String>,
        #[arg(long = "sentence")]
        sentences: Vec<String>,
        #[arg(long)]
        note: Option<String>,
        #[arg(long)]
        draft: Option<bool>,
    },
    Delete {
        id: String,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum PrefsCmd {
    Show,
    Theme { value: String },
    Lang { value: String },
    Timezone { value: String },
    Data { value: String },
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// Calendar-date expressions accepted on the command line: today,
/// yesterday, tomorrow, +Nd/-Nd relative to today, or YYYY-MM-DD.
pub fn parse_date_expr(input: &str, now: DateTime<Utc>, tz: &Tz) -> anyhow::Result<NaiveDate> {
    let token = input.trim();
    let today = today_in(now, tz);

    match token.to_ascii_lowercase().as_str() {
        "today" => return Ok(today),
        "yesterday" => {
            return today
                .checked_sub_days(chrono::Days::new(1))
                .ok_or_else(|| anyhow!("date out of range"));
        }
        "tomorrow" => {
            return today
                .checked_add_days(chrono::Days::new(1))
                .ok_or_else(|| anyhow!("date out of range"));
        }
        _ => {}
    }

    let rel_re = Regex::new(r"^(?P<sign>[+-])(?P<num>\d+)d$")
        .map_err(|e| anyhow!("internal regex compile failure: {e}"))?;
    if let Some(caps) = rel_re.captures(token) {
        let num: i64 = caps
            .name("num")
            .map(|m| m.as_str())
            .ok_or_else(|| anyhow!("missing relative amount"))?
            .parse()
            .context("invalid relative number")?;
        let days = if caps.name("sign").map(|m| m.as_str()) == Some("-") {
            -num
        } else {
            num
        };
        return today
            .checked_add_signed(Duration::days(days))
            .ok_or_else(|| anyhow!("date out of range"));
    }

    NaiveDate::parse_from_str(token, "%Y-%m-%d")
        .map_err(|_| anyhow!("unrecognized date expression: {input}"))
        .context("supported formats: today/yesterday/tomorrow, +Nd/-Nd, YYYY-MM-DD")
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::parse_date_expr;

    #[test]
    fn parses_calendar_and_relative_dates() {
        let tz = chrono_tz::UTC;
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).single().expect("now");
        let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).expect("valid date");

        assert_eq!(parse_date_expr("today", now, &tz).expect("parse"), date(2024, 3, 10));
        assert_eq!(
            parse_date_expr("yesterday", now, &tz).expect("parse"),
            date(2024, 3, 9)
        );
        assert_eq!(parse_date_expr("-7d", now, &tz).expect("parse"), date(2024, 3, 3));
        assert_eq!(parse_date_expr("+1d", now, &tz).expect("parse"), date(2024, 3, 11));
        assert_eq!(
            parse_date_expr("2024-02-29", now, &tz).expect("parse"),
            date(2024, 2, 29)
        );
        assert!(parse_date_expr("soonish", now, &tz).is_err());
    }

    #[test]
    fn today_follows_the_timezone() {
        let tz: chrono_tz::Tz = "Asia/Dhaka".parse().expect("tz");
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 20, 0, 0).single().expect("now");
        // 20:00 UTC is already past midnight in Dhaka (UTC+6).
        assert_eq!(
            parse_date_expr("today", now, &tz).expect("parse"),
            NaiveDate::from_ymd_opt(2024, 3, 11).expect("valid date")
        );
    }
}
