use chrono::{DateTime, Duration, Utc};

pub const DEFAULT_DURATION_MS: i64 = 4_000;
pub const SEARCH_DEBOUNCE_MS: i64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyKind {
    Success,
    Error,
    Info,
    Warning,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub kind: NotifyKind,
    pub expires_at: DateTime<Utc>,
}

/// Timed, dismissible notifications. Entries expire after a fixed
/// duration; nothing here is fatal to the process.
#[derive(Debug, Default)]
pub struct Notifier {
    items: Vec<Notification>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>, kind: NotifyKind, now: DateTime<Utc>) {
        self.items.push(Notification {
            message: message.into(),
            kind,
            expires_at: now + Duration::milliseconds(DEFAULT_DURATION_MS),
        });
    }

    pub fn success(&mut self, message: impl Into<String>, now: DateTime<Utc>) {
        self.push(message, NotifyKind::Success, now);
    }

    pub fn error(&mut self, message: impl Into<String>, now: DateTime<Utc>) {
        self.push(message, NotifyKind::Error, now);
    }

    pub fn info(&mut self, message: impl Into<String>, now: DateTime<Utc>) {
        self.push(message, NotifyKind::Info, now);
    }

    /// Drops expired entries, then returns what is still showing.
    pub fn active(&mut self, now: DateTime<Utc>) -> &[Notification] {
        self.items.retain(|item| item.expires_at > now);
        &self.items
    }

    pub fn dismiss(&mut self, index: usize) {
        if index < self.items.len() {
            self.items.remove(index);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ConfirmState {
    Idle,
    Pending { message: String },
}

/// Two-state confirmation workflow: at most one confirmation is pending
/// at a time, and it is resolved by exactly one of confirm/cancel.
/// Requesting while pending replaces the earlier request.
#[derive(Debug)]
pub struct Confirm {
    state: ConfirmState,
}

impl Confirm {
    pub fn new() -> Self {
        Self {
            state: ConfirmState::Idle,
        }
    }

    pub fn request(&mut self, message: impl Into<String>) {
        self.state = ConfirmState::Pending {
            message: message.into(),
        };
    }

    pub fn pending(&self) -> Option<&str> {
        match &self.state {
            ConfirmState::Idle => None,
            ConfirmState::Pending { message } => Some(message),
        }
    }

    /// Resolves the pending confirmation; returns whether the guarded
    /// action should run.
    pub fn confirm(&mut self) -> bool {
        let was_pending = matches!(self.state, ConfirmState::Pending { .. });
        self.state = ConfirmState::Idle;
        was_pending
    }

    pub fn cancel(&mut self) {
        self.state = ConfirmState::Idle;
    }
}

impl Default for Confirm {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
struct PendingQuery {
    query: String,
    fire_at: DateTime<Utc>,
}

/// Search-as-you-type debouncer: each keystroke cancels the previous
/// pending query and restarts the fixed delay; `poll` yields the query
/// once the delay has elapsed.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<PendingQuery>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn input(&mut self, query: &str, now: DateTime<Utc>) {
        self.pending = Some(PendingQuery {
            query: query.to_string(),
            fire_at: now + self.delay,
        });
    }

    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<String> {
        match &self.pending {
            Some(pending) if pending.fire_at <= now => {
                self.pending.take().map(|pending| pending.query)
            }
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(Duration::milliseconds(SEARCH_DEBOUNCE_MS))
    }
}
