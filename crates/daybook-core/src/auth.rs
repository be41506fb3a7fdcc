use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::datastore::{DataStore, Record};

/// Local stand-in for the hosted auth service. The hosted service owns
/// real credential handling; this keeps the same surface so pages and
/// the CLI can be exercised against the local store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub user_name: String,
    pub password: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl Record for User {
    const TABLE: &'static str = "user";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Uuid {
        self.id
    }
}

#[tracing::instrument(skip(store, password))]
pub fn sign_up(
    store: &DataStore,
    user_name: &str,
    password: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<User> {
    let user_name = user_name.trim();
    if user_name.is_empty() {
        return Err(anyhow!("user name must not be empty"));
    }
    if password.is_empty() {
        return Err(anyhow!("password must not be empty"));
    }

    let existing: Vec<User> = store.list_all()?;
    if existing
        .iter()
        .any(|user| user.user_name.eq_ignore_ascii_case(user_name))
    {
        return Err(anyhow!("user name already taken: {user_name}"));
    }

    let user = User {
        id: Uuid::new_v4(),
        user_name: user_name.to_string(),
        password: password.to_string(),
        is_admin: false,
        created_at: now,
    };
    store.insert(&user)?;
    info!(user = %user.user_name, "signed up");
    Ok(user)
}

#[tracing::instrument(skip(store, password))]
pub fn sign_in(store: &DataStore, user_name: &str, password: &str) -> anyhow::Result<User> {
    let users: Vec<User> = store.list_all()?;
    let user = users
        .into_iter()
        .find(|user| user.user_name == user_name.trim() && user.password == password)
        .ok_or_else(|| anyhow!("invalid user name or password"))?;

    store.set_active_session(Some(user.id))?;
    info!(user = %user.user_name, "signed in");
    Ok(user)
}

#[tracing::instrument(skip(store))]
pub fn sign_out(store: &DataStore) -> anyhow::Result<()> {
    store.set_active_session(None)?;
    info!("signed out");
    Ok(())
}

#[tracing::instrument(skip(store))]
pub fn current_user(store: &DataStore) -> anyhow::Result<Option<User>> {
    let Some(id) = store.active_session()? else {
        return Ok(None);
    };

    let users: Vec<User> = store.list_all()?;
    let found = users.into_iter().find(|user| user.id == id);
    if found.is_none() {
        warn!(%id, "session references a missing user; clearing");
        store.set_active_session(None)?;
    }
    Ok(found)
}

pub const PROTECTED_PATHS: [&str; 4] = [
    "/task-manager",
    "/administration",
    "/task-store",
    "/vocabulary",
];

pub const PUBLIC_PATHS: [&str; 4] = ["/", "/sign-in", "/sign-up", "/forgot-password"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect(String),
}

/// Route guard: unauthenticated access to a protected path redirects to
/// sign-in, preserving the original query string; a signed-in user
/// landing on the auth pages is bounced to the task board; unknown
/// paths go home.
pub fn guard(path: &str, query: Option<&str>, signed_in: bool) -> RouteDecision {
    if signed_in && (path == "/sign-in" || path == "/sign-up") {
        return RouteDecision::Redirect("/task-manager".to_string());
    }

    if PROTECTED_PATHS.contains(&path) {
        if signed_in {
            return RouteDecision::Allow;
        }
        let target = match query {
            Some(q) if !q.is_empty() => format!("/sign-in?{q}"),
            _ => "/sign-in".to_string(),
        };
        return RouteDecision::Redirect(target);
    }

    if PUBLIC_PATHS.contains(&path) {
        return RouteDecision::Allow;
    }

    RouteDecision::Redirect("/".to_string())
}
