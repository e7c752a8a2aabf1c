//! Route guard: the access decision taken before any screen is rendered.

use serde::Serialize;
use tracing::debug;

use super::registry::{home_for, is_known_path, is_permitted, LOGIN_PATH, ROOT_PATH};
use crate::identity::{Identity, SessionSlot, SessionStore};

/// What the guard knows about the caller.
#[derive(Debug, Clone, Copy)]
pub enum SessionView<'a> {
    /// Persisted session not read yet; no decision may be taken.
    Hydrating,
    Anonymous,
    Authenticated(&'a Identity),
}

impl<'a> SessionView<'a> {
    pub fn from_identity(identity: Option<&'a Identity>) -> Self {
        match identity {
            Some(id) => SessionView::Authenticated(id),
            None => SessionView::Anonymous,
        }
    }

    pub fn identity(&self) -> Option<&'a Identity> {
        match *self {
            SessionView::Authenticated(id) => Some(id),
            _ => None,
        }
    }
}

/// Borrow a view of a session store. `current` must outlive the view, so the
/// caller holds the cloned identity.
pub fn view_of<'a, S: SessionSlot>(store: &SessionStore<S>, current: &'a Option<Identity>) -> SessionView<'a> {
    if store.is_hydrating() {
        SessionView::Hydrating
    } else {
        SessionView::from_identity(current.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GuardDecision {
    Loading,
    ShowLogin,
    Redirect { to: String },
    Render { path: String },
    NotFound { path: String },
}

/// Strip a trailing slash and collapse empty input to the root.
pub fn normalize_path(raw: &str) -> String {
    let trimmed = raw.trim();
    let with_lead = if trimmed.starts_with('/') { trimmed.to_string() } else { format!("/{}", trimmed) };
    let stripped = with_lead.trim_end_matches('/');
    if stripped.is_empty() { ROOT_PATH.to_string() } else { stripped.to_string() }
}

/// Home for an authenticated caller, login otherwise. Used for both `/` and `/login`.
fn home_redirect(identity: Option<&Identity>) -> GuardDecision {
    match identity {
        Some(id) => GuardDecision::Redirect { to: home_for(&id.role).to_string() },
        None => GuardDecision::Redirect { to: LOGIN_PATH.to_string() },
    }
}

pub fn guard(raw_path: &str, view: SessionView<'_>) -> GuardDecision {
    let path = normalize_path(raw_path);
    let decision = match (path.as_str(), view) {
        (_, SessionView::Hydrating) if path == LOGIN_PATH || path == ROOT_PATH || is_known_path(&path) => {
            GuardDecision::Loading
        }
        (LOGIN_PATH, SessionView::Anonymous) => GuardDecision::ShowLogin,
        (LOGIN_PATH, v) | (ROOT_PATH, v) => home_redirect(v.identity()),
        (p, _) if !is_known_path(p) => GuardDecision::NotFound { path: path.clone() },
        (_, SessionView::Anonymous) => GuardDecision::Redirect { to: LOGIN_PATH.to_string() },
        (p, SessionView::Authenticated(id)) if is_permitted(&id.role, p) => GuardDecision::Render { path: path.clone() },
        _ => GuardDecision::NotFound { path: path.clone() },
    };
    debug!(target: "guard", path = %path, ?decision, "route decision");
    decision
}
