//!
//! fundconsole HTTP server
//! -----------------------
//! Axum-based HTTP API in front of the identity and navigation layers.
//!
//! Responsibilities:
//! - Session management with a simple cookie + CSRF token model.
//! - Login/logout endpoints backed by the credential directory.
//! - View endpoints that run the route guard and return either a redirect, the
//!   login form marker, a not-found marker or the composed navigation shell.
//! - Role-scoped fund summaries for the dashboard screens.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header::{LOCATION, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::config::ConsoleConfig;
use crate::error::{AppError, AppResult};
use crate::funds::FundLedger;
use crate::identity::{AuthProvider, DirectoryAuthProvider, LoginRequest, Session, SessionManager};
use crate::navigation::{guard, home_for, routes_for, GuardDecision, NavShell, SessionView, LOGIN_PATH};

const SESSION_COOKIE: &str = "fundconsole_session";
const VIEW_PREFIX: &str = "/view";

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<dyn AuthProvider>,
    pub sessions: SessionManager,
    pub ledger: Arc<FundLedger>,
}

impl AppState {
    pub fn new(auth: Arc<dyn AuthProvider>, sessions: SessionManager, ledger: FundLedger) -> Self {
        Self { auth, sessions, ledger: Arc::new(ledger) }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "fundconsole ok" }))
        .route("/", get(root))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/csrf", get(get_csrf))
        .route("/session", get(session_info))
        .route("/nav", get(nav))
        .route("/summary", get(summary))
        .route("/view", get(view_root))
        .route("/view/", get(view_root))
        .route("/view/{*path}", get(view_path))
        .with_state(state)
}

/// Start the HTTP server using the given configuration.
pub async fn run_with_config(config: ConsoleConfig) -> anyhow::Result<()> {
    let directory = config.load_directory()?;
    let ledger = config.load_ledger()?;
    info!(
        target: "startup",
        users = directory.len(),
        ledger_records = ledger.records().len(),
        session_ttl_secs = config.session_ttl.as_secs(),
        "fundconsole state loaded"
    );

    let state = AppState::new(
        Arc::new(DirectoryAuthProvider::new(directory)),
        SessionManager::new(config.session_ttl),
        ledger,
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.http_port).parse()?;
    info!(target: "startup", "Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("While binding HTTP listener on {}", addr))?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Convenience entry point using the default configuration.
pub async fn run() -> anyhow::Result<()> {
    run_with_config(ConsoleConfig::default()).await
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginPayload { username: String, password: String }

fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie = headers.get("cookie")?;
    let s = cookie.to_str().ok()?;
    for part in s.split(';') {
        let p = part.trim();
        if let Some((k, v)) = p.split_once('=') {
            if k == name { return Some(v.to_string()); }
        }
    }
    None
}

fn current_session(state: &AppState, headers: &HeaderMap) -> Option<Session> {
    let token = parse_cookie(headers, SESSION_COOKIE)?;
    state.sessions.validate(&token)
}

fn require_session(state: &AppState, headers: &HeaderMap) -> AppResult<Session> {
    current_session(state, headers).ok_or_else(AppError::unauthenticated)
}

fn header_value(raw: &str) -> AppResult<HeaderValue> {
    HeaderValue::from_str(raw).map_err(|e| AppError::internal("header_encode".to_string(), e.to_string()))
}

fn set_session_cookie(sid: &str) -> AppResult<HeaderValue> {
    // Secure, HttpOnly cookie scoped to path / with SameSite=Strict
    header_value(&format!("{}={}; HttpOnly; Secure; SameSite=Strict; Path=/", SESSION_COOKIE, sid))
}

fn clear_session_cookie() -> AppResult<HeaderValue> {
    header_value(&format!(
        "{}=deleted; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; Secure; SameSite=Strict; Path=/",
        SESSION_COOKIE
    ))
}

async fn root() -> AppResult<Response> {
    let mut h = HeaderMap::new();
    h.insert(LOCATION, header_value(VIEW_PREFIX)?);
    Ok((StatusCode::SEE_OTHER, h).into_response())
}

pub(crate) async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<LoginPayload>, JsonRejection>,
) -> AppResult<Response> {
    let Json(payload) = payload.map_err(|rej| AppError::user("invalid_login_body".to_string(), rej.body_text()))?;
    let identity = state.auth.attempt_login(&LoginRequest::new(payload.username, payload.password))?;

    // A fresh login replaces whatever session this browser held before.
    if let Some(previous) = parse_cookie(&headers, SESSION_COOKIE) {
        state.sessions.revoke(&previous);
    }
    let redirect = home_for(&identity.role);
    let session = state.sessions.issue(identity)?;
    info!(target: "http", user = %session.identity.username, redirect, "session opened");

    let mut h = HeaderMap::new();
    h.insert(SET_COOKIE, set_session_cookie(&session.token)?);
    let body = json!({"status": "ok", "identity": session.identity, "redirect": redirect});
    Ok((StatusCode::OK, h, Json(body)).into_response())
}

pub(crate) async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    if let Some(session) = current_session(&state, &headers) {
        // Require CSRF token
        let provided = headers.get("x-csrf-token").and_then(|v| v.to_str().ok());
        if provided != Some(session.csrf.as_str()) {
            warn!(target: "http", user = %session.identity.username, "logout rejected: invalid csrf");
            return Err(AppError::csrf("invalid_csrf", "invalid csrf"));
        }
        state.sessions.revoke(&session.token);
        info!(target: "http", user = %session.identity.username, "session closed");
    }
    let mut h = HeaderMap::new();
    h.insert(SET_COOKIE, clear_session_cookie()?);
    Ok((StatusCode::OK, h, Json(json!({"status": "ok", "redirect": LOGIN_PATH}))).into_response())
}

pub(crate) async fn get_csrf(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Json<serde_json::Value>> {
    let session = require_session(&state, &headers)?;
    Ok(Json(json!({"csrf": session.csrf})))
}

pub(crate) async fn session_info(State(state): State<AppState>, headers: HeaderMap) -> Json<serde_json::Value> {
    match current_session(&state, &headers) {
        Some(s) => Json(json!({
            "authenticated": true,
            "identity": s.identity,
            "issued_at": s.issued_at.to_rfc3339(),
        })),
        None => Json(json!({"authenticated": false})),
    }
}

pub(crate) async fn nav(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Json<serde_json::Value>> {
    let session = require_session(&state, &headers)?;
    let role = &session.identity.role;
    Ok(Json(json!({
        "greeting": session.identity.greeting(),
        "home": home_for(role),
        "routes": routes_for(role),
    })))
}

pub(crate) async fn summary(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Json<serde_json::Value>> {
    let session = require_session(&state, &headers)?;
    let summary = state.ledger.summary_for(&session.identity);
    Ok(Json(json!({"status": "ok", "summary": summary})))
}

async fn view_root(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    render_view(&state, &headers, "/")
}

async fn view_path(State(state): State<AppState>, headers: HeaderMap, Path(path): Path<String>) -> AppResult<Response> {
    render_view(&state, &headers, &path)
}

pub(crate) fn render_view(state: &AppState, headers: &HeaderMap, path: &str) -> AppResult<Response> {
    let session = current_session(state, headers);
    let identity = session.as_ref().map(|s| &s.identity);
    let decision = guard(path, SessionView::from_identity(identity));
    decision_response(decision, identity)
}

fn decision_response(decision: GuardDecision, identity: Option<&crate::identity::Identity>) -> AppResult<Response> {
    let resp = match &decision {
        GuardDecision::Redirect { to } => {
            let mut h = HeaderMap::new();
            h.insert(LOCATION, header_value(&format!("{}{}", VIEW_PREFIX, to))?);
            (StatusCode::SEE_OTHER, h, Json(&decision)).into_response()
        }
        GuardDecision::ShowLogin => {
            (StatusCode::OK, Json(json!({"decision": "show_login", "view": "login"}))).into_response()
        }
        GuardDecision::Render { path } => match identity {
            Some(id) => {
                let shell = NavShell::compose(id, path);
                (StatusCode::OK, Json(json!({"decision": "render", "path": path, "shell": shell}))).into_response()
            }
            None => return Err(AppError::unauthenticated()),
        },
        GuardDecision::NotFound { .. } => (StatusCode::NOT_FOUND, Json(&decision)).into_response(),
        GuardDecision::Loading => (StatusCode::OK, Json(&decision)).into_response(),
    };
    Ok(resp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::CredentialDirectory;
    use axum::body::to_bytes;

    fn state() -> AppState {
        AppState::new(
            Arc::new(DirectoryAuthProvider::new(CredentialDirectory::builtin())),
            SessionManager::default(),
            FundLedger::sample(),
        )
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body(), 1 << 20).await.expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn cookie_from(resp: &Response) -> HeaderMap {
        let set = resp.headers().get(SET_COOKIE).expect("set-cookie").to_str().unwrap().to_string();
        let pair = set.split(';').next().unwrap().to_string();
        let mut h = HeaderMap::new();
        h.insert("cookie", HeaderValue::from_str(&pair).unwrap());
        h
    }

    async fn login_as(st: &AppState, user: &str, pass: &str) -> AppResult<Response> {
        let payload = LoginPayload { username: user.into(), password: pass.into() };
        login(State(st.clone()), HeaderMap::new(), Ok(Json(payload))).await
    }

    #[tokio::test]
    async fn login_sets_cookie_and_points_home() {
        let st = state();
        let resp = login_as(&st, "districtadmin", "123").await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let cookie = cookie_from(&resp);
        let body = body_json(resp).await;
        assert_eq!(body["redirect"], "/district/dashboard");
        assert_eq!(body["identity"]["role"], "DISTRICT_ADMIN");
        assert_eq!(body["identity"]["district"], "Pune");

        let root = render_view(&st, &cookie, "/").unwrap();
        assert_eq!(root.status(), StatusCode::SEE_OTHER);
        assert_eq!(root.headers()[LOCATION], "/view/district/dashboard");
        let login_view = render_view(&st, &cookie, "/login").unwrap();
        assert_eq!(login_view.headers()[LOCATION], "/view/district/dashboard");
    }

    #[tokio::test]
    async fn failed_logins_are_indistinguishable() {
        let st = state();
        let a = login_as(&st, "districtadmin", "wrong").await.unwrap_err().into_response();
        let b = login_as(&st, "nobody", "123").await.unwrap_err().into_response();
        assert_eq!(a.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(b.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(a).await, body_json(b).await);
        assert_eq!(st.sessions.active_count(), 0);
    }

    #[tokio::test]
    async fn anonymous_views_redirect_or_show_login() {
        let st = state();
        let none = HeaderMap::new();
        let protected = render_view(&st, &none, "state/schemes").unwrap();
        assert_eq!(protected.status(), StatusCode::SEE_OTHER);
        assert_eq!(protected.headers()[LOCATION], "/view/login");
        let form = render_view(&st, &none, "login").unwrap();
        assert_eq!(body_json(form).await["view"], "login");
        let missing = render_view(&st, &none, "nowhere").unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn render_returns_shell_and_forbidden_screens_are_not_found() {
        let st = state();
        let cookie = cookie_from(&login_as(&st, "iaadmin", "123").await.unwrap());
        let ok = render_view(&st, &cookie, "ia/vendors").unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
        let body = body_json(ok).await;
        assert_eq!(body["shell"]["title"], "Vendors");
        assert_eq!(body["shell"]["greeting"], "Welcome, Suresh Jadhav");

        let other = render_view(&st, &cookie, "state/budget").unwrap();
        assert_eq!(other.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn logout_requires_csrf_and_ends_session() {
        let st = state();
        let cookie = cookie_from(&login_as(&st, "stateadmin", "123").await.unwrap());

        let denied = logout(State(st.clone()), cookie.clone()).await.unwrap_err();
        assert_eq!(denied.http_status(), 403);

        let csrf = get_csrf(State(st.clone()), cookie.clone()).await.unwrap().0["csrf"].as_str().unwrap().to_string();
        let mut with_csrf = cookie.clone();
        with_csrf.insert("x-csrf-token", HeaderValue::from_str(&csrf).unwrap());
        let ok = logout(State(st.clone()), with_csrf).await.unwrap();
        assert_eq!(ok.status(), StatusCode::OK);

        let after = session_info(State(st.clone()), cookie.clone()).await;
        assert_eq!(after.0["authenticated"], false);
        let again = logout(State(st.clone()), HeaderMap::new()).await.unwrap();
        assert_eq!(again.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn nav_and_summary_need_a_session() {
        let st = state();
        assert_eq!(nav(State(st.clone()), HeaderMap::new()).await.unwrap_err().http_status(), 401);
        assert_eq!(summary(State(st.clone()), HeaderMap::new()).await.unwrap_err().http_status(), 401);

        let cookie = cookie_from(&login_as(&st, "districtadmin", "123").await.unwrap());
        let n = nav(State(st.clone()), cookie.clone()).await.unwrap().0;
        assert_eq!(n["home"], "/district/dashboard");
        assert_eq!(n["routes"][0]["path"], "/district/dashboard");

        let s = summary(State(st.clone()), cookie).await.unwrap().0;
        let rows = s["summary"]["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 3);
    }

    /// Serve the full router on an ephemeral port and send one raw request.
    async fn roundtrip(raw: String) -> (u16, String) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(state());
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream.write_all(raw.as_bytes()).await.unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        let text = String::from_utf8_lossy(&buf).to_string();
        let status = text.split_whitespace().nth(1).unwrap().parse().unwrap();
        let body = text.split_once("\r\n\r\n").map(|(_, b)| b.to_string()).unwrap_or_default();
        (status, body)
    }

    #[tokio::test]
    async fn view_with_trailing_slash_is_guarded_like_the_root() {
        let (status, body) = roundtrip("GET /view/ HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n".into()).await;
        assert_eq!(status, 303);
        let v: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(v, json!({"decision": "redirect", "to": "/login"}));
    }

    #[tokio::test]
    async fn malformed_login_body_gets_a_json_error() {
        let body = "{\"username\": \"stateadmin\"";
        let raw = format!(
            "POST /login HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let (status, resp) = roundtrip(raw).await;
        assert_eq!(status, 400);
        let v: serde_json::Value = serde_json::from_str(&resp).unwrap();
        assert_eq!(v["status"], "error");
        assert_eq!(v["code"], "invalid_login_body");
        assert!(v["error"].as_str().is_some_and(|e| !e.is_empty()));
    }
}
