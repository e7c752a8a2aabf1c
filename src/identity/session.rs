use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::Engine;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use crate::error::{AppError, AppResult};
use crate::tprintln;

use super::principal::Identity;

/// Upper bound on session lifetime; longer configured values are clamped.
pub const MAX_SESSION_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

pub type SessionToken = String;

/// Server-side record behind one browser cookie.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: SessionToken,
    pub csrf: String,
    pub identity: Identity,
    pub issued_at: DateTime<Utc>,
    pub expires_at: Instant,
}

fn gen_id() -> AppResult<String> {
    // 256-bit random token, base64url without padding
    let mut buf = [0u8; 32];
    getrandom::getrandom(&mut buf).map_err(|e| AppError::internal("rng_unavailable".to_string(), e.to_string()))?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf))
}

/// Cookie-keyed sessions for the HTTP frontend. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SessionManager {
    ttl: Duration,
    sessions: Arc<RwLock<HashMap<SessionToken, Session>>>,
}

impl Default for SessionManager {
    fn default() -> Self { Self::new(Duration::from_secs(60 * 60)) }
}

impl SessionManager {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl: ttl.min(MAX_SESSION_TTL), sessions: Arc::new(RwLock::new(HashMap::new())) }
    }

    pub fn ttl(&self) -> Duration { self.ttl }

    /// Open a session. Expired entries left behind by abandoned browsers are swept first.
    pub fn issue(&self, identity: Identity) -> AppResult<Session> {
        let now = Instant::now();
        let expires_at = now
            .checked_add(self.ttl)
            .ok_or_else(|| AppError::internal("session_ttl".to_string(), format!("ttl of {}s overflows", self.ttl.as_secs())))?;
        let sess = Session { token: gen_id()?, csrf: gen_id()?, identity, issued_at: Utc::now(), expires_at };
        {
            let mut map = self.sessions.write();
            map.retain(|_, s| s.expires_at > now);
            map.insert(sess.token.clone(), sess.clone());
        }
        tprintln!("session.issue user={} ttl_secs={}", sess.identity.username, self.ttl.as_secs());
        Ok(sess)
    }

    /// Live session for a token; expired entries are dropped on sight.
    pub fn validate(&self, token: &str) -> Option<Session> {
        let now = Instant::now();
        let expired = {
            let map = self.sessions.read();
            match map.get(token) {
                Some(s) if s.expires_at > now => return Some(s.clone()),
                Some(_) => true,
                None => false,
            }
        };
        if expired {
            self.sessions.write().remove(token);
        }
        None
    }

    pub fn revoke(&self, token: &str) -> bool {
        self.sessions.write().remove(token).is_some()
    }

    pub fn active_count(&self) -> usize { self.sessions.read().len() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Role;

    fn ident() -> Identity {
        Identity { username: "stateadmin".into(), name: "Rajesh Kulkarni".into(), role: Role::StateAdmin, ..Default::default() }
    }

    #[test]
    fn issue_then_validate_then_revoke() {
        let sm = SessionManager::default();
        let s = sm.issue(ident()).unwrap();
        assert_ne!(s.token, s.csrf);
        assert_eq!(sm.validate(&s.token).map(|v| v.identity), Some(ident()));
        assert!(sm.revoke(&s.token));
        assert!(!sm.revoke(&s.token));
        assert!(sm.validate(&s.token).is_none());
    }

    #[test]
    fn expired_sessions_are_dropped() {
        let sm = SessionManager::new(Duration::from_millis(0));
        let s = sm.issue(ident()).unwrap();
        assert!(sm.validate(&s.token).is_none());
        assert_eq!(sm.active_count(), 0);
    }

    #[test]
    fn clones_share_sessions() {
        let sm = SessionManager::default();
        let other = sm.clone();
        let s = sm.issue(ident()).unwrap();
        assert!(other.validate(&s.token).is_some());
    }

    #[test]
    fn abandoned_sessions_are_swept_on_issue() {
        let sm = SessionManager::new(Duration::ZERO);
        for _ in 0..1000 {
            sm.issue(ident()).unwrap();
        }
        assert!(sm.active_count() <= 1);
    }

    #[test]
    fn huge_ttl_is_clamped_instead_of_overflowing() {
        let sm = SessionManager::new(Duration::from_secs(u64::MAX));
        assert_eq!(sm.ttl(), MAX_SESSION_TTL);
        let s = sm.issue(ident()).unwrap();
        assert!(sm.validate(&s.token).is_some());
    }

    #[test]
    fn tokens_are_distinct_per_session() {
        let sm = SessionManager::default();
        let a = sm.issue(ident()).unwrap();
        let b = sm.issue(ident()).unwrap();
        assert_ne!(a.token, b.token);
        assert_ne!(a.csrf, b.csrf);
        assert_eq!(sm.active_count(), 2);
    }
}
