//! Single-identity session store with a durable slot.
//!
//! The store owns at most one `Identity`. It starts out hydrating; `hydrate()` reads
//! the slot once and settles into either Authenticated or Unauthenticated. Every
//! mutation replaces the whole value and is broadcast on a watch channel so that
//! dependent views (sidebar, greeting) observe it without polling.
//!
//! Slot writes are fire-and-forget: failures are logged and never surface to the caller.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::principal::Identity;

#[derive(Debug, Error)]
pub enum SlotError {
    #[error("session slot io error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A single named durable location holding a serialized identity.
pub trait SessionSlot: Send + Sync {
    fn load(&self) -> Result<Option<String>, SlotError>;
    fn store(&self, payload: &str) -> Result<(), SlotError>;
    /// Removing an absent value is not an error.
    fn remove(&self) -> Result<(), SlotError>;
}

/// In-process slot. Survives store re-creation only when shared by clone.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    inner: std::sync::Arc<Mutex<Option<String>>>,
}

impl MemorySlot {
    pub fn new() -> Self { Self::default() }

    pub fn with_payload(payload: &str) -> Self {
        let slot = Self::default();
        *slot.inner.lock() = Some(payload.to_string());
        slot
    }

    pub fn peek(&self) -> Option<String> { self.inner.lock().clone() }
}

impl SessionSlot for MemorySlot {
    fn load(&self) -> Result<Option<String>, SlotError> { Ok(self.inner.lock().clone()) }

    fn store(&self, payload: &str) -> Result<(), SlotError> {
        *self.inner.lock() = Some(payload.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<(), SlotError> {
        self.inner.lock().take();
        Ok(())
    }
}

/// One JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self { Self { path: path.into() } }

    pub fn path(&self) -> &Path { &self.path }

    fn io_err(&self, source: std::io::Error) -> SlotError {
        SlotError::Io { path: self.path.clone(), source }
    }
}

impl SessionSlot for FileSlot {
    fn load(&self) -> Result<Option<String>, SlotError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_err(e)),
        }
    }

    fn store(&self, payload: &str) -> Result<(), SlotError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir).map_err(|e| self.io_err(e))?;
            }
        }
        std::fs::write(&self.path, payload).map_err(|e| self.io_err(e))
    }

    fn remove(&self) -> Result<(), SlotError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_err(e)),
        }
    }
}

/// Observed value of the store: `None` while hydrating, then `Some(current)`.
pub type SessionSnapshot = Option<Option<Identity>>;

pub struct SessionStore<S: SessionSlot> {
    slot: S,
    tx: watch::Sender<SessionSnapshot>,
}

impl<S: SessionSlot> SessionStore<S> {
    pub fn new(slot: S) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { slot, tx }
    }

    /// Create and immediately hydrate.
    pub fn open(slot: S) -> Self {
        let store = Self::new(slot);
        store.hydrate();
        store
    }

    /// Read the slot once. Unreadable or malformed data hydrates as logged out.
    pub fn hydrate(&self) {
        let restored = match self.slot.load() {
            Ok(Some(text)) => match serde_json::from_str::<Identity>(&text) {
                Ok(id) if id.is_well_formed() => Some(id),
                Ok(_) => {
                    warn!(target: "session", "persisted session names no user; treating as absent");
                    None
                }
                Err(e) => {
                    warn!(target: "session", error = %e, "malformed persisted session; treating as absent");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(target: "session", error = %e, "session slot unreadable; treating as absent");
                None
            }
        };
        debug!(target: "session", restored = restored.is_some(), "session hydrated");
        self.tx.send_replace(Some(restored));
    }

    pub fn is_hydrating(&self) -> bool { self.tx.borrow().is_none() }

    /// Current identity; `None` while hydrating or when logged out.
    pub fn current(&self) -> Option<Identity> {
        self.tx.borrow().clone().flatten()
    }

    pub fn set_identity(&self, identity: Identity) {
        match serde_json::to_string(&identity) {
            Ok(payload) => {
                if let Err(e) = self.slot.store(&payload) {
                    warn!(target: "session", error = %e, "failed to persist session");
                }
            }
            Err(e) => warn!(target: "session", error = %e, "failed to encode session"),
        }
        debug!(target: "session", user = %identity.username, "session set");
        self.tx.send_replace(Some(Some(identity)));
    }

    /// Idempotent.
    pub fn clear(&self) {
        if let Err(e) = self.slot.remove() {
            warn!(target: "session", error = %e, "failed to remove persisted session");
        }
        self.tx.send_replace(Some(None));
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> { self.tx.subscribe() }

    pub fn slot(&self) -> &S { &self.slot }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{EntityId, Role};

    fn anita() -> Identity {
        Identity {
            username: "districtadmin".into(),
            name: "Anita Patil".into(),
            role: Role::DistrictAdmin,
            department: "Zilla Parishad".into(),
            district: Some("Pune".into()),
            district_id: Some(EntityId::Num(521)),
            agency_id: None,
        }
    }

    #[test]
    fn starts_hydrating_until_hydrate_runs() {
        let store = SessionStore::new(MemorySlot::new());
        assert!(store.is_hydrating());
        assert_eq!(store.current(), None);
        store.hydrate();
        assert!(!store.is_hydrating());
        assert_eq!(store.current(), None);
    }

    #[test]
    fn set_identity_is_visible_immediately_and_survives_reload() {
        let slot = MemorySlot::new();
        let store = SessionStore::open(slot.clone());
        store.set_identity(anita());
        assert_eq!(store.current(), Some(anita()));

        let reloaded = SessionStore::open(slot);
        assert_eq!(reloaded.current(), Some(anita()));
    }

    #[test]
    fn clear_is_idempotent_and_survives_reload() {
        let slot = MemorySlot::new();
        let store = SessionStore::open(slot.clone());
        store.set_identity(anita());
        store.clear();
        store.clear();
        assert_eq!(store.current(), None);
        assert!(slot.peek().is_none());
        assert_eq!(SessionStore::open(slot).current(), None);
    }

    #[test]
    fn malformed_payloads_hydrate_as_logged_out() {
        for bad in ["{not json", "[]", r#"{"username":"","name":"","role":"STATE_ADMIN"}"#, r#"{"name":"x"}"#] {
            let store = SessionStore::open(MemorySlot::with_payload(bad));
            assert!(!store.is_hydrating());
            assert_eq!(store.current(), None, "payload {:?} should not authenticate", bad);
        }
    }

    #[test]
    fn subscribers_observe_transitions() {
        let store = SessionStore::new(MemorySlot::new());
        let mut rx = store.subscribe();
        assert!(rx.borrow_and_update().is_none());
        store.hydrate();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), Some(None));
        store.set_identity(anita());
        assert_eq!(rx.borrow_and_update().clone(), Some(Some(anita())));
    }

    #[test]
    fn file_slot_round_trips_and_removes() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("session.json");
        let store = SessionStore::open(FileSlot::new(&path));
        store.set_identity(anita());
        assert!(path.exists());

        let reloaded = SessionStore::open(FileSlot::new(&path));
        assert_eq!(reloaded.current(), Some(anita()));
        reloaded.clear();
        assert!(!path.exists());
        reloaded.clear();
    }
}
