//! Identity, credential directory, authentication and session state for the console.
//! Keep the public surface thin and split implementation across sub-modules.

mod role;
mod principal;
mod directory;
mod provider;
mod store;
mod session;

pub use role::Role;
pub use principal::{EntityId, Identity};
pub use directory::{CredentialDirectory, CredentialRecord};
pub use provider::{AuthProvider, DirectoryAuthProvider, LoginRequest};
pub use store::{FileSlot, MemorySlot, SessionSlot, SessionSnapshot, SessionStore, SlotError};
pub use session::{Session, SessionManager, SessionToken, MAX_SESSION_TTL};
