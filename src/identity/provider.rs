use tracing::{info, warn};

use super::directory::CredentialDirectory;
use super::principal::Identity;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new<U: Into<String>, P: Into<String>>(username: U, password: P) -> Self {
        Self { username: username.into(), password: password.into() }
    }
}

/// Decides whether a submitted pair denotes a known principal. Implementations never
/// touch session state; the caller stores the returned identity.
pub trait AuthProvider: Send + Sync {
    fn attempt_login(&self, req: &LoginRequest) -> AppResult<Identity>;
}

pub struct DirectoryAuthProvider {
    directory: CredentialDirectory,
}

impl DirectoryAuthProvider {
    pub fn new(directory: CredentialDirectory) -> Self { Self { directory } }

    pub fn directory(&self) -> &CredentialDirectory { &self.directory }
}

impl AuthProvider for DirectoryAuthProvider {
    fn attempt_login(&self, req: &LoginRequest) -> AppResult<Identity> {
        // Only the username is trimmed; passwords are compared verbatim.
        let username = req.username.trim();
        let matched = self.directory.find(username).filter(|r| r.verify(&req.password));
        match matched {
            Some(record) => {
                let identity = record.identity();
                info!(target: "auth", user = %identity.username, role = %identity.role, "login accepted");
                Ok(identity)
            }
            None => {
                warn!(target: "auth", user = %username, "login rejected");
                Err(AppError::invalid_credentials())
            }
        }
    }
}
