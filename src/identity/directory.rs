//! Static credential directory used to validate login attempts.
//! Entries are fixed at startup: either the built-in set or a JSON file named by configuration.

use std::collections::HashSet;
use std::path::Path;

use argon2::{Argon2, PasswordVerifier};
use password_hash::PasswordHash;
use serde::{Deserialize, Serialize};

use super::principal::{EntityId, Identity};
use super::role::Role;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialRecord {
    pub username: String,
    /// Plaintext secret, compared with exact string equality.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Argon2 PHC string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    pub role: Role,
    pub name: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub district_id: Option<EntityId>,
    #[serde(default)]
    pub agency_id: Option<EntityId>,
}

impl CredentialRecord {
    fn plain(username: &str, password: &str, role: Role, name: &str, department: &str, district: Option<&str>) -> Self {
        CredentialRecord {
            username: username.to_string(),
            password: Some(password.to_string()),
            password_hash: None,
            role,
            name: name.to_string(),
            department: department.to_string(),
            district: district.map(str::to_string),
            district_id: None,
            agency_id: None,
        }
    }

    pub fn verify(&self, password: &str) -> bool {
        if let Some(hash) = &self.password_hash {
            return verify_password(hash, password);
        }
        match &self.password {
            Some(expected) => expected == password,
            None => false,
        }
    }

    pub fn identity(&self) -> Identity {
        Identity {
            username: self.username.clone(),
            name: self.name.clone(),
            role: self.role.clone(),
            department: self.department.clone(),
            district: self.district.clone(),
            district_id: self.district_id.clone(),
            agency_id: self.agency_id.clone(),
        }
    }
}

fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        let argon2 = Argon2::default();
        argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    } else { false }
}

#[derive(Debug, Clone, Default)]
pub struct CredentialDirectory {
    records: Vec<CredentialRecord>,
}

impl CredentialDirectory {
    pub fn new(records: Vec<CredentialRecord>) -> AppResult<Self> {
        let mut seen = HashSet::new();
        for r in &records {
            if r.username.trim().is_empty() {
                return Err(AppError::config("directory_invalid", "directory entry with empty username"));
            }
            if r.password.is_none() && r.password_hash.is_none() {
                return Err(AppError::config(
                    "directory_invalid".to_string(),
                    format!("directory entry '{}' has neither password nor password_hash", r.username),
                ));
            }
            if !seen.insert(r.username.as_str()) {
                return Err(AppError::config(
                    "directory_invalid".to_string(),
                    format!("duplicate directory entry '{}'", r.username),
                ));
            }
        }
        Ok(Self { records })
    }

    /// The fixed directory shipped with the console: one entry per primary tier.
    pub fn builtin() -> Self {
        let mut district = CredentialRecord::plain(
            "districtadmin", "123", Role::DistrictAdmin, "Anita Patil", "Zilla Parishad", Some("Pune"),
        );
        district.district_id = Some(EntityId::Num(521));

        let mut ia = CredentialRecord::plain(
            "iaadmin", "123", Role::ImplementingAgency, "Suresh Jadhav", "Public Works Department", Some("Pune"),
        );
        ia.district_id = Some(EntityId::Num(521));
        ia.agency_id = Some(EntityId::Code("IA-PWD-014".into()));

        let mut ea = CredentialRecord::plain(
            "eaadmin", "123", Role::ExecutingAgency, "Meera Deshmukh", "Rural Water Supply", Some("Nashik"),
        );
        ea.district_id = Some(EntityId::Num(516));
        ea.agency_id = Some(EntityId::Code("EA-RWS-007".into()));

        let records = vec![
            CredentialRecord::plain("stateadmin", "123", Role::StateAdmin, "Rajesh Kulkarni", "Finance Department", None),
            district,
            ia,
            ea,
        ];
        Self { records }
    }

    pub fn from_json_str(text: &str) -> AppResult<Self> {
        let records: Vec<CredentialRecord> = serde_json::from_str(text)
            .map_err(|e| AppError::config("directory_parse".to_string(), format!("invalid directory JSON: {}", e)))?;
        Self::new(records)
    }

    pub fn from_json_file(path: &Path) -> AppResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AppError::config("directory_read".to_string(), format!("cannot read directory {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&text)
    }

    /// Exact, case-sensitive username lookup.
    pub fn find(&self, username: &str) -> Option<&CredentialRecord> {
        self.records.iter().find(|r| r.username == username)
    }

    pub fn len(&self) -> usize { self.records.len() }

    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    pub fn usernames(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.username.as_str())
    }
}
