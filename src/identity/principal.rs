use serde::{Deserialize, Serialize};

use super::role::Role;

/// District or agency identifier; the directory carries both numeric and coded ids.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum EntityId {
    Num(u64),
    Code(String),
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityId::Num(n) => write!(f, "{}", n),
            EntityId::Code(s) => f.write_str(s),
        }
    }
}

/// The authenticated principal held for the duration of a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub department: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agency_id: Option<EntityId>,
}

impl Identity {
    pub fn greeting(&self) -> String {
        format!("Welcome, {}", self.name)
    }

    /// A persisted identity is only usable when it names somebody.
    pub fn is_well_formed(&self) -> bool {
        !self.username.trim().is_empty() && !self.name.trim().is_empty()
    }
}
