use std::fmt::{Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Administrative tier of an identity. The four primary tiers are closed; any other
/// label is kept verbatim in `Unknown` and routed to the fallback dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    StateAdmin,
    DistrictAdmin,
    ImplementingAgency,
    ExecutingAgency,
    Unknown(String),
}

impl Role {
    pub const PRIMARY: [Role; 4] = [
        Role::StateAdmin,
        Role::DistrictAdmin,
        Role::ImplementingAgency,
        Role::ExecutingAgency,
    ];

    /// Total: never fails, unrecognized labels become `Unknown`.
    pub fn parse(label: &str) -> Role {
        match label.trim().to_ascii_uppercase().as_str() {
            "STATE_ADMIN" => Role::StateAdmin,
            "DISTRICT_ADMIN" => Role::DistrictAdmin,
            "IA_ADMIN" => Role::ImplementingAgency,
            "EA_ADMIN" => Role::ExecutingAgency,
            _ => Role::Unknown(label.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::StateAdmin => "STATE_ADMIN",
            Role::DistrictAdmin => "DISTRICT_ADMIN",
            Role::ImplementingAgency => "IA_ADMIN",
            Role::ExecutingAgency => "EA_ADMIN",
            Role::Unknown(raw) => raw.as_str(),
        }
    }

    pub fn is_known(&self) -> bool { !matches!(self, Role::Unknown(_)) }

    /// Roles scoped below the state tier carry a district.
    pub fn is_district_scoped(&self) -> bool {
        matches!(self, Role::DistrictAdmin | Role::ImplementingAgency | Role::ExecutingAgency)
    }
}

impl Default for Role {
    fn default() -> Self { Role::Unknown(String::new()) }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Role::parse(&raw))
    }
}
