use serde::Serialize;

use super::registry::{lookup, routes_for};
use crate::identity::{Identity, Role};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub path: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserBadge {
    pub username: String,
    pub name: String,
    pub role: Role,
    pub department: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
}

/// Persistent layout around a rendered screen: greeting, sidebar and the active screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavShell {
    pub greeting: String,
    pub user: UserBadge,
    pub sidebar: Vec<NavItem>,
    pub active_path: String,
    pub title: String,
}

pub fn sidebar_for(role: &Role, active_path: &str) -> Vec<NavItem> {
    routes_for(role)
        .iter()
        .map(|e| NavItem { path: e.path, label: e.label, icon: e.icon, active: e.path == active_path })
        .collect()
}

impl NavShell {
    pub fn compose(identity: &Identity, active_path: &str) -> Self {
        let title = lookup(&identity.role, active_path)
            .map(|e| e.label.to_string())
            .unwrap_or_else(|| active_path.to_string());
        NavShell {
            greeting: identity.greeting(),
            user: UserBadge {
                username: identity.username.clone(),
                name: identity.name.clone(),
                role: identity.role.clone(),
                department: identity.department.clone(),
                district: identity.district.clone(),
            },
            sidebar: sidebar_for(&identity.role, active_path),
            active_path: active_path.to_string(),
            title,
        }
    }
}
