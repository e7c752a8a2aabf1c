//! Role-to-route registry: the static table of screens each role may reach.
//!
//! Lookups are total. Every primary role maps to a non-empty ordered list whose
//! first entry is the role's home screen; anything else gets the single generic
//! dashboard.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::identity::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RouteEntry {
    pub path: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
}

const fn entry(path: &'static str, label: &'static str, icon: &'static str) -> RouteEntry {
    RouteEntry { path, label, icon }
}

pub const LOGIN_PATH: &str = "/login";
pub const ROOT_PATH: &str = "/";

static STATE_ROUTES: &[RouteEntry] = &[
    entry("/state/dashboard", "Dashboard", "layout-dashboard"),
    entry("/state/schemes", "Schemes", "folder-kanban"),
    entry("/state/budget", "Budget Allocation", "wallet"),
    entry("/state/districts", "Districts", "map"),
    entry("/state/approvals", "Fund Release Approvals", "badge-check"),
    entry("/state/reports", "Reports", "file-bar-chart"),
];

static DISTRICT_ROUTES: &[RouteEntry] = &[
    entry("/district/dashboard", "Dashboard", "layout-dashboard"),
    entry("/district/demands", "Fund Demands", "file-input"),
    entry("/district/approvals", "Approvals", "badge-check"),
    entry("/district/allocations", "Allocations", "split"),
    entry("/district/agencies", "Implementing Agencies", "building-2"),
    entry("/district/reports", "Reports", "file-bar-chart"),
];

static IA_ROUTES: &[RouteEntry] = &[
    entry("/ia/dashboard", "Dashboard", "layout-dashboard"),
    entry("/ia/works", "Works", "hammer"),
    entry("/ia/disbursements", "Disbursements", "banknote"),
    entry("/ia/vendors", "Vendors", "store"),
    entry("/ia/utilization", "Utilization Certificates", "file-check"),
];

static EA_ROUTES: &[RouteEntry] = &[
    entry("/ea/dashboard", "Dashboard", "layout-dashboard"),
    entry("/ea/works", "Works", "hammer"),
    entry("/ea/bills", "Bills", "receipt"),
    entry("/ea/vendors", "Vendors", "store"),
    entry("/ea/disbursements", "Disbursements", "banknote"),
];

static FALLBACK_ROUTES: &[RouteEntry] = &[entry("/dashboard", "Dashboard", "layout-dashboard")];

static KNOWN_PATHS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [STATE_ROUTES, DISTRICT_ROUTES, IA_ROUTES, EA_ROUTES, FALLBACK_ROUTES]
        .iter()
        .flat_map(|table| table.iter().map(|e| e.path))
        .collect()
});

pub fn routes_for(role: &Role) -> &'static [RouteEntry] {
    match role {
        Role::StateAdmin => STATE_ROUTES,
        Role::DistrictAdmin => DISTRICT_ROUTES,
        Role::ImplementingAgency => IA_ROUTES,
        Role::ExecutingAgency => EA_ROUTES,
        Role::Unknown(_) => FALLBACK_ROUTES,
    }
}

/// Single home-redirect policy shared by the root path and the login path.
pub fn home_for(role: &Role) -> &'static str {
    // Every table is non-empty; the fallback path covers the impossible case.
    routes_for(role).first().map(|e| e.path).unwrap_or(FALLBACK_ROUTES[0].path)
}

pub fn is_permitted(role: &Role, path: &str) -> bool {
    routes_for(role).iter().any(|e| e.path == path)
}

/// True when some role (or the fallback) can reach `path`.
pub fn is_known_path(path: &str) -> bool {
    KNOWN_PATHS.contains(path)
}

pub fn lookup(role: &Role, path: &str) -> Option<&'static RouteEntry> {
    routes_for(role).iter().find(|e| e.path == path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_roles_have_routes_and_home_is_first() {
        for role in Role::PRIMARY.iter() {
            let routes = routes_for(role);
            assert!(!routes.is_empty(), "{} has no routes", role);
            assert_eq!(routes[0].path, home_for(role));
            assert!(is_permitted(role, home_for(role)));
        }
    }

    #[test]
    fn unknown_role_gets_single_fallback() {
        for role in [Role::Unknown("AUDITOR".into()), Role::Unknown(String::new()), Role::default()] {
            let routes = routes_for(&role);
            assert_eq!(routes.len(), 1);
            assert_eq!(routes[0].path, "/dashboard");
            assert_eq!(home_for(&role), "/dashboard");
        }
    }

    #[test]
    fn tiers_see_their_own_screens() {
        assert!(is_permitted(&Role::DistrictAdmin, "/district/approvals"));
        assert!(is_permitted(&Role::DistrictAdmin, "/district/allocations"));
        assert!(is_permitted(&Role::ImplementingAgency, "/ia/disbursements"));
        assert!(is_permitted(&Role::ExecutingAgency, "/ea/vendors"));
        assert!(!is_permitted(&Role::DistrictAdmin, "/state/budget"));
        assert!(!is_permitted(&Role::StateAdmin, "/dashboard"));
    }

    #[test]
    fn role_tables_are_distinct_and_paths_unique() {
        let homes: HashSet<&str> = Role::PRIMARY.iter().map(home_for).collect();
        assert_eq!(homes.len(), 4);
        for role in Role::PRIMARY.iter() {
            let paths: HashSet<&str> = routes_for(role).iter().map(|e| e.path).collect();
            assert_eq!(paths.len(), routes_for(role).len());
        }
    }

    #[test]
    fn known_paths_cover_every_table() {
        assert!(is_known_path("/state/reports"));
        assert!(is_known_path("/dashboard"));
        assert!(!is_known_path("/login"));
        assert!(!is_known_path("/nowhere"));
    }
}
