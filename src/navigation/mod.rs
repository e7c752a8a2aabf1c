//! Role-to-route registry, route guard and navigation shell.

mod registry;
mod guard;
mod shell;

pub use registry::{home_for, is_known_path, is_permitted, lookup, routes_for, RouteEntry, LOGIN_PATH, ROOT_PATH};
pub use guard::{guard, normalize_path, view_of, GuardDecision, SessionView};
pub use shell::{sidebar_for, NavItem, NavShell, UserBadge};
