//! Interactive terminal console over a durable session store.
//!
//! The console plays the browser's role: it hydrates the session from its slot on
//! start, runs the route guard on every `go`, follows redirects and renders the
//! navigation shell as text.

mod table;

pub use table::{format_amount, render_table};

use std::fmt::Write as _;

use crate::funds::FundLedger;
use crate::identity::{AuthProvider, Identity, LoginRequest, SessionSlot, SessionStore};
use crate::navigation::{guard, home_for, routes_for, view_of, GuardDecision, NavShell, LOGIN_PATH};

/// Redirect chains are at most two hops (`/` -> `/login` -> home); anything longer is a bug.
const MAX_REDIRECTS: usize = 4;

pub const HELP: &str = "commands:
  login <user> <password>   authenticate against the credential directory
  logout                    end the session
  whoami                    show the current identity
  routes                    list screens available to the current role
  go <path>                 navigate to a screen
  summary                   scheme-wise fund summary for your scope
  help                      show this help
  quit | exit               leave the console";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub quit: bool,
}

impl Reply {
    fn text<S: Into<String>>(s: S) -> Self { Reply { text: s.into(), quit: false } }
}

pub struct Console<S: SessionSlot> {
    store: SessionStore<S>,
    auth: Box<dyn AuthProvider>,
    ledger: FundLedger,
    location: String,
}

impl<S: SessionSlot> Console<S> {
    /// Hydrates `store` if that has not happened yet.
    pub fn new(store: SessionStore<S>, auth: Box<dyn AuthProvider>, ledger: FundLedger) -> Self {
        if store.is_hydrating() {
            store.hydrate();
        }
        Self { store, auth, ledger, location: LOGIN_PATH.to_string() }
    }

    pub fn store(&self) -> &SessionStore<S> { &self.store }

    pub fn location(&self) -> &str { &self.location }

    pub fn prompt(&self) -> String {
        match self.store.current() {
            Some(id) => format!("{}@{}> ", id.username, self.location),
            None => "> ".to_string(),
        }
    }

    /// Resolve the start screen the same way a fresh page load at `/` would.
    pub fn start(&mut self) -> Reply {
        let greeting = self.store.current().map(|id| format!("{}\n", id.greeting())).unwrap_or_default();
        let landing = self.navigate("/");
        Reply::text(format!("{}{}", greeting, landing))
    }

    pub fn execute(&mut self, line: &str) -> Reply {
        let mut parts = line.split_whitespace();
        let Some(cmd) = parts.next() else { return Reply::text(""); };
        let args: Vec<&str> = parts.collect();
        match cmd.to_ascii_lowercase().as_str() {
            "quit" | "exit" => Reply { text: "bye".into(), quit: true },
            "help" => Reply::text(HELP),
            "login" => self.login(&args),
            "logout" => self.logout(),
            "whoami" => Reply::text(self.whoami()),
            "routes" => Reply::text(self.routes()),
            "go" => match args.first() {
                Some(path) => Reply::text(self.navigate(path)),
                None => Reply::text("usage: go <path>"),
            },
            "summary" => Reply::text(self.summary()),
            other => Reply::text(format!("unknown command '{}'; type 'help'", other)),
        }
    }

    fn login(&mut self, args: &[&str]) -> Reply {
        if args.len() != 2 {
            return Reply::text("usage: login <user> <password>");
        }
        match self.auth.attempt_login(&LoginRequest::new(args[0], args[1])) {
            Ok(identity) => {
                let greeting = identity.greeting();
                self.store.set_identity(identity);
                // Land on the role home, not on whatever was requested before login.
                let landing = self.navigate(LOGIN_PATH);
                Reply::text(format!("{}\n{}", greeting, landing))
            }
            Err(e) => Reply::text(e.message()),
        }
    }

    fn logout(&mut self) -> Reply {
        let who = self.store.current().map(|id| id.username);
        self.store.clear();
        self.location = LOGIN_PATH.to_string();
        match who {
            Some(u) => Reply::text(format!("logged out {}", u)),
            None => Reply::text("not logged in"),
        }
    }

    fn whoami(&self) -> String {
        match self.store.current() {
            Some(id) => describe(&id),
            None => "not logged in".to_string(),
        }
    }

    fn routes(&self) -> String {
        match self.store.current() {
            Some(id) => {
                let rows: Vec<Vec<String>> = routes_for(&id.role)
                    .iter()
                    .map(|e| {
                        let marker = if e.path == self.location { "*" } else { "" };
                        vec![marker.to_string(), e.path.to_string(), e.label.to_string(), e.icon.to_string()]
                    })
                    .collect();
                render_table(&["", "path", "label", "icon"], &rows)
            }
            None => "not logged in".to_string(),
        }
    }

    fn summary(&self) -> String {
        let Some(id) = self.store.current() else { return "not logged in".to_string(); };
        let summary = self.ledger.summary_for(&id);
        if summary.rows.is_empty() {
            return "no fund records in your scope".to_string();
        }
        let to_row = |r: &crate::funds::SchemeSummary| {
            vec![
                r.scheme.clone(),
                r.districts.to_string(),
                format_amount(r.demanded),
                format_amount(r.allocated),
                format_amount(r.released),
                format_amount(r.pending),
            ]
        };
        let mut rows: Vec<Vec<String>> = summary.rows.iter().map(|r| to_row(r)).collect();
        rows.push(to_row(&summary.totals));
        render_table(&["scheme", "districts", "demanded", "allocated", "released", "pending"], &rows)
    }

    /// Run the guard for `path`, following redirects, and render the outcome.
    pub fn navigate(&mut self, path: &str) -> String {
        let mut target = path.to_string();
        let mut trail = String::new();
        for _ in 0..MAX_REDIRECTS {
            let current = self.store.current();
            let decision = guard(&target, view_of(&self.store, &current));
            match decision {
                GuardDecision::Redirect { to } => {
                    let _ = writeln!(trail, "-> {}", to);
                    target = to;
                }
                GuardDecision::Loading => return format!("{}loading...", trail),
                GuardDecision::ShowLogin => {
                    self.location = LOGIN_PATH.to_string();
                    return format!("{}[login] use: login <user> <password>", trail);
                }
                GuardDecision::NotFound { path } => return format!("{}404: {} not found", trail, path),
                GuardDecision::Render { path } => {
                    self.location = path.clone();
                    return match current {
                        Some(id) => format!("{}{}", trail, render_shell(&NavShell::compose(&id, &path))),
                        None => format!("{}{}", trail, path),
                    };
                }
            }
        }
        format!("{}redirect loop at {}", trail, target)
    }

    pub fn identity(&self) -> Option<Identity> { self.store.current() }

    pub fn home(&self) -> Option<&'static str> { self.store.current().map(|id| home_for(&id.role)) }
}

fn describe(id: &Identity) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "{} ({})", id.name, id.username);
    let _ = writeln!(s, "role:       {}", id.role);
    let _ = write!(s, "department: {}", id.department);
    if let Some(d) = &id.district { let _ = write!(s, "\ndistrict:   {}", d); }
    if let Some(d) = &id.district_id { let _ = write!(s, "\ndistrict id: {}", d); }
    if let Some(a) = &id.agency_id { let _ = write!(s, "\nagency id:  {}", a); }
    s
}

fn render_shell(shell: &NavShell) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "== {} ==", shell.title);
    for item in &shell.sidebar {
        let marker = if item.active { '>' } else { ' ' };
        let _ = writeln!(s, " {} {:<28} {}", marker, item.label, item.path);
    }
    let _ = write!(s, "{} | {}", shell.greeting, shell.user.department);
    s
}
