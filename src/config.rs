//! Runtime configuration shared by the server and console binaries.
//! Precedence: command-line flag, then environment variable, then default.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::funds::FundLedger;
use crate::identity::{CredentialDirectory, MAX_SESSION_TTL};

pub const ENV_HTTP_PORT: &str = "FUNDCONSOLE_HTTP_PORT";
pub const ENV_DIRECTORY: &str = "FUNDCONSOLE_DIRECTORY";
pub const ENV_LEDGER: &str = "FUNDCONSOLE_LEDGER";
pub const ENV_SESSION_FILE: &str = "FUNDCONSOLE_SESSION_FILE";
pub const ENV_SESSION_TTL: &str = "FUNDCONSOLE_SESSION_TTL_SECS";

const DEFAULT_HTTP_PORT: u16 = 7878;
const DEFAULT_SESSION_FILE: &str = ".fundconsole/session.json";
const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub http_port: u16,
    /// Credential directory file; the built-in directory when unset.
    pub directory_path: Option<PathBuf>,
    /// Fund ledger file; the sample ledger when unset.
    pub ledger_path: Option<PathBuf>,
    pub session_file: PathBuf,
    pub session_ttl: Duration,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            http_port: DEFAULT_HTTP_PORT,
            directory_path: None,
            ledger_path: None,
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
        }
    }
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return Some(args[i + 1].as_str());
        }
        i += 1;
    }
    None
}

pub fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

impl ConsoleConfig {
    /// Resolve from process arguments and environment.
    pub fn from_env_and_args(args: &[String]) -> Self {
        Self::resolve(args, |name| env::var(name).ok())
    }

    /// Resolve with an injectable environment lookup.
    pub fn resolve<F: Fn(&str) -> Option<String>>(args: &[String], lookup: F) -> Self {
        let defaults = Self::default();
        let pick = |flag: &str, var: &str| -> Option<String> {
            arg_value(args, flag).map(str::to_string).or_else(|| lookup(var)).filter(|v| !v.trim().is_empty())
        };

        let http_port = pick("--http-port", ENV_HTTP_PORT)
            .and_then(|v| v.trim().parse::<u16>().ok())
            .unwrap_or(defaults.http_port);
        let session_ttl = pick("--session-ttl", ENV_SESSION_TTL)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(|secs| Duration::from_secs(secs).min(MAX_SESSION_TTL))
            .unwrap_or(defaults.session_ttl);

        Self {
            http_port,
            directory_path: pick("--directory", ENV_DIRECTORY).map(PathBuf::from),
            ledger_path: pick("--ledger", ENV_LEDGER).map(PathBuf::from),
            session_file: pick("--session-file", ENV_SESSION_FILE).map(PathBuf::from).unwrap_or(defaults.session_file),
            session_ttl,
        }
    }

    pub fn load_directory(&self) -> Result<CredentialDirectory> {
        match &self.directory_path {
            Some(p) => CredentialDirectory::from_json_file(p)
                .with_context(|| format!("While loading credential directory from {}", p.display())),
            None => Ok(CredentialDirectory::builtin()),
        }
    }

    pub fn load_ledger(&self) -> Result<FundLedger> {
        match &self.ledger_path {
            Some(p) => FundLedger::from_json_file(p)
                .with_context(|| format!("While loading fund ledger from {}", p.display())),
            None => Ok(FundLedger::sample()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn args(list: &[&str]) -> Vec<String> { list.iter().map(|s| s.to_string()).collect() }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let cfg = ConsoleConfig::resolve(&[], |_| None);
        assert_eq!(cfg, ConsoleConfig::default());
    }

    #[test]
    fn flags_override_environment() {
        let env: HashMap<&str, &str> = [(ENV_HTTP_PORT, "9000"), (ENV_SESSION_FILE, "/tmp/env.json")].into_iter().collect();
        let cfg = ConsoleConfig::resolve(&args(&["bin", "--http-port", "9100"]), |k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.http_port, 9100);
        assert_eq!(cfg.session_file, PathBuf::from("/tmp/env.json"));
    }

    #[test]
    fn bad_numbers_fall_back_to_defaults() {
        let cfg = ConsoleConfig::resolve(&args(&["bin", "--http-port", "http", "--session-ttl", "-5"]), |_| None);
        assert_eq!(cfg.http_port, 7878);
        assert_eq!(cfg.session_ttl, Duration::from_secs(3600));
    }

    #[test]
    fn oversized_session_ttl_is_clamped() {
        let cfg = ConsoleConfig::resolve(&args(&["bin", "--session-ttl", "18446744073709551615"]), |_| None);
        assert_eq!(cfg.session_ttl, MAX_SESSION_TTL);
        let sessions = crate::identity::SessionManager::new(cfg.session_ttl);
        assert!(sessions.issue(crate::identity::Identity::default()).is_ok());
    }

    #[test]
    fn missing_directory_file_is_an_error() {
        let cfg = ConsoleConfig { directory_path: Some(PathBuf::from("/definitely/not/here.json")), ..Default::default() };
        assert!(cfg.load_directory().is_err());
        assert_eq!(ConsoleConfig::default().load_directory().unwrap().len(), 4);
    }
}
