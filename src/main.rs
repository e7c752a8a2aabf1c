//!
//! fundconsole server binary
//! -------------------------
//! Starts the HTTP console API. Configuration comes from CLI flags and
//! environment variables (flags win).

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use fundconsole::config::{has_flag, ConsoleConfig};

const USAGE: &str = "fundconsole server

USAGE:
  fundconsole [--http-port N] [--directory PATH] [--ledger PATH] [--session-ttl SECS]

OPTIONS:
  --http-port N        HTTP port (env: FUNDCONSOLE_HTTP_PORT, default 7878)
  --directory PATH     Credential directory JSON (env: FUNDCONSOLE_DIRECTORY, default built-in)
  --ledger PATH        Fund ledger JSON (env: FUNDCONSOLE_LEDGER, default sample ledger)
  --session-ttl SECS   Session lifetime (env: FUNDCONSOLE_SESSION_TTL_SECS, default 3600)
";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let args: Vec<String> = std::env::args().collect();
    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = ConsoleConfig::from_env_and_args(&args);
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(
        target: "startup",
        "fundconsole starting: RUST_LOG='{}', http_port={}, directory={:?}, ledger={:?}",
        rust_log, config.http_port, config.directory_path, config.ledger_path
    );

    fundconsole::server::run_with_config(config).await
}
