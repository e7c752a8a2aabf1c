//!
//! fundconsole terminal console
//! ----------------------------
//! Interactive interpreter that keeps its session in a file slot, so a login
//! survives restarts until `logout`.

use std::io::{self, Write};

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use fundconsole::cli::{Console, HELP};
use fundconsole::config::{has_flag, ConsoleConfig};
use fundconsole::identity::{DirectoryAuthProvider, FileSlot, SessionStore};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--session-file PATH] [--directory PATH] [--ledger PATH]\n\nFlags:\n  --session-file PATH   Durable session slot (env: FUNDCONSOLE_SESSION_FILE, default .fundconsole/session.json)\n  --directory PATH      Credential directory JSON (env: FUNDCONSOLE_DIRECTORY)\n  --ledger PATH         Fund ledger JSON (env: FUNDCONSOLE_LEDGER)\n  -h, --help            Show this help\n\n{HELP}"
    );
}

fn main() -> Result<()> {
    // Logs go to stderr so they never interleave with console output.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .try_init();

    let args: Vec<String> = std::env::args().collect();
    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        print_usage("fundconsole_cli");
        return Ok(());
    }

    let config = ConsoleConfig::from_env_and_args(&args);
    let directory = config.load_directory()?;
    let ledger = config.load_ledger()?;
    let store = SessionStore::open(FileSlot::new(config.session_file.clone()));
    let mut console = Console::new(store, Box::new(DirectoryAuthProvider::new(directory)), ledger);

    println!("fundconsole interpreter. Type 'help' for commands.");
    println!("{}", console.start().text);

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut input = String::new();
    loop {
        input.clear();
        print!("{}", console.prompt());
        let _ = stdout.flush();
        match stdin.read_line(&mut input) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let line = input.trim();
        if line.is_empty() { continue; }
        let reply = console.execute(line);
        if !reply.text.is_empty() { println!("{}", reply.text); }
        if reply.quit { break; }
    }
    Ok(())
}
