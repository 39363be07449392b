//! # Till Register
//!
//! Headless register console: one operator command per line, read from
//! stdin or from a script file.
//!
//! ## Module Organization
//! ```text
//! register/
//! ├── lib.rs          ◄─── You are here (startup & logging)
//! ├── config.rs       ◄─── register.toml + TILL_* overrides
//! ├── command.rs      ◄─── Line parser
//! ├── session.rs      ◄─── Checkout + store, command execution
//! └── error.rs        ◄─── RegisterError with error codes
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Register Startup                                  │
//! │                                                                         │
//! │  1. Initialize Logging ───────────────────────────────────────────────► │
//! │     • tracing-subscriber with env filter, written to stderr             │
//! │     • Default: DEFAULT_LOG_FILTER; override with RUST_LOG               │
//! │                                                                         │
//! │  2. Load Configuration ───────────────────────────────────────────────► │
//! │     • defaults < register.toml < TILL_* environment                     │
//! │                                                                         │
//! │  3. Determine Database Path ──────────────────────────────────────────► │
//! │     • [database].path / TILL_DB_PATH                                    │
//! │     • Linux: ~/.local/share/register/till.db                            │
//! │                                                                         │
//! │  4. Connect to Database ──────────────────────────────────────────────► │
//! │     • SQLite with WAL mode, synchronous=FULL                            │
//! │     • Run pending migrations                                            │
//! │                                                                         │
//! │  5. Open Session ─────────────────────────────────────────────────────► │
//! │     • Resume today's receipt numbering                                  │
//! │     • Read commands until EOF or quit                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod command;
pub mod config;
pub mod error;
pub mod session;

use std::path::PathBuf;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::RegisterConfig;
use error::RegisterResult;
use session::Session;
use till_db::Database;

pub use command::Command;
pub use error::{ErrorCode, RegisterError};

/// Command-line options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    /// `--config <path>`; otherwise the platform default.
    pub config_path: Option<PathBuf>,
    /// `--script <path>`; otherwise stdin.
    pub script: Option<PathBuf>,
}

/// Starts the register and runs it to completion.
pub async fn run(options: Options) -> RegisterResult<()> {
    let config = RegisterConfig::load(options.config_path)?;
    info!(store = %config.store.name, terminal = %config.checkout.terminal_id, "Starting Till register");

    let db_config = config.db_config();
    if let Some(parent) = db_config.database_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    info!(db_path = %db_config.database_path.display(), "Database path determined");

    let db = Database::new(db_config).await?;
    let mut session = Session::open(&config, db.clone()).await?;

    let result = match options.script {
        Some(path) => {
            info!(?path, "Running command script");
            let file = tokio::fs::File::open(&path).await?;
            session.run(BufReader::new(file), tokio::io::stdout(), true).await
        }
        None => {
            println!("{} register {} ready. Type 'help' for commands.", config.store.name, config.checkout.terminal_id);
            session.run(BufReader::new(tokio::io::stdin()), tokio::io::stdout(), false).await
        }
    };

    db.close().await;
    result
}

/// Filter used when `RUST_LOG` is unset: debug for the till crates and this
/// console, warnings only from sqlx.
pub const DEFAULT_LOG_FILTER: &str = "info,till=debug,register=debug,sqlx=warn";

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=till=trace` - Show trace for till crates only
/// - Default: [`DEFAULT_LOG_FILTER`]
///
/// Logs go to stderr so they never mix with command output.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_default_filter_shows_console_debug() {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(DEFAULT_LOG_FILTER))
            .with_writer(std::io::sink)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            assert!(tracing::enabled!(target: "register::session", Level::DEBUG));
            assert!(tracing::enabled!(target: "till_core::checkout", Level::DEBUG));
            assert!(!tracing::enabled!(target: "sqlx::query", Level::INFO));
        });
    }
}
