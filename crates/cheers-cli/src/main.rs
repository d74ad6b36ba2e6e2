//! cheers - terminal front end for the cheers account flows.
//!
//! Drives the same session manager the mobile app embeds: sign up, verify
//! the OTP, sign in, reset a password, and inspect or end the session.

mod commands;

use std::io;

use anyhow::Result;
use cheers_core::{Config, SessionManager};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{Command, USAGE};

/// Overrides the configured API base URL
const API_URL_ENV: &str = "CHEERS_API_URL";

/// Directory for daily rolling log files
const LOG_DIR_ENV: &str = "CHEERS_LOG_DIR";

/// Initialize the tracing subscriber for logging.
///
/// The returned guard flushes the file writer on drop and must live until exit.
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var_os(LOG_DIR_ENV) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "cheers.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _log_guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };
    if command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    info!("cheers starting");

    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    };

    // Apply the env override to a copy so it never gets saved
    let mut effective = config.clone();
    if let Ok(url) = std::env::var(API_URL_ENV) {
        debug!(%url, "API base URL overridden from environment");
        effective.api_base_url = Some(url);
    }

    let store = effective.open_store()?;
    let api = effective.api_client()?;
    debug!(base_url = api.base_url(), storage = ?effective.storage, "Session backend configured");

    let mut session = SessionManager::new(store, api);
    let state = session.check_auth().await;
    debug!(?state, "Startup auth check finished");

    let result = commands::run(command, &mut session, &mut config).await;

    info!("cheers exiting");
    result
}
