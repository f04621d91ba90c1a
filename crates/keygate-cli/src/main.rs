//! keygate - register accounts, log in, and check bearer tokens from the command line.
//!
//! Accounts live in a JSON store under the data directory; the token signing
//! key comes from `KEYGATE_SIGNING_KEY` or the OS keychain.

mod commands;
mod config;
mod keychain;
mod session;

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use keygate_core::{AuthError, ErrorKind};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{App, Cli};
use config::Config;

/// Directory for an additional daily-rolling log file
const ENV_LOG_DIR: &str = "KEYGATE_LOG_DIR";

/// Initialize the tracing subscriber for logging
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    match std::env::var_os(ENV_LOG_DIR) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "keygate.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

/// Exit status by failure class, so scripts can tell bad input from bad credentials
fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<AuthError>().map(AuthError::kind) {
        Some(ErrorKind::Validation) | Some(ErrorKind::Conflict) => 2,
        Some(ErrorKind::Authentication)
        | Some(ErrorKind::MalformedToken)
        | Some(ErrorKind::InvalidSignature)
        | Some(ErrorKind::ExpiredToken) => 3,
        _ => 1,
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let mut app = App::new(config)?;
    app.run(cli.command).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _log_guard = init_tracing();
    info!("keygate starting");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(exit_status(&e))
        }
    }
}
