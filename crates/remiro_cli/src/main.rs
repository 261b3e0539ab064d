//! Remiro CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Configuration error
//! - 4: Authentication error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use remiro_chat::ChatError;

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const CONFIG_ERROR: u8 = 3;
    pub const AUTH_ERROR: u8 = 4;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let crate_level = if cli.verbose { "remiro=debug" } else { "remiro=info" };
    let mut filter = EnvFilter::from_default_env();
    for directive in [crate_level, "warn"] {
        if let Ok(parsed) = directive.parse() {
            filter = filter.add_directive(parsed);
        }
    }

    // Logging may already be initialized
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let data_dir = cli.data_dir;
    let result = match cli.command {
        Commands::Signup(args) => commands::signup::execute(args, data_dir).await,
        Commands::Signin(args) => commands::signin::execute(args, data_dir).await,
        Commands::Chat(args) => commands::chat::execute(args, data_dir).await,
        Commands::Sessions(args) => commands::sessions::execute(args, data_dir).await,
        Commands::History(args) => commands::history::execute(args, data_dir).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    match e.downcast_ref::<ChatError>() {
        Some(err) if err.is_config() => ExitCodes::CONFIG_ERROR,
        Some(err) if err.is_auth() => ExitCodes::AUTH_ERROR,
        Some(
            ChatError::EmptyInput | ChatError::InvalidId(_) | ChatError::SessionNotFound(_),
        ) => ExitCodes::INVALID_ARGS,
        _ => ExitCodes::GENERAL_ERROR,
    }
}
