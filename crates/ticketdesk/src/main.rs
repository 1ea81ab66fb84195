// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticketdesk - a Telegram support-ticket bot.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod check;
mod serve;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use ticketdesk_config::{ConfigError, DeskConfig};

/// Ticketdesk - a Telegram support-ticket bot.
#[derive(Parser, Debug)]
#[command(name = "ticketdesk", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, short, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the bot until SIGINT or SIGTERM.
    Serve,
    /// Validate the configuration and print the effective settings.
    CheckConfig,
}

fn load(path: Option<&PathBuf>) -> Result<DeskConfig, Vec<ConfigError>> {
    match path {
        Some(path) => ticketdesk_config::load_and_validate_path(path),
        None => ticketdesk_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            ticketdesk_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => match serve::run_serve(config).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("ticketdesk: {e}");
                ExitCode::FAILURE
            }
        },
        Commands::CheckConfig => {
            let report = check::check_config(&config);
            print!("{}", report.render());
            match ticketdesk_config::to_redacted_toml(&config) {
                Ok(effective) => println!("{effective}"),
                Err(e) => eprintln!("ticketdesk: cannot render effective config: {e}"),
            }
            if report.is_ready() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
