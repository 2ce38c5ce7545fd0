// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vetrina - a listing relay for Telegram.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod price;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use vetrina_config::VetrinaConfig;

/// Vetrina - prices fashion listings and republishes them in order.
#[derive(Parser, Debug)]
#[command(name = "vetrina", version, about, long_about = None)]
struct Cli {
    /// Configuration file to use instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the relay against Telegram.
    Serve,
    /// Validate the configuration and exit.
    Check,
    /// Price a caption with the active selling mode and print the result.
    Price {
        /// Caption text; multiple arguments are joined with spaces.
        #[arg(required = true)]
        text: Vec<String>,
    },
}

fn load_config(path: Option<&PathBuf>) -> VetrinaConfig {
    let loaded = match path {
        Some(path) => vetrina_config::load_and_validate_path(path),
        None => vetrina_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            vetrina_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("vetrina={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());
    init_tracing(&config.service.log_level);

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("vetrina: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Check) => match price::describe_modes(&config) {
            Ok(summary) => {
                println!("vetrina: configuration is valid");
                println!("{summary}");
            }
            Err(e) => {
                eprintln!("vetrina: {e}");
                std::process::exit(1);
            }
        },
        Some(Commands::Price { text }) => match price::run_price(&config, &text.join(" ")) {
            Ok(report) => println!("{report}"),
            Err(e) => {
                eprintln!("vetrina: {e}");
                std::process::exit(1);
            }
        },
        None => {
            println!("vetrina: use --help for available commands");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn price_command_joins_words() {
        let cli = Cli::parse_from(["vetrina", "price", "300€", "-20%"]);
        match cli.command {
            Some(Commands::Price { text }) => assert_eq!(text.join(" "), "300€ -20%"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::parse_from(["vetrina", "check", "--config", "/tmp/v.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/v.toml")));
        assert!(matches!(cli.command, Some(Commands::Check)));
    }
}
