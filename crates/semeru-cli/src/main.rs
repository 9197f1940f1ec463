//! semeru-watch - campsite capacity watcher
//!
//! A command-line interface that polls the Bromo Tengger Semeru booking site
//! for one target date and reports capacity changes as they happen.

mod commands;
mod output;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "semeru-watch")]
#[command(author, version, about = "Watch Semeru campsite capacity for a target date", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format: text (default) or json
    #[arg(long, global = true, default_value = "text")]
    format: output::OutputFormat,

    /// Suppress progress messages
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(long, short, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll until interrupted, reporting every capacity change
    Watch(commands::watch::WatchArgs),

    /// Query the capacity view once and print the result
    Check(commands::check::CheckArgs),
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Ctrl-C cancels the running command, including a request in flight
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("[cli] interrupt received, stopping");
            interrupt.cancel();
        }
    });

    let ctx = commands::Context {
        format: cli.format,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Watch(args) => commands::watch::execute(&ctx, args, cancel).await,
        Commands::Check(args) => commands::check::execute(&ctx, args, cancel).await,
    }
}
