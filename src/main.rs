mod commands;
mod config;
mod encoding;
mod shamir;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use env_logger::Env;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "sss")]
#[command(about = "Split and recombine secrets with Shamir's Secret Sharing over GF(256)")]
#[command(
    long_about = "Split a secret into n Base64 shares so that any t of them recover it and \
fewer reveal nothing.\n\nShares are Base64-encoded; each decodes to len(secret)+1 bytes \
(data bytes followed by the x-coordinate tag). For binary secrets use 'split --in <file>' \
and 'combine --out <file>'. Shares carry no integrity check: wrong or mixed shares \
recombine into garbage without an error."
)]
#[command(version)]
struct Cli {
    /// Show debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Save default share count, threshold and output directory
    Init,

    /// Split a secret into Base64 shares (runs a recombination self-test)
    Split(commands::SplitArgs),

    /// Recover a secret from Base64 shares
    Combine(commands::CombineArgs),
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init => commands::init(),
        Commands::Split(args) => {
            let config = config::Config::load().context("Failed to load configuration")?;
            commands::split(config, args)
        }
        Commands::Combine(args) => commands::combine(args),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    // Single exit point so every wiping destructor has run before we leave
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", style("Error:").red().bold(), err);
            ExitCode::FAILURE
        }
    }
}
