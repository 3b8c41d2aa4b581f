mod commands;
mod config;

use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use commands::{apply, check, format, stats, ApplyArgs, CheckArgs, FormatArgs, StatsArgs};
use tracing_subscriber::EnvFilter;

/// jsontree - inspect and edit JSON documents as node trees
#[derive(Parser, Debug)]
#[command(name = "jsontree")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that a document converts to a tree and back
    Check(CheckArgs),

    /// Re-export a document as pretty JSON
    Format(FormatArgs),

    /// Print node counts and depth
    Stats(StatsArgs),

    /// Run an edit script against a document
    Apply(ApplyArgs),
}

/// Log to stderr. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Command::Check(args) => check(args, &cwd),
        Command::Format(args) => format(args, &cwd),
        Command::Stats(args) => stats(args, &cwd),
        Command::Apply(args) => apply(args, &cwd),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
