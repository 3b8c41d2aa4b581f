use super::load_session;
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use jsontree_model::TreeStats;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// JSON file to check
    pub input: PathBuf,
}

pub fn check(args: CheckArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;

    println!("🔍 {} {}", "Checking".green().bold(), args.input.display());

    let stats = check_file(&args.input, &config)?;

    println!("  {} converts and exports cleanly", "✓".green());
    println!("   Nodes: {}", stats.total);
    println!("   Max depth: {}", stats.max_depth);
    Ok(())
}

/// Import then export the document, failing on anything that does not
/// survive the trip
pub(crate) fn check_file(path: &Path, config: &Config) -> Result<TreeStats> {
    let session = load_session(path, config.history())?;
    session.export_text()?;
    Ok(session.stats())
}
