use super::{emit, load_session};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct FormatArgs {
    /// JSON file to format
    pub input: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn format(args: FormatArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let text = format_file(&args.input, &config)?;

    emit(&text, args.output.as_deref())?;

    if let Some(output) = &args.output {
        eprintln!("  {} {} → {}", "✓".green(), args.input.display(), output.display());
    }
    Ok(())
}

/// Pretty JSON as produced by a round trip through the tree
pub(crate) fn format_file(path: &Path, config: &Config) -> Result<String> {
    let session = load_session(path, config.history())?;
    Ok(session.export_text()?)
}
