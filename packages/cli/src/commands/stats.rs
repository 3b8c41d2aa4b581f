use super::load_session;
use crate::config::Config;
use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::Colorize;
use jsontree_model::TreeStats;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// JSON file to analyze
    pub input: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = StatsFormat::Text)]
    pub format: StatsFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatsFormat {
    Text,
    Json,
}

pub fn stats(args: StatsArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let session = load_session(&args.input, config.history())?;
    let stats = session.stats();

    println!("{}", render(&stats, args.format)?);
    Ok(())
}

fn render(stats: &TreeStats, format: StatsFormat) -> Result<String> {
    match format {
        StatsFormat::Json => Ok(serde_json::to_string_pretty(stats)?),
        StatsFormat::Text => {
            let counts = &stats.counts;
            Ok([
                format!("📊 {}", "Tree statistics".bright_blue().bold()),
                format!("   Total nodes: {}", stats.total),
                format!("   Max depth:   {}", stats.max_depth),
                format!(
                    "   By type:     root {}, object {}, list {}, data {}",
                    counts.root, counts.object, counts.list, counts.data
                ),
            ]
            .join("\n"))
        }
    }
}
