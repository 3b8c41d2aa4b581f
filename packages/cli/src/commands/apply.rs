//! Edit scripts
//!
//! A script is a JSON array of steps run in order against one session:
//!
//! ```text
//! [
//!   { "op": "add_child", "parent_id": "/", "node": { "type": "data", "name": "x", "value": 1 } },
//!   { "op": "flush" },
//!   { "op": "relocate", "node_id": "/x", "target_id": "/items", "placement": "adopt" },
//!   { "op": "undo" }
//! ]
//! ```
//!
//! Edits use the `Mutation` wire format. Node references are ids, or
//! slash-separated name paths (starting with `/`) resolved against the tree
//! as it is when the step runs. Every step is stamped with the same instant,
//! so consecutive edits form one undo step until a `flush` however long
//! the script takes. A zero coalescing window makes every edit its own step.

use super::{emit, load_session};
use crate::config::Config;
use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use colored::Colorize;
use jsontree_editor::{EditSession, Mutation};
use serde_json::Value;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;

/// Fields holding a node reference
const REFERENCE_FIELDS: [&str; 4] = ["node_id", "parent_id", "child_id", "target_id"];

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// JSON document to edit
    pub input: PathBuf,

    /// Edit script (JSON array of steps)
    pub script: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Undo depth limit (overrides config)
    #[arg(long)]
    pub depth: Option<NonZeroUsize>,

    /// Coalescing window in milliseconds (overrides config)
    #[arg(long)]
    pub window_ms: Option<u64>,
}

/// One script step
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Undo,
    Redo,
    Flush,
    Edit(Mutation),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScriptSummary {
    pub changed: usize,
    pub unchanged: usize,
    pub undone: usize,
    pub redone: usize,
}

pub fn apply(args: ApplyArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;

    let mut history = config.history();
    if let Some(depth) = args.depth {
        history.depth_limit = depth;
    }
    if let Some(window) = args.window_ms {
        history.coalesce_window = Duration::from_millis(window);
    }

    let mut session = load_session(&args.input, history)?;

    let script = fs::read_to_string(&args.script)
        .with_context(|| format!("Cannot read {}", args.script.display()))?;
    let steps: Vec<Value> = serde_json::from_str(&script)
        .with_context(|| format!("Invalid script {}", args.script.display()))?;

    let summary = run_script(&mut session, steps)?;

    let text = session.export_text()?;
    emit(&text, args.output.as_deref())?;

    eprintln!(
        "{} {} changed, {} unchanged, {} undone, {} redone",
        "✨".green(),
        summary.changed,
        summary.unchanged,
        summary.undone,
        summary.redone
    );
    Ok(())
}

/// Run every step, stopping at the first failure
pub fn run_script(session: &mut EditSession, steps: Vec<Value>) -> Result<ScriptSummary> {
    let mut summary = ScriptSummary::default();
    let clock = Instant::now();

    for (index, raw) in steps.into_iter().enumerate() {
        let step = parse_step(session, raw).with_context(|| format!("Step {}", index + 1))?;

        match step {
            Step::Undo => {
                if session.undo() {
                    summary.undone += 1;
                }
            }
            Step::Redo => {
                if session.redo() {
                    summary.redone += 1;
                }
            }
            Step::Flush => {
                session.flush();
            }
            Step::Edit(mutation) => {
                let changed = session
                    .apply_at(&mutation, clock)
                    .with_context(|| format!("Step {} ({})", index + 1, mutation.name()))?;
                info!(step = index + 1, op = mutation.name(), changed, "applied step");
                if changed {
                    summary.changed += 1;
                } else {
                    summary.unchanged += 1;
                }
            }
        }
    }

    Ok(summary)
}

fn parse_step(session: &EditSession, mut raw: Value) -> Result<Step> {
    let op = raw
        .get("op")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("missing \"op\""))?;

    match op {
        "undo" => return Ok(Step::Undo),
        "redo" => return Ok(Step::Redo),
        "flush" => return Ok(Step::Flush),
        _ => {}
    }

    if let Some(fields) = raw.as_object_mut() {
        for key in REFERENCE_FIELDS {
            if let Some(Value::String(reference)) = fields.get_mut(key) {
                *reference = resolve_reference(session, reference)?;
            }
        }
    }

    Ok(Step::Edit(serde_json::from_value(raw)?))
}

/// Turn a `/name/path` reference into a node id; anything else is an id
fn resolve_reference(session: &EditSession, reference: &str) -> Result<String> {
    if !reference.starts_with('/') {
        return Ok(reference.to_string());
    }

    match session.tree().resolve_path(reference) {
        Some(node) => Ok(node.id.to_string()),
        None => bail!("no node at path {}", reference),
    }
}
