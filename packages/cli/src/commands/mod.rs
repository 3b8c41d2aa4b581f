pub mod apply;
pub mod check;
pub mod format;
pub mod stats;

pub use apply::{apply, ApplyArgs};
pub use check::{check, CheckArgs};
pub use format::{format, FormatArgs};
pub use stats::{stats, StatsArgs};

use anyhow::{Context, Result};
use jsontree_editor::{EditSession, HistoryConfig};
use std::fs;
use std::path::Path;

/// Read a JSON document into a fresh session
pub(crate) fn load_session(path: &Path, history: HistoryConfig) -> Result<EditSession> {
    let text = fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;

    let mut session = EditSession::new(path.display().to_string(), history);
    session
        .import_text(&text)
        .with_context(|| format!("Cannot import {}", path.display()))?;

    // the import itself is not something a script should undo
    session.history_mut().clear();
    Ok(session)
}

/// Write to `out`, or stdout when absent
pub(crate) fn emit(text: &str, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            fs::write(path, format!("{text}\n"))
                .with_context(|| format!("Cannot write {}", path.display()))?;
        }
        None => println!("{text}"),
    }
    Ok(())
}
