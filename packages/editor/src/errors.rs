//! Error types for the editor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    /// `message` already names the line and column
    #[error("Parse error: {message}")]
    Parse {
        message: String,
        line: usize,
        column: usize,
    },

    #[error(transparent)]
    Convert(#[from] crate::convert::ConvertError),

    #[error("Mutation error: {0}")]
    Mutation(#[from] crate::mutations::MutationError),

    #[error("Export error: {0}")]
    Export(String),
}

impl From<serde_json::Error> for EditorError {
    fn from(e: serde_json::Error) -> Self {
        EditorError::Parse {
            message: e.to_string(),
            line: e.line(),
            column: e.column(),
        }
    }
}
