use std::path::PathBuf;

use thiserror::Error;

/// Everything that can stop the load → aggregate → render pipeline.
///
/// None of these are recovered from; `main` reports them and exits nonzero.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("cannot read {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed input {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("grouping column '{column}' not found (available: {})", available.join(", "))]
    Schema {
        column: String,
        available: Vec<String>,
    },

    #[error("nothing to plot by '{column}': {reason}")]
    EmptyResult { column: String, reason: String },

    #[error("invalid option: {0}")]
    Config(String),

    #[error("rendering failed: {0}")]
    Render(String),
}

impl PipelineError {
    pub(crate) fn parse(path: &std::path::Path, message: impl Into<String>) -> Self {
        PipelineError::Parse {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
