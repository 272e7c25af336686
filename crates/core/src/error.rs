use std::path::PathBuf;
use thiserror::Error;

/// Fatal extraction failures. Any of these aborts the comparison.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("extraction task failed: {0}")]
    Join(String),
}
