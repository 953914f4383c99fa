use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PruneError {
    #[error("root is missing or not a directory: {}", .0.display())]
    RootInvalid(PathBuf),

    #[error("failed to remove {}: {source}", .path.display())]
    DeletionFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("run cancelled")]
    Cancelled,

    #[error("invalid target folder name {name:?}: {reason}")]
    InvalidTargetName { name: String, reason: &'static str },

    #[error("a prune run is already active on this engine")]
    RunActive,

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to spawn run coordinator: {0}")]
    Spawn(#[source] io::Error),
}

pub type Result<T> = std::result::Result<T, PruneError>;
