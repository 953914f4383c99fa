//! Concurrent pruning engine.
//!
//! The resolver turns roots and target folder names into candidates; the
//! scheduler deletes the live ones on a bounded worker pool and streams one
//! progress event per candidate plus a final summary back to the caller.

pub mod cancel;
pub mod error;
pub mod handle;
pub mod remover;
pub mod resolver;
pub mod scheduler;
pub mod types;

pub use cancel::CancelToken;
pub use error::{PruneError, Result};
pub use handle::{callbacks, RunHandle, RunObserver};
pub use remover::{FsRemover, Remover};
pub use resolver::{resolve, resolve_candidates};
pub use scheduler::{PruneOptions, Pruner, RunRequest};
pub use types::{
    Candidate, DeletionOutcome, Liveness, Progress, ResolvedCandidate, RunEvent, RunState,
    RunSummary, SkipReason, TargetName, DEFAULT_TARGETS,
};
