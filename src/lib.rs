//! dirprune removes regeneratable folders (build caches, logs, generated
//! metadata) found directly beneath a set of project roots.
//!
//! The [`engine`] module is the reusable part: resolve candidates, delete them
//! on a bounded worker pool, observe progress, cancel cooperatively.
//!
//! ```no_run
//! use dirprune::engine::{callbacks, CancelToken, Pruner, RunRequest, TargetName};
//! use std::path::PathBuf;
//!
//! let request = RunRequest::new(
//!     vec![PathBuf::from("/projects/game")],
//!     TargetName::parse_all(["Library", "Temp"])?,
//! );
//! let mut observer = callbacks(
//!     |p| println!("[{}/{}] {}", p.current, p.total, p.candidate.path.display()),
//!     |s| println!("deleted {} of {}", s.deleted, s.total),
//! );
//! Pruner::new().run(request, CancelToken::new(), &mut observer)?;
//! # Ok::<(), dirprune::engine::PruneError>(())
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod output;
pub mod safety;
pub mod utils;
