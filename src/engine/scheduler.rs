use super::cancel::CancelToken;
use super::error::{PruneError, Result};
use super::handle::{RunHandle, RunObserver};
use super::remover::{FsRemover, Remover};
use super::resolver;
use super::types::{
    Candidate, DeletionOutcome, Liveness, Progress, ResolvedCandidate, RunEvent, RunState,
    RunSummary, SkipReason, TargetName,
};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;
use tracing::{debug, info, warn};

const DEFAULT_PARALLEL_ROOTS: usize = 4;

#[derive(Debug, Clone)]
pub struct PruneOptions {
    /// How many roots may have their folders in flight at once.
    pub max_parallel_roots: usize,
    /// Hard cap on pool threads, applied after the per-root sizing.
    pub max_workers: Option<usize>,
    pub measure_freed: bool,
}

impl Default for PruneOptions {
    fn default() -> Self {
        Self {
            max_parallel_roots: DEFAULT_PARALLEL_ROOTS,
            max_workers: None,
            measure_freed: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunRequest {
    pub roots: Vec<PathBuf>,
    pub targets: Vec<TargetName>,
    pub options: PruneOptions,
}

impl RunRequest {
    pub fn new(roots: Vec<PathBuf>, targets: Vec<TargetName>) -> Self {
        Self {
            roots,
            targets,
            options: PruneOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PruneOptions) -> Self {
        self.options = options;
        self
    }

    pub fn total(&self) -> usize {
        self.roots.len() * self.targets.len()
    }

    /// Pool size: one slot per target name for each concurrently pruned root,
    /// never more than there are candidates.
    pub fn worker_count(&self) -> usize {
        let per_root = self.targets.len();
        let mut workers = per_root
            .saturating_mul(self.options.max_parallel_roots.max(1))
            .min(self.total());
        if let Some(cap) = self.options.max_workers {
            workers = workers.min(cap);
        }
        workers.max(1)
    }
}

/// The pruning engine. Holds the deletion primitive and allows one active run.
pub struct Pruner {
    remover: Arc<dyn Remover>,
    active: Arc<AtomicBool>,
}

impl Pruner {
    pub fn new() -> Self {
        Self::with_remover(FsRemover::new())
    }

    pub fn with_remover(remover: impl Remover + 'static) -> Self {
        Self {
            remover: Arc::new(remover),
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Starts a run in the background and returns immediately.
    ///
    /// Events are delivered through the returned handle on whichever thread
    /// drives it.
    pub fn start(&self, request: RunRequest, cancel: CancelToken) -> Result<RunHandle> {
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(PruneError::RunActive);
        }
        let guard = ActiveGuard(Arc::clone(&self.active));

        let total = request.total();
        let pool = if total > 0 {
            let workers = request.worker_count();
            Some(
                ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .thread_name(|i| format!("dirprune-worker-{}", i))
                    .build()?,
            )
        } else {
            None
        };

        let (tx, rx) = channel();
        let current = Arc::new(AtomicUsize::new(0));
        let ctx = WorkerContext {
            remover: Arc::clone(&self.remover),
            cancel: cancel.clone(),
            measure_freed: request.options.measure_freed,
            sink: ProgressSink {
                current: Arc::clone(&current),
                total,
                tx: Mutex::new(tx.clone()),
            },
        };

        let worker = thread::Builder::new()
            .name("dirprune-run".to_string())
            .spawn(move || {
                let _guard = guard;
                let summary = execute(&request, pool, &ctx);
                let _ = tx.send(RunEvent::Complete(summary));
            })
            .map_err(PruneError::Spawn)?;

        Ok(RunHandle::new(rx, worker, current, total, cancel))
    }

    /// Runs to completion on the calling thread's observer.
    pub fn run(
        &self,
        request: RunRequest,
        cancel: CancelToken,
        observer: &mut impl RunObserver,
    ) -> Result<RunSummary> {
        Ok(self.start(request, cancel)?.wait(observer))
    }
}

impl Default for Pruner {
    fn default() -> Self {
        Self::new()
    }
}

struct ActiveGuard(Arc<AtomicBool>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

struct ProgressSink {
    current: Arc<AtomicUsize>,
    total: usize,
    tx: Mutex<Sender<RunEvent>>,
}

impl ProgressSink {
    /// Increment and send under one lock so observers never see the
    /// counter go backwards.
    fn report(&self, candidate: &Candidate, outcome: &DeletionOutcome) {
        let tx = match self.tx.lock() {
            Ok(tx) => tx,
            Err(poisoned) => poisoned.into_inner(),
        };
        let current = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = tx.send(RunEvent::Progress(Progress {
            current,
            total: self.total,
            candidate: candidate.clone(),
            outcome: outcome.clone(),
        }));
    }
}

struct WorkerContext {
    remover: Arc<dyn Remover>,
    cancel: CancelToken,
    measure_freed: bool,
    sink: ProgressSink,
}

impl WorkerContext {
    fn visit(&self, item: &ResolvedCandidate) -> DeletionOutcome {
        let outcome = match self.prune_one(item) {
            Ok(outcome) => outcome,
            Err(err) => {
                if let PruneError::DeletionFailed { .. } = err {
                    warn!("{}", err);
                }
                DeletionOutcome::from(err)
            }
        };
        debug!(
            path = %item.candidate.path.display(),
            outcome = outcome.label(),
            "visited candidate"
        );

        self.sink.report(&item.candidate, &outcome);
        outcome
    }

    fn prune_one(&self, item: &ResolvedCandidate) -> Result<DeletionOutcome> {
        if self.cancel.is_cancelled() {
            return Err(PruneError::Cancelled);
        }

        let candidate = &item.candidate;
        match item.liveness {
            Liveness::RootInvalid => return Err(PruneError::RootInvalid(candidate.root.clone())),
            Liveness::Missing => return Ok(DeletionOutcome::Skipped(SkipReason::NotFound)),
            Liveness::Live => {}
        }

        let freed_bytes = if self.measure_freed {
            self.remover.measure(&candidate.path)
        } else {
            0
        };

        match self.remover.remove_tree(&candidate.path) {
            Ok(()) => Ok(DeletionOutcome::Deleted { freed_bytes }),
            // Gone between resolution and removal.
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Ok(DeletionOutcome::Skipped(SkipReason::NotFound))
            }
            Err(source) => Err(PruneError::DeletionFailed {
                path: candidate.path.clone(),
                source,
            }),
        }
    }
}

fn execute(request: &RunRequest, pool: Option<ThreadPool>, ctx: &WorkerContext) -> RunSummary {
    let start = Instant::now();
    let total = request.total();
    let mut summary = RunSummary::new(total);

    let Some(pool) = pool else {
        info!("nothing to prune");
        return summary;
    };

    info!(
        roots = request.roots.len(),
        targets = request.targets.len(),
        workers = pool.current_num_threads(),
        "starting prune run"
    );

    let resolved = resolver::resolve(&request.roots, &request.targets);
    let per_root = request.targets.len();

    let outcomes: Vec<DeletionOutcome> = pool.install(|| {
        resolved
            .par_chunks(per_root)
            .flat_map(|root_candidates| root_candidates.par_iter().map(|item| ctx.visit(item)))
            .collect()
    });

    for (item, outcome) in resolved.iter().zip(&outcomes) {
        summary.record(&item.candidate, outcome);
    }
    if summary.cancelled > 0 {
        summary.state = RunState::Cancelled;
    }
    summary.duration = start.elapsed();

    info!(
        state = ?summary.state,
        deleted = summary.deleted,
        skipped = summary.skipped,
        cancelled = summary.cancelled,
        failed = summary.failed,
        "prune run finished"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use std::sync::mpsc::Receiver;
    use tempfile::TempDir;

    fn request(roots: usize, targets: &[&str]) -> RunRequest {
        RunRequest::new(
            (0..roots).map(|i| PathBuf::from(format!("/p{}", i))).collect(),
            TargetName::parse_all(targets.iter().copied()).unwrap(),
        )
    }

    #[test]
    fn test_worker_count_scales_with_targets_per_root() {
        let req = request(10, &["Library", "Logs", "obj", "Temp", "UserSettings"]);
        assert_eq!(req.total(), 50);
        assert_eq!(req.worker_count(), 5 * DEFAULT_PARALLEL_ROOTS);
    }

    #[test]
    fn test_worker_count_never_exceeds_candidates() {
        let req = request(1, &["Library", "Temp"]);
        assert_eq!(req.worker_count(), 2);

        let empty = request(0, &["Library"]);
        assert_eq!(empty.worker_count(), 1);
    }

    #[test]
    fn test_worker_count_respects_cap() {
        let req = request(3, &["Library", "Temp"]).with_options(PruneOptions {
            max_workers: Some(1),
            ..PruneOptions::default()
        });
        assert_eq!(req.worker_count(), 1);
    }

    /// Parks inside `remove_tree` until the test releases it.
    struct BlockingRemover {
        entered: Mutex<Sender<()>>,
        release: Mutex<Receiver<()>>,
    }

    impl Remover for BlockingRemover {
        fn remove_tree(&self, path: &Path) -> io::Result<()> {
            let _ = self.entered.lock().unwrap().send(());
            let _ = self.release.lock().unwrap().recv();
            fs::remove_dir_all(path)
        }
    }

    #[test]
    fn test_second_start_rejected_while_active() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("Temp")).unwrap();

        let (entered_tx, entered_rx) = channel();
        let (release_tx, release_rx) = channel();
        let pruner = Pruner::with_remover(BlockingRemover {
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        });
        let run_request = || {
            RunRequest::new(
                vec![tmp.path().to_path_buf()],
                TargetName::parse_all(["Temp"]).unwrap(),
            )
        };

        let handle = pruner.start(run_request(), CancelToken::new()).unwrap();
        entered_rx.recv().unwrap();

        assert!(pruner.is_running());
        let second = pruner.start(run_request(), CancelToken::new());
        assert!(matches!(second, Err(PruneError::RunActive)));

        release_tx.send(()).unwrap();
        let summary = handle.wait(&mut ());
        assert_eq!(summary.deleted, 1);
        assert!(!pruner.is_running());

        // The folder is gone, so the follow-up run never reaches the remover.
        let again = pruner
            .start(run_request(), CancelToken::new())
            .unwrap()
            .wait(&mut ());
        assert_eq!(again.skipped, 1);
        assert!(!pruner.is_running());
    }
}
