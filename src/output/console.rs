use super::json_schema::PruneItem;
use crate::engine::{DeletionOutcome, Progress, RunObserver, RunSummary};
use crate::utils::format_size_with;

/// Prints per-candidate progress to stderr and keeps every item for the
/// final report.
pub struct ConsoleObserver {
    show_progress: bool,
    raw_sizes: bool,
    items: Vec<PruneItem>,
    last_current: usize,
}

impl ConsoleObserver {
    pub fn new(show_progress: bool, raw_sizes: bool) -> Self {
        Self {
            show_progress,
            raw_sizes,
            items: Vec::new(),
            last_current: 0,
        }
    }

    pub fn into_items(self) -> Vec<PruneItem> {
        self.items
    }

    fn describe(&self, outcome: &DeletionOutcome) -> String {
        match outcome {
            DeletionOutcome::Deleted { freed_bytes } if *freed_bytes > 0 => {
                format!("deleted ({})", format_size_with(*freed_bytes, self.raw_sizes))
            }
            DeletionOutcome::Deleted { .. } => "deleted".to_string(),
            DeletionOutcome::Skipped(reason) => format!("skipped: {}", reason),
            DeletionOutcome::Failed { reason } => format!("FAILED: {}", reason),
        }
    }
}

impl RunObserver for ConsoleObserver {
    fn on_progress(&mut self, progress: &Progress) {
        debug_assert!(progress.current > self.last_current);
        self.last_current = progress.current;

        if self.show_progress {
            eprintln!(
                "[{}/{}] {} {}",
                progress.current,
                progress.total,
                progress.candidate.path.display(),
                self.describe(&progress.outcome)
            );
        }
        self.items.push(PruneItem::from(progress));
    }

    fn on_complete(&mut self, summary: &RunSummary) {
        if self.show_progress && summary.is_cancelled() {
            eprintln!(
                "Cancelled: {} of {} folders were not started",
                summary.cancelled, summary.total
            );
        }
    }
}
