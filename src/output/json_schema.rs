use crate::engine::{DeletionOutcome, Liveness, Progress, RunState, RunSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub roots: Vec<PathBuf>,
    pub targets: Vec<String>,
    pub total_candidates: usize,
    pub live_count: usize,
    pub total_size_bytes: u64,
    pub items: Vec<ScanItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanItem {
    pub path: PathBuf,
    pub target: String,
    pub state: Liveness,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PruneReport {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub status: RunState,
    pub total: usize,
    pub deleted_count: usize,
    pub skipped_count: usize,
    pub cancelled_count: usize,
    pub failed_count: usize,
    pub freed_bytes: u64,
    pub duration_ms: u64,
    pub items: Vec<PruneItem>,
    pub failed_items: Vec<FailedItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PruneItem {
    pub index: usize,
    pub path: PathBuf,
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freed_bytes: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedItem {
    pub path: PathBuf,
    pub error: String,
}

impl ScanReport {
    pub fn new(roots: Vec<PathBuf>, targets: Vec<String>, items: Vec<ScanItem>) -> Self {
        let live_count = items.iter().filter(|i| i.state == Liveness::Live).count();
        let total_size_bytes = items.iter().filter_map(|i| i.size_bytes).sum();

        Self {
            version: SCHEMA_VERSION.to_string(),
            timestamp: Utc::now(),
            roots,
            targets,
            total_candidates: items.len(),
            live_count,
            total_size_bytes,
            items,
        }
    }
}

impl From<&Progress> for PruneItem {
    fn from(progress: &Progress) -> Self {
        let (reason, freed_bytes) = match &progress.outcome {
            DeletionOutcome::Deleted { freed_bytes } => (None, Some(*freed_bytes)),
            DeletionOutcome::Skipped(reason) => (Some(reason.to_string()), None),
            DeletionOutcome::Failed { reason } => (Some(reason.clone()), None),
        };

        Self {
            index: progress.candidate.index,
            path: progress.candidate.path.clone(),
            outcome: progress.outcome.label().to_string(),
            reason,
            freed_bytes,
        }
    }
}

impl PruneReport {
    pub fn new(summary: &RunSummary, mut items: Vec<PruneItem>) -> Self {
        items.sort_by_key(|i| i.index);

        Self {
            version: SCHEMA_VERSION.to_string(),
            timestamp: Utc::now(),
            status: summary.state,
            total: summary.total,
            deleted_count: summary.deleted,
            skipped_count: summary.skipped,
            cancelled_count: summary.cancelled,
            failed_count: summary.failed,
            freed_bytes: summary.freed_bytes,
            duration_ms: u64::try_from(summary.duration.as_millis()).unwrap_or(u64::MAX),
            items,
            failed_items: summary
                .failures
                .iter()
                .map(|(path, error)| FailedItem {
                    path: path.clone(),
                    error: error.clone(),
                })
                .collect(),
        }
    }
}
