use super::error::{PruneError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Folder names removed when the configuration does not say otherwise.
///
/// These are the regeneratable folders of a Unity project.
pub const DEFAULT_TARGETS: &[&str] = &["Library", "Logs", "obj", "Temp", "UserSettings"];

/// A literal folder name (never a path) looked up directly under each root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetName(String);

impl TargetName {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let reason = if name.is_empty() {
            Some("name is empty")
        } else if name == "." || name == ".." {
            Some("name refers to a directory itself")
        } else if name.contains(['/', '\\']) {
            Some("name contains a path separator")
        } else if name.contains('\0') {
            Some("name contains a NUL byte")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(PruneError::InvalidTargetName { name, reason }),
            None => Ok(Self(name)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn defaults() -> Vec<TargetName> {
        DEFAULT_TARGETS
            .iter()
            .map(|name| TargetName(name.to_string()))
            .collect()
    }

    pub fn parse_all<I, S>(names: I) -> Result<Vec<TargetName>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().map(TargetName::new).collect()
    }
}

impl TryFrom<String> for TargetName {
    type Error = PruneError;

    fn try_from(value: String) -> Result<Self> {
        TargetName::new(value)
    }
}

impl From<TargetName> for String {
    fn from(name: TargetName) -> Self {
        name.0
    }
}

impl AsRef<Path> for TargetName {
    fn as_ref(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl fmt::Display for TargetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One `(root, name)` pairing realized as `root/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Candidate {
    /// Position in root-major enumeration order.
    pub index: usize,
    pub root: PathBuf,
    pub name: TargetName,
    pub path: PathBuf,
}

impl Candidate {
    pub fn new(index: usize, root: &Path, name: &TargetName) -> Self {
        Self {
            index,
            root: root.to_path_buf(),
            name: name.clone(),
            path: root.join(name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Liveness {
    Live,
    Missing,
    RootInvalid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCandidate {
    pub candidate: Candidate,
    pub liveness: Liveness,
}

impl ResolvedCandidate {
    pub fn is_live(&self) -> bool {
        self.liveness == Liveness::Live
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NotFound,
    RootInvalid,
    Cancelled,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotFound => write!(f, "not found"),
            SkipReason::RootInvalid => write!(f, "root invalid"),
            SkipReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionOutcome {
    Deleted { freed_bytes: u64 },
    Skipped(SkipReason),
    Failed { reason: String },
}

impl DeletionOutcome {
    pub fn is_deleted(&self) -> bool {
        matches!(self, DeletionOutcome::Deleted { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeletionOutcome::Deleted { .. } => "deleted",
            DeletionOutcome::Skipped(_) => "skipped",
            DeletionOutcome::Failed { .. } => "failed",
        }
    }
}

impl From<PruneError> for DeletionOutcome {
    fn from(err: PruneError) -> Self {
        match err {
            PruneError::RootInvalid(_) => DeletionOutcome::Skipped(SkipReason::RootInvalid),
            PruneError::Cancelled => DeletionOutcome::Skipped(SkipReason::Cancelled),
            PruneError::DeletionFailed { source, .. } => DeletionOutcome::Failed {
                reason: source.to_string(),
            },
            other => DeletionOutcome::Failed {
                reason: other.to_string(),
            },
        }
    }
}

/// Sent once per visited candidate.
#[derive(Debug, Clone)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
    pub candidate: Candidate,
    pub outcome: DeletionOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Completed,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub state: RunState,
    pub total: usize,
    pub deleted: usize,
    /// Not found or under an invalid root.
    pub skipped: usize,
    /// Never started because cancellation was observed first.
    pub cancelled: usize,
    pub failed: usize,
    pub freed_bytes: u64,
    pub failures: Vec<(PathBuf, String)>,
    pub duration: Duration,
}

impl RunSummary {
    pub fn new(total: usize) -> Self {
        Self {
            state: RunState::Completed,
            total,
            deleted: 0,
            skipped: 0,
            cancelled: 0,
            failed: 0,
            freed_bytes: 0,
            failures: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    pub fn record(&mut self, candidate: &Candidate, outcome: &DeletionOutcome) {
        match outcome {
            DeletionOutcome::Deleted { freed_bytes } => {
                self.deleted += 1;
                self.freed_bytes += freed_bytes;
            }
            DeletionOutcome::Skipped(SkipReason::Cancelled) => self.cancelled += 1,
            DeletionOutcome::Skipped(_) => self.skipped += 1,
            DeletionOutcome::Failed { reason } => {
                self.failed += 1;
                self.failures.push((candidate.path.clone(), reason.clone()));
            }
        }
    }

    pub fn visited(&self) -> usize {
        self.deleted + self.skipped + self.cancelled + self.failed
    }

    pub fn is_cancelled(&self) -> bool {
        self.state == RunState::Cancelled
    }
}

#[derive(Debug, Clone)]
pub enum RunEvent {
    Progress(Progress),
    Complete(RunSummary),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_name_rejects_paths() {
        assert!(TargetName::new("Library").is_ok());
        assert!(TargetName::new(".gradle").is_ok());
        assert!(TargetName::new("").is_err());
        assert!(TargetName::new("..").is_err());
        assert!(TargetName::new(".").is_err());
        assert!(TargetName::new("a/b").is_err());
        assert!(TargetName::new("a\\b").is_err());
    }

    #[test]
    fn test_target_name_deserialize_validates() {
        let ok: Vec<TargetName> = serde_json::from_str(r#"["Temp","obj"]"#).unwrap();
        assert_eq!(ok[1].as_str(), "obj");

        let bad = serde_json::from_str::<Vec<TargetName>>(r#"["../etc"]"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_candidate_joins_root_and_name() {
        let name = TargetName::new("Temp").unwrap();
        let candidate = Candidate::new(3, Path::new("/p1"), &name);
        assert_eq!(candidate.path, PathBuf::from("/p1/Temp"));
        assert_eq!(candidate.index, 3);
    }

    #[test]
    fn test_summary_record_buckets() {
        let name = TargetName::new("Temp").unwrap();
        let candidate = Candidate::new(0, Path::new("/p"), &name);
        let mut summary = RunSummary::new(4);

        summary.record(&candidate, &DeletionOutcome::Deleted { freed_bytes: 10 });
        summary.record(&candidate, &DeletionOutcome::Skipped(SkipReason::NotFound));
        summary.record(&candidate, &DeletionOutcome::Skipped(SkipReason::Cancelled));
        summary.record(
            &candidate,
            &DeletionOutcome::Failed {
                reason: "denied".into(),
            },
        );

        assert_eq!(summary.deleted, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.cancelled, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.freed_bytes, 10);
        assert_eq!(summary.visited(), 4);
        assert_eq!(summary.failures[0].1, "denied");
    }

    #[test]
    fn test_outcome_from_error() {
        assert_eq!(
            DeletionOutcome::from(PruneError::Cancelled),
            DeletionOutcome::Skipped(SkipReason::Cancelled)
        );
        assert_eq!(
            DeletionOutcome::from(PruneError::RootInvalid(PathBuf::from("/x"))),
            DeletionOutcome::Skipped(SkipReason::RootInvalid)
        );
    }
}
