use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// The deletion primitive used by the scheduler.
pub trait Remover: Send + Sync {
    /// Recursively removes the directory tree rooted at `path`.
    fn remove_tree(&self, path: &Path) -> io::Result<()>;

    /// Bytes that removing `path` would free.
    fn measure(&self, path: &Path) -> u64 {
        calculate_dir_size(path)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FsRemover;

impl FsRemover {
    pub fn new() -> Self {
        Self
    }
}

impl Remover for FsRemover {
    fn remove_tree(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }
}

pub fn calculate_dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter_map(|e| e.metadata().ok())
        .filter(|m| m.is_file())
        .map(|m| m.len())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_remove_nested_tree() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("Library");
        fs::create_dir_all(target.join("a/b/c")).unwrap();
        fs::write(target.join("a/b/c/file.bin"), vec![0u8; 128]).unwrap();
        fs::write(target.join("top.txt"), b"hello").unwrap();

        let remover = FsRemover::new();
        assert_eq!(remover.measure(&target), 133);

        remover.remove_tree(&target).unwrap();
        assert!(!target.exists());
        assert!(tmp.path().exists());
    }

    #[test]
    fn test_remove_missing_reports_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = FsRemover::new()
            .remove_tree(&tmp.path().join("nope"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
