use super::types::{Candidate, Liveness, ResolvedCandidate, TargetName};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Cross product of roots and names, root-major, without touching the disk.
pub fn resolve_candidates(roots: &[PathBuf], names: &[TargetName]) -> Vec<Candidate> {
    let mut candidates = Vec::with_capacity(roots.len() * names.len());

    for root in roots {
        for name in names {
            candidates.push(Candidate::new(candidates.len(), root, name));
        }
    }

    candidates
}

/// Resolves every candidate and classifies it against the current disk state.
///
/// One bad root only affects its own candidates.
pub fn resolve(roots: &[PathBuf], names: &[TargetName]) -> Vec<ResolvedCandidate> {
    let valid_roots: Vec<bool> = roots
        .iter()
        .map(|root| {
            let valid = root.is_dir();
            if !valid {
                warn!(root = %root.display(), "root is missing or not a directory");
            }
            valid
        })
        .collect();

    resolve_candidates(roots, names)
        .into_iter()
        .map(|candidate| {
            let root_valid = names.is_empty() || valid_roots[candidate.index / names.len()];
            let liveness = if !root_valid {
                Liveness::RootInvalid
            } else if is_live_dir(&candidate.path) {
                Liveness::Live
            } else {
                Liveness::Missing
            };
            debug!(path = %candidate.path.display(), ?liveness, "resolved candidate");

            ResolvedCandidate {
                candidate,
                liveness,
            }
        })
        .collect()
}

/// A real directory at `path`. Symlinks are not followed.
pub fn is_live_dir(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|meta| meta.file_type().is_dir())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn names(list: &[&str]) -> Vec<TargetName> {
        TargetName::parse_all(list.iter().copied()).unwrap()
    }

    #[test]
    fn test_cross_product_is_root_major_and_unique() {
        let roots = vec![PathBuf::from("/p1"), PathBuf::from("/p2")];
        let candidates = resolve_candidates(&roots, &names(&["Library", "Temp", "obj"]));

        assert_eq!(candidates.len(), 6);
        assert_eq!(candidates[0].path, PathBuf::from("/p1/Library"));
        assert_eq!(candidates[2].path, PathBuf::from("/p1/obj"));
        assert_eq!(candidates[3].path, PathBuf::from("/p2/Library"));

        let unique: HashSet<_> = candidates.iter().map(|c| c.path.clone()).collect();
        assert_eq!(unique.len(), 6);
        assert!(candidates.iter().enumerate().all(|(i, c)| c.index == i));
    }

    #[test]
    fn test_empty_inputs() {
        let roots = vec![PathBuf::from("/p1")];
        assert!(resolve(&roots, &[]).is_empty());
        assert!(resolve(&[], &names(&["Temp"])).is_empty());
    }

    #[test]
    fn test_classifies_live_missing_and_invalid_root() {
        let tmp = TempDir::new().unwrap();
        let p1 = tmp.path().join("p1");
        fs::create_dir_all(p1.join("Library")).unwrap();
        fs::write(p1.join("Temp"), b"not a dir").unwrap();
        let ghost = tmp.path().join("ghost");

        let resolved = resolve(&[p1, ghost], &names(&["Library", "Temp"]));
        let liveness: Vec<_> = resolved.iter().map(|r| r.liveness).collect();

        assert_eq!(
            liveness,
            vec![
                Liveness::Live,
                Liveness::Missing,
                Liveness::RootInvalid,
                Liveness::RootInvalid
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_target_is_not_live() {
        let tmp = TempDir::new().unwrap();
        let outside = tmp.path().join("outside");
        let root = tmp.path().join("project");
        fs::create_dir_all(&outside).unwrap();
        fs::create_dir_all(&root).unwrap();
        std::os::unix::fs::symlink(&outside, root.join("Library")).unwrap();

        let resolved = resolve(&[root], &names(&["Library"]));
        assert_eq!(resolved[0].liveness, Liveness::Missing);
    }
}
