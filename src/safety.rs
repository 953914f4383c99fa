use anyhow::{bail, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootCheck {
    Safe,
    Missing,
    Protected(&'static str),
}

/// Host-side guard applied to roots before they reach the engine.
pub struct SafetyChecker {
    protected_paths: Vec<&'static str>,
    home: Option<PathBuf>,
}

impl SafetyChecker {
    pub fn new() -> Self {
        Self::with_rules(
            vec![
                "/System",
                "/usr",
                "/bin",
                "/sbin",
                "/etc",
                "/var/db",
                "/private/var/db",
                "/Library",
                "C:\\Windows",
                "C:\\Program Files",
            ],
            dirs::home_dir(),
        )
    }

    /// Builds a checker with an explicit protected list and home directory.
    /// `home` is canonicalized so it compares equal to canonicalized roots.
    pub fn with_rules(protected_paths: Vec<&'static str>, home: Option<PathBuf>) -> Self {
        Self {
            protected_paths,
            home: home.map(|h| canonical_root(&h)),
        }
    }

    pub fn check_root(&self, path: &Path) -> RootCheck {
        let path = simplify_path(path);

        if is_filesystem_root(&path) {
            return RootCheck::Protected("filesystem root");
        }

        if self.home.as_deref() == Some(path.as_path()) {
            return RootCheck::Protected("home directory");
        }

        for protected in &self.protected_paths {
            if path.starts_with(protected) {
                return RootCheck::Protected("system directory");
            }
        }

        if !path.is_dir() {
            return RootCheck::Missing;
        }

        RootCheck::Safe
    }
}

impl Default for SafetyChecker {
    fn default() -> Self {
        Self::new()
    }
}

/// Canonicalizes, de-duplicates and safety-checks the roots. Missing roots
/// are kept so the engine reports them as invalid.
pub fn prepare_roots(checker: &SafetyChecker, roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut prepared: Vec<PathBuf> = Vec::with_capacity(roots.len());

    for root in roots {
        let root = canonical_root(root);
        match checker.check_root(&root) {
            RootCheck::Safe => {}
            RootCheck::Missing => {
                warn!(root = %root.display(), "root is not a directory and will be skipped");
            }
            RootCheck::Protected(reason) => {
                bail!("refusing to prune {} ({})", root.display(), reason)
            }
        }

        if prepared.contains(&root) {
            debug!(root = %root.display(), "dropping duplicate root");
            continue;
        }
        prepared.push(root);
    }

    Ok(prepared)
}

/// `fs::canonicalize` without the Windows verbatim prefix. Paths that cannot
/// be canonicalized (usually because they do not exist) are returned as given.
pub fn canonical_root(path: &Path) -> PathBuf {
    match fs::canonicalize(path) {
        Ok(canonical) => simplify_path(&canonical),
        Err(_) => path.to_path_buf(),
    }
}

/// Rewrites `\\?\C:\dir` to `C:\dir` and `\\?\UNC\server\share` to
/// `\\server\share`. Other verbatim forms and ordinary paths are unchanged.
pub fn simplify_path(path: &Path) -> PathBuf {
    let Some(text) = path.to_str() else {
        return path.to_path_buf();
    };
    let Some(rest) = text.strip_prefix(r"\\?\") else {
        return path.to_path_buf();
    };

    if let Some(unc) = rest.strip_prefix(r"UNC\") {
        return PathBuf::from(format!(r"\\{}", unc));
    }

    let bytes = rest.as_bytes();
    let is_disk = bytes.len() >= 2
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes.len() == 2 || bytes[2] == b'\\');
    if is_disk {
        PathBuf::from(rest)
    } else {
        path.to_path_buf()
    }
}

fn is_filesystem_root(path: &Path) -> bool {
    let mut components = path.components().peekable();
    if components.peek().is_none() {
        return false;
    }
    components.all(|c| matches!(c, Component::RootDir | Component::Prefix(_)))
}
