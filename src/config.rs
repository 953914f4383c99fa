use crate::engine::{PruneOptions, TargetName};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub prune: PruneConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PruneConfig {
    #[serde(default = "default_targets")]
    pub targets: Vec<TargetName>,
    #[serde(default = "default_parallel_roots")]
    pub max_parallel_roots: usize,
    #[serde(default)]
    pub measure_freed: bool,
}

fn default_targets() -> Vec<TargetName> {
    TargetName::defaults()
}

fn default_parallel_roots() -> usize {
    PruneOptions::default().max_parallel_roots
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self {
            targets: default_targets(),
            max_parallel_roots: default_parallel_roots(),
            measure_freed: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_true")]
    pub progress: bool,
    #[serde(default)]
    pub show_sizes_in_bytes: bool,
}

fn default_true() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            progress: true,
            show_sizes_in_bytes: false,
        }
    }
}

pub const SETTABLE_KEYS: &[&str] = &[
    "targets",
    "max_parallel_roots",
    "measure_freed",
    "progress",
    "show_sizes_in_bytes",
];

impl Config {
    /// Reads `path`, writing the defaults there first if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("invalid config {}", path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("failed to write config {}", path.display()))?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dirprune")
            .join("config.toml")
    }

    pub fn add_target(&mut self, name: TargetName) -> bool {
        if self.prune.targets.contains(&name) {
            return false;
        }
        self.prune.targets.push(name);
        true
    }

    pub fn remove_target(&mut self, name: &str) -> bool {
        let before = self.prune.targets.len();
        self.prune.targets.retain(|t| t.as_str() != name);
        self.prune.targets.len() != before
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "targets" => {
                let names = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty());
                self.prune.targets = TargetName::parse_all(names)?;
            }
            "max_parallel_roots" => {
                let n: usize = value
                    .parse()
                    .with_context(|| format!("max_parallel_roots must be a number: {}", value))?;
                if n == 0 {
                    bail!("max_parallel_roots must be at least 1");
                }
                self.prune.max_parallel_roots = n;
            }
            "measure_freed" => self.prune.measure_freed = parse_bool(key, value)?,
            "progress" => self.output.progress = parse_bool(key, value)?,
            "show_sizes_in_bytes" => self.output.show_sizes_in_bytes = parse_bool(key, value)?,
            _ => bail!(
                "unknown key: {} (available: {})",
                key,
                SETTABLE_KEYS.join(", ")
            ),
        }
        Ok(())
    }

    pub fn prune_options(&self) -> PruneOptions {
        PruneOptions {
            max_parallel_roots: self.prune.max_parallel_roots.max(1),
            max_workers: None,
            measure_freed: self.prune.measure_freed,
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    value
        .parse()
        .with_context(|| format!("{} must be true or false: {}", key, value))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prune: PruneConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_writes_defaults_when_missing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.prune.targets, TargetName::defaults());
        assert_eq!(config.prune.max_parallel_roots, 4);

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.prune.targets, config.prune.targets);
    }

    #[test]
    fn test_partial_file_uses_field_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[prune]\ntargets = [\"Temp\", \".gradle\"]\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        let names: Vec<_> = config.prune.targets.iter().map(|t| t.as_str()).collect();
        assert_eq!(names, vec!["Temp", ".gradle"]);
        assert_eq!(config.prune.max_parallel_roots, 4);
        assert!(config.output.progress);
    }

    #[test]
    fn test_rejects_path_like_target() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[prune]\ntargets = [\"../home\"]\n").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_set_and_targets() {
        let mut config = Config::default();

        config.set("targets", "Library, Temp").unwrap();
        assert_eq!(config.prune.targets.len(), 2);

        config.set("max_parallel_roots", "8").unwrap();
        assert_eq!(config.prune_options().max_parallel_roots, 8);
        assert!(config.set("max_parallel_roots", "0").is_err());

        config.set("measure_freed", "true").unwrap();
        assert!(config.prune_options().measure_freed);
        assert!(config.set("progress", "maybe").is_err());
        assert!(config.set("nope", "1").is_err());

        assert!(config.add_target(TargetName::new("obj").unwrap()));
        assert!(!config.add_target(TargetName::new("obj").unwrap()));
        assert!(config.remove_target("Temp"));
        assert!(!config.remove_target("Temp"));
    }
}
