//! Review configuration.
//!
//! An optional YAML file selects detectors, the raw-text needle and which
//! paths to leave out. Every field has a default, so an empty file is a
//! valid configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::detect::{DetectorKind, DEFAULT_NEEDLE};
use crate::syntax::ParseOptions;

/// File names looked up in the working directory when no config is given.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["java-reviewer.yaml", ".java-reviewer.yaml"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReviewConfig {
    /// Substring searched by the `raw_text_match` detector.
    #[serde(default = "default_needle")]
    pub raw_needle: String,
    /// Detectors to run. Empty means all of them.
    #[serde(default)]
    pub detectors: Vec<DetectorKind>,
    /// Glob patterns for paths to skip (e.g. "**/generated/**").
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    /// Scan files with syntax errors on their recovered tree instead of skipping them.
    #[serde(default)]
    pub allow_syntax_errors: bool,
    #[serde(default = "default_true")]
    pub parallel: bool,
    /// Per-file parse time limit in milliseconds.
    #[serde(default)]
    pub parse_timeout_ms: Option<u64>,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            raw_needle: default_needle(),
            detectors: Vec::new(),
            excluded_paths: Vec::new(),
            allow_syntax_errors: false,
            parallel: true,
            parse_timeout_ms: None,
        }
    }
}

fn default_needle() -> String {
    DEFAULT_NEEDLE.to_string()
}

fn default_true() -> bool {
    true
}

impl ReviewConfig {
    /// Parse a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse_str(&content)
    }

    pub fn parse_str(content: &str) -> anyhow::Result<Self> {
        // serde_yaml reads an empty document as null
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: ReviewConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Find a config file in `dir`.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        DEFAULT_CONFIG_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Load the file at `explicit`, else a discovered one in `dir`, else defaults.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> anyhow::Result<(Self, Option<PathBuf>)> {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => Self::discover(dir),
        };
        let config = match &path {
            Some(p) => Self::parse_file(p)
                .map_err(|e| anyhow::anyhow!("cannot load config {}: {}", p.display(), e))?,
            None => Self::default(),
        };
        if let Some(p) = &path {
            tracing::debug!(path = %p.display(), "loaded config");
        }
        Ok((config, path))
    }

    /// Detectors to run, deduplicated and in canonical order.
    pub fn enabled_detectors(&self) -> Vec<DetectorKind> {
        if self.detectors.is_empty() {
            return DetectorKind::ALL.to_vec();
        }
        let mut kinds = self.detectors.clone();
        kinds.sort();
        kinds.dedup();
        kinds
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            allow_errors: self.allow_syntax_errors,
            timeout: self.parse_timeout_ms.map(Duration::from_millis),
        }
    }

    /// Check if a path should be excluded based on excluded_paths patterns.
    /// Uses globset for matching, which supports `**` for recursive directory matching.
    pub fn is_path_excluded(&self, path: &Path) -> bool {
        if self.excluded_paths.is_empty() {
            return false;
        }

        let path_str = path.to_string_lossy();
        self.excluded_paths.iter().any(|pattern| {
            globset::Glob::new(pattern)
                .map(|g| g.compile_matcher().is_match(&*path_str))
                .unwrap_or(false)
        })
    }

    /// Reject configurations that cannot run.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.raw_needle.is_empty() && self.enabled_detectors().contains(&DetectorKind::RawTextMatch) {
            anyhow::bail!("raw_needle must not be empty while raw_text_match is enabled");
        }

        for pattern in &self.excluded_paths {
            globset::Glob::new(pattern)
                .map_err(|e| anyhow::anyhow!("invalid excluded_paths pattern {:?}: {}", pattern, e))?;
        }

        if self.parse_timeout_ms == Some(0) {
            anyhow::bail!("parse_timeout_ms must be positive");
        }

        Ok(())
    }
}
