//! Configuration for indexing and snippet extraction.
//!
//! Loaded from `.filesearch.toml` in the current directory or
//! `~/.config/file-search/config.toml`, falling back to defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Result, SearchError};

const LOCAL_CONFIG: &str = ".filesearch.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Directory tree to index.
    pub root: PathBuf,
    /// Highest matcher distance (0 = perfect) still accepted as a fuzzy hit.
    pub fuzzy_threshold: f64,
    /// Emit a progress event every this many indexed files.
    pub progress_interval: usize,
    pub max_snippets: usize,
    /// Characters of context kept on each side of a snippet match.
    pub snippet_context: usize,
    /// Files above this size are indexed by name only.
    pub max_file_size: u64,
    pub include_hidden: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        let root = dirs::desktop_dir()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            root,
            fuzzy_threshold: 0.6,
            progress_interval: 100,
            max_snippets: 3,
            snippet_context: 150,
            max_file_size: 20 * 1024 * 1024,
            include_hidden: false,
        }
    }
}

impl SearchConfig {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Precedence: `./.filesearch.toml`, then `~/.config/file-search/config.toml`.
    pub fn load() -> Result<Self> {
        let local = PathBuf::from(LOCAL_CONFIG);
        if local.is_file() {
            return Self::from_path(&local);
        }

        if let Some(home) = dirs::home_dir() {
            let path = home.join(".config").join("file-search").join("config.toml");
            if path.is_file() {
                return Self::from_path(&path);
            }
        }

        Ok(Self::default())
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| SearchError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.fuzzy_threshold) {
            return Err(SearchError::Config(format!(
                "fuzzy_threshold must be within [0, 1], got {}",
                self.fuzzy_threshold
            )));
        }
        if self.progress_interval == 0 {
            return Err(SearchError::Config("progress_interval must be positive".into()));
        }
        if self.max_snippets == 0 {
            return Err(SearchError::Config("max_snippets must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "root = \"/srv/docs\"\nsnippet_context = 80\n").unwrap();

        let config = SearchConfig::from_path(&path).unwrap();
        assert_eq!(config.root, PathBuf::from("/srv/docs"));
        assert_eq!(config.snippet_context, 80);
        assert_eq!(config.progress_interval, 100);
        assert_eq!(config.max_snippets, 3);
        assert!((config.fuzzy_threshold - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "fuzzy_threshold = 1.5\n").unwrap();

        let err = SearchConfig::from_path(&path).unwrap_err();
        assert!(matches!(err, SearchError::Config(_)));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "progress_interval = \"often\"\n").unwrap();

        assert!(matches!(SearchConfig::from_path(&path), Err(SearchError::Config(_))));
    }
}
