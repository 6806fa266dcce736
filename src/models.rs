use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One indexed file. Immutable once a build has inserted it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct IndexEntry {
    pub path: String,
    pub filename: String,
    pub last_modified: DateTime<Utc>,
    pub size: u64,
    #[serde(skip_serializing)]
    pub content: Option<String>,
}

impl IndexEntry {
    pub fn new(path: impl Into<String>, meta: FileMeta) -> Self {
        let path = path.into();
        let filename = Path::new(&path)
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.clone());

        Self {
            path,
            filename,
            last_modified: meta.last_modified,
            size: meta.size,
            content: meta.content,
        }
    }

    /// Filename without its final extension, e.g. `report.final` for `report.final.pdf`.
    pub fn stem(&self) -> &str {
        file_stem(&self.filename)
    }

    /// Lower-cased extension without the leading dot.
    pub fn extension(&self) -> Option<String> {
        match self.filename.rfind('.') {
            Some(idx) if idx > 0 && idx + 1 < self.filename.len() => {
                Some(self.filename[idx + 1..].to_lowercase())
            }
            _ => None,
        }
    }

    /// The path with the filename segment removed.
    pub fn directory(&self) -> &str {
        let cut = self.path.len().saturating_sub(self.filename.len());
        if self.path.ends_with(&self.filename) {
            &self.path[..cut]
        } else {
            ""
        }
    }
}

/// Strips the final extension; dot-files keep their whole name.
pub fn file_stem(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(idx) if idx > 0 => &filename[..idx],
        _ => filename,
    }
}

/// What the content-extraction collaborator reports for a single path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileMeta {
    pub content: Option<String>,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Exact,
    Fuzzy,
    Path,
    Content,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Snippet {
    pub text: String,
    pub score: f64,
    /// Character offset of the excerpt inside the document text.
    pub position: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SearchResult {
    pub path: String,
    pub filename: String,
    pub last_modified: DateTime<Utc>,
    pub size: u64,
    pub score: f64,
    pub match_type: MatchType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippets: Option<Vec<Snippet>>,
}

impl SearchResult {
    pub(crate) fn from_entry(entry: &IndexEntry, score: f64, match_type: MatchType) -> Self {
        Self {
            path: entry.path.clone(),
            filename: entry.filename.clone(),
            last_modified: entry.last_modified,
            size: entry.size,
            score,
            match_type,
            snippets: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SearchOptions {
    /// Extensions to keep, case-insensitive, with or without the leading dot.
    #[serde(default)]
    pub file_types: Option<Vec<String>>,
}

impl SearchOptions {
    pub fn with_file_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            file_types: Some(types.into_iter().map(Into::into).collect()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    pub total_files: usize,
    pub is_indexing: bool,
}

/// Lifecycle signals emitted by a build.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum IndexEvent {
    Started,
    Progress { current: usize, total: usize },
    Completed { total_files: usize },
    Failed { error: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    Completed { total_files: usize },
    /// Another build was already in flight; this call did nothing.
    AlreadyRunning,
}
