//! File enumeration and metadata collaborators consumed by the index build.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::SearchConfig;
use crate::error::{Result, SearchError};
use crate::extract::extract_text_content;
use crate::models::FileMeta;

/// Supplies the file set an index is built over.
#[async_trait]
pub trait FileSource: Send + Sync {
    /// Absolute paths of every file to index. Failing here aborts the build.
    async fn list_files(&self) -> Result<Vec<PathBuf>>;

    /// Size, modification time and extracted text for one path.
    ///
    /// Files without extractable text yield `content: None`; errors are
    /// reserved for I/O failures.
    async fn read_file_meta(&self, path: &Path) -> Result<FileMeta>;
}

/// Walks a directory tree on the local filesystem.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    include_hidden: bool,
    max_file_size: u64,
}

impl DirectorySource {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            root: config.root.clone(),
            include_hidden: config.include_hidden,
            max_file_size: config.max_file_size,
        }
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map_or(false, |name| name.starts_with('.'))
}

fn walk(root: &Path, include_hidden: bool) -> Result<Vec<PathBuf>> {
    let root = root.canonicalize().map_err(|source| SearchError::Enumeration {
        root: root.to_path_buf(),
        source,
    })?;
    // Surfaces an unreadable root as an enumeration failure rather than an empty index.
    std::fs::read_dir(&root).map_err(|source| SearchError::Enumeration {
        root: root.clone(),
        source,
    })?;

    let mut files = Vec::new();
    let walker = WalkDir::new(&root)
        .into_iter()
        .filter_entry(|entry| include_hidden || !is_hidden(entry));
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn read_meta(path: &Path, max_file_size: u64) -> Result<FileMeta> {
    let metadata = std::fs::metadata(path)?;
    let last_modified = metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_default();

    let content = if metadata.len() > max_file_size {
        debug!("Indexing {} by name only ({} bytes)", path.display(), metadata.len());
        None
    } else {
        match extract_text_content(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Error extracting content from {}: {}", path.display(), e);
                None
            }
        }
    };

    Ok(FileMeta {
        content,
        size: metadata.len(),
        last_modified,
    })
}

#[async_trait]
impl FileSource for DirectorySource {
    async fn list_files(&self) -> Result<Vec<PathBuf>> {
        let root = self.root.clone();
        let include_hidden = self.include_hidden;
        tokio::task::spawn_blocking(move || walk(&root, include_hidden))
            .await
            .map_err(|e| SearchError::Io(std::io::Error::other(e)))?
    }

    async fn read_file_meta(&self, path: &Path) -> Result<FileMeta> {
        let path = path.to_path_buf();
        let max_file_size = self.max_file_size;
        tokio::task::spawn_blocking(move || read_meta(&path, max_file_size))
            .await
            .map_err(|e| SearchError::Io(std::io::Error::other(e)))?
    }
}
