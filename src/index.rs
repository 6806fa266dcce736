//! The in-memory file index and its build lifecycle.
//!
//! A build fills a fresh [`IndexSnapshot`] and swaps it in whole, so queries
//! running during a build keep seeing the previous complete generation.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::config::SearchConfig;
use crate::engine;
use crate::error::Result;
use crate::fuzzy::FilenameMatcher;
use crate::models::{
    BuildOutcome, FileMeta, IndexEntry, IndexEvent, IndexStats, SearchOptions, SearchResult,
};
use crate::source::{DirectorySource, FileSource};

const EVENT_CAPACITY: usize = 256;

/// One generation of indexed files plus the filename matcher built over them.
#[derive(Debug, Default)]
pub struct IndexSnapshot {
    entries: Vec<IndexEntry>,
    matcher: FilenameMatcher,
}

impl IndexSnapshot {
    fn new(entries: Vec<IndexEntry>) -> Self {
        let matcher = FilenameMatcher::new(entries.iter().map(|entry| entry.filename.clone()));
        Self { entries, matcher }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }
}

/// Accumulates entries for a build, replacing rather than duplicating repeated paths.
#[derive(Default)]
struct SnapshotBuilder {
    entries: Vec<IndexEntry>,
    positions: HashMap<String, usize>,
}

impl SnapshotBuilder {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity(capacity),
        }
    }

    fn insert(&mut self, entry: IndexEntry) {
        match self.positions.get(&entry.path) {
            Some(&idx) => self.entries[idx] = entry,
            None => {
                self.positions.insert(entry.path.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    fn finish(self) -> IndexSnapshot {
        IndexSnapshot::new(self.entries)
    }
}

/// Clears the building flag however the build ends.
struct BuildGuard<'a>(&'a AtomicBool);

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct FileIndex {
    source: Box<dyn FileSource>,
    config: SearchConfig,
    snapshot: RwLock<Arc<IndexSnapshot>>,
    building: AtomicBool,
    events: broadcast::Sender<IndexEvent>,
}

impl FileIndex {
    /// Indexes `config.root` on the local filesystem.
    pub fn new(config: SearchConfig) -> Self {
        let source = DirectorySource::new(&config);
        Self::with_source(config, source)
    }

    pub fn with_source(config: SearchConfig, source: impl FileSource + 'static) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            source: Box::new(source),
            config,
            snapshot: RwLock::new(Arc::new(IndexSnapshot::default())),
            building: AtomicBool::new(false),
            events,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Lifecycle events of every subsequent build.
    pub fn subscribe(&self) -> broadcast::Receiver<IndexEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: IndexEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// The generation queries currently run against.
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.snapshot.read().clone()
    }

    /// Rebuilds the index from the file source.
    ///
    /// Only one build runs at a time; a call made while another is in flight
    /// returns [`BuildOutcome::AlreadyRunning`] without touching the source.
    /// If listing files fails, the previous generation stays in place and the
    /// error is returned after a [`IndexEvent::Failed`] is emitted.
    pub async fn build_index(&self) -> Result<BuildOutcome> {
        if self
            .building
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Index build already in progress, skipping");
            return Ok(BuildOutcome::AlreadyRunning);
        }
        let _guard = BuildGuard(&self.building);

        info!("Indexing files...");
        self.emit(IndexEvent::Started);

        let paths = match self.source.list_files().await {
            Ok(paths) => paths,
            Err(e) => {
                error!("Failed to list files: {}", e);
                self.emit(IndexEvent::Failed {
                    error: e.to_string(),
                });
                return Err(e);
            }
        };

        let total = paths.len();
        let interval = self.config.progress_interval.max(1);
        let mut builder = SnapshotBuilder::with_capacity(total);
        for (idx, path) in paths.iter().enumerate() {
            let meta = match self.source.read_file_meta(path).await {
                Ok(meta) => meta,
                Err(e) => {
                    warn!("Indexing {} without content: {}", path.display(), e);
                    FileMeta::default()
                }
            };
            builder.insert(IndexEntry::new(path.to_string_lossy(), meta));

            let current = idx + 1;
            if current % interval == 0 {
                debug!("Indexed {}/{} files", current, total);
                self.emit(IndexEvent::Progress { current, total });
            }
        }

        let snapshot = builder.finish();
        let total_files = snapshot.len();
        *self.snapshot.write() = Arc::new(snapshot);

        info!("Indexing complete! {} files indexed", total_files);
        self.emit(IndexEvent::Completed { total_files });
        Ok(BuildOutcome::Completed { total_files })
    }

    /// Ranked results for `query`, at most [`engine::MAX_RESULTS`].
    pub fn search(&self, query: &str, options: &SearchOptions) -> Vec<SearchResult> {
        let snapshot = self.snapshot();
        if snapshot.is_empty() {
            return Vec::new();
        }
        engine::search(
            &snapshot.entries,
            &snapshot.matcher,
            query,
            options,
            &self.config,
        )
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            total_files: self.snapshot.read().len(),
            is_indexing: self.building.load(Ordering::Acquire),
        }
    }
}
