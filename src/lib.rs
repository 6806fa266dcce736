//! Local file search: an in-memory index over filenames and extracted text,
//! queried with a ranking that combines exact, fuzzy, path and content matches.

pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod fuzzy;
pub mod index;
pub mod models;
pub mod snippet;
pub mod source;

pub use config::SearchConfig;
pub use engine::MAX_RESULTS;
pub use error::{Result, SearchError};
pub use index::{FileIndex, IndexSnapshot};
pub use models::{
    BuildOutcome, FileMeta, IndexEntry, IndexEvent, IndexStats, MatchType, SearchOptions,
    SearchResult, Snippet,
};
pub use snippet::extract_snippets;
pub use source::{DirectorySource, FileSource};
