use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to list files under {}: {source}", root.display())]
    Enumeration {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to extract content from {}: {reason}", path.display())]
    Extraction { path: PathBuf, reason: String },
    #[error("PDF extraction error: {0}")]
    PdfExtraction(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SearchError>;
