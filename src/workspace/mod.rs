//! Filesystem and search collaborator contracts
//!
//! Tools never touch the disk directly - all I/O goes through these traits
//! so the host editor can plug in its own indexed backends. [`LocalFs`] and
//! [`LocalSearch`] are the plain disk-backed defaults.

mod local;

pub use local::{LocalFs, LocalSearch};

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A single directory entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Filesystem access contract
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Read a file's full contents as UTF-8 text
    async fn read_to_string(&self, path: &Path) -> std::io::Result<String>;

    /// List one directory level (no recursion)
    async fn read_dir(&self, path: &Path) -> std::io::Result<Vec<FileEntry>>;

    /// File size in bytes
    async fn file_size(&self, path: &Path) -> std::io::Result<u64>;
}

/// Options for a workspace text search
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub query: String,
    pub case_sensitive: bool,
    pub whole_word: bool,
    /// Treat `query` as a regex instead of a literal
    pub regex: bool,
    /// Glob filter on file names, e.g. `*.rs`
    pub include_pattern: Option<String>,
    pub exclude_pattern: Option<String>,
}

/// One matching line within a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMatch {
    /// 1-based line number
    pub line: u64,
    /// Byte offset of the match within the line
    pub char_start: usize,
    pub char_end: usize,
    pub line_text: String,
}

/// The file a group of matches belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHit {
    pub name: String,
    pub path: PathBuf,
}

/// All matches found in one file
#[derive(Debug, Clone)]
pub struct FileSearchResult {
    pub file: FileHit,
    pub matches: Vec<LineMatch>,
}

/// Errors from the search collaborator
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Invalid search pattern: {0}")]
    InvalidPattern(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Full-text search contract
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Search under `root`, returning per-file match groups
    async fn search(&self, root: &Path, query: &SearchQuery) -> Result<Vec<FileSearchResult>, SearchError>;
}
