//! Disk-backed collaborator implementations

use std::path::Path;

use async_trait::async_trait;
use grep_matcher::Matcher;
use grep_regex::RegexMatcherBuilder;
use grep_searcher::sinks::UTF8;
use grep_searcher::{BinaryDetection, SearcherBuilder};
use tracing::debug;
use walkdir::WalkDir;

use super::{FileEntry, FileHit, FileSearchResult, FileSystem, LineMatch, SearchBackend, SearchError, SearchQuery};

/// Plain tokio-fs filesystem collaborator
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

#[async_trait]
impl FileSystem for LocalFs {
    async fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        tokio::fs::read_to_string(path).await
    }

    async fn read_dir(&self, path: &Path) -> std::io::Result<Vec<FileEntry>> {
        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(path).await?;

        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            let metadata = match entry.metadata().await {
                Ok(m) => m,
                Err(_) => {
                    debug!(%name, "LocalFs::read_dir: failed to get metadata, skipping entry");
                    continue;
                }
            };
            entries.push(FileEntry {
                name,
                path: entry.path(),
                is_dir: metadata.is_dir(),
            });
        }

        Ok(entries)
    }

    async fn file_size(&self, path: &Path) -> std::io::Result<u64> {
        let metadata = tokio::fs::metadata(path).await?;
        Ok(metadata.len())
    }
}

/// Search collaborator backed by the ripgrep libraries
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalSearch;

#[async_trait]
impl SearchBackend for LocalSearch {
    async fn search(&self, root: &Path, query: &SearchQuery) -> Result<Vec<FileSearchResult>, SearchError> {
        debug!(root = %root.display(), query = %query.query, "LocalSearch::search: called");

        let pattern = if query.regex {
            query.query.clone()
        } else {
            regex::escape(&query.query)
        };

        let matcher = RegexMatcherBuilder::new()
            .case_insensitive(!query.case_sensitive)
            .word(query.whole_word)
            .build(&pattern)
            .map_err(|e| SearchError::InvalidPattern(e.to_string()))?;

        let include = query.include_pattern.as_deref().and_then(|p| glob::Pattern::new(p).ok());
        let exclude = query.exclude_pattern.as_deref().and_then(|p| glob::Pattern::new(p).ok());

        let files: Vec<_> = if root.is_file() {
            vec![root.to_path_buf()]
        } else {
            WalkDir::new(root)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .filter(|e| {
                    let name = match e.path().file_name().and_then(|n| n.to_str()) {
                        Some(n) => n,
                        None => return false,
                    };
                    if let Some(ref inc) = include {
                        if !inc.matches(name) {
                            return false;
                        }
                    }
                    if let Some(ref exc) = exclude {
                        if exc.matches(name) {
                            return false;
                        }
                    }
                    true
                })
                .map(|e| e.path().to_path_buf())
                .collect()
        };

        debug!(file_count = %files.len(), "LocalSearch::search: files to search");

        let mut results = Vec::new();
        for file_path in files {
            let mut matches: Vec<LineMatch> = Vec::new();
            let mut searcher = SearcherBuilder::new()
                .binary_detection(BinaryDetection::quit(b'\x00'))
                .line_number(true)
                .build();

            let search_result = searcher.search_path(
                &matcher,
                &file_path,
                UTF8(|line_num, line| {
                    if let Ok(Some(found)) = matcher.find(line.as_bytes()) {
                        matches.push(LineMatch {
                            line: line_num,
                            char_start: found.start(),
                            char_end: found.end(),
                            line_text: line.trim_end().to_string(),
                        });
                    }
                    Ok(true)
                }),
            );

            if let Err(e) = search_result {
                // Binary files, permission errors etc - skip, don't fail the search
                debug!(path = %file_path.display(), %e, "LocalSearch::search: skipping file");
                continue;
            }

            if !matches.is_empty() {
                let name = file_path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                results.push(FileSearchResult {
                    file: FileHit {
                        name,
                        path: file_path,
                    },
                    matches,
                });
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_local_fs_read_dir() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.txt"), "x").unwrap();
        fs::create_dir(temp.path().join("sub")).unwrap();

        let entries = LocalFs.read_dir(temp.path()).await.unwrap();

        assert_eq!(entries.len(), 2);
        let sub = entries.iter().find(|e| e.name == "sub").unwrap();
        assert!(sub.is_dir);
        let file = entries.iter().find(|e| e.name == "a.txt").unwrap();
        assert!(!file.is_dir);
    }

    #[tokio::test]
    async fn test_local_fs_file_size() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.txt"), "hello").unwrap();

        let size = LocalFs.file_size(&temp.path().join("a.txt")).await.unwrap();

        assert_eq!(size, 5);
    }

    #[tokio::test]
    async fn test_local_search_literal() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.txt"), "hello world\nno match here\nhello again").unwrap();

        let query = SearchQuery {
            query: "hello".to_string(),
            ..Default::default()
        };
        let results = LocalSearch.search(temp.path(), &query).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].matches.len(), 2);
        assert_eq!(results[0].matches[0].line, 1);
        assert_eq!(results[0].matches[0].char_start, 0);
        assert_eq!(results[0].matches[0].char_end, 5);
        assert_eq!(results[0].matches[1].line, 3);
    }

    #[tokio::test]
    async fn test_local_search_literal_escapes_regex_metachars() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.txt"), "value = a.b\nvalue = axb").unwrap();

        let query = SearchQuery {
            query: "a.b".to_string(),
            case_sensitive: true,
            ..Default::default()
        };
        let results = LocalSearch.search(temp.path(), &query).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].matches.len(), 1);
        assert_eq!(results[0].matches[0].line, 1);
    }

    #[tokio::test]
    async fn test_local_search_include_pattern() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.rs"), "needle").unwrap();
        fs::write(temp.path().join("a.txt"), "needle").unwrap();

        let query = SearchQuery {
            query: "needle".to_string(),
            include_pattern: Some("*.rs".to_string()),
            ..Default::default()
        };
        let results = LocalSearch.search(temp.path(), &query).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].file.name, "a.rs");
    }

    #[tokio::test]
    async fn test_local_search_whole_word() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.txt"), "cat\nconcatenate").unwrap();

        let query = SearchQuery {
            query: "cat".to_string(),
            whole_word: true,
            ..Default::default()
        };
        let results = LocalSearch.search(temp.path(), &query).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].matches.len(), 1);
        assert_eq!(results[0].matches[0].line, 1);
    }

    #[tokio::test]
    async fn test_local_search_invalid_regex() {
        let temp = tempdir().unwrap();

        let query = SearchQuery {
            query: "[invalid".to_string(),
            regex: true,
            ..Default::default()
        };
        let result = LocalSearch.search(temp.path(), &query).await;

        assert!(matches!(result, Err(SearchError::InvalidPattern(_))));
    }
}
