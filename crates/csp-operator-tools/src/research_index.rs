//! A grep-based substring index over a directory tree. No regex dependency:
//! a plain substring match is all the operator tooling needs, and files
//! that aren't valid UTF-8 are skipped rather than erroring out.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{OperatorToolError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub path: PathBuf,
    pub line_number: usize,
    pub line: String,
}

pub struct ResearchIndex {
    root: PathBuf,
}

impl ResearchIndex {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn search(&self, pattern: &str) -> Result<Vec<SearchHit>> {
        if !self.root.is_dir() {
            return Err(OperatorToolError::IndexRootNotFound(
                self.root.to_string_lossy().into_owned(),
            ));
        }
        let mut hits = Vec::new();
        walk(&self.root, pattern, &mut hits)?;
        debug!(pattern, hit_count = hits.len(), "research index search complete");
        Ok(hits)
    }
}

fn walk(dir: &Path, pattern: &str, hits: &mut Vec<SearchHit>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk(&path, pattern, hits)?;
            continue;
        }
        let Ok(content) = fs::read_to_string(&path) else {
            continue;
        };
        for (i, line) in content.lines().enumerate() {
            if line.contains(pattern) {
                hits.push(SearchHit {
                    path: path.clone(),
                    line_number: i + 1,
                    line: line.to_string(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn finds_matches_with_line_numbers() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("notes.txt"), "first line\nsecond with NEEDLE here\n").unwrap();

        let index = ResearchIndex::new(tmp.path());
        let hits = index.search("NEEDLE").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].line_number, 2);
    }

    #[test]
    fn recurses_into_subdirectories() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("sub")).unwrap();
        fs::write(tmp.path().join("sub/nested.txt"), "NEEDLE\n").unwrap();

        let index = ResearchIndex::new(tmp.path());
        let hits = index.search("NEEDLE").unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn missing_root_errors() {
        let index = ResearchIndex::new("/definitely/not/a/real/path/xyz");
        let err = index.search("NEEDLE").unwrap_err();
        assert!(matches!(err, OperatorToolError::IndexRootNotFound(_)));
    }

    #[test]
    fn non_utf8_files_are_skipped_without_error() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("binary.bin"), [0xff, 0xfe, 0x00, 0xff]).unwrap();

        let index = ResearchIndex::new(tmp.path());
        let hits = index.search("NEEDLE").unwrap();
        assert!(hits.is_empty());
    }
}
