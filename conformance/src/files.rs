//! File discovery and file helpers.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Resolves newline-separated glob patterns to a sorted list of files.
///
/// Blank lines are ignored. A line starting with `!` removes its matches from
/// the result. A pattern matching a directory contributes every `*.xml` file
/// beneath it.
///
/// # Errors
///
/// Returns [`Error::InvalidPattern`] if a pattern does not parse.
pub fn find_files(patterns: &str) -> Result<Vec<PathBuf>> {
    let mut included: BTreeSet<PathBuf> = BTreeSet::new();
    let mut excluded: BTreeSet<PathBuf> = BTreeSet::new();

    for line in patterns.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let (pattern, target) = match line.strip_prefix('!') {
            Some(rest) => (rest.trim(), &mut excluded),
            None => (line, &mut included),
        };
        for path in expand_pattern(pattern)? {
            target.insert(path);
        }
    }

    let files: Vec<PathBuf> = included.difference(&excluded).cloned().collect();
    info!(count = files.len(), "Got {} files", files.len());
    for file in &files {
        debug!(file = %file.display(), "matched");
    }
    Ok(files)
}

fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    let entries = glob::glob(pattern).map_err(|e| Error::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;

    let mut out = Vec::new();
    for path in entries.filter_map(|e| e.ok()) {
        if path.is_dir() {
            out.extend(
                WalkDir::new(&path)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().is_file())
                    .filter(|e| e.path().extension().map(|x| x == "xml").unwrap_or(false))
                    .map(|e| e.into_path()),
            );
        } else if path.is_file() {
            out.push(path);
        }
    }
    Ok(out)
}

/// Reads a whole file as UTF-8.
///
/// # Errors
///
/// Returns [`Error::Io`] naming the path.
pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

/// Writes content to a file, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`Error::Io`] if directories cannot be created or the file cannot be written.
pub fn write_text(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    fs::write(path, content).map_err(|e| Error::io(path, e))
}

/// Name of the current working directory, used to shorten absolute paths in reports.
pub fn working_dir_name() -> String {
    std::env::current_dir()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, rel: &str) -> PathBuf {
        let path = root.join(rel);
        write_text(&path, "<testsuites/>").unwrap();
        path
    }

    #[test]
    fn globs_are_sorted_and_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        let b = touch(dir.path(), "reports/b.xml");
        let a = touch(dir.path(), "reports/a.xml");
        let root = dir.path().display();

        let patterns = format!("{root}/reports/*.xml\n\n{root}/reports/a.xml\n");
        assert_eq!(find_files(&patterns).unwrap(), vec![a, b]);
    }

    #[test]
    fn negated_patterns_exclude() {
        let dir = tempfile::tempdir().unwrap();
        let keep = touch(dir.path(), "r/keep.xml");
        touch(dir.path(), "r/drop.xml");
        let root = dir.path().display();

        let patterns = format!("{root}/r/*.xml\n!{root}/r/drop.xml");
        assert_eq!(find_files(&patterns).unwrap(), vec![keep]);
    }

    #[test]
    fn directories_expand_to_nested_xml_files() {
        let dir = tempfile::tempdir().unwrap();
        let nested = touch(dir.path(), "results/unit/TEST-a.xml");
        let top = touch(dir.path(), "results/TEST-b.xml");
        write_text(&dir.path().join("results/output.bin"), "x").unwrap();

        let found = find_files(&dir.path().join("results").display().to_string()).unwrap();
        assert_eq!(found, vec![top, nested]);
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = find_files("reports/[.xml").unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }

    #[test]
    fn no_match_is_empty_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = format!("{}/nothing/*.xml", dir.path().display());
        assert!(find_files(&pattern).unwrap().is_empty());
    }
}
