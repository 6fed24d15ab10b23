//! Go file reading and package-sibling discovery.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

/// Files whose name starts with this are scratch copies written by editor
/// integrations and never part of the package.
const SCRATCH_PREFIX: &str = "iferr";

// ============================================================================
// Error Types
// ============================================================================

/// Error type for file operations.
#[derive(Debug, Error)]
pub enum FileError {
    /// File not found.
    #[error("file not found: {path}")]
    NotFound { path: String },

    /// IO error.
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Result type for file operations.
pub type FileResult<T> = Result<T, FileError>;

impl FileError {
    fn from_io(path: &Path, err: io::Error) -> Self {
        let path = path.display().to_string();
        if err.kind() == io::ErrorKind::NotFound {
            FileError::NotFound { path }
        } else {
            FileError::Io { path, source: err }
        }
    }
}

// ============================================================================
// Reading
// ============================================================================

/// Read a source file as UTF-8.
pub fn read_file(path: &Path) -> FileResult<String> {
    fs::read_to_string(path).map_err(|e| FileError::from_io(path, e))
}

fn is_go_source(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "go")
}

/// `.go` files directly inside `dir`, sorted by name. Test files are
/// skipped.
pub fn go_files_in(dir: &Path) -> FileResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let err = e
                .into_io_error()
                .unwrap_or_else(|| io::Error::other("directory walk failed"));
            FileError::from_io(dir, err)
        })?;
        let path = entry.path();
        if !entry.file_type().is_file() || !is_go_source(path) {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if name.ends_with("_test.go") {
            continue;
        }
        files.push(path.to_path_buf());
    }
    Ok(files)
}

/// Other files in the directory of `file` that may belong to its package.
///
/// Excludes `file` itself and scratch copies. Whether a candidate really
/// belongs to the package is decided by its package clause, after parsing.
pub fn sibling_files(file: &Path) -> FileResult<Vec<PathBuf>> {
    let dir = match file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let own_name = file.file_name();
    Ok(go_files_in(dir)?
        .into_iter()
        .filter(|path| path.file_name() != own_name)
        .filter(|path| {
            path.file_name()
                .is_some_and(|name| !name.to_string_lossy().starts_with(SCRATCH_PREFIX))
        })
        .collect())
}

// ============================================================================
// Tests
// ============================================================================
