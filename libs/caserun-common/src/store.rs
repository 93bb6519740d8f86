// Solution document persistence - plain UTF-8 files next to the source.
// Document paths are deterministic so every tool agrees on where a
// solution's tests live.
use crate::config::DOCUMENT_EXTENSION;
use crate::solution::{self, DecodeError};
use crate::types::TestSuite;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("solution already exists at {0}")]
    AlreadyExists(PathBuf),
    #[error("no solution document at {0}")]
    NotFound(PathBuf),
    #[error("no test case {0}")]
    NoSuchTest(usize),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("failed to access {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

/// `dir/name.cpp` -> `dir/name.tests.json`
pub fn document_path(source: &Path) -> PathBuf {
    source.with_extension(DOCUMENT_EXTENSION)
}

/// Whether `path` is itself a solution document rather than a source file.
pub fn is_document(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.ends_with(&format!(".{}", DOCUMENT_EXTENSION)))
        .unwrap_or(false)
}

/// Load the tests of a solution.
///
/// A missing or unparseable document means "no solution data yet" and
/// yields `None`; the reason is logged.
pub fn load(source: &Path) -> Option<TestSuite> {
    let path = document_path(source);
    let raw = match fs::read(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No solution document");
            return None;
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read solution document");
            return None;
        }
    };

    match solution::decode(&raw) {
        Ok(suite) => {
            debug!(path = %path.display(), tests = suite.len(), "Read solution document");
            Some(suite)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring malformed solution document");
            None
        }
    }
}

/// Load a document that must exist and parse, for commands that mutate it.
pub fn open_existing(source: &Path) -> Result<TestSuite, StoreError> {
    let path = document_path(source);
    let raw = fs::read(&path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            StoreError::NotFound(path.clone())
        } else {
            StoreError::Io {
                path: path.clone(),
                source: e,
            }
        }
    })?;
    Ok(solution::decode(&raw)?)
}

/// Create an empty solution document. Never overwrites existing data.
pub fn create(source: &Path) -> Result<TestSuite, StoreError> {
    let path = document_path(source);
    let io_error = |e: io::Error| StoreError::Io {
        path: path.clone(),
        source: e,
    };

    // create_new fails atomically if the document appeared in the meantime
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                StoreError::AlreadyExists(path.clone())
            } else {
                io_error(e)
            }
        })?;

    let suite = TestSuite::new();
    file.write_all(&solution::encode(&suite)).map_err(io_error)?;
    info!(path = %path.display(), "Created solution");
    Ok(suite)
}

pub fn save(source: &Path, suite: &TestSuite) -> Result<(), StoreError> {
    let path = document_path(source);
    fs::write(&path, solution::encode(suite)).map_err(|e| StoreError::Io {
        path: path.clone(),
        source: e,
    })?;
    debug!(path = %path.display(), tests = suite.len(), "Wrote solution document");
    Ok(())
}
