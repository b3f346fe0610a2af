//! Per-query scratch directory.
//!
//! Layout:
//!
//! ```text
//! <root>/
//!   input/        staged query audio
//!   processed/    features.bin
//!   embedding/    query.emb
//!   results/      search_results.json
//! ```
//!
//! Artifact names are fixed, so a workspace must be reset before every run
//! and can serve only one query at a time.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::warn;

const INPUT_DIR: &str = "input";
const PROCESSED_DIR: &str = "processed";
const EMBEDDING_DIR: &str = "embedding";
const RESULTS_DIR: &str = "results";

const SUBDIRS: [&str; 4] = [INPUT_DIR, PROCESSED_DIR, EMBEDDING_DIR, RESULTS_DIR];

pub const FEATURES_FILE: &str = "features.bin";
pub const EMBEDDING_FILE: &str = "query.emb";
pub const RESULTS_FILE: &str = "search_results.json";

/// Scratch directory holding one query's intermediate artifacts.
#[derive(Debug)]
pub struct ScratchWorkspace {
    root: PathBuf,
    // Removed with the workspace when temporary.
    _temp: Option<TempDir>,
}

impl ScratchWorkspace {
    /// Creates a workspace in a fresh temporary directory, deleted on drop.
    pub fn temporary() -> io::Result<Self> {
        let temp = tempfile::Builder::new().prefix("melodeez-").tempdir()?;
        let mut ws = Self {
            root: temp.path().to_path_buf(),
            _temp: Some(temp),
        };
        ws.reset()?;
        Ok(ws)
    }

    /// Uses `root` as the workspace, creating it if needed. Only the four
    /// workspace sub-directories are ever modified.
    pub fn at(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root, _temp: None })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Empties and recreates every sub-directory. Calling it twice in a row
    /// leaves the same state as calling it once.
    pub fn reset(&mut self) -> io::Result<()> {
        self.clear()?;
        for dir in SUBDIRS {
            fs::create_dir_all(self.root.join(dir))?;
        }
        Ok(())
    }

    /// Removes every sub-directory and its contents.
    pub fn clear(&self) -> io::Result<()> {
        for dir in SUBDIRS {
            match fs::remove_dir_all(self.root.join(dir)) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e),
                _ => {}
            }
        }
        Ok(())
    }

    pub fn input_dir(&self) -> PathBuf {
        self.root.join(INPUT_DIR)
    }

    pub fn features_path(&self) -> PathBuf {
        self.root.join(PROCESSED_DIR).join(FEATURES_FILE)
    }

    pub fn embedding_path(&self) -> PathBuf {
        self.root.join(EMBEDDING_DIR).join(EMBEDDING_FILE)
    }

    pub fn results_path(&self) -> PathBuf {
        self.root.join(RESULTS_DIR).join(RESULTS_FILE)
    }
}

/// Clears the workspace when dropped, on success and failure alike,
/// unless artifacts are kept.
pub(crate) struct RunGuard<'a> {
    ws: &'a ScratchWorkspace,
    keep: bool,
}

impl<'a> RunGuard<'a> {
    pub(crate) fn new(ws: &'a ScratchWorkspace, keep: bool) -> Self {
        Self { ws, keep }
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        if let Err(e) = self.ws.clear() {
            warn!("pipeline: failed to clear workspace {}: {e}", self.ws.root().display());
        }
    }
}
