//! The Persister owns the state directory and converts in-memory mutations
//! into chunk/partition file rewrites, per the design in `SPEC_FULL.md` §4.1.

pub mod chunked;
pub mod index;
pub mod loader;
pub mod partitioned;
pub mod persister;

pub use loader::{LoadedState, Loader};
pub use persister::{Persister, PersisterOptions};

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};

/// Filesystem abstraction the persister goes through for every read/write,
/// so tests can exercise chunk/partition bookkeeping without real disk I/O
/// and so a future implementation can add write-then-rename-into-place
/// semantics in one spot. Grounded on the teacher's practice of routing all
/// page I/O through an injected `DiskManager` rather than calling
/// `std::fs` ad hoc from storage-engine internals.
pub trait Fs: Send + Sync {
    /// Every regular file directly inside `dir`, in unspecified order.
    /// Returns an empty vector if `dir` does not exist.
    fn read_dir(&self, dir: &Path) -> Result<Vec<PathBuf>>;
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn write(&self, path: &Path, contents: &str) -> Result<()>;
    /// Idempotent: removing a file that does not exist is not an error.
    fn remove_file(&self, path: &Path) -> Result<()>;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn exists(&self, path: &Path) -> bool;
    /// Length of the file in bytes, or 0 if it does not exist.
    fn file_len(&self, path: &Path) -> Result<u64>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl Fs for RealFs {
    fn read_dir(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for entry in fs::read_dir(dir).map_err(StoreError::FilesystemError)? {
            let entry = entry.map_err(StoreError::FilesystemError)?;
            let path = entry.path();
            if path.is_file() {
                out.push(path);
            }
        }
        Ok(out)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(StoreError::FilesystemError)
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(StoreError::FilesystemError)?;
        }
        fs::write(path, contents).map_err(StoreError::FilesystemError)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::FilesystemError(e)),
        }
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).map_err(StoreError::FilesystemError)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn file_len(&self, path: &Path) -> Result<u64> {
        match fs::metadata(path) {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(StoreError::FilesystemError(e)),
        }
    }
}
