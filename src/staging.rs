use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use dashmap::DashMap;
use log::{debug, info, trace, warn};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::flock::FileLock;

const LOCK_FILE_NAME: &str = ".lock";

/// The staging area under which every resolved source is materialized.
///
/// Each source lives in `root/<cache key>` where the key is a stable hash of
/// the normalized URI string, so repeated resolutions of the same reference
/// reuse the directory populated by the first one. Cheap to clone; clones
/// share the root, the per-key populate locks and the cross-process file lock.
#[derive(Clone)]
pub struct StagingArea {
    inner: Arc<StagingAreaInner>,
}

struct StagingAreaInner {
    root: PathBuf,
    populate_locks: DashMap<PathBuf, Arc<Mutex<()>>>,
    _lock: FileLock,
}

#[derive(Error, Debug)]
pub enum StagingError {
    #[error("Staging root {location} exists but is not a directory")]
    BadLocation { location: String },
    #[error("Staging lock cannot be acquired")]
    Lock(#[from] crate::flock::Error),
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
}

impl StagingArea {
    pub fn new(root: PathBuf) -> Result<StagingArea, StagingError> {
        if root.exists() {
            if !root.is_dir() {
                return Err(StagingError::BadLocation {
                    location: root.to_str().unwrap_or("").to_string(),
                });
            }
        } else {
            std::fs::create_dir_all(&root)?;
        }

        let lock = Self::acquire_lock(&root)?;

        Ok(StagingArea {
            inner: Arc::new(StagingAreaInner {
                root,
                populate_locks: DashMap::new(),
                _lock: lock,
            }),
        })
    }

    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    /// Name the staging subdirectory for a normalized URI string. Only names
    /// a path; nothing is created on disk.
    pub fn subdirectory_for(&self, uri: &str) -> PathBuf {
        self.inner.root.join(cache_key(uri))
    }

    /// Fetch-or-reuse guard. If `directory` already exists it is returned
    /// untouched and `populate` is never invoked; otherwise `populate` runs
    /// and is expected to create the directory. On failure any partially
    /// created directory is removed (best effort) before the error is
    /// propagated, so a later run never mistakes the leftovers for a valid
    /// entry.
    ///
    /// Concurrent callers targeting the same directory are serialized on a
    /// per-path lock: exactly one of them populates, the rest wait and reuse
    /// the result.
    pub fn create_once<F, E>(&self, directory: &Path, populate: F) -> Result<PathBuf, E>
    where
        F: FnOnce() -> Result<(), E>,
    {
        let slot = self
            .inner
            .populate_locks
            .entry(directory.to_path_buf())
            .or_default()
            .clone();
        let _guard = slot.lock().unwrap_or_else(PoisonError::into_inner);

        if directory.exists() {
            debug!("Reusing staged directory {}", directory.display());
            return Ok(directory.to_path_buf());
        }

        trace!("Populating {}", directory.display());
        match populate() {
            Ok(()) => Ok(directory.to_path_buf()),
            Err(error) => {
                if let Err(cleanup_error) = std::fs::remove_dir_all(directory) {
                    if cleanup_error.kind() != std::io::ErrorKind::NotFound {
                        warn!(
                            "Could not remove partially staged directory {}: {}",
                            directory.display(),
                            cleanup_error
                        );
                    }
                }
                Err(error)
            }
        }
    }

    /// Delete every staged directory. The root and its lock file stay in
    /// place: this process still holds the lock, and unlinking the file
    /// would let another process acquire a fresh lock alongside ours.
    pub fn clear(&self) -> anyhow::Result<()> {
        if self.inner.root.exists() {
            info!("Clearing staging area {}.", self.inner.root.display());
            for entry in std::fs::read_dir(&self.inner.root)? {
                let entry = entry?;
                if entry.file_name() == LOCK_FILE_NAME {
                    continue;
                }
                if entry.file_type()?.is_dir() {
                    std::fs::remove_dir_all(entry.path())?;
                } else {
                    std::fs::remove_file(entry.path())?;
                }
            }
        }
        Ok(())
    }

    fn acquire_lock(root: &Path) -> Result<FileLock, StagingError> {
        let location = root.join(LOCK_FILE_NAME);
        debug!("Acquiring a lock on the staging root: {}", location.display());
        let lock = FileLock::new(&location)?;
        debug!("Acquired a lock on the staging root");
        Ok(lock)
    }
}

/// Stable cache key for a normalized URI string: half of its SHA-256 digest,
/// hex encoded. Deterministic and collision resistant at dependency-list
/// scale; this is a cache key, not a security boundary.
pub fn cache_key(uri: &str) -> String {
    let digest = Sha256::digest(uri.as_bytes());
    hex::encode(&digest[..16])
}
