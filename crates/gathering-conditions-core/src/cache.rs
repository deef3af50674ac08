//! Read-through resource cache.
//!
//! Artifacts are immutable for the lifetime of the process, so entries are
//! loaded on first use and never evicted. Concurrent first reads of a cold
//! path may each hit the backing store; the last writer wins with identical
//! bytes.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};

/// Read-only access to the backing file store.
pub trait FileStore: Send + Sync {
    /// Read the whole file at `path`.
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Whether a regular file exists at `path`.
    fn exists(&self, path: &Path) -> bool;
}

/// [`FileStore`] over the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskFileStore;

impl FileStore for DiskFileStore {
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn exists(&self, path: &Path) -> bool {
        std::fs::metadata(path)
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }
}

/// Thread-safe cache of file contents keyed by path.
pub struct ResourceCache {
    store: Arc<dyn FileStore>,
    entries: DashMap<PathBuf, Arc<[u8]>>,
}

impl ResourceCache {
    /// Create an empty cache over `store`.
    pub fn new(store: Arc<dyn FileStore>) -> Self {
        Self {
            store,
            entries: DashMap::new(),
        }
    }

    /// Create an empty cache over the local filesystem.
    pub fn on_disk() -> Self {
        Self::new(Arc::new(DiskFileStore))
    }

    /// The backing store.
    pub fn store(&self) -> &dyn FileStore {
        self.store.as_ref()
    }

    /// Get the bytes for `path`, reading through to the store on a miss.
    ///
    /// Returns `None` when the store cannot produce the file; a missing
    /// artifact is an expected condition, not an error.
    pub fn get(&self, path: &Path) -> Option<Arc<[u8]>> {
        if let Some(data) = self.entries.get(path) {
            debug!(path = %path.display(), "cache hit");
            return Some(Arc::clone(data.value()));
        }

        match self.store.read_file(path) {
            Ok(data) => {
                debug!(path = %path.display(), bytes = data.len(), "resource file has been read");
                let data: Arc<[u8]> = Arc::from(data);
                self.set(path, Arc::clone(&data));
                Some(data)
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "resource not found");
                None
            }
        }
    }

    /// Store `data` under `path`.
    pub fn set(&self, path: impl Into<PathBuf>, data: impl Into<Arc<[u8]>>) {
        self.entries.insert(path.into(), data.into());
    }

    /// Whether `path` is already cached.
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}
