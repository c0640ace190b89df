//! # Durable Blob Store
//!
//! Opaque get/set of named byte blobs. This is the boundary the cart and
//! favorites stores persist through; what sits behind it (app defaults,
//! files, a key-value db) is a collaborator concern.
//!
//! Two implementations ship here:
//! - [`MemoryBlobStore`]: in-process map, used by tests and previews
//! - [`FsBlobStore`]: one file per key under the platform app-data dir

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tracing::debug;

use crate::error::{PersistError, PersistResult};

// =============================================================================
// Blob Store Trait
// =============================================================================

/// Named durable byte blobs.
///
/// `get` treats every miss the same way (absent and unreadable both yield
/// `None`); callers own decode and corruption policy. `set` reports
/// failure, but callers are free to swallow it - the cart store does, by
/// contract.
pub trait BlobStore: Send + Sync {
    /// Fetches the blob stored under `key`, if any.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Stores `bytes` under `key`, replacing any previous value.
    fn set(&self, key: &str, bytes: &[u8]) -> PersistResult<()>;
}

// =============================================================================
// In-Memory Implementation
// =============================================================================

/// Blob store backed by a process-local map.
///
/// `fail_writes` flips the store into a write-rejecting mode so tests can
/// exercise the swallow-persistence-failure contract.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    fail_writes: AtomicBool,
}

impl MemoryBlobStore {
    /// Creates an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `set` fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs
            .lock()
            .expect("blob map mutex poisoned")
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, bytes: &[u8]) -> PersistResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistError::Write("writes disabled".into()));
        }
        self.blobs
            .lock()
            .expect("blob map mutex poisoned")
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}

// =============================================================================
// File-System Implementation
// =============================================================================

/// Blob store keeping one file per key inside a directory.
#[derive(Debug)]
pub struct FsBlobStore {
    dir: PathBuf,
}

impl FsBlobStore {
    /// Opens a store rooted at the platform app-data directory.
    pub fn open_default() -> PersistResult<Self> {
        let dirs = directories::ProjectDirs::from("com", "vitrine", "vitrine")
            .ok_or_else(|| PersistError::Read("no home directory available".into()))?;
        Self::open(dirs.data_dir().join("blobs"))
    }

    /// Opens a store rooted at `dir`, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> PersistResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| PersistError::Write(e.to_string()))?;
        Ok(FsBlobStore { dir })
    }
}

impl BlobStore for FsBlobStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        match std::fs::read(self.dir.join(key)) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                debug!(key, error = %e, "blob read miss");
                None
            }
        }
    }

    fn set(&self, key: &str, bytes: &[u8]) -> PersistResult<()> {
        std::fs::write(self.dir.join(key), bytes).map_err(|e| PersistError::Write(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_round_trip() {
        let store = MemoryBlobStore::new();
        assert!(store.get("k").is_none());

        store.set("k", b"payload").unwrap();
        assert_eq!(store.get("k").as_deref(), Some(&b"payload"[..]));
    }

    #[test]
    fn test_memory_fail_writes() {
        let store = MemoryBlobStore::new();
        store.fail_writes(true);
        assert!(store.set("k", b"payload").is_err());
        assert!(store.get("k").is_none());

        store.fail_writes(false);
        assert!(store.set("k", b"payload").is_ok());
    }

    #[test]
    fn test_fs_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(tmp.path().join("blobs")).unwrap();

        assert!(store.get("cart_v1").is_none());
        store.set("cart_v1", b"{}").unwrap();
        assert_eq!(store.get("cart_v1").as_deref(), Some(&b"{}"[..]));
    }
}
