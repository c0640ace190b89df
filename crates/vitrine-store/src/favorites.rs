//! # Favorite-Id Set
//!
//! Persisted set of favorited catalog ids. Deliberately simple: the hard
//! part (resolving ids into records) lives in the fetch layer.
//!
//! Iteration order is stable toggle-insertion order - the favorites loader
//! snapshots `all()` at dispatch time and publishes results in exactly that
//! order, so the order must not wobble between calls.

use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::blob::BlobStore;

/// Blob key the favorite ids are persisted under.
pub const FAVORITES_BLOB_KEY: &str = "favorites.product_ids";

/// Set of favorited catalog ids.
pub trait FavoriteSet: Send + Sync {
    /// All favorited ids, in stable toggle-insertion order.
    fn all(&self) -> Vec<i64>;

    /// Membership test.
    fn contains(&self, id: i64) -> bool;

    /// Flips membership of `id` and returns the resulting membership.
    fn toggle(&self, id: i64) -> bool;
}

/// Favorite set persisted as a JSON id list through a [`BlobStore`].
///
/// Write failures follow the cart store's policy: logged and swallowed,
/// in-memory membership stays authoritative.
pub struct BlobFavoriteSet {
    ids: Mutex<Vec<i64>>,
    blob: Arc<dyn BlobStore>,
}

impl BlobFavoriteSet {
    /// Opens the set against `blob`, hydrating from
    /// [`FAVORITES_BLOB_KEY`]. Absent or undecodable blobs start empty.
    pub fn open(blob: Arc<dyn BlobStore>) -> Self {
        let ids = match blob.get(FAVORITES_BLOB_KEY) {
            Some(bytes) => match serde_json::from_slice::<Vec<i64>>(&bytes) {
                Ok(mut ids) => {
                    // de-dup, first occurrence wins
                    let mut seen = std::collections::HashSet::new();
                    ids.retain(|id| seen.insert(*id));
                    ids
                }
                Err(e) => {
                    warn!(error = %e, "stored favorites undecodable, starting empty");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        BlobFavoriteSet {
            ids: Mutex::new(ids),
            blob,
        }
    }

    fn persist(&self, ids: &[i64]) {
        match serde_json::to_vec(ids) {
            Ok(bytes) => {
                if let Err(e) = self.blob.set(FAVORITES_BLOB_KEY, &bytes) {
                    warn!(error = %e, "favorites persistence failed");
                }
            }
            Err(e) => warn!(error = %e, "favorites failed to encode"),
        }
    }
}

impl FavoriteSet for BlobFavoriteSet {
    fn all(&self) -> Vec<i64> {
        self.ids.lock().expect("favorites mutex poisoned").clone()
    }

    fn contains(&self, id: i64) -> bool {
        self.ids
            .lock()
            .expect("favorites mutex poisoned")
            .contains(&id)
    }

    fn toggle(&self, id: i64) -> bool {
        let mut ids = self.ids.lock().expect("favorites mutex poisoned");
        let now_member = if let Some(idx) = ids.iter().position(|&i| i == id) {
            ids.remove(idx);
            false
        } else {
            ids.push(id);
            true
        };
        self.persist(&ids);
        now_member
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::MemoryBlobStore;

    #[test]
    fn test_toggle_flips_membership() {
        let set = BlobFavoriteSet::open(Arc::new(MemoryBlobStore::new()));

        assert!(set.toggle(3));
        assert!(set.contains(3));
        assert!(!set.toggle(3));
        assert!(!set.contains(3));
    }

    #[test]
    fn test_all_preserves_toggle_order() {
        let set = BlobFavoriteSet::open(Arc::new(MemoryBlobStore::new()));
        set.toggle(3);
        set.toggle(1);
        set.toggle(2);

        assert_eq!(set.all(), vec![3, 1, 2]);

        // re-toggling moves the id to the end
        set.toggle(3);
        set.toggle(3);
        assert_eq!(set.all(), vec![1, 2, 3]);
    }

    #[test]
    fn test_persists_across_opens() {
        let blob = Arc::new(MemoryBlobStore::new());
        {
            let set = BlobFavoriteSet::open(blob.clone());
            set.toggle(5);
            set.toggle(9);
        }

        let reloaded = BlobFavoriteSet::open(blob);
        assert_eq!(reloaded.all(), vec![5, 9]);
    }

    #[test]
    fn test_corrupt_blob_starts_empty() {
        let blob = Arc::new(MemoryBlobStore::new());
        blob.set(FAVORITES_BLOB_KEY, b"][").unwrap();

        let set = BlobFavoriteSet::open(blob);
        assert!(set.all().is_empty());
    }
}
