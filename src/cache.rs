//! Roommate lists cached per owner

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::Roommate;

/// Shared cache of roommate lists keyed by owning user id.
///
/// Clones share the same storage. Entries are replaced wholesale by a
/// refetch and dropped by [`RoommateCache::invalidate`]; there is no partial
/// update.
#[derive(Debug, Clone, Default)]
pub struct RoommateCache {
    entries: Arc<RwLock<HashMap<Uuid, Vec<Roommate>>>>,
}

impl RoommateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached list for `owner`, `None` when it was never loaded or has been
    /// invalidated since
    pub async fn get(&self, owner: Uuid) -> Option<Vec<Roommate>> {
        self.entries.read().await.get(&owner).cloned()
    }

    pub async fn put(&self, owner: Uuid, roommates: Vec<Roommate>) {
        self.entries.write().await.insert(owner, roommates);
    }

    /// Drop the entries of the given owners only
    pub async fn invalidate(&self, owners: &[Uuid]) {
        let mut entries = self.entries.write().await;
        for owner in owners {
            if entries.remove(owner).is_some() {
                log::debug!("Invalidated roommate cache for {}", owner);
            }
        }
    }

    pub async fn is_cached(&self, owner: Uuid) -> bool {
        self.entries.read().await.contains_key(&owner)
    }
}
