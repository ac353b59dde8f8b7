//! Registry of live video instances.

use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Instances keyed by id, in creation order.
///
/// Entries are weak so the registry never keeps an instance alive; an
/// instance removes itself when destroyed.
pub struct PlayerRegistry<T> {
    entries: RwLock<IndexMap<u64, Weak<T>>>,
    next_id: AtomicU64,
}

impl<T> PlayerRegistry<T> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(IndexMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Allocate the next instance id.
    pub fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn insert(&self, id: u64, instance: &Arc<T>) {
        self.entries.write().insert(id, Arc::downgrade(instance));
    }

    /// Remove an entry. Returns whether the registry is now empty, or `None`
    /// if the id was not registered.
    pub fn remove(&self, id: u64) -> Option<bool> {
        let mut entries = self.entries.write();
        entries.shift_remove(&id)?;
        Some(entries.is_empty())
    }

    pub fn contains(&self, id: u64) -> bool {
        self.entries.read().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Every live instance except `id`, snapshotted so the caller can act on
    /// them without holding the registry lock.
    pub fn others(&self, id: u64) -> Vec<Arc<T>> {
        self.entries
            .read()
            .iter()
            .filter(|(other, _)| **other != id)
            .filter_map(|(_, weak)| weak.upgrade())
            .collect()
    }

    /// Restart id allocation at 1. Only meaningful once the registry is empty.
    pub fn reset_ids(&self) {
        self.next_id.store(1, Ordering::Relaxed);
    }
}

impl<T> Default for PlayerRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_remove() {
        let registry = PlayerRegistry::new();
        let a = Arc::new("a");
        let b = Arc::new("b");
        let (ia, ib) = (registry.next_id(), registry.next_id());
        assert_eq!((ia, ib), (1, 2));

        registry.insert(ia, &a);
        registry.insert(ib, &b);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.others(ia).iter().map(|s| **s).collect::<Vec<_>>(), vec!["b"]);

        assert_eq!(registry.remove(ia), Some(false));
        assert_eq!(registry.remove(ia), None);
        assert_eq!(registry.remove(ib), Some(true));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_dropped_instances_are_skipped() {
        let registry = PlayerRegistry::new();
        let keep = Arc::new(1);
        registry.insert(1, &keep);
        {
            let gone = Arc::new(2);
            registry.insert(2, &gone);
        }
        assert_eq!(registry.others(3).len(), 1);
    }

    #[test]
    fn test_reset_ids() {
        let registry: PlayerRegistry<()> = PlayerRegistry::new();
        registry.next_id();
        registry.next_id();
        registry.reset_ids();
        assert_eq!(registry.next_id(), 1);
    }
}
