//! Shared, ordered collection of entities.

use crate::entity::Entity;
use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard};
use skirmish_core::{EntityId, Error, Result};
use tracing::debug;

/// The entity registry.
///
/// Entities are owned by value and kept sorted by id. The population only
/// shrinks once loaded: [`Registry::compact`] is the sole structural mutation
/// and runs under the exclusive lock, so a reader never sees a half-removed
/// entity.
#[derive(Debug, Default)]
pub struct Registry {
    entities: RwLock<Vec<Entity>>,
}

impl Registry {
    /// Build a registry from an initial population. Duplicate ids are rejected.
    pub fn new(mut entities: Vec<Entity>) -> Result<Self> {
        entities.sort_by_key(|e| e.id());
        if let Some(pair) = entities.windows(2).find(|w| w[0].id() == w[1].id()) {
            return Err(Error::AlreadyExists(format!("entity id {}", pair[0].id())));
        }

        Ok(Self {
            entities: RwLock::new(entities),
        })
    }

    /// Shared access to a consistent view of the current entities.
    ///
    /// Any number of readers may hold this concurrently; compaction waits
    /// until every view is dropped.
    pub fn read(&self) -> MappedRwLockReadGuard<'_, [Entity]> {
        RwLockReadGuard::map(self.entities.read(), |v| v.as_slice())
    }

    /// Remove every dead entity under exclusive access. Returns the number removed.
    pub fn compact(&self) -> usize {
        let mut entities = self.entities.write();
        let before = entities.len();
        entities.retain(|e| e.is_alive());
        let removed = before - entities.len();
        if removed > 0 {
            debug!(removed, remaining = entities.len(), "Compacted registry");
        }
        removed
    }

    pub fn count_alive(&self) -> usize {
        self.read().iter().filter(|e| e.is_alive()).count()
    }

    /// Number of entries, dead ones awaiting compaction included
    pub fn len(&self) -> usize {
        self.entities.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Look up an entity by id in a view obtained from [`Registry::read`].
pub fn find(entities: &[Entity], id: EntityId) -> Option<&Entity> {
    entities
        .binary_search_by_key(&id, |e| e.id())
        .ok()
        .map(|index| &entities[index])
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_core::{Kind, KindStats, Position};
    use std::sync::Arc;
    use std::thread;

    fn entity(id: u32) -> Entity {
        Entity::new(
            EntityId(id),
            format!("NPC_{}", id),
            Kind::Elf,
            KindStats::new(10, 50),
            Position::new(0, 0),
            100,
        )
    }

    #[test]
    fn test_registry_sorts_by_id() {
        let registry = Registry::new(vec![entity(3), entity(1), entity(2)]).unwrap();
        let ids: Vec<u32> = registry.read().iter().map(|e| e.id().0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = Registry::new(vec![entity(1), entity(1)]);
        assert!(matches!(result, Err(Error::AlreadyExists(_))));
    }

    #[test]
    fn test_compact_removes_only_dead() {
        let registry = Registry::new((1..=5).map(entity).collect()).unwrap();
        {
            let view = registry.read();
            find(&view, EntityId(2)).unwrap().kill();
            find(&view, EntityId(4)).unwrap().kill();
        }

        assert_eq!(registry.count_alive(), 3);
        assert_eq!(registry.len(), 5);

        assert_eq!(registry.compact(), 2);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.compact(), 0);

        let view = registry.read();
        assert!(find(&view, EntityId(2)).is_none());
        assert!(find(&view, EntityId(3)).is_some());
    }

    #[test]
    fn test_concurrent_readers_and_compaction() {
        let registry = Arc::new(Registry::new((1..=50).map(entity).collect()).unwrap());

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    let mut last = usize::MAX;
                    for _ in 0..200 {
                        let view = registry.read();
                        let len = view.len();
                        // Population never grows.
                        assert!(len <= last);
                        assert!(view.windows(2).all(|w| w[0].id() < w[1].id()));
                        last = len;
                    }
                })
            })
            .collect();

        for id in (1..=50).step_by(2) {
            if let Some(e) = find(&registry.read(), EntityId(id)) {
                e.kill();
            }
            registry.compact();
        }

        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(registry.len(), 25);
    }
}
