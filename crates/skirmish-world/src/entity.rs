//! Entity state.

use parking_lot::Mutex;
use skirmish_core::{EntityId, Kind, KindStats, Position};
use std::sync::atomic::{AtomicBool, Ordering};

/// An entity on the map.
///
/// Position access goes through the entity's own lock, so moving one
/// entity never blocks reads of another. Liveness flips from alive to
/// dead at most once.
#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    name: String,
    kind: Kind,
    stats: KindStats,
    map_size: i32,
    position: Mutex<Position>,
    alive: AtomicBool,
}

impl Entity {
    pub fn new(
        id: EntityId,
        name: impl Into<String>,
        kind: Kind,
        stats: KindStats,
        position: Position,
        map_size: i32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            stats,
            map_size,
            position: Mutex::new(position.offset_clamped(0, 0, map_size)),
            alive: AtomicBool::new(true),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn stats(&self) -> KindStats {
        self.stats
    }

    pub fn position(&self) -> Position {
        *self.position.lock()
    }

    /// Apply a displacement, clamped into the map. Never fails.
    pub fn move_by(&self, dx: i32, dy: i32) -> Position {
        let mut position = self.position.lock();
        *position = position.offset_clamped(dx, dy, self.map_size);
        *position
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Mark dead. Returns `true` only for the call that performed the transition.
    pub fn kill(&self) -> bool {
        self.alive.swap(false, Ordering::AcqRel)
    }

    pub fn distance_sq(&self, other: &Entity) -> i64 {
        self.position().distance_sq(&other.position())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entity(kind: Kind, x: i32, y: i32) -> Entity {
        Entity::new(EntityId(1), "NPC_1", kind, KindStats::new(10, 10), Position::new(x, y), 100)
    }

    #[test]
    fn test_initial_position_and_alive() {
        let elf = entity(Kind::Elf, 10, 20);
        assert_eq!(elf.position(), Position::new(10, 20));
        assert!(elf.is_alive());
        assert_eq!(elf.name(), "NPC_1");
    }

    #[test]
    fn test_move_within_bounds() {
        let dragon = entity(Kind::Dragon, 50, 50);
        dragon.move_by(10, -5);
        assert_eq!(dragon.position(), Position::new(60, 45));
    }

    #[test]
    fn test_move_clamps_at_origin() {
        let druid = entity(Kind::Druid, 0, 0);
        assert_eq!(druid.move_by(-50, -50), Position::new(0, 0));
        assert_eq!(druid.position(), Position::new(0, 0));
    }

    #[test]
    fn test_move_clamps_to_map_edges() {
        let druid = entity(Kind::Druid, 5, 5);
        druid.move_by(-100, 1000);
        assert_eq!(druid.position(), Position::new(0, 100));
    }

    #[test]
    fn test_kill_transitions_once() {
        let elf = entity(Kind::Elf, 0, 0);
        assert!(elf.kill());
        assert!(!elf.is_alive());
        assert!(!elf.kill());
        assert!(!elf.is_alive());
    }

    #[test]
    fn test_distance() {
        let a = entity(Kind::Elf, 0, 0);
        let b = entity(Kind::Dragon, 3, 4);
        assert_eq!(a.distance_sq(&b), 25);
    }

    proptest! {
        #[test]
        fn prop_moves_stay_in_bounds(
            x in 0i32..=100,
            y in 0i32..=100,
            moves in proptest::collection::vec((-200i32..=200, -200i32..=200), 1..20),
        ) {
            let e = entity(Kind::Dragon, x, y);
            for (dx, dy) in moves {
                let pos = e.move_by(dx, dy);
                prop_assert!((0..=100).contains(&pos.x));
                prop_assert!((0..=100).contains(&pos.y));
            }
        }
    }
}
