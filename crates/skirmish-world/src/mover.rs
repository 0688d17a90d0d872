//! Mover/detector worker.
//!
//! Each pass holds the registry's shared lock for the whole move-and-detect
//! scan, position writes included. That keeps compaction out for the full
//! tick.
// TODO: release the registry lock between the move and detect phases once
// per-entity locking alone is shown to keep detection consistent.

use crate::entity::Entity;
use crate::queue::{BattleQueue, BattleTask};
use crate::simulation::Shared;
use rand::Rng;
use std::thread;
use tracing::{debug, trace};

/// Counts from one move-and-detect pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub moved: usize,
    pub tasks: usize,
}

/// Perturb every live entity by a draw in `[-movement_radius, movement_radius]` per axis.
pub fn move_all<R: Rng>(entities: &[Entity], rng: &mut R) -> usize {
    let mut moved = 0;
    for entity in entities.iter().filter(|e| e.is_alive()) {
        let radius = entity.stats().movement_radius;
        let dx = rng.gen_range(-radius..=radius);
        let dy = rng.gen_range(-radius..=radius);
        entity.move_by(dx, dy);
        moved += 1;
    }
    moved
}

/// Whether two entities are close enough to fight.
///
/// The threshold is the larger of the two kill radii, compared squared.
pub fn in_range(a: &Entity, b: &Entity) -> bool {
    let radius = a.stats().kill_radius.max(b.stats().kill_radius) as i64;
    a.distance_sq(b) <= radius * radius
}

/// Queue a battle for every unordered pair of live entities in range.
pub fn detect(entities: &[Entity], queue: &BattleQueue) -> usize {
    let mut tasks = 0;
    for (i, a) in entities.iter().enumerate() {
        if !a.is_alive() {
            continue;
        }
        for b in &entities[i + 1..] {
            if b.is_alive() && a.is_alive() && in_range(a, b) {
                queue.push(BattleTask::new(a.id(), b.id()));
                tasks += 1;
            }
        }
    }
    tasks
}

pub fn move_and_detect<R: Rng>(
    entities: &[Entity],
    queue: &BattleQueue,
    rng: &mut R,
) -> TickSummary {
    let moved = move_all(entities, rng);
    let tasks = detect(entities, queue);
    TickSummary { moved, tasks }
}

pub(crate) fn run<R: Rng>(shared: &Shared, mut rng: R) {
    let interval = shared.config.tick_interval();
    let mut ticks: u64 = 0;

    while shared.is_running() {
        let summary = {
            let entities = shared.registry.read();
            move_and_detect(&entities, &shared.queue, &mut rng)
        };
        ticks += 1;
        trace!(
            tick = ticks,
            moved = summary.moved,
            tasks = summary.tasks,
            "Move/detect pass"
        );

        thread::park_timeout(interval);
    }

    debug!(ticks, "Mover/detector stopped");
}
