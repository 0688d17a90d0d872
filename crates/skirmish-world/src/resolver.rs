//! Battle resolver worker.
//!
//! The single consumer of the battle queue. It re-validates every task,
//! settles combat along the predation rules, and compacts the registry
//! after each task.

use crate::console::Console;
use crate::entity::Entity;
use crate::journal::{BattleObserver, KillEvent};
use crate::queue::BattleTask;
use crate::registry::{self, Registry};
use crate::rules::{PredationRules, Roll};
use crate::simulation::Shared;
use skirmish_core::{EntityId, Kind};
use std::sync::Arc;
use tracing::{debug, info};

/// Result of one attack attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackOutcome {
    pub attacker: EntityId,
    pub attacker_name: String,
    pub attacker_kind: Kind,
    pub defender: EntityId,
    pub defender_name: String,
    pub defender_kind: Kind,
    pub attack_roll: u32,
    pub defense_roll: u32,
    pub killed: bool,
}

impl AttackOutcome {
    pub fn describe(&self) -> String {
        let mut line = format!(
            "{} ({}) attacks {} ({}). Attack: {}, Defense: {}.",
            self.attacker_name,
            self.attacker_kind,
            self.defender_name,
            self.defender_kind,
            self.attack_roll,
            self.defense_roll
        );
        if self.killed {
            line.push_str(&format!(" -> VICTORY! {} killed.", self.defender_name));
        } else {
            line.push_str(" -> Missed.");
        }
        line
    }
}

/// What became of a dequeued task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BattleReport {
    /// A participant was already dead or gone; nothing was mutated.
    Stale,
    /// Both participants were alive. `attacks` is empty when neither kind
    /// defeats the other.
    Resolved { attacks: Vec<AttackOutcome> },
}

impl BattleReport {
    pub fn kills(&self) -> usize {
        match self {
            BattleReport::Stale => 0,
            BattleReport::Resolved { attacks } => attacks.iter().filter(|a| a.killed).count(),
        }
    }
}

/// Running totals for one resolver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverStats {
    pub processed: u64,
    pub stale: u64,
    pub attacks: u64,
    pub kills: u64,
}

pub struct BattleResolver<R: Roll> {
    rules: PredationRules,
    dice: R,
    console: Arc<Console>,
    observers: Vec<Arc<dyn BattleObserver>>,
    stats: ResolverStats,
}

impl<R: Roll> BattleResolver<R> {
    pub fn new(rules: PredationRules, dice: R, console: Arc<Console>) -> Self {
        Self {
            rules,
            dice,
            console,
            observers: Vec::new(),
            stats: ResolverStats::default(),
        }
    }

    pub fn add_observer(&mut self, observer: Arc<dyn BattleObserver>) {
        self.observers.push(observer);
    }

    pub fn stats(&self) -> ResolverStats {
        self.stats
    }

    /// Settle one task against a registry view.
    ///
    /// The first participant attacks if its kind defeats the second's; then
    /// the second strikes back if it survived and its kind defeats the first's.
    pub fn resolve(&mut self, entities: &[Entity], task: BattleTask) -> BattleReport {
        self.stats.processed += 1;

        let participants = registry::find(entities, task.first).zip(registry::find(entities, task.second));
        let Some((first, second)) = participants.filter(|(a, b)| a.is_alive() && b.is_alive())
        else {
            self.stats.stale += 1;
            debug!(first = %task.first, second = %task.second, "Discarding stale battle");
            return BattleReport::Stale;
        };

        let mut attacks = Vec::new();
        if let Some(outcome) = self.attack(first, second) {
            attacks.push(outcome);
        }
        if let Some(outcome) = self.attack(second, first) {
            attacks.push(outcome);
        }

        BattleReport::Resolved { attacks }
    }

    /// Resolve under shared access, then compact under exclusive access.
    pub fn process(&mut self, registry: &Registry, task: BattleTask) -> BattleReport {
        let report = {
            let entities = registry.read();
            self.resolve(&entities, task)
        };
        registry.compact();
        report
    }

    fn attack(&mut self, attacker: &Entity, defender: &Entity) -> Option<AttackOutcome> {
        if !attacker.is_alive()
            || !defender.is_alive()
            || !self.rules.can_kill(attacker.kind(), defender.kind())
        {
            return None;
        }

        let attack_roll = self.dice.roll();
        let defense_roll = self.dice.roll();
        let killed = attack_roll > defense_roll && defender.kill();

        let outcome = AttackOutcome {
            attacker: attacker.id(),
            attacker_name: attacker.name().to_string(),
            attacker_kind: attacker.kind(),
            defender: defender.id(),
            defender_name: defender.name().to_string(),
            defender_kind: defender.kind(),
            attack_roll,
            defense_roll,
            killed,
        };

        self.stats.attacks += 1;
        debug!(
            event = "attack",
            attacker = %outcome.attacker,
            defender = %outcome.defender,
            attack_roll,
            defense_roll,
            killed,
            "Attack resolved"
        );
        self.console.line(&outcome.describe());

        if killed {
            self.stats.kills += 1;
            let event = KillEvent {
                killer_id: outcome.attacker,
                killer_name: outcome.attacker_name.clone(),
                killer_kind: outcome.attacker_kind,
                victim_id: outcome.defender,
                victim_name: outcome.defender_name.clone(),
                victim_kind: outcome.defender_kind,
            };
            info!(
                event = "kill",
                killer = %event.killer_id,
                killer_kind = %event.killer_kind,
                victim = %event.victim_id,
                victim_kind = %event.victim_kind,
                "{}",
                event.describe()
            );
            for observer in &self.observers {
                observer.on_kill(&event);
            }
        }

        Some(outcome)
    }
}

pub(crate) fn run<R: Roll>(shared: &Shared, mut resolver: BattleResolver<R>) -> ResolverStats {
    while let Some(task) = shared.queue.pop_blocking() {
        resolver.process(&shared.registry, task);
    }

    let stats = resolver.stats();
    debug!(
        processed = stats.processed,
        stale = stats.stale,
        kills = stats.kills,
        "Battle resolver stopped"
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::CaptureBuffer;
    use parking_lot::Mutex;
    use skirmish_core::{KindStats, Position};
    use std::collections::VecDeque;

    /// Replays a fixed list of rolls.
    struct ScriptedDice(VecDeque<u32>);

    impl ScriptedDice {
        fn new(rolls: &[u32]) -> Self {
            Self(rolls.iter().copied().collect())
        }
    }

    impl Roll for ScriptedDice {
        fn roll(&mut self) -> u32 {
            self.0.pop_front().expect("script ran out of rolls")
        }
    }

    #[derive(Default)]
    struct KillRecorder(Mutex<Vec<KillEvent>>);

    impl BattleObserver for KillRecorder {
        fn on_kill(&self, event: &KillEvent) {
            self.0.lock().push(event.clone());
        }
    }

    fn entity(id: u32, kind: Kind) -> Entity {
        Entity::new(
            EntityId(id),
            format!("NPC_{}", id),
            kind,
            KindStats::new(0, 10),
            Position::new(5, 5),
            100,
        )
    }

    fn resolver(rolls: &[u32]) -> BattleResolver<ScriptedDice> {
        BattleResolver::new(
            PredationRules::cycle(),
            ScriptedDice::new(rolls),
            Arc::new(Console::sink()),
        )
    }

    fn task(a: u32, b: u32) -> BattleTask {
        BattleTask::new(EntityId(a), EntityId(b))
    }

    #[test]
    fn test_predator_kills_prey_on_higher_roll() {
        let registry = Registry::new(vec![entity(1, Kind::Dragon), entity(2, Kind::Elf)]).unwrap();
        let mut resolver = resolver(&[6, 1]);

        let report = resolver.process(&registry, task(1, 2));
        assert_eq!(report.kills(), 1);
        let BattleReport::Resolved { attacks } = report else {
            panic!("expected resolved battle");
        };
        assert_eq!(attacks.len(), 1);
        assert_eq!(attacks[0].attacker, EntityId(1));
        assert_eq!(attacks[0].defender, EntityId(2));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.read()[0].kind(), Kind::Dragon);
    }

    #[test]
    fn test_prey_listed_first_still_dies() {
        // Elf first: Elf cannot hurt a Dragon, the Dragon strikes back.
        let registry = Registry::new(vec![entity(1, Kind::Elf), entity(2, Kind::Dragon)]).unwrap();
        let mut resolver = resolver(&[5, 2]);

        let report = resolver.process(&registry, task(1, 2));
        assert_eq!(report.kills(), 1);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.read()[0].id(), EntityId(2));
    }

    #[test]
    fn test_tie_is_a_miss() {
        let registry = Registry::new(vec![entity(1, Kind::Druid), entity(2, Kind::Dragon)]).unwrap();
        let mut resolver = resolver(&[4, 4]);

        let report = resolver.process(&registry, task(1, 2));
        assert_eq!(report.kills(), 0);
        assert_eq!(registry.count_alive(), 2);
        assert_eq!(resolver.stats().attacks, 1);
    }

    #[test]
    fn test_same_kind_never_fights() {
        let registry = Registry::new(vec![entity(1, Kind::Elf), entity(2, Kind::Elf)]).unwrap();
        // No rolls scripted: any roll would panic.
        let mut resolver = resolver(&[]);

        for _ in 0..100 {
            let report = resolver.process(&registry, task(1, 2));
            assert_eq!(report, BattleReport::Resolved { attacks: Vec::new() });
        }
        assert_eq!(registry.count_alive(), 2);
    }

    #[test]
    fn test_stale_task_is_discarded_without_mutation() {
        let registry = Registry::new(vec![
            entity(1, Kind::Dragon),
            entity(2, Kind::Elf),
            entity(3, Kind::Druid),
        ])
        .unwrap();
        registry.read()[1].kill();
        let mut resolver = resolver(&[]);

        let entities = registry.read();
        assert_eq!(resolver.resolve(&entities, task(1, 2)), BattleReport::Stale);
        assert!(entities[0].is_alive());
        assert!(entities[2].is_alive());
        drop(entities);

        // Once compacted away the id is simply missing.
        registry.compact();
        assert_eq!(resolver.process(&registry, task(1, 2)), BattleReport::Stale);
        assert_eq!(resolver.stats().stale, 2);
        assert_eq!(registry.count_alive(), 2);
    }

    #[test]
    fn test_kill_notifies_observers_and_console() {
        let buffer = CaptureBuffer::new();
        let recorder = Arc::new(KillRecorder::default());
        let mut resolver = BattleResolver::new(
            PredationRules::cycle(),
            ScriptedDice::new(&[3, 2]),
            Arc::new(Console::with_writer(buffer.clone())),
        );
        resolver.add_observer(recorder.clone());

        let registry = Registry::new(vec![entity(1, Kind::Elf), entity(2, Kind::Druid)]).unwrap();
        resolver.process(&registry, task(1, 2));

        let kills = recorder.0.lock();
        assert_eq!(kills.len(), 1);
        assert_eq!(kills[0].describe(), "Elf (NPC_1) killed Druid (NPC_2)");
        assert_eq!(
            buffer.contents(),
            "NPC_1 (Elf) attacks NPC_2 (Druid). Attack: 3, Defense: 2. -> VICTORY! NPC_2 killed.\n"
        );
    }

    #[test]
    fn test_kills_follow_cycle_only() {
        for attacker in Kind::ALL {
            for defender in Kind::ALL {
                let registry = Registry::new(vec![entity(1, attacker), entity(2, defender)]).unwrap();
                let mut resolver = BattleResolver::new(
                    PredationRules::cycle(),
                    ScriptedDice::new(&[6, 1, 6, 1]),
                    Arc::new(Console::sink()),
                );
                let report = resolver.process(&registry, task(1, 2));

                let expected = PredationRules::cycle().can_kill(attacker, defender)
                    || PredationRules::cycle().can_kill(defender, attacker);
                assert_eq!(report.kills(), usize::from(expected), "{} vs {}", attacker, defender);

                if let BattleReport::Resolved { attacks } = report {
                    for attack in attacks.iter().filter(|a| a.killed) {
                        assert!(PredationRules::cycle().can_kill(attack.attacker_kind, attack.defender_kind));
                    }
                }
            }
        }
    }
}
