//! Predation rule table and combat dice.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use skirmish_core::Kind;

/// Which kind may kill which.
///
/// A table indexed by `(attacker, defender)`; the resolver consults it
/// directly instead of dispatching on concrete kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredationRules {
    table: [[bool; 3]; 3],
}

impl PredationRules {
    /// Dragon defeats Elf, Elf defeats Druid, Druid defeats Dragon.
    pub fn cycle() -> Self {
        let mut rules = Self::none();
        rules.allow(Kind::Dragon, Kind::Elf);
        rules.allow(Kind::Elf, Kind::Druid);
        rules.allow(Kind::Druid, Kind::Dragon);
        rules
    }

    pub fn none() -> Self {
        Self {
            table: [[false; 3]; 3],
        }
    }

    fn allow(&mut self, attacker: Kind, defender: Kind) {
        self.table[attacker.index()][defender.index()] = true;
    }

    pub fn can_kill(&self, attacker: Kind, defender: Kind) -> bool {
        self.table[attacker.index()][defender.index()]
    }
}

impl Default for PredationRules {
    fn default() -> Self {
        Self::cycle()
    }
}

/// Source of combat rolls.
pub trait Roll: Send {
    fn roll(&mut self) -> u32;
}

/// Fair die rolling uniformly in `1..=sides`.
#[derive(Debug, Clone)]
pub struct Dice {
    rng: ChaCha8Rng,
    sides: u32,
}

impl Dice {
    pub fn new(sides: u32, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            rng,
            sides: sides.max(1),
        }
    }

    pub fn sides(&self) -> u32 {
        self.sides
    }
}

impl Roll for Dice {
    fn roll(&mut self) -> u32 {
        self.rng.gen_range(1..=self.sides)
    }
}
