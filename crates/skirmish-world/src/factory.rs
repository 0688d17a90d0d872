//! Entity construction.

use crate::entity::Entity;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use skirmish_core::{EntityId, Error, Kind, KindTable, Position, Result};
use tracing::warn;

/// Manufactures typed entities with the configured per-kind stats.
pub struct EntityFactory {
    rng: ChaCha8Rng,
    map_size: i32,
    kinds: KindTable,
}

impl EntityFactory {
    pub fn new(map_size: i32, kinds: KindTable, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            rng,
            map_size,
            kinds,
        }
    }

    /// Randomly-kinded entity at a random in-bounds position, named `NPC_<index>`.
    pub fn create_random(&mut self, index: u32) -> Entity {
        let x = self.rng.gen_range(0..=self.map_size);
        let y = self.rng.gen_range(0..=self.map_size);
        let kind = Kind::ALL[self.rng.gen_range(0..Kind::ALL.len())];
        self.build(EntityId(index), format!("NPC_{}", index), kind, Position::new(x, y))
    }

    /// Entity of a named kind. Unknown kinds and out-of-bounds positions are rejected.
    pub fn create(&self, id: EntityId, kind: &str, name: &str, x: i32, y: i32) -> Result<Entity> {
        let kind: Kind = kind.parse()?;
        let position = Position::new(x, y);
        if !position.in_bounds(self.map_size) {
            return Err(Error::OutOfBounds {
                x,
                y,
                max: self.map_size,
            });
        }
        Ok(self.build(id, name.to_string(), kind, position))
    }

    /// Parse a `Kind|name|x|y` roster line.
    pub fn parse_line(&self, id: EntityId, line: &str) -> Result<Entity> {
        let parts: Vec<&str> = line.trim().split('|').collect();
        let [kind, name, x, y] = parts.as_slice() else {
            return Err(Error::Parse(format!(
                "expected Kind|name|x|y, got {:?}",
                line
            )));
        };

        let x = x
            .trim()
            .parse::<i32>()
            .map_err(|e| Error::Parse(format!("bad x coordinate {:?}: {}", x, e)))?;
        let y = y
            .trim()
            .parse::<i32>()
            .map_err(|e| Error::Parse(format!("bad y coordinate {:?}: {}", y, e)))?;

        self.create(id, kind, name.trim(), x, y)
    }

    /// Parse a whole roster. Bad lines are logged and skipped; blank lines
    /// and `#` comments are ignored.
    pub fn parse_roster(&self, text: &str) -> Vec<Entity> {
        let mut entities = Vec::new();
        for (line_no, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let id = EntityId(entities.len() as u32 + 1);
            match self.parse_line(id, trimmed) {
                Ok(entity) => entities.push(entity),
                Err(e) => warn!(line = line_no + 1, "Skipping roster entry: {}", e),
            }
        }
        entities
    }

    fn build(&self, id: EntityId, name: String, kind: Kind, position: Position) -> Entity {
        Entity::new(id, name, kind, self.kinds.get(kind), position, self.map_size)
    }
}
