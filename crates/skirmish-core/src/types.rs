//! Core type definitions for the simulation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::Error;

/// Unique identifier for a simulation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identifier for an entity within one registry.
///
/// Battle tasks and worker-local references carry ids, never live handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 2D position on the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Displace by `(dx, dy)` and clamp each axis into `[0, map_size]`.
    pub fn offset_clamped(&self, dx: i32, dy: i32, map_size: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx).clamp(0, map_size),
            y: self.y.saturating_add(dy).clamp(0, map_size),
        }
    }

    pub fn in_bounds(&self, map_size: i32) -> bool {
        (0..=map_size).contains(&self.x) && (0..=map_size).contains(&self.y)
    }

    /// Squared Euclidean distance to another position
    pub fn distance_sq(&self, other: &Position) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The three entity kinds of the predation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    Dragon,
    Elf,
    Druid,
}

impl Kind {
    pub const ALL: [Kind; 3] = [Kind::Dragon, Kind::Elf, Kind::Druid];

    /// Dense index, used by rule tables
    pub fn index(&self) -> usize {
        match self {
            Kind::Dragon => 0,
            Kind::Elf => 1,
            Kind::Druid => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Kind::Dragon => "Dragon",
            Kind::Elf => "Elf",
            Kind::Druid => "Druid",
        }
    }

    /// Map symbol
    pub fn symbol(&self) -> char {
        match self {
            Kind::Dragon => 'D',
            Kind::Elf => 'E',
            Kind::Druid => 'R',
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Kind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Kind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownKind(s.to_string()))
    }
}

/// Per-kind movement and interaction parameters, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindStats {
    /// Max per-tick displacement along each axis
    pub movement_radius: i32,
    /// Max center-to-center distance at which combat may trigger
    pub kill_radius: i32,
}

impl KindStats {
    pub fn new(movement_radius: i32, kill_radius: i32) -> Self {
        Self {
            movement_radius,
            kill_radius,
        }
    }
}
