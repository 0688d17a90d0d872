//! Renderer worker: periodic grid snapshots and the run deadline.

use crate::entity::Entity;
use crate::simulation::Shared;
use std::fmt;
use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub const EMPTY_CELL: char = '.';
pub const COLLISION_CELL: char = '*';
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[1;1H";

/// A textual snapshot of the map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    cells: Vec<Vec<char>>,
    alive: usize,
    remaining: Duration,
}

impl Frame {
    /// Map every live entity into a `grid_size` x `grid_size` grid.
    ///
    /// A cell already holding a symbol becomes [`COLLISION_CELL`].
    pub fn capture(entities: &[Entity], map_size: i32, grid_size: usize, remaining: Duration) -> Self {
        let mut cells = vec![vec![EMPTY_CELL; grid_size]; grid_size];
        let mut alive = 0;

        for entity in entities.iter().filter(|e| e.is_alive()) {
            let position = entity.position();
            if let (Some(col), Some(row)) = (
                cell_index(position.x, map_size, grid_size),
                cell_index(position.y, map_size, grid_size),
            ) {
                let cell = &mut cells[row][col];
                *cell = if *cell == EMPTY_CELL {
                    entity.kind().symbol()
                } else {
                    COLLISION_CELL
                };
            }
            alive += 1;
        }

        Self {
            cells,
            alive,
            remaining,
        }
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<char> {
        self.cells.get(row).and_then(|r| r.get(col)).copied()
    }

    pub fn alive(&self) -> usize {
        self.alive
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }
}

fn cell_index(coord: i32, map_size: i32, grid_size: usize) -> Option<usize> {
    let index = coord as i64 * grid_size as i64 / (map_size as i64 + 1);
    usize::try_from(index).ok().filter(|i| *i < grid_size)
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Map Status ---")?;
        writeln!(f, "Remaining time: {}s", self.remaining.as_secs())?;
        for row in &self.cells {
            for cell in row {
                write!(f, "{} ", cell)?;
            }
            writeln!(f)?;
        }
        writeln!(f, "Alive NPCs: {}", self.alive)?;
        writeln!(f, "Legend: E=Elf, D=Dragon, R=Druid, *=Multiple, .=Empty")?;
        write!(f, "--------------------------------")
    }
}

pub(crate) fn run(shared: &Shared) {
    let started = Instant::now();
    let deadline = started + shared.config.duration();
    let interval = shared.config.render_interval();
    let mut frames: u64 = 0;

    while shared.is_running() && Instant::now() < deadline {
        let remaining = deadline.saturating_duration_since(Instant::now());
        {
            let entities = shared.registry.read();
            let frame = Frame::capture(
                &entities,
                shared.config.map_size,
                shared.config.grid_size,
                remaining,
            );
            shared.console.write_block(|out| {
                if shared.config.clear_screen {
                    write!(out, "{}", CLEAR_SCREEN)?;
                }
                writeln!(out, "{}", frame)
            });
        }
        frames += 1;

        let until_deadline = deadline.saturating_duration_since(Instant::now());
        thread::park_timeout(interval.min(until_deadline));
    }

    if shared.is_running() {
        shared.console.line("\nSimulation time expired. Stopping threads.");
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Simulation deadline reached"
        );
    }
    shared.request_shutdown();
    debug!(frames, "Renderer stopped");
}
