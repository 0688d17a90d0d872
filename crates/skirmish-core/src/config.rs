//! Configuration types for the simulation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{Error, Kind, KindStats, Result};

/// Movement and kill radii for every kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KindTable {
    pub dragon: KindStats,
    pub elf: KindStats,
    pub druid: KindStats,
}

impl KindTable {
    pub fn get(&self, kind: Kind) -> KindStats {
        match kind {
            Kind::Dragon => self.dragon,
            Kind::Elf => self.elf,
            Kind::Druid => self.druid,
        }
    }
}

impl Default for KindTable {
    fn default() -> Self {
        Self {
            dragon: KindStats::new(50, 30),
            elf: KindStats::new(10, 50),
            druid: KindStats::new(10, 10),
        }
    }
}

/// Simulation configuration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Inclusive upper bound of both map axes
    pub map_size: i32,
    /// Number of entities created at construction
    pub initial_population: usize,
    /// Wall-clock length of a run (seconds)
    pub duration_secs: u64,
    /// Mover/detector sleep between passes (milliseconds)
    pub tick_interval_ms: u64,
    /// Renderer sleep between frames (milliseconds)
    pub render_interval_ms: u64,
    /// Rendered grid is `grid_size` x `grid_size` cells
    pub grid_size: usize,
    /// Faces on the combat die
    pub dice_sides: u32,
    /// Per-kind radii
    pub kinds: KindTable,
    /// RNG seed; entropy when absent
    pub seed: Option<u64>,
    /// Emit an ANSI clear-screen before each frame
    pub clear_screen: bool,
    /// Append kills to this file when set
    pub journal_path: Option<PathBuf>,
    /// Load the initial population from this roster file when set
    pub roster_path: Option<PathBuf>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            map_size: 100,
            initial_population: 50,
            duration_secs: 30,
            tick_interval_ms: 100,
            render_interval_ms: 1000,
            grid_size: 10,
            dice_sides: 6,
            kinds: KindTable::default(),
            seed: None,
            clear_screen: true,
            journal_path: None,
            roster_path: None,
        }
    }
}

impl SimulationConfig {
    /// Load and validate a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: SimulationConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.map_size < 1 {
            return Err(Error::Validation(format!(
                "map_size must be at least 1, got {}",
                self.map_size
            )));
        }
        if self.grid_size < 1 || self.grid_size > self.map_size as usize + 1 {
            return Err(Error::Validation(format!(
                "grid_size must be in [1, {}], got {}",
                self.map_size + 1,
                self.grid_size
            )));
        }
        if self.dice_sides < 2 {
            return Err(Error::Validation(format!(
                "dice_sides must be at least 2, got {}",
                self.dice_sides
            )));
        }
        if self.tick_interval_ms == 0 || self.render_interval_ms == 0 {
            return Err(Error::Validation(
                "tick and render intervals must be non-zero".to_string(),
            ));
        }
        for kind in Kind::ALL {
            let stats = self.kinds.get(kind);
            if stats.movement_radius < 0 || stats.kill_radius < 0 {
                return Err(Error::Validation(format!(
                    "{} radii must be non-negative, got {:?}",
                    kind, stats
                )));
            }
        }
        Ok(())
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render_interval_ms)
    }
}

/// Log output format for the runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Runner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Simulation settings
    pub simulation: SimulationConfig,
    /// Log output format
    pub log_format: LogFormat,
    /// Extra wait after the deadline before forcing `stop()` (milliseconds)
    pub grace_period_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            log_format: LogFormat::Pretty,
            grace_period_ms: 500,
        }
    }
}

impl RunnerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: RunnerConfig = serde_json::from_str(&text)?;
        config.simulation.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs() {
        let config = SimulationConfig::default();
        assert_eq!(config.map_size, 100);
        assert_eq!(config.initial_population, 50);
        assert_eq!(config.duration(), Duration::from_secs(30));
        assert_eq!(config.tick_interval(), Duration::from_millis(100));
        assert!(config.validate().is_ok());

        assert_eq!(config.kinds.get(Kind::Elf), KindStats::new(10, 50));
        assert_eq!(config.kinds.get(Kind::Dragon), KindStats::new(50, 30));
        assert_eq!(config.kinds.get(Kind::Druid), KindStats::new(10, 10));

        let runner = RunnerConfig::default();
        assert_eq!(runner.log_format, LogFormat::Pretty);
        assert_eq!(runner.grace_period_ms, 500);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let config = SimulationConfig {
            map_size: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Validation(_))));

        let config = SimulationConfig {
            grid_size: 102,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Validation(_))));

        let config = SimulationConfig {
            dice_sides: 1,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Validation(_))));

        let mut config = SimulationConfig::default();
        config.kinds.druid.kill_radius = -1;
        assert!(matches!(config.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SimulationConfig =
            serde_json::from_str(r#"{ "map_size": 40, "seed": 7 }"#).unwrap();
        assert_eq!(config.map_size, 40);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.initial_population, 50);

        let runner: RunnerConfig =
            serde_json::from_str(r#"{ "log_format": "json" }"#).unwrap();
        assert_eq!(runner.log_format, LogFormat::Json);
        assert_eq!(runner.simulation.map_size, 100);
    }

    #[test]
    fn test_config_serialization() {
        let config = SimulationConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: SimulationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.map_size, deserialized.map_size);
        assert_eq!(config.kinds.elf, deserialized.kinds.elf);
    }
}
