//! Simulation lifecycle: owns the shared state and the three worker threads.

use crate::console::Console;
use crate::entity::Entity;
use crate::factory::EntityFactory;
use crate::journal::{BattleObserver, FileJournal};
use crate::queue::BattleQueue;
use crate::registry::Registry;
use crate::resolver::BattleResolver;
use crate::rules::{Dice, PredationRules};
use crate::{mover, renderer, resolver};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use skirmish_core::{EntityId, Kind, Position, Result, RunId, SimulationConfig};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{error, info, info_span};

/// State shared by every worker of one simulation.
pub(crate) struct Shared {
    pub(crate) run_id: RunId,
    pub(crate) config: SimulationConfig,
    pub(crate) registry: Registry,
    pub(crate) queue: BattleQueue,
    pub(crate) console: Arc<Console>,
    running: AtomicBool,
}

impl Shared {
    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Flip the running flag off and wake queue waiters. Returns the previous flag.
    pub(crate) fn request_shutdown(&self) -> bool {
        let was_running = self.running.swap(false, Ordering::AcqRel);
        self.queue.close();
        was_running
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    NotRunning,
    Running,
    /// The running flag is off but workers have not been joined yet.
    Stopping,
}

/// Summary of a `stop()` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StopReport {
    pub was_running: bool,
    pub workers_joined: usize,
    pub worker_panics: usize,
    pub tasks_cleared: usize,
    pub elapsed_ms: u64,
}

/// A live entity at the time of the listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurvivorRecord {
    pub id: EntityId,
    pub name: String,
    pub kind: Kind,
    pub symbol: char,
    pub position: Position,
}

pub struct Simulation {
    shared: Arc<Shared>,
    observers: Vec<Arc<dyn BattleObserver>>,
    workers: Vec<JoinHandle<()>>,
    generation: u64,
}

impl Simulation {
    /// Build a simulation with its initial population, printing to stdout.
    ///
    /// The population comes from `roster_path` when set, otherwise from
    /// `initial_population` random entities.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;

        let mut factory = EntityFactory::new(config.map_size, config.kinds.clone(), config.seed);
        let entities = match &config.roster_path {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                factory.parse_roster(&text)
            }
            None => (1..=config.initial_population as u32)
                .map(|index| factory.create_random(index))
                .collect(),
        };

        let journal = match &config.journal_path {
            Some(path) => Some(Arc::new(FileJournal::open(path)?)),
            None => None,
        };

        let mut sim = Self::with_population(config, entities, Arc::new(Console::stdout()))?;
        if let Some(journal) = journal {
            sim.add_observer(journal);
        }
        Ok(sim)
    }

    /// Build a simulation around an explicit population and console.
    pub fn with_population(
        config: SimulationConfig,
        entities: Vec<Entity>,
        console: Arc<Console>,
    ) -> Result<Self> {
        config.validate()?;
        let registry = Registry::new(entities)?;
        let run_id = RunId::new();

        console.line(&format!(
            "Simulation initialized with {} NPCs. Map size: {}x{}",
            registry.len(),
            config.map_size,
            config.map_size
        ));
        info!(
            event = "simulation_initialized",
            run_id = %run_id,
            population = registry.len(),
            map_size = config.map_size,
            "Simulation initialized"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                run_id,
                config,
                registry,
                queue: BattleQueue::new(),
                console,
                running: AtomicBool::new(false),
            }),
            observers: Vec::new(),
            workers: Vec::new(),
            generation: 0,
        })
    }

    /// Register a kill observer. Takes effect on the next `start()`.
    pub fn add_observer(&mut self, observer: Arc<dyn BattleObserver>) {
        self.observers.push(observer);
    }

    pub fn run_id(&self) -> RunId {
        self.shared.run_id
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.shared.config
    }

    pub fn registry(&self) -> &Registry {
        &self.shared.registry
    }

    pub fn queue(&self) -> &BattleQueue {
        &self.shared.queue
    }

    pub fn is_running(&self) -> bool {
        self.shared.is_running()
    }

    pub fn state(&self) -> LifecycleState {
        if self.shared.is_running() {
            LifecycleState::Running
        } else if !self.workers.is_empty() {
            LifecycleState::Stopping
        } else {
            LifecycleState::NotRunning
        }
    }

    /// Number of worker threads currently owned
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Spawn the mover/detector, resolver, and renderer.
    ///
    /// Returns `Ok(false)` without spawning anything when already running.
    pub fn start(&mut self) -> Result<bool> {
        if self.shared.is_running() {
            return Ok(false);
        }
        if !self.workers.is_empty() {
            // Deadline expired but nobody joined yet.
            self.join_workers();
        }
        if self
            .shared
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(false);
        }

        self.shared.queue.reopen();
        self.generation += 1;

        if let Err(e) = self.spawn_workers() {
            error!("Failed to spawn simulation workers: {}", e);
            self.shared.request_shutdown();
            self.join_workers();
            return Err(e);
        }

        info!(
            event = "simulation_started",
            run_id = %self.shared.run_id,
            population = self.shared.registry.len(),
            duration_secs = self.shared.config.duration_secs,
            "Simulation started"
        );
        Ok(true)
    }

    /// Stop the workers and join them.
    ///
    /// A no-op when nothing is running and nothing is left to join. Joins
    /// workers even when the renderer already ended the run at its deadline.
    pub fn stop(&mut self) -> StopReport {
        let started = Instant::now();
        let was_running = self.shared.request_shutdown();
        if !was_running && self.workers.is_empty() {
            return StopReport::default();
        }

        for handle in &self.workers {
            handle.thread().unpark();
        }
        let (workers_joined, worker_panics) = self.join_workers();
        let tasks_cleared = self.shared.queue.clear();

        let report = StopReport {
            was_running,
            workers_joined,
            worker_panics,
            tasks_cleared,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            event = "simulation_stopped",
            run_id = %self.shared.run_id,
            was_running,
            workers_joined,
            worker_panics,
            tasks_cleared,
            elapsed_ms = report.elapsed_ms,
            survivors = self.shared.registry.count_alive(),
            "Simulation stopped"
        );
        report
    }

    pub fn survivors(&self) -> Vec<SurvivorRecord> {
        self.shared
            .registry
            .read()
            .iter()
            .filter(|e| e.is_alive())
            .map(|e| SurvivorRecord {
                id: e.id(),
                name: e.name().to_string(),
                kind: e.kind(),
                symbol: e.kind().symbol(),
                position: e.position(),
            })
            .collect()
    }

    /// Print every survivor and the total through the console.
    pub fn print_survivors(&self) {
        let survivors = self.survivors();
        self.shared.console.write_block(|out| {
            writeln!(out, "\n--- Final Survivors ---")?;
            for s in &survivors {
                writeln!(out, "[{}] {} ({}) at {}", s.symbol, s.name, s.kind, s.position)?;
            }
            writeln!(out, "Total survivors: {}", survivors.len())?;
            writeln!(out, "-----------------------")
        });
    }

    fn spawn_workers(&mut self) -> Result<()> {
        let seed = self.shared.config.seed.map(|s| {
            s.wrapping_add(self.generation.wrapping_mul(0x9E37_79B9_7F4A_7C15))
        });

        let shared = Arc::clone(&self.shared);
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let handle = thread::Builder::new()
            .name("skirmish-mover".into())
            .spawn(move || {
                let span = info_span!("worker", run_id = %shared.run_id, worker = "mover");
                let _enter = span.enter();
                mover::run(&shared, rng);
            })?;
        self.workers.push(handle);

        let shared = Arc::clone(&self.shared);
        let mut battle = BattleResolver::new(
            PredationRules::cycle(),
            Dice::new(shared.config.dice_sides, seed.map(|s| s.wrapping_add(1))),
            Arc::clone(&shared.console),
        );
        for observer in &self.observers {
            battle.add_observer(Arc::clone(observer));
        }
        let handle = thread::Builder::new()
            .name("skirmish-resolver".into())
            .spawn(move || {
                let span = info_span!("worker", run_id = %shared.run_id, worker = "resolver");
                let _enter = span.enter();
                resolver::run(&shared, battle);
            })?;
        self.workers.push(handle);

        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name("skirmish-renderer".into())
            .spawn(move || {
                let span = info_span!("worker", run_id = %shared.run_id, worker = "renderer");
                let _enter = span.enter();
                renderer::run(&shared);
            })?;
        self.workers.push(handle);

        Ok(())
    }

    /// Join every owned worker. Returns `(joined, panicked)`.
    fn join_workers(&mut self) -> (usize, usize) {
        let mut joined = 0;
        let mut panicked = 0;
        for handle in self.workers.drain(..) {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            match handle.join() {
                Ok(()) => joined += 1,
                Err(_) => {
                    panicked += 1;
                    error!(worker = %name, "Worker thread panicked");
                }
            }
        }
        (joined, panicked)
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.stop();
    }
}
