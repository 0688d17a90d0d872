//! Concurrent predation simulation.
//!
//! Entities of three kinds wander a bounded map. A mover/detector thread
//! perturbs positions and queues battles for entities in range, a resolver
//! thread settles those battles along the predation cycle, and a renderer
//! thread prints periodic snapshots and ends the run at its deadline.

pub mod console;
pub mod entity;
pub mod factory;
pub mod journal;
pub mod mover;
pub mod queue;
pub mod registry;
pub mod renderer;
pub mod resolver;
pub mod rules;
pub mod simulation;

pub use console::{CaptureBuffer, Console};
pub use entity::Entity;
pub use factory::EntityFactory;
pub use journal::{BattleObserver, FileJournal, KillEvent};
pub use queue::{BattleQueue, BattleTask};
pub use registry::Registry;
pub use mover::TickSummary;
pub use renderer::Frame;
pub use resolver::{AttackOutcome, BattleReport, BattleResolver, ResolverStats};
pub use rules::{Dice, PredationRules, Roll};
pub use simulation::{LifecycleState, Simulation, StopReport, SurvivorRecord};
