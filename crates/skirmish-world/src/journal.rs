//! Kill observers.

use chrono::Local;
use parking_lot::Mutex;
use skirmish_core::{EntityId, Kind, Result};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::warn;

/// A confirmed kill
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KillEvent {
    pub killer_id: EntityId,
    pub killer_name: String,
    pub killer_kind: Kind,
    pub victim_id: EntityId,
    pub victim_name: String,
    pub victim_kind: Kind,
}

impl KillEvent {
    pub fn describe(&self) -> String {
        format!(
            "{} ({}) killed {} ({})",
            self.killer_kind, self.killer_name, self.victim_kind, self.victim_name
        )
    }
}

/// Receives every kill the resolver confirms.
pub trait BattleObserver: Send + Sync {
    fn on_kill(&self, event: &KillEvent);
}

/// Appends timestamped kill lines to a file.
pub struct FileJournal {
    file: Mutex<File>,
}

impl FileJournal {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl BattleObserver for FileJournal {
    fn on_kill(&self, event: &KillEvent) {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let mut file = self.file.lock();
        if let Err(e) = writeln!(file, "[{}] {}", timestamp, event.describe()) {
            warn!("Failed to write kill journal: {}", e);
        }
    }
}
