//! Check-in storage
//!
//! A flat JSON file holding every check-in and the running baseline:
//!
//! ```json
//! { "checkIns": [ ... ], "baseline": { "avgEnergy": 0.5, "avgStress": 5, "windowSize": 0 } }
//! ```
//!
//! The store owns an in-memory copy and rewrites the whole file on every
//! append. A single writer is assumed.

use crate::error::ComputeError;
use crate::types::{Baseline, CheckInRecord, HistoryPoint};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default database file name
pub const DEFAULT_DB_FILE: &str = "db.json";

/// On-disk database layout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    #[serde(default)]
    pub check_ins: Vec<CheckInRecord>,
    #[serde(default)]
    pub baseline: Baseline,
}

impl Database {
    /// Baseline as it would be after appending a check-in with these values
    pub fn baseline_with(&self, rms: f64, stress: f64) -> Baseline {
        let n = u32::try_from(self.check_ins.len() + 1).unwrap_or(u32::MAX);
        let mut next = self.baseline;
        next.record_as_nth(n, rms, stress);
        next
    }

    /// Append a record and fold it into the baseline
    pub fn push(&mut self, record: CheckInRecord) {
        self.baseline = self.baseline_with(record.features.rms, record.self_report.stress);
        self.check_ins.push(record);
    }

    /// Trend history in check-in order
    pub fn history(&self) -> Vec<HistoryPoint> {
        self.check_ins.iter().map(history_point).collect()
    }
}

fn history_point(record: &CheckInRecord) -> HistoryPoint {
    HistoryPoint {
        date: record.timestamp.format("%-d %a").to_string(),
        energy: record.features.rms,
        stress: record.self_report.stress,
        speech_rate: record.features.speech_rate,
        original_timestamp: record.timestamp,
    }
}

/// File-backed check-in store
#[derive(Debug)]
pub struct CheckInStore {
    path: Option<PathBuf>,
    db: Database,
}

impl CheckInStore {
    /// Open the database at `path`.
    ///
    /// A missing file starts an empty database. An unreadable or corrupt file
    /// also starts empty (and is overwritten on the next append).
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let db = match fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str::<Database>(&data) {
                Ok(db) => db,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "corrupt check-in database, starting empty");
                    Database::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Database::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot read check-in database, starting empty");
                Database::default()
            }
        };

        tracing::debug!(
            path = %path.display(),
            check_ins = db.check_ins.len(),
            "opened check-in store"
        );

        Self {
            path: Some(path),
            db,
        }
    }

    /// A store that never touches the filesystem
    pub fn in_memory() -> Self {
        Self {
            path: None,
            db: Database::default(),
        }
    }

    /// Wrap an existing database without a backing file
    pub fn from_database(db: Database) -> Self {
        Self { path: None, db }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn check_ins(&self) -> &[CheckInRecord] {
        &self.db.check_ins
    }

    pub fn baseline(&self) -> Baseline {
        self.db.baseline
    }

    pub fn history(&self) -> Vec<HistoryPoint> {
        self.db.history()
    }

    /// Append a check-in, update the baseline, and persist.
    ///
    /// If the file cannot be written the in-memory log and baseline are left
    /// as they were.
    pub fn add_check_in(&mut self, record: CheckInRecord) -> Result<(), ComputeError> {
        let id = record.id.clone();
        let previous = self.db.baseline;
        self.db.push(record);
        if let Err(e) = self.flush() {
            self.db.check_ins.pop();
            self.db.baseline = previous;
            return Err(e);
        }

        tracing::info!(
            id = %id,
            window_size = self.db.baseline.window_size,
            avg_energy = self.db.baseline.avg_energy,
            avg_stress = self.db.baseline.avg_stress,
            "recorded check-in"
        );
        Ok(())
    }

    fn flush(&self) -> Result<(), ComputeError> {
        if let Some(path) = &self.path {
            let json = serde_json::to_string_pretty(&self.db)?;
            fs::write(path, json)?;
        }
        Ok(())
    }
}
