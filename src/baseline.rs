//! Baseline management
//!
//! The personal baseline is a running mean of every recorded check-in's
//! energy (`rms`) and self-reported stress. It is a plain value: the scorer
//! reads it, and the store advances it after each persisted check-in.

use crate::types::{Baseline, FeatureVector, SelfReport};

/// Energy assumed before any check-in is recorded
pub const DEFAULT_AVG_ENERGY: f64 = 0.5;

/// Stress assumed before any check-in is recorded
pub const DEFAULT_AVG_STRESS: f64 = 5.0;

impl Default for Baseline {
    fn default() -> Self {
        Self {
            avg_energy: DEFAULT_AVG_ENERGY,
            avg_stress: DEFAULT_AVG_STRESS,
            window_size: 0,
        }
    }
}

impl Baseline {
    /// Fold one check-in into the running means.
    ///
    /// With `n = window_size + 1` (saturating), each average becomes
    /// `(avg * (n - 1) + new) / n`.
    /// The first recorded check-in therefore replaces the defaults outright.
    pub fn record(&mut self, rms: f64, stress: f64) {
        let n = self.window_size.saturating_add(1);
        self.record_as_nth(n, rms, stress);
    }

    /// Fold a check-in given its position `n` (1-based) in the check-in log.
    pub(crate) fn record_as_nth(&mut self, n: u32, rms: f64, stress: f64) {
        let n = n.max(1);
        let prior = f64::from(n - 1);
        let count = f64::from(n);
        self.avg_energy = (self.avg_energy * prior + rms) / count;
        self.avg_stress = (self.avg_stress * prior + stress) / count;
        self.window_size = n;
    }

    /// Baseline after recording one check-in, leaving `self` untouched
    pub fn updated_with(&self, features: &FeatureVector, self_report: &SelfReport) -> Baseline {
        let mut next = *self;
        next.record(features.rms, self_report.stress);
        next
    }

    /// Load a baseline from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the baseline to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
