//! Core types for the Synheart Voice engine
//!
//! This module defines the data structures that flow through a check-in:
//! acoustic features, the self-report, the personal baseline, risk flags,
//! and the persisted check-in record.
//!
//! Field names serialize in camelCase to stay wire-compatible with existing
//! check-in databases (`pauseRatio`, `avgEnergy`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse acoustic features extracted from one ~20s recording
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureVector {
    /// Mean RMS energy (loudness proxy, >= 0)
    pub rms: f64,
    /// Mean zero-crossing rate (roughness proxy, >= 0)
    pub zcr: f64,
    /// Fraction of frames below the silence threshold (0-1)
    pub pause_ratio: f64,
    /// Speech bursts per second (>= 0)
    pub speech_rate: f64,
}

/// User- or inference-supplied stress and fatigue levels (0-10)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelfReport {
    pub stress: f64,
    pub fatigue: f64,
}

impl Default for SelfReport {
    fn default() -> Self {
        Self {
            stress: 5.0,
            fatigue: 5.0,
        }
    }
}

/// Running mean of past check-ins' energy and stress
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Baseline {
    /// Mean `rms` over all recorded check-ins
    pub avg_energy: f64,
    /// Mean self-reported stress over all recorded check-ins
    pub avg_stress: f64,
    /// Number of check-ins folded into the averages
    pub window_size: u32,
}

/// Risk categories the scorer can flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskCategory {
    LethargyPattern,
    AnxietyPattern,
    RespiratoryStrain,
    VocalStrain,
}

impl RiskCategory {
    /// All categories in emission order
    pub const ALL: [RiskCategory; 4] = [
        RiskCategory::LethargyPattern,
        RiskCategory::AnxietyPattern,
        RiskCategory::RespiratoryStrain,
        RiskCategory::VocalStrain,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::LethargyPattern => "LETHARGY_PATTERN",
            RiskCategory::AnxietyPattern => "ANXIETY_PATTERN",
            RiskCategory::RespiratoryStrain => "RESPIRATORY_STRAIN",
            RiskCategory::VocalStrain => "VOCAL_STRAIN",
        }
    }

    /// Human-readable description appended to the flag message
    pub fn description(&self) -> &'static str {
        match self {
            RiskCategory::LethargyPattern => "Detected low energy and lethargic speech patterns.",
            RiskCategory::AnxietyPattern => "High anxiety markers detected.",
            RiskCategory::RespiratoryStrain => "Respiratory strain signatures detected.",
            RiskCategory::VocalStrain => "Vocal roughness/strain detected.",
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A category whose probability crossed the display threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFlag {
    #[serde(rename = "type")]
    pub category: RiskCategory,
    /// Probability percent (0-100)
    pub score: u8,
    pub message: String,
}

impl RiskFlag {
    pub fn new(category: RiskCategory, score: u8) -> Self {
        Self {
            category,
            score,
            message: format!("Probability: {}%. {}", score, category.description()),
        }
    }
}

/// One persisted check-in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub features: FeatureVector,
    pub self_report: SelfReport,
    /// Flags produced when the check-in was submitted (absent in older records)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<RiskFlag>,
}

impl CheckInRecord {
    /// Create a record with a fresh id and the current time
    pub fn new(features: FeatureVector, self_report: SelfReport) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            features,
            self_report,
            flags: Vec::new(),
        }
    }
}

/// One point of the trend history shown on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    /// Short label, e.g. "15 Mon"
    pub date: String,
    pub energy: f64,
    pub stress: f64,
    pub speech_rate: f64,
    pub original_timestamp: DateTime<Utc>,
}
