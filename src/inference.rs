//! Self-report inference
//!
//! Estimates stress and fatigue (0-10) from acoustic features when the user
//! does not supply them. Each feature is z-scored against population
//! statistics and combined into opposing stress/fatigue sums.

use crate::types::{FeatureVector, SelfReport};
use serde::{Deserialize, Serialize};

/// Mean and standard deviation of one feature
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureStats {
    pub mean: f64,
    pub std: f64,
}

impl FeatureStats {
    pub const fn new(mean: f64, std: f64) -> Self {
        Self { mean, std }
    }

    fn z_score(&self, value: f64) -> f64 {
        if self.std == 0.0 {
            return 0.0;
        }
        (value - self.mean) / self.std
    }
}

/// Reference statistics used for z-scoring
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimatorBaseline {
    pub speech_rate: FeatureStats,
    pub rms: FeatureStats,
    pub zcr: FeatureStats,
    pub pause_ratio: FeatureStats,
}

impl Default for EstimatorBaseline {
    /// Population defaults
    fn default() -> Self {
        Self {
            speech_rate: FeatureStats::new(4.0, 0.5),
            rms: FeatureStats::new(0.2, 0.05),
            zcr: FeatureStats::new(0.1, 0.05),
            pause_ratio: FeatureStats::new(0.2, 0.05),
        }
    }
}

/// Clip to [-3, 3] and rescale onto 0-10
fn to_scale(value: f64) -> f64 {
    const MIN: f64 = -3.0;
    const MAX: f64 = 3.0;
    let clipped = value.clamp(MIN, MAX);
    (((clipped - MIN) / (MAX - MIN)) * 10.0).round()
}

/// Infers a [`SelfReport`] from features
#[derive(Debug, Clone, Default)]
pub struct SelfReportEstimator {
    baseline: EstimatorBaseline,
}

impl SelfReportEstimator {
    pub fn new(baseline: EstimatorBaseline) -> Self {
        Self { baseline }
    }

    pub fn estimate(&self, features: &FeatureVector) -> SelfReport {
        let b = &self.baseline;
        let z_speech = b.speech_rate.z_score(features.speech_rate);
        let z_rms = b.rms.z_score(features.rms);
        let z_zcr = b.zcr.z_score(features.zcr);
        let z_pause = b.pause_ratio.z_score(features.pause_ratio);

        // Faster, louder, rougher speech with fewer pauses reads as stress;
        // fatigue is the mirror image.
        let stress_raw = 0.4 * z_speech + 0.3 * z_rms + 0.2 * z_zcr - 0.1 * z_pause;
        let fatigue_raw = -0.4 * z_speech - 0.3 * z_rms - 0.2 * z_zcr + 0.1 * z_pause;

        SelfReport {
            stress: to_scale(stress_raw),
            fatigue: to_scale(fatigue_raw),
        }
    }
}
