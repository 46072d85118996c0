//! Pipeline orchestration
//!
//! This module provides the public API for Synheart Voice.
//! It ties feature extraction, self-report inference, baseline tracking and
//! risk scoring together for a single check-in.

use crate::error::ComputeError;
use crate::features::{FeatureExtractor, Frame};
use crate::inference::SelfReportEstimator;
use crate::scoring::RiskScorer;
use crate::store::CheckInStore;
use crate::types::{Baseline, CheckInRecord, FeatureVector, RiskFlag, SelfReport};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Score a check-in from JSON inputs and return the flags as a JSON array.
///
/// # Arguments
/// * `features_json` - `{"rms", "zcr", "pauseRatio", "speechRate"}`
/// * `self_report_json` - `{"stress", "fatigue"}`
/// * `baseline_json` - `{"avgEnergy", "avgStress", "windowSize"}`
///
/// Inputs are validated; an out-of-range field fails the whole call.
///
/// # Example
/// ```ignore
/// let flags = score_check_in_json(
///     r#"{"rms":0.1,"zcr":0.05,"pauseRatio":0.5,"speechRate":2.0}"#,
///     r#"{"stress":9,"fatigue":6}"#,
///     r#"{"avgEnergy":0.5,"avgStress":5,"windowSize":4}"#,
/// )?;
/// ```
pub fn score_check_in_json(
    features_json: &str,
    self_report_json: &str,
    baseline_json: &str,
) -> Result<String, ComputeError> {
    let features: FeatureVector = serde_json::from_str(features_json)?;
    let self_report: SelfReport = serde_json::from_str(self_report_json)?;
    let baseline: Baseline = serde_json::from_str(baseline_json)?;

    let flags = RiskScorer.score_validated(&features, &self_report, &baseline)?;
    Ok(serde_json::to_string(&flags)?)
}

/// Result of submitting one check-in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckInOutcome {
    /// The persisted record, flags included
    pub processed: CheckInRecord,
    pub flags: Vec<RiskFlag>,
    /// Baseline after this check-in was folded in
    pub baseline: Baseline,
}

/// Stateful processor holding the check-in log and baseline.
///
/// Use this when check-ins should accumulate into a personal baseline.
pub struct CheckInProcessor {
    store: CheckInStore,
    scorer: RiskScorer,
    extractor: FeatureExtractor,
    estimator: SelfReportEstimator,
}

impl Default for CheckInProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckInProcessor {
    /// Create a processor with an in-memory store
    pub fn new() -> Self {
        Self::with_store(CheckInStore::in_memory())
    }

    /// Create a processor backed by the database file at `path`
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self::with_store(CheckInStore::open(path))
    }

    pub fn with_store(store: CheckInStore) -> Self {
        Self {
            store,
            scorer: RiskScorer,
            extractor: FeatureExtractor::default(),
            estimator: SelfReportEstimator::default(),
        }
    }

    pub fn with_extractor(mut self, extractor: FeatureExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_estimator(mut self, estimator: SelfReportEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn store(&self) -> &CheckInStore {
        &self.store
    }

    pub fn baseline(&self) -> Baseline {
        self.store.baseline()
    }

    /// Persist a check-in and score it.
    ///
    /// The check-in is folded into the baseline first, so scoring sees a
    /// baseline that includes the current recording.
    pub fn submit(
        &mut self,
        features: FeatureVector,
        self_report: SelfReport,
    ) -> Result<CheckInOutcome, ComputeError> {
        crate::scoring::validate_inputs(&features, &self_report, &self.store.baseline())?;

        let baseline = self
            .store
            .database()
            .baseline_with(features.rms, self_report.stress);
        let flags = self
            .scorer
            .score_check_in(&features, &self_report, &baseline);

        let record = CheckInRecord {
            flags: flags.clone(),
            ..CheckInRecord::new(features, self_report)
        };
        self.store.add_check_in(record.clone())?;

        Ok(CheckInOutcome {
            processed: record,
            flags,
            baseline,
        })
    }

    /// Submit with a self-report inferred from the features
    pub fn submit_inferred(
        &mut self,
        features: FeatureVector,
    ) -> Result<CheckInOutcome, ComputeError> {
        let self_report = self.estimator.estimate(&features);
        self.submit(features, self_report)
    }

    /// Extract features from analyzer frames and submit them
    pub fn submit_frames(
        &mut self,
        frames: &[Frame],
        self_report: Option<SelfReport>,
    ) -> Result<CheckInOutcome, ComputeError> {
        let features = self.extractor.extract(frames);
        match self_report {
            Some(report) => self.submit(features, report),
            None => self.submit_inferred(features),
        }
    }

    /// Score against the current baseline without recording anything
    pub fn preview(&self, features: &FeatureVector, self_report: &SelfReport) -> Vec<RiskFlag> {
        self.scorer
            .score_check_in(features, self_report, &self.store.baseline())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RiskCategory;
    use pretty_assertions::assert_eq;

    fn low_energy_features() -> FeatureVector {
        FeatureVector {
            rms: 0.1,
            zcr: 0.05,
            pause_ratio: 0.5,
            speech_rate: 2.0,
        }
    }

    #[test]
    fn test_score_check_in_json() {
        let result = score_check_in_json(
            r#"{"rms":0.1,"zcr":0.05,"pauseRatio":0.5,"speechRate":2.0}"#,
            r#"{"stress":10,"fatigue":6}"#,
            r#"{"avgEnergy":0.5,"avgStress":5,"windowSize":4}"#,
        )
        .unwrap();

        let flags: serde_json::Value = serde_json::from_str(&result).unwrap();
        let types: Vec<&str> = flags
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["type"].as_str().unwrap())
            .collect();
        assert_eq!(
            types,
            vec!["LETHARGY_PATTERN", "ANXIETY_PATTERN", "RESPIRATORY_STRAIN"]
        );
    }

    #[test]
    fn test_score_check_in_json_invalid_json() {
        let result = score_check_in_json("not valid json", "{}", "{}");
        assert!(matches!(result, Err(ComputeError::JsonError(_))));
    }

    #[test]
    fn test_score_check_in_json_rejects_out_of_range() {
        let result = score_check_in_json(
            r#"{"rms":-0.1,"zcr":0.05,"pauseRatio":0.5,"speechRate":2.0}"#,
            r#"{"stress":5,"fatigue":5}"#,
            r#"{"avgEnergy":0.5,"avgStress":5,"windowSize":0}"#,
        );
        let err = result.unwrap_err();
        assert_eq!(err.field(), Some("features.rms"));
    }

    #[test]
    fn test_submit_scores_against_updated_baseline() {
        let mut processor = CheckInProcessor::new();
        let report = SelfReport {
            stress: 9.0,
            fatigue: 6.0,
        };

        // First check-in replaces the default baseline, so energy drift is 0
        let outcome = processor.submit(low_energy_features(), report).unwrap();
        assert_eq!(outcome.baseline.window_size, 1);
        assert!((outcome.baseline.avg_energy - 0.1).abs() < 1e-12);
        assert_eq!(outcome.processed.flags, outcome.flags);
        assert_eq!(processor.store().check_ins()[0].flags, outcome.flags);

        let categories: Vec<RiskCategory> = outcome.flags.iter().map(|f| f.category).collect();
        // speech term alone: raw 2.25 => 71%
        assert_eq!(
            categories,
            vec![RiskCategory::LethargyPattern, RiskCategory::RespiratoryStrain]
        );
        assert_eq!(outcome.flags[0].score, 71);
    }

    #[test]
    fn test_preview_does_not_record() {
        let processor = CheckInProcessor::new();
        let report = SelfReport {
            stress: 9.0,
            fatigue: 6.0,
        };
        let flags = processor.preview(&low_energy_features(), &report);

        assert!(processor.store().check_ins().is_empty());
        assert_eq!(flags[0].category, RiskCategory::LethargyPattern);
        assert_eq!(flags[0].score, 100);
    }

    #[test]
    fn test_submit_rejects_invalid_without_recording() {
        let mut processor = CheckInProcessor::new();
        let report = SelfReport {
            stress: 11.0,
            fatigue: 6.0,
        };
        let err = processor.submit(low_energy_features(), report).unwrap_err();
        assert_eq!(err.field(), Some("selfReport.stress"));
        assert!(processor.store().check_ins().is_empty());
    }

    #[test]
    fn test_submit_inferred() {
        let mut processor = CheckInProcessor::new();
        let features = FeatureVector {
            rms: 0.2,
            zcr: 0.1,
            pause_ratio: 0.2,
            speech_rate: 4.0,
        };
        let outcome = processor.submit_inferred(features).unwrap();
        assert_eq!(outcome.processed.self_report.stress, 5.0);
        assert!(outcome.flags.is_empty());
    }

    #[test]
    fn test_submit_frames() {
        let frames: Vec<Frame> = (0..100)
            .map(|i| Frame {
                rms: if i % 10 < 7 { 0.2 } else { 0.0 },
                zcr: 0.1,
            })
            .collect();
        let mut processor = CheckInProcessor::new();
        let outcome = processor
            .submit_frames(&frames, Some(SelfReport::default()))
            .unwrap();

        let features = outcome.processed.features;
        assert!((features.pause_ratio - 0.3).abs() < 1e-12);
        assert!((features.rms - 0.14).abs() < 1e-12);
        assert_eq!(processor.store().check_ins().len(), 1);
    }

    #[test]
    fn test_failed_submit_records_nothing() {
        let path = std::env::temp_dir()
            .join(format!("voice-missing-{}", uuid::Uuid::new_v4()))
            .join("db.json");
        let mut processor = CheckInProcessor::open(&path);
        let report = SelfReport {
            stress: 6.0,
            fatigue: 4.0,
        };

        assert!(processor.submit(low_energy_features(), report).is_err());
        assert!(processor.store().check_ins().is_empty());
        assert_eq!(processor.baseline(), Baseline::default());

        assert!(processor.submit(low_energy_features(), report).is_err());
        assert!(processor.store().check_ins().is_empty());
        assert_eq!(processor.baseline().window_size, 0);
    }

    #[test]
    fn test_submit_persists_flags_with_record() {
        let path =
            std::env::temp_dir().join(format!("voice-pipeline-{}.json", uuid::Uuid::new_v4()));
        let mut processor = CheckInProcessor::open(&path);
        let report = SelfReport {
            stress: 9.0,
            fatigue: 6.0,
        };
        let outcome = processor.submit(low_energy_features(), report).unwrap();

        let reopened = CheckInStore::open(&path);
        assert_eq!(reopened.check_ins().len(), 1);
        assert_eq!(reopened.check_ins()[0].flags, outcome.flags);

        std::fs::remove_file(&path).ok();
    }
}
