//! Risk scoring
//!
//! Maps a check-in's acoustic features, self-report, and personal baseline to
//! probabilistic risk flags. Each category computes a weighted sum of
//! threshold "excess" terms, squashes it through a logistic curve into a
//! 0-100 percent, and is flagged when the percent exceeds the display
//! threshold.
//!
//! Scoring is pure: no clock, no randomness, no state beyond the inputs.

use crate::error::ComputeError;
use crate::types::{Baseline, FeatureVector, RiskCategory, RiskFlag, SelfReport};
use serde::{Deserialize, Serialize};

/// A category is flagged when its percent is strictly greater than this
pub const DISPLAY_THRESHOLD: u8 = 40;

/// Logistic curve parameters for one category
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SigmoidCurve {
    /// How sharply probability rises around `shift`
    pub steepness: f64,
    /// Raw score that maps to exactly 50%
    pub shift: f64,
}

impl SigmoidCurve {
    pub const fn new(steepness: f64, shift: f64) -> Self {
        Self { steepness, shift }
    }

    pub fn probability(&self, raw: f64) -> f64 {
        sigmoid(raw, self.steepness, self.shift)
    }

    pub fn percent(&self, raw: f64) -> u8 {
        to_percent(raw, self.steepness, self.shift)
    }
}

// Calibration constants. Tuned by hand; keep as-is.
const LETHARGY_CURVE: SigmoidCurve = SigmoidCurve::new(1.2, 1.5);
const ANXIETY_CURVE: SigmoidCurve = SigmoidCurve::new(1.0, 2.0);
const RESPIRATORY_CURVE: SigmoidCurve = SigmoidCurve::new(1.2, 1.0);
const VOCAL_CURVE: SigmoidCurve = SigmoidCurve::new(2.0, 0.5);

/// Normalized deviation of `value` from `base`; a 10% deviation is a drift of 1.
///
/// Returns 0 when `base` is 0.
pub fn drift(value: f64, base: f64) -> f64 {
    if base == 0.0 {
        return 0.0;
    }
    (value - base) / (base * 0.1)
}

/// Logistic function: `1 / (1 + e^(-steepness * (x - shift)))`
pub fn sigmoid(x: f64, steepness: f64, shift: f64) -> f64 {
    1.0 / (1.0 + (-steepness * (x - shift)).exp())
}

/// Sigmoid probability as a rounded integer percent, capped at 100
pub fn to_percent(raw: f64, steepness: f64, shift: f64) -> u8 {
    (sigmoid(raw, steepness, shift) * 100.0).round().min(100.0) as u8
}

/// Linear growth past a trigger: `(value - trigger) * gain` when above, else 0
fn excess_above(value: f64, trigger: f64, gain: f64) -> f64 {
    if value > trigger {
        (value - trigger) * gain
    } else {
        0.0
    }
}

/// Linear growth below a trigger: `(trigger - value) * gain` when below, else 0
fn excess_below(value: f64, trigger: f64, gain: f64) -> f64 {
    if value < trigger {
        (trigger - value) * gain
    } else {
        0.0
    }
}

fn lethargy_raw(features: &FeatureVector, baseline: &Baseline) -> f64 {
    let energy = if features.rms < baseline.avg_energy {
        drift(features.rms, baseline.avg_energy).abs()
    } else {
        0.0
    };
    let speech = excess_below(features.speech_rate, 3.5, 3.0);
    energy * 0.5 + speech * 0.5
}

fn anxiety_raw(features: &FeatureVector, self_report: &SelfReport) -> f64 {
    let stress = excess_above(self_report.stress, 5.0, 0.8);
    let speech = excess_above(features.speech_rate, 4.5, 4.0);
    let jitter = excess_above(features.zcr, 0.1, 30.0);
    stress * 0.5 + speech * 0.3 + jitter * 0.2
}

fn respiratory_raw(features: &FeatureVector) -> f64 {
    let pause = excess_above(features.pause_ratio, 0.3, 15.0);
    let phrase = excess_below(features.speech_rate, 3.0, 1.5);
    pause * 0.7 + phrase * 0.3
}

fn vocal_raw(features: &FeatureVector) -> f64 {
    let rough = excess_above(features.zcr, 0.15, 15.0);
    let loud = excess_above(features.rms, 0.2, 5.0);
    rough * 0.8 + loud * 0.2
}

/// Score of a single category, flagged or not
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: RiskCategory,
    /// Weighted sum of trigger terms before the sigmoid
    pub raw: f64,
    /// Unrounded sigmoid output (0-1)
    pub probability: f64,
    /// Rounded percent (0-100)
    pub percent: u8,
}

impl CategoryScore {
    pub fn is_flagged(&self) -> bool {
        self.percent > DISPLAY_THRESHOLD
    }

    pub fn to_flag(&self) -> Option<RiskFlag> {
        self.is_flagged().then(|| RiskFlag::new(self.category, self.percent))
    }
}

/// Scores for every category, in emission order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub scores: Vec<CategoryScore>,
}

impl RiskAssessment {
    /// Flags for categories above the display threshold, in emission order
    pub fn flags(&self) -> Vec<RiskFlag> {
        self.scores.iter().filter_map(CategoryScore::to_flag).collect()
    }

    pub fn get(&self, category: RiskCategory) -> Option<&CategoryScore> {
        self.scores.iter().find(|s| s.category == category)
    }
}

/// Stateless feature-to-risk scorer
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskScorer;

impl RiskScorer {
    /// Compute every category's raw score and percent
    pub fn assess(
        &self,
        features: &FeatureVector,
        self_report: &SelfReport,
        baseline: &Baseline,
    ) -> RiskAssessment {
        let scores = RiskCategory::ALL
            .iter()
            .map(|&category| {
                let (raw, curve) = match category {
                    RiskCategory::LethargyPattern => {
                        (lethargy_raw(features, baseline), LETHARGY_CURVE)
                    }
                    RiskCategory::AnxietyPattern => {
                        (anxiety_raw(features, self_report), ANXIETY_CURVE)
                    }
                    RiskCategory::RespiratoryStrain => {
                        (respiratory_raw(features), RESPIRATORY_CURVE)
                    }
                    RiskCategory::VocalStrain => (vocal_raw(features), VOCAL_CURVE),
                };
                let score = CategoryScore {
                    category,
                    raw,
                    probability: curve.probability(raw),
                    percent: curve.percent(raw),
                };
                tracing::debug!(
                    category = %category,
                    raw = score.raw,
                    percent = score.percent,
                    "scored category"
                );
                score
            })
            .collect();

        RiskAssessment { scores }
    }

    /// Flags for one check-in; inputs are trusted
    pub fn score_check_in(
        &self,
        features: &FeatureVector,
        self_report: &SelfReport,
        baseline: &Baseline,
    ) -> Vec<RiskFlag> {
        self.assess(features, self_report, baseline).flags()
    }

    /// Validate all inputs, then score. Never returns a partial flag list.
    pub fn score_validated(
        &self,
        features: &FeatureVector,
        self_report: &SelfReport,
        baseline: &Baseline,
    ) -> Result<Vec<RiskFlag>, ComputeError> {
        validate_inputs(features, self_report, baseline)?;
        Ok(self.score_check_in(features, self_report, baseline))
    }
}

/// Score a check-in with the default scorer
pub fn score_check_in(
    features: &FeatureVector,
    self_report: &SelfReport,
    baseline: &Baseline,
) -> Vec<RiskFlag> {
    RiskScorer.score_check_in(features, self_report, baseline)
}

fn check_finite(field: &str, value: f64) -> Result<(), ComputeError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ComputeError::invalid(field, "must be a finite number"))
    }
}

fn check_non_negative(field: &str, value: f64) -> Result<(), ComputeError> {
    check_finite(field, value)?;
    if value < 0.0 {
        return Err(ComputeError::invalid(field, format!("must be >= 0, got {value}")));
    }
    Ok(())
}

fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<(), ComputeError> {
    check_finite(field, value)?;
    if value < min || value > max {
        return Err(ComputeError::invalid(
            field,
            format!("must be within [{min}, {max}], got {value}"),
        ));
    }
    Ok(())
}

/// Reject out-of-range or non-finite inputs, naming the first offending field
pub fn validate_inputs(
    features: &FeatureVector,
    self_report: &SelfReport,
    baseline: &Baseline,
) -> Result<(), ComputeError> {
    check_non_negative("features.rms", features.rms)?;
    check_non_negative("features.zcr", features.zcr)?;
    check_range("features.pauseRatio", features.pause_ratio, 0.0, 1.0)?;
    check_non_negative("features.speechRate", features.speech_rate)?;
    check_range("selfReport.stress", self_report.stress, 0.0, 10.0)?;
    check_range("selfReport.fatigue", self_report.fatigue, 0.0, 10.0)?;
    check_non_negative("baseline.avgEnergy", baseline.avg_energy)?;
    check_non_negative("baseline.avgStress", baseline.avg_stress)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn baseline(avg_energy: f64) -> Baseline {
        Baseline {
            avg_energy,
            avg_stress: 5.0,
            window_size: 12,
        }
    }

    fn report(stress: f64) -> SelfReport {
        SelfReport {
            stress,
            fatigue: 5.0,
        }
    }

    fn low_energy_features() -> FeatureVector {
        FeatureVector {
            rms: 0.1,
            zcr: 0.05,
            pause_ratio: 0.5,
            speech_rate: 2.0,
        }
    }

    fn neutral_features(rms: f64) -> FeatureVector {
        FeatureVector {
            rms,
            zcr: 0.1,
            pause_ratio: 0.2,
            speech_rate: 4.0,
        }
    }

    fn categories(flags: &[RiskFlag]) -> Vec<RiskCategory> {
        flags.iter().map(|f| f.category).collect()
    }

    #[test]
    fn test_drift_zero_base() {
        assert_eq!(drift(0.3, 0.0), 0.0);
        assert_eq!(drift(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_drift_ten_percent_is_one() {
        assert!((drift(0.55, 0.5) - 1.0).abs() < 1e-9);
        assert!((drift(0.1, 0.5) + 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_sigmoid_at_shift_is_half() {
        assert!((sigmoid(2.0, 1.0, 2.0) - 0.5).abs() < 1e-12);
        assert_eq!(to_percent(0.5, 2.0, 0.5), 50);
    }

    #[test]
    fn test_to_percent_caps_at_100() {
        assert_eq!(to_percent(1_000.0, 2.0, 0.5), 100);
        assert_eq!(to_percent(-1_000.0, 2.0, 0.5), 0);
    }

    #[test]
    fn test_low_energy_slow_speech_case() {
        let assessment =
            RiskScorer.assess(&low_energy_features(), &report(9.0), &baseline(0.5));

        // energy 8, speech 4.5 => raw 6.25
        let lethargy = assessment.get(RiskCategory::LethargyPattern).unwrap();
        assert!((lethargy.raw - 6.25).abs() < 1e-9);
        assert_eq!(lethargy.percent, 100);

        // stress term 3.2 weighted by 0.5 => raw 1.6 => 40.13%
        let anxiety = assessment.get(RiskCategory::AnxietyPattern).unwrap();
        assert!((anxiety.raw - 1.6).abs() < 1e-9);
        assert_eq!(anxiety.percent, 40);

        // pause 3.0, phrase 1.5 => raw 2.55
        let respiratory = assessment.get(RiskCategory::RespiratoryStrain).unwrap();
        assert!((respiratory.raw - 2.55).abs() < 1e-9);
        assert_eq!(respiratory.percent, 87);

        let vocal = assessment.get(RiskCategory::VocalStrain).unwrap();
        assert_eq!(vocal.raw, 0.0);
        assert_eq!(vocal.percent, 27);

        assert_eq!(
            categories(&assessment.flags()),
            vec![RiskCategory::LethargyPattern, RiskCategory::RespiratoryStrain]
        );
    }

    #[test]
    fn test_max_stress_flags_anxiety_too() {
        let flags = score_check_in(&low_energy_features(), &report(10.0), &baseline(0.5));
        assert_eq!(
            categories(&flags),
            vec![
                RiskCategory::LethargyPattern,
                RiskCategory::AnxietyPattern,
                RiskCategory::RespiratoryStrain,
            ]
        );
        assert_eq!(flags[1].score, 50);
        assert_eq!(flags[1].message, "Probability: 50%. High anxiety markers detected.");
    }

    #[test]
    fn test_features_at_baseline_produce_no_flags() {
        let assessment = RiskScorer.assess(&neutral_features(0.15), &report(5.0), &baseline(0.15));
        for score in &assessment.scores {
            assert_eq!(score.raw, 0.0, "{} should have zero raw score", score.category);
        }
        assert!(assessment.flags().is_empty());
    }

    #[test]
    fn test_anxiety_rises_with_stress_steps() {
        let percents: Vec<u8> = (5..=10)
            .map(|stress| {
                RiskScorer
                    .assess(&neutral_features(0.15), &report(stress as f64), &baseline(0.15))
                    .get(RiskCategory::AnxietyPattern)
                    .unwrap()
                    .percent
            })
            .collect();
        assert_eq!(percents, vec![12, 17, 23, 31, 40, 50]);
    }

    #[test]
    fn test_vocal_strain_flag() {
        let features = FeatureVector {
            rms: 0.4,
            zcr: 0.25,
            pause_ratio: 0.1,
            speech_rate: 4.0,
        };
        // rough 1.5, loud 1.0 => raw 1.4 => sigmoid(1.8)
        let flags = score_check_in(&features, &report(3.0), &baseline(0.4));
        let vocal = flags
            .iter()
            .find(|f| f.category == RiskCategory::VocalStrain)
            .unwrap();
        assert_eq!(vocal.score, 86);
        // zcr 0.25 also drives anxiety jitter: 4.5 * 0.2 = 0.9 => 25%, not flagged
        assert!(!categories(&flags).contains(&RiskCategory::AnxietyPattern));
    }

    #[test]
    fn test_zero_baseline_energy_does_not_drive_lethargy() {
        let assessment = RiskScorer.assess(&neutral_features(0.0), &report(5.0), &baseline(0.0));
        let lethargy = assessment.get(RiskCategory::LethargyPattern).unwrap();
        assert_eq!(lethargy.raw, 0.0);
        assert!(lethargy.probability.is_finite());
    }

    #[test]
    fn test_validated_rejects_pause_ratio_out_of_range() {
        let features = FeatureVector {
            pause_ratio: 1.5,
            ..low_energy_features()
        };
        let err = RiskScorer
            .score_validated(&features, &report(5.0), &baseline(0.5))
            .unwrap_err();
        assert_eq!(err.field(), Some("features.pauseRatio"));
    }

    #[test]
    fn test_validated_rejects_nan_stress() {
        let err = RiskScorer
            .score_validated(&low_energy_features(), &report(f64::NAN), &baseline(0.5))
            .unwrap_err();
        assert_eq!(err.field(), Some("selfReport.stress"));
    }

    #[test]
    fn test_validated_matches_unvalidated_on_good_input() {
        let features = low_energy_features();
        let validated = RiskScorer
            .score_validated(&features, &report(9.0), &baseline(0.5))
            .unwrap();
        assert_eq!(validated, score_check_in(&features, &report(9.0), &baseline(0.5)));
    }

    fn arb_features() -> impl Strategy<Value = FeatureVector> {
        (0.0..1.0f64, 0.0..0.5f64, 0.0..=1.0f64, 0.0..10.0f64).prop_map(
            |(rms, zcr, pause_ratio, speech_rate)| FeatureVector {
                rms,
                zcr,
                pause_ratio,
                speech_rate,
            },
        )
    }

    proptest! {
        #[test]
        fn prop_flags_match_threshold(
            features in arb_features(),
            stress in 0.0..=10.0f64,
            avg_energy in 0.0..1.0f64,
        ) {
            let assessment = RiskScorer.assess(&features, &report(stress), &baseline(avg_energy));
            let flags = assessment.flags();

            for score in &assessment.scores {
                prop_assert!(score.percent <= 100);
                let flagged = flags.iter().any(|f| f.category == score.category);
                prop_assert_eq!(flagged, score.percent > DISPLAY_THRESHOLD);
            }

            // emission order is a subsequence of the category order
            let positions: Vec<usize> = flags
                .iter()
                .map(|f| RiskCategory::ALL.iter().position(|c| *c == f.category).unwrap())
                .collect();
            prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
        }

        #[test]
        fn prop_scoring_is_deterministic(
            features in arb_features(),
            stress in 0.0..=10.0f64,
            avg_energy in 0.0..1.0f64,
        ) {
            let a = score_check_in(&features, &report(stress), &baseline(avg_energy));
            let b = score_check_in(&features, &report(stress), &baseline(avg_energy));
            prop_assert_eq!(
                serde_json::to_string(&a).unwrap(),
                serde_json::to_string(&b).unwrap()
            );
        }

        #[test]
        fn prop_anxiety_monotonic_in_stress(
            features in arb_features(),
            low in 5.0..9.9f64,
            delta in 0.01..1.0f64,
        ) {
            let high = (low + delta).min(10.0);
            prop_assume!(high > low);

            let at = |stress: f64| {
                *RiskScorer
                    .assess(&features, &report(stress), &baseline(0.5))
                    .get(RiskCategory::AnxietyPattern)
                    .unwrap()
            };
            let (a, b) = (at(low), at(high));
            prop_assert!(b.raw > a.raw);
            prop_assert!(b.probability >= a.probability);
            prop_assert!(b.percent >= a.percent);
        }
    }
}
