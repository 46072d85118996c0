//! Feature extraction
//!
//! This module reduces per-frame analyzer output (RMS energy and zero-crossing
//! rate for each audio buffer) to the coarse features used for scoring:
//! - Mean energy and zero-crossing rate
//! - Pause ratio (share of frames below a silence threshold)
//! - Speech rate (energy bursts per second)

use crate::error::ComputeError;
use crate::types::FeatureVector;
use serde::{Deserialize, Serialize};

/// Analyzer output for one audio buffer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub rms: f64,
    pub zcr: f64,
}

/// Extraction settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Samples per analysis buffer
    pub frame_size: u32,
    /// Capture sample rate (Hz)
    pub sample_rate: u32,
    /// Floor for the silence threshold
    pub min_silence_threshold: f64,
    /// Silence threshold as a fraction of the loudest frame
    pub silence_fraction: f64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            frame_size: 512,
            sample_rate: 44_100,
            min_silence_threshold: 0.02,
            silence_fraction: 0.1,
        }
    }
}

/// Extracted features plus the recording length they cover
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub features: FeatureVector,
    /// Recording duration in seconds
    pub duration: f64,
}

/// Aggregates analyzer frames into a [`FeatureVector`]
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    config: ExtractorConfig,
}

impl FeatureExtractor {
    pub fn new(config: ExtractorConfig) -> Result<Self, ComputeError> {
        if config.frame_size == 0 || config.sample_rate == 0 {
            return Err(ComputeError::InsufficientFrames(
                "frame_size and sample_rate must be non-zero".to_string(),
            ));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Aggregate frames into features
    pub fn extract(&self, frames: &[Frame]) -> FeatureVector {
        self.extract_with_duration(frames).features
    }

    /// Aggregate frames into features and report the covered duration.
    ///
    /// An empty recording yields all-zero features.
    pub fn extract_with_duration(&self, frames: &[Frame]) -> Extraction {
        if frames.is_empty() {
            return Extraction {
                features: FeatureVector::default(),
                duration: 0.0,
            };
        }

        let count = frames.len() as f64;
        let rms = frames.iter().map(|f| f.rms).sum::<f64>() / count;
        let zcr = frames.iter().map(|f| f.zcr).sum::<f64>() / count;

        let threshold = self.silence_threshold(frames);
        let silent = frames.iter().filter(|f| f.rms < threshold).count();
        let pause_ratio = silent as f64 / count;

        let bursts = count_bursts(frames, threshold);
        let duration = count * self.config.frame_size as f64 / self.config.sample_rate as f64;
        let speech_rate = if duration > 0.0 {
            bursts as f64 / duration
        } else {
            0.0
        };

        tracing::debug!(
            frames = frames.len(),
            threshold,
            bursts,
            duration,
            "extracted voice features"
        );

        Extraction {
            features: FeatureVector {
                rms,
                zcr,
                pause_ratio,
                speech_rate,
            },
            duration,
        }
    }

    fn silence_threshold(&self, frames: &[Frame]) -> f64 {
        let max_energy = frames.iter().map(|f| f.rms).fold(f64::NEG_INFINITY, f64::max);
        self.config
            .min_silence_threshold
            .max(max_energy * self.config.silence_fraction)
    }
}

/// Count rising edges through the threshold.
///
/// A frame exactly at the threshold neither starts nor ends a burst.
fn count_bursts(frames: &[Frame], threshold: f64) -> usize {
    let mut bursts = 0;
    let mut in_burst = false;
    for frame in frames {
        if !in_burst && frame.rms > threshold {
            bursts += 1;
            in_burst = true;
        } else if in_burst && frame.rms < threshold {
            in_burst = false;
        }
    }
    bursts
}
