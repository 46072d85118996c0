//! Synheart Voice - On-device scoring engine for voice check-in wellness signals
//!
//! A check-in is ~20 seconds of speech reduced to coarse acoustic features,
//! paired with a stress/fatigue self-report. Voice scores each check-in
//! against the user's personal baseline through a deterministic pipeline:
//! frame aggregation → self-report inference → baseline tracking → risk scoring.
//!
//! ## Modules
//!
//! - **Scoring**: pure feature-to-risk scorer producing probabilistic flags
//! - **Store**: flat JSON check-in log with a running baseline

pub mod baseline;
pub mod error;
pub mod features;
pub mod inference;
pub mod pipeline;
pub mod scoring;
pub mod store;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use error::ComputeError;
pub use features::{ExtractorConfig, FeatureExtractor, Frame};
pub use inference::SelfReportEstimator;
pub use pipeline::{score_check_in_json, CheckInOutcome, CheckInProcessor};
pub use scoring::{score_check_in, RiskAssessment, RiskScorer, DISPLAY_THRESHOLD};
pub use store::CheckInStore;
pub use types::{Baseline, CheckInRecord, FeatureVector, RiskCategory, RiskFlag, SelfReport};

/// Voice version embedded in CLI and FFI output
pub const VOICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "synheart-voice";
