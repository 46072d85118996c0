//! Voice CLI - Command-line interface for Synheart Voice
//!
//! Commands:
//! - score: Score one check-in against a given baseline (no persistence)
//! - extract: Aggregate analyzer frames into check-in features
//! - estimate: Infer a stress/fatigue self-report from features
//! - submit: Record a check-in in the database and score it
//! - history: Print the trend history from the database
//! - baseline: Print the current baseline from the database

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use synheart_voice::features::{ExtractorConfig, FeatureExtractor, Frame};
use synheart_voice::inference::SelfReportEstimator;
use synheart_voice::pipeline::CheckInProcessor;
use synheart_voice::store::DEFAULT_DB_FILE;
use synheart_voice::types::{Baseline, FeatureVector, SelfReport};
use synheart_voice::{RiskScorer, PRODUCER_NAME, VOICE_VERSION};
use tracing_subscriber::EnvFilter;

/// Voice - On-device scoring engine for voice check-in wellness signals
#[derive(Parser)]
#[command(name = "voice")]
#[command(author = "Synheart AI Inc")]
#[command(version = VOICE_VERSION)]
#[command(about = "Score voice check-ins for wellness risk patterns", long_about = None)]
struct Cli {
    /// Check-in database file
    #[arg(long, global = true, env = "VOICE_CHECKIN_DB", default_value = DEFAULT_DB_FILE)]
    db: PathBuf,

    /// Log level filter (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, default_value = "pretty")]
    log_format: LogFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one check-in against a given baseline (no persistence)
    Score {
        /// Features JSON, file path, or - for stdin
        #[arg(short, long)]
        features: String,

        /// Self-report JSON or file path (inferred from features when omitted)
        #[arg(short, long)]
        self_report: Option<String>,

        /// Baseline JSON or file path (defaults to the empty-database baseline)
        #[arg(short, long)]
        baseline: Option<String>,

        /// Include every category's score, not only flagged ones
        #[arg(long)]
        all: bool,
    },

    /// Aggregate analyzer frames into check-in features
    Extract {
        /// Frames JSON array, file path, or - for stdin
        #[arg(short, long)]
        input: String,

        /// Samples per analyzer frame
        #[arg(long, default_value = "512")]
        frame_size: u32,

        /// Capture sample rate in Hz
        #[arg(long, default_value = "44100")]
        sample_rate: u32,
    },

    /// Infer a stress/fatigue self-report from features
    Estimate {
        /// Features JSON, file path, or - for stdin
        #[arg(short, long)]
        features: String,
    },

    /// Record a check-in in the database and score it
    Submit {
        /// Features JSON, file path, or - for stdin
        #[arg(short, long)]
        features: String,

        /// Self-report JSON or file path (inferred from features when omitted)
        #[arg(short, long)]
        self_report: Option<String>,
    },

    /// Print the trend history from the database
    History,

    /// Print the current baseline from the database
    Baseline,
}

#[derive(Clone, ValueEnum)]
enum LogFormat {
    /// Human-readable log lines
    Pretty,
    /// One JSON object per log line
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level, &cli.log_format);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str, format: &LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);

    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn run(cli: Cli) -> Result<(), VoiceCliError> {
    let pretty = cli.pretty;

    match cli.command {
        Commands::Score {
            features,
            self_report,
            baseline,
            all,
        } => cmd_score(&features, self_report.as_deref(), baseline.as_deref(), all, pretty),

        Commands::Extract {
            input,
            frame_size,
            sample_rate,
        } => cmd_extract(&input, frame_size, sample_rate, pretty),

        Commands::Estimate { features } => {
            let features: FeatureVector = read_json_arg(&features)?;
            let report = SelfReportEstimator::default().estimate(&features);
            print_json(&report, pretty)
        }

        Commands::Submit {
            features,
            self_report,
        } => cmd_submit(&cli.db, &features, self_report.as_deref(), pretty),

        Commands::History => {
            let processor = CheckInProcessor::open(&cli.db);
            print_json(&processor.store().history(), pretty)
        }

        Commands::Baseline => {
            let processor = CheckInProcessor::open(&cli.db);
            print_json(&processor.baseline(), pretty)
        }
    }
}

fn cmd_score(
    features: &str,
    self_report: Option<&str>,
    baseline: Option<&str>,
    all: bool,
    pretty: bool,
) -> Result<(), VoiceCliError> {
    let features: FeatureVector = read_json_arg(features)?;
    let self_report = resolve_self_report(&features, self_report)?;
    let baseline: Baseline = match baseline {
        Some(arg) => read_json_arg(arg)?,
        None => Baseline::default(),
    };

    let scorer = RiskScorer;
    if all {
        synheart_voice::scoring::validate_inputs(&features, &self_report, &baseline)?;
        print_json(&scorer.assess(&features, &self_report, &baseline), pretty)
    } else {
        let flags = scorer.score_validated(&features, &self_report, &baseline)?;
        print_json(&flags, pretty)
    }
}

fn cmd_extract(
    input: &str,
    frame_size: u32,
    sample_rate: u32,
    pretty: bool,
) -> Result<(), VoiceCliError> {
    let frames: Vec<Frame> = read_json_arg(input)?;
    if frames.is_empty() {
        tracing::warn!("no frames in input, features will be zero");
    }

    let config = ExtractorConfig {
        frame_size,
        sample_rate,
        ..Default::default()
    };
    let extraction = FeatureExtractor::new(config)?.extract_with_duration(&frames);
    print_json(&extraction, pretty)
}

fn cmd_submit(
    db: &Path,
    features: &str,
    self_report: Option<&str>,
    pretty: bool,
) -> Result<(), VoiceCliError> {
    let features: FeatureVector = read_json_arg(features)?;
    let mut processor = CheckInProcessor::open(db);

    let outcome = match self_report {
        Some(arg) => processor.submit(features, read_json_arg(arg)?)?,
        None => processor.submit_inferred(features)?,
    };

    let report = SubmitReport {
        success: true,
        producer: PRODUCER_NAME,
        outcome,
    };
    print_json(&report, pretty)
}

fn resolve_self_report(
    features: &FeatureVector,
    arg: Option<&str>,
) -> Result<SelfReport, VoiceCliError> {
    match arg {
        Some(arg) => read_json_arg(arg),
        None => {
            let report = SelfReportEstimator::default().estimate(features);
            tracing::info!(
                stress = report.stress,
                fatigue = report.fatigue,
                "inferred self-report from features"
            );
            Ok(report)
        }
    }
}

/// Parse an argument that is inline JSON, a file path, or `-` for stdin
fn read_json_arg<T: serde::de::DeserializeOwned>(arg: &str) -> Result<T, VoiceCliError> {
    let trimmed = arg.trim_start();
    let data = if arg == "-" {
        if atty::is(atty::Stream::Stdin) {
            tracing::warn!("reading JSON from an interactive terminal, end input with Ctrl-D");
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else if trimmed.starts_with('{') || trimmed.starts_with('[') {
        arg.to_string()
    } else {
        fs::read_to_string(arg)?
    };

    Ok(serde_json::from_str(&data)?)
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<(), VoiceCliError> {
    let output = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", output);
    Ok(())
}

// Report types

#[derive(Serialize)]
struct SubmitReport {
    success: bool,
    producer: &'static str,
    #[serde(flatten)]
    outcome: synheart_voice::CheckInOutcome,
}

// Error types

#[derive(Debug)]
enum VoiceCliError {
    Io(io::Error),
    Compute(synheart_voice::ComputeError),
    Json(serde_json::Error),
}

impl From<io::Error> for VoiceCliError {
    fn from(e: io::Error) -> Self {
        VoiceCliError::Io(e)
    }
}

impl From<synheart_voice::ComputeError> for VoiceCliError {
    fn from(e: synheart_voice::ComputeError) -> Self {
        VoiceCliError::Compute(e)
    }
}

impl From<serde_json::Error> for VoiceCliError {
    fn from(e: serde_json::Error) -> Self {
        VoiceCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
    hint: Option<String>,
}

impl From<VoiceCliError> for CliError {
    fn from(e: VoiceCliError) -> Self {
        match e {
            VoiceCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                field: None,
                hint: Some("Check file paths and permissions".to_string()),
            },
            VoiceCliError::Compute(e) => {
                let field = e.field().map(str::to_string);
                let (code, hint) = match &e {
                    synheart_voice::ComputeError::InvalidInput { .. } => (
                        "INVALID_INPUT",
                        "Features, self-report and baseline must be finite and in range",
                    ),
                    synheart_voice::ComputeError::JsonError(_) => ("JSON_ERROR", "Check JSON syntax"),
                    synheart_voice::ComputeError::Io(_) => {
                        ("IO_ERROR", "Check the database path and permissions")
                    }
                    synheart_voice::ComputeError::InsufficientFrames(_) => {
                        ("EXTRACTION_ERROR", "Frame size and sample rate must be non-zero")
                    }
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    field,
                    hint: Some(hint.to_string()),
                }
            }
            VoiceCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                field: None,
                hint: Some("Check JSON syntax and field names (camelCase)".to_string()),
            },
        }
    }
}
