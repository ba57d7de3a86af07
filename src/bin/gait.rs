//! Gait CLI - Command-line interface for the gait analysis engine
//!
//! Commands:
//! - analyze: Run the full analysis pipeline on a sensor payload
//! - detect: Screen computed metrics against normative baselines
//! - doctor: Diagnose engine health and baseline configuration

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use gait_engine::baseline::BaselineStore;
use gait_engine::pipeline::GaitProcessor;
use gait_engine::problems::ProblemDetector;
use gait_engine::types::MetricsInput;
use gait_engine::{AnalysisError, ENGINE_VERSION, PRODUCER_NAME};

/// Default baselines file looked up when --baselines is not given.
const DEFAULT_BASELINES_PATH: &str = "data/gait_baselines.json";

/// Gait Engine - Analyze inertial sensor data for gait abnormalities
#[derive(Parser)]
#[command(name = "gait")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Transform sensor streams into clinical gait metrics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis pipeline on a sensor payload
    Analyze {
        /// Input payload file (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Override the payload's user id
        #[arg(long)]
        user_id: Option<String>,

        /// Override the payload's session id
        #[arg(long)]
        session_id: Option<String>,

        /// Also screen the computed metrics for problems
        #[arg(long)]
        detect: bool,

        /// Baselines file for problem detection
        #[arg(long)]
        baselines: Option<PathBuf>,
    },

    /// Screen a metrics record against normative baselines
    Detect {
        /// Metrics JSON file (use - for stdin)
        #[arg(short, long)]
        metrics: PathBuf,

        /// Baselines file
        #[arg(long)]
        baselines: Option<PathBuf>,
    },

    /// Diagnose engine health and baseline configuration
    Doctor {
        /// Baselines file to check
        #[arg(long)]
        baselines: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

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

fn run(cli: Cli) -> Result<(), GaitCliError> {
    match cli.command {
        Commands::Analyze {
            input,
            output,
            user_id,
            session_id,
            detect,
            baselines,
        } => cmd_analyze(
            &input,
            &output,
            user_id.as_deref(),
            session_id.as_deref(),
            detect,
            baselines.as_deref(),
        ),

        Commands::Detect { metrics, baselines } => cmd_detect(&metrics, baselines.as_deref()),

        Commands::Doctor { baselines, json } => cmd_doctor(baselines.as_deref(), json),
    }
}

fn cmd_analyze(
    input: &Path,
    output: &Path,
    user_id: Option<&str>,
    session_id: Option<&str>,
    detect: bool,
    baselines: Option<&Path>,
) -> Result<(), GaitCliError> {
    let mut payload: serde_json::Value = serde_json::from_str(&read_input(input)?)?;

    if let Some(fields) = payload.as_object_mut() {
        if let Some(user_id) = user_id {
            fields.insert("user_id".to_string(), serde_json::json!(user_id));
        }
        if let Some(session_id) = session_id {
            fields.insert("session_id".to_string(), serde_json::json!(session_id));
        }
    }

    let processor = GaitProcessor::new();
    let report = processor.analyze_value(&payload)?;

    let value = if detect {
        let store = load_baselines(baselines)?;
        let detector = ProblemDetector::new(store);
        let problems =
            ProblemDetector::prioritize(detector.detect(&MetricsInput::from(&report.metrics)));
        let summary = ProblemDetector::summarize(&problems);

        serde_json::json!({
            "report": report,
            "problems": problems,
            "problem_summary": summary,
        })
    } else {
        serde_json::to_value(&report)?
    };

    write_output(output, &value)
}

fn cmd_detect(metrics: &Path, baselines: Option<&Path>) -> Result<(), GaitCliError> {
    let metrics: MetricsInput = serde_json::from_str(&read_input(metrics)?)?;

    let store = load_baselines(baselines)?;
    let detector = ProblemDetector::new(store);
    let problems = ProblemDetector::prioritize(detector.detect(&metrics));
    let summary = ProblemDetector::summarize(&problems);

    let value = serde_json::json!({
        "problems": problems,
        "problem_summary": summary,
    });
    print_value(&value)
}

fn cmd_doctor(baselines: Option<&Path>, json: bool) -> Result<(), GaitCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Engine version {}", ENGINE_VERSION),
    });

    let baselines_path = baselines
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_BASELINES_PATH));

    match BaselineStore::load(&baselines_path) {
        Ok(store) => {
            checks.push(DoctorCheck {
                name: "baselines".to_string(),
                status: CheckStatus::Ok,
                message: format!(
                    "{} metrics loaded from {} (source: {})",
                    store.len(),
                    baselines_path.display(),
                    store.source()
                ),
            });
        }
        Err(AnalysisError::BaselineUnavailable(path)) => {
            checks.push(DoctorCheck {
                name: "baselines".to_string(),
                status: CheckStatus::Warning,
                message: format!("Baselines file does not exist: {path}"),
            });
        }
        Err(e) => {
            checks.push(DoctorCheck {
                name: "baselines".to_string(),
                status: CheckStatus::Error,
                message: format!("Invalid baselines file: {e}"),
            });
        }
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (streaming mode ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Gait Engine Doctor Report");
        println!("=========================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(GaitCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn read_input(input: &Path) -> Result<String, GaitCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn load_baselines(baselines: Option<&Path>) -> Result<BaselineStore, GaitCliError> {
    let path = baselines
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_BASELINES_PATH));
    Ok(BaselineStore::load(path)?)
}

fn print_value(value: &serde_json::Value) -> Result<(), GaitCliError> {
    if atty::is(atty::Stream::Stdout) {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", serde_json::to_string(value)?);
    }
    Ok(())
}

fn write_output(output: &Path, value: &serde_json::Value) -> Result<(), GaitCliError> {
    if output.to_string_lossy() == "-" {
        print_value(value)
    } else {
        fs::write(output, serde_json::to_string_pretty(value)?)?;
        Ok(())
    }
}

// Error types

#[derive(Debug)]
enum GaitCliError {
    Io(io::Error),
    Json(serde_json::Error),
    Analysis(AnalysisError),
    DoctorFailed,
}

impl From<io::Error> for GaitCliError {
    fn from(e: io::Error) -> Self {
        GaitCliError::Io(e)
    }
}

impl From<serde_json::Error> for GaitCliError {
    fn from(e: serde_json::Error) -> Self {
        GaitCliError::Json(e)
    }
}

impl From<AnalysisError> for GaitCliError {
    fn from(e: AnalysisError) -> Self {
        GaitCliError::Analysis(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<GaitCliError> for CliError {
    fn from(e: GaitCliError) -> Self {
        match e {
            GaitCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            GaitCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            GaitCliError::Analysis(AnalysisError::ValidationFailed { errors }) => CliError {
                code: "VALIDATION_ERROR".to_string(),
                message: errors.join("; "),
                hint: Some("Ensure accelerometer/gyroscope arrays carry numeric x, y, z".to_string()),
            },
            GaitCliError::Analysis(AnalysisError::BaselineUnavailable(path)) => CliError {
                code: "BASELINES_UNAVAILABLE".to_string(),
                message: format!("Baseline reference data unavailable: {path}"),
                hint: Some("Pass --baselines or place data/gait_baselines.json".to_string()),
            },
            GaitCliError::Analysis(e) => CliError {
                code: "ANALYSIS_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            GaitCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
