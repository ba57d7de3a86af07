//! Gait Engine - Inertial-sensor gait analysis and abnormality screening
//!
//! Transforms raw accelerometer/gyroscope streams into clinical gait metrics
//! through a deterministic pipeline: payload validation → signal conditioning
//! → step detection → metric derivation → baseline comparison.
//!
//! ## Modules
//!
//! - **Analysis Pipeline**: Process sensor streams into gait metric reports
//! - **Problem Detection**: Screen metrics against population-normative baselines

pub mod baseline;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod problems;
pub mod signal;
pub mod steps;
pub mod types;
pub mod validator;

pub use baseline::BaselineStore;
pub use error::AnalysisError;
pub use pipeline::GaitProcessor;
pub use problems::ProblemDetector;

// Report exports
pub use types::{
    AnalysisReport, GaitMetrics, MetricsInput, ProblemRecord, ProblemSummary, SensorSample,
};

/// Engine version embedded in reports and CLI output
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports and CLI output
pub const PRODUCER_NAME: &str = "gait-engine";
