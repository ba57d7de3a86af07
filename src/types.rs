//! Core types for the gait analysis pipeline
//!
//! This module defines the data structures that flow through each stage:
//! raw sensor samples, derived gait metrics, phase segmentation, and the
//! problem records produced by baseline comparison.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One raw inertial reading from a single sensor.
///
/// `timestamp` is milliseconds since an arbitrary epoch shared by all samples
/// of one recording session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub timestamp: f64,
}

/// Column layout of one sensor stream, used by the numeric stages.
#[derive(Debug, Clone, Default)]
pub struct AxisSeries {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    pub time: Vec<f64>,
}

impl AxisSeries {
    pub fn from_samples(samples: &[SensorSample]) -> Self {
        Self {
            x: samples.iter().map(|s| s.x).collect(),
            y: samples.iter().map(|s| s.y).collect(),
            z: samples.iter().map(|s| s.z).collect(),
            time: samples.iter().map(|s| s.timestamp).collect(),
        }
    }

    /// Build a series from loosely-typed JSON elements.
    ///
    /// Missing or non-numeric axis values default to 0.0; a missing timestamp
    /// defaults to the element's positional index, which degrades rate and
    /// duration estimates but keeps the stream usable.
    pub fn from_values(values: &[Value]) -> Self {
        let field = |v: &Value, key: &str| v.get(key).and_then(Value::as_f64).unwrap_or(0.0);
        Self {
            x: values.iter().map(|v| field(v, "x")).collect(),
            y: values.iter().map(|v| field(v, "y")).collect(),
            z: values.iter().map(|v| field(v, "z")).collect(),
            time: values
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    v.get("timestamp")
                        .and_then(Value::as_f64)
                        .unwrap_or(i as f64)
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Categorical grade of input sufficiency.
///
/// Gates how much weight consumers should give the numeric outputs; never
/// blocks computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataQuality {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl DataQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataQuality::Poor => "poor",
            DataQuality::Fair => "fair",
            DataQuality::Good => "good",
            DataQuality::Excellent => "excellent",
        }
    }
}

/// Gait cycle phase label, alternating strictly by step parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseKind {
    Stance,
    Swing,
}

/// One phase segment between two consecutive detected steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GaitPhase {
    pub step_number: u32,
    pub start_index: usize,
    pub end_index: usize,
    /// Segment length in samples.
    pub duration: usize,
    pub phase: PhaseKind,
}

/// Derived gait parameters for one analysis call.
///
/// All values are rounded to 2 decimal places at the boundary; scores are
/// clamped to [0, 1] and substitute documented neutral defaults when their
/// minimum-data preconditions are unmet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaitMetrics {
    pub step_count: u32,
    /// Steps per minute.
    pub cadence: f64,
    /// Heuristic estimate in meters, clamped to [0, 2.0].
    pub stride_length: f64,
    /// Walking speed in m/s.
    pub velocity: f64,
    /// Alternating-interval similarity, 0-1.
    pub gait_symmetry: f64,
    /// Inverse angular-rate variability, 0-1.
    pub stability_score: f64,
    /// Inverse coefficient of variation of step timing, 0-1.
    pub step_regularity: f64,
    /// Vertical bounce in meters.
    pub vertical_oscillation: f64,
}

/// Immutable result of one analysis call, owned by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub session_id: String,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub metrics: GaitMetrics,
    pub gait_phases: Vec<GaitPhase>,
    /// Recording duration in seconds.
    pub analysis_duration: f64,
    pub data_quality: DataQuality,
}

/// Instantaneous feedback for a single sensor reading pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeReading {
    pub accelerometer_magnitude: f64,
    pub gyroscope_magnitude: f64,
    pub step_detected: bool,
    pub timestamp: DateTime<Utc>,
}

/// Population-normative statistics for one gait metric.
///
/// Immutable after load; sourced from prepared reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub p5: f64,
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
    /// Reference population size.
    pub n: u32,
    pub unit: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Severity of a detected gait problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Severe,
    Moderate,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Severe => "severe",
            Severity::Moderate => "moderate",
        }
    }

    /// Sort rank for prioritization (lower sorts first).
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Severe => 0,
            Severity::Moderate => 1,
        }
    }
}

/// Closed set of detectable gait problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemKind {
    SlowCadence,
    AsymmetricGait,
    ShortStride,
    SlowVelocity,
    PoorStability,
    IrregularSteps,
}

impl ProblemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemKind::SlowCadence => "slow_cadence",
            ProblemKind::AsymmetricGait => "asymmetric_gait",
            ProblemKind::ShortStride => "short_stride",
            ProblemKind::SlowVelocity => "slow_velocity",
            ProblemKind::PoorStability => "poor_stability",
            ProblemKind::IrregularSteps => "irregular_steps",
        }
    }
}

/// Clinical category of a problem, used for prioritization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProblemCategory {
    #[serde(rename = "Speed & Rhythm")]
    SpeedRhythm,
    #[serde(rename = "Balance & Symmetry")]
    BalanceSymmetry,
    #[serde(rename = "Gait Pattern")]
    GaitPattern,
}

impl ProblemCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemCategory::SpeedRhythm => "Speed & Rhythm",
            ProblemCategory::BalanceSymmetry => "Balance & Symmetry",
            ProblemCategory::GaitPattern => "Gait Pattern",
        }
    }

    /// Sort rank for prioritization (lower sorts first).
    pub fn rank(&self) -> u8 {
        match self {
            ProblemCategory::SpeedRhythm => 0,
            ProblemCategory::BalanceSymmetry => 1,
            ProblemCategory::GaitPattern => 2,
        }
    }
}

/// One detected gait abnormality with its narrative content.
///
/// Created fresh per detection call and never mutated; prioritization
/// reorders the list but does not alter records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemRecord {
    pub problem: ProblemKind,
    pub severity: Severity,
    pub category: ProblemCategory,
    pub current_value: f64,
    pub normal_range: String,
    /// Percentile rank within the normative population, [1, 99].
    /// Absent for metrics classified by fixed cut points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentile: Option<u8>,
    pub description: String,
    pub impact: String,
    pub clinical_significance: String,
    pub recommendations: Vec<String>,
}

/// Overall status tier mirrored from the risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Normal,
    NeedsImprovement,
    NeedsAttention,
    NeedsImmediateAttention,
}

/// Risk tier derived from severity counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    LowModerate,
    Moderate,
    High,
}

/// Aggregate over a prioritized problem list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemSummary {
    pub overall_status: OverallStatus,
    pub risk_level: RiskLevel,
    pub total_problems: usize,
    pub severe_count: usize,
    pub moderate_count: usize,
    pub summary: String,
    pub primary_concerns: Vec<String>,
}

/// Metrics accepted by the problem detector.
///
/// A subset is fine: absent fields are simply skipped, never an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsInput {
    #[serde(default)]
    pub cadence: Option<f64>,
    #[serde(default)]
    pub stride_length: Option<f64>,
    #[serde(default)]
    pub velocity: Option<f64>,
    #[serde(default)]
    pub gait_symmetry: Option<f64>,
    #[serde(default)]
    pub stability_score: Option<f64>,
    #[serde(default)]
    pub step_regularity: Option<f64>,
}

impl From<&GaitMetrics> for MetricsInput {
    fn from(metrics: &GaitMetrics) -> Self {
        Self {
            cadence: Some(metrics.cadence),
            stride_length: Some(metrics.stride_length),
            velocity: Some(metrics.velocity),
            gait_symmetry: Some(metrics.gait_symmetry),
            stability_score: Some(metrics.stability_score),
            step_regularity: Some(metrics.step_regularity),
        }
    }
}
