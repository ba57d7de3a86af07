//! Analysis pipeline
//!
//! [`GaitProcessor`] owns the stage order: columnize the raw streams,
//! estimate the sampling rate, condition the acceleration magnitude, detect
//! steps, derive metrics, and grade data quality. It also keeps a bounded
//! in-memory history of recent reports for per-user retrieval.

use crate::error::AnalysisError;
use crate::metrics::{assess_data_quality, compute_metrics, duration_seconds, gait_phases};
use crate::signal::{bandpass, estimate_sampling_rate, magnitude, DEFAULT_SAMPLING_RATE_HZ};
use crate::steps::detect_steps;
use crate::types::{AnalysisReport, AxisSeries, GaitMetrics, RealtimeReading, SensorSample};
use crate::validator::validate_payload;
use chrono::Utc;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

/// Most recent reports retained across all users.
const HISTORY_CAP: usize = 100;

/// Acceleration magnitude above which a single realtime reading counts as a
/// step candidate (normalized units).
const STEP_MAGNITUDE_THRESHOLD: f64 = 1.2;

/// Stateful analysis engine.
///
/// Cheap to construct; the only state is the bounded report history, guarded
/// by a mutex so one processor can serve concurrent callers.
#[derive(Debug, Default)]
pub struct GaitProcessor {
    history: Mutex<VecDeque<AnalysisReport>>,
}

impl GaitProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the full pipeline on typed sensor streams.
    ///
    /// Never fails: thin or empty streams degrade to zeroed metrics and a
    /// `poor` quality grade. Defaults: a fresh UUID session and the
    /// `anonymous` user.
    pub fn analyze(
        &self,
        accel: &[SensorSample],
        gyro: &[SensorSample],
        user_id: Option<&str>,
        session_id: Option<&str>,
    ) -> AnalysisReport {
        self.analyze_series(
            AxisSeries::from_samples(accel),
            AxisSeries::from_samples(gyro),
            user_id,
            session_id,
        )
    }

    /// Run the full pipeline on a loosely-typed JSON payload.
    ///
    /// The payload is validated first; a rejected payload surfaces every
    /// problem found, not just the first.
    pub fn analyze_value(&self, payload: &Value) -> Result<AnalysisReport, AnalysisError> {
        let report = validate_payload(payload);
        if !report.valid {
            return Err(AnalysisError::ValidationFailed {
                errors: report.errors,
            });
        }

        let stream = |key: &str| -> AxisSeries {
            payload
                .get(key)
                .and_then(Value::as_array)
                .map(|values| AxisSeries::from_values(values))
                .unwrap_or_default()
        };
        let user_id = payload.get("user_id").and_then(Value::as_str);
        let session_id = payload.get("session_id").and_then(Value::as_str);

        Ok(self.analyze_series(
            stream("accelerometer"),
            stream("gyroscope"),
            user_id,
            session_id,
        ))
    }

    fn analyze_series(
        &self,
        accel: AxisSeries,
        gyro: AxisSeries,
        user_id: Option<&str>,
        session_id: Option<&str>,
    ) -> AnalysisReport {
        let mut rate = estimate_sampling_rate(&accel.time);
        if rate == 0.0 {
            rate = DEFAULT_SAMPLING_RATE_HZ;
        }

        let conditioned = bandpass(&magnitude(&accel), rate);
        let steps = detect_steps(conditioned.samples());

        let metrics = round_metrics(compute_metrics(&accel, &gyro, &steps));
        let report = AnalysisReport {
            session_id: session_id
                .map(str::to_string)
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            user_id: user_id.unwrap_or("anonymous").to_string(),
            timestamp: Utc::now(),
            gait_phases: gait_phases(&steps),
            analysis_duration: round_to(duration_seconds(&accel.time), 2),
            data_quality: assess_data_quality(accel.len(), gyro.len()),
            metrics,
        };

        let mut history = self.lock_history();
        history.push_back(report.clone());
        while history.len() > HISTORY_CAP {
            history.pop_front();
        }

        report
    }

    /// Instantaneous feedback for one accelerometer/gyroscope reading pair.
    pub fn process_realtime(&self, accel: &SensorSample, gyro: &SensorSample) -> RealtimeReading {
        let accel_magnitude = sample_magnitude(accel);
        RealtimeReading {
            accelerometer_magnitude: round_to(accel_magnitude, 3),
            gyroscope_magnitude: round_to(sample_magnitude(gyro), 3),
            step_detected: accel_magnitude > STEP_MAGNITUDE_THRESHOLD,
            timestamp: Utc::now(),
        }
    }

    /// Most recent reports for one user, newest first.
    pub fn user_history(&self, user_id: &str, limit: usize) -> Vec<AnalysisReport> {
        let history = self.lock_history();
        history
            .iter()
            .rev()
            .filter(|report| report.user_id == user_id)
            .take(limit)
            .cloned()
            .collect()
    }

    fn lock_history(&self) -> std::sync::MutexGuard<'_, VecDeque<AnalysisReport>> {
        // A poisoned lock only means a panic mid-push; the deque is still valid
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn sample_magnitude(sample: &SensorSample) -> f64 {
    (sample.x * sample.x + sample.y * sample.y + sample.z * sample.z).sqrt()
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Round every reported metric to 2 decimal places at the boundary.
fn round_metrics(mut metrics: GaitMetrics) -> GaitMetrics {
    metrics.cadence = round_to(metrics.cadence, 2);
    metrics.stride_length = round_to(metrics.stride_length, 2);
    metrics.velocity = round_to(metrics.velocity, 2);
    metrics.gait_symmetry = round_to(metrics.gait_symmetry, 2);
    metrics.stability_score = round_to(metrics.stability_score, 2);
    metrics.step_regularity = round_to(metrics.step_regularity, 2);
    metrics.vertical_oscillation = round_to(metrics.vertical_oscillation, 2);
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataQuality;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::f64::consts::PI;

    /// Synthetic walk at 50 Hz: 2 Hz bounce superimposed on gravity so the
    /// magnitude oscillates at the step frequency.
    fn walking_samples(n: usize) -> (Vec<SensorSample>, Vec<SensorSample>) {
        let accel = (0..n)
            .map(|i| {
                let t = i as f64 / 50.0;
                SensorSample {
                    x: 0.1 * (2.0 * PI * 2.0 * t).cos(),
                    y: 0.3 * (2.0 * PI * 2.0 * t).sin(),
                    z: 9.81 + 1.5 * (2.0 * PI * 2.0 * t).sin(),
                    timestamp: i as f64 * 20.0,
                }
            })
            .collect();
        let gyro = (0..n)
            .map(|i| SensorSample {
                x: 0.05,
                y: 0.02,
                z: 0.01,
                timestamp: i as f64 * 20.0,
            })
            .collect();
        (accel, gyro)
    }

    #[test]
    fn test_empty_streams_degrade_to_zero_report() {
        let processor = GaitProcessor::new();
        let report = processor.analyze(&[], &[], None, None);

        assert_eq!(report.metrics.step_count, 0);
        assert_eq!(report.metrics.cadence, 0.0);
        assert_eq!(report.analysis_duration, 0.0);
        assert_eq!(report.data_quality, DataQuality::Poor);
        assert_eq!(report.user_id, "anonymous");
        assert!(!report.session_id.is_empty());
    }

    #[test]
    fn test_synthetic_walk_end_to_end() {
        let processor = GaitProcessor::new();
        let (accel, gyro) = walking_samples(500);
        let report = processor.analyze(&accel, &gyro, Some("walker"), Some("session-1"));

        // 2 Hz bounce over ~10 s: about 20 steps, cadence near 120
        let steps = report.metrics.step_count;
        assert!((18..=22).contains(&steps), "got {steps} steps");
        assert!(report.metrics.cadence > 100.0);
        assert!(report.metrics.stride_length > 0.0);
        assert!(report.metrics.velocity > 0.0);
        assert_eq!(report.data_quality, DataQuality::Excellent);
        assert_eq!(report.gait_phases.len(), steps as usize - 1);
        assert_eq!(report.user_id, "walker");
        assert_eq!(report.session_id, "session-1");
        // (500 - 1) * 20 ms
        assert_eq!(report.analysis_duration, 9.98);
    }

    #[test]
    fn test_analyze_value_accepts_validated_payload() {
        let processor = GaitProcessor::new();
        let samples: Vec<_> = (0..100)
            .map(|i| {
                let t = i as f64 / 50.0;
                json!({
                    "x": 0.0,
                    "y": 0.2 * (2.0 * PI * 2.0 * t).sin(),
                    "z": 9.81 + 1.5 * (2.0 * PI * 2.0 * t).sin(),
                    "timestamp": i as f64 * 20.0
                })
            })
            .collect();
        let payload = json!({
            "accelerometer": samples,
            "user_id": "json-user"
        });

        let report = processor.analyze_value(&payload).unwrap();
        assert_eq!(report.user_id, "json-user");
        assert!(report.metrics.step_count > 0);
        // Gyroscope absent: stability falls back to the neutral score
        assert_eq!(report.metrics.stability_score, 0.5);
    }

    #[test]
    fn test_analyze_value_rejects_bad_payload() {
        let processor = GaitProcessor::new();
        let err = processor.analyze_value(&Value::Null).unwrap_err();
        assert!(matches!(err, AnalysisError::ValidationFailed { .. }));
    }

    #[test]
    fn test_history_is_bounded() {
        let processor = GaitProcessor::new();
        let (accel, gyro) = walking_samples(50);
        for _ in 0..105 {
            processor.analyze(&accel, &gyro, Some("repeat"), None);
        }
        // Cap applies across all users
        assert_eq!(processor.user_history("repeat", 200).len(), 100);
    }

    #[test]
    fn test_user_history_filters_and_limits() {
        let processor = GaitProcessor::new();
        let (accel, gyro) = walking_samples(50);
        processor.analyze(&accel, &gyro, Some("alice"), Some("a1"));
        processor.analyze(&accel, &gyro, Some("bob"), Some("b1"));
        processor.analyze(&accel, &gyro, Some("alice"), Some("a2"));

        let all = processor.user_history("alice", 10);
        assert_eq!(all.len(), 2);
        // Newest first
        assert_eq!(all[0].session_id, "a2");

        let limited = processor.user_history("alice", 1);
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].session_id, "a2");

        assert!(processor.user_history("carol", 10).is_empty());
    }

    #[test]
    fn test_shipped_baselines_feed_problem_detection() {
        use crate::baseline::BaselineStore;
        use crate::problems::ProblemDetector;
        use crate::types::{MetricsInput, ProblemKind};

        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/gait_baselines.json");
        let store = BaselineStore::load(path).unwrap();
        assert_eq!(store.source(), "Published Research Meta-Analysis");
        for metric in [
            "cadence",
            "gait_symmetry",
            "stride_length_estimate",
            "velocity_estimate",
        ] {
            assert!(store.get(metric).is_some(), "missing baseline: {metric}");
        }

        let processor = GaitProcessor::new();
        let (accel, gyro) = walking_samples(500);
        let report = processor.analyze(&accel, &gyro, Some("walker"), None);

        let detector = ProblemDetector::new(store);
        let problems =
            ProblemDetector::prioritize(detector.detect(&MetricsInput::from(&report.metrics)));
        let summary = ProblemDetector::summarize(&problems);

        // The heuristic stride (~0.56 m) sits below the normative p5 of 1.05
        assert!(problems
            .iter()
            .any(|p| p.problem == ProblemKind::ShortStride));
        assert_eq!(summary.total_problems, problems.len());
        assert!(problems.iter().all(|p| !p.description.is_empty()));
    }

    #[test]
    fn test_realtime_reading_thresholds_and_rounding() {
        let processor = GaitProcessor::new();

        let quiet = SensorSample { x: 0.3, y: 0.4, z: 0.0, timestamp: 0.0 };
        let reading = processor.process_realtime(&quiet, &quiet);
        assert_eq!(reading.accelerometer_magnitude, 0.5);
        assert!(!reading.step_detected);

        let active = SensorSample { x: 1.0, y: 1.0, z: 1.0, timestamp: 0.0 };
        let reading = processor.process_realtime(&active, &quiet);
        // sqrt(3) rounded to 3 decimals
        assert_eq!(reading.accelerometer_magnitude, 1.732);
        assert!(reading.step_detected);
    }
}
