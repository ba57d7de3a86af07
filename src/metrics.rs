//! Derived gait metrics
//!
//! Computes cadence, stride length, velocity, symmetry, stability, step
//! regularity, vertical oscillation, and phase segmentation from detected
//! steps. Every sub-metric is independently defensive: when its minimum-data
//! precondition is unmet it returns a documented neutral default instead of
//! failing, so one thin stream degrades quality without aborting the
//! analysis.

use crate::signal::{magnitude, mean, std_dev};
use crate::types::{AxisSeries, DataQuality, GaitMetrics, GaitPhase, PhaseKind};

/// Sample-count thresholds for data-quality grading.
const QUALITY_MIN_SAMPLES: usize = 50;
const QUALITY_FAIR_SAMPLES: usize = 100;
const QUALITY_GOOD_SAMPLES: usize = 200;

/// Neutral score reported when a metric lacks evidence.
const NEUTRAL_SCORE: f64 = 0.5;

/// Compute the full metrics record from raw streams and detected steps.
///
/// The vertical axis (`y`) feeds stride-length and oscillation estimates; the
/// conditioned magnitude used for step timing never enters distance
/// estimation.
pub fn compute_metrics(accel: &AxisSeries, gyro: &AxisSeries, steps: &[usize]) -> GaitMetrics {
    let duration = duration_seconds(&accel.time);
    let cadence = cadence(steps.len(), duration);
    let stride_length = estimate_stride_length(&accel.y, steps);
    let velocity = velocity(stride_length, cadence);

    GaitMetrics {
        step_count: steps.len() as u32,
        cadence,
        stride_length,
        velocity,
        gait_symmetry: analyze_symmetry(steps),
        stability_score: stability(gyro),
        step_regularity: step_regularity(steps),
        vertical_oscillation: vertical_oscillation(&accel.y),
    }
}

/// Recording duration in seconds; 0 for fewer than two samples.
pub fn duration_seconds(time: &[f64]) -> f64 {
    if time.len() < 2 {
        return 0.0;
    }
    (time[time.len() - 1] - time[0]) / 1000.0
}

/// Steps per minute; 0 when the duration is not positive.
pub fn cadence(step_count: usize, duration_s: f64) -> f64 {
    if duration_s <= 0.0 {
        return 0.0;
    }
    step_count as f64 / duration_s * 60.0
}

/// Heuristic stride length in meters, clamped to [0, 2.0].
///
/// `0.5 + 0.3 * std(vertical)`, an approximation from vertical-axis
/// variation rather than a double-integration displacement estimate. 0 with
/// fewer than two steps.
pub fn estimate_stride_length(vertical: &[f64], steps: &[usize]) -> f64 {
    if steps.len() < 2 || vertical.is_empty() {
        return 0.0;
    }
    (0.5 + std_dev(vertical) * 0.3).clamp(0.0, 2.0)
}

/// Walking velocity in m/s.
pub fn velocity(stride_length: f64, cadence: f64) -> f64 {
    stride_length * cadence / 60.0
}

/// Left/right balance proxy from alternating inter-step intervals.
///
/// The interval sequence splits by even/odd index as a laterality proxy (no
/// foot-contact signal exists). Returns the neutral 0.5 with fewer than four
/// steps rather than claiming confidence.
pub fn analyze_symmetry(steps: &[usize]) -> f64 {
    if steps.len() < 4 {
        return NEUTRAL_SCORE;
    }

    let intervals: Vec<f64> = steps.windows(2).map(|w| (w[1] - w[0]) as f64).collect();
    if intervals.len() < 2 {
        return NEUTRAL_SCORE;
    }

    let even: Vec<f64> = intervals.iter().step_by(2).copied().collect();
    let odd: Vec<f64> = intervals.iter().skip(1).step_by(2).copied().collect();

    let paired = even.len().min(odd.len());
    if paired == 0 {
        return NEUTRAL_SCORE;
    }

    let gap = (mean(&even[..paired]) - mean(&odd[..paired])).abs();
    (1.0 - (gap / 10.0).min(1.0)).clamp(0.0, 1.0)
}

/// Postural steadiness from gyroscope magnitude variability.
///
/// `1 - min(std/5, 1)`; neutral 0.5 when the gyroscope stream is empty.
pub fn stability(gyro: &AxisSeries) -> f64 {
    if gyro.is_empty() {
        return NEUTRAL_SCORE;
    }
    let variability = std_dev(&magnitude(gyro));
    (1.0 - (variability / 5.0).min(1.0)).clamp(0.0, 1.0)
}

/// Inverse coefficient of variation of inter-step intervals.
///
/// Neutral 0.5 with fewer than three steps.
pub fn step_regularity(steps: &[usize]) -> f64 {
    if steps.len() < 3 {
        return NEUTRAL_SCORE;
    }
    let intervals: Vec<f64> = steps.windows(2).map(|w| (w[1] - w[0]) as f64).collect();
    let interval_mean = mean(&intervals);
    if interval_mean == 0.0 {
        return NEUTRAL_SCORE;
    }
    (1.0 - (std_dev(&intervals) / interval_mean).min(1.0)).clamp(0.0, 1.0)
}

/// Vertical bounce in meters: `std(vertical) * 0.05`, 0 for an empty axis.
pub fn vertical_oscillation(vertical: &[f64]) -> f64 {
    if vertical.is_empty() {
        return 0.0;
    }
    std_dev(vertical) * 0.05
}

/// Phase segments between consecutive steps, alternating by step parity.
///
/// A simplification: true stance/swing separation needs foot-contact events,
/// not just step timing.
pub fn gait_phases(steps: &[usize]) -> Vec<GaitPhase> {
    steps
        .windows(2)
        .enumerate()
        .map(|(i, pair)| GaitPhase {
            step_number: (i + 1) as u32,
            start_index: pair[0],
            end_index: pair[1],
            duration: pair[1] - pair[0],
            phase: if i % 2 == 0 {
                PhaseKind::Stance
            } else {
                PhaseKind::Swing
            },
        })
        .collect()
}

/// Grade input sufficiency from the raw sample counts of both streams.
pub fn assess_data_quality(accel_samples: usize, gyro_samples: usize) -> DataQuality {
    let limiting = accel_samples.min(gyro_samples);
    if limiting < QUALITY_MIN_SAMPLES {
        DataQuality::Poor
    } else if limiting < QUALITY_FAIR_SAMPLES {
        DataQuality::Fair
    } else if limiting < QUALITY_GOOD_SAMPLES {
        DataQuality::Good
    } else {
        DataQuality::Excellent
    }
}
