//! Signal conditioning
//!
//! Recovers the true sampling rate from timestamps, collapses 3-axis streams
//! to a scalar magnitude, and isolates the walking-frequency band with a
//! zero-phase Butterworth band-pass. All math is pure Rust; the filter is a
//! cascade of second-order sections applied forward and backward so step
//! timestamps are not biased by filter lag.
//!
//! Conditioning never fails: when the filter cannot be built or the signal is
//! too short, the unfiltered magnitude is returned with a typed reason so
//! callers can log the degradation.

use crate::types::AxisSeries;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Default sampling rate assumed when timestamps cannot be trusted (Hz).
pub const DEFAULT_SAMPLING_RATE_HZ: f64 = 50.0;

/// Walking-frequency passband (Hz).
pub const WALKING_BAND_LOW_HZ: f64 = 0.5;
pub const WALKING_BAND_HIGH_HZ: f64 = 3.0;

/// Minimum signal length for filtering; shorter signals pass through raw.
const MIN_FILTER_SAMPLES: usize = 10;

/// Number of leading timestamps used for rate estimation.
const RATE_ESTIMATE_SAMPLES: usize = 10;

/// Why a signal was returned unfiltered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradeReason {
    /// Fewer than the minimum samples needed for a stable filter.
    TooFewSamples,
    /// Sampling rate too low for the walking passband (cutoff at or past Nyquist).
    PassbandOutOfRange,
}

impl DegradeReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DegradeReason::TooFewSamples => "too_few_samples",
            DegradeReason::PassbandOutOfRange => "passband_out_of_range",
        }
    }
}

/// Result of band-pass conditioning.
///
/// `Unfiltered` is the documented degrade-not-fail path: step detection on a
/// noisy signal beats no result at all.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionedSignal {
    Filtered(Vec<f64>),
    Unfiltered(Vec<f64>, DegradeReason),
}

impl ConditionedSignal {
    pub fn samples(&self) -> &[f64] {
        match self {
            ConditionedSignal::Filtered(samples) => samples,
            ConditionedSignal::Unfiltered(samples, _) => samples,
        }
    }

    pub fn is_filtered(&self) -> bool {
        matches!(self, ConditionedSignal::Filtered(_))
    }

    pub fn degrade_reason(&self) -> Option<DegradeReason> {
        match self {
            ConditionedSignal::Filtered(_) => None,
            ConditionedSignal::Unfiltered(_, reason) => Some(*reason),
        }
    }
}

/// Per-sample Euclidean magnitude of a 3-axis stream.
pub fn magnitude(series: &AxisSeries) -> Vec<f64> {
    series
        .x
        .iter()
        .zip(&series.y)
        .zip(&series.z)
        .map(|((x, y), z)| (x * x + y * y + z * z).sqrt())
        .collect()
}

/// Estimate the sampling rate from the first few timestamps.
///
/// Returns `1000 / mean(delta_ms)`, or the 0.0 sentinel when fewer than
/// ten samples exist or the timestamps do not advance. Callers must
/// substitute [`DEFAULT_SAMPLING_RATE_HZ`] for the sentinel.
pub fn estimate_sampling_rate(time: &[f64]) -> f64 {
    if time.len() < RATE_ESTIMATE_SAMPLES {
        return 0.0;
    }

    let window = &time[..RATE_ESTIMATE_SAMPLES.min(time.len())];
    let deltas: Vec<f64> = window.windows(2).map(|pair| pair[1] - pair[0]).collect();
    let mean_delta = mean(&deltas);

    if mean_delta == 0.0 {
        return 0.0;
    }
    1000.0 / mean_delta
}

/// Apply the walking-band Butterworth band-pass with zero phase.
///
/// Realized as cascaded second-order high-pass and low-pass sections run
/// forward-backward (4th-order band-pass overall, no time lag).
pub fn bandpass(signal: &[f64], sampling_rate: f64) -> ConditionedSignal {
    if signal.len() < MIN_FILTER_SAMPLES {
        return ConditionedSignal::Unfiltered(signal.to_vec(), DegradeReason::TooFewSamples);
    }

    let nyquist = sampling_rate / 2.0;
    if nyquist <= 0.0 || WALKING_BAND_HIGH_HZ / nyquist >= 1.0 {
        return ConditionedSignal::Unfiltered(signal.to_vec(), DegradeReason::PassbandOutOfRange);
    }

    let high_pass = Biquad::high_pass(WALKING_BAND_LOW_HZ, sampling_rate);
    let low_pass = Biquad::low_pass(WALKING_BAND_HIGH_HZ, sampling_rate);

    let mut filtered = filtfilt(&high_pass, signal);
    filtered = filtfilt(&low_pass, &filtered);

    ConditionedSignal::Filtered(filtered)
}

/// Normalized second-order IIR section (a0 folded into the other coefficients).
struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl Biquad {
    /// Butterworth low-pass (Q = 1/sqrt(2)) at `cutoff_hz`.
    fn low_pass(cutoff_hz: f64, sampling_rate: f64) -> Self {
        let w0 = 2.0 * PI * cutoff_hz / sampling_rate;
        // alpha = sin(w0) / (2Q) with Butterworth Q = 1/sqrt(2)
        let alpha = w0.sin() * std::f64::consts::FRAC_1_SQRT_2;
        let cos_w0 = w0.cos();
        let a0 = 1.0 + alpha;

        Self {
            b0: (1.0 - cos_w0) / 2.0 / a0,
            b1: (1.0 - cos_w0) / a0,
            b2: (1.0 - cos_w0) / 2.0 / a0,
            a1: -2.0 * cos_w0 / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    /// Butterworth high-pass (Q = 1/sqrt(2)) at `cutoff_hz`.
    fn high_pass(cutoff_hz: f64, sampling_rate: f64) -> Self {
        let w0 = 2.0 * PI * cutoff_hz / sampling_rate;
        let alpha = w0.sin() * std::f64::consts::FRAC_1_SQRT_2;
        let cos_w0 = w0.cos();
        let a0 = 1.0 + alpha;

        Self {
            b0: (1.0 + cos_w0) / 2.0 / a0,
            b1: -(1.0 + cos_w0) / a0,
            b2: (1.0 + cos_w0) / 2.0 / a0,
            a1: -2.0 * cos_w0 / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    /// Run the section over `signal` (direct form II transposed).
    fn apply(&self, signal: &[f64]) -> Vec<f64> {
        let mut s1 = 0.0;
        let mut s2 = 0.0;
        signal
            .iter()
            .map(|&x| {
                let y = self.b0 * x + s1;
                s1 = self.b1 * x - self.a1 * y + s2;
                s2 = self.b2 * x - self.a2 * y;
                y
            })
            .collect()
    }
}

/// Zero-phase filtering: forward pass, then backward pass.
fn filtfilt(section: &Biquad, signal: &[f64]) -> Vec<f64> {
    let mut forward = section.apply(signal);
    forward.reverse();
    let mut backward = section.apply(&forward);
    backward.reverse();
    backward
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
