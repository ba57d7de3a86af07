//! Step detection
//!
//! Finds heel-strike-equivalent events as local maxima in the conditioned
//! acceleration magnitude. Peaks must clear a minimum prominence and keep a
//! minimum spacing; when nothing clears the bar the detection retries once
//! with a relaxed prominence before giving up.

/// Minimum spacing between peaks in samples (~0.2 s at 50 Hz).
///
/// A fixed sample count, deliberately not re-derived from the estimated
/// sampling rate.
const MIN_PEAK_DISTANCE: usize = 10;

/// Minimum peak prominence in signal units.
const MIN_PROMINENCE: f64 = 0.1;

/// Relaxed prominence used for the single retry.
const RELAXED_PROMINENCE: f64 = 0.05;

/// Detect step events in a conditioned magnitude signal.
///
/// Returns the ordered sample indices of inferred steps; empty for signals
/// shorter than two samples or when no peaks clear even the relaxed
/// prominence.
pub fn detect_steps(signal: &[f64]) -> Vec<usize> {
    if signal.len() < 2 {
        return Vec::new();
    }

    let peaks = find_peaks(signal, MIN_PEAK_DISTANCE, MIN_PROMINENCE);
    if !peaks.is_empty() {
        return peaks;
    }

    // One retry with a lower bar: weak signals still carry step timing
    find_peaks(signal, MIN_PEAK_DISTANCE, RELAXED_PROMINENCE)
}

/// Local maxima filtered by prominence, then thinned by minimum distance.
///
/// Distance enforcement gives priority to taller peaks, matching the usual
/// peak-finding convention.
fn find_peaks(signal: &[f64], distance: usize, min_prominence: f64) -> Vec<usize> {
    let mut candidates: Vec<usize> = Vec::new();
    for i in 1..signal.len().saturating_sub(1) {
        if signal[i] > signal[i - 1] && signal[i] > signal[i + 1] {
            candidates.push(i);
        }
    }

    candidates.retain(|&i| prominence(signal, i) >= min_prominence);

    // Sort by height (tallest first) and greedily suppress close neighbors
    let mut by_height = candidates.clone();
    by_height.sort_by(|&a, &b| {
        signal[b]
            .partial_cmp(&signal[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = vec![true; signal.len()];
    let mut selected = Vec::new();
    for &peak in &by_height {
        if !keep[peak] {
            continue;
        }
        selected.push(peak);
        // Suppress only separations strictly below the distance; a peak
        // exactly `distance` samples away survives
        let lo = peak.saturating_sub(distance - 1);
        let hi = (peak + distance - 1).min(signal.len() - 1);
        for flag in &mut keep[lo..=hi] {
            *flag = false;
        }
    }

    selected.sort_unstable();
    selected
}

/// Topographic prominence of the peak at `index`.
///
/// Walk outward on each side until a higher sample or the signal edge; the
/// prominence is the drop from the peak to the higher of the two valley
/// minima found along the way.
fn prominence(signal: &[f64], index: usize) -> f64 {
    let height = signal[index];

    let mut left_min = height;
    for &value in signal[..index].iter().rev() {
        if value > height {
            break;
        }
        if value < left_min {
            left_min = value;
        }
    }

    let mut right_min = height;
    for &value in &signal[index + 1..] {
        if value > height {
            break;
        }
        if value < right_min {
            right_min = value;
        }
    }

    height - left_min.max(right_min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(freq_hz: f64, rate_hz: f64, duration_s: f64, amplitude: f64) -> Vec<f64> {
        let n = (rate_hz * duration_s) as usize;
        (0..n)
            .map(|i| amplitude * (2.0 * PI * freq_hz * i as f64 / rate_hz).sin())
            .collect()
    }

    #[test]
    fn test_empty_and_tiny_signals() {
        assert!(detect_steps(&[]).is_empty());
        assert!(detect_steps(&[1.0]).is_empty());
    }

    #[test]
    fn test_flat_signal_has_no_steps() {
        assert!(detect_steps(&vec![0.0; 200]).is_empty());
        assert!(detect_steps(&vec![9.81; 200]).is_empty());
    }

    #[test]
    fn test_sinusoid_step_count_matches_frequency() {
        // 2 Hz gait sampled at 50 Hz for 10 s: expect round(2 * 10) = 20 peaks
        let signal = sine(2.0, 50.0, 10.0, 1.0);
        let steps = detect_steps(&signal);
        let expected = (2.0_f64 * 10.0).round() as isize;
        let got = steps.len() as isize;
        assert!(
            (got - expected).abs() <= 1,
            "expected ~{expected} steps, got {got}"
        );
    }

    #[test]
    fn test_steps_are_ordered() {
        let signal = sine(1.5, 50.0, 8.0, 2.0);
        let steps = detect_steps(&signal);
        assert!(steps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_minimum_distance_enforced() {
        let signal = sine(2.0, 50.0, 10.0, 1.0);
        let steps = detect_steps(&signal);
        assert!(steps.windows(2).all(|w| w[1] - w[0] >= MIN_PEAK_DISTANCE));
    }

    #[test]
    fn test_peaks_at_exact_minimum_distance_both_kept() {
        let mut signal = vec![0.0; 25];
        signal[5] = 1.0;
        signal[15] = 0.8;
        assert_eq!(
            find_peaks(&signal, MIN_PEAK_DISTANCE, MIN_PROMINENCE),
            vec![5, 15]
        );
    }

    #[test]
    fn test_peaks_below_minimum_distance_keep_tallest() {
        let mut signal = vec![0.0; 25];
        signal[5] = 0.8;
        signal[14] = 1.0;
        assert_eq!(
            find_peaks(&signal, MIN_PEAK_DISTANCE, MIN_PROMINENCE),
            vec![14]
        );
    }

    #[test]
    fn test_relaxed_retry_finds_weak_peaks() {
        // Amplitude 0.035 gives prominence ~0.07: below 0.1, above 0.05
        let signal = sine(2.0, 50.0, 5.0, 0.035);
        assert!(find_peaks(&signal, MIN_PEAK_DISTANCE, MIN_PROMINENCE).is_empty());
        let steps = detect_steps(&signal);
        assert!(!steps.is_empty(), "relaxed retry should recover weak steps");
    }

    #[test]
    fn test_sub_threshold_peaks_rejected() {
        let signal = sine(2.0, 50.0, 5.0, 0.01);
        assert!(detect_steps(&signal).is_empty());
    }

    #[test]
    fn test_prominence_of_isolated_peak() {
        let mut signal = vec![0.0; 21];
        signal[10] = 2.0;
        assert!((prominence(&signal, 10) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_prominence_of_shoulder_peak() {
        // Small bump on the flank of a taller peak
        let signal = vec![0.0, 5.0, 3.0, 3.5, 3.0, 0.0];
        // Valley floor toward the taller side is 3.0
        assert!((prominence(&signal, 3) - 0.5).abs() < 1e-12);
    }
}
