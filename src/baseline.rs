//! Population-normative baseline store
//!
//! Loads per-metric reference statistics (mean, std, percentile table) from a
//! prepared JSON file, once, at startup. Two file shapes are accepted: a flat
//! `{metric: stats}` map, or a `{source, baselines: {...}}` envelope; both
//! normalize to the flat form with provenance recorded. A missing file means
//! problem detection is unavailable, not that the engine is broken.

use crate::error::AnalysisError;
use crate::types::Baseline;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Provenance recorded when the file carries no source field.
const DEFAULT_SOURCE: &str = "reference dataset";

/// Read-only map of metric name to normative statistics.
///
/// Immutable after load; safe to share across threads without locking.
#[derive(Debug, Clone)]
pub struct BaselineStore {
    baselines: HashMap<String, Baseline>,
    source: String,
}

impl BaselineStore {
    /// Load baselines from a JSON file.
    ///
    /// A missing file surfaces as [`AnalysisError::BaselineUnavailable`] so
    /// callers can report "service not ready" while raw metric computation
    /// stays usable.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AnalysisError::BaselineUnavailable(
                path.display().to_string(),
            ));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse baselines from a JSON string (flat or enveloped form).
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let value: Value = serde_json::from_str(json)?;

        let (source, map) = match value {
            Value::Object(mut fields)
                if fields.get("baselines").map(Value::is_object) == Some(true) =>
            {
                let source = fields
                    .get("source")
                    .and_then(Value::as_str)
                    .unwrap_or(DEFAULT_SOURCE)
                    .to_string();
                let baselines = fields.remove("baselines").unwrap_or(Value::Null);
                (source, baselines)
            }
            other => (DEFAULT_SOURCE.to_string(), other),
        };

        let baselines: HashMap<String, Baseline> = serde_json::from_value(map)?;
        Ok(Self { baselines, source })
    }

    pub fn get(&self, metric: &str) -> Option<&Baseline> {
        self.baselines.get(metric)
    }

    /// Where the reference statistics came from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Metric names with loaded baselines, sorted for stable reporting.
    pub fn metric_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.baselines.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.baselines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.baselines.is_empty()
    }
}

/// Percentile rank of `value` within a baseline's population.
///
/// Z-score through the standard-normal CDF, scaled to [1, 99]. A degenerate
/// standard deviation pins the rank at the median.
pub fn percentile_of(value: f64, baseline: &Baseline) -> u8 {
    let z = if baseline.std > 0.0 {
        (value - baseline.mean) / baseline.std
    } else {
        0.0
    };
    let percentile = (normal_cdf(z) * 100.0) as i32;
    percentile.clamp(1, 99) as u8
}

/// Standard-normal cumulative distribution function.
fn normal_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}

/// Abramowitz & Stegun 7.1.26 rational approximation (max error ~1.5e-7).
fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let t = 1.0 / (1.0 + 0.3275911 * x);
    let poly = t
        * (0.254829592
            + t * (-0.284496736 + t * (1.421413741 + t * (-1.453152027 + t * 1.061405429))));
    sign * (1.0 - poly * (-x * x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CADENCE_STATS: &str = r#"{
        "mean": 105.0, "std": 10.0, "min": 70.0, "max": 140.0,
        "p5": 88.0, "p10": 92.0, "p25": 98.0, "p50": 105.0,
        "p75": 112.0, "p90": 118.0, "p95": 122.0,
        "n": 1000, "unit": "steps/min"
    }"#;

    fn flat_json() -> String {
        format!(r#"{{"cadence": {CADENCE_STATS}}}"#)
    }

    fn enveloped_json() -> String {
        format!(
            r#"{{"source": "Published Research Meta-Analysis",
                 "baselines": {{"cadence": {CADENCE_STATS}}}}}"#
        )
    }

    #[test]
    fn test_load_flat_form() {
        let store = BaselineStore::from_json(&flat_json()).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.source(), DEFAULT_SOURCE);
        assert_eq!(store.get("cadence").unwrap().mean, 105.0);
    }

    #[test]
    fn test_load_enveloped_form() {
        let store = BaselineStore::from_json(&enveloped_json()).unwrap();
        assert_eq!(store.source(), "Published Research Meta-Analysis");
        assert_eq!(store.get("cadence").unwrap().p5, 88.0);
        assert!(store.get("source").is_none());
    }

    #[test]
    fn test_missing_file_is_unavailable_not_crash() {
        let err = BaselineStore::load("/nonexistent/gait_baselines.json").unwrap_err();
        assert!(matches!(err, AnalysisError::BaselineUnavailable(_)));
    }

    #[test]
    fn test_metric_names_sorted() {
        let json = format!(
            r#"{{"velocity_estimate": {CADENCE_STATS}, "cadence": {CADENCE_STATS}}}"#
        );
        let store = BaselineStore::from_json(&json).unwrap();
        assert_eq!(store.metric_names(), vec!["cadence", "velocity_estimate"]);
    }

    fn cadence_baseline() -> Baseline {
        let store = BaselineStore::from_json(&flat_json()).unwrap();
        store.get("cadence").unwrap().clone()
    }

    #[test]
    fn test_percentile_at_mean_is_fifty() {
        let baseline = cadence_baseline();
        assert_eq!(percentile_of(105.0, &baseline), 50);
    }

    #[test]
    fn test_percentile_monotonic_in_value() {
        let baseline = cadence_baseline();
        let mut last = 0;
        for value in (60..150).map(f64::from) {
            let p = percentile_of(value, &baseline);
            assert!(p >= last, "percentile decreased at value {value}");
            last = p;
        }
    }

    #[test]
    fn test_percentile_clamped_to_valid_range() {
        let baseline = cadence_baseline();
        assert_eq!(percentile_of(0.0, &baseline), 1);
        assert_eq!(percentile_of(500.0, &baseline), 99);
    }

    #[test]
    fn test_percentile_degenerate_std() {
        let mut baseline = cadence_baseline();
        baseline.std = 0.0;
        assert_eq!(percentile_of(42.0, &baseline), 50);
    }

    #[test]
    fn test_erf_known_values() {
        assert!(erf(0.0).abs() < 1e-12);
        assert!((erf(1.0) - 0.8427).abs() < 1e-3);
        assert!((erf(-1.0) + 0.8427).abs() < 1e-3);
    }
}
