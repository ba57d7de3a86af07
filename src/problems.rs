//! Gait problem detection
//!
//! Compares a metrics record against population-normative baselines, assigns
//! severity from percentile bands, and produces prioritized human-readable
//! findings plus a clinical summary. Narrative content lives in a lookup
//! table keyed by `(problem, severity)` so the clinical text stays
//! data-driven and testable independent of the classification logic.

use crate::baseline::{percentile_of, BaselineStore};
use crate::types::{
    Baseline, MetricsInput, OverallStatus, ProblemCategory, ProblemKind, ProblemRecord,
    ProblemSummary, RiskLevel, Severity,
};

/// Fixed cut points for metrics without a reference-dataset baseline.
///
/// Stability and regularity have no normative distribution; their thresholds
/// are empirical. This asymmetry in evidence quality is deliberate.
const STABILITY_SEVERE_BELOW: f64 = 0.5;
const STABILITY_MODERATE_BELOW: f64 = 0.65;
const REGULARITY_SEVERE_BELOW: f64 = 0.5;
const REGULARITY_MODERATE_BELOW: f64 = 0.7;

/// Detects gait abnormalities against loaded baselines.
pub struct ProblemDetector {
    store: BaselineStore,
}

impl ProblemDetector {
    pub fn new(store: BaselineStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &BaselineStore {
        &self.store
    }

    /// Detect problems for every metric with both a value and a mapping rule.
    ///
    /// Absent metrics and metrics without a loaded baseline are skipped
    /// silently; detection direction is fixed per metric (all of these are
    /// higher-is-better, so only underperformance is flagged).
    pub fn detect(&self, metrics: &MetricsInput) -> Vec<ProblemRecord> {
        let mut problems = Vec::new();

        if let Some(cadence) = metrics.cadence {
            if let Some(baseline) = self.store.get("cadence") {
                problems.extend(check_baseline(ProblemKind::SlowCadence, cadence, baseline));
            }
        }

        if let Some(symmetry) = metrics.gait_symmetry {
            if let Some(baseline) = self.store.get("gait_symmetry") {
                problems.extend(check_baseline(
                    ProblemKind::AsymmetricGait,
                    symmetry,
                    baseline,
                ));
            }
        }

        if let Some(stride) = metrics.stride_length {
            if let Some(baseline) = self.store.get("stride_length_estimate") {
                problems.extend(check_baseline(ProblemKind::ShortStride, stride, baseline));
            }
        }

        if let Some(velocity) = metrics.velocity {
            if let Some(baseline) = self.store.get("velocity_estimate") {
                problems.extend(check_baseline(ProblemKind::SlowVelocity, velocity, baseline));
            }
        }

        if let Some(stability) = metrics.stability_score {
            problems.extend(check_cut_points(
                ProblemKind::PoorStability,
                stability,
                STABILITY_SEVERE_BELOW,
                STABILITY_MODERATE_BELOW,
            ));
        }

        if let Some(regularity) = metrics.step_regularity {
            problems.extend(check_cut_points(
                ProblemKind::IrregularSteps,
                regularity,
                REGULARITY_SEVERE_BELOW,
                REGULARITY_MODERATE_BELOW,
            ));
        }

        problems
    }

    /// Stable sort by severity first, then clinical category.
    pub fn prioritize(mut problems: Vec<ProblemRecord>) -> Vec<ProblemRecord> {
        problems.sort_by_key(|p| (p.severity.rank(), p.category.rank()));
        problems
    }

    /// Aggregate a prioritized problem list into a clinical summary.
    ///
    /// An empty list yields the fixed "normal" summary, never null output.
    pub fn summarize(problems: &[ProblemRecord]) -> ProblemSummary {
        if problems.is_empty() {
            return ProblemSummary {
                overall_status: OverallStatus::Normal,
                risk_level: RiskLevel::Low,
                total_problems: 0,
                severe_count: 0,
                moderate_count: 0,
                summary: "Your gait parameters are within normal ranges. Continue regular \
                          physical activity to maintain mobility."
                    .to_string(),
                primary_concerns: Vec::new(),
            };
        }

        let severe_count = problems
            .iter()
            .filter(|p| p.severity == Severity::Severe)
            .count();
        let moderate_count = problems
            .iter()
            .filter(|p| p.severity == Severity::Moderate)
            .count();

        let (risk_level, overall_status) = if severe_count >= 2 {
            (RiskLevel::High, OverallStatus::NeedsImmediateAttention)
        } else if severe_count >= 1 || moderate_count >= 3 {
            (RiskLevel::Moderate, OverallStatus::NeedsAttention)
        } else {
            (RiskLevel::LowModerate, OverallStatus::NeedsImprovement)
        };

        let primary_concerns: Vec<String> = problems
            .iter()
            .take(3)
            .map(|p| p.description.clone())
            .collect();

        let summary = format!(
            "Detected {} gait abnormality(ies): {} severe, {} moderate. Physical therapy \
             focusing on {} is recommended.",
            problems.len(),
            severe_count,
            moderate_count,
            problems[0].category.as_str().to_lowercase()
        );

        ProblemSummary {
            overall_status,
            risk_level,
            total_problems: problems.len(),
            severe_count,
            moderate_count,
            summary,
            primary_concerns,
        }
    }
}

/// Classify a baseline-backed metric: severe below p5 (strict), moderate in
/// [p5, p25).
fn check_baseline(kind: ProblemKind, value: f64, baseline: &Baseline) -> Option<ProblemRecord> {
    let severity = if value < baseline.p5 {
        Severity::Severe
    } else if value < baseline.p25 {
        Severity::Moderate
    } else {
        return None;
    };

    let percentile = percentile_of(value, baseline);
    let decimals = value_decimals(kind);
    Some(build_record(
        kind,
        severity,
        round_to(value, decimals),
        format!(
            "{:.prec$} - {:.prec$}",
            baseline.p25,
            baseline.p75,
            prec = decimals
        ),
        Some(percentile),
    ))
}

/// Classify an empirically-thresholded metric (no normative distribution).
fn check_cut_points(
    kind: ProblemKind,
    value: f64,
    severe_below: f64,
    moderate_below: f64,
) -> Option<ProblemRecord> {
    let severity = if value < severe_below {
        Severity::Severe
    } else if value < moderate_below {
        Severity::Moderate
    } else {
        return None;
    };

    Some(build_record(
        kind,
        severity,
        round_to(value, 2),
        ">0.75".to_string(),
        None,
    ))
}

fn build_record(
    kind: ProblemKind,
    severity: Severity,
    current_value: f64,
    normal_range: String,
    percentile: Option<u8>,
) -> ProblemRecord {
    let narrative = narrative(kind, severity);
    ProblemRecord {
        problem: kind,
        severity,
        category: category_for(kind),
        current_value,
        normal_range,
        percentile,
        description: describe(kind, severity, current_value, percentile),
        impact: narrative.impact.to_string(),
        clinical_significance: narrative.clinical_significance.to_string(),
        recommendations: narrative
            .recommendations
            .iter()
            .map(|r| r.to_string())
            .collect(),
    }
}

fn category_for(kind: ProblemKind) -> ProblemCategory {
    match kind {
        ProblemKind::SlowCadence | ProblemKind::SlowVelocity => ProblemCategory::SpeedRhythm,
        ProblemKind::AsymmetricGait | ProblemKind::PoorStability => {
            ProblemCategory::BalanceSymmetry
        }
        ProblemKind::ShortStride | ProblemKind::IrregularSteps => ProblemCategory::GaitPattern,
    }
}

/// Decimal places used for a metric's reported value and normal range.
fn value_decimals(kind: ProblemKind) -> usize {
    match kind {
        ProblemKind::SlowCadence => 1,
        _ => 2,
    }
}

fn round_to(value: f64, decimals: usize) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

fn describe(kind: ProblemKind, severity: Severity, value: f64, percentile: Option<u8>) -> String {
    let p = percentile.unwrap_or(0);
    match (kind, severity) {
        (ProblemKind::SlowCadence, Severity::Severe) => format!(
            "Your walking pace ({value:.1} steps/min) is significantly slower than normal \
             (below {p}th percentile)."
        ),
        (ProblemKind::SlowCadence, Severity::Moderate) => {
            format!("Your walking pace ({value:.1} steps/min) is below average ({p}th percentile).")
        }
        (ProblemKind::AsymmetricGait, Severity::Severe) => format!(
            "Your gait shows significant asymmetry (symmetry score: {value:.2}, below {p}th \
             percentile)."
        ),
        (ProblemKind::AsymmetricGait, Severity::Moderate) => {
            format!("Your gait shows mild asymmetry ({value:.2}, {p}th percentile).")
        }
        (ProblemKind::ShortStride, Severity::Severe) => format!(
            "Your stride length ({value:.2}m) is significantly shorter than normal (below \
             {p}th percentile)."
        ),
        (ProblemKind::ShortStride, Severity::Moderate) => {
            format!("Your stride length ({value:.2}m) is below average ({p}th percentile).")
        }
        (ProblemKind::SlowVelocity, Severity::Severe) => format!(
            "Your walking speed ({value:.2} m/s) is significantly slower than normal (below \
             {p}th percentile)."
        ),
        (ProblemKind::SlowVelocity, Severity::Moderate) => {
            format!("Your walking speed ({value:.2} m/s) is below average ({p}th percentile).")
        }
        (ProblemKind::PoorStability, Severity::Severe) => {
            format!("Your walking stability is significantly compromised (score: {value:.2}).")
        }
        (ProblemKind::PoorStability, Severity::Moderate) => {
            format!("Your walking stability shows room for improvement (score: {value:.2}).")
        }
        (ProblemKind::IrregularSteps, Severity::Severe) => {
            format!("Your steps show significant irregularity (regularity score: {value:.2}).")
        }
        (ProblemKind::IrregularSteps, Severity::Moderate) => {
            format!("Your steps show some irregularity (regularity score: {value:.2}).")
        }
    }
}

struct Narrative {
    impact: &'static str,
    clinical_significance: &'static str,
    recommendations: &'static [&'static str],
}

/// Fixed clinical content per `(problem, severity)`.
fn narrative(kind: ProblemKind, severity: Severity) -> Narrative {
    match (kind, severity) {
        (ProblemKind::SlowCadence, Severity::Severe) => Narrative {
            impact: "Severely reduced walking speed affects daily activities, community \
                     mobility, and crossing streets safely.",
            clinical_significance: "May indicate significant motor impairment requiring \
                                    immediate attention.",
            recommendations: &[
                "Metronome-paced walking at progressively faster tempos",
                "High knee marching exercises",
                "Quick stepping drills with cues",
                "Rhythmic auditory stimulation therapy",
            ],
        },
        (ProblemKind::SlowCadence, Severity::Moderate) => Narrative {
            impact: "Reduced walking pace may cause fatigue and limit daily mobility.",
            clinical_significance: "Indicates room for improvement in gait speed.",
            recommendations: &[
                "Progressive speed walking exercises",
                "Treadmill training with gradual speed increases",
                "Interval training (alternating speeds)",
            ],
        },
        (ProblemKind::AsymmetricGait, Severity::Severe) => Narrative {
            impact: "Severe asymmetry increases fall risk, causes uneven joint loading, and \
                     reduces walking efficiency.",
            clinical_significance: "May indicate hemiparesis or significant weakness on one side.",
            recommendations: &[
                "Single-leg stance exercises (weaker side)",
                "Weight-shifting drills",
                "Mirror therapy for gait training",
                "Bilateral coordination exercises",
                "Task-specific training focusing on affected side",
            ],
        },
        (ProblemKind::AsymmetricGait, Severity::Moderate) => Narrative {
            impact: "Asymmetry may lead to compensatory patterns and joint stress over time.",
            clinical_significance: "Indicates uneven loading between limbs.",
            recommendations: &[
                "Balance training exercises",
                "Step-up exercises (affected side)",
                "Lunges with focus on symmetry",
            ],
        },
        (ProblemKind::ShortStride, Severity::Severe) => Narrative {
            impact: "Very short strides severely reduce walking efficiency and speed.",
            clinical_significance: "May indicate fear of falling, muscle weakness, or limited \
                                    range of motion.",
            recommendations: &[
                "Lunge walking exercises to extend stride",
                "Heel-to-toe walking with exaggerated steps",
                "Visual targets for step length training",
                "Hip flexor and extensor strengthening",
                "Flexibility exercises for hip and ankle",
            ],
        },
        (ProblemKind::ShortStride, Severity::Moderate) => Narrative {
            impact: "Shorter strides reduce walking efficiency.",
            clinical_significance: "Indicates potential for improvement in step length.",
            recommendations: &[
                "Obstacle stepping exercises",
                "Step length awareness training",
                "Progressive stride lengthening drills",
            ],
        },
        (ProblemKind::SlowVelocity, Severity::Severe) => Narrative {
            impact: "Very slow walking speed severely limits community mobility, crossing \
                     streets, and daily activities.",
            clinical_significance: "Walking speed is a strong predictor of functional \
                                    independence. Speeds <0.8 m/s indicate limited community \
                                    ambulation.",
            recommendations: &[
                "Progressive treadmill training",
                "Fast walking intervals",
                "Overground speed training",
                "Resistance training for leg strength",
                "Dual-task training (walking + cognitive task)",
            ],
        },
        (ProblemKind::SlowVelocity, Severity::Moderate) => Narrative {
            impact: "Reduced speed may affect community mobility.",
            clinical_significance: "Room for improvement to enhance functional mobility.",
            recommendations: &[
                "Speed walking exercises",
                "Interval training",
                "Strength training to improve power",
            ],
        },
        (ProblemKind::PoorStability, Severity::Severe) => Narrative {
            impact: "Poor stability greatly increases fall risk and limits confidence in walking.",
            clinical_significance: "High fall risk - immediate intervention recommended.",
            recommendations: &[
                "Balance training on stable surfaces first",
                "Tandem walking exercises",
                "Single-leg stance practice",
                "Core strengthening exercises",
                "Gait training with assistive device if needed",
            ],
        },
        (ProblemKind::PoorStability, Severity::Moderate) => Narrative {
            impact: "Reduced stability may affect confidence and increase caution during walking.",
            clinical_significance: "Moderate fall risk.",
            recommendations: &[
                "Balance exercises",
                "Strength training for lower extremities",
                "Walking on varied surfaces",
            ],
        },
        (ProblemKind::IrregularSteps, Severity::Severe) => Narrative {
            impact: "Highly irregular steps indicate poor motor control and increase fall risk.",
            clinical_significance: "May indicate neurological impairment affecting gait timing.",
            recommendations: &[
                "Metronome-paced walking for rhythm training",
                "Visual cues for step placement",
                "Rhythmic auditory cueing therapy",
                "Task-specific gait training",
            ],
        },
        (ProblemKind::IrregularSteps, Severity::Moderate) => Narrative {
            impact: "Irregular steps may affect walking efficiency and smoothness.",
            clinical_significance: "Indicates inconsistent motor control.",
            recommendations: &[
                "Rhythm training exercises",
                "Paced walking drills",
                "Stepping pattern exercises",
            ],
        },
    }
}
