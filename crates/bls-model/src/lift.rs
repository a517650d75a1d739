//! Lift results, verdicts and the per-comparison insufficient-data error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::{Arm, CellKey};

/// How an arm's values are distributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArmKind {
    /// Share of respondents showing the KPI, in [0, 1].
    Proportion,
    /// Arbitrary numeric metric.
    Continuous,
}

/// Sufficient statistics of one arm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArmStats {
    pub n: u64,
    pub mean: f64,
    /// Sample variance; `p(1-p)` for proportions.
    pub variance: f64,
    pub kind: ArmKind,
}

impl ArmStats {
    pub fn proportion(n: u64, p: f64) -> Self {
        Self {
            n,
            mean: p,
            variance: p * (1.0 - p),
            kind: ArmKind::Proportion,
        }
    }
}

/// The two-sample test behind a confidence value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "test")]
pub enum TestKind {
    /// Pooled two-proportion z-test.
    TwoProportionZ,
    /// Welch's unequal-variance t-test.
    WelchT { degrees_of_freedom: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectBand {
    Negligible,
    Small,
    Medium,
    Large,
}

impl EffectBand {
    pub fn from_effect(effect: f64) -> Self {
        let size = effect.abs();
        if size < 0.2 {
            Self::Negligible
        } else if size < 0.5 {
            Self::Small
        } else if size < 0.8 {
            Self::Medium
        } else {
            Self::Large
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Negligible => "Negligible",
            Self::Small => "Small",
            Self::Medium => "Medium",
            Self::Large => "Large",
        }
    }
}

/// Sample-size warning attached to a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataFlag {
    LowSample,
    LimitedSample,
}

impl DataFlag {
    pub fn label(self) -> &'static str {
        match self {
            Self::LowSample => "Low sample",
            Self::LimitedSample => "Limited sample",
        }
    }
}

/// Categorical reading of a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    ClearUp,
    ClearDown,
    PossibleUp,
    PossibleDown,
    NoClear,
}

impl Verdict {
    pub fn label(self) -> &'static str {
        match self {
            Self::ClearUp => "Clear increase",
            Self::ClearDown => "Clear decline",
            Self::PossibleUp => "Possible increase",
            Self::PossibleDown => "Possible decline",
            Self::NoClear => "No clear change",
        }
    }

    pub fn is_clear(self) -> bool {
        matches!(self, Self::ClearUp | Self::ClearDown)
    }
}

/// Computed statistics of one exposed-vs-control comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiftStats {
    pub control_mean: f64,
    pub exposed_mean: f64,
    /// `exposed_mean - control_mean`.
    pub difference: f64,
    /// `difference / abs(control_mean)`.
    pub lift: f64,
    /// Standard error used by the test statistic.
    pub std_error: f64,
    /// Unpooled standard error of the difference.
    pub se_difference: f64,
    /// z or t statistic.
    pub statistic: f64,
    pub p_value: f64,
    /// `1 - p_value`, always within [0, 1].
    pub confidence: f64,
    pub ci_low: f64,
    pub ci_high: f64,
    pub significant: bool,
    pub effect_size: f64,
    pub effect_band: EffectBand,
    pub data_flag: Option<DataFlag>,
    #[serde(flatten)]
    pub test: TestKind,
}

impl LiftStats {
    pub fn lift_pct(&self) -> f64 {
        self.lift * 100.0
    }

    /// Difference in percentage points for proportions, raw units otherwise.
    pub fn difference_pts(&self) -> f64 {
        self.scale() * self.difference
    }

    pub fn control_display(&self) -> f64 {
        self.scale() * self.control_mean
    }

    pub fn exposed_display(&self) -> f64 {
        self.scale() * self.exposed_mean
    }

    pub fn ci_low_pts(&self) -> f64 {
        self.scale() * self.ci_low
    }

    pub fn ci_high_pts(&self) -> f64 {
        self.scale() * self.ci_high
    }

    pub fn is_proportion(&self) -> bool {
        matches!(self.test, TestKind::TwoProportionZ)
    }

    fn scale(&self) -> f64 {
        if self.is_proportion() { 100.0 } else { 1.0 }
    }
}

/// Human-readable reading of a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub verdict: Verdict,
    /// e.g. "Not definitive; low sample."
    pub note: String,
    /// "What changed" line.
    pub meaning: String,
    /// "How to use it" line.
    pub decision: String,
}

impl Insight {
    pub fn state_label(&self) -> &'static str {
        self.verdict.label()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub stats: LiftStats,
    pub insight: Insight,
}

/// Why a comparison could not produce a confidence value.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum InsufficientReason {
    #[error("no {arm} observations")]
    MissingArm { arm: Arm },

    #[error("{arm} group has {count} observation(s), at least {minimum} required")]
    TooFewObservations { arm: Arm, count: u64, minimum: u64 },

    #[error("'{column}' is missing or unreadable")]
    MissingValue { column: String },

    #[error("'{column}' value {value} is not a proportion")]
    ScoreOutOfRange { column: String, value: f64 },

    #[error("control baseline is zero, relative lift is undefined")]
    ZeroBaseline,

    #[error("both groups have zero variance")]
    ZeroStandardError,
}

/// A comparison whose sample is too small or too incomplete to score.
///
/// Attached to the affected comparison only; other comparisons still report.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{label}: {reason}")]
pub struct InsufficientDataError {
    pub label: String,
    pub reason: InsufficientReason,
}

/// One row of the results view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiftResult {
    pub key: CellKey,
    pub kpi_order: Option<i64>,
    /// Name of the metric the comparison was computed on.
    pub metric: String,
    pub control: Option<ArmStats>,
    pub exposed: Option<ArmStats>,
    pub outcome: Result<Assessment, InsufficientDataError>,
}

impl LiftResult {
    pub fn assessment(&self) -> Option<&Assessment> {
        self.outcome.as_ref().ok()
    }

    pub fn stats(&self) -> Option<&LiftStats> {
        self.assessment().map(|assessment| &assessment.stats)
    }

    pub fn warning(&self) -> Option<&InsufficientDataError> {
        self.outcome.as_ref().err()
    }

    pub fn is_significant(&self) -> bool {
        self.stats().is_some_and(|stats| stats.significant)
    }

    pub fn label(&self) -> String {
        self.key.label()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_bands_follow_cohen() {
        assert_eq!(EffectBand::from_effect(0.1), EffectBand::Negligible);
        assert_eq!(EffectBand::from_effect(-0.3), EffectBand::Small);
        assert_eq!(EffectBand::from_effect(0.6), EffectBand::Medium);
        assert_eq!(EffectBand::from_effect(1.2), EffectBand::Large);
    }

    #[test]
    fn insufficient_error_names_the_comparison() {
        let err = InsufficientDataError {
            label: "Brand B | Awareness".to_string(),
            reason: InsufficientReason::MissingArm { arm: Arm::Control },
        };
        assert_eq!(err.to_string(), "Brand B | Awareness: no Control observations");
    }
}
