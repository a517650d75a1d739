//! Building exposed-vs-control comparisons from aliased records.

use std::collections::HashMap;

use bls_model::columns::{CONTROL_SAMPLE, CONTROL_SCORE, EXPOSED_SAMPLE, EXPOSED_SCORE, METRIC};
use bls_model::{
    Arm, ArmKind, ArmStats, ArmSummary, CellKey, InsufficientReason, Observation, StudyRow,
    Thresholds,
};

/// Metric name reported for summary-layout comparisons.
pub const SCORE_METRIC: &str = "Score";

/// Which observation value a comparison is computed on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MetricSource {
    /// The `Metric` column (or the scores of a summary upload).
    #[default]
    Primary,
    /// An extra numeric column of an observations upload.
    Column(String),
}

impl MetricSource {
    pub fn name(&self) -> &str {
        match self {
            Self::Primary => METRIC,
            Self::Column(name) => name,
        }
    }

    fn value(&self, observation: &Observation) -> Option<f64> {
        match self {
            Self::Primary => Some(observation.metric),
            Self::Column(name) => observation.extra_metrics.get(name).copied(),
        }
    }
}

/// One exposed-vs-control comparison ready for the lift calculator.
///
/// An arm that cannot be summarised carries the reason instead of stats.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub key: CellKey,
    pub kpi_order: Option<i64>,
    pub metric: String,
    pub control: Result<ArmStats, InsufficientReason>,
    pub exposed: Result<ArmStats, InsufficientReason>,
}

fn summary_arm(
    arm: Arm,
    summary: ArmSummary,
    sample_column: &str,
    score_column: &str,
) -> Result<ArmStats, InsufficientReason> {
    let n = summary.sample.ok_or_else(|| InsufficientReason::MissingValue {
        column: sample_column.to_string(),
    })?;
    if n == 0 {
        return Err(InsufficientReason::MissingArm { arm });
    }
    let score = summary.score.ok_or_else(|| InsufficientReason::MissingValue {
        column: score_column.to_string(),
    })?;
    if !(0.0..=1.0).contains(&score) {
        return Err(InsufficientReason::ScoreOutOfRange {
            column: score_column.to_string(),
            value: score,
        });
    }
    Ok(ArmStats::proportion(n, score))
}

/// One comparison per summary row, in upload order.
pub fn summary_comparisons(rows: &[StudyRow]) -> Vec<Comparison> {
    rows.iter()
        .map(|row| Comparison {
            key: CellKey::from_descriptors(&row.brand, &row.descriptors),
            kpi_order: row.kpi_order,
            metric: SCORE_METRIC.to_string(),
            control: summary_arm(Arm::Control, row.control, CONTROL_SAMPLE, CONTROL_SCORE),
            exposed: summary_arm(Arm::Exposed, row.exposed, EXPOSED_SAMPLE, EXPOSED_SCORE),
        })
        .collect()
}

#[derive(Default)]
struct Cell {
    control: Vec<f64>,
    exposed: Vec<f64>,
}

fn is_binary(value: f64) -> bool {
    value == 0.0 || value == 1.0
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_variance(values: &[f64], mean: f64) -> f64 {
    let n = values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)
}

fn observation_arm(
    arm: Arm,
    values: &[f64],
    kind: ArmKind,
    thresholds: &Thresholds,
) -> Result<ArmStats, InsufficientReason> {
    if values.is_empty() {
        return Err(InsufficientReason::MissingArm { arm });
    }
    let n = values.len() as u64;
    let mean = mean(values);
    match kind {
        ArmKind::Proportion => Ok(ArmStats::proportion(n, mean)),
        ArmKind::Continuous => {
            if values.len() < thresholds.min_observations {
                return Err(InsufficientReason::TooFewObservations {
                    arm,
                    count: n,
                    minimum: thresholds.min_observations as u64,
                });
            }
            Ok(ArmStats {
                n,
                mean,
                variance: sample_variance(values, mean),
                kind,
            })
        }
    }
}

/// Groups observations into comparisons by cell key, in first-appearance order.
///
/// A cell whose values are all 0/1 is treated as a proportion. Observations
/// lacking the chosen metric are left out. When an extra column is chosen it
/// replaces the KPI label of the cell.
pub fn observation_comparisons(
    observations: &[Observation],
    source: &MetricSource,
    thresholds: &Thresholds,
) -> Vec<Comparison> {
    let mut order: Vec<CellKey> = Vec::new();
    let mut cells: HashMap<CellKey, Cell> = HashMap::new();

    for observation in observations {
        let Some(value) = source.value(observation) else {
            continue;
        };
        let mut key = CellKey::from_descriptors(&observation.brand, &observation.descriptors);
        if let MetricSource::Column(name) = source {
            key.kpi.clone_from(name);
        }
        let cell = cells.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            Cell::default()
        });
        match observation.arm {
            Arm::Control => cell.control.push(value),
            Arm::Exposed => cell.exposed.push(value),
        }
    }

    order
        .into_iter()
        .filter_map(|key| {
            let cell = cells.remove(&key)?;
            let kind = if cell.control.iter().chain(&cell.exposed).all(|v| is_binary(*v)) {
                ArmKind::Proportion
            } else {
                ArmKind::Continuous
            };
            Some(Comparison {
                key,
                kpi_order: None,
                metric: source.name().to_string(),
                control: observation_arm(Arm::Control, &cell.control, kind, thresholds),
                exposed: observation_arm(Arm::Exposed, &cell.exposed, kind, thresholds),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use bls_model::Descriptors;

    use super::*;

    fn obs(brand: &str, arm: Arm, metric: f64) -> Observation {
        Observation {
            row: 0,
            brand: brand.to_string(),
            arm,
            metric,
            descriptors: Descriptors {
                kpi: Some("Awareness".to_string()),
                ..Descriptors::default()
            },
            extra_metrics: BTreeMap::new(),
        }
    }

    #[test]
    fn binary_cells_become_proportions() {
        let rows = vec![
            obs("Brand A", Arm::Control, 0.0),
            obs("Brand A", Arm::Control, 1.0),
            obs("Brand A", Arm::Exposed, 1.0),
            obs("Brand A", Arm::Exposed, 1.0),
        ];
        let comparisons =
            observation_comparisons(&rows, &MetricSource::Primary, &Thresholds::default());
        assert_eq!(comparisons.len(), 1);
        let control = comparisons[0].control.clone().unwrap();
        assert_eq!(control.kind, ArmKind::Proportion);
        assert_eq!(control.n, 2);
        assert!((control.mean - 0.5).abs() < 1e-12);
        assert!((control.variance - 0.25).abs() < 1e-12);
    }

    #[test]
    fn continuous_cells_need_enough_observations() {
        let rows = vec![
            obs("Brand A", Arm::Control, 3.5),
            obs("Brand A", Arm::Exposed, 4.0),
            obs("Brand A", Arm::Exposed, 5.0),
        ];
        let comparisons =
            observation_comparisons(&rows, &MetricSource::Primary, &Thresholds::default());
        assert_eq!(
            comparisons[0].control,
            Err(InsufficientReason::TooFewObservations {
                arm: Arm::Control,
                count: 1,
                minimum: 2
            })
        );
        let exposed = comparisons[0].exposed.clone().unwrap();
        assert!((exposed.variance - 0.5).abs() < 1e-12);
    }

    #[test]
    fn cells_keep_first_appearance_order() {
        let rows = vec![
            obs("Brand B", Arm::Exposed, 1.0),
            obs("Brand A", Arm::Exposed, 1.0),
            obs("Brand B", Arm::Control, 0.0),
        ];
        let comparisons =
            observation_comparisons(&rows, &MetricSource::Primary, &Thresholds::default());
        let aliases: Vec<_> = comparisons.iter().map(|c| c.key.alias.as_str()).collect();
        assert_eq!(aliases, vec!["Brand B", "Brand A"]);
        assert_eq!(
            comparisons[1].control,
            Err(InsufficientReason::MissingArm { arm: Arm::Control })
        );
    }

    #[test]
    fn summary_rows_flag_unreadable_cells() {
        let row = StudyRow {
            row: 1,
            brand: "Brand A".to_string(),
            descriptors: Descriptors::default(),
            kpi_order: Some(2),
            control: ArmSummary {
                sample: None,
                score: Some(0.4),
            },
            exposed: ArmSummary {
                sample: Some(100),
                score: Some(1.2),
            },
        };
        let comparisons = summary_comparisons(&[row]);
        assert_eq!(
            comparisons[0].control,
            Err(InsufficientReason::MissingValue {
                column: "Control Sample".to_string()
            })
        );
        assert!(matches!(
            comparisons[0].exposed,
            Err(InsufficientReason::ScoreOutOfRange { .. })
        ));
        assert_eq!(comparisons[0].kpi_order, Some(2));
    }
}
