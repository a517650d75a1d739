//! End-to-end analysis of an upload: alias, aggregate, score, annotate.

use std::time::Instant;

use tracing::{info, info_span, warn};

use bls_model::{Assessment, Dataset, InsufficientDataError, LiftResult, Thresholds};

use crate::alias::{AliasMap, assign_aliases};
use crate::arms::{Comparison, MetricSource, observation_comparisons, summary_comparisons};
use crate::error::{Result, TransformError};
use crate::insight::build_insight;
use crate::lift::compute_lift;

/// Options that shape the results but not the statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOptions {
    pub metric: MetricSource,
    /// Keep "possible" and "no clear change" verdicts.
    pub include_non_definitive: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            metric: MetricSource::Primary,
            include_non_definitive: true,
        }
    }
}

/// Aliased dataset with its results.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub aliases: AliasMap,
    /// The upload with brand names replaced by aliases.
    pub dataset: Dataset,
    pub results: Vec<LiftResult>,
}

impl Analysis {
    /// Extra numeric columns available for re-projection.
    pub fn metric_columns(&self) -> Vec<String> {
        metric_columns(&self.dataset)
    }

    /// Recomputes the results against another metric of the same aliased data.
    pub fn reproject(
        &self,
        metric: MetricSource,
        thresholds: &Thresholds,
        include_non_definitive: bool,
    ) -> Result<Vec<LiftResult>> {
        let options = AnalysisOptions {
            metric,
            include_non_definitive,
        };
        compute_results(&self.dataset, thresholds, &options)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &InsufficientDataError> {
        self.results.iter().filter_map(LiftResult::warning)
    }
}

fn metric_columns(dataset: &Dataset) -> Vec<String> {
    let Dataset::Observations(observations) = dataset else {
        return Vec::new();
    };
    let mut columns: Vec<String> = Vec::new();
    for name in observations.iter().flat_map(|obs| obs.extra_metrics.keys()) {
        if !columns.contains(name) {
            columns.push(name.clone());
        }
    }
    columns
}

fn score(comparison: Comparison, thresholds: &Thresholds, include_non_definitive: bool) -> LiftResult {
    let outcome = compute_lift(&comparison, thresholds).map(|stats| Assessment {
        insight: build_insight(&stats, &comparison.key.kpi, thresholds, include_non_definitive),
        stats,
    });
    LiftResult {
        control: comparison.control.ok(),
        exposed: comparison.exposed.ok(),
        key: comparison.key,
        kpi_order: comparison.kpi_order,
        metric: comparison.metric,
        outcome,
    }
}

/// Scores every comparison of an already aliased dataset.
pub fn compute_results(
    dataset: &Dataset,
    thresholds: &Thresholds,
    options: &AnalysisOptions,
) -> Result<Vec<LiftResult>> {
    let span = info_span!("lift", metric = options.metric.name());
    let _guard = span.enter();
    let start = Instant::now();

    let comparisons = match (dataset, &options.metric) {
        (Dataset::Summary(rows), MetricSource::Primary) => summary_comparisons(rows),
        (Dataset::Summary(_), MetricSource::Column(_)) => {
            return Err(TransformError::MetricNeedsObservations);
        }
        (Dataset::Observations(observations), source) => {
            if let MetricSource::Column(column) = source {
                let available = metric_columns(dataset);
                if !available.contains(column) {
                    return Err(TransformError::UnknownMetric {
                        column: column.clone(),
                        available,
                    });
                }
            }
            observation_comparisons(observations, source, thresholds)
        }
    };

    let results: Vec<LiftResult> = comparisons
        .into_iter()
        .map(|comparison| score(comparison, thresholds, options.include_non_definitive))
        .collect();

    let mut insufficient = 0usize;
    for err in results.iter().filter_map(LiftResult::warning) {
        insufficient += 1;
        warn!(comparison = %err.label, reason = %err.reason, "insufficient data");
    }
    info!(
        comparisons = results.len(),
        significant = results.iter().filter(|r| r.is_significant()).count(),
        insufficient,
        duration_ms = start.elapsed().as_millis(),
        "lift complete"
    );
    Ok(results)
}

/// Aliases the upload and scores every comparison.
///
/// Fails only when the dataset is empty or the requested metric does not
/// exist; comparisons that cannot be scored carry their own error.
pub fn analyze(
    dataset: &Dataset,
    thresholds: &Thresholds,
    options: &AnalysisOptions,
) -> Result<Analysis> {
    let (aliases, aliased) = match dataset {
        Dataset::Summary(rows) => {
            let (aliases, rows) = assign_aliases(rows)?;
            (aliases, Dataset::Summary(rows))
        }
        Dataset::Observations(observations) => {
            let (aliases, observations) = assign_aliases(observations)?;
            (aliases, Dataset::Observations(observations))
        }
    };
    let results = compute_results(&aliased, thresholds, options)?;
    Ok(Analysis {
        aliases,
        dataset: aliased,
        results,
    })
}
