//! KPI breakdown of a results view.

use serde::Serialize;

use bls_model::LiftResult;

/// Aggregate of the results sharing one KPI label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSummary {
    pub kpi: String,
    /// Smallest `KPI Order` seen for this KPI, if any.
    pub order: Option<i64>,
    pub rows: usize,
    /// Results that could be scored.
    pub scored: usize,
    /// Statistically clear results.
    pub clear: usize,
    pub average_lift_pct: Option<f64>,
    /// Mean absolute gap in points (raw units for continuous metrics).
    pub average_gap_pts: Option<f64>,
    /// Alias with the highest lift.
    pub top_alias: Option<String>,
}

fn kpi_of(result: &LiftResult) -> &str {
    if result.key.kpi.is_empty() {
        &result.metric
    } else {
        &result.key.kpi
    }
}

fn average(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

/// Groups results by KPI.
///
/// KPIs with a `KPI Order` come first in ascending order, the rest follow
/// in order of first appearance.
pub fn kpi_breakdown(results: &[LiftResult]) -> Vec<KpiSummary> {
    struct Acc<'a> {
        kpi: &'a str,
        first_seen: usize,
        order: Option<i64>,
        rows: usize,
        clear: usize,
        lifts: Vec<f64>,
        gaps: Vec<f64>,
        top: Option<(&'a str, f64)>,
    }

    let mut groups: Vec<Acc<'_>> = Vec::new();
    for (idx, result) in results.iter().enumerate() {
        let kpi = kpi_of(result);
        let pos = match groups.iter().position(|acc| acc.kpi == kpi) {
            Some(pos) => pos,
            None => {
                groups.push(Acc {
                    kpi,
                    first_seen: idx,
                    order: None,
                    rows: 0,
                    clear: 0,
                    lifts: Vec::new(),
                    gaps: Vec::new(),
                    top: None,
                });
                groups.len() - 1
            }
        };
        let acc = &mut groups[pos];
        acc.rows += 1;
        acc.order = match (acc.order, result.kpi_order) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        let Some(stats) = result.stats() else {
            continue;
        };
        if stats.significant {
            acc.clear += 1;
        }
        let lift = stats.lift_pct();
        acc.lifts.push(lift);
        acc.gaps.push(stats.difference_pts().abs());
        if acc.top.is_none_or(|(_, best)| lift > best) {
            acc.top = Some((result.key.alias.as_str(), lift));
        }
    }

    groups.sort_by_key(|acc| (acc.order.is_none(), acc.order.unwrap_or_default(), acc.first_seen));
    groups
        .into_iter()
        .map(|acc| KpiSummary {
            kpi: acc.kpi.to_string(),
            order: acc.order,
            rows: acc.rows,
            scored: acc.lifts.len(),
            clear: acc.clear,
            average_lift_pct: average(&acc.lifts),
            average_gap_pts: average(&acc.gaps),
            top_alias: acc.top.map(|(alias, _)| alias.to_string()),
        })
        .collect()
}
