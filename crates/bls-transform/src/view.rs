//! Filtered result views, row selection and headline summary.

use serde::Serialize;

use bls_model::LiftResult;

use crate::alias::AliasMap;
use crate::error::{Result, TransformError};

/// Filters applied to the results table. Empty lists match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewFilter {
    pub markets: Vec<String>,
    pub categories: Vec<String>,
    /// Aliases or real brand names.
    pub brands: Vec<String>,
    pub kpis: Vec<String>,
    /// Keep only statistically clear results.
    pub definitive_only: bool,
}

fn matches_any(wanted: &[String], value: &str) -> bool {
    wanted.is_empty()
        || wanted
            .iter()
            .any(|candidate| candidate.trim().eq_ignore_ascii_case(value.trim()))
}

impl ViewFilter {
    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
            && self.categories.is_empty()
            && self.brands.is_empty()
            && self.kpis.is_empty()
            && !self.definitive_only
    }

    /// Filters `results`, keeping their order.
    ///
    /// Brand filters accept either the alias or the real name; names that
    /// match no brand are ignored. An empty view is an error.
    pub fn apply(&self, results: &[LiftResult], aliases: &AliasMap) -> Result<Vec<LiftResult>> {
        let brand_aliases: Vec<String> = self
            .brands
            .iter()
            .filter_map(|name| aliases.resolve(name))
            .map(str::to_string)
            .collect();
        if !self.brands.is_empty() && brand_aliases.is_empty() {
            return Err(TransformError::NoMatchingRows);
        }

        let view: Vec<LiftResult> = results
            .iter()
            .filter(|result| {
                matches_any(&self.markets, &result.key.market)
                    && matches_any(&self.categories, &result.key.category)
                    && matches_any(&brand_aliases, &result.key.alias)
                    && matches_any(&self.kpis, &result.key.kpi)
                    && (!self.definitive_only || result.is_significant())
            })
            .cloned()
            .collect();
        if view.is_empty() {
            return Err(TransformError::NoMatchingRows);
        }
        Ok(view)
    }
}

/// How a single row is picked for the deep dive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowSelector {
    /// 1-based position in the view.
    Index(usize),
    /// Row label such as `Brand A | Awareness | Jan 2024`.
    Label(String),
}

impl RowSelector {
    /// Digits select by position, anything else by label.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        match value.parse::<usize>() {
            Ok(index) => Self::Index(index),
            Err(_) => Self::Label(value.to_string()),
        }
    }
}

/// Picks one row of the view; label matches take the first occurrence.
pub fn select_row<'a>(view: &'a [LiftResult], selector: &RowSelector) -> Result<&'a LiftResult> {
    match selector {
        RowSelector::Index(index) => index
            .checked_sub(1)
            .and_then(|idx| view.get(idx))
            .ok_or(TransformError::RowOutOfRange {
                index: *index,
                len: view.len(),
            }),
        RowSelector::Label(label) => view
            .iter()
            .find(|result| result.label() == *label)
            .ok_or_else(|| TransformError::UnknownRow {
                label: label.clone(),
            }),
    }
}

/// Headline numbers of a view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ViewSummary {
    pub rows: usize,
    /// Statistically clear results.
    pub clear: usize,
    /// Results carrying an insufficient-data warning.
    pub insufficient: usize,
    pub average_lift_pct: Option<f64>,
    pub average_gap_pts: Option<f64>,
}

/// Summarises a view. Averages cover the scored rows only.
pub fn summarize(view: &[LiftResult]) -> ViewSummary {
    let scored: Vec<_> = view.iter().filter_map(LiftResult::stats).collect();
    let average = |values: Vec<f64>| {
        (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
    };
    ViewSummary {
        rows: view.len(),
        clear: scored.iter().filter(|stats| stats.significant).count(),
        insufficient: view.len() - scored.len(),
        average_lift_pct: average(scored.iter().map(|stats| stats.lift_pct()).collect()),
        average_gap_pts: average(
            scored
                .iter()
                .map(|stats| stats.difference_pts().abs())
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_parsing() {
        assert_eq!(RowSelector::parse(" 3 "), RowSelector::Index(3));
        assert_eq!(
            RowSelector::parse("Brand A | Awareness"),
            RowSelector::Label("Brand A | Awareness".to_string())
        );
    }

    #[test]
    fn index_zero_is_out_of_range() {
        let err = select_row(&[], &RowSelector::Index(0)).unwrap_err();
        assert!(matches!(err, TransformError::RowOutOfRange { index: 0, len: 0 }));
    }

    #[test]
    fn empty_view_summary() {
        let summary = summarize(&[]);
        assert_eq!(summary.rows, 0);
        assert_eq!(summary.average_lift_pct, None);
    }
}
