//! Column-surface validation.

use polars::prelude::DataFrame;

use bls_model::InputLayout;
use bls_model::columns::{GROUP, REQUIRED_BASE_COLS, REQUIRED_OBSERVATION_COLS, REQUIRED_SCORE_COLS};

/// Outcome of validating an upload's columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnCheck {
    pub layout: InputLayout,
    /// Missing descriptor/sample columns (summary) or required observation columns.
    pub missing_base: Vec<String>,
    /// Missing score columns (summary layout only).
    pub missing_scores: Vec<String>,
    /// Columns outside the input surface, in upload order.
    pub extras: Vec<String>,
    pub columns: Vec<String>,
}

impl ColumnCheck {
    pub fn ok(&self) -> bool {
        self.missing_base.is_empty() && self.missing_scores.is_empty()
    }
}

pub(crate) fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

/// Picks the layout from the header: a group column means observations.
pub fn detect_layout(columns: &[String]) -> InputLayout {
    if columns.iter().any(|col| col == GROUP) {
        InputLayout::Observations
    } else {
        InputLayout::Summary
    }
}

/// Validates the column surface of an upload.
pub fn check_columns(df: &DataFrame) -> ColumnCheck {
    let columns = column_names(df);
    let layout = detect_layout(&columns);
    let has = |name: &&str| columns.iter().any(|col| col == name);
    let missing = |required: &[&str]| -> Vec<String> {
        required
            .iter()
            .filter(|name| !has(*name))
            .map(|name| (*name).to_string())
            .collect()
    };
    let (missing_base, missing_scores) = match layout {
        InputLayout::Summary => (missing(REQUIRED_BASE_COLS), missing(REQUIRED_SCORE_COLS)),
        InputLayout::Observations => (missing(REQUIRED_OBSERVATION_COLS), Vec::new()),
    };
    let allowed = layout.allowed_columns();
    let extras = columns
        .iter()
        .filter(|col| !allowed.iter().any(|name| *name == col.as_str()))
        .cloned()
        .collect();
    ColumnCheck {
        layout,
        missing_base,
        missing_scores,
        extras,
        columns,
    }
}
