//! Error types for the transform stage.

use thiserror::Error;

/// Errors that abort an analysis run.
///
/// Per-comparison problems are not errors at this level; they travel inside
/// each [`LiftResult`](bls_model::LiftResult) as an
/// [`InsufficientDataError`](bls_model::InsufficientDataError).
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("dataset contains no rows")]
    EmptyDataset,

    #[error("unknown KPI metric column '{column}'; available: {}", format_available(.available))]
    UnknownMetric {
        column: String,
        available: Vec<String>,
    },

    #[error("KPI metric re-projection needs an observations upload")]
    MetricNeedsObservations,

    #[error("no rows match the current filters")]
    NoMatchingRows,

    #[error("row {index} is out of range; the view has {len} row(s)")]
    RowOutOfRange { index: usize, len: usize },

    #[error("no row labelled '{label}'")]
    UnknownRow { label: String },

    #[error("failed to write alias map: {message}")]
    AliasExport { message: String },
}

fn format_available(available: &[String]) -> String {
    if available.is_empty() {
        "none".to_string()
    } else {
        available.join(", ")
    }
}

pub type Result<T> = std::result::Result<T, TransformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_metric_lists_alternatives() {
        let err = TransformError::UnknownMetric {
            column: "Reach".to_string(),
            available: vec![],
        };
        assert_eq!(
            err.to_string(),
            "unknown KPI metric column 'Reach'; available: none"
        );
    }
}
