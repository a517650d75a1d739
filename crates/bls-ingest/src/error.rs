//! Error types for upload ingestion.
//!
//! Every variant is a malformed-input failure: the upload is rejected and
//! the message is shown to the user.

use std::path::PathBuf;

use bls_model::InputLayout;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file type '{extension}' for {path}; upload a CSV or XLSX file")]
    UnsupportedFormat { path: PathBuf, extension: String },

    // === Parsing Errors ===
    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    #[error("failed to read spreadsheet {path}: {message}")]
    Spreadsheet { path: PathBuf, message: String },

    #[error("no header row found in {path}")]
    NoHeader { path: PathBuf },

    #[error("column {index} has an empty header")]
    EmptyColumnName { index: usize },

    #[error("column '{column}' appears more than once")]
    DuplicateColumn { column: String },

    #[error("row {row} has {cells} cells but the header has {width} columns")]
    RaggedRow {
        row: usize,
        cells: usize,
        width: usize,
    },

    // === Column Surface Errors ===
    #[error(
        "upload is missing required {layout} columns ({}); allowed inputs: {}",
        describe_missing(.missing_base, .missing_scores),
        .allowed.join(", ")
    )]
    MissingColumns {
        layout: &'static str,
        missing_base: Vec<String>,
        missing_scores: Vec<String>,
        allowed: Vec<String>,
    },

    #[error(
        "upload contains extra (computed) columns and strict mode is on: {}",
        .extras.join(", ")
    )]
    ExtraColumns { extras: Vec<String> },

    // === Row Errors ===
    #[error("row {row}: brand is blank")]
    MissingBrand { row: usize },

    #[error("row {row}: unknown group '{value}' (expected exposed or control)")]
    UnknownGroup { row: usize, value: String },

    #[error("row {row}: '{column}' value '{value}' is not a number")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },

    // === Template Errors ===
    #[error("failed to write template: {message}")]
    Template { message: String },

    // === DataFrame Errors ===
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

fn describe_missing(base: &[String], scores: &[String]) -> String {
    let mut parts = Vec::new();
    if !base.is_empty() {
        parts.push(format!("base: {}", base.join(", ")));
    }
    if !scores.is_empty() {
        parts.push(format!("scores: {}", scores.join(", ")));
    }
    parts.join("; ")
}

impl IngestError {
    pub(crate) fn missing_columns(
        layout: InputLayout,
        missing_base: Vec<String>,
        missing_scores: Vec<String>,
    ) -> Self {
        Self::MissingColumns {
            layout: layout.label(),
            missing_base,
            missing_scores,
            allowed: layout
                .allowed_columns()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

impl From<polars::prelude::PolarsError> for IngestError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_lists_allowed_inputs() {
        let err = IngestError::missing_columns(
            InputLayout::Observations,
            vec!["Metric".to_string()],
            Vec::new(),
        );
        assert_eq!(
            err.to_string(),
            "upload is missing required observations columns (base: Metric); \
             allowed inputs: Brand, Group, Metric, KPI, Month Year, Market, Category, Study ID"
        );
    }

    #[test]
    fn base_and_score_gaps_are_reported_separately() {
        let err = IngestError::missing_columns(
            InputLayout::Summary,
            vec!["Exposed Sample".to_string()],
            vec!["Control Score".to_string(), "Exposed Score".to_string()],
        );
        let message = err.to_string();
        assert!(
            message.contains("(base: Exposed Sample; scores: Control Score, Exposed Score)"),
            "{message}"
        );
    }

    #[test]
    fn error_from_polars() {
        let polars_err = polars::prelude::PolarsError::ColumnNotFound("Brand".into());
        let err: IngestError = polars_err.into();
        assert!(matches!(err, IngestError::DataFrame { .. }));
    }
}
