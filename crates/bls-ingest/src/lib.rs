//! Brand-lift upload ingestion.
//!
//! This crate turns an uploaded CSV or spreadsheet into typed records:
//!
//! - **Reading**: CSV via `csv`, workbooks via `calamine`, both into a
//!   string-typed Polars DataFrame with canonical header names
//! - **Column surface**: required/optional/extra column validation and
//!   layout detection (summary vs observations)
//! - **Records**: typed [`StudyRow`](bls_model::StudyRow) or
//!   [`Observation`](bls_model::Observation) values
//! - **Templates**: header-only CSV templates of the input surface
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use bls_ingest::{IngestOptions, ingest};
//!
//! let upload = ingest(Path::new("study.xlsx"), &IngestOptions::default())?;
//! println!("{} rows ({})", upload.dataset.len(), upload.check.layout.label());
//! ```

mod check;
mod error;
mod reader;
mod records;
mod template;
mod values;

use std::path::Path;
use std::time::Instant;

use polars::prelude::DataFrame;
use tracing::{info, info_span, warn};

use bls_model::{Dataset, InputLayout};

// === Error Types ===
pub use error::{IngestError, Result};

// === Reading ===
pub use reader::{
    FileKind, RawTable, raw_to_dataframe, read_csv_rows, read_spreadsheet_rows, read_upload,
};

// === Column Surface ===
pub use check::{ColumnCheck, check_columns, detect_layout};

// === Records ===
pub use records::{LoadedObservations, load_observations, load_study_rows, numeric_columns};

// === Templates ===
pub use template::template_csv;

// === Cell Parsing ===
pub use values::{parse_number, parse_order, parse_sample, parse_score};

/// Options controlling how strictly the upload surface is enforced.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestOptions {
    /// Reject uploads carrying columns outside the input surface.
    pub strict: bool,
}

/// A validated, typed upload.
#[derive(Debug, Clone)]
pub struct Upload {
    pub dataset: Dataset,
    pub check: ColumnCheck,
    /// Extra columns dropped from the upload.
    pub ignored_columns: Vec<String>,
    /// Extra numeric columns kept as alternate KPI metrics (observations only).
    pub metric_columns: Vec<String>,
    /// Observation rows skipped because the metric was blank.
    pub skipped_rows: Vec<usize>,
}

/// Reads, validates and types an upload from disk.
pub fn ingest(path: &Path, options: &IngestOptions) -> Result<Upload> {
    let span = info_span!("ingest", path = %path.display());
    let _guard = span.enter();
    let start = Instant::now();
    let df = read_upload(path)?;
    let upload = ingest_frame(&df, options)?;
    info!(
        layout = upload.check.layout.label(),
        rows = upload.dataset.len(),
        ignored_columns = upload.ignored_columns.len(),
        duration_ms = start.elapsed().as_millis(),
        "ingest complete"
    );
    Ok(upload)
}

/// Validates and types an already-loaded DataFrame.
pub fn ingest_frame(df: &DataFrame, options: &IngestOptions) -> Result<Upload> {
    let check = check_columns(df);
    if !check.ok() {
        return Err(IngestError::missing_columns(
            check.layout,
            check.missing_base.clone(),
            check.missing_scores.clone(),
        ));
    }
    if !check.extras.is_empty() {
        if options.strict {
            return Err(IngestError::ExtraColumns {
                extras: check.extras.clone(),
            });
        }
        warn!(
            columns = %check.extras.join(", "),
            "upload contains extra columns outside the input surface"
        );
    }

    let (dataset, metric_columns, skipped_rows) = match check.layout {
        InputLayout::Summary => (Dataset::Summary(load_study_rows(df)?), Vec::new(), Vec::new()),
        InputLayout::Observations => {
            let metric_columns = numeric_columns(df, &check.extras)?;
            let loaded = load_observations(df, &metric_columns)?;
            (
                Dataset::Observations(loaded.observations),
                metric_columns,
                loaded.skipped_rows,
            )
        }
    };
    let ignored_columns = check
        .extras
        .iter()
        .filter(|col| !metric_columns.contains(col))
        .cloned()
        .collect();

    Ok(Upload {
        dataset,
        check,
        ignored_columns,
        metric_columns,
        skipped_rows,
    })
}
