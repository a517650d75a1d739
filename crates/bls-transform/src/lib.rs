//! Brand-lift transformation stage.
//!
//! - **alias**: first-appearance pseudonyms (`Brand A`, `Brand B`, ...)
//! - **arms**: exposed/control aggregation into comparisons
//! - **lift**: two-proportion z-test and Welch's t-test
//! - **insight**: verdicts and note lines
//! - **kpi**: KPI breakdown
//! - **view**: filters, row selection and summary
//! - **pipeline**: the end-to-end [`analyze`] entry point

pub mod alias;
pub mod arms;
pub mod error;
pub mod insight;
pub mod kpi;
pub mod lift;
pub mod pipeline;
pub mod view;

pub use alias::{AliasEntry, AliasMap, alias_label, assign_aliases};
pub use arms::{Comparison, MetricSource, observation_comparisons, summary_comparisons};
pub use bls_model::{InsufficientDataError, InsufficientReason};
pub use error::{Result, TransformError};
pub use insight::{build_insight, incomplete_lines, verdict};
pub use kpi::{KpiSummary, kpi_breakdown};
pub use lift::{compute_lift, data_flag, z_critical};
pub use pipeline::{Analysis, AnalysisOptions, analyze, compute_results};
pub use view::{RowSelector, ViewFilter, ViewSummary, select_row, summarize};
