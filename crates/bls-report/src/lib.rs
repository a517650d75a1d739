//! Brand-lift brief export.
//!
//! Renders a results view into an A4 PDF with built-in Helvetica:
//!
//! - **Charts**: lift ranking, lift vs confidence, control vs exposed,
//!   confidence interval and KPI breakdown, built as backend-free figures
//! - **Layout**: header, summary cards, paginated table, warnings and
//!   capped detail pages
//! - **Fallback**: charts that cannot be drawn become text; a failed
//!   layout falls back to a text-only report

mod canvas;
mod chart;
mod error;
mod format;
mod layout;

pub use chart::{
    Figure, Rgb, Shape, ci_interval_chart, confidence_scatter, dumbbell_chart, kpi_lift_chart,
    lift_rank_chart,
};
pub use error::{RenderError, Result};
pub use format::{format_confidence, format_optional_pct, format_pct, verdict_text};
pub use layout::{Report, ReportOptions, export_pdf};
