//! Error types for report rendering.

use thiserror::Error;

/// A chart or document that could not be drawn.
///
/// Chart errors are collected as warnings and replaced by a text line;
/// a `Pdf` error from the full layout triggers the text-only fallback.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("{chart}: nothing to draw")]
    EmptyChart { chart: &'static str },

    #[error("{chart}: {field} is not a finite number")]
    NonFinite {
        chart: &'static str,
        field: &'static str,
    },

    #[error("{chart}: {reason}")]
    DegenerateData { chart: &'static str, reason: String },

    #[error("PDF rendering failed: {message}")]
    Pdf { message: String },
}

impl RenderError {
    pub(crate) fn degenerate(chart: &'static str, reason: impl Into<String>) -> Self {
        Self::DegenerateData {
            chart,
            reason: reason.into(),
        }
    }

    pub(crate) fn pdf(err: impl std::fmt::Debug) -> Self {
        Self::Pdf {
            message: format!("{err:?}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, RenderError>;
