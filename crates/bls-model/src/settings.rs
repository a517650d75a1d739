//! Run settings, optionally loaded from a TOML file.
//!
//! ```toml
//! [thresholds]
//! alpha = 0.1
//!
//! [input]
//! strict = true
//!
//! [report]
//! title = "Q3 brand lift"
//! scope = "all"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::thresholds::Thresholds;

/// Default report title.
pub const DEFAULT_REPORT_TITLE: &str = "BLS Brief";

/// Detail pages are capped to keep exports small.
pub const DEFAULT_MAX_DETAIL_PAGES: usize = 25;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub thresholds: Thresholds,
    pub input: InputSettings,
    pub report: ReportSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    /// Reject uploads carrying columns outside the input surface.
    pub strict: bool,
}

/// Which rows go into the PDF.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportScope {
    /// Every row in the current view.
    #[default]
    All,
    /// Only the row chosen for the deep dive.
    Selected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub title: String,
    pub scope: ExportScope,
    /// Draw the ranked-lift and lift-vs-confidence charts.
    pub include_comparisons: bool,
    /// Keep "possible" and "no clear change" labels on non-significant rows.
    pub include_non_definitive: bool,
    pub max_detail_pages: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            title: DEFAULT_REPORT_TITLE.to_string(),
            scope: ExportScope::default(),
            include_comparisons: true,
            include_non_definitive: true,
            max_detail_pages: DEFAULT_MAX_DETAIL_PAGES,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file. Missing keys fall back to defaults.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Self = toml::from_str(&content).map_err(|source| SettingsError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.thresholds.validate()?;
        if self.report.title.trim().is_empty() {
            return Err(SettingsError::invalid("report.title", "must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[thresholds]\nalpha = 0.1\n\n[report]\nscope = \"selected\"\n").unwrap();

        let settings = Settings::load_from(file.path()).unwrap();

        assert!((settings.thresholds.alpha - 0.1).abs() < 1e-12);
        assert_eq!(settings.thresholds.min_n_warn, 120);
        assert_eq!(settings.report.scope, ExportScope::Selected);
        assert_eq!(settings.report.title, DEFAULT_REPORT_TITLE);
        assert!(!settings.input.strict);
    }

    #[test]
    fn invalid_alpha_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[thresholds]\nalpha = 1.5\n").unwrap();

        let err = Settings::load_from(file.path()).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { .. }));
    }

    #[test]
    fn malformed_toml_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[thresholds\n").unwrap();

        let err = Settings::load_from(file.path()).unwrap_err();
        assert!(matches!(err, SettingsError::Toml { .. }));
    }
}
