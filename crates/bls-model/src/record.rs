//! Typed records produced by ingestion.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::columns::InputLayout;

/// Study arm of an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arm {
    Control,
    Exposed,
}

impl Arm {
    /// Parses a group label, accepting the common synonyms for each arm.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "control" | "baseline" | "holdout" | "control group" => Some(Self::Control),
            "exposed" | "exposure" | "test" | "treatment" | "exposed group" => Some(Self::Exposed),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Control => "Control",
            Self::Exposed => "Exposed",
        }
    }
}

impl fmt::Display for Arm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Anything carrying a brand name that can be swapped for an alias.
pub trait Branded {
    fn brand(&self) -> &str;
    fn set_brand(&mut self, brand: String);
}

/// Descriptive columns shared by both layouts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptors {
    pub study_id: Option<String>,
    pub period: Option<String>,
    pub market: Option<String>,
    pub category: Option<String>,
    pub kpi: Option<String>,
}

/// One row of the observation layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// 1-based data row number in the uploaded file.
    pub row: usize,
    pub brand: String,
    pub arm: Arm,
    pub metric: f64,
    pub descriptors: Descriptors,
    /// Additional numeric columns, usable as alternate KPI metrics.
    pub extra_metrics: BTreeMap<String, f64>,
}

impl Branded for Observation {
    fn brand(&self) -> &str {
        &self.brand
    }

    fn set_brand(&mut self, brand: String) {
        self.brand = brand;
    }
}

/// One arm of a pre-aggregated study row. Unreadable cells stay `None` so
/// the calculator can flag the row instead of aborting the upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ArmSummary {
    pub sample: Option<u64>,
    /// Proportion in [0, 1] when in range.
    pub score: Option<f64>,
}

/// One row of the summary layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyRow {
    pub row: usize,
    pub brand: String,
    pub descriptors: Descriptors,
    pub kpi_order: Option<i64>,
    pub control: ArmSummary,
    pub exposed: ArmSummary,
}

impl Branded for StudyRow {
    fn brand(&self) -> &str {
        &self.brand
    }

    fn set_brand(&mut self, brand: String) {
        self.brand = brand;
    }
}

/// Typed upload, one variant per input layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "layout", content = "records")]
pub enum Dataset {
    Summary(Vec<StudyRow>),
    Observations(Vec<Observation>),
}

impl Dataset {
    pub fn layout(&self) -> InputLayout {
        match self {
            Self::Summary(_) => InputLayout::Summary,
            Self::Observations(_) => InputLayout::Observations,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Summary(rows) => rows.len(),
            Self::Observations(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Identity of one exposed-vs-control comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellKey {
    pub alias: String,
    pub kpi: String,
    pub period: String,
    pub market: String,
    pub category: String,
    pub study_id: String,
}

impl CellKey {
    pub fn from_descriptors(alias: &str, descriptors: &Descriptors) -> Self {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        Self {
            alias: alias.to_string(),
            kpi: text(&descriptors.kpi),
            period: text(&descriptors.period),
            market: text(&descriptors.market),
            category: text(&descriptors.category),
            study_id: text(&descriptors.study_id),
        }
    }

    /// Row label used by the deep-dive selector, e.g. `Brand A | Awareness | Jan 2024`.
    pub fn label(&self) -> String {
        let mut parts = vec![self.alias.as_str()];
        if !self.kpi.is_empty() {
            parts.push(self.kpi.as_str());
        }
        if !self.period.is_empty() {
            parts.push(self.period.as_str());
        }
        parts.join(" | ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arm_parses_synonyms() {
        assert_eq!(Arm::parse(" Exposed "), Some(Arm::Exposed));
        assert_eq!(Arm::parse("TEST"), Some(Arm::Exposed));
        assert_eq!(Arm::parse("holdout"), Some(Arm::Control));
        assert_eq!(Arm::parse("other"), None);
    }

    #[test]
    fn cell_label_skips_blank_parts() {
        let key = CellKey {
            alias: "Brand A".to_string(),
            kpi: "Awareness".to_string(),
            ..CellKey::default()
        };
        assert_eq!(key.label(), "Brand A | Awareness");
    }
}
