//! Input column surface for both accepted upload layouts.

use serde::{Deserialize, Serialize};

pub const MONTH_YEAR: &str = "Month Year";
pub const BRAND: &str = "Brand";
pub const CATEGORY: &str = "Category";
pub const MARKET: &str = "Market";
pub const KPI: &str = "KPI";
pub const CONTROL_SAMPLE: &str = "Control Sample";
pub const EXPOSED_SAMPLE: &str = "Exposed Sample";
pub const CONTROL_SCORE: &str = "Control Score";
pub const EXPOSED_SCORE: &str = "Exposed Score";
pub const STUDY_ID: &str = "Study ID";
pub const KPI_ORDER: &str = "KPI Order";
pub const GROUP: &str = "Group";
pub const ARM: &str = "Arm";
pub const METRIC: &str = "Metric";

/// Descriptor and sample columns every summary upload must carry.
pub const REQUIRED_BASE_COLS: &[&str] = &[
    MONTH_YEAR,
    BRAND,
    CATEGORY,
    MARKET,
    KPI,
    CONTROL_SAMPLE,
    EXPOSED_SAMPLE,
];

/// Score columns every summary upload must carry.
pub const REQUIRED_SCORE_COLS: &[&str] = &[CONTROL_SCORE, EXPOSED_SCORE];

pub const OPTIONAL_SUMMARY_COLS: &[&str] = &[STUDY_ID, KPI_ORDER];

/// Columns every observation upload must carry. The group column may be
/// spelled `Group` or `Arm`.
pub const REQUIRED_OBSERVATION_COLS: &[&str] = &[BRAND, GROUP, METRIC];

pub const OPTIONAL_OBSERVATION_COLS: &[&str] = &[KPI, MONTH_YEAR, MARKET, CATEGORY, STUDY_ID];

/// Shape of an uploaded table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputLayout {
    /// One pre-aggregated row per brand/KPI/period with both arms side by side.
    #[default]
    Summary,
    /// One row per respondent or measurement with an explicit group column.
    Observations,
}

impl InputLayout {
    pub fn label(self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Observations => "observations",
        }
    }

    /// Every column accepted for this layout, in template order.
    pub fn allowed_columns(self) -> Vec<&'static str> {
        match self {
            Self::Summary => REQUIRED_BASE_COLS
                .iter()
                .chain(REQUIRED_SCORE_COLS)
                .chain(OPTIONAL_SUMMARY_COLS)
                .copied()
                .collect(),
            Self::Observations => REQUIRED_OBSERVATION_COLS
                .iter()
                .chain(OPTIONAL_OBSERVATION_COLS)
                .copied()
                .collect(),
        }
    }
}

/// Returns the canonical spelling of a known column, ignoring case.
///
/// `Arm` is folded onto `Group` so downstream code only handles one name.
pub fn canonical_column(name: &str) -> Option<&'static str> {
    if name.eq_ignore_ascii_case(ARM) {
        return Some(GROUP);
    }
    REQUIRED_BASE_COLS
        .iter()
        .chain(REQUIRED_SCORE_COLS)
        .chain(OPTIONAL_SUMMARY_COLS)
        .chain(REQUIRED_OBSERVATION_COLS)
        .chain(OPTIONAL_OBSERVATION_COLS)
        .copied()
        .find(|known| known.eq_ignore_ascii_case(name))
}
