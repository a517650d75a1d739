//! Brand-lift study data model.
//!
//! Shared by every stage of the pipeline: typed input records, alias-ready
//! traits, lift results with their per-comparison errors, thresholds and
//! run settings.

pub mod columns;
pub mod definitions;
pub mod error;
pub mod lift;
pub mod record;
pub mod settings;
pub mod thresholds;

pub use columns::{InputLayout, canonical_column};
pub use definitions::METRIC_DEFINITIONS;
pub use error::SettingsError;
pub use lift::{
    ArmKind, ArmStats, Assessment, DataFlag, EffectBand, Insight, InsufficientDataError,
    InsufficientReason, LiftResult, LiftStats, TestKind, Verdict,
};
pub use record::{
    Arm, ArmSummary, Branded, CellKey, Dataset, Descriptors, Observation, StudyRow,
};
pub use settings::{ExportScope, InputSettings, ReportSettings, Settings};
pub use thresholds::Thresholds;
