//! Tests for bls-model types.

use bls_model::{
    Arm, ArmStats, CellKey, InsufficientDataError, InsufficientReason, LiftResult,
    METRIC_DEFINITIONS, Settings,
};

fn key(alias: &str) -> CellKey {
    CellKey {
        alias: alias.to_string(),
        kpi: "Awareness".to_string(),
        period: "Jan 2024".to_string(),
        ..CellKey::default()
    }
}

#[test]
fn insufficient_result_serializes_with_reason() {
    let result = LiftResult {
        key: key("Brand B"),
        kpi_order: None,
        metric: "Metric".to_string(),
        control: None,
        exposed: Some(ArmStats::proportion(200, 0.4)),
        outcome: Err(InsufficientDataError {
            label: "Brand B | Awareness | Jan 2024".to_string(),
            reason: InsufficientReason::MissingArm { arm: Arm::Control },
        }),
    };

    let json = serde_json::to_value(&result).expect("serialize result");

    assert_eq!(json["key"]["alias"], "Brand B");
    assert_eq!(json["outcome"]["Err"]["reason"]["reason"], "missing_arm");
    assert_eq!(json["outcome"]["Err"]["reason"]["arm"], "control");
    assert!(result.warning().is_some());
    assert!(!result.is_significant());
}

#[test]
fn proportion_arm_has_binomial_variance() {
    let arm = ArmStats::proportion(100, 0.25);
    assert!((arm.variance - 0.1875).abs() < 1e-12);
}

#[test]
fn default_settings_validate() {
    let settings = Settings::default();
    assert!(settings.validate().is_ok());
    assert!(settings.report.include_comparisons);
}

#[test]
fn every_results_column_has_a_definition() {
    for column in ["Lift", "Confidence", "Verdict", "Data flag"] {
        assert!(
            METRIC_DEFINITIONS.iter().any(|(name, _)| *name == column),
            "{column}"
        );
    }
}
