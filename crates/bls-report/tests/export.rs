//! Integration tests for chart validation and PDF export.

use chrono::NaiveDate;

use bls_model::{ArmSummary, Dataset, Descriptors, LiftResult, StudyRow, Thresholds};
use bls_report::{
    RenderError, ReportOptions, Shape, ci_interval_chart, confidence_scatter, dumbbell_chart,
    export_pdf, lift_rank_chart,
};
use bls_transform::{AnalysisOptions, analyze, kpi_breakdown};

fn row(brand: &str, kpi: &str, control: (Option<u64>, f64), exposed: (u64, f64)) -> StudyRow {
    StudyRow {
        row: 0,
        brand: brand.to_string(),
        descriptors: Descriptors {
            study_id: None,
            period: Some("Mar 2024".to_string()),
            market: Some("UK".to_string()),
            category: Some("Snacks".to_string()),
            kpi: Some(kpi.to_string()),
        },
        kpi_order: None,
        control: ArmSummary {
            sample: control.0,
            score: Some(control.1),
        },
        exposed: ArmSummary {
            sample: Some(exposed.0),
            score: Some(exposed.1),
        },
    }
}

fn results(rows: Vec<StudyRow>) -> Vec<LiftResult> {
    analyze(
        &Dataset::Summary(rows),
        &Thresholds::default(),
        &AnalysisOptions::default(),
    )
    .unwrap()
    .results
}

fn sample_results() -> Vec<LiftResult> {
    results(vec![
        row("Acme", "Awareness", (Some(800), 0.40), (820, 0.47)),
        row("Zeta", "Awareness", (Some(300), 0.25), (310, 0.27)),
        row("Acme", "Consideration", (Some(800), 0.22), (820, 0.20)),
        row("Nova", "Awareness", (None, 0.30), (200, 0.35)),
    ])
}

fn options() -> ReportOptions {
    ReportOptions::new(
        "Q1 brand lift",
        NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
    )
}

#[test]
fn full_report_is_a_pdf() {
    let results = sample_results();
    let breakdown = kpi_breakdown(&results);

    let report = export_pdf(&results, Some(&breakdown), &options()).unwrap();

    assert!(report.bytes.starts_with(b"%PDF"));
    assert!(!report.text_only);
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    // Summary page, KPI page and one detail page per row.
    assert!(report.pages >= 6);
}

#[test]
fn detail_pages_are_capped() {
    let results = sample_results();
    let mut capped = options();
    capped.max_detail_pages = 1;

    let full = export_pdf(&results, None, &options()).unwrap();
    let short = export_pdf(&results, None, &capped).unwrap();

    assert_eq!(full.pages - short.pages, 3);
}

#[test]
fn single_row_export_skips_comparisons() {
    let results = sample_results();
    let report = export_pdf(&results[..1], None, &options()).unwrap();
    assert!(report.bytes.starts_with(b"%PDF"));
    assert!(report.warnings.is_empty());
}

#[test]
fn insufficient_rows_degrade_to_text() {
    let results = sample_results();
    let insufficient = &results[3..];
    assert!(insufficient[0].warning().is_some());

    assert!(matches!(
        lift_rank_chart(insufficient, 180.0),
        Err(RenderError::EmptyChart { .. })
    ));
    assert!(matches!(
        dumbbell_chart(&insufficient[0], 180.0),
        Err(RenderError::EmptyChart { .. })
    ));

    let mut unchartable = options();
    unchartable.include_comparisons = true;
    let with_blank = vec![insufficient[0].clone(), insufficient[0].clone()];
    let report = export_pdf(&with_blank, None, &unchartable).unwrap();
    assert!(report.bytes.starts_with(b"%PDF"));
    assert_eq!(report.warnings.len(), 2);
}

#[test]
fn scatter_needs_two_points() {
    let results = sample_results();
    assert!(confidence_scatter(&results[..1], 0.05, 180.0).is_err());
    let figure = confidence_scatter(&results, 0.05, 180.0).unwrap();
    let markers = figure
        .shapes
        .iter()
        .filter(|shape| matches!(shape, Shape::Marker { .. }))
        .count();
    assert_eq!(markers, 3);
}

#[test]
fn non_finite_values_are_rejected() {
    let mut results = sample_results();
    if let Ok(assessment) = results[0].outcome.as_mut() {
        assessment.stats.ci_high = f64::NAN;
    }
    assert_eq!(
        ci_interval_chart(&results[0], 180.0).unwrap_err(),
        RenderError::NonFinite {
            chart: "confidence interval",
            field: "interval"
        }
    );
}

#[test]
fn rank_chart_draws_one_bar_per_scored_row() {
    let results = sample_results();
    let figure = lift_rank_chart(&results, 180.0).unwrap();
    let bars = figure
        .shapes
        .iter()
        .filter(|shape| matches!(shape, Shape::Rect { .. }))
        .count();
    assert_eq!(bars, 3);
    assert!(figure.shapes.iter().all(|shape| match shape {
        Shape::Rect { width, height, .. } => *width >= 0.0 && *height >= 0.0,
        _ => true,
    }));
}
