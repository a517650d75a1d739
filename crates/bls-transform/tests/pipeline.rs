//! End-to-end tests for the analysis pipeline.

use std::collections::BTreeMap;

use bls_model::{
    Arm, ArmSummary, Dataset, Descriptors, InsufficientReason, Observation, StudyRow, Thresholds,
    Verdict,
};
use bls_transform::{
    AnalysisOptions, MetricSource, RowSelector, TransformError, ViewFilter, analyze,
    kpi_breakdown, select_row, summarize,
};

fn descriptors(kpi: &str, market: &str) -> Descriptors {
    Descriptors {
        study_id: None,
        period: Some("Jan 2024".to_string()),
        market: Some(market.to_string()),
        category: Some("Snacks".to_string()),
        kpi: Some(kpi.to_string()),
    }
}

fn study_row(brand: &str, kpi: &str, order: Option<i64>, control: (u64, f64), exposed: (u64, f64)) -> StudyRow {
    StudyRow {
        row: 0,
        brand: brand.to_string(),
        descriptors: descriptors(kpi, "UK"),
        kpi_order: order,
        control: ArmSummary {
            sample: Some(control.0),
            score: Some(control.1),
        },
        exposed: ArmSummary {
            sample: Some(exposed.0),
            score: Some(exposed.1),
        },
    }
}

fn observation(brand: &str, arm: Arm, metric: f64, recall: Option<f64>) -> Observation {
    let mut extra_metrics = BTreeMap::new();
    if let Some(recall) = recall {
        extra_metrics.insert("Recall".to_string(), recall);
    }
    Observation {
        row: 0,
        brand: brand.to_string(),
        arm,
        metric,
        descriptors: descriptors("Awareness", "UK"),
        extra_metrics,
    }
}

/// `count` observations of `arm`, the first `ones` of them equal to 1.
fn binary_arm(brand: &str, arm: Arm, count: usize, ones: usize) -> Vec<Observation> {
    (0..count)
        .map(|i| observation(brand, arm, if i < ones { 1.0 } else { 0.0 }, Some(i as f64)))
        .collect()
}

fn summary_dataset() -> Dataset {
    Dataset::Summary(vec![
        study_row("Acme", "Awareness", Some(2), (1000, 0.40), (1000, 0.48)),
        study_row("Zeta", "Awareness", Some(2), (400, 0.30), (410, 0.31)),
        study_row("Acme", "Consideration", Some(1), (1000, 0.20), (1000, 0.19)),
    ])
}

#[test]
fn aliases_follow_first_appearance() {
    let analysis = analyze(&summary_dataset(), &Thresholds::default(), &AnalysisOptions::default())
        .unwrap();

    assert_eq!(analysis.aliases.brand_of("Brand A"), Some("Acme"));
    assert_eq!(analysis.aliases.brand_of("Brand B"), Some("Zeta"));
    let aliases: Vec<_> = analysis.results.iter().map(|r| r.key.alias.as_str()).collect();
    assert_eq!(aliases, vec!["Brand A", "Brand B", "Brand A"]);

    let Dataset::Summary(rows) = &analysis.dataset else {
        panic!("expected summary rows");
    };
    assert!(rows.iter().all(|row| row.brand.starts_with("Brand ")));
}

#[test]
fn clear_lift_reads_as_headline() {
    let analysis = analyze(&summary_dataset(), &Thresholds::default(), &AnalysisOptions::default())
        .unwrap();

    let first = analysis.results[0].assessment().unwrap();
    assert!(first.stats.significant);
    assert!((first.stats.lift_pct() - 20.0).abs() < 1e-9);
    assert_eq!(first.insight.verdict, Verdict::ClearUp);
    assert_eq!(
        first.insight.decision,
        "Safe to cite as evidence. Use it to justify the next decision."
    );

    let second = analysis.results[1].assessment().unwrap();
    assert!(!second.stats.significant);
    assert_eq!(second.insight.verdict, Verdict::NoClear);
}

#[test]
fn empty_upload_is_rejected() {
    let err = analyze(
        &Dataset::Observations(Vec::new()),
        &Thresholds::default(),
        &AnalysisOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, TransformError::EmptyDataset));
}

#[test]
fn brand_without_control_only_affects_itself() {
    let mut observations = binary_arm("Acme", Arm::Control, 200, 60);
    observations.extend(binary_arm("Acme", Arm::Exposed, 200, 90));
    observations.extend(binary_arm("Zeta", Arm::Exposed, 150, 50));

    let analysis = analyze(
        &Dataset::Observations(observations),
        &Thresholds::default(),
        &AnalysisOptions::default(),
    )
    .unwrap();

    assert_eq!(analysis.results.len(), 2);
    let acme = &analysis.results[0];
    assert!(acme.stats().is_some());
    assert_eq!(acme.control.unwrap().n, 200);

    let zeta = analysis.results[1].warning().unwrap();
    assert_eq!(zeta.label, "Brand B | Awareness | Jan 2024");
    assert_eq!(zeta.reason, InsufficientReason::MissingArm { arm: Arm::Control });
    assert_eq!(analysis.warnings().count(), 1);
}

#[test]
fn reprojection_uses_the_alternate_metric() {
    let mut observations = binary_arm("Acme", Arm::Control, 40, 10);
    observations.extend(binary_arm("Acme", Arm::Exposed, 40, 20));
    let analysis = analyze(
        &Dataset::Observations(observations),
        &Thresholds::default(),
        &AnalysisOptions::default(),
    )
    .unwrap();
    assert_eq!(analysis.metric_columns(), vec!["Recall"]);

    let recall = analysis
        .reproject(
            MetricSource::Column("Recall".to_string()),
            &Thresholds::default(),
            true,
        )
        .unwrap();
    assert_eq!(recall.len(), 1);
    assert_eq!(recall[0].metric, "Recall");
    assert_eq!(recall[0].key.kpi, "Recall");
    // Both arms hold 0..40, so nothing moved.
    let stats = recall[0].stats().unwrap();
    assert!(!stats.is_proportion());
    assert!(stats.difference.abs() < 1e-12);

    let err = analysis
        .reproject(MetricSource::Column("Reach".to_string()), &Thresholds::default(), true)
        .unwrap_err();
    assert!(matches!(err, TransformError::UnknownMetric { .. }));
}

#[test]
fn kpi_breakdown_respects_kpi_order() {
    let analysis = analyze(&summary_dataset(), &Thresholds::default(), &AnalysisOptions::default())
        .unwrap();
    let breakdown = kpi_breakdown(&analysis.results);

    let kpis: Vec<_> = breakdown.iter().map(|k| k.kpi.as_str()).collect();
    assert_eq!(kpis, vec!["Consideration", "Awareness"]);
    let awareness = &breakdown[1];
    assert_eq!(awareness.rows, 2);
    assert_eq!(awareness.clear, 1);
    assert_eq!(awareness.top_alias.as_deref(), Some("Brand A"));
}

#[test]
fn filters_and_selection() {
    let analysis = analyze(&summary_dataset(), &Thresholds::default(), &AnalysisOptions::default())
        .unwrap();

    let by_real_name = ViewFilter {
        brands: vec!["Zeta".to_string()],
        ..ViewFilter::default()
    };
    let view = by_real_name.apply(&analysis.results, &analysis.aliases).unwrap();
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].key.alias, "Brand B");

    let definitive = ViewFilter {
        definitive_only: true,
        ..ViewFilter::default()
    };
    let view = definitive.apply(&analysis.results, &analysis.aliases).unwrap();
    assert!(view.iter().all(|r| r.is_significant()));

    let nowhere = ViewFilter {
        markets: vec!["FR".to_string()],
        ..ViewFilter::default()
    };
    let err = nowhere.apply(&analysis.results, &analysis.aliases).unwrap_err();
    assert_eq!(err.to_string(), "no rows match the current filters");

    let row = select_row(
        &analysis.results,
        &RowSelector::parse("Brand A | Consideration | Jan 2024"),
    )
    .unwrap();
    assert_eq!(row.key.kpi, "Consideration");
    assert!(select_row(&analysis.results, &RowSelector::Index(4)).is_err());

    let summary = summarize(&analysis.results);
    assert_eq!(summary.rows, 3);
    assert_eq!(summary.insufficient, 0);
    assert!(summary.average_lift_pct.is_some());
}
