//! Typed record extraction from a validated DataFrame.

use std::collections::BTreeMap;

use polars::prelude::DataFrame;
use tracing::warn;

use bls_model::columns::{
    BRAND, CATEGORY, CONTROL_SAMPLE, CONTROL_SCORE, EXPOSED_SAMPLE, EXPOSED_SCORE, GROUP, KPI,
    KPI_ORDER, MARKET, METRIC, MONTH_YEAR, STUDY_ID,
};
use bls_model::{Arm, ArmSummary, Descriptors, Observation, StudyRow};

use crate::error::{IngestError, Result};
use crate::values::{parse_number, parse_order, parse_sample, parse_score, text_column};

struct DescriptorColumns {
    study_id: Vec<Option<String>>,
    period: Vec<Option<String>>,
    market: Vec<Option<String>>,
    category: Vec<Option<String>>,
    kpi: Vec<Option<String>>,
}

impl DescriptorColumns {
    fn read(df: &DataFrame) -> Result<Self> {
        Ok(Self {
            study_id: text_column(df, STUDY_ID)?,
            period: text_column(df, MONTH_YEAR)?,
            market: text_column(df, MARKET)?,
            category: text_column(df, CATEGORY)?,
            kpi: text_column(df, KPI)?,
        })
    }

    fn at(&self, idx: usize) -> Descriptors {
        Descriptors {
            study_id: self.study_id[idx].clone(),
            period: self.period[idx].clone(),
            market: self.market[idx].clone(),
            category: self.category[idx].clone(),
            kpi: self.kpi[idx].clone(),
        }
    }
}

fn brand_at(brands: &[Option<String>], idx: usize) -> Result<String> {
    brands[idx]
        .clone()
        .ok_or(IngestError::MissingBrand { row: idx + 1 })
}

/// Reads summary-layout rows. Unreadable samples and scores stay `None`.
pub fn load_study_rows(df: &DataFrame) -> Result<Vec<StudyRow>> {
    let brands = text_column(df, BRAND)?;
    let descriptors = DescriptorColumns::read(df)?;
    let kpi_order = text_column(df, KPI_ORDER)?;
    let control_sample = text_column(df, CONTROL_SAMPLE)?;
    let exposed_sample = text_column(df, EXPOSED_SAMPLE)?;
    let control_score = text_column(df, CONTROL_SCORE)?;
    let exposed_score = text_column(df, EXPOSED_SCORE)?;

    let mut rows = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let sample = |column: &[Option<String>]| column[idx].as_deref().and_then(parse_sample);
        let score = |column: &[Option<String>]| column[idx].as_deref().and_then(parse_score);
        rows.push(StudyRow {
            row: idx + 1,
            brand: brand_at(&brands, idx)?,
            descriptors: descriptors.at(idx),
            kpi_order: kpi_order[idx].as_deref().and_then(parse_order),
            control: ArmSummary {
                sample: sample(&control_sample),
                score: score(&control_score),
            },
            exposed: ArmSummary {
                sample: sample(&exposed_sample),
                score: score(&exposed_score),
            },
        });
    }
    Ok(rows)
}

/// Observation rows plus the rows skipped for a blank metric.
#[derive(Debug, Clone, Default)]
pub struct LoadedObservations {
    pub observations: Vec<Observation>,
    pub skipped_rows: Vec<usize>,
}

/// Reads observation-layout rows.
///
/// `metric_columns` are extra columns kept as alternate KPI metrics; every
/// non-blank cell in them must be numeric.
pub fn load_observations(df: &DataFrame, metric_columns: &[String]) -> Result<LoadedObservations> {
    let brands = text_column(df, BRAND)?;
    let groups = text_column(df, GROUP)?;
    let metrics = text_column(df, METRIC)?;
    let descriptors = DescriptorColumns::read(df)?;
    let extras = metric_columns
        .iter()
        .map(|name| Ok((name.clone(), text_column(df, name)?)))
        .collect::<Result<Vec<_>>>()?;

    let mut loaded = LoadedObservations::default();
    for idx in 0..df.height() {
        let row = idx + 1;
        let brand = brand_at(&brands, idx)?;
        let group = groups[idx].clone().unwrap_or_default();
        let arm = Arm::parse(&group).ok_or(IngestError::UnknownGroup { row, value: group })?;
        let Some(raw_metric) = metrics[idx].as_deref() else {
            warn!(row, "skipping observation with blank metric");
            loaded.skipped_rows.push(row);
            continue;
        };
        let metric = parse_number(raw_metric).ok_or_else(|| IngestError::InvalidNumber {
            row,
            column: METRIC.to_string(),
            value: raw_metric.to_string(),
        })?;
        let mut extra_metrics = BTreeMap::new();
        for (name, column) in &extras {
            let Some(raw) = column[idx].as_deref() else {
                continue;
            };
            let value = parse_number(raw).ok_or_else(|| IngestError::InvalidNumber {
                row,
                column: name.clone(),
                value: raw.to_string(),
            })?;
            extra_metrics.insert(name.clone(), value);
        }
        loaded.observations.push(Observation {
            row,
            brand,
            arm,
            metric,
            descriptors: descriptors.at(idx),
            extra_metrics,
        });
    }
    Ok(loaded)
}

/// Extra columns whose non-blank cells all parse as numbers.
pub fn numeric_columns(df: &DataFrame, candidates: &[String]) -> Result<Vec<String>> {
    let mut numeric = Vec::new();
    for name in candidates {
        let values = text_column(df, name)?;
        let mut filled = values.iter().flatten().peekable();
        if filled.peek().is_none() {
            continue;
        }
        if filled.all(|value| parse_number(value).is_some()) {
            numeric.push(name.clone());
        }
    }
    Ok(numeric)
}

#[cfg(test)]
mod tests {
    use polars::prelude::{Column, IntoColumn, NamedFrom, Series};

    use super::*;

    fn frame(columns: Vec<(&str, Vec<&str>)>) -> DataFrame {
        let cols: Vec<Column> = columns
            .into_iter()
            .map(|(name, values)| {
                let values: Vec<Option<String>> = values
                    .into_iter()
                    .map(|v| (!v.is_empty()).then(|| v.to_string()))
                    .collect();
                Series::new(name.into(), values).into_column()
            })
            .collect();
        DataFrame::new(cols).unwrap()
    }

    #[test]
    fn study_rows_keep_unreadable_cells_as_none() {
        let df = frame(vec![
            ("Brand", vec!["Acme"]),
            ("KPI", vec!["Awareness"]),
            ("Control Sample", vec!["n/a"]),
            ("Exposed Sample", vec!["410"]),
            ("Control Score", vec!["40%"]),
            ("Exposed Score", vec![""]),
        ]);
        let rows = load_study_rows(&df).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].control.sample, None);
        assert_eq!(rows[0].exposed.sample, Some(410));
        assert_eq!(rows[0].control.score, Some(0.4));
        assert_eq!(rows[0].exposed.score, None);
        assert_eq!(rows[0].descriptors.kpi.as_deref(), Some("Awareness"));
        assert_eq!(rows[0].descriptors.market, None);
    }

    #[test]
    fn blank_brand_is_rejected() {
        let df = frame(vec![("Brand", vec!["Acme", ""])]);
        let err = load_study_rows(&df).unwrap_err();
        assert!(matches!(err, IngestError::MissingBrand { row: 2 }));
    }

    #[test]
    fn observations_skip_blank_metrics_and_reject_text() {
        let df = frame(vec![
            ("Brand", vec!["Acme", "Acme"]),
            ("Group", vec!["exposed", "control"]),
            ("Metric", vec!["1", ""]),
        ]);
        let loaded = load_observations(&df, &[]).unwrap();
        assert_eq!(loaded.observations.len(), 1);
        assert_eq!(loaded.skipped_rows, vec![2]);

        let bad = frame(vec![
            ("Brand", vec!["Acme"]),
            ("Group", vec!["exposed"]),
            ("Metric", vec!["high"]),
        ]);
        let err = load_observations(&bad, &[]).unwrap_err();
        assert!(matches!(err, IngestError::InvalidNumber { row: 1, .. }));
    }

    #[test]
    fn unknown_group_is_rejected() {
        let df = frame(vec![
            ("Brand", vec!["Acme"]),
            ("Group", vec!["pilot"]),
            ("Metric", vec!["1"]),
        ]);
        let err = load_observations(&df, &[]).unwrap_err();
        assert!(matches!(err, IngestError::UnknownGroup { row: 1, .. }));
    }

    #[test]
    fn numeric_extras_are_detected() {
        let df = frame(vec![
            ("Recall", vec!["1", "", "0"]),
            ("Notes", vec!["ok", "", "3"]),
            ("Empty", vec!["", "", ""]),
        ]);
        let names = vec!["Recall".to_string(), "Notes".to_string(), "Empty".to_string()];
        assert_eq!(numeric_columns(&df, &names).unwrap(), vec!["Recall"]);
    }
}
