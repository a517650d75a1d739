//! The `analyze` run: ingest, alias, score, filter, select and export.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, info_span};

use bls_ingest::{IngestOptions, ingest};
use bls_model::{ExportScope, InputLayout, LiftResult, Settings};
use bls_report::{Report, ReportOptions, export_pdf};
use bls_transform::{
    Analysis, AnalysisOptions, KpiSummary, MetricSource, RowSelector, ViewFilter, ViewSummary,
    analyze, kpi_breakdown, select_row, summarize,
};

use crate::logging::redact_value;

/// Everything needed to produce one brief.
#[derive(Debug, Clone)]
pub struct BriefRequest {
    pub input: PathBuf,
    pub settings: Settings,
    pub filter: ViewFilter,
    pub metric: MetricSource,
    pub row: Option<RowSelector>,
    pub by_kpi: bool,
}

impl BriefRequest {
    pub fn new(input: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            input: input.into(),
            settings,
            filter: ViewFilter::default(),
            metric: MetricSource::Primary,
            row: None,
            by_kpi: false,
        }
    }
}

/// What the upload looked like once validated.
#[derive(Debug, Clone)]
pub struct UploadInfo {
    pub layout: InputLayout,
    pub rows: usize,
    pub ignored_columns: Vec<String>,
    pub metric_columns: Vec<String>,
    pub skipped_rows: Vec<usize>,
}

/// Results of one run, ready to print or export.
#[derive(Debug, Clone)]
pub struct Brief {
    pub upload: UploadInfo,
    pub analysis: Analysis,
    /// Results left after the filters.
    pub view: Vec<LiftResult>,
    pub summary: ViewSummary,
    pub selected: Option<LiftResult>,
    pub breakdown: Option<Vec<KpiSummary>>,
}

impl Brief {
    /// Rows that go into the export for `scope`.
    pub fn export_rows(&self, scope: ExportScope) -> Result<&[LiftResult]> {
        match scope {
            ExportScope::All => Ok(&self.view),
            ExportScope::Selected => match &self.selected {
                Some(row) => Ok(std::slice::from_ref(row)),
                None => bail!("export scope 'selected' needs a row; pass --row"),
            },
        }
    }

    pub fn has_warnings(&self) -> bool {
        self.view.iter().any(|result| result.warning().is_some())
    }
}

/// Runs the analysis for `request`.
///
/// Input-level problems abort with an error. Comparisons without enough
/// data stay in the view with their warning.
pub fn build_brief(request: &BriefRequest) -> Result<Brief> {
    let settings = &request.settings;
    settings.validate().context("invalid settings")?;
    let options = IngestOptions {
        strict: settings.input.strict,
    };
    let upload = ingest(&request.input, &options)
        .with_context(|| format!("read upload {}", request.input.display()))?;

    let analysis_options = AnalysisOptions {
        metric: MetricSource::Primary,
        include_non_definitive: settings.report.include_non_definitive,
    };
    let mut analysis = analyze(&upload.dataset, &settings.thresholds, &analysis_options)?;
    for entry in analysis.aliases.entries() {
        debug!(alias = %entry.alias, brand = %redact_value(&entry.brand), "alias assigned");
    }
    if let MetricSource::Column(_) = &request.metric {
        analysis.results = analysis.reproject(
            request.metric.clone(),
            &settings.thresholds,
            settings.report.include_non_definitive,
        )?;
    }

    let view = if request.filter.is_empty() {
        analysis.results.clone()
    } else {
        request.filter.apply(&analysis.results, &analysis.aliases)?
    };
    let summary = summarize(&view);
    let selected = match &request.row {
        Some(selector) => Some(select_row(&view, selector)?.clone()),
        None => None,
    };
    let breakdown = request.by_kpi.then(|| kpi_breakdown(&view));
    info!(
        rows = view.len(),
        clear = summary.clear,
        insufficient = summary.insufficient,
        metric = request.metric.name(),
        "view ready"
    );

    Ok(Brief {
        upload: UploadInfo {
            layout: upload.check.layout,
            rows: upload.dataset.len(),
            ignored_columns: upload.ignored_columns,
            metric_columns: upload.metric_columns,
            skipped_rows: upload.skipped_rows,
        },
        analysis,
        view,
        summary,
        selected,
        breakdown,
    })
}

/// Renders the PDF for the configured scope.
pub fn render_brief(brief: &Brief, settings: &Settings, generated_on: NaiveDate) -> Result<Report> {
    let scope = settings.report.scope;
    let rows = brief.export_rows(scope)?;
    let breakdown = match scope {
        ExportScope::All => brief.breakdown.as_deref(),
        ExportScope::Selected => None,
    };
    let options =
        ReportOptions::from_settings(&settings.report, generated_on, settings.thresholds.alpha);
    let report = export_pdf(rows, breakdown, &options).context("render report")?;
    Ok(report)
}

pub fn write_report(report: &Report, path: &Path) -> Result<()> {
    let span = info_span!("write", path = %path.display());
    let _guard = span.enter();
    fs::write(path, &report.bytes).with_context(|| format!("write {}", path.display()))
}

#[derive(Serialize)]
struct ResultsFile<'a> {
    layout: InputLayout,
    summary: ViewSummary,
    results: &'a [LiftResult],
    #[serde(skip_serializing_if = "Option::is_none")]
    kpis: Option<&'a [KpiSummary]>,
}

/// Writes the view as JSON. Only aliases appear in the file.
pub fn write_results_json(brief: &Brief, path: &Path) -> Result<()> {
    let file = ResultsFile {
        layout: brief.upload.layout,
        summary: brief.summary,
        results: &brief.view,
        kpis: brief.breakdown.as_deref(),
    };
    let json = serde_json::to_string_pretty(&file).context("serialize results")?;
    fs::write(path, json).with_context(|| format!("write {}", path.display()))
}

/// Writes the alias-to-brand mapping as CSV.
pub fn write_alias_map(brief: &Brief, path: &Path) -> Result<()> {
    let csv = brief.analysis.aliases.to_csv()?;
    fs::write(path, csv).with_context(|| format!("write {}", path.display()))
}
