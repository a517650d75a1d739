use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use comfy_table::Table;
use tracing::{info, info_span, warn};

use bls_cli::pipeline::{
    Brief, BriefRequest, build_brief, render_brief, write_alias_map, write_report,
    write_results_json,
};
use bls_ingest::template_csv;
use bls_model::{ExportScope, InputLayout, METRIC_DEFINITIONS, Settings};
use bls_report::Report;
use bls_transform::{MetricSource, RowSelector, ViewFilter};

use crate::cli::{AnalyzeArgs, LayoutArg, ScopeArg, TemplateArgs};
use crate::summary::apply_table_style;

/// A finished `analyze` run.
pub struct AnalyzeOutcome {
    pub input: PathBuf,
    pub brief: Brief,
    pub export: Option<(PathBuf, Report)>,
    pub show_definitions: bool,
}

pub fn run_analyze(args: &AnalyzeArgs) -> Result<AnalyzeOutcome> {
    let span = info_span!("analyze");
    let _guard = span.enter();
    let settings = settings_from_args(args)?;

    let request = BriefRequest {
        input: args.file.clone(),
        filter: ViewFilter {
            markets: args.markets.clone(),
            categories: args.categories.clone(),
            brands: args.brands.clone(),
            kpis: args.kpis.clone(),
            definitive_only: args.definitive_only,
        },
        metric: args
            .kpi_metric
            .as_ref()
            .map_or(MetricSource::Primary, |column| {
                MetricSource::Column(column.trim().to_string())
            }),
        row: args.row.as_deref().map(RowSelector::parse),
        by_kpi: args.by_kpi,
        settings,
    };
    let brief = build_brief(&request)?;

    if let Some(path) = &args.json {
        write_results_json(&brief, path)?;
        info!(path = %path.display(), "results written");
    }
    if let Some(path) = &args.alias_map {
        write_alias_map(&brief, path)?;
        info!(path = %path.display(), "alias map written");
    }

    let export = match &args.pdf {
        Some(path) => {
            let today = Local::now().date_naive();
            let report = render_brief(&brief, &request.settings, today)?;
            write_report(&report, path)?;
            for warning in &report.warnings {
                warn!(%warning, "report section degraded");
            }
            Some((path.clone(), report))
        }
        None => None,
    };

    Ok(AnalyzeOutcome {
        input: request.input,
        brief,
        export,
        show_definitions: args.definitions,
    })
}

/// Loads `--config` (if any) and applies the flag overrides.
fn settings_from_args(args: &AnalyzeArgs) -> Result<Settings> {
    let mut settings = match &args.config {
        Some(path) => Settings::load_from(path).context("load settings")?,
        None => Settings::default(),
    };
    if args.strict {
        settings.input.strict = true;
    }
    if args.hide_non_definitive {
        settings.report.include_non_definitive = false;
    }
    if args.no_comparisons {
        settings.report.include_comparisons = false;
    }
    if let Some(title) = &args.title {
        settings.report.title.clone_from(title);
    }
    if let Some(scope) = args.scope {
        settings.report.scope = match scope {
            ScopeArg::All => ExportScope::All,
            ScopeArg::Selected => ExportScope::Selected,
        };
    }
    Ok(settings)
}

pub fn run_template(args: &TemplateArgs) -> Result<()> {
    let layout = match args.layout {
        LayoutArg::Summary => InputLayout::Summary,
        LayoutArg::Observations => InputLayout::Observations,
    };
    let csv = template_csv(layout).context("build template")?;
    match &args.output {
        Some(path) => {
            fs::write(path, csv).with_context(|| format!("write {}", path.display()))?;
            println!("Template ({}): {}", layout.label(), path.display());
        }
        None => print!("{csv}"),
    }
    Ok(())
}

pub fn run_definitions() {
    println!("{}", definitions_table());
}

pub fn definitions_table() -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Column", "Definition"]);
    apply_table_style(&mut table);
    for (column, definition) in METRIC_DEFINITIONS {
        table.add_row(vec![*column, *definition]);
    }
    table
}
