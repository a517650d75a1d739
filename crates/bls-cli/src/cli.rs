//! CLI argument definitions for `bls-brief`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "bls-brief",
    version,
    about = "Brand lift study briefs - lift, confidence and a PDF summary",
    long_about = "Turn a brand lift study upload into a results view and a PDF brief.\n\n\
                  Accepts pre-aggregated summary rows or per-respondent observations\n\
                  (CSV or XLSX). Brand names are replaced by aliases everywhere."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow real brand names in log output.
    #[arg(long = "log-brands", global = true)]
    pub log_brands: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Analyze an upload and optionally export the PDF brief.
    Analyze(AnalyzeArgs),

    /// Print a blank upload template.
    Template(TemplateArgs),

    /// List the metric definitions.
    Definitions,
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// CSV or XLSX upload.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// TOML settings file; flags below override it.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Reject uploads with extra (computed) columns.
    #[arg(long = "strict")]
    pub strict: bool,

    /// Keep only these markets (repeatable).
    #[arg(long = "market", value_name = "NAME")]
    pub markets: Vec<String>,

    /// Keep only these categories (repeatable).
    #[arg(long = "category", value_name = "NAME")]
    pub categories: Vec<String>,

    /// Keep only these brands, by alias or real name (repeatable).
    #[arg(long = "brand", value_name = "NAME")]
    pub brands: Vec<String>,

    /// Keep only these KPIs (repeatable).
    #[arg(long = "kpi", value_name = "NAME")]
    pub kpis: Vec<String>,

    /// Keep only statistically clear results.
    #[arg(long = "definitive-only")]
    pub definitive_only: bool,

    /// Read every result by direction only, dropping the possible/no-change labels.
    #[arg(long = "hide-non-definitive")]
    pub hide_non_definitive: bool,

    /// Show the KPI breakdown and add it to the PDF.
    #[arg(long = "by-kpi")]
    pub by_kpi: bool,

    /// Score an extra numeric column instead of `Metric` (observation uploads).
    #[arg(long = "kpi-metric", value_name = "COLUMN")]
    pub kpi_metric: Option<String>,

    /// Deep-dive row: 1-based index or label such as "Brand A | Awareness | Jan 2024".
    #[arg(long = "row", value_name = "ROW")]
    pub row: Option<String>,

    /// Write the PDF brief here.
    #[arg(long = "pdf", value_name = "PATH")]
    pub pdf: Option<PathBuf>,

    /// Report title.
    #[arg(long = "title")]
    pub title: Option<String>,

    /// Export every row in view or only the deep-dive row.
    #[arg(long = "scope", value_enum)]
    pub scope: Option<ScopeArg>,

    /// Leave the comparison charts out of the PDF.
    #[arg(long = "no-comparisons")]
    pub no_comparisons: bool,

    /// Write the results view as JSON.
    #[arg(long = "json", value_name = "PATH")]
    pub json: Option<PathBuf>,

    /// Write the alias-to-brand mapping as CSV.
    #[arg(long = "alias-map", value_name = "PATH")]
    pub alias_map: Option<PathBuf>,

    /// Print the metric definitions after the results.
    #[arg(long = "definitions")]
    pub definitions: bool,
}

#[derive(Args)]
pub struct TemplateArgs {
    /// Upload layout to describe.
    #[arg(long = "layout", value_enum, default_value = "summary")]
    pub layout: LayoutArg,

    /// Write the template here instead of stdout.
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ScopeArg {
    All,
    Selected,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LayoutArg {
    Summary,
    Observations,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
