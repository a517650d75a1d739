//! Brief layout: header, summary cards, results table, charts, KPI
//! breakdown, warnings and per-row detail pages.

use std::time::Instant;

use chrono::NaiveDate;
use tracing::{debug, info, info_span, warn};

use bls_model::settings::{DEFAULT_MAX_DETAIL_PAGES, DEFAULT_REPORT_TITLE};
use bls_model::{LiftResult, ReportSettings};
use bls_transform::{KpiSummary, ViewSummary, incomplete_lines, summarize};

use crate::canvas::{CONTENT_WIDTH, Canvas};
use crate::chart::{
    Figure, INK, MUTED, Rgb, ci_interval_chart, confidence_scatter, dumbbell_chart,
    kpi_lift_chart, lift_rank_chart,
};
use crate::error::{RenderError, Result};
use crate::format::{format_confidence, format_optional_pct, format_pct, verdict_text};

const CARD_FILL: Rgb = Rgb(0.95, 0.96, 0.97);
const HEADER_FILL: Rgb = Rgb(0.90, 0.91, 0.93);
const ROW_HEIGHT: f32 = 6.0;
const NO_COMPARISONS: &str = "Comparison charts are off, or there is only one row in view.";

/// Options for one PDF export.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOptions {
    pub title: String,
    pub generated_on: NaiveDate,
    pub include_comparisons: bool,
    pub max_detail_pages: usize,
    /// Significance level used for the scatter threshold line.
    pub alpha: f64,
}

impl ReportOptions {
    pub fn new(title: impl Into<String>, generated_on: NaiveDate) -> Self {
        Self {
            title: title.into(),
            generated_on,
            include_comparisons: true,
            max_detail_pages: DEFAULT_MAX_DETAIL_PAGES,
            alpha: 0.05,
        }
    }

    pub fn from_settings(settings: &ReportSettings, generated_on: NaiveDate, alpha: f64) -> Self {
        Self {
            title: settings.title.clone(),
            generated_on,
            include_comparisons: settings.include_comparisons,
            max_detail_pages: settings.max_detail_pages,
            alpha,
        }
    }

    fn title(&self) -> &str {
        if self.title.trim().is_empty() {
            DEFAULT_REPORT_TITLE
        } else {
            &self.title
        }
    }
}

/// A rendered brief.
#[derive(Debug, Clone)]
pub struct Report {
    pub bytes: Vec<u8>,
    /// Charts replaced by text, and the full-layout failure if the text-only
    /// fallback was used.
    pub warnings: Vec<RenderError>,
    pub pages: usize,
    pub text_only: bool,
}

/// Column layout of the results table: header, x offset, max characters.
const TABLE_COLUMNS: [(&str, f32, usize); 7] = [
    ("Alias", 0.0, 12),
    ("KPI", 24.0, 16),
    ("Period", 56.0, 10),
    ("Control", 78.0, 9),
    ("Exposed", 96.0, 9),
    ("Lift", 114.0, 9),
    ("Conf.", 132.0, 7),
];
const VERDICT_COLUMN: f32 = 148.0;

fn clip(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn header(canvas: &mut Canvas, options: &ReportOptions) {
    canvas.line_of_text(options.title(), 18.0, true);
    canvas.line_of_text(
        &format!(
            "Generated {} | Results shown with brand aliases",
            options.generated_on.format("%d %b %Y")
        ),
        9.0,
        false,
    );
    canvas.advance(2.0);
}

fn summary_cards(canvas: &mut Canvas, summary: &ViewSummary) {
    let cards = [
        ("Rows in view", summary.rows.to_string()),
        ("Statistically clear", summary.clear.to_string()),
        ("Average lift", format_optional_pct(summary.average_lift_pct)),
    ];
    let width = (CONTENT_WIDTH - 8.0) / 3.0;
    canvas.ensure_space(20.0);
    for idx in 0..cards.len() {
        canvas.fill_box(idx as f32 * (width + 4.0), width, 16.0, CARD_FILL);
    }
    canvas.advance(5.0);
    for (idx, (title, _)) in cards.iter().enumerate() {
        canvas.text_at(title, 8.0, idx as f32 * (width + 4.0) + 3.0, false, MUTED);
    }
    canvas.advance(7.0);
    for (idx, (_, value)) in cards.iter().enumerate() {
        canvas.text_at(value, 14.0, idx as f32 * (width + 4.0) + 3.0, true, INK);
    }
    canvas.advance(8.0);
}

fn table_header(canvas: &mut Canvas) {
    canvas.ensure_space(ROW_HEIGHT * 2.0);
    canvas.fill_box(0.0, CONTENT_WIDTH, ROW_HEIGHT, HEADER_FILL);
    canvas.advance(4.2);
    for (title, x, _) in TABLE_COLUMNS {
        canvas.text_at(title, 8.0, x + 1.0, true, INK);
    }
    canvas.text_at("Verdict", 8.0, VERDICT_COLUMN + 1.0, true, INK);
    canvas.advance(ROW_HEIGHT - 4.2);
}

fn table_cells(result: &LiftResult) -> [String; 8] {
    let key = &result.key;
    match result.stats() {
        Some(stats) => {
            let unit = if stats.is_proportion() { "%" } else { "" };
            [
                key.alias.clone(),
                key.kpi.clone(),
                key.period.clone(),
                format!("{:.2}{unit}", stats.control_display()),
                format!("{:.2}{unit}", stats.exposed_display()),
                format_pct(stats.lift_pct()),
                format_confidence(stats.confidence),
                verdict_text(result),
            ]
        }
        None => [
            key.alias.clone(),
            key.kpi.clone(),
            key.period.clone(),
            "-".to_string(),
            "-".to_string(),
            "-".to_string(),
            "-".to_string(),
            verdict_text(result),
        ],
    }
}

fn results_table(canvas: &mut Canvas, results: &[LiftResult]) {
    canvas.line_of_text("Results", 12.0, true);
    table_header(canvas);
    for (idx, result) in results.iter().enumerate() {
        let pages = canvas.pages();
        canvas.ensure_space(ROW_HEIGHT);
        if canvas.pages() != pages {
            table_header(canvas);
        }
        if idx % 2 == 1 {
            canvas.fill_box(0.0, CONTENT_WIDTH, ROW_HEIGHT, CARD_FILL);
        }
        let cells = table_cells(result);
        canvas.advance(4.2);
        for ((_, x, max_chars), cell) in TABLE_COLUMNS.iter().zip(&cells) {
            canvas.text_at(&clip(cell, *max_chars), 7.5, x + 1.0, false, INK);
        }
        canvas.text_at(&clip(&cells[7], 20), 7.5, VERDICT_COLUMN + 1.0, false, INK);
        canvas.advance(ROW_HEIGHT - 4.2);
    }
    canvas.advance(4.0);
}

/// Draws a chart or records why it could not be drawn.
fn chart_or_note(
    canvas: &mut Canvas,
    chart: Result<Figure>,
    warnings: &mut Vec<RenderError>,
) {
    match chart {
        Ok(figure) => canvas.figure(&figure),
        Err(err) => {
            debug!(error = %err, "chart replaced by text");
            canvas.line_of_text(&format!("Chart unavailable: {err}."), 8.5, false);
            warnings.push(err);
        }
    }
}

fn comparisons(
    canvas: &mut Canvas,
    results: &[LiftResult],
    options: &ReportOptions,
    warnings: &mut Vec<RenderError>,
) {
    canvas.line_of_text("Comparison view", 12.0, true);
    if !options.include_comparisons || results.len() <= 1 {
        canvas.line_of_text(NO_COMPARISONS, 9.0, false);
        canvas.advance(3.0);
        return;
    }
    chart_or_note(canvas, lift_rank_chart(results, CONTENT_WIDTH), warnings);
    chart_or_note(
        canvas,
        confidence_scatter(results, options.alpha, CONTENT_WIDTH),
        warnings,
    );
}

fn kpi_section(canvas: &mut Canvas, breakdown: &[KpiSummary], warnings: &mut Vec<RenderError>) {
    canvas.new_page();
    canvas.line_of_text("KPI breakdown", 12.0, true);
    for kpi in breakdown {
        canvas.line_of_text(
            &format!(
                "{} | rows {} | clear {} | avg lift {} | avg gap {} | top {}",
                kpi.kpi,
                kpi.rows,
                kpi.clear,
                format_optional_pct(kpi.average_lift_pct),
                kpi.average_gap_pts
                    .map_or_else(|| "-".to_string(), |gap| format!("{gap:.2} pts")),
                kpi.top_alias.as_deref().unwrap_or("-"),
            ),
            8.5,
            false,
        );
    }
    canvas.advance(3.0);
    chart_or_note(canvas, kpi_lift_chart(breakdown, CONTENT_WIDTH), warnings);
}

fn warnings_section(canvas: &mut Canvas, results: &[LiftResult]) {
    let insufficient: Vec<_> = results.iter().filter_map(LiftResult::warning).collect();
    if insufficient.is_empty() {
        return;
    }
    canvas.line_of_text("Warnings", 12.0, true);
    for err in insufficient {
        canvas.line_of_text(&format!("- {err}"), 8.5, false);
    }
    canvas.advance(3.0);
}

fn detail_lines(result: &LiftResult) -> Vec<String> {
    let key = &result.key;
    let mut lines = vec![format!(
        "{} | {} | {}",
        key.period, key.category, key.market
    )];
    match result.assessment() {
        Some(assessment) => {
            let stats = &assessment.stats;
            let unit = if stats.is_proportion() { " pts" } else { "" };
            lines.push(format!("Verdict: {}", assessment.insight.state_label()));
            lines.push(format!("Note: {}", assessment.insight.note));
            lines.push(format!("What changed: {}", assessment.insight.meaning));
            lines.push(format!("How to use it: {}", assessment.insight.decision));
            lines.push(format!(
                "Gap {:.2}{unit} | Lift {} | Confidence {} | p = {:.4}",
                stats.difference_pts(),
                format_pct(stats.lift_pct()),
                format_confidence(stats.confidence),
                stats.p_value,
            ));
            lines.push(format!(
                "Interval {:.2} to {:.2}{unit} | Effect {:.3} ({}) | {}",
                stats.ci_low_pts(),
                stats.ci_high_pts(),
                stats.effect_size,
                stats.effect_band.label(),
                stats
                    .data_flag
                    .map_or("Sample size OK", |flag| flag.label()),
            ));
        }
        None => {
            let (meaning, decision) = incomplete_lines(&key.kpi);
            lines.push(format!("What changed: {meaning}"));
            lines.push(format!("How to use it: {decision}"));
            if let Some(err) = result.warning() {
                lines.push(format!("Reason: {}", err.reason));
            }
        }
    }
    lines
}

fn detail_page(canvas: &mut Canvas, result: &LiftResult, warnings: &mut Vec<RenderError>) {
    canvas.new_page();
    canvas.line_of_text(&result.label(), 14.0, true);
    for line in detail_lines(result) {
        canvas.line_of_text(&line, 9.0, false);
    }
    canvas.advance(3.0);
    if result.stats().is_some() {
        chart_or_note(canvas, dumbbell_chart(result, CONTENT_WIDTH), warnings);
        chart_or_note(canvas, ci_interval_chart(result, CONTENT_WIDTH), warnings);
    }
}

fn render_full(
    results: &[LiftResult],
    breakdown: Option<&[KpiSummary]>,
    options: &ReportOptions,
) -> Result<(Vec<u8>, usize, Vec<RenderError>)> {
    let mut warnings = Vec::new();
    let mut canvas = Canvas::new(options.title())?;
    header(&mut canvas, options);
    summary_cards(&mut canvas, &summarize(results));
    canvas.rule();
    results_table(&mut canvas, results);
    comparisons(&mut canvas, results, options, &mut warnings);
    if let Some(breakdown) = breakdown {
        kpi_section(&mut canvas, breakdown, &mut warnings);
    }
    warnings_section(&mut canvas, results);

    let shown = results.len().min(options.max_detail_pages);
    for result in &results[..shown] {
        detail_page(&mut canvas, result, &mut warnings);
    }
    if shown < results.len() {
        canvas.line_of_text(
            &format!(
                "Detail pages limited to the first {shown} of {} rows.",
                results.len()
            ),
            8.5,
            false,
        );
    }
    let pages = canvas.pages();
    Ok((canvas.finish()?, pages, warnings))
}

fn render_text_only(results: &[LiftResult], options: &ReportOptions) -> Result<(Vec<u8>, usize)> {
    let mut canvas = Canvas::new(options.title())?;
    header(&mut canvas, options);
    let summary = summarize(results);
    canvas.line_of_text(
        &format!(
            "Rows in view {} | Statistically clear {} | Average lift {}",
            summary.rows,
            summary.clear,
            format_optional_pct(summary.average_lift_pct)
        ),
        9.0,
        false,
    );
    canvas.rule();
    for result in results {
        let cells = table_cells(result);
        canvas.line_of_text(&cells.join(" | "), 8.0, false);
    }
    canvas.advance(3.0);
    warnings_section(&mut canvas, results);
    let pages = canvas.pages();
    Ok((canvas.finish()?, pages))
}

/// Renders the brief for `results`.
///
/// Chart problems are collected as warnings. If the full layout fails a
/// text-only report is attempted before giving up.
pub fn export_pdf(
    results: &[LiftResult],
    breakdown: Option<&[KpiSummary]>,
    options: &ReportOptions,
) -> Result<Report> {
    let span = info_span!("export", rows = results.len());
    let _guard = span.enter();
    let start = Instant::now();

    let report = match render_full(results, breakdown, options) {
        Ok((bytes, pages, warnings)) => Report {
            bytes,
            warnings,
            pages,
            text_only: false,
        },
        Err(err) => {
            warn!(error = %err, "full report failed, falling back to text");
            let (bytes, pages) = render_text_only(results, options)?;
            Report {
                bytes,
                warnings: vec![err],
                pages,
                text_only: true,
            }
        }
    };
    info!(
        pages = report.pages,
        bytes = report.bytes.len(),
        warnings = report.warnings.len(),
        text_only = report.text_only,
        duration_ms = start.elapsed().as_millis(),
        "export complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_title_falls_back_to_default() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let options = ReportOptions::new("  ", date);
        assert_eq!(options.title(), DEFAULT_REPORT_TITLE);
    }

    #[test]
    fn clip_counts_characters() {
        assert_eq!(clip("Consideration", 6), "Consid");
    }
}
