use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use bls_model::{LiftResult, Verdict};
use bls_report::{format_confidence, format_optional_pct, format_pct, verdict_text};
use bls_transform::{KpiSummary, incomplete_lines};

use crate::commands::{AnalyzeOutcome, definitions_table};

pub fn print_outcome(outcome: &AnalyzeOutcome) {
    let brief = &outcome.brief;
    let upload = &brief.upload;
    println!("Upload: {}", outcome.input.display());
    println!(
        "Layout: {} ({} rows, {} brands)",
        upload.layout.label(),
        upload.rows,
        brief.analysis.aliases.len()
    );
    if !upload.ignored_columns.is_empty() {
        println!("Ignored columns: {}", upload.ignored_columns.join(", "));
    }
    if !upload.metric_columns.is_empty() {
        println!(
            "Alternate metrics (--kpi-metric): {}",
            upload.metric_columns.join(", ")
        );
    }
    if !upload.skipped_rows.is_empty() {
        println!("Skipped rows with a blank metric: {}", upload.skipped_rows.len());
    }

    print_results_table(&brief.view);
    let summary = &brief.summary;
    println!(
        "Rows in view: {} | Statistically clear: {} | Average lift: {} | Average gap: {}",
        summary.rows,
        summary.clear,
        format_optional_pct(summary.average_lift_pct),
        summary
            .average_gap_pts
            .map_or_else(|| "-".to_string(), |gap| format!("{gap:.2} pts")),
    );

    if let Some(breakdown) = &brief.breakdown {
        print_kpi_table(breakdown);
    }
    if brief.has_warnings() {
        print_warning_table(&brief.view);
    }
    if let Some(row) = &brief.selected {
        print_deep_dive(row);
    }
    if let Some((path, report)) = &outcome.export {
        println!();
        println!("PDF: {} ({} pages)", path.display(), report.pages);
        if report.text_only {
            println!("Charts could not be drawn; the PDF is text only.");
        }
        for warning in &report.warnings {
            eprintln!("- {warning}");
        }
    }
    if outcome.show_definitions {
        println!();
        println!("{}", definitions_table());
    }
}

fn print_results_table(view: &[LiftResult]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("#"),
        header_cell("Comparison"),
        header_cell("Market"),
        header_cell("Control"),
        header_cell("Exposed"),
        header_cell("Gap"),
        header_cell("Lift"),
        header_cell("Confidence"),
        header_cell("Verdict"),
        header_cell("Flag"),
    ]);
    apply_summary_table_style(&mut table);
    for index in [0, 3, 4, 5, 6, 7] {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for (idx, result) in view.iter().enumerate() {
        let mut row = vec![
            dim_cell(idx + 1),
            Cell::new(result.label())
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            text_cell(&result.key.market),
        ];
        match result.stats() {
            Some(stats) => row.extend([
                Cell::new(format!("{:.2}", stats.control_display())),
                Cell::new(format!("{:.2}", stats.exposed_display())),
                Cell::new(format!("{:+.2}", stats.difference_pts())),
                Cell::new(format_pct(stats.lift_pct())),
                Cell::new(format_confidence(stats.confidence)),
            ]),
            None => row.extend((0..5).map(|_| dim_cell("-"))),
        }
        row.push(verdict_cell(result));
        row.push(match result.stats().and_then(|stats| stats.data_flag) {
            Some(flag) => Cell::new(flag.label()).fg(Color::Yellow),
            None => dim_cell("-"),
        });
        table.add_row(row);
    }
    println!("{table}");
}

fn print_kpi_table(breakdown: &[KpiSummary]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("KPI"),
        header_cell("Rows"),
        header_cell("Scored"),
        header_cell("Clear"),
        header_cell("Avg lift"),
        header_cell("Avg gap"),
        header_cell("Top"),
    ]);
    apply_table_style(&mut table);
    for index in 1..=5 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for kpi in breakdown {
        table.add_row(vec![
            Cell::new(&kpi.kpi).add_attribute(Attribute::Bold),
            Cell::new(kpi.rows),
            Cell::new(kpi.scored),
            count_cell(kpi.clear, Color::Green),
            Cell::new(format_optional_pct(kpi.average_lift_pct)),
            kpi.average_gap_pts
                .map_or_else(|| dim_cell("-"), |gap| Cell::new(format!("{gap:.2}"))),
            kpi.top_alias.as_deref().map_or_else(|| dim_cell("-"), Cell::new),
        ]);
    }
    println!();
    println!("By KPI:");
    println!("{table}");
}

fn print_warning_table(view: &[LiftResult]) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Comparison"), header_cell("Insufficient data")]);
    apply_table_style(&mut table);
    for warning in view.iter().filter_map(LiftResult::warning) {
        table.add_row(vec![
            Cell::new(&warning.label),
            Cell::new(warning.reason.to_string()).fg(Color::Yellow),
        ]);
    }
    println!();
    println!("Warnings:");
    println!("{table}");
}

fn print_deep_dive(result: &LiftResult) {
    println!();
    println!("Deep dive: {}", result.label());
    let kpi = if result.key.kpi.is_empty() {
        result.metric.as_str()
    } else {
        result.key.kpi.as_str()
    };
    let Some(assessment) = result.assessment() else {
        let (meaning, decision) = incomplete_lines(kpi);
        println!("  {meaning}");
        println!("  {decision}");
        return;
    };
    let stats = &assessment.stats;
    let mut table = Table::new();
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    let rows: [(&str, String); 9] = [
        ("Control", format!("{:.2}", stats.control_display())),
        ("Exposed", format!("{:.2}", stats.exposed_display())),
        ("Gap", format!("{:+.2}", stats.difference_pts())),
        ("Lift", format_pct(stats.lift_pct())),
        ("p-value", format!("{:.4}", stats.p_value)),
        ("Confidence", format_confidence(stats.confidence)),
        (
            "CI",
            format!("{:+.2} to {:+.2}", stats.ci_low_pts(), stats.ci_high_pts()),
        ),
        (
            "Effect size",
            format!("{:.3} ({})", stats.effect_size, stats.effect_band.label()),
        ),
        ("Verdict", verdict_text(result)),
    ];
    for (name, value) in rows {
        table.add_row(vec![dim_cell(name), Cell::new(value)]);
    }
    println!("{table}");
    println!("  Note: {}", assessment.insight.note);
    println!("  What changed: {}", assessment.insight.meaning);
    println!("  How to use it: {}", assessment.insight.decision);
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(165);
    if table.column_count() >= 10 {
        table.set_constraints(vec![
            ColumnConstraint::UpperBoundary(Width::Fixed(5)),
            ColumnConstraint::UpperBoundary(Width::Percentage(35)),
            ColumnConstraint::UpperBoundary(Width::Fixed(14)),
            ColumnConstraint::LowerBoundary(Width::Fixed(8)),
            ColumnConstraint::LowerBoundary(Width::Fixed(8)),
            ColumnConstraint::LowerBoundary(Width::Fixed(7)),
            ColumnConstraint::LowerBoundary(Width::Fixed(9)),
            ColumnConstraint::LowerBoundary(Width::Fixed(10)),
            ColumnConstraint::LowerBoundary(Width::Fixed(12)),
            ColumnConstraint::LowerBoundary(Width::Fixed(8)),
        ]);
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn verdict_cell(result: &LiftResult) -> Cell {
    let text = verdict_text(result);
    match result.assessment().map(|assessment| assessment.insight.verdict) {
        Some(Verdict::ClearUp) => Cell::new(text)
            .fg(Color::Green)
            .add_attribute(Attribute::Bold),
        Some(Verdict::ClearDown) => Cell::new(text)
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        Some(_) => Cell::new(text),
        None => Cell::new(text).fg(Color::Yellow),
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn text_cell(value: &str) -> Cell {
    if value.is_empty() {
        dim_cell("-")
    } else {
        Cell::new(value)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
