//! Chart geometry.
//!
//! Charts are built as plain [`Figure`]s in millimetres with the origin at
//! the lower-left corner, independent of the PDF backend. Building a chart
//! validates its data; degenerate input yields a [`RenderError`].

use bls_model::LiftResult;
use bls_transform::KpiSummary;

use crate::error::{RenderError, Result};

/// RGB colour with components in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub f32, pub f32, pub f32);

pub const INK: Rgb = Rgb(0.15, 0.16, 0.20);
pub const MUTED: Rgb = Rgb(0.45, 0.47, 0.52);
pub const GRID: Rgb = Rgb(0.85, 0.86, 0.88);
pub const POSITIVE: Rgb = Rgb(0.16, 0.55, 0.34);
pub const NEGATIVE: Rgb = Rgb(0.78, 0.25, 0.22);
pub const CONTROL: Rgb = Rgb(0.55, 0.57, 0.62);
pub const EXPOSED: Rgb = Rgb(0.20, 0.40, 0.75);

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Rgb,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        color: Rgb,
        thickness: f32,
    },
    /// Square point marker centred on `at`.
    Marker { at: (f32, f32), size: f32, fill: Rgb },
    Text {
        at: (f32, f32),
        text: String,
        size: f32,
        bold: bool,
        color: Rgb,
    },
}

/// A drawable chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub title: String,
    pub width: f32,
    pub height: f32,
    pub shapes: Vec<Shape>,
}

impl Figure {
    fn new(title: impl Into<String>, width: f32, height: f32) -> Self {
        Self {
            title: title.into(),
            width,
            height,
            shapes: Vec::new(),
        }
    }

    fn rect(&mut self, x: f32, y: f32, width: f32, height: f32, fill: Rgb) {
        // Normalise negative extents so the backend always sees lower-left origins.
        let (x, width) = if width < 0.0 { (x + width, -width) } else { (x, width) };
        let (y, height) = if height < 0.0 { (y + height, -height) } else { (y, height) };
        self.shapes.push(Shape::Rect {
            x,
            y,
            width,
            height,
            fill,
        });
    }

    fn line(&mut self, from: (f32, f32), to: (f32, f32), color: Rgb, thickness: f32) {
        self.shapes.push(Shape::Line {
            from,
            to,
            color,
            thickness,
        });
    }

    fn marker(&mut self, at: (f32, f32), size: f32, fill: Rgb) {
        self.shapes.push(Shape::Marker { at, size, fill });
    }

    fn text(&mut self, at: (f32, f32), text: impl Into<String>, size: f32, color: Rgb) {
        self.shapes.push(Shape::Text {
            at,
            text: text.into(),
            size,
            bold: false,
            color,
        });
    }
}

/// Linear mapping from a data range onto a span of millimetres.
#[derive(Debug, Clone, Copy)]
struct Scale {
    lo: f64,
    hi: f64,
    start: f32,
    end: f32,
}

impl Scale {
    fn new(chart: &'static str, lo: f64, hi: f64, start: f32, end: f32) -> Result<Self> {
        if !(lo.is_finite() && hi.is_finite()) {
            return Err(RenderError::NonFinite {
                chart,
                field: "axis range",
            });
        }
        if hi - lo <= f64::EPSILON {
            return Err(RenderError::degenerate(chart, "values have zero range"));
        }
        Ok(Self { lo, hi, start, end })
    }

    fn map(&self, value: f64) -> f32 {
        let t = ((value - self.lo) / (self.hi - self.lo)) as f32;
        self.start + t * (self.end - self.start)
    }
}

fn require_finite(chart: &'static str, field: &'static str, values: &[f64]) -> Result<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(RenderError::NonFinite { chart, field })
    }
}

/// Range covering `values` and zero, padded by 10% on each side.
fn padded_range(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .into_iter()
        .fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let pad = (hi - lo) * 0.1;
    (lo - pad, hi + pad)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_chars.saturating_sub(2)).collect();
        format!("{kept}..")
    }
}

fn row_caption(result: &LiftResult) -> String {
    if result.key.kpi.is_empty() {
        result.key.alias.clone()
    } else {
        format!("{} | {}", result.key.alias, result.key.kpi)
    }
}

const LABEL_WIDTH: f32 = 48.0;
const BAR_ROW: f32 = 6.0;
const MAX_RANK_BARS: usize = 30;

/// Horizontal bars of lift %, largest first.
pub fn lift_rank_chart(results: &[LiftResult], width: f32) -> Result<Figure> {
    const CHART: &str = "lift ranking";
    let mut rows: Vec<(String, f64)> = results
        .iter()
        .filter_map(|result| result.stats().map(|stats| (row_caption(result), stats.lift_pct())))
        .collect();
    if rows.is_empty() {
        return Err(RenderError::EmptyChart { chart: CHART });
    }
    require_finite(CHART, "lift", &rows.iter().map(|(_, lift)| *lift).collect::<Vec<_>>())?;
    rows.sort_by(|a, b| b.1.total_cmp(&a.1));
    rows.truncate(MAX_RANK_BARS);

    let (lo, hi) = padded_range(rows.iter().map(|(_, lift)| *lift));
    let height = BAR_ROW * rows.len() as f32 + 12.0;
    let scale = Scale::new(CHART, lo, hi, LABEL_WIDTH, width - 4.0)?;
    let mut figure = Figure::new("Lift ranking (%)", width, height);

    let zero = scale.map(0.0);
    figure.line((zero, 6.0), (zero, height - 2.0), GRID, 0.4);
    for (idx, (caption, lift)) in rows.iter().enumerate() {
        let y = height - 4.0 - BAR_ROW * (idx as f32 + 1.0);
        let fill = if *lift >= 0.0 { POSITIVE } else { NEGATIVE };
        figure.rect(zero, y + 1.0, scale.map(*lift) - zero, BAR_ROW - 2.0, fill);
        figure.text((1.0, y + 1.8), truncate(caption, 28), 7.0, INK);
        let value_x = if *lift >= 0.0 { scale.map(*lift) + 1.0 } else { zero + 1.0 };
        figure.text((value_x, y + 1.8), format!("{lift:.1}%"), 6.5, MUTED);
    }
    figure.text((scale.map(lo), 1.0), format!("{lo:.1}%"), 6.0, MUTED);
    figure.text((scale.map(hi) - 10.0, 1.0), format!("{hi:.1}%"), 6.0, MUTED);
    Ok(figure)
}

/// Scatter of lift % against -log10(p); points above the dashed line are significant.
pub fn confidence_scatter(results: &[LiftResult], alpha: f64, width: f32) -> Result<Figure> {
    const CHART: &str = "lift vs confidence";
    let points: Vec<(String, f64, f64, bool)> = results
        .iter()
        .filter_map(|result| {
            result.stats().map(|stats| {
                let strength = -stats.p_value.max(1e-12).log10();
                (result.key.alias.clone(), stats.lift_pct(), strength, stats.significant)
            })
        })
        .collect();
    if points.len() < 2 {
        return Err(RenderError::EmptyChart { chart: CHART });
    }
    require_finite(CHART, "lift", &points.iter().map(|p| p.1).collect::<Vec<_>>())?;
    require_finite(CHART, "p-value", &points.iter().map(|p| p.2).collect::<Vec<_>>())?;

    let height = 70.0;
    let (x_lo, x_hi) = padded_range(points.iter().map(|p| p.1));
    let threshold = -alpha.log10();
    let y_hi = points.iter().map(|p| p.2).fold(threshold, f64::max) * 1.1;
    let x = Scale::new(CHART, x_lo, x_hi, 14.0, width - 4.0)?;
    let y = Scale::new(CHART, 0.0, y_hi, 8.0, height - 4.0)?;
    let mut figure = Figure::new("Lift vs confidence (-log10 p)", width, height);

    figure.line((x.start, y.start), (x.end, y.start), GRID, 0.4);
    figure.line((x.map(0.0), y.start), (x.map(0.0), y.end), GRID, 0.4);
    let cut = y.map(threshold);
    let mut dash = x.start;
    while dash < x.end {
        figure.line((dash, cut), ((dash + 2.0).min(x.end), cut), MUTED, 0.3);
        dash += 4.0;
    }
    for (alias, lift, strength, significant) in &points {
        let at = (x.map(*lift), y.map(*strength));
        let fill = if *significant { EXPOSED } else { CONTROL };
        figure.marker(at, 2.2, fill);
        figure.text((at.0 + 1.8, at.1 - 0.8), truncate(alias, 12), 6.0, INK);
    }
    figure.text((x.start, 1.0), format!("{x_lo:.1}%"), 6.0, MUTED);
    figure.text((x.end - 10.0, 1.0), format!("{x_hi:.1}%"), 6.0, MUTED);
    figure.text((1.0, cut - 0.8), format!("p={alpha}"), 5.5, MUTED);
    Ok(figure)
}

/// Control and exposed values joined by a line.
pub fn dumbbell_chart(result: &LiftResult, width: f32) -> Result<Figure> {
    const CHART: &str = "control vs exposed";
    let stats = result.stats().ok_or(RenderError::EmptyChart { chart: CHART })?;
    let control = stats.control_display();
    let exposed = stats.exposed_display();
    require_finite(CHART, "arm value", &[control, exposed])?;

    let unit = if stats.is_proportion() { "%" } else { "" };
    let height = 28.0;
    let (lo, hi) = padded_range([control, exposed]);
    let scale = Scale::new(CHART, lo, hi, 22.0, width - 6.0)?;
    let mut figure = Figure::new("Control vs exposed", width, height);

    let y = 16.0;
    figure.line((scale.start, y), (scale.end, y), GRID, 0.3);
    figure.line((scale.map(control), y), (scale.map(exposed), y), MUTED, 1.2);
    figure.marker((scale.map(control), y), 3.0, CONTROL);
    figure.marker((scale.map(exposed), y), 3.0, EXPOSED);
    figure.text((scale.map(control) - 4.0, y + 4.0), format!("{control:.2}{unit}"), 7.0, INK);
    figure.text((scale.map(exposed) - 4.0, y - 7.0), format!("{exposed:.2}{unit}"), 7.0, INK);
    figure.text((1.0, y + 2.5), "Control", 7.0, CONTROL);
    figure.text((1.0, y - 3.5), "Exposed", 7.0, EXPOSED);
    Ok(figure)
}

/// Confidence interval of the difference against the zero line.
pub fn ci_interval_chart(result: &LiftResult, width: f32) -> Result<Figure> {
    const CHART: &str = "confidence interval";
    let stats = result.stats().ok_or(RenderError::EmptyChart { chart: CHART })?;
    let (low, mid, high) = (stats.ci_low_pts(), stats.difference_pts(), stats.ci_high_pts());
    require_finite(CHART, "interval", &[low, mid, high])?;
    if high - low <= f64::EPSILON {
        return Err(RenderError::degenerate(CHART, "interval has zero width"));
    }

    let unit = if stats.is_proportion() { " pts" } else { "" };
    let height = 26.0;
    let (lo, hi) = padded_range([low, high]);
    let scale = Scale::new(CHART, lo, hi, 6.0, width - 6.0)?;
    let mut figure = Figure::new("Difference with confidence interval", width, height);

    let y = 14.0;
    figure.line((scale.map(0.0), 6.0), (scale.map(0.0), height - 2.0), MUTED, 0.4);
    let color = if low > 0.0 {
        POSITIVE
    } else if high < 0.0 {
        NEGATIVE
    } else {
        CONTROL
    };
    figure.line((scale.map(low), y), (scale.map(high), y), color, 1.4);
    figure.line((scale.map(low), y - 2.0), (scale.map(low), y + 2.0), color, 0.8);
    figure.line((scale.map(high), y - 2.0), (scale.map(high), y + 2.0), color, 0.8);
    figure.marker((scale.map(mid), y), 2.6, INK);
    figure.text((scale.map(low) - 4.0, y - 7.0), format!("{low:.2}{unit}"), 6.5, MUTED);
    figure.text((scale.map(high) - 4.0, y - 7.0), format!("{high:.2}{unit}"), 6.5, MUTED);
    figure.text((scale.map(mid) - 4.0, y + 3.5), format!("{mid:.2}{unit}"), 7.0, INK);
    Ok(figure)
}

/// Vertical bars of average lift per KPI.
pub fn kpi_lift_chart(breakdown: &[KpiSummary], width: f32) -> Result<Figure> {
    const CHART: &str = "KPI breakdown";
    let bars: Vec<(&str, f64)> = breakdown
        .iter()
        .filter_map(|kpi| kpi.average_lift_pct.map(|lift| (kpi.kpi.as_str(), lift)))
        .collect();
    if bars.is_empty() {
        return Err(RenderError::EmptyChart { chart: CHART });
    }
    require_finite(CHART, "average lift", &bars.iter().map(|b| b.1).collect::<Vec<_>>())?;

    let height = 60.0;
    let (lo, hi) = padded_range(bars.iter().map(|b| b.1));
    let scale = Scale::new(CHART, lo, hi, 10.0, height - 6.0)?;
    let mut figure = Figure::new("Average lift by KPI (%)", width, height);

    let slot = (width - 8.0) / bars.len() as f32;
    let zero = scale.map(0.0);
    figure.line((4.0, zero), (width - 4.0, zero), GRID, 0.4);
    for (idx, (kpi, lift)) in bars.iter().enumerate() {
        let x = 4.0 + slot * idx as f32;
        let fill = if *lift >= 0.0 { POSITIVE } else { NEGATIVE };
        figure.rect(x + slot * 0.2, zero, slot * 0.6, scale.map(*lift) - zero, fill);
        let max_chars = ((slot / 1.6) as usize).max(4);
        figure.text((x + slot * 0.2, 2.0), truncate(kpi, max_chars), 6.5, INK);
        let value_y = if *lift >= 0.0 { scale.map(*lift) + 1.0 } else { zero + 1.0 };
        figure.text((x + slot * 0.2, value_y), format!("{lift:.1}%"), 6.5, MUTED);
    }
    Ok(figure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_truncated() {
        assert_eq!(truncate("Awareness", 20), "Awareness");
        assert_eq!(truncate("Purchase intent", 8), "Purcha..");
    }

    #[test]
    fn padded_range_always_includes_zero() {
        let (lo, hi) = padded_range([5.0, 10.0]);
        assert!(lo < 0.0 && hi > 10.0);
    }

    #[test]
    fn zero_range_scale_is_degenerate() {
        let err = Scale::new("test", 0.0, 0.0, 0.0, 10.0).unwrap_err();
        assert!(matches!(err, RenderError::DegenerateData { .. }));
        let err = Scale::new("test", 0.0, f64::NAN, 0.0, 10.0).unwrap_err();
        assert!(matches!(err, RenderError::NonFinite { .. }));
    }

    #[test]
    fn empty_breakdown_cannot_be_drawn() {
        assert_eq!(
            kpi_lift_chart(&[], 180.0).unwrap_err(),
            RenderError::EmptyChart {
                chart: "KPI breakdown"
            }
        );
    }
}
