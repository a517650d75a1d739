//! Thin page-flow wrapper over `printpdf`.

use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Rect,
};

use crate::chart::{Figure, GRID, INK, Rgb, Shape};
use crate::error::{RenderError, Result};

pub(crate) const PAGE_WIDTH: f32 = 210.0;
pub(crate) const PAGE_HEIGHT: f32 = 297.0;
pub(crate) const MARGIN: f32 = 15.0;
pub(crate) const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const LAYER: &str = "Layer 1";

/// Replaces characters the built-in Helvetica encoding cannot show.
pub(crate) fn pdf_text(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2022}' | '\u{00b7}' => '|',
            '\u{2013}' | '\u{2014}' | '\u{2212}' => '-',
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201c}' | '\u{201d}' => '"',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '?',
        })
        .collect()
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb(printpdf::Rgb::new(rgb.0, rgb.1, rgb.2, None))
}

/// A document with a top-down cursor on the current page.
pub(crate) struct Canvas {
    doc: PdfDocumentReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    layer: PdfLayerReference,
    /// Distance from the top edge, in mm.
    cursor: f32,
    pages: usize,
}

impl Canvas {
    pub(crate) fn new(title: &str) -> Result<Self> {
        let title = pdf_text(title);
        let (doc, page, layer) =
            PdfDocument::new(title.as_str(), Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER);
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(RenderError::pdf)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(RenderError::pdf)?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            regular,
            bold,
            layer,
            cursor: MARGIN,
            pages: 1,
        })
    }

    pub(crate) fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER);
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.cursor = MARGIN;
        self.pages += 1;
    }

    pub(crate) fn pages(&self) -> usize {
        self.pages
    }

    /// Starts a new page unless `height` mm still fit above the bottom margin.
    pub(crate) fn ensure_space(&mut self, height: f32) {
        if self.cursor + height > PAGE_HEIGHT - MARGIN {
            self.new_page();
        }
    }

    pub(crate) fn advance(&mut self, height: f32) {
        self.cursor += height;
    }

    /// Baseline y (from the bottom edge) of the cursor.
    fn baseline(&self) -> f32 {
        PAGE_HEIGHT - self.cursor
    }

    fn draw_text(&self, text: &str, size: f32, x: f32, y: f32, bold: bool, rgb: Rgb) {
        let font = if bold { &self.bold } else { &self.regular };
        self.layer.set_fill_color(color(rgb));
        self.layer.use_text(pdf_text(text), size, Mm(x), Mm(y), font);
    }

    /// Writes one line at the cursor and moves below it.
    pub(crate) fn line_of_text(&mut self, text: &str, size: f32, bold: bool) {
        let height = size * 0.45 + 1.5;
        self.ensure_space(height);
        self.advance(size * 0.35);
        self.draw_text(text, size, MARGIN, self.baseline(), bold, INK);
        self.advance(height - size * 0.35);
    }

    /// Writes text at a column offset on the current cursor line without moving.
    pub(crate) fn text_at(&self, text: &str, size: f32, x_offset: f32, bold: bool, rgb: Rgb) {
        self.draw_text(text, size, MARGIN + x_offset, self.baseline(), bold, rgb);
    }

    /// Fills a rectangle whose top-left corner sits at the cursor.
    pub(crate) fn fill_box(&self, x_offset: f32, width: f32, height: f32, rgb: Rgb) {
        let top = self.baseline();
        self.fill_rect(MARGIN + x_offset, top - height, width, height, rgb);
    }

    fn fill_rect(&self, x: f32, y: f32, width: f32, height: f32, rgb: Rgb) {
        self.layer.set_fill_color(color(rgb));
        let rect = Rect::new(Mm(x), Mm(y), Mm(x + width), Mm(y + height)).with_mode(PaintMode::Fill);
        self.layer.add_rect(rect);
    }

    fn stroke_line(&self, from: (f32, f32), to: (f32, f32), rgb: Rgb, thickness: f32) {
        self.layer.set_outline_color(color(rgb));
        self.layer.set_outline_thickness(thickness);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(from.0), Mm(from.1)), false),
                (Point::new(Mm(to.0), Mm(to.1)), false),
            ],
            is_closed: false,
        });
    }

    pub(crate) fn rule(&mut self) {
        let y = self.baseline();
        self.stroke_line((MARGIN, y), (PAGE_WIDTH - MARGIN, y), GRID, 0.4);
        self.advance(3.0);
    }

    /// Draws a figure with its title below the cursor.
    pub(crate) fn figure(&mut self, figure: &Figure) {
        self.ensure_space(figure.height + 8.0);
        self.line_of_text(&figure.title, 10.0, true);
        let x0 = MARGIN;
        let y0 = self.baseline() - figure.height;
        for shape in &figure.shapes {
            match shape {
                Shape::Rect {
                    x,
                    y,
                    width,
                    height,
                    fill,
                } => self.fill_rect(x0 + x, y0 + y, *width, *height, *fill),
                Shape::Line {
                    from,
                    to,
                    color,
                    thickness,
                } => self.stroke_line(
                    (x0 + from.0, y0 + from.1),
                    (x0 + to.0, y0 + to.1),
                    *color,
                    *thickness,
                ),
                Shape::Marker { at, size, fill } => {
                    let half = size / 2.0;
                    self.fill_rect(x0 + at.0 - half, y0 + at.1 - half, *size, *size, *fill);
                }
                Shape::Text {
                    at,
                    text,
                    size,
                    bold,
                    color,
                } => self.draw_text(text, *size, x0 + at.0, y0 + at.1, *bold, *color),
            }
        }
        self.advance(figure.height + 4.0);
    }

    pub(crate) fn finish(self) -> Result<Vec<u8>> {
        self.doc.save_to_bytes().map_err(RenderError::pdf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_reduced_to_ascii() {
        assert_eq!(pdf_text("Brand A \u{2022} Awareness"), "Brand A | Awareness");
        assert_eq!(pdf_text("up \u{2013} 3\u{00a0}pts"), "up - 3?pts");
    }
}
