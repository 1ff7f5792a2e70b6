//! Strip text: header lines and per-photo labels.
//!
//! Text is laid out as SVG `<text>` and rasterised with resvg onto the strip
//! canvas. It is cosmetic; when no usable font is installed the glyphs are
//! simply absent.

use std::fmt::Write as _;
use std::sync::{Arc, OnceLock};

use resvg::usvg;

use crate::strip::layout::CompositeLayout;

/// Horizontal anchoring of a text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Middle,
    End,
}

/// One line of text on the canvas; `y` is the baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: u32,
    pub y: u32,
    pub anchor: Anchor,
    pub size: u32,
    pub bold: bool,
    pub family: &'static str,
    pub fill: &'static str,
}

const TITLE_FAMILY: &str = "'Playfair Display', serif";
const BODY_FAMILY: &str = "Raleway, sans-serif";

/// Title and date lines, centred at y=38 and y=62.
pub fn header_runs(layout: &CompositeLayout, title: &str, date: &str) -> [TextRun; 2] {
    let cx = layout.canvas_width / 2;
    [
        TextRun {
            text: title.to_string(),
            x: cx,
            y: 38,
            anchor: Anchor::Middle,
            size: 24,
            bold: true,
            family: TITLE_FAMILY,
            fill: "#ffffff",
        },
        TextRun {
            text: date.to_string(),
            x: cx,
            y: 62,
            anchor: Anchor::Middle,
            size: 16,
            bold: false,
            family: BODY_FAMILY,
            fill: "#d0d0d0",
        },
    ]
}

/// The `#i` label for a cell, right-aligned near the canvas edge.
pub fn label_run(label: String, anchor: (u32, u32)) -> TextRun {
    TextRun {
        text: label,
        x: anchor.0,
        y: anchor.1,
        anchor: Anchor::End,
        size: 16,
        bold: false,
        family: BODY_FAMILY,
        fill: "#ffffff",
    }
}

/// Build a transparent SVG document holding `runs`.
pub fn to_svg(width: u32, height: u32, runs: &[TextRun]) -> String {
    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );
    for run in runs {
        let anchor = match run.anchor {
            Anchor::Middle => "middle",
            Anchor::End => "end",
        };
        let weight = if run.bold { "bold" } else { "normal" };
        let _ = write!(
            svg,
            r#"<text x="{}" y="{}" text-anchor="{anchor}" font-family="{}" font-size="{}" font-weight="{weight}" fill="{}">{}</text>"#,
            run.x,
            run.y,
            run.family,
            run.size,
            run.fill,
            escape(&run.text)
        );
    }
    svg.push_str("</svg>");
    svg
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// System fonts, loaded once per process.
fn font_database() -> Arc<usvg::fontdb::Database> {
    static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    Arc::clone(FONTS.get_or_init(|| {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        tracing::debug!("loaded {} font faces for strip text", db.len());
        Arc::new(db)
    }))
}

/// Rasterise `runs` over `canvas`.
pub fn draw(canvas: &mut tiny_skia::Pixmap, runs: &[TextRun]) -> Result<(), String> {
    let svg = to_svg(canvas.width(), canvas.height(), runs);
    let options = usvg::Options {
        fontdb: font_database(),
        ..usvg::Options::default()
    };
    let tree = usvg::Tree::from_str(&svg, &options).map_err(|e| e.to_string())?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut canvas.as_mut());
    Ok(())
}

/// Like [`draw`], but failures are logged and dropped.
pub fn draw_best_effort(canvas: &mut tiny_skia::Pixmap, runs: &[TextRun]) {
    if let Err(e) = draw(canvas, runs) {
        tracing::warn!("strip text skipped: {e}");
    }
}
