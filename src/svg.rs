//! SVG preview of a grid arrangement.
//!
//! Draws the canvas scaled to fit a preview box, each cell with its index,
//! and for occupied cells the visible part of the image plus the full
//! placement rectangle as a dashed outline (it may extend past the cell).
//! Cells still decoding are hatched. Items beyond the last cell are listed
//! in a note under the canvas.
//!
//! # Example
//!
//! ```
//! use zengrid::{AssetId, GridSpec, ImageAsset, ImageSource, Sequence, svg::render_grid_svg};
//!
//! let spec = GridSpec::new(2, 2).gap(8).canvas(800, 600);
//! let mut source = ImageSource::new();
//! source.register(ImageAsset::new("a", 1600, 900, ()).unwrap()).unwrap();
//! source.begin_decode(AssetId::from("b")).unwrap();
//! let seq = Sequence::new().append(["a".into(), "b".into()]).unwrap();
//!
//! let svg = render_grid_svg(&spec, &seq, &source).unwrap();
//! assert!(svg.starts_with("<svg"));
//! ```

use alloc::format;
use alloc::string::String;
use core::fmt::Write as _;

use crate::error::GridError;
use crate::geometry::{CanvasColor, CellRect, GridSpec};
use crate::sequence::Sequence;
use crate::source::{DecodeState, ImageSource};

/// Largest preview width.
const MAX_W: f64 = 480.0;
/// Largest preview height.
const MAX_H: f64 = 360.0;
const MARGIN: f64 = 30.0;
const LABEL_H: f64 = 22.0;
const NOTE_H: f64 = 24.0;

/// Render `sequence` laid out on `spec` as an SVG document.
///
/// Fails like composition does: on an invalid grid, or when an id in a cell
/// is unknown to `source`.
pub fn render_grid_svg<P>(
    spec: &GridSpec,
    sequence: &Sequence,
    source: &ImageSource<P>,
) -> Result<String, GridError> {
    let cells = spec.cells()?;
    let scale = preview_scale(spec);
    let cw = f64::from(spec.canvas_width) * scale;
    let ch = f64::from(spec.canvas_height) * scale;
    let overflow = sequence.overflow(spec.cell_count());
    let note_h = if overflow.is_empty() { 0.0 } else { NOTE_H };
    let total_w = cw + 2.0 * MARGIN;
    let total_h = MARGIN + LABEL_H + ch + note_h + MARGIN;
    let (ox, oy) = (MARGIN, MARGIN + LABEL_H);

    let mut svg = String::with_capacity(4096);
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {:.1} {:.1}">"#,
        total_w.ceil() as u32,
        total_h.ceil() as u32,
        total_w,
        total_h
    );
    svg.push_str(STYLE);

    let _ = writeln!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" class="label">{}</text>"#,
        ox,
        MARGIN + 14.0,
        escape_xml(&format!(
            "{}×{} grid  {}×{} canvas  gap {}",
            spec.rows, spec.cols, spec.canvas_width, spec.canvas_height, spec.gap
        ))
    );
    let _ = writeln!(
        svg,
        r#"<rect x="{ox:.1}" y="{oy:.1}" width="{cw:.1}" height="{ch:.1}" class="canvas" fill="{}"/>"#,
        css_color(spec.background)
    );

    for (index, cell) in cells {
        let r = scaled(&cell, scale, ox, oy);
        let state = match sequence.get(index) {
            None => None,
            Some(id) => match source.state(id.as_str()) {
                Some(state) => Some((id, state)),
                None => return Err(GridError::UnknownAsset { id: id.clone() }),
            },
        };

        match state {
            None => rect(&mut svg, r, "cell empty"),
            Some((_, DecodeState::Pending)) => rect(&mut svg, r, "cell pending"),
            Some((id, DecodeState::Ready(asset))) => {
                let placement = spec.fit.resolve(&cell, asset.width(), asset.height())?;
                if let Some(visible) = placement.visible_in(&cell) {
                    rect(&mut svg, scaled(&visible, scale, ox, oy), "content");
                }
                rect(&mut svg, r, "cell");
                let _ = writeln!(
                    svg,
                    r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" class="placement"/>"#,
                    ox + placement.x * scale,
                    oy + placement.y * scale,
                    f64::from(placement.width) * scale,
                    f64::from(placement.height) * scale
                );
                let _ = writeln!(
                    svg,
                    r#"<text x="{:.1}" y="{:.1}" class="annotation" text-anchor="middle">{}</text>"#,
                    r.0 + r.2 / 2.0,
                    r.1 + r.3 - 6.0,
                    escape_xml(&format!("{id}  {}×{}", asset.width(), asset.height()))
                );
            }
        }
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" class="index">{index}</text>"#,
            r.0 + 4.0,
            r.1 + 13.0
        );
    }

    if !overflow.is_empty() {
        let names: alloc::vec::Vec<&str> = overflow.iter().map(|id| id.as_str()).collect();
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" class="annotation">{}</text>"#,
            ox,
            oy + ch + 16.0,
            escape_xml(&format!("+{} not shown: {}", overflow.len(), names.join(", ")))
        );
    }

    svg.push_str("</svg>\n");
    Ok(svg)
}

const STYLE: &str = r##"<style>
  text { font-family: "Consolas", "DejaVu Sans Mono", "Courier New", monospace; }
  .label { font-size: 13px; font-weight: bold; fill: #333; }
  .annotation { font-size: 11px; fill: #444; }
  .index { font-size: 11px; fill: #222; }
  .canvas { stroke: #999; stroke-width: 1; }
  .cell { fill: none; stroke: #2c6faa; stroke-width: 1; }
  .empty { fill: #e8e8e8; fill-opacity: 0.6; }
  .pending { fill: url(#hatch); }
  .content { fill: #6ba3d6; }
  .placement { fill: none; stroke: #2c6faa; stroke-width: 1; stroke-dasharray: 4,3; }
  @media (prefers-color-scheme: dark) {
    .label { fill: #e0e0e0; }
    .annotation { fill: #bbb; }
    .index { fill: #ddd; }
    .canvas { stroke: #555; }
    .cell { stroke: #5a9fd4; }
    .empty { fill: #2d2d2d; }
    .content { fill: #3a72a4; }
    .placement { stroke: #5a9fd4; }
  }
</style>
<defs>
  <pattern id="hatch" width="6" height="6" patternUnits="userSpaceOnUse" patternTransform="rotate(45)">
    <rect width="6" height="6" fill="#e8e8e8"/>
    <line x1="0" y1="0" x2="0" y2="6" stroke="#999" stroke-width="2"/>
  </pattern>
</defs>
"##;

fn preview_scale(spec: &GridSpec) -> f64 {
    let w = f64::from(spec.canvas_width.max(1));
    let h = f64::from(spec.canvas_height.max(1));
    (MAX_W / w).min(MAX_H / h)
}

/// `(x, y, w, h)` of `r` in preview coordinates.
fn scaled(r: &CellRect, scale: f64, ox: f64, oy: f64) -> (f64, f64, f64, f64) {
    (
        ox + f64::from(r.x) * scale,
        oy + f64::from(r.y) * scale,
        f64::from(r.width) * scale,
        f64::from(r.height) * scale,
    )
}

fn rect(svg: &mut String, (x, y, w, h): (f64, f64, f64, f64), class: &str) {
    let _ = writeln!(
        svg,
        r#"<rect x="{x:.1}" y="{y:.1}" width="{w:.1}" height="{h:.1}" class="{class}"/>"#
    );
}

fn css_color(color: CanvasColor) -> String {
    let [r, g, b, a] = color.to_rgba();
    if a == 255 {
        format!("#{r:02x}{g:02x}{b:02x}")
    } else {
        format!("rgba({r},{g},{b},{:.3})", f64::from(a) / 255.0)
    }
}

/// Escape special characters for XML text content.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
