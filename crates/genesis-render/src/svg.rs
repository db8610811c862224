//! SVG serialization of a [`Renderer`]'s visual tree.
//!
//! Labels are emitted as `<text>/<tspan>` (no `<foreignObject>`) so the output rasterizes with
//! renderers that have no HTML support.

use crate::Renderer;
use crate::model::{EdgeVisual, NodeVisual, VisualTree};
use genesis_core::geom::{Rect, js_number};
use std::fmt::Write as _;

const SVG_NS: &str = "http://www.w3.org/2000/svg";

const STYLESHEET: &str = "\
.genesis-mind{font-family:\"Segoe UI\",\"Helvetica Neue\",Arial,sans-serif;}\
.primary-link{fill:none;stroke:#7c8aa5;stroke-width:2;}\
.association-link{fill:none;stroke:#d9822b;stroke-width:2;stroke-dasharray:6 4;}\
.temp-link{fill:none;stroke:#d9822b;stroke-width:2;stroke-dasharray:2 4;}\
.link-label{fill:#5b4a2f;font-size:12px;text-anchor:middle;}\
.node-rect{fill:#ffffff;stroke:#3d4b66;stroke-width:1.5;}\
.node-root .node-rect{fill:#eef3ff;stroke:#2f5bd3;stroke-width:2;}\
.node-selected .node-rect{stroke:#e0457b;stroke-width:3;}\
.node-label{fill:#1f2430;text-anchor:middle;}";

#[derive(Debug, Clone, PartialEq)]
pub struct SvgRenderOptions {
    /// Fill for a full-size background rect; `None` leaves the canvas transparent.
    pub background: Option<String>,
    /// Root `<svg id>`.
    pub diagram_id: Option<String>,
    pub include_stylesheet: bool,
}

impl Default for SvgRenderOptions {
    fn default() -> Self {
        Self {
            background: None,
            diagram_id: None,
            include_stylesheet: true,
        }
    }
}

impl SvgRenderOptions {
    pub fn with_background(mut self, color: impl Into<String>) -> Self {
        self.background = Some(color.into());
        self
    }
}

/// Whole-document image: viewBox = content bounds, no pan/zoom.
pub fn render_export_svg(renderer: &Renderer, opts: &SvgRenderOptions) -> String {
    let bounds = renderer.content_bounds();
    let mut out = String::new();
    open_svg(&mut out, bounds, opts);
    out.push_str(r#"<g class="viewport">"#);
    write_layers(&mut out, renderer, false);
    out.push_str("</g></svg>");
    out
}

/// What the canvas currently shows: viewBox = viewport, pan/zoom on the root group, rubber band
/// included.
pub fn render_viewport_svg(renderer: &Renderer, opts: &SvgRenderOptions) -> String {
    let vp = renderer.viewport();
    let bounds = Rect::new(
        genesis_core::geom::point(0.0, 0.0),
        genesis_core::geom::point(vp.width.max(0.0), vp.height.max(0.0)),
    );
    let view = renderer.view();
    let mut out = String::new();
    open_svg(&mut out, bounds, opts);
    let _ = write!(
        &mut out,
        r#"<g class="viewport" transform="translate({},{}) scale({})">"#,
        js_number(view.pan.x),
        js_number(view.pan.y),
        js_number(view.zoom)
    );
    write_layers(&mut out, renderer, true);
    out.push_str("</g></svg>");
    out
}

fn open_svg(out: &mut String, bounds: Rect, opts: &SvgRenderOptions) {
    let w = bounds.width();
    let h = bounds.height();
    out.push_str("<svg");
    if let Some(id) = opts.diagram_id.as_deref() {
        let _ = write!(out, r#" id="{}""#, escape_xml(id));
    }
    let _ = write!(
        out,
        r#" xmlns="{SVG_NS}" class="genesis-mind" width="{}" height="{}" viewBox="{} {} {} {}">"#,
        js_number(w),
        js_number(h),
        js_number(bounds.min.x),
        js_number(bounds.min.y),
        js_number(w),
        js_number(h)
    );
    if opts.include_stylesheet {
        let _ = write!(out, "<style>{STYLESHEET}</style>");
    }
    if let Some(fill) = opts.background.as_deref() {
        let _ = write!(
            out,
            r#"<rect class="background" x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
            js_number(bounds.min.x),
            js_number(bounds.min.y),
            js_number(w),
            js_number(h),
            escape_xml(fill)
        );
    }
}

fn write_layers(out: &mut String, renderer: &Renderer, with_temp_link: bool) {
    let tree: &VisualTree = renderer.tree();

    out.push_str(r#"<g class="primary-links">"#);
    for edge in &tree.primary_links {
        write_edge(out, edge);
    }
    out.push_str("</g>");

    out.push_str(r#"<g class="association-links">"#);
    for edge in &tree.association_links {
        write_edge(out, edge);
    }
    out.push_str("</g>");

    out.push_str(r#"<g class="link-labels">"#);
    for label in &tree.link_labels {
        let _ = write!(
            out,
            r#"<text class="link-label" data-link-id="{}" x="{}" y="{}">{}</text>"#,
            escape_xml(&label.link_id),
            js_number(label.position.x),
            js_number(label.position.y),
            escape_xml(&label.text)
        );
    }
    out.push_str("</g>");

    if with_temp_link {
        if let Some(temp) = tree.temp_link.as_ref() {
            let _ = write!(
                out,
                r#"<path class="temp-link" data-source="{}" d="{}"/>"#,
                escape_xml(&temp.source),
                temp.path.to_svg_d()
            );
        }
    }

    out.push_str(r#"<g class="nodes">"#);
    for node in &tree.nodes {
        write_node(out, renderer, node);
    }
    out.push_str("</g>");
}

fn write_edge(out: &mut String, edge: &EdgeVisual) {
    let _ = write!(out, r#"<path class="{}""#, edge.kind.css_class());
    if let Some(id) = edge.link_id.as_deref() {
        let _ = write!(out, r#" data-link-id="{}""#, escape_xml(id));
    }
    let _ = write!(
        out,
        r#" data-source="{}" data-target="{}" d="{}"/>"#,
        escape_xml(&edge.source),
        escape_xml(&edge.target),
        edge.path.to_svg_d()
    );
}

fn write_node(out: &mut String, renderer: &Renderer, node: &NodeVisual) {
    let opts = renderer.options();
    let hw = opts.geometry.node_half_width;
    let hh = opts.geometry.node_half_height;
    let font_size = opts.label_style.font_size.max(1.0);
    let line_px = opts.label_line_px();

    out.push_str(r#"<g class="graph-node"#);
    if node.is_root {
        out.push_str(" node-root");
    }
    if node.selected {
        out.push_str(" node-selected");
    }
    let _ = write!(
        out,
        r#"" data-node-id="{}" transform="translate({},{})">"#,
        escape_xml(&node.id),
        js_number(node.position.x),
        js_number(node.position.y)
    );
    let _ = write!(
        out,
        r#"<rect class="node-rect" x="{}" y="{}" width="{}" height="{}" rx="12" ry="12"/>"#,
        js_number(-hw),
        js_number(-hh),
        js_number(2.0 * hw),
        js_number(2.0 * hh)
    );

    let _ = write!(out, r#"<text class="node-label" font-size="{}">"#, js_number(font_size));
    let n = node.lines.len().max(1) as f64;
    let first_baseline = -(n - 1.0) / 2.0 * line_px + font_size * 0.35;
    for (i, line) in node.lines.iter().enumerate() {
        let _ = write!(
            out,
            r#"<tspan x="0" y="{}">{}</tspan>"#,
            js_number(first_baseline + i as f64 * line_px),
            escape_xml(line)
        );
    }
    out.push_str("</text></g>");
}

/// JS-style number printing (`1`, `0.5`, never `-0`).
/// Escapes markup characters and drops code points XML 1.0 does not allow.
pub(crate) fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars().filter(|&c| is_xml_char(c)) {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}
