
//! Edge anchoring, curve and pan/zoom math. Everything here is pure.

use crate::EditorConfig;
use crate::model::ViewState;

/// Graph (model) coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphSpace;

/// Client/screen coordinate space, relative to the canvas origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScreenSpace;

pub type Point = euclid::Point2D<f64, GraphSpace>;
pub type Vector = euclid::Vector2D<f64, GraphSpace>;
pub type Rect = euclid::Box2D<f64, GraphSpace>;
pub type ScreenPoint = euclid::Point2D<f64, ScreenSpace>;
pub type ViewTransform = euclid::Transform2D<f64, GraphSpace, ScreenSpace>;

pub fn point(x: f64, y: f64) -> Point {
    euclid::point2(x, y)
}

pub fn vector(x: f64, y: f64) -> Vector {
    euclid::vec2(x, y)
}

pub fn screen_point(x: f64, y: f64) -> ScreenPoint {
    euclid::point2(x, y)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryOptions {
    pub node_half_width: f64,
    pub node_half_height: f64,
    /// Distance an edge endpoint is pulled back from the node border.
    pub anchor_margin: f64,
    /// Perpendicular offset of the quadratic control point.
    pub curve_bow: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for GeometryOptions {
    fn default() -> Self {
        Self {
            node_half_width: 110.0,
            node_half_height: 40.0,
            anchor_margin: 6.0,
            curve_bow: 30.0,
            min_zoom: 0.4,
            max_zoom: 2.5,
        }
    }
}

impl GeometryOptions {
    pub fn from_config(cfg: &EditorConfig) -> Self {
        let d = Self::default();
        let min_zoom = cfg
            .get_f64("geometry.minZoom")
            .filter(|z| *z > 0.0)
            .unwrap_or(d.min_zoom);
        let max_zoom = cfg
            .get_f64("geometry.maxZoom")
            .filter(|z| *z >= min_zoom)
            .unwrap_or(d.max_zoom.max(min_zoom));
        Self {
            node_half_width: cfg
                .get_f64("geometry.nodeHalfWidth")
                .unwrap_or(d.node_half_width)
                .max(1.0),
            node_half_height: cfg
                .get_f64("geometry.nodeHalfHeight")
                .unwrap_or(d.node_half_height)
                .max(1.0),
            anchor_margin: cfg
                .get_f64("geometry.anchorMargin")
                .unwrap_or(d.anchor_margin),
            curve_bow: cfg.get_f64("geometry.curveBow").unwrap_or(d.curve_bow),
            min_zoom,
            max_zoom,
        }
    }

    /// Clamps a zoom factor into `[min_zoom, max_zoom]`; non-finite input maps to 1.
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        if !zoom.is_finite() {
            return 1.0_f64.clamp(self.min_zoom, self.max_zoom);
        }
        zoom.clamp(self.min_zoom, self.max_zoom)
    }

    /// The node rectangle centered on `center`.
    pub fn node_rect(&self, center: Point) -> Rect {
        let half = vector(self.node_half_width, self.node_half_height);
        Rect::new(center - half, center + half)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

/// A quadratic Bézier from `start` to `end` through `control`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePath {
    pub start: Point,
    pub control: Point,
    pub end: Point,
}

impl CurvePath {
    pub fn point_at(&self, t: f64) -> Point {
        let u = 1.0 - t;
        let x = u * u * self.start.x + 2.0 * u * t * self.control.x + t * t * self.end.x;
        let y = u * u * self.start.y + 2.0 * u * t * self.control.y + t * t * self.end.y;
        point(x, y)
    }

    /// SVG path data: `M sx sy Q cx cy ex ey`.
    pub fn to_svg_d(&self) -> String {
        let mut out = String::from("M ");
        for (i, p) in [self.start, self.control, self.end].iter().enumerate() {
            if i == 1 {
                out.push_str(" Q ");
            } else if i == 2 {
                out.push(' ');
            }
            out.push_str(&js_number(p.x));
            out.push(' ');
            out.push_str(&js_number(p.y));
        }
        out
    }
}

/// Shortest round-trip form, as JavaScript prints numbers. Non-finite values and magnitudes
/// below `1e-9` (including `-0`) print as `0`.
pub fn js_number(v: f64) -> String {
    if !v.is_finite() || v.abs() < 1e-9 {
        return "0".to_string();
    }
    let mut buf = ryu_js::Buffer::new();
    buf.format_finite(v).to_string()
}

/// Where the ray from `center` toward `toward` leaves the node rectangle, pulled back inward by
/// `anchor_margin`.
pub fn anchor_from_center(center: Point, toward: Point, opts: &GeometryOptions) -> Point {
    let d = toward - center;
    if d.x == 0.0 && d.y == 0.0 {
        return center;
    }
    let abs_dx = d.x.abs();
    let abs_dy = d.y.abs();
    let scale = if abs_dx == 0.0 {
        opts.node_half_height / abs_dy
    } else if abs_dy == 0.0 {
        opts.node_half_width / abs_dx
    } else {
        (opts.node_half_width / abs_dx).min(opts.node_half_height / abs_dy)
    };
    let intersection = center + d * scale.min(1.0);
    let length = d.length();
    intersection - d * (opts.anchor_margin / length)
}

pub fn compute_segment(a: Point, b: Point, opts: &GeometryOptions) -> Segment {
    Segment {
        start: anchor_from_center(a, b, opts),
        end: anchor_from_center(b, a, opts),
    }
}

pub fn mid_point(a: Point, b: Point) -> Point {
    point((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

pub fn create_curve_path(start: Point, end: Point, opts: &GeometryOptions) -> CurvePath {
    let mid = mid_point(start, end);
    let d = end - start;
    let mut norm = d.x.hypot(d.y);
    if norm == 0.0 {
        norm = 1.0;
    }
    let offset = vector(-d.y / norm, d.x / norm) * opts.curve_bow;
    CurvePath {
        start,
        control: mid + offset,
        end,
    }
}

/// Edge curve between two node centers.
pub fn edge_path(source: Point, target: Point, opts: &GeometryOptions) -> CurvePath {
    let seg = compute_segment(source, target, opts);
    create_curve_path(seg.start, seg.end, opts)
}

/// Rubber-band curve from a node border to a free point.
pub fn node_to_point_path(node_center: Point, target: Point, opts: &GeometryOptions) -> CurvePath {
    let start = anchor_from_center(node_center, target, opts);
    create_curve_path(start, target, opts)
}

/// Zooms toward `(anchor_x, anchor_y)` (screen space) keeping that point fixed on screen.
///
/// The pan is derived from the clamped zoom, not the requested one.
pub fn apply_zoom_at_point(
    view: &ViewState,
    target_zoom: f64,
    anchor_x: f64,
    anchor_y: f64,
    opts: &GeometryOptions,
) -> ViewState {
    let old_zoom = if view.zoom.is_finite() && view.zoom > 0.0 {
        view.zoom
    } else {
        1.0
    };
    let new_zoom = if target_zoom.is_finite() {
        opts.clamp_zoom(target_zoom)
    } else {
        opts.clamp_zoom(old_zoom)
    };
    let ratio = new_zoom / old_zoom;
    let mut next = *view;
    next.pan.x = anchor_x - (anchor_x - view.pan.x) * ratio;
    next.pan.y = anchor_y - (anchor_y - view.pan.y) * ratio;
    next.zoom = new_zoom;
    next
}

/// Graph → screen mapping: `screen = graph * zoom + pan`.
pub fn view_transform(view: &ViewState) -> ViewTransform {
    ViewTransform::new(view.zoom, 0.0, 0.0, view.zoom, view.pan.x, view.pan.y)
}

pub fn graph_to_screen(view: &ViewState, p: Point) -> ScreenPoint {
    view_transform(view).transform_point(p)
}

pub fn screen_to_graph(view: &ViewState, p: ScreenPoint) -> Point {
    match view_transform(view).inverse() {
        Some(inv) => inv.transform_point(p),
        None => point(p.x, p.y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Position;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn anchor_on_horizontal_line_hits_side_minus_margin() {
        let opts = GeometryOptions::default();
        let a = anchor_from_center(point(0.0, 0.0), point(400.0, 0.0), &opts);
        assert!(approx(a.x, 104.0), "{a:?}");
        assert!(approx(a.y, 0.0));
    }

    #[test]
    fn anchor_on_vertical_line_hits_top_minus_margin() {
        let opts = GeometryOptions::default();
        let a = anchor_from_center(point(10.0, 10.0), point(10.0, -300.0), &opts);
        assert!(approx(a.x, 10.0));
        assert!(approx(a.y, -24.0), "{a:?}");
    }

    #[test]
    fn anchor_degenerate_returns_center() {
        let opts = GeometryOptions::default();
        let c = point(3.0, 4.0);
        assert_eq!(anchor_from_center(c, c, &opts), c);
    }

    #[test]
    fn anchor_toward_point_inside_rect_stays_on_segment() {
        let opts = GeometryOptions::default();
        let a = anchor_from_center(point(0.0, 0.0), point(20.0, 0.0), &opts);
        assert!(approx(a.x, 14.0), "{a:?}");
    }

    #[test]
    fn segment_is_symmetric() {
        let opts = GeometryOptions::default();
        let seg = compute_segment(point(200.0, 400.0), point(600.0, 400.0), &opts);
        assert!(approx(seg.start.x, 304.0));
        assert!(approx(seg.end.x, 496.0));
    }

    #[test]
    fn curve_control_is_bowed_perpendicular() {
        let opts = GeometryOptions::default();
        let c = create_curve_path(point(0.0, 0.0), point(100.0, 0.0), &opts);
        assert!(approx(c.control.x, 50.0));
        assert!(approx(c.control.y, 30.0));
        let mid = c.point_at(0.5);
        assert!(approx(mid.y, 15.0));
    }

    #[test]
    fn curve_path_data_prints_js_numbers() {
        let opts = GeometryOptions::default();
        let c = create_curve_path(point(0.0, 0.0), point(100.0, 0.0), &opts);
        assert_eq!(c.to_svg_d(), "M 0 0 Q 50 30 100 0");
        let c = create_curve_path(point(0.5, -0.0), point(0.5, 10.0), &opts);
        assert_eq!(c.to_svg_d(), "M 0.5 0 Q -29.5 5 0.5 10");
    }

    #[test]
    fn numbers_print_like_js() {
        assert_eq!(js_number(1.0), "1");
        assert_eq!(js_number(-0.0), "0");
        assert!(js_number(-0.0).chars().all(|c| c != '-'));
        assert_eq!(js_number(0.5), "0.5");
        assert_eq!(js_number(-2.25), "-2.25");
        assert_eq!(js_number(f64::NAN), "0");
        assert_eq!(js_number(f64::INFINITY), "0");
        assert_eq!(js_number(1e-12), "0");
        assert_eq!(js_number(1e21), "1e+21");
    }

    #[test]
    fn curve_with_coincident_endpoints_does_not_divide_by_zero() {
        let opts = GeometryOptions::default();
        let c = create_curve_path(point(5.0, 5.0), point(5.0, 5.0), &opts);
        assert_eq!(c.control, point(5.0, 5.0));
    }

    #[test]
    fn zoom_is_clamped_high_and_pan_uses_clamped_value() {
        let opts = GeometryOptions::default();
        let view = ViewState::default();
        let next = apply_zoom_at_point(&view, 10.0, 100.0, 50.0, &opts);
        assert!(approx(next.zoom, 2.5));
        assert!(approx(next.pan.x, 100.0 - 100.0 * 2.5));
        assert!(approx(next.pan.y, 50.0 - 50.0 * 2.5));
    }

    #[test]
    fn zoom_is_clamped_low() {
        let opts = GeometryOptions::default();
        let view = ViewState {
            pan: Position::new(20.0, -10.0),
            zoom: 1.0,
        };
        let next = apply_zoom_at_point(&view, 0.01, 0.0, 0.0, &opts);
        assert!(approx(next.zoom, 0.4));
        assert!(approx(next.pan.x, 8.0));
        assert!(approx(next.pan.y, -4.0));
    }

    #[test]
    fn zoom_keeps_anchor_fixed_on_screen() {
        let opts = GeometryOptions::default();
        let view = ViewState {
            pan: Position::new(30.0, 40.0),
            zoom: 1.2,
        };
        let anchor = screen_point(300.0, 200.0);
        let before = screen_to_graph(&view, anchor);
        let next = apply_zoom_at_point(&view, 1.7, anchor.x, anchor.y, &opts);
        let after = graph_to_screen(&next, before);
        assert!(approx(after.x, anchor.x));
        assert!(approx(after.y, anchor.y));
    }

    #[test]
    fn screen_graph_mapping_round_trips() {
        let view = ViewState {
            pan: Position::new(-15.0, 22.0),
            zoom: 0.8,
        };
        let p = point(123.0, -45.0);
        let back = screen_to_graph(&view, graph_to_screen(&view, p));
        assert!(approx(back.x, p.x) && approx(back.y, p.y));
    }

    #[test]
    fn options_follow_config_overrides() {
        let cfg = EditorConfig::with_overrides(&serde_json::json!({
            "geometry": { "nodeHalfWidth": 60, "maxZoom": 4 }
        }));
        let opts = GeometryOptions::from_config(&cfg);
        assert!(approx(opts.node_half_width, 60.0));
        assert!(approx(opts.max_zoom, 4.0));
        assert!(approx(opts.node_half_height, 40.0));
    }
}
