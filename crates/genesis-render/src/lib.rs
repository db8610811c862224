#![forbid(unsafe_code)]

//! Projection of a Genesis Mind document into a visual tree, plus SVG serialization.
//!
//! The [`Renderer`] subscribes to a [`genesis_core::GraphStore`], rebuilds its [`VisualTree`] on
//! every change and keeps per-node indexes so a drag can move one node without a rebuild.

pub mod model;
pub mod renderer;
pub mod svg;
pub mod text;

pub use model::{
    EdgeKind, EdgeVisual, LabelVisual, NodeVisual, TempLinkVisual, Viewport, VisualTree,
};
pub use renderer::{Renderer, SharedRenderer};

use crate::text::{DeterministicTextMeasurer, TextMeasurer, TextStyle};
use genesis_core::{EditorConfig, GeometryOptions};
use std::sync::Arc;

#[derive(Clone)]
pub struct RenderOptions {
    pub geometry: GeometryOptions,
    /// Added around the union of node rectangles by `content_bounds`.
    pub bounds_padding: f64,
    /// Bounds reported for an empty document.
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub label_style: TextStyle,
    pub label_line_height: f64,
    /// Gap between the node rectangle and its label box.
    pub label_inset: f64,
    pub text_measurer: Arc<dyn TextMeasurer + Send + Sync>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from_config(&EditorConfig::default())
    }
}

impl std::fmt::Debug for RenderOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderOptions")
            .field("geometry", &self.geometry)
            .field("bounds_padding", &self.bounds_padding)
            .field("canvas_width", &self.canvas_width)
            .field("canvas_height", &self.canvas_height)
            .field("label_style", &self.label_style)
            .finish_non_exhaustive()
    }
}

impl RenderOptions {
    pub fn from_config(cfg: &EditorConfig) -> Self {
        let label_line_height = cfg
            .get_f64("render.labelLineHeight")
            .filter(|v| *v > 0.0)
            .unwrap_or(1.35);
        Self {
            geometry: GeometryOptions::from_config(cfg),
            bounds_padding: cfg.get_f64("render.boundsPadding").unwrap_or(50.0),
            canvas_width: cfg.get_f64("render.canvasWidth").unwrap_or(1200.0),
            canvas_height: cfg.get_f64("render.canvasHeight").unwrap_or(800.0),
            label_style: TextStyle {
                font_family: cfg.get_str("render.labelFontFamily").map(str::to_string),
                font_size: cfg.get_f64("render.labelFontSize").unwrap_or(14.4),
                font_weight: None,
            },
            label_line_height,
            label_inset: cfg.get_f64("render.labelInset").unwrap_or(5.0),
            text_measurer: Arc::new(DeterministicTextMeasurer {
                char_width_factor: 0.0,
                line_height_factor: label_line_height,
            }),
        }
    }

    /// Width of the label box inside a node.
    pub fn label_width(&self) -> f64 {
        (2.0 * (self.geometry.node_half_width - self.label_inset)).max(1.0)
    }

    pub fn label_height(&self) -> f64 {
        (2.0 * (self.geometry.node_half_height - self.label_inset)).max(1.0)
    }

    pub fn label_line_px(&self) -> f64 {
        self.label_style.font_size.max(1.0) * self.label_line_height
    }

    /// How many wrapped lines fit in the label box (at least one).
    pub fn max_label_lines(&self) -> usize {
        let lines = (self.label_height() / self.label_line_px()).floor();
        if lines.is_finite() && lines >= 1.0 {
            lines as usize
        } else {
            1
        }
    }
}
