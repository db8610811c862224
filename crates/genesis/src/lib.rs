#![forbid(unsafe_code)]

//! `genesis` is a headless Genesis Mind editor: a two-rooted mind map with association links.
//!
//! The document lives in a [`GraphStore`]; a [`render::Renderer`] projects it into a visual
//! tree and SVG; the [`interact::InteractionController`] turns pointer/keyboard input into store
//! mutations; [`ui::UiControls`] and [`compare::ComparisonSession`] cover the command surface.
//! [`app::GenesisApp`] wires everything together.
//!
//! # Features
//!
//! - `raster`: PNG export via pure-Rust SVG rasterization (`genesis::render::raster`)

pub use genesis_core::*;

pub mod app;
pub mod compare;
pub mod interact;
pub mod ui;

pub mod render {
    pub use genesis_render::model::{
        EdgeKind, EdgeVisual, LabelVisual, NodeVisual, TempLinkVisual, Viewport, VisualTree,
    };
    pub use genesis_render::svg::{SvgRenderOptions, render_export_svg, render_viewport_svg};
    pub use genesis_render::text::{DeterministicTextMeasurer, TextMeasurer, TextStyle};
    pub use genesis_render::{RenderOptions, Renderer, SharedRenderer};

    #[cfg(feature = "raster")]
    pub mod raster;

    #[derive(Debug, thiserror::Error)]
    pub enum HeadlessError {
        #[error(transparent)]
        Core(#[from] genesis_core::Error),
    }

    pub type Result<T> = std::result::Result<T, HeadlessError>;

    /// Converts an arbitrary string into a conservative SVG `id` token.
    ///
    /// Unsupported characters become `-`, runs of `-` collapse, and the id always starts with an
    /// ASCII letter (`g-` is prefixed when needed).
    pub fn sanitize_svg_id(raw: &str) -> String {
        let raw = raw.trim();
        let mut out = String::with_capacity(raw.len() + 2);
        for ch in raw.chars() {
            let ok = ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == ':' || ch == '.';
            out.push(if ok { ch } else { '-' });
        }
        while out.contains("--") {
            out = out.replace("--", "-");
        }
        let out = out.trim_matches('-');
        if out.is_empty() {
            return "g-untitled".to_string();
        }
        if out.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
            out.to_string()
        } else {
            format!("g-{out}")
        }
    }

    /// Loads `text` into a fresh store and renders it (export framing, white background).
    pub fn render_document_svg_sync(
        text: &str,
        options: &RenderOptions,
        svg: &SvgRenderOptions,
    ) -> Result<String> {
        let mut store = genesis_core::GraphStore::new();
        genesis_core::persist::load_document_text(&mut store, text)?;
        let mut renderer = Renderer::new(options.clone());
        renderer.render(store.document());
        Ok(render_export_svg(&renderer, svg))
    }

    pub async fn render_document_svg(
        text: &str,
        options: &RenderOptions,
        svg: &SvgRenderOptions,
    ) -> Result<String> {
        render_document_svg_sync(text, options, svg)
    }

}
