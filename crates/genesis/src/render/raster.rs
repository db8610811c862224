//! PNG export of the whole document.

use super::{Renderer, SvgRenderOptions, render_export_svg};

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("failed to parse SVG")]
    SvgParse,
    #[error("failed to allocate pixmap for raster rendering")]
    PixmapAlloc,
    #[error("failed to encode PNG")]
    PngEncode,
}

pub type Result<T> = std::result::Result<T, RasterError>;

#[derive(Debug, Clone)]
pub struct RasterOptions {
    pub scale: f32,
    /// CSS-ish color (`white`, `#rgb`, `#rrggbbaa`, ...); unknown values leave the canvas clear.
    pub background: Option<String>,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            scale: 2.0,
            background: Some("white".to_string()),
        }
    }
}

/// Options for [`export_image`].
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub raster: RasterOptions,
    pub diagram_id: Option<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            raster: RasterOptions::default(),
            diagram_id: Some("genesis-mind".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutput {
    Png { bytes: Vec<u8> },
    /// Rasterization failed; the serialized SVG is handed back instead.
    Svg { text: String },
}

impl ExportOutput {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png { .. } => "png",
            Self::Svg { .. } => "svg",
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Png { bytes } => bytes,
            Self::Svg { text } => text.as_bytes(),
        }
    }
}

/// Serializes the visual tree (content bounds, solid background) and rasterizes it. Any raster
/// failure degrades to the SVG text.
pub fn export_image(renderer: &Renderer, options: &ExportOptions) -> ExportOutput {
    let background = options
        .raster
        .background
        .clone()
        .unwrap_or_else(|| "white".to_string());
    let svg_options = SvgRenderOptions {
        diagram_id: options.diagram_id.clone(),
        ..SvgRenderOptions::default()
    }
    .with_background(background);
    let svg = render_export_svg(renderer, &svg_options);
    match svg_to_png(&svg, &options.raster) {
        Ok(bytes) => {
            tracing::debug!(bytes = bytes.len(), "exported png");
            ExportOutput::Png { bytes }
        }
        Err(err) => {
            tracing::warn!(%err, "png export failed; falling back to svg");
            ExportOutput::Svg { text: svg }
        }
    }
}

pub fn svg_to_png(svg: &str, options: &RasterOptions) -> Result<Vec<u8>> {
    let pixmap = svg_to_pixmap(svg, options.scale, options.background.as_deref())?;
    pixmap.encode_png().map_err(|_| RasterError::PngEncode)
}

fn svg_to_pixmap(svg: &str, scale: f32, background: Option<&str>) -> Result<tiny_skia::Pixmap> {
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    opt.font_family = "Arial".to_string();

    let tree = usvg::Tree::from_str(svg, &opt).map_err(|_| RasterError::SvgParse)?;

    // Export SVGs carry width/height equal to their viewBox, so the tree size is the image size.
    let size = tree.size();
    if !scale.is_finite() || scale <= 0.0 {
        return Err(RasterError::PixmapAlloc);
    }
    let width_px = (size.width() * scale).ceil().max(1.0) as u32;
    let height_px = (size.height() * scale).ceil().max(1.0) as u32;

    let mut pixmap = tiny_skia::Pixmap::new(width_px, height_px).ok_or(RasterError::PixmapAlloc)?;

    if let Some(color) = background.and_then(parse_tiny_skia_color) {
        pixmap.fill(color);
    }

    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );
    Ok(pixmap)
}

pub fn parse_tiny_skia_color(text: &str) -> Option<tiny_skia::Color> {
    let s = text.trim().to_ascii_lowercase();
    match s.as_str() {
        "transparent" => return Some(tiny_skia::Color::from_rgba8(0, 0, 0, 0)),
        "white" => return Some(tiny_skia::Color::from_rgba8(255, 255, 255, 255)),
        "black" => return Some(tiny_skia::Color::from_rgba8(0, 0, 0, 255)),
        _ => {}
    }

    let hex = s.strip_prefix('#')?;
    let nibble = |c: u8| (c as char).to_digit(16).map(|v| v as u8);
    let short = |c: u8| nibble(c).map(|v| (v << 4) | v);
    let pair = |hi: u8, lo: u8| Some((nibble(hi)? << 4) | nibble(lo)?);

    let b = hex.as_bytes();
    let (r, g, bl, a) = match b.len() {
        3 => (short(b[0])?, short(b[1])?, short(b[2])?, 255),
        4 => (short(b[0])?, short(b[1])?, short(b[2])?, short(b[3])?),
        6 => (pair(b[0], b[1])?, pair(b[2], b[3])?, pair(b[4], b[5])?, 255),
        8 => (
            pair(b[0], b[1])?,
            pair(b[2], b[3])?,
            pair(b[4], b[5])?,
            pair(b[6], b[7])?,
        ),
        _ => return None,
    };
    Some(tiny_skia::Color::from_rgba8(r, g, bl, a))
}
