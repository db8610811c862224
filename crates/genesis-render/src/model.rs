use genesis_core::geom::{CurvePath, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Derived from a node's `parent` field.
    Primary,
    /// An explicit [`genesis_core::Link`].
    Association,
}

impl EdgeKind {
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Primary => "primary-link",
            Self::Association => "association-link",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeVisual {
    pub kind: EdgeKind,
    /// Set for association edges only.
    pub link_id: Option<String>,
    pub source: String,
    pub target: String,
    pub path: CurvePath,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelVisual {
    pub link_id: String,
    pub text: String,
    pub position: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeVisual {
    pub id: String,
    pub content: String,
    /// `content` wrapped to the node box.
    pub lines: Vec<String>,
    pub is_root: bool,
    pub selected: bool,
    pub position: Point,
}

/// Rubber band drawn while linking, from the source node border to the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct TempLinkVisual {
    pub source: String,
    pub toward: Point,
    pub path: CurvePath,
}

/// Layers in draw order: primary edges, association edges, labels, nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisualTree {
    pub primary_links: Vec<EdgeVisual>,
    pub association_links: Vec<EdgeVisual>,
    pub link_labels: Vec<LabelVisual>,
    pub nodes: Vec<NodeVisual>,
    pub temp_link: Option<TempLinkVisual>,
}

impl VisualTree {
    pub fn edges(&self) -> impl Iterator<Item = &EdgeVisual> {
        self.primary_links.iter().chain(self.association_links.iter())
    }
}

/// Placement of the canvas in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width: 1200.0,
            height: 800.0,
        }
    }
}
