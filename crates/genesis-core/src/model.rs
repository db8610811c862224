use crate::geom::{self, Point};
use serde::{Deserialize, Serialize};

pub const ROOT_INSIGHT_ID: &str = "root_insight";
pub const ROOT_ACTION_ID: &str = "root_action";
pub const ROOT_IDS: [&str; 2] = [ROOT_INSIGHT_ID, ROOT_ACTION_ID];

pub const DOCUMENT_VERSION: &str = "1.0.0";
pub const DEFAULT_MIND_TYPE: &str = "daily";

pub const ROOT_INSIGHT_CONTENT: &str = "\u{1F48E} Insights";
pub const ROOT_ACTION_CONTENT: &str = "\u{1F680} Actions";
pub const DEFAULT_NODE_CONTENT: &str = "New node";
pub const DEFAULT_BRANCH_CONTENT: &str = "New branch";

pub fn is_root_id(id: &str) -> bool {
    ROOT_IDS.contains(&id)
}

/// A point in graph (model) coordinates as stored in documents.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn to_point(self) -> Point {
        geom::point(self.x, self.y)
    }
}

impl From<Point> for Position {
    fn from(p: Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<Position> for Point {
    fn from(p: Position) -> Self {
        p.to_point()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub parent: Option<String>,
    pub content: String,
    #[serde(rename = "isRoot")]
    pub is_root: bool,
    pub position: Position,
}

impl Node {
    pub(crate) fn default_root(id: &str) -> Option<Self> {
        let (content, position) = match id {
            ROOT_INSIGHT_ID => (ROOT_INSIGHT_CONTENT, Position::new(200.0, 400.0)),
            ROOT_ACTION_ID => (ROOT_ACTION_CONTENT, Position::new(600.0, 400.0)),
            _ => return None,
        };
        Some(Self {
            id: id.to_string(),
            parent: None,
            content: content.to_string(),
            is_root: true,
            position,
        })
    }

    pub(crate) fn default_roots() -> Vec<Self> {
        ROOT_IDS
            .iter()
            .filter_map(|id| Self::default_root(id))
            .collect()
    }
}

/// An association edge. An empty `label` means "no label".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub label: String,
}

impl Link {
    /// True when the link joins `a` and `b` in either direction.
    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub pan: Position,
    pub zoom: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            pan: Position::default(),
            zoom: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub created_at: String,
    pub created_stamp: String,
    pub last_updated: String,
    pub mind_type: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub version: String,
    pub metadata: Metadata,
    pub graph: Graph,
    #[serde(rename = "viewState")]
    pub view_state: ViewState,
}

impl Document {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.graph.nodes.iter().find(|n| n.id == id)
    }

    pub fn link(&self, id: &str) -> Option<&Link> {
        self.graph.links.iter().find(|l| l.id == id)
    }

    pub fn roots(&self) -> impl Iterator<Item = &Node> {
        self.graph.nodes.iter().filter(|n| n.is_root)
    }
}
