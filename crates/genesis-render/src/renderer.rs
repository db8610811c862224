use crate::RenderOptions;
use crate::model::{
    EdgeKind, EdgeVisual, LabelVisual, NodeVisual, TempLinkVisual, Viewport, VisualTree,
};
use crate::text::wrap_label;
use genesis_core::geom::{
    self, Point, Rect, ScreenPoint, edge_path, graph_to_screen, mid_point, node_to_point_path,
    screen_point, screen_to_graph,
};
use genesis_core::{Document, Position, SharedStore, SubscriptionId, ViewState};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub type SharedRenderer = Rc<RefCell<Renderer>>;

/// Derives a [`VisualTree`] from document snapshots.
pub struct Renderer {
    options: RenderOptions,
    tree: VisualTree,
    node_slots: FxHashMap<String, usize>,
    primary_adjacency: FxHashMap<String, Vec<usize>>,
    association_adjacency: FxHashMap<String, Vec<usize>>,
    label_slots: FxHashMap<String, usize>,
    positions: FxHashMap<String, Point>,
    selected: Option<String>,
    view: ViewState,
    viewport: Viewport,
    revision: u64,
    subscription: Option<SubscriptionId>,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("nodes", &self.tree.nodes.len())
            .field("selected", &self.selected)
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(RenderOptions::default())
    }
}

impl Renderer {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            tree: VisualTree::default(),
            node_slots: FxHashMap::default(),
            primary_adjacency: FxHashMap::default(),
            association_adjacency: FxHashMap::default(),
            label_slots: FxHashMap::default(),
            positions: FxHashMap::default(),
            selected: None,
            view: ViewState::default(),
            viewport: Viewport::default(),
            revision: 0,
            subscription: None,
        }
    }

    /// Creates a renderer, subscribes it to `store` and renders the current document.
    ///
    /// The subscription holds a weak handle; dropping every [`SharedRenderer`] clone turns
    /// further notifications into no-ops.
    pub fn attach(store: &SharedStore, options: RenderOptions) -> SharedRenderer {
        let renderer = Rc::new(RefCell::new(Self::new(options)));
        let weak: Weak<RefCell<Self>> = Rc::downgrade(&renderer);
        let mut store = store.borrow_mut();
        let id = store.subscribe(move |doc| {
            let Some(renderer) = weak.upgrade() else {
                return;
            };
            match renderer.try_borrow_mut() {
                Ok(mut r) => r.render(doc),
                Err(_) => tracing::warn!("renderer busy during notify; snapshot skipped"),
            }
        });
        {
            let mut r = renderer.borrow_mut();
            r.subscription = Some(id);
            r.render(store.document());
        }
        renderer
    }

    /// Unsubscribes from `store`. Returns false when the renderer was not attached.
    pub fn detach(&mut self, store: &SharedStore) -> bool {
        match self.subscription.take() {
            Some(id) => store.borrow_mut().unsubscribe(id),
            None => false,
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn tree(&self) -> &VisualTree {
        &self.tree
    }

    /// Bumped on every full rebuild (not on fast-path updates).
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    /// Live pan/zoom feedback without a rebuild.
    pub fn set_view(&mut self, view: ViewState) {
        self.view = view;
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn selected_node(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn node_visual(&self, id: &str) -> Option<&NodeVisual> {
        self.node_slots.get(id).map(|&i| &self.tree.nodes[i])
    }

    /// Current visual position (reflects fast-path moves).
    pub fn node_position(&self, id: &str) -> Option<Point> {
        self.positions.get(id).copied()
    }

    /// Ids of every node element, in draw order.
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.tree.nodes.iter().map(|n| n.id.as_str())
    }

    /// Full rebuild of every layer and index from `doc`.
    pub fn render(&mut self, doc: &Document) {
        let geometry = self.options.geometry;
        self.view = doc.view_state;
        self.node_slots.clear();
        self.primary_adjacency.clear();
        self.association_adjacency.clear();
        self.label_slots.clear();
        self.positions.clear();

        for node in &doc.graph.nodes {
            self.positions.insert(node.id.clone(), node.position.to_point());
        }

        let mut primary_links = Vec::new();
        for node in &doc.graph.nodes {
            let Some(parent) = node.parent.as_deref() else {
                continue;
            };
            let (Some(&from), Some(&to)) = (self.positions.get(parent), self.positions.get(&node.id))
            else {
                continue;
            };
            let slot = primary_links.len();
            register(&mut self.primary_adjacency, parent, slot);
            register(&mut self.primary_adjacency, &node.id, slot);
            primary_links.push(EdgeVisual {
                kind: EdgeKind::Primary,
                link_id: None,
                source: parent.to_string(),
                target: node.id.clone(),
                path: edge_path(from, to, &geometry),
            });
        }

        let mut association_links = Vec::new();
        let mut link_labels = Vec::new();
        for link in &doc.graph.links {
            let (Some(&from), Some(&to)) = (
                self.positions.get(&link.source),
                self.positions.get(&link.target),
            ) else {
                continue;
            };
            let path = edge_path(from, to, &geometry);
            let slot = association_links.len();
            register(&mut self.association_adjacency, &link.source, slot);
            register(&mut self.association_adjacency, &link.target, slot);
            if !link.label.is_empty() {
                self.label_slots.insert(link.id.clone(), link_labels.len());
                link_labels.push(LabelVisual {
                    link_id: link.id.clone(),
                    text: link.label.clone(),
                    position: mid_point(path.start, path.end),
                });
            }
            association_links.push(EdgeVisual {
                kind: EdgeKind::Association,
                link_id: Some(link.id.clone()),
                source: link.source.clone(),
                target: link.target.clone(),
                path,
            });
        }

        let label_width = self.options.label_width();
        let max_lines = self.options.max_label_lines();
        let mut nodes = Vec::with_capacity(doc.graph.nodes.len());
        for node in &doc.graph.nodes {
            self.node_slots.insert(node.id.clone(), nodes.len());
            nodes.push(NodeVisual {
                id: node.id.clone(),
                content: node.content.clone(),
                lines: wrap_label(
                    &node.content,
                    self.options.text_measurer.as_ref(),
                    &self.options.label_style,
                    label_width,
                    max_lines,
                ),
                is_root: node.is_root,
                selected: self.selected.as_deref() == Some(node.id.as_str()),
                position: node.position.to_point(),
            });
        }

        let temp_link = self.tree.temp_link.take().and_then(|t| {
            let center = self.positions.get(&t.source)?;
            Some(TempLinkVisual {
                path: node_to_point_path(*center, t.toward, &geometry),
                ..t
            })
        });

        self.tree = VisualTree {
            primary_links,
            association_links,
            link_labels,
            nodes,
            temp_link,
        };
        self.revision += 1;
        tracing::trace!(
            revision = self.revision,
            nodes = self.tree.nodes.len(),
            edges = self.tree.primary_links.len() + self.tree.association_links.len(),
            "full render"
        );
    }

    /// Fast path for drags: moves one node and re-routes only the edges touching it.
    ///
    /// Returns false when the node is not part of the current tree.
    pub fn update_node_position_visual(&mut self, id: &str, position: Position) -> bool {
        let Some(&slot) = self.node_slots.get(id) else {
            return false;
        };
        let p = position.to_point();
        self.tree.nodes[slot].position = p;
        self.positions.insert(id.to_string(), p);
        let geometry = self.options.geometry;

        let mut touched = 0usize;
        if let Some(slots) = self.primary_adjacency.get(id) {
            for &i in slots {
                let edge = &mut self.tree.primary_links[i];
                if let (Some(&from), Some(&to)) =
                    (self.positions.get(&edge.source), self.positions.get(&edge.target))
                {
                    edge.path = edge_path(from, to, &geometry);
                    touched += 1;
                }
            }
        }
        if let Some(slots) = self.association_adjacency.get(id) {
            for &i in slots {
                let edge = &mut self.tree.association_links[i];
                let (Some(&from), Some(&to)) =
                    (self.positions.get(&edge.source), self.positions.get(&edge.target))
                else {
                    continue;
                };
                edge.path = edge_path(from, to, &geometry);
                touched += 1;
                let label_slot = edge
                    .link_id
                    .as_deref()
                    .and_then(|link_id| self.label_slots.get(link_id));
                if let Some(&l) = label_slot {
                    self.tree.link_labels[l].position = mid_point(edge.path.start, edge.path.end);
                }
            }
        }
        if let Some(temp) = self.tree.temp_link.as_mut() {
            if temp.source == id {
                temp.path = node_to_point_path(p, temp.toward, &geometry);
            }
        }
        tracing::trace!(node_id = id, edges = touched, "fast-path move");
        true
    }

    /// Shows (or moves) the rubber band from `source` toward `toward`. False for unknown nodes.
    pub fn set_temp_link(&mut self, source: &str, toward: Point) -> bool {
        let Some(&center) = self.positions.get(source) else {
            self.tree.temp_link = None;
            return false;
        };
        self.tree.temp_link = Some(TempLinkVisual {
            source: source.to_string(),
            toward,
            path: node_to_point_path(center, toward, &self.options.geometry),
        });
        true
    }

    pub fn clear_temp_link(&mut self) {
        self.tree.temp_link = None;
    }

    /// Exclusive selection highlight; touches only the `selected` flags.
    pub fn set_selected_node(&mut self, id: Option<&str>) {
        self.selected = id.map(str::to_string);
        for node in &mut self.tree.nodes {
            node.selected = id == Some(node.id.as_str());
        }
    }

    /// Client (page) coordinates → graph coordinates through the viewport origin and pan/zoom.
    pub fn client_point_to_graph(&self, client_x: f64, client_y: f64) -> Point {
        let local = screen_point(client_x - self.viewport.left, client_y - self.viewport.top);
        screen_to_graph(&self.view, local)
    }

    /// Canvas-local screen coordinates of a graph point (client minus viewport origin).
    pub fn graph_point_to_screen(&self, p: Point) -> ScreenPoint {
        graph_to_screen(&self.view, p)
    }

    pub fn graph_point_to_client(&self, p: Point) -> ScreenPoint {
        let local = self.graph_point_to_screen(p);
        screen_point(local.x + self.viewport.left, local.y + self.viewport.top)
    }

    /// Union of all node rectangles plus padding; the default canvas box when empty.
    pub fn content_bounds(&self) -> Rect {
        let geometry = &self.options.geometry;
        let bounds = self
            .tree
            .nodes
            .iter()
            .map(|n| geometry.node_rect(n.position))
            .reduce(|a, b| a.union(&b));
        match bounds {
            Some(b) => b.inflate(self.options.bounds_padding, self.options.bounds_padding),
            None => Rect::new(
                geom::point(0.0, 0.0),
                geom::point(self.options.canvas_width, self.options.canvas_height),
            ),
        }
    }

    /// Topmost node whose rectangle contains `p` (edges inclusive).
    pub fn hit_test_node(&self, p: Point) -> Option<&str> {
        let geometry = &self.options.geometry;
        self.tree.nodes.iter().rev().find_map(|n| {
            let r = geometry.node_rect(n.position);
            let inside = p.x >= r.min.x && p.x <= r.max.x && p.y >= r.min.y && p.y <= r.max.y;
            inside.then_some(n.id.as_str())
        })
    }
}

fn register(map: &mut FxHashMap<String, Vec<usize>>, key: &str, slot: usize) {
    map.entry(key.to_string()).or_default().push(slot);
}
