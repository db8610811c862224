//! The canonical mind-map document and every mutation on it.

mod index;


use crate::config::EditorConfig;
use crate::error::{Error, Result};
use crate::geom::GeometryOptions;
use crate::ids::generate_id;
use crate::model::{
    DEFAULT_MIND_TYPE, DOCUMENT_VERSION, Document, Graph, Link, Metadata, Node, Position,
    ViewState,
};
use crate::normalize::{normalize_document, normalize_view_state};
use crate::persist::sanitize_type_label;
use crate::time::Clock;
use chrono::{DateTime, FixedOffset};
use index::GraphIndex;
use rustc_hash::FxHashSet;
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// Single-threaded shared handle owned by the application root.
pub type SharedStore = Rc<RefCell<GraphStore>>;

type Subscriber = Box<dyn FnMut(&Document)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Skip subscriber notification (high-frequency drag feedback).
    pub silent: bool,
}

impl UpdateOptions {
    pub const NOTIFY: Self = Self { silent: false };
    pub const SILENT: Self = Self { silent: true };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added { link_id: String },
    Removed { link_ids: Vec<String> },
    Failed,
}

pub struct GraphStore {
    doc: Document,
    index: GraphIndex,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
    clock: Clock,
    geometry: GeometryOptions,
    child_offset: Position,
}

impl std::fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphStore")
            .field("doc", &self.doc)
            .field("subscribers", &self.subscribers.len())
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

fn default_document(clock: &Clock) -> Document {
    let now = clock.now_iso();
    Document {
        version: DOCUMENT_VERSION.to_string(),
        metadata: Metadata {
            created_at: now.clone(),
            created_stamp: clock.now_stamp(),
            last_updated: now,
            mind_type: DEFAULT_MIND_TYPE.to_string(),
        },
        graph: Graph {
            nodes: Node::default_roots(),
            links: Vec::new(),
        },
        view_state: ViewState::default(),
    }
}

impl GraphStore {
    pub fn new() -> Self {
        let clock = Clock::system();
        let doc = default_document(&clock);
        Self {
            index: GraphIndex::build(&doc.graph.nodes),
            doc,
            subscribers: Vec::new(),
            next_subscription: 0,
            clock,
            geometry: GeometryOptions::default(),
            child_offset: Position::new(80.0, -80.0),
        }
    }

    /// Convenience for `GraphStore::new().into_shared()`.
    pub fn shared() -> SharedStore {
        Self::new().into_shared()
    }

    pub fn into_shared(self) -> SharedStore {
        Rc::new(RefCell::new(self))
    }

    /// Overrides "now" for deterministic output. Re-creates the default document, so call it
    /// right after construction.
    pub fn with_fixed_now(self, now: Option<DateTime<FixedOffset>>) -> Self {
        self.with_clock(now.map(Clock::fixed).unwrap_or_default())
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self.replace_document(default_document(&self.clock));
        self
    }

    /// Reads zoom bounds and the default child offset.
    pub fn with_config(mut self, cfg: &EditorConfig) -> Self {
        self.geometry = GeometryOptions::from_config(cfg);
        self.child_offset = Position::new(
            cfg.get_f64("graph.childOffsetX").unwrap_or(80.0),
            cfg.get_f64("graph.childOffsetY").unwrap_or(-80.0),
        );
        self.doc.view_state = normalize_view_state(self.doc.view_state, &self.geometry);
        self
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn geometry(&self) -> &GeometryOptions {
        &self.geometry
    }

    /// Deep copy of the current document.
    pub fn get_state(&self) -> Document {
        self.doc.clone()
    }

    /// Borrowed view of the current document.
    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.slot(id).map(|i| &self.doc.graph.nodes[i])
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.index.slot(id).is_some()
    }

    pub fn node_count(&self) -> usize {
        self.doc.graph.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.doc.graph.links.len()
    }

    pub fn children_of(&self, id: &str) -> &[String] {
        self.index.children(id)
    }

    /// `id` plus its full transitive descendant set; empty when `id` is unknown.
    pub fn descendants_of(&self, id: &str) -> Vec<String> {
        if !self.contains_node(id) {
            return Vec::new();
        }
        self.index.descendant_closure(id)
    }

    pub fn mind_type(&self) -> &str {
        &self.doc.metadata.mind_type
    }

    pub fn view_state(&self) -> ViewState {
        self.doc.view_state
    }

    pub fn reset(&mut self) {
        tracing::debug!("resetting document");
        self.replace_document(default_document(&self.clock));
        self.notify();
    }

    /// Validates, normalizes and bulk-replaces the document. On error nothing changes.
    pub fn load_from_data(&mut self, raw: &Value) -> Result<()> {
        let doc = normalize_document(raw, &self.clock, &self.geometry)?;
        tracing::debug!(
            nodes = doc.graph.nodes.len(),
            links = doc.graph.links.len(),
            "loaded document"
        );
        self.replace_document(doc);
        self.notify();
        Ok(())
    }

    pub fn add_node(
        &mut self,
        parent_id: &str,
        content: impl Into<String>,
        position: Option<Position>,
    ) -> Result<String> {
        let Some(parent) = self.node(parent_id) else {
            return Err(Error::NotFound {
                node_id: parent_id.to_string(),
            });
        };
        let position = position.unwrap_or(Position::new(
            parent.position.x + self.child_offset.x,
            parent.position.y + self.child_offset.y,
        ));
        let parent = parent.id.clone();
        let node = Node {
            id: self.fresh_node_id(),
            parent: Some(parent),
            content: content.into(),
            is_root: false,
            position,
        };
        let id = node.id.clone();
        tracing::debug!(node_id = %id, parent_id, "add node");
        self.index.insert(&node, self.doc.graph.nodes.len());
        self.doc.graph.nodes.push(node);
        self.notify();
        Ok(id)
    }

    fn fresh_node_id(&self) -> String {
        loop {
            let id = generate_id("node", &self.clock);
            if !self.contains_node(&id) {
                return id;
            }
        }
    }

    fn fresh_link_id(&self) -> String {
        loop {
            let id = generate_id("link", &self.clock);
            if !self.doc.graph.links.iter().any(|l| l.id == id) {
                return id;
            }
        }
    }

    /// Removes `id`, its descendants and every link touching them. Roots cannot be removed.
    pub fn remove_node(&mut self, id: &str) -> bool {
        match self.node(id) {
            Some(node) if !node.is_root => {}
            _ => return false,
        }
        let closure: FxHashSet<String> = self.index.descendant_closure(id).into_iter().collect();
        self.doc.graph.nodes.retain(|n| !closure.contains(&n.id));
        let links_before = self.doc.graph.links.len();
        self.doc
            .graph
            .links
            .retain(|l| !closure.contains(&l.source) && !closure.contains(&l.target));
        self.index.remove(&closure, &self.doc.graph.nodes);
        tracing::debug!(
            node_id = id,
            removed_nodes = closure.len(),
            removed_links = links_before - self.doc.graph.links.len(),
            "remove node"
        );
        self.notify();
        true
    }

    pub fn update_node_content(&mut self, id: &str, content: impl Into<String>) -> bool {
        let Some(slot) = self.index.slot(id) else {
            return false;
        };
        self.doc.graph.nodes[slot].content = content.into();
        self.notify();
        true
    }

    pub fn update_node_position(&mut self, id: &str, position: Position, opts: UpdateOptions) -> bool {
        let Some(slot) = self.index.slot(id) else {
            return false;
        };
        self.doc.graph.nodes[slot].position = position;
        if !opts.silent {
            self.notify();
        }
        true
    }

    /// Creates an association link. `None` for self links, unknown endpoints, or when the pair
    /// is already linked in either direction.
    pub fn add_link(&mut self, source: &str, target: &str, label: impl Into<String>) -> Option<String> {
        if source == target || !self.contains_node(source) || !self.contains_node(target) {
            return None;
        }
        if self.doc.graph.links.iter().any(|l| l.connects(source, target)) {
            return None;
        }
        let link = Link {
            id: self.fresh_link_id(),
            source: source.to_string(),
            target: target.to_string(),
            label: label.into(),
        };
        let id = link.id.clone();
        tracing::debug!(link_id = %id, source, target, "add link");
        self.doc.graph.links.push(link);
        self.notify();
        Some(id)
    }

    /// Removes every link between the pair (either direction), or adds one when none exists.
    pub fn toggle_link(&mut self, source: &str, target: &str, label: impl Into<String>) -> ToggleOutcome {
        if source == target {
            return ToggleOutcome::Failed;
        }
        let link_ids: Vec<String> = self
            .doc
            .graph
            .links
            .iter()
            .filter(|l| l.connects(source, target))
            .map(|l| l.id.clone())
            .collect();
        if !link_ids.is_empty() {
            self.doc.graph.links.retain(|l| !l.connects(source, target));
            tracing::debug!(source, target, removed = link_ids.len(), "toggle link off");
            self.notify();
            return ToggleOutcome::Removed { link_ids };
        }
        match self.add_link(source, target, label) {
            Some(link_id) => ToggleOutcome::Added { link_id },
            None => ToggleOutcome::Failed,
        }
    }

    pub fn remove_link(&mut self, id: &str) -> bool {
        let before = self.doc.graph.links.len();
        self.doc.graph.links.retain(|l| l.id != id);
        if self.doc.graph.links.len() == before {
            return false;
        }
        tracing::debug!(link_id = id, "remove link");
        self.notify();
        true
    }

    pub fn set_view_state(&mut self, view: ViewState) {
        self.doc.view_state = normalize_view_state(view, &self.geometry);
        self.notify();
    }

    /// Stores the sanitized type; notifies only when it changed.
    pub fn set_mind_type(&mut self, mind_type: &str) {
        let sanitized = sanitize_type_label(mind_type);
        if self.doc.metadata.mind_type == sanitized {
            return;
        }
        tracing::debug!(mind_type = %sanitized, "set mind type");
        self.doc.metadata.mind_type = sanitized;
        self.notify();
    }

    /// Registers a callback run synchronously, in registration order, on every change.
    pub fn subscribe(&mut self, callback: impl FnMut(&Document) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn replace_document(&mut self, doc: Document) {
        self.index = GraphIndex::build(&doc.graph.nodes);
        self.doc = doc;
    }

    fn notify(&mut self) {
        self.doc.metadata.last_updated = self.clock.now_iso();
        if self.subscribers.is_empty() {
            return;
        }
        let snapshot = self.doc.clone();
        for (_, callback) in self.subscribers.iter_mut() {
            callback(&snapshot);
        }
    }
}
