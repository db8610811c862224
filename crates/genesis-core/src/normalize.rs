//! Turns an arbitrary JSON payload into a well-formed [`Document`].
//!
//! Loading is lenient: fields are coerced, broken references are repaired or dropped, and every
//! repair is logged at `warn`. Only a non-object payload is rejected.

use crate::error::{Error, Result};
use crate::geom::GeometryOptions;
use crate::ids::generate_id;
use crate::model::{
    DEFAULT_MIND_TYPE, DOCUMENT_VERSION, Document, Graph, Link, Metadata, Node, Position,
    ROOT_ACTION_ID, ROOT_INSIGHT_ID, ViewState, is_root_id,
};
use crate::persist::sanitize_type_label;
use crate::time::{self, Clock};
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::{Map, Value};

pub fn normalize_document(raw: &Value, clock: &Clock, opts: &GeometryOptions) -> Result<Document> {
    let Some(obj) = raw.as_object() else {
        return Err(Error::validation(format!(
            "expected a JSON object, got {}",
            json_kind(raw)
        )));
    };

    let version = obj
        .get("version")
        .and_then(Value::as_str)
        .unwrap_or(DOCUMENT_VERSION)
        .to_string();

    let empty = Map::new();
    let raw_meta = obj
        .get("metadata")
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let metadata = normalize_metadata(raw_meta, clock);

    let raw_graph = obj.get("graph").and_then(Value::as_object);
    let raw_nodes = raw_graph
        .and_then(|g| g.get("nodes"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let raw_links = raw_graph
        .and_then(|g| g.get("links"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let nodes = normalize_nodes(raw_nodes, clock);
    let links = normalize_links(raw_links, &nodes, clock);

    let view_state = match obj.get("viewState").and_then(Value::as_object) {
        Some(v) => normalize_view_state(view_state_from_json(v), opts),
        None => ViewState::default(),
    };

    Ok(Document {
        version,
        metadata,
        graph: Graph { nodes, links },
        view_state,
    })
}

/// Non-finite pan components become 0; zoom is clamped into the configured range.
pub fn normalize_view_state(view: ViewState, opts: &GeometryOptions) -> ViewState {
    let finite_or_zero = |v: f64| if v.is_finite() { v } else { 0.0 };
    ViewState {
        pan: Position::new(finite_or_zero(view.pan.x), finite_or_zero(view.pan.y)),
        zoom: opts.clamp_zoom(view.zoom),
    }
}

/// First string value among `keys` (legacy spellings included).
pub fn first_str<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| map.get(*k))
        .find_map(Value::as_str)
}

fn normalize_metadata(raw: &Map<String, Value>, clock: &Clock) -> Metadata {
    let canonical_iso =
        |keys: &[&str]| first_str(raw, keys).and_then(time::parse_iso).map(time::to_iso);

    let created_at = canonical_iso(&["created_at", "createdAt"]).unwrap_or_else(|| clock.now_iso());
    let created_stamp = first_str(raw, &["created_stamp", "createdStamp"])
        .map(str::trim)
        .filter(|s| time::is_stamp(s))
        .map(str::to_string)
        .unwrap_or_else(|| clock.now_stamp());
    let last_updated =
        canonical_iso(&["last_updated", "lastUpdated"]).unwrap_or_else(|| clock.now_iso());
    let mind_type = first_str(raw, &["mind_type", "mindType", "type"])
        .map(sanitize_type_label)
        .unwrap_or_else(|| DEFAULT_MIND_TYPE.to_string());

    Metadata {
        created_at,
        created_stamp,
        last_updated,
        mind_type,
    }
}

fn normalize_nodes(raw: &[Value], clock: &Clock) -> Vec<Node> {
    let mut nodes: Vec<Node> = Vec::with_capacity(raw.len() + 2);
    let mut seen: FxHashSet<String> = FxHashSet::default();

    for (i, entry) in raw.iter().enumerate() {
        let Some(obj) = entry.as_object() else {
            tracing::warn!(index = i, "skipping non-object node entry");
            continue;
        };
        let id = obj
            .get("id")
            .and_then(coerce_id)
            .unwrap_or_else(|| generate_id("node", clock));
        if !seen.insert(id.clone()) {
            tracing::warn!(node_id = %id, "dropping duplicate node id");
            continue;
        }

        let claims_root = obj.get("isRoot").is_some_and(is_truthy);
        let is_root = is_root_id(&id);
        if claims_root && !is_root {
            tracing::warn!(node_id = %id, "demoting node that claims to be a root");
        }
        let parent = if is_root {
            None
        } else {
            obj.get("parent").and_then(coerce_id)
        };
        let content = obj.get("content").map(coerce_text).unwrap_or_default();
        let position = obj
            .get("position")
            .and_then(Value::as_object)
            .map(|p| {
                Position::new(
                    p.get("x").map(coerce_number).unwrap_or(0.0),
                    p.get("y").map(coerce_number).unwrap_or(0.0),
                )
            })
            .unwrap_or_default();

        nodes.push(Node {
            id,
            parent,
            content,
            is_root,
            position,
        });
    }

    if !seen.contains(ROOT_INSIGHT_ID) {
        if let Some(root) = Node::default_root(ROOT_INSIGHT_ID) {
            nodes.insert(0, root);
        }
    }
    if !seen.contains(ROOT_ACTION_ID) {
        if let Some(root) = Node::default_root(ROOT_ACTION_ID) {
            nodes.push(root);
        }
    }

    repair_parent_chains(&mut nodes);
    nodes
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChainState {
    Unknown,
    Visiting,
    Rooted,
}

/// Re-attaches every node whose parent chain does not reach a root under `root_insight`.
///
/// Only the break point is re-parented (the node with a missing parent, or the first node of a
/// cycle reached from the walk), so intact subtrees below it keep their shape.
fn repair_parent_chains(nodes: &mut [Node]) {
    let index: FxHashMap<String, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.clone(), i))
        .collect();
    let mut state: Vec<ChainState> = nodes
        .iter()
        .map(|n| {
            if n.is_root {
                ChainState::Rooted
            } else {
                ChainState::Unknown
            }
        })
        .collect();

    for start in 0..nodes.len() {
        if state[start] != ChainState::Unknown {
            continue;
        }
        let mut path = Vec::new();
        let mut cur = start;
        loop {
            match state[cur] {
                ChainState::Rooted => break,
                ChainState::Visiting => {
                    tracing::warn!(node_id = %nodes[cur].id, "breaking parent cycle; re-attaching under {ROOT_INSIGHT_ID}");
                    nodes[cur].parent = Some(ROOT_INSIGHT_ID.to_string());
                    break;
                }
                ChainState::Unknown => {
                    state[cur] = ChainState::Visiting;
                    path.push(cur);
                    let next = nodes[cur]
                        .parent
                        .as_deref()
                        .and_then(|p| index.get(p).copied());
                    match next {
                        Some(next) => cur = next,
                        None => {
                            tracing::warn!(
                                node_id = %nodes[cur].id,
                                parent = ?nodes[cur].parent,
                                "orphan node; re-attaching under {ROOT_INSIGHT_ID}"
                            );
                            nodes[cur].parent = Some(ROOT_INSIGHT_ID.to_string());
                            break;
                        }
                    }
                }
            }
        }
        for i in path {
            state[i] = ChainState::Rooted;
        }
    }
}

fn normalize_links(raw: &[Value], nodes: &[Node], clock: &Clock) -> Vec<Link> {
    let node_ids: FxHashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let mut seen_ids: FxHashSet<String> = FxHashSet::default();
    let mut links = Vec::with_capacity(raw.len());

    for (i, entry) in raw.iter().enumerate() {
        let Some(obj) = entry.as_object() else {
            tracing::warn!(index = i, "skipping non-object link entry");
            continue;
        };
        let (Some(source), Some(target)) = (
            obj.get("source").and_then(coerce_endpoint),
            obj.get("target").and_then(coerce_endpoint),
        ) else {
            tracing::warn!(index = i, "dropping link without source/target");
            continue;
        };
        if source == target {
            tracing::warn!(index = i, node_id = %source, "dropping self link");
            continue;
        }
        if !node_ids.contains(source.as_str()) || !node_ids.contains(target.as_str()) {
            tracing::warn!(index = i, %source, %target, "dropping link to unknown node");
            continue;
        }

        let mut id = obj
            .get("id")
            .and_then(coerce_id)
            .unwrap_or_else(|| generate_id("link", clock));
        while seen_ids.contains(&id) {
            tracing::warn!(link_id = %id, "regenerating duplicate link id");
            id = generate_id("link", clock);
        }
        seen_ids.insert(id.clone());

        let label = match obj.get("label") {
            None | Some(Value::Null) => String::new(),
            Some(v) => coerce_text(v),
        };
        links.push(Link {
            id,
            source,
            target,
            label,
        });
    }
    links
}

fn view_state_from_json(v: &Map<String, Value>) -> ViewState {
    let pan = v.get("pan").and_then(Value::as_object);
    let axis = |key: &str| {
        pan.and_then(|p| p.get(key))
            .map(coerce_number)
            .unwrap_or(0.0)
    };
    ViewState {
        pan: Position::new(axis("x"), axis("y")),
        zoom: match v.get("zoom") {
            None | Some(Value::Null) => 1.0,
            Some(z) => coerce_number_or(z, 1.0),
        },
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Ids accept strings and numbers; empty strings count as missing.
fn coerce_id(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn coerce_endpoint(v: &Value) -> Option<String> {
    if !is_truthy(v) {
        return None;
    }
    coerce_id(v)
}

fn coerce_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn coerce_number(v: &Value) -> f64 {
    coerce_number_or(v, 0.0)
}

fn coerce_number_or(v: &Value, fallback: f64) -> f64 {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim().is_empty() => Some(0.0),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    n.filter(|f| f.is_finite()).unwrap_or(fallback)
}
