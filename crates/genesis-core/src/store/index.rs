use crate::model::Node;
use rustc_hash::{FxHashMap, FxHashSet};

/// Node-id lookup plus the parent → children adjacency used for cascading deletes.
#[derive(Debug, Clone, Default)]
pub(crate) struct GraphIndex {
    slot: FxHashMap<String, usize>,
    children: FxHashMap<String, Vec<String>>,
}

impl GraphIndex {
    pub(crate) fn build(nodes: &[Node]) -> Self {
        let mut index = Self::default();
        for (i, node) in nodes.iter().enumerate() {
            index.insert(node, i);
        }
        index
    }

    /// Registers a node stored at `slot`.
    pub(crate) fn insert(&mut self, node: &Node, slot: usize) {
        self.slot.insert(node.id.clone(), slot);
        if let Some(parent) = node.parent.as_deref() {
            self.children
                .entry(parent.to_string())
                .or_default()
                .push(node.id.clone());
        }
    }

    /// Drops `removed` after the node vector was compacted; slots are re-read from `nodes`.
    pub(crate) fn remove(&mut self, removed: &FxHashSet<String>, nodes: &[Node]) {
        for id in removed {
            self.children.remove(id);
        }
        for kids in self.children.values_mut() {
            kids.retain(|k| !removed.contains(k));
        }
        self.children.retain(|_, kids| !kids.is_empty());
        self.slot.clear();
        for (i, node) in nodes.iter().enumerate() {
            self.slot.insert(node.id.clone(), i);
        }
    }

    pub(crate) fn slot(&self, id: &str) -> Option<usize> {
        self.slot.get(id).copied()
    }

    pub(crate) fn children(&self, id: &str) -> &[String] {
        self.children.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// `id` followed by all of its transitive children, breadth first.
    pub(crate) fn descendant_closure(&self, id: &str) -> Vec<String> {
        let mut out = vec![id.to_string()];
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        seen.insert(id);
        let mut head = 0;
        while head < out.len() {
            let cur = out[head].clone();
            head += 1;
            for kid in self.children(&cur) {
                if seen.insert(kid.as_str()) {
                    out.push(kid.clone());
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Position;

    fn node(id: &str, parent: Option<&str>) -> Node {
        Node {
            id: id.to_string(),
            parent: parent.map(str::to_string),
            content: String::new(),
            is_root: parent.is_none(),
            position: Position::default(),
        }
    }

    #[test]
    fn closure_follows_children_transitively() {
        let nodes = vec![
            node("r", None),
            node("a", Some("r")),
            node("b", Some("a")),
            node("c", Some("b")),
            node("d", Some("a")),
            node("x", Some("r")),
        ];
        let index = GraphIndex::build(&nodes);
        assert_eq!(index.descendant_closure("a"), ["a", "b", "d", "c"]);
        assert_eq!(index.descendant_closure("c"), ["c"]);
        assert_eq!(index.children("r"), ["a", "x"]);
        assert_eq!(index.slot("x"), Some(5));
    }

    #[test]
    fn remove_reindexes_slots() {
        let mut nodes = vec![
            node("r", None),
            node("a", Some("r")),
            node("b", Some("a")),
            node("x", Some("r")),
        ];
        let mut index = GraphIndex::build(&nodes);
        let removed: FxHashSet<String> = ["a".to_string(), "b".to_string()].into_iter().collect();
        nodes.retain(|n| !removed.contains(&n.id));
        index.remove(&removed, &nodes);
        assert_eq!(index.slot("x"), Some(1));
        assert_eq!(index.slot("a"), None);
        assert_eq!(index.children("r"), ["x"]);
        assert!(index.children("a").is_empty());
    }
}
