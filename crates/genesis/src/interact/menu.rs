use genesis_core::geom::ScreenPoint;

pub const GENERATE_CHILD_LABEL: &str = "Generate Child Node";
pub const START_LINK_LABEL: &str = "Start Link";
pub const DELETE_NODE_LABEL: &str = "Delete Node";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    GenerateChild { parent_id: String },
    StartLink { source_id: String },
    DeleteNode { node_id: String },
    AddChildUnderRoot { root_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub label: String,
    pub action: MenuAction,
    /// Rendered `aria-disabled`; activating it does nothing.
    pub disabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuKind {
    Node,
    Canvas,
}

/// An open context menu, positioned at the client point that opened it.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextMenu {
    pub kind: MenuKind,
    pub position: ScreenPoint,
    pub items: Vec<MenuItem>,
}

impl ContextMenu {
    pub(crate) fn for_node(node_id: &str, is_root: bool, position: ScreenPoint) -> Self {
        let items = vec![
            MenuItem {
                label: GENERATE_CHILD_LABEL.to_string(),
                action: MenuAction::GenerateChild {
                    parent_id: node_id.to_string(),
                },
                disabled: false,
            },
            MenuItem {
                label: START_LINK_LABEL.to_string(),
                action: MenuAction::StartLink {
                    source_id: node_id.to_string(),
                },
                disabled: false,
            },
            MenuItem {
                label: DELETE_NODE_LABEL.to_string(),
                action: MenuAction::DeleteNode {
                    node_id: node_id.to_string(),
                },
                disabled: is_root,
            },
        ];
        Self {
            kind: MenuKind::Node,
            position,
            items,
        }
    }

    /// One "Add child under <root content>" entry per root, in document order.
    pub(crate) fn for_canvas<'a>(
        roots: impl IntoIterator<Item = (&'a str, &'a str)>,
        position: ScreenPoint,
    ) -> Self {
        let items = roots
            .into_iter()
            .map(|(id, content)| MenuItem {
                label: format!("Add child under {content}"),
                action: MenuAction::AddChildUnderRoot {
                    root_id: id.to_string(),
                },
                disabled: false,
            })
            .collect();
        Self {
            kind: MenuKind::Canvas,
            position,
            items,
        }
    }

    pub fn labels(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.label.as_str()).collect()
    }
}
