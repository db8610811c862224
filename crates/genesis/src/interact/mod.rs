//! Pointer and keyboard interaction over a shared [`GraphStore`](genesis_core::GraphStore) and
//! [`Renderer`](genesis_render::Renderer).
//!
//! The controller never holds a renderer borrow across a store mutation: store notifications
//! re-render synchronously through the renderer's own subscription.

mod editor;
mod input;
mod menu;

#[cfg(test)]
mod tests;

pub use editor::InlineEditor;
pub use input::{HitTarget, Key, PointerButton, PointerId, PointerInput, PointerKind};
pub use menu::{
    ContextMenu, DELETE_NODE_LABEL, GENERATE_CHILD_LABEL, MenuAction, MenuItem, MenuKind,
    START_LINK_LABEL,
};

use genesis_core::geom::{Point, ScreenPoint, apply_zoom_at_point, screen_point};
use genesis_core::model::{DEFAULT_BRANCH_CONTENT, DEFAULT_NODE_CONTENT};
use genesis_core::{EditorConfig, GeometryOptions, Position, SharedStore, UpdateOptions, ViewState};
use genesis_render::SharedRenderer;
use rustc_hash::FxHashMap;

/// User-visible, non-fatal conditions (shown as a blocking notice by a front end).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Notice {
    #[error("Please select a node first.")]
    SelectNodeFirst,
    #[error("Select a non-root node to delete.")]
    SelectNonRootToDelete,
    #[error("Root nodes cannot be deleted.")]
    RootNotDeletable,
    #[error("Type must contain letters only.")]
    InvalidType,
    #[error("Unable to parse the selected JSON file.")]
    UnparseableFile,
    #[error("Unable to import {file_name}.")]
    ImportFailed { file_name: String },
    #[error("Unable to load this record; check the file contents.")]
    RecordLoadFailed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionOptions {
    pub geometry: GeometryOptions,
    /// Max gap between two taps on the same target for a double tap.
    pub double_tap_ms: f64,
    pub wheel_zoom_in: f64,
    pub wheel_zoom_out: f64,
}

impl Default for InteractionOptions {
    fn default() -> Self {
        Self::from_config(&EditorConfig::default())
    }
}

impl InteractionOptions {
    pub fn from_config(cfg: &EditorConfig) -> Self {
        let positive = |path: &str, fallback: f64| {
            cfg.get_f64(path)
                .filter(|v| v.is_finite() && *v > 0.0)
                .unwrap_or(fallback)
        };
        Self {
            geometry: GeometryOptions::from_config(cfg),
            double_tap_ms: positive("interaction.doubleTapMs", 320.0),
            wheel_zoom_in: positive("interaction.wheelZoomIn", 1.08),
            wheel_zoom_out: positive("interaction.wheelZoomOut", 0.92),
        }
    }
}

/// Coarse summary of what the controller is doing, most specific first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionMode {
    Idle,
    Linking,
    Dragging,
    Panning,
    Pinching,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Debug, Clone)]
struct DragState {
    node_id: String,
    /// Node center minus pointer, fixed at press time.
    offset: Position,
    latest: Option<Position>,
}

#[derive(Debug, Clone, Copy)]
struct PanState {
    pointer_id: PointerId,
    /// Where the offset from the committed view is measured from.
    start: ScreenPoint,
    last: ScreenPoint,
    moved: bool,
}

#[derive(Debug, Clone, Copy)]
struct PinchState {
    pointers: [PointerId; 2],
    start_distance: f64,
    /// Canvas-local midpoint at pinch start.
    start_mid: ScreenPoint,
    start_view: ViewState,
    moved: bool,
}

type SelectionListener = Box<dyn FnMut(Option<&str>)>;
type LinkingListener = Box<dyn FnMut(bool)>;

pub struct InteractionController {
    store: SharedStore,
    renderer: SharedRenderer,
    options: InteractionOptions,
    selected: Option<String>,
    linking_source: Option<String>,
    drags: FxHashMap<PointerId, DragState>,
    pan: Option<PanState>,
    canvas_touches: FxHashMap<PointerId, ScreenPoint>,
    pinch: Option<PinchState>,
    node_tap: Option<(String, f64)>,
    canvas_tap: Option<f64>,
    menu: Option<ContextMenu>,
    editor: Option<InlineEditor>,
    selection_listeners: Vec<(ListenerId, SelectionListener)>,
    linking_listeners: Vec<(ListenerId, LinkingListener)>,
    next_listener: u64,
}

impl std::fmt::Debug for InteractionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionController")
            .field("mode", &self.mode())
            .field("selected", &self.selected)
            .field("linking_source", &self.linking_source)
            .field("drags", &self.drags.len())
            .field("menu", &self.menu.as_ref().map(|m| m.kind))
            .finish_non_exhaustive()
    }
}

impl InteractionController {
    pub fn new(store: SharedStore, renderer: SharedRenderer, options: InteractionOptions) -> Self {
        Self {
            store,
            renderer,
            options,
            selected: None,
            linking_source: None,
            drags: FxHashMap::default(),
            pan: None,
            canvas_touches: FxHashMap::default(),
            pinch: None,
            node_tap: None,
            canvas_tap: None,
            menu: None,
            editor: None,
            selection_listeners: Vec::new(),
            linking_listeners: Vec::new(),
            next_listener: 0,
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn renderer(&self) -> &SharedRenderer {
        &self.renderer
    }

    pub fn options(&self) -> &InteractionOptions {
        &self.options
    }

    pub fn selected_node(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_linking(&self) -> bool {
        self.linking_source.is_some()
    }

    pub fn linking_source(&self) -> Option<&str> {
        self.linking_source.as_deref()
    }

    pub fn dragged_node(&self, pointer_id: PointerId) -> Option<&str> {
        self.drags.get(&pointer_id).map(|d| d.node_id.as_str())
    }

    pub fn context_menu(&self) -> Option<&ContextMenu> {
        self.menu.as_ref()
    }

    pub fn editor(&self) -> Option<&InlineEditor> {
        self.editor.as_ref()
    }

    pub fn mode(&self) -> InteractionMode {
        if self.editor.is_some() {
            InteractionMode::Editing
        } else if self.pinch.is_some() {
            InteractionMode::Pinching
        } else if !self.drags.is_empty() {
            InteractionMode::Dragging
        } else if self.pan.is_some() {
            InteractionMode::Panning
        } else if self.linking_source.is_some() {
            InteractionMode::Linking
        } else {
            InteractionMode::Idle
        }
    }

    /// Registers a selection listener; it is called immediately with the current selection.
    pub fn on_selection_change(&mut self, mut callback: impl FnMut(Option<&str>) + 'static) -> ListenerId {
        callback(self.selected.as_deref());
        let id = self.next_listener_id();
        self.selection_listeners.push((id, Box::new(callback)));
        id
    }

    /// Registers a linking listener; it is called immediately with the current linking state.
    pub fn on_linking_change(&mut self, mut callback: impl FnMut(bool) + 'static) -> ListenerId {
        callback(self.is_linking());
        let id = self.next_listener_id();
        self.linking_listeners.push((id, Box::new(callback)));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.selection_listeners.len() + self.linking_listeners.len();
        self.selection_listeners.retain(|(lid, _)| *lid != id);
        self.linking_listeners.retain(|(lid, _)| *lid != id);
        before != self.selection_listeners.len() + self.linking_listeners.len()
    }

    fn next_listener_id(&mut self) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        id
    }

    fn notify_selection(&mut self) {
        let selected = self.selected.as_deref();
        for (_, callback) in self.selection_listeners.iter_mut() {
            callback(selected);
        }
    }

    fn notify_linking(&mut self) {
        let linking = self.linking_source.is_some();
        for (_, callback) in self.linking_listeners.iter_mut() {
            callback(linking);
        }
    }

    pub fn client_to_graph(&self, client: ScreenPoint) -> Point {
        self.renderer
            .borrow()
            .client_point_to_graph(client.x, client.y)
    }

    /// Topmost node under a client point, else the canvas.
    pub fn hit_test(&self, client: ScreenPoint) -> HitTarget {
        let renderer = self.renderer.borrow();
        let p = renderer.client_point_to_graph(client.x, client.y);
        match renderer.hit_test_node(p) {
            Some(id) => HitTarget::node(id),
            None => HitTarget::Canvas,
        }
    }

    pub fn select_node(&mut self, id: &str) {
        self.renderer.borrow_mut().set_selected_node(Some(id));
        self.selected = Some(id.to_string());
        self.notify_selection();
    }

    pub fn clear_selection(&mut self) {
        self.renderer.borrow_mut().set_selected_node(None);
        self.selected = None;
        self.notify_selection();
    }

    /// Enters linking mode from `source_id`, cancelling any linking already in progress.
    /// False (and idle) when the source does not exist.
    pub fn begin_linking(&mut self, source_id: &str) -> bool {
        self.cancel_linking();
        let center = self
            .store
            .borrow()
            .node(source_id)
            .map(|n| n.position.to_point());
        let Some(center) = center else {
            tracing::debug!(source = source_id, "linking source not found");
            return false;
        };
        self.renderer.borrow_mut().set_temp_link(source_id, center);
        self.linking_source = Some(source_id.to_string());
        tracing::debug!(source = source_id, "linking started");
        self.notify_linking();
        true
    }

    /// Leaves linking mode without touching the document. False when not linking.
    pub fn cancel_linking(&mut self) -> bool {
        if self.linking_source.take().is_none() {
            return false;
        }
        self.renderer.borrow_mut().clear_temp_link();
        tracing::debug!("linking cancelled");
        self.notify_linking();
        true
    }

    fn cancel_linking_if_source(&mut self, node_id: &str) {
        if self.linking_source.as_deref() == Some(node_id) {
            self.cancel_linking();
        }
    }

    /// Opens the inline editor over `node_id`, committing any other open editor first.
    pub fn open_editor(&mut self, node_id: &str) -> bool {
        if self.editor.as_ref().is_some_and(|e| e.node_id() == node_id) {
            return true;
        }
        self.commit_editor();
        let content = self.store.borrow().node(node_id).map(|n| n.content.clone());
        let Some(content) = content else {
            return false;
        };
        self.editor = Some(InlineEditor::open(node_id, &content));
        tracing::debug!(node_id, "inline editor opened");
        true
    }

    pub fn set_editor_text(&mut self, text: impl Into<String>) -> bool {
        match self.editor.as_mut() {
            Some(editor) => {
                editor.set_text(text);
                true
            }
            None => false,
        }
    }

    /// Writes the editor's trimmed text (or the original when empty) and closes it.
    pub fn commit_editor(&mut self) -> bool {
        let Some(editor) = self.editor.take() else {
            return false;
        };
        let content = editor.committed_content().to_string();
        self.store
            .borrow_mut()
            .update_node_content(editor.node_id(), content)
    }

    /// Closes the editor without writing.
    pub fn cancel_editor(&mut self) -> bool {
        self.editor.take().is_some()
    }

    pub fn open_context_menu(&mut self, target: &HitTarget, client: ScreenPoint) {
        self.commit_editor();
        self.hide_context_menu();
        match target {
            HitTarget::Node(id) => {
                let is_root = self.store.borrow().node(id).map(|n| n.is_root);
                let Some(is_root) = is_root else {
                    return;
                };
                self.select_node(id);
                self.menu = Some(ContextMenu::for_node(id, is_root, client));
            }
            HitTarget::Canvas => {
                let menu = {
                    let store = self.store.borrow();
                    ContextMenu::for_canvas(
                        store
                            .document()
                            .roots()
                            .map(|n| (n.id.as_str(), n.content.as_str())),
                        client,
                    )
                };
                self.menu = Some(menu);
            }
        }
    }

    pub fn hide_context_menu(&mut self) -> bool {
        self.menu.take().is_some()
    }

    /// Runs the menu item at `index` and closes the menu. Disabled items do nothing.
    pub fn activate_menu_item(&mut self, index: usize) -> bool {
        let Some(item) = self.menu.as_ref().and_then(|m| m.items.get(index)).cloned() else {
            return false;
        };
        if item.disabled {
            return false;
        }
        self.hide_context_menu();
        match item.action {
            MenuAction::GenerateChild { parent_id } => self
                .add_child_and_edit(&parent_id, DEFAULT_NODE_CONTENT, None)
                .is_some(),
            MenuAction::StartLink { source_id } => self.begin_linking(&source_id),
            MenuAction::DeleteNode { node_id } => self.delete_node(&node_id),
            MenuAction::AddChildUnderRoot { root_id } => self
                .add_child_and_edit(&root_id, DEFAULT_BRANCH_CONTENT, None)
                .is_some(),
        }
    }

    fn add_child_and_edit(
        &mut self,
        parent_id: &str,
        content: &str,
        position: Option<Position>,
    ) -> Option<String> {
        let result = self.store.borrow_mut().add_node(parent_id, content, position);
        match result {
            Ok(id) => {
                self.select_node(&id);
                self.open_editor(&id);
                Some(id)
            }
            Err(err) => {
                tracing::warn!(%err, parent_id, "unable to add child");
                None
            }
        }
    }

    /// Removes a non-root node (and its subtree), then drops selection/linking that pointed
    /// into it.
    pub fn delete_node(&mut self, node_id: &str) -> bool {
        self.cancel_linking_if_source(node_id);
        let removed = self.store.borrow_mut().remove_node(node_id);
        if removed {
            self.sync_with_store();
        }
        removed
    }

    /// Drops selection, linking, edit, and drag state that refers to nodes no longer in the
    /// store (after deletes, loads, or resets).
    pub fn sync_with_store(&mut self) {
        let (selection_gone, source_gone, editor_gone) = {
            let store = self.store.borrow();
            let gone = |id: Option<&str>| id.is_some_and(|id| !store.contains_node(id));
            self.drags.retain(|_, d| store.contains_node(&d.node_id));
            (
                gone(self.selected.as_deref()),
                gone(self.linking_source.as_deref()),
                gone(self.editor.as_ref().map(InlineEditor::node_id)),
            )
        };
        if selection_gone {
            self.clear_selection();
        }
        if source_gone {
            self.cancel_linking();
        }
        if editor_gone {
            self.editor = None;
        }
    }

    /// The selected node, else the first root.
    pub fn ensure_selectable_node(&self) -> Option<String> {
        let store = self.store.borrow();
        if let Some(id) = self.selected.as_deref() {
            if store.contains_node(id) {
                return Some(id.to_string());
            }
        }
        store.document().roots().next().map(|n| n.id.clone())
    }

    /// Creates a "New node" at the pointer under the selected node (or the first root) and
    /// opens its editor.
    fn blank_activate(&mut self, client: ScreenPoint) -> Option<String> {
        let parent = self.ensure_selectable_node()?;
        let at = Position::from(self.client_to_graph(client));
        self.add_child_and_edit(&parent, DEFAULT_NODE_CONTENT, Some(at))
    }

    pub fn pointer_down(&mut self, input: &PointerInput, target: &HitTarget) {
        if self.commit_editor() {
            self.restore_live_view();
        }
        match target {
            HitTarget::Node(id) => self.node_pointer_down(input, id),
            HitTarget::Canvas => self.canvas_pointer_down(input),
        }
    }

    fn node_pointer_down(&mut self, input: &PointerInput, node_id: &str) {
        if input.button != PointerButton::Primary && !input.is_touch() {
            return;
        }
        if input.is_touch() && !input.is_primary {
            return;
        }
        let center = self.store.borrow().node(node_id).map(|n| n.position);
        let Some(center) = center else {
            return;
        };

        if input.kind == PointerKind::Mouse {
            self.select_node(node_id);
            if input.click_count == 2 {
                self.open_editor(node_id);
                return;
            }
        }

        if input.is_touch() {
            let double_tap = self.node_tap.as_ref().is_some_and(|(id, at)| {
                id == node_id && input.time_ms - at < self.options.double_tap_ms
            });
            if double_tap {
                self.node_tap = None;
                self.open_editor(node_id);
                return;
            }
            self.node_tap = Some((node_id.to_string(), input.time_ms));
        }

        if input.button != PointerButton::Primary {
            return;
        }
        let pointer = self.client_to_graph(input.client);
        self.drags.insert(
            input.pointer_id,
            DragState {
                node_id: node_id.to_string(),
                offset: Position::new(center.x - pointer.x, center.y - pointer.y),
                latest: None,
            },
        );
        tracing::debug!(node_id, pointer_id = input.pointer_id, "drag started");
    }

    fn canvas_pointer_down(&mut self, input: &PointerInput) {
        if input.is_touch() {
            self.canvas_touches.insert(input.pointer_id, input.client);
            if self.canvas_touches.len() == 2 {
                self.start_pinch();
                return;
            }
            if input.is_primary {
                let double_tap = self
                    .canvas_tap
                    .is_some_and(|at| input.time_ms - at < self.options.double_tap_ms);
                if double_tap {
                    self.canvas_tap = None;
                    self.blank_activate(input.client);
                    return;
                }
                self.canvas_tap = Some(input.time_ms);
            }
        }
        if input.button == PointerButton::Primary && self.pinch.is_none() {
            self.pan = Some(PanState {
                pointer_id: input.pointer_id,
                start: input.client,
                last: input.client,
                moved: false,
            });
        }
    }

    fn start_pinch(&mut self) {
        let mut ids: Vec<PointerId> = self.canvas_touches.keys().copied().collect();
        ids.sort_unstable();
        let (Some(&a), Some(&b)) = (ids.first(), ids.get(1)) else {
            return;
        };
        let (Some(pa), Some(pb)) = (self.canvas_touches.get(&a), self.canvas_touches.get(&b)) else {
            return;
        };
        let distance = (*pb - *pa).length();
        if !(distance.is_finite() && distance > 0.0) {
            return;
        }
        let mid = self.canvas_local(pa.lerp(*pb, 0.5));
        self.pan = None;
        self.pinch = Some(PinchState {
            pointers: [a, b],
            start_distance: distance,
            start_mid: mid,
            start_view: self.renderer.borrow().view(),
            moved: false,
        });
        tracing::debug!(distance, "pinch started");
    }

    fn canvas_local(&self, client: ScreenPoint) -> ScreenPoint {
        let vp = self.renderer.borrow().viewport();
        screen_point(client.x - vp.left, client.y - vp.top)
    }

    pub fn pointer_move(&mut self, input: &PointerInput) {
        let pointer = self.client_to_graph(input.client);

        if let Some(source) = self.linking_source.as_deref() {
            self.renderer.borrow_mut().set_temp_link(source, pointer);
        }

        if let Some(drag) = self.drags.get_mut(&input.pointer_id) {
            let next = Position::new(pointer.x + drag.offset.x, pointer.y + drag.offset.y);
            drag.latest = Some(next);
            self.store
                .borrow_mut()
                .update_node_position(&drag.node_id, next, UpdateOptions::SILENT);
            self.renderer
                .borrow_mut()
                .update_node_position_visual(&drag.node_id, next);
        }

        if let Some(p) = self.canvas_touches.get_mut(&input.pointer_id) {
            *p = input.client;
            if self
                .pinch
                .is_some_and(|pinch| pinch.pointers.contains(&input.pointer_id))
            {
                self.update_pinch();
            }
        }

        if let Some(pan) = self.pan.as_mut().filter(|p| p.pointer_id == input.pointer_id) {
            pan.last = input.client;
            pan.moved = true;
            self.restore_live_view();
        }
    }

    /// Committed view shifted by how far the live pan pointer has travelled.
    fn live_pan_view(&self) -> Option<ViewState> {
        let pan = self.pan.filter(|p| p.moved)?;
        let mut view = self.store.borrow().view_state();
        let delta = pan.last - pan.start;
        view.pan.x += delta.x;
        view.pan.y += delta.y;
        Some(view)
    }

    /// Re-applies an in-flight pan or pinch on top of whatever view the last render installed.
    fn restore_live_view(&mut self) {
        if let Some(view) = self.live_pan_view() {
            self.renderer.borrow_mut().set_view(view);
        } else if self.pinch.is_some_and(|p| p.moved) {
            self.update_pinch();
        }
    }

    fn update_pinch(&mut self) {
        let Some(pinch) = self.pinch else {
            return;
        };
        let [a, b] = pinch.pointers;
        let (Some(pa), Some(pb)) = (self.canvas_touches.get(&a), self.canvas_touches.get(&b)) else {
            return;
        };
        let distance = (*pb - *pa).length();
        if !(distance.is_finite() && distance > 0.0) {
            return;
        }
        let mid = self.canvas_local(pa.lerp(*pb, 0.5));
        let target = pinch.start_view.zoom * distance / pinch.start_distance;
        let mut view = apply_zoom_at_point(
            &pinch.start_view,
            target,
            pinch.start_mid.x,
            pinch.start_mid.y,
            &self.options.geometry,
        );
        view.pan.x += mid.x - pinch.start_mid.x;
        view.pan.y += mid.y - pinch.start_mid.y;
        self.renderer.borrow_mut().set_view(view);
        if let Some(p) = self.pinch.as_mut() {
            p.moved = true;
        }
    }

    /// Ends whatever gesture `input.pointer_id` drives, committing through the notifying path.
    pub fn pointer_up(&mut self, input: &PointerInput) {
        self.end_pointer(input.pointer_id);
    }

    /// Pointer cancel or lost capture: same commit semantics as [`Self::pointer_up`].
    pub fn pointer_cancel(&mut self, input: &PointerInput) {
        tracing::debug!(pointer_id = input.pointer_id, "pointer cancelled");
        self.end_pointer(input.pointer_id);
    }

    fn end_pointer(&mut self, pointer_id: PointerId) {
        if let Some(drag) = self.drags.remove(&pointer_id) {
            if let Some(latest) = drag.latest {
                self.store.borrow_mut().update_node_position(
                    &drag.node_id,
                    latest,
                    UpdateOptions::NOTIFY,
                );
            }
            tracing::debug!(node_id = %drag.node_id, "drag ended");
            self.restore_live_view();
        }

        if self.pan.is_some_and(|p| p.pointer_id == pointer_id) {
            let view = self.live_pan_view();
            self.pan = None;
            if let Some(view) = view {
                self.store.borrow_mut().set_view_state(view);
            }
        }

        if self.canvas_touches.remove(&pointer_id).is_some() {
            let ended = self
                .pinch
                .filter(|p| p.pointers.contains(&pointer_id));
            if let Some(pinch) = ended {
                self.pinch = None;
                if pinch.moved {
                    self.commit_view();
                }
                tracing::debug!("pinch ended");
            }
        }
    }

    fn commit_view(&mut self) {
        let view = self.renderer.borrow().view();
        self.store.borrow_mut().set_view_state(view);
    }

    /// Single click: selects a node (completing a pending link to it) and closes menus.
    pub fn click(&mut self, target: &HitTarget) {
        match target {
            HitTarget::Node(id) => {
                if !self.store.borrow().contains_node(id) {
                    return;
                }
                self.select_node(id);
                self.hide_context_menu();
                let source = self.linking_source.clone();
                if let Some(source) = source.filter(|s| s != id) {
                    let outcome = self.store.borrow_mut().toggle_link(&source, id, "");
                    tracing::debug!(?outcome, source = %source, target = %id, "link toggled");
                    self.cancel_linking();
                }
            }
            HitTarget::Canvas => {
                self.hide_context_menu();
            }
        }
    }

    pub fn double_click(&mut self, input: &PointerInput, target: &HitTarget) {
        match target {
            HitTarget::Node(id) => {
                self.open_editor(id);
            }
            HitTarget::Canvas => {
                self.blank_activate(input.client);
            }
        }
    }

    /// Wheel zoom about the cursor; positive `delta_y` zooms out.
    pub fn wheel(&mut self, delta_y: f64, client: ScreenPoint) {
        let factor = if delta_y > 0.0 {
            self.options.wheel_zoom_out
        } else {
            self.options.wheel_zoom_in
        };
        let view = self.renderer.borrow().view();
        let anchor = self.canvas_local(client);
        let next = apply_zoom_at_point(
            &view,
            view.zoom * factor,
            anchor.x,
            anchor.y,
            &self.options.geometry,
        );
        self.store.borrow_mut().set_view_state(next);
        if let Some(pan) = self.pan.as_mut() {
            pan.start = pan.last;
        }
    }

    /// Returns true when the key was consumed.
    pub fn key_down(&mut self, key: Key) -> bool {
        match key {
            Key::Escape => {
                let cancelled = self.cancel_linking();
                let hidden = self.hide_context_menu();
                cancelled || hidden
            }
            Key::Enter { ctrl_or_meta: true } => self.commit_editor(),
            _ => false,
        }
    }

    pub fn quick_add_child(&mut self) -> Result<String, Notice> {
        self.commit_editor();
        let parent = self.ensure_selectable_node().ok_or(Notice::SelectNodeFirst)?;
        self.add_child_and_edit(&parent, DEFAULT_NODE_CONTENT, None)
            .ok_or(Notice::SelectNodeFirst)
    }

    pub fn quick_start_link(&mut self) -> Result<(), Notice> {
        let source = self.ensure_selectable_node().ok_or(Notice::SelectNodeFirst)?;
        if self.begin_linking(&source) {
            Ok(())
        } else {
            Err(Notice::SelectNodeFirst)
        }
    }

    pub fn quick_cancel_link(&mut self) -> bool {
        self.cancel_linking()
    }

    pub fn quick_delete_selected(&mut self) -> Result<(), Notice> {
        let Some(id) = self.selected.clone() else {
            return Err(Notice::SelectNonRootToDelete);
        };
        let is_root = self.store.borrow().node(&id).map(|n| n.is_root);
        if is_root != Some(false) {
            return Err(Notice::RootNotDeletable);
        }
        self.delete_node(&id);
        if self.selected.is_some() {
            self.clear_selection();
        }
        Ok(())
    }
}
