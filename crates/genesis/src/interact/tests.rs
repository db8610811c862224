use super::*;
use genesis_core::geom::screen_point;
use genesis_core::model::ROOT_INSIGHT_CONTENT;
use genesis_core::{GraphStore, ROOT_ACTION_ID, ROOT_INSIGHT_ID};
use genesis_render::{RenderOptions, Renderer};
use std::cell::RefCell;
use std::rc::Rc;
use tracing_test::traced_test;

fn setup() -> (SharedStore, SharedRenderer, InteractionController) {
    let store = GraphStore::new().into_shared();
    let renderer = Renderer::attach(&store, RenderOptions::default());
    let ctl = InteractionController::new(
        store.clone(),
        renderer.clone(),
        InteractionOptions::default(),
    );
    (store, renderer, ctl)
}

fn add_child(store: &SharedStore, parent: &str) -> String {
    store.borrow_mut().add_node(parent, "child", None).unwrap()
}

fn position_of(store: &SharedStore, id: &str) -> Position {
    store.borrow().node(id).unwrap().position
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn selection_is_exclusive_and_listeners_see_current_value() {
    let (_store, renderer, mut ctl) = setup();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    ctl.on_selection_change(move |id| sink.borrow_mut().push(id.map(str::to_string)));
    assert_eq!(*seen.borrow(), [None]);

    ctl.click(&HitTarget::node(ROOT_INSIGHT_ID));
    ctl.click(&HitTarget::node(ROOT_ACTION_ID));
    assert_eq!(ctl.selected_node(), Some(ROOT_ACTION_ID));
    {
        let r = renderer.borrow();
        assert!(r.node_visual(ROOT_ACTION_ID).unwrap().selected);
        assert!(!r.node_visual(ROOT_INSIGHT_ID).unwrap().selected);
    }
    assert_eq!(seen.borrow().len(), 3);

    ctl.click(&HitTarget::node("ghost"));
    assert_eq!(ctl.selected_node(), Some(ROOT_ACTION_ID));
}

#[test]
fn clicking_a_second_node_while_linking_toggles_and_exits() {
    let (store, renderer, mut ctl) = setup();
    let child = add_child(&store, ROOT_INSIGHT_ID);

    assert!(ctl.begin_linking(ROOT_INSIGHT_ID));
    assert_eq!(ctl.mode(), InteractionMode::Linking);
    assert!(renderer.borrow().tree().temp_link.is_some());

    ctl.click(&HitTarget::node(&child));
    assert_eq!(store.borrow().link_count(), 1);
    assert!(!ctl.is_linking());
    assert!(renderer.borrow().tree().temp_link.is_none());
    assert_eq!(ctl.selected_node(), Some(child.as_str()));

    assert!(ctl.begin_linking(&child));
    ctl.click(&HitTarget::node(ROOT_INSIGHT_ID));
    assert_eq!(store.borrow().link_count(), 0);
}

#[test]
fn clicking_the_source_keeps_linking() {
    let (store, _renderer, mut ctl) = setup();
    ctl.begin_linking(ROOT_INSIGHT_ID);
    ctl.click(&HitTarget::node(ROOT_INSIGHT_ID));
    assert!(ctl.is_linking());
    assert_eq!(store.borrow().link_count(), 0);
}

#[test]
fn escape_cancels_linking_and_menu_without_mutation() {
    let (store, renderer, mut ctl) = setup();
    let before = store.borrow().get_state();
    ctl.begin_linking(ROOT_ACTION_ID);
    ctl.open_context_menu(&HitTarget::Canvas, screen_point(5.0, 5.0));
    assert!(ctl.key_down(Key::Escape));
    assert!(!ctl.is_linking());
    assert!(ctl.context_menu().is_none());
    assert!(renderer.borrow().tree().temp_link.is_none());
    assert_eq!(store.borrow().document().graph, before.graph);
    assert!(!ctl.key_down(Key::Escape));
}

#[test]
fn beginning_a_new_link_cancels_the_previous_one() {
    let (_store, _renderer, mut ctl) = setup();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    ctl.on_linking_change(move |linking| sink.borrow_mut().push(linking));
    ctl.begin_linking(ROOT_INSIGHT_ID);
    ctl.begin_linking(ROOT_ACTION_ID);
    assert_eq!(ctl.linking_source(), Some(ROOT_ACTION_ID));
    assert_eq!(*seen.borrow(), [false, true, false, true]);

    assert!(!ctl.begin_linking("ghost"));
    assert!(!ctl.is_linking());
}

#[test]
fn pointer_moves_drag_the_rubber_band() {
    let (_store, renderer, mut ctl) = setup();
    ctl.begin_linking(ROOT_INSIGHT_ID);
    ctl.pointer_move(&PointerInput::mouse(700.0, 100.0));
    let r = renderer.borrow();
    let temp = r.tree().temp_link.as_ref().unwrap();
    assert!(approx(temp.toward.x, 700.0));
    assert!(approx(temp.path.end.y, 100.0));
}

#[test]
fn drag_moves_silently_then_commits_on_release() {
    let (store, renderer, mut ctl) = setup();
    let child = add_child(&store, ROOT_INSIGHT_ID);
    let notifications = Rc::new(RefCell::new(0));
    let counter = notifications.clone();
    store.borrow_mut().subscribe(move |_| *counter.borrow_mut() += 1);
    let revision = renderer.borrow().revision();

    let press = PointerInput::mouse(290.0, 330.0);
    ctl.pointer_down(&press, &HitTarget::node(&child));
    assert_eq!(ctl.dragged_node(1), Some(child.as_str()));
    assert_eq!(ctl.mode(), InteractionMode::Dragging);
    assert_eq!(ctl.selected_node(), Some(child.as_str()));

    ctl.pointer_move(&press.at(400.0, 500.0));
    assert_eq!(position_of(&store, &child), Position::new(390.0, 490.0));
    let visual = renderer.borrow().node_position(&child).unwrap();
    assert!(approx(visual.x, 390.0) && approx(visual.y, 490.0));
    assert_eq!(*notifications.borrow(), 0);
    assert_eq!(renderer.borrow().revision(), revision);

    ctl.pointer_up(&press.at(400.0, 500.0));
    assert_eq!(*notifications.borrow(), 1);
    assert_eq!(renderer.borrow().revision(), revision + 1);
    assert_eq!(position_of(&store, &child), Position::new(390.0, 490.0));
    assert_eq!(ctl.mode(), InteractionMode::Idle);
}

#[test]
fn release_without_movement_does_not_notify() {
    let (store, _renderer, mut ctl) = setup();
    let notifications = Rc::new(RefCell::new(0));
    let counter = notifications.clone();
    store.borrow_mut().subscribe(move |_| *counter.borrow_mut() += 1);
    let press = PointerInput::mouse(200.0, 400.0);
    ctl.pointer_down(&press, &HitTarget::node(ROOT_INSIGHT_ID));
    ctl.pointer_up(&press);
    assert_eq!(*notifications.borrow(), 0);
}

#[test]
fn pointer_cancel_keeps_the_last_position_and_notifies() {
    let (store, _renderer, mut ctl) = setup();
    let notifications = Rc::new(RefCell::new(0));
    let counter = notifications.clone();
    store.borrow_mut().subscribe(move |_| *counter.borrow_mut() += 1);

    let press = PointerInput::touch(7, 600.0, 400.0, 0.0);
    ctl.pointer_down(&press, &HitTarget::node(ROOT_ACTION_ID));
    ctl.pointer_move(&press.at(650.0, 420.0));
    ctl.pointer_cancel(&press);
    assert_eq!(position_of(&store, ROOT_ACTION_ID), Position::new(650.0, 420.0));
    assert_eq!(*notifications.borrow(), 1);
    assert!(ctl.dragged_node(7).is_none());
}

#[test]
fn drags_are_tracked_per_pointer() {
    let (store, _renderer, mut ctl) = setup();
    let a = add_child(&store, ROOT_INSIGHT_ID);
    let b = add_child(&store, ROOT_ACTION_ID);
    let a_start = position_of(&store, &a);
    let b_start = position_of(&store, &b);

    let finger = PointerInput::touch(1, a_start.x, a_start.y, 0.0);
    let mut pen = PointerInput::mouse(b_start.x, b_start.y);
    pen.kind = PointerKind::Pen;
    pen.pointer_id = 2;
    ctl.pointer_down(&finger, &HitTarget::node(&a));
    ctl.pointer_down(&pen, &HitTarget::node(&b));

    ctl.pointer_move(&pen.at(b_start.x + 10.0, b_start.y));
    assert_eq!(position_of(&store, &a), a_start);
    assert_eq!(position_of(&store, &b), Position::new(b_start.x + 10.0, b_start.y));

    // A second finger is not primary and never starts a drag.
    let second = PointerInput::touch(3, b_start.x, b_start.y, 5.0).secondary_finger();
    ctl.pointer_down(&second, &HitTarget::node(&b));
    assert!(ctl.dragged_node(3).is_none());

    ctl.pointer_move(&finger.at(a_start.x, a_start.y + 30.0));
    assert_eq!(position_of(&store, &a), Position::new(a_start.x, a_start.y + 30.0));
}

#[test]
fn secondary_button_neither_selects_nor_drags() {
    let (_store, _renderer, mut ctl) = setup();
    let press = PointerInput::mouse(200.0, 400.0).with_button(PointerButton::Secondary);
    ctl.pointer_down(&press, &HitTarget::node(ROOT_INSIGHT_ID));
    assert!(ctl.selected_node().is_none());
    assert!(ctl.dragged_node(1).is_none());
}

#[test]
fn double_click_edits_and_ctrl_enter_commits_trimmed_text() {
    let (store, _renderer, mut ctl) = setup();
    let child = add_child(&store, ROOT_INSIGHT_ID);
    let press = PointerInput::mouse(280.0, 320.0).with_click_count(2);
    ctl.pointer_down(&press, &HitTarget::node(&child));
    ctl.double_click(&press, &HitTarget::node(&child));
    assert_eq!(ctl.mode(), InteractionMode::Editing);
    assert_eq!(ctl.editor().unwrap().text(), "child");

    ctl.set_editor_text("  Renamed  ");
    assert!(!ctl.key_down(Key::Enter {
        ctrl_or_meta: false
    }));
    assert!(ctl.editor().is_some());
    assert!(ctl.key_down(Key::Enter { ctrl_or_meta: true }));
    assert!(ctl.editor().is_none());
    assert_eq!(store.borrow().node(&child).unwrap().content, "Renamed");

    ctl.open_editor(&child);
    ctl.set_editor_text("   ");
    // Blur.
    ctl.pointer_down(&PointerInput::mouse(5.0, 5.0), &HitTarget::Canvas);
    assert_eq!(store.borrow().node(&child).unwrap().content, "Renamed");

    ctl.open_editor(&child);
    ctl.set_editor_text("discarded");
    assert!(ctl.cancel_editor());
    assert_eq!(store.borrow().node(&child).unwrap().content, "Renamed");
}

#[test]
fn touch_double_tap_opens_the_editor_within_the_window() {
    let (_store, _renderer, mut ctl) = setup();
    let target = HitTarget::node(ROOT_INSIGHT_ID);
    let tap = |t: f64| PointerInput::touch(1, 200.0, 400.0, t);

    ctl.pointer_down(&tap(0.0), &target);
    ctl.pointer_up(&tap(0.0));
    ctl.pointer_down(&tap(500.0), &target);
    ctl.pointer_up(&tap(500.0));
    assert!(ctl.editor().is_none());

    ctl.pointer_down(&tap(700.0), &target);
    assert_eq!(ctl.editor().unwrap().node_id(), ROOT_INSIGHT_ID);
}

#[test]
fn blank_double_click_adds_a_child_of_the_selection_at_the_pointer() {
    let (store, _renderer, mut ctl) = setup();
    ctl.click(&HitTarget::node(ROOT_ACTION_ID));
    ctl.double_click(&PointerInput::mouse(900.0, 700.0), &HitTarget::Canvas);

    let id = ctl.selected_node().unwrap().to_string();
    let store = store.borrow();
    let node = store.node(&id).unwrap();
    assert_eq!(node.parent.as_deref(), Some(ROOT_ACTION_ID));
    assert_eq!(node.content, DEFAULT_NODE_CONTENT);
    assert_eq!(node.position, Position::new(900.0, 700.0));
    assert_eq!(ctl.editor().unwrap().node_id(), id);
}

#[test]
fn canvas_double_tap_without_selection_uses_the_first_root() {
    let (store, _renderer, mut ctl) = setup();
    let tap = |t: f64| PointerInput::touch(1, 700.0, 100.0, t);
    ctl.pointer_down(&tap(0.0), &HitTarget::Canvas);
    ctl.pointer_up(&tap(0.0));
    ctl.pointer_down(&tap(100.0), &HitTarget::Canvas);

    let id = ctl.selected_node().unwrap().to_string();
    let node = store.borrow().node(&id).cloned().unwrap();
    assert_eq!(node.parent.as_deref(), Some(ROOT_INSIGHT_ID));
    assert_eq!(node.position, Position::new(700.0, 100.0));
}

#[test]
fn node_menu_disables_delete_for_roots() {
    let (store, _renderer, mut ctl) = setup();
    ctl.open_context_menu(&HitTarget::node(ROOT_INSIGHT_ID), screen_point(1.0, 2.0));
    let menu = ctl.context_menu().unwrap();
    assert_eq!(menu.kind, MenuKind::Node);
    assert_eq!(
        menu.labels(),
        [GENERATE_CHILD_LABEL, START_LINK_LABEL, DELETE_NODE_LABEL]
    );
    assert!(menu.items[2].disabled);
    assert_eq!(ctl.selected_node(), Some(ROOT_INSIGHT_ID));

    assert!(!ctl.activate_menu_item(2));
    assert!(ctl.context_menu().is_some());
    assert_eq!(store.borrow().node_count(), 2);

    assert!(ctl.activate_menu_item(1));
    assert!(ctl.context_menu().is_none());
    assert_eq!(ctl.linking_source(), Some(ROOT_INSIGHT_ID));
}

#[test]
fn node_menu_generates_children_and_deletes_subtrees() {
    let (store, _renderer, mut ctl) = setup();
    let child = add_child(&store, ROOT_INSIGHT_ID);

    ctl.open_context_menu(&HitTarget::node(&child), screen_point(0.0, 0.0));
    assert!(ctl.activate_menu_item(0));
    let grandchild = ctl.selected_node().unwrap().to_string();
    assert_eq!(
        store.borrow().node(&grandchild).unwrap().parent.as_deref(),
        Some(child.as_str())
    );
    ctl.cancel_editor();

    ctl.open_context_menu(&HitTarget::node(&child), screen_point(0.0, 0.0));
    assert!(ctl.activate_menu_item(2));
    assert_eq!(store.borrow().node_count(), 2);
    assert!(ctl.selected_node().is_none());
}

#[test]
fn canvas_menu_offers_one_entry_per_root() {
    let (store, _renderer, mut ctl) = setup();
    ctl.open_context_menu(&HitTarget::Canvas, screen_point(10.0, 10.0));
    let menu = ctl.context_menu().unwrap();
    assert_eq!(menu.kind, MenuKind::Canvas);
    assert_eq!(menu.items.len(), 2);
    assert_eq!(
        menu.items[0].label,
        format!("Add child under {ROOT_INSIGHT_CONTENT}")
    );

    assert!(ctl.activate_menu_item(1));
    let id = ctl.selected_node().unwrap().to_string();
    let node = store.borrow().node(&id).cloned().unwrap();
    assert_eq!(node.parent.as_deref(), Some(ROOT_ACTION_ID));
    assert_eq!(node.content, DEFAULT_BRANCH_CONTENT);
    assert_eq!(ctl.editor().unwrap().node_id(), id);
}

#[test]
fn quick_commands_report_notices() {
    let (store, _renderer, mut ctl) = setup();
    assert_eq!(
        ctl.quick_delete_selected(),
        Err(Notice::SelectNonRootToDelete)
    );
    ctl.click(&HitTarget::node(ROOT_ACTION_ID));
    assert_eq!(ctl.quick_delete_selected(), Err(Notice::RootNotDeletable));
    assert_eq!(
        Notice::RootNotDeletable.to_string(),
        "Root nodes cannot be deleted."
    );

    ctl.clear_selection();
    let id = ctl.quick_add_child().unwrap();
    assert_eq!(
        store.borrow().node(&id).unwrap().parent.as_deref(),
        Some(ROOT_INSIGHT_ID)
    );
    assert!(ctl.quick_start_link().is_ok());
    assert_eq!(ctl.linking_source(), Some(id.as_str()));

    // Deleting the link source also ends linking.
    assert!(ctl.quick_delete_selected().is_ok());
    assert!(!ctl.is_linking());
    assert!(ctl.selected_node().is_none());
    assert!(!store.borrow().contains_node(&id));
    assert!(!ctl.quick_cancel_link());
}

#[test]
fn external_resets_are_reconciled() {
    let (store, _renderer, mut ctl) = setup();
    let child = add_child(&store, ROOT_INSIGHT_ID);
    ctl.click(&HitTarget::node(&child));
    ctl.begin_linking(&child);
    store.borrow_mut().reset();
    ctl.sync_with_store();
    assert!(ctl.selected_node().is_none());
    assert!(!ctl.is_linking());
}

#[test]
fn wheel_zooms_about_the_cursor() {
    let (store, renderer, mut ctl) = setup();
    ctl.wheel(-1.0, screen_point(100.0, 100.0));
    let view = store.borrow().view_state();
    assert!(approx(view.zoom, 1.08));
    assert!(approx(view.pan.x, -8.0));
    assert_eq!(renderer.borrow().view(), view);

    for _ in 0..100 {
        ctl.wheel(1.0, screen_point(100.0, 100.0));
    }
    assert!(approx(store.borrow().view_state().zoom, 0.4));
}

#[test]
fn canvas_drag_pans_live_and_commits_on_release() {
    let (store, renderer, mut ctl) = setup();
    let press = PointerInput::mouse(10.0, 10.0);
    ctl.pointer_down(&press, &HitTarget::Canvas);
    assert_eq!(ctl.mode(), InteractionMode::Panning);
    ctl.pointer_move(&press.at(30.0, 50.0));
    assert_eq!(renderer.borrow().view().pan, Position::new(20.0, 40.0));
    assert_eq!(store.borrow().view_state().pan, Position::new(0.0, 0.0));

    ctl.pointer_up(&press.at(30.0, 50.0));
    assert_eq!(store.borrow().view_state().pan, Position::new(20.0, 40.0));
    assert_eq!(ctl.mode(), InteractionMode::Idle);
}

#[test]
fn pan_survives_a_drag_committed_mid_gesture() {
    let (store, renderer, mut ctl) = setup();
    let pan = PointerInput::mouse(10.0, 10.0);
    ctl.pointer_down(&pan, &HitTarget::Canvas);
    ctl.pointer_move(&pan.at(30.0, 50.0));

    let finger = PointerInput::touch(7, 600.0, 400.0, 0.0);
    ctl.pointer_down(&finger, &HitTarget::node(ROOT_ACTION_ID));
    ctl.pointer_move(&finger.at(650.0, 420.0));
    ctl.pointer_up(&finger.at(650.0, 420.0));
    assert_eq!(store.borrow().view_state().pan, Position::new(0.0, 0.0));
    assert_eq!(renderer.borrow().view().pan, Position::new(20.0, 40.0));

    ctl.pointer_move(&pan.at(40.0, 60.0));
    assert_eq!(renderer.borrow().view().pan, Position::new(30.0, 50.0));
    ctl.pointer_up(&pan.at(40.0, 60.0));
    assert_eq!(store.borrow().view_state().pan, Position::new(30.0, 50.0));
    assert_eq!(renderer.borrow().view().pan, Position::new(30.0, 50.0));
}

#[test]
fn wheel_during_a_pan_keeps_the_travelled_distance() {
    let (store, renderer, mut ctl) = setup();
    let pan = PointerInput::mouse(10.0, 10.0);
    ctl.pointer_down(&pan, &HitTarget::Canvas);
    ctl.pointer_move(&pan.at(30.0, 50.0));

    ctl.wheel(-1.0, screen_point(0.0, 0.0));
    let zoomed = store.borrow().view_state();
    assert!(approx(zoomed.pan.x, 21.6) && approx(zoomed.pan.y, 43.2));
    assert_eq!(renderer.borrow().view(), zoomed);

    ctl.pointer_move(&pan.at(40.0, 60.0));
    ctl.pointer_up(&pan.at(40.0, 60.0));
    let view = store.borrow().view_state();
    assert!(approx(view.pan.x, 31.6) && approx(view.pan.y, 53.2));
    assert!(approx(view.zoom, 1.08));
}

#[test]
fn two_canvas_touches_pinch_zoom_about_the_midpoint() {
    let (store, renderer, mut ctl) = setup();
    let first = PointerInput::touch(1, 100.0, 100.0, 0.0);
    let second = PointerInput::touch(2, 200.0, 100.0, 1000.0).secondary_finger();
    ctl.pointer_down(&first, &HitTarget::Canvas);
    ctl.pointer_down(&second, &HitTarget::Canvas);
    assert_eq!(ctl.mode(), InteractionMode::Pinching);

    ctl.pointer_move(&second.at(300.0, 100.0));
    let view = renderer.borrow().view();
    assert!(approx(view.zoom, 2.0));
    assert!(approx(view.pan.x, -100.0));
    assert!(approx(view.pan.y, -100.0));

    ctl.pointer_up(&second);
    ctl.pointer_up(&first);
    let stored = store.borrow().view_state();
    assert!(approx(stored.zoom, 2.0));
    assert!(approx(stored.pan.x, -100.0));
    assert_eq!(ctl.mode(), InteractionMode::Idle);
}

#[test]
fn pinch_zoom_is_clamped() {
    let (_store, renderer, mut ctl) = setup();
    let first = PointerInput::touch(1, 100.0, 100.0, 0.0);
    let second = PointerInput::touch(2, 110.0, 100.0, 1000.0).secondary_finger();
    ctl.pointer_down(&first, &HitTarget::Canvas);
    ctl.pointer_down(&second, &HitTarget::Canvas);
    ctl.pointer_move(&second.at(610.0, 100.0));
    assert!(approx(renderer.borrow().view().zoom, 2.5));
}

#[test]
fn hit_test_maps_client_points_to_nodes() {
    let (_store, _renderer, ctl) = setup();
    assert_eq!(
        ctl.hit_test(screen_point(200.0, 400.0)),
        HitTarget::node(ROOT_INSIGHT_ID)
    );
    assert_eq!(ctl.hit_test(screen_point(400.0, 100.0)), HitTarget::Canvas);
}

#[test]
fn listeners_can_be_removed() {
    let (_store, _renderer, mut ctl) = setup();
    let calls = Rc::new(RefCell::new(0));
    let counter = calls.clone();
    let id = ctl.on_linking_change(move |_| *counter.borrow_mut() += 1);
    assert!(ctl.remove_listener(id));
    assert!(!ctl.remove_listener(id));
    ctl.begin_linking(ROOT_INSIGHT_ID);
    assert_eq!(*calls.borrow(), 1);
}

#[test]
#[traced_test]
fn mode_transitions_are_logged() {
    let (_store, _renderer, mut ctl) = setup();
    ctl.begin_linking(ROOT_INSIGHT_ID);
    ctl.cancel_linking();
    assert!(logs_contain("linking started"));
    assert!(logs_contain("linking cancelled"));
}

#[test]
fn options_read_interaction_config() {
    let cfg = EditorConfig::with_overrides(&serde_json::json!({
        "interaction": { "doubleTapMs": 500, "wheelZoomIn": -1 }
    }));
    let opts = InteractionOptions::from_config(&cfg);
    assert_eq!(opts.double_tap_ms, 500.0);
    assert_eq!(opts.wheel_zoom_in, 1.08);
    assert_eq!(opts.wheel_zoom_out, 0.92);
}
