//! Toolbar state: type selector, file commands, and the quick-action buttons.

use crate::interact::{InteractionController, Notice};
use genesis_core::persist::{export_file_name, load_document_text, to_json_pretty};
use genesis_core::{SharedStore, SubscriptionId};
use regex::Regex;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::OnceLock;

/// Built-in entries of the type selector, in display order.
pub const TYPE_OPTIONS: [&str; 6] = [
    "daily",
    "weekly",
    "monthly",
    "quarterly",
    "annually",
    "decadely",
];

fn letters_only() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z]+$").expect("valid regex"))
}

/// `weekly` -> `Weekly`.
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonStates {
    pub start_link: bool,
    pub delete_node: bool,
    pub cancel_link: bool,
}

impl ButtonStates {
    pub fn from_controller(ctl: &InteractionController) -> Self {
        let selected = ctl.selected_node().is_some();
        Self {
            start_link: selected,
            delete_node: selected,
            cancel_link: ctl.is_linking(),
        }
    }
}

/// Output of [`UiControls::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedDocument {
    pub file_name: String,
    pub json: String,
}

#[derive(Debug, Default)]
struct SelectorState {
    current: String,
    options: Vec<String>,
}

impl SelectorState {
    fn track(&mut self, mind_type: &str) {
        if !self.options.iter().any(|o| o == mind_type) {
            self.options.push(mind_type.to_string());
        }
        self.current = mind_type.to_string();
    }
}

/// Command surface over the shared store. Selector state follows the store through a
/// subscription, so loads and resets are reflected without extra calls.
#[derive(Debug)]
pub struct UiControls {
    store: SharedStore,
    selector: Rc<RefCell<SelectorState>>,
    subscription: SubscriptionId,
}

impl UiControls {
    pub fn new(store: SharedStore) -> Self {
        let selector = Rc::new(RefCell::new(SelectorState {
            current: String::new(),
            options: TYPE_OPTIONS.iter().map(|s| s.to_string()).collect(),
        }));
        let subscription = {
            let mut s = store.borrow_mut();
            selector.borrow_mut().track(s.mind_type());
            let sink = Rc::downgrade(&selector);
            s.subscribe(move |doc| {
                if let Some(sel) = sink.upgrade() {
                    sel.borrow_mut().track(&doc.metadata.mind_type);
                }
            })
        };
        Self {
            store,
            selector,
            subscription,
        }
    }

    pub fn current_type(&self) -> String {
        self.selector.borrow().current.clone()
    }

    /// Built-in types followed by any custom ones seen so far.
    pub fn type_options(&self) -> Vec<String> {
        self.selector.borrow().options.clone()
    }

    /// `(value, label)` pairs for the selector.
    pub fn type_option_labels(&self) -> Vec<(String, String)> {
        self.selector
            .borrow()
            .options
            .iter()
            .map(|o| (o.clone(), capitalize(o)))
            .collect()
    }

    pub fn select_type(&self, value: &str) {
        self.store.borrow_mut().set_mind_type(value);
    }

    /// Validates a user-typed type, adds it to the options, and selects it.
    pub fn set_custom_type(&self, input: &str) -> Result<String, Notice> {
        let trimmed = input.trim();
        if !letters_only().is_match(trimmed) {
            return Err(Notice::InvalidType);
        }
        let value = trimmed.to_lowercase();
        self.selector.borrow_mut().track(&value);
        self.select_type(&value);
        Ok(value)
    }

    /// Replaces the document with `text`; the store is untouched when it cannot be parsed.
    pub fn load_text(&self, ctl: &mut InteractionController, text: &str) -> Result<(), Notice> {
        let loaded = load_document_text(&mut self.store.borrow_mut(), text);
        if let Err(err) = loaded {
            tracing::warn!(%err, "failed to load document");
            return Err(Notice::UnparseableFile);
        }
        ctl.sync_with_store();
        Ok(())
    }

    pub fn save(&self) -> genesis_core::Result<SavedDocument> {
        let store = self.store.borrow();
        let doc = store.document();
        Ok(SavedDocument {
            file_name: export_file_name(doc, &doc.metadata.mind_type, store.clock()),
            json: to_json_pretty(doc)?,
        })
    }

    pub fn reset(&self, ctl: &mut InteractionController) {
        ctl.cancel_linking();
        ctl.clear_selection();
        self.store.borrow_mut().reset();
        ctl.sync_with_store();
    }

    pub fn button_states(&self, ctl: &InteractionController) -> ButtonStates {
        ButtonStates::from_controller(ctl)
    }

    pub fn add_child(&self, ctl: &mut InteractionController) -> Result<String, Notice> {
        ctl.quick_add_child()
    }

    pub fn start_link(&self, ctl: &mut InteractionController) -> Result<(), Notice> {
        ctl.quick_start_link()
    }

    pub fn cancel_link(&self, ctl: &mut InteractionController) -> bool {
        ctl.quick_cancel_link()
    }

    pub fn delete_selected(&self, ctl: &mut InteractionController) -> Result<(), Notice> {
        ctl.quick_delete_selected()
    }
}

impl Drop for UiControls {
    fn drop(&mut self) {
        if let Ok(mut store) = self.store.try_borrow_mut() {
            store.unsubscribe(self.subscription);
        }
    }
}
