use genesis_core::geom::{ScreenPoint, screen_point};

pub type PointerId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerKind {
    #[default]
    Mouse,
    Pen,
    Touch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerButton {
    /// Left mouse button, pen contact, or a touch.
    #[default]
    Primary,
    Middle,
    Secondary,
}

/// One pointer event in client (page) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub pointer_id: PointerId,
    pub kind: PointerKind,
    pub button: PointerButton,
    /// False for the second and later fingers of a multi-touch gesture.
    pub is_primary: bool,
    pub client: ScreenPoint,
    /// Monotonic event time in milliseconds.
    pub time_ms: f64,
    /// Consecutive click count (`2` on the second press of a double click).
    pub click_count: u32,
}

impl PointerInput {
    pub fn mouse(x: f64, y: f64) -> Self {
        Self {
            pointer_id: 1,
            kind: PointerKind::Mouse,
            button: PointerButton::Primary,
            is_primary: true,
            client: screen_point(x, y),
            time_ms: 0.0,
            click_count: 1,
        }
    }

    pub fn touch(pointer_id: PointerId, x: f64, y: f64, time_ms: f64) -> Self {
        Self {
            pointer_id,
            kind: PointerKind::Touch,
            button: PointerButton::Primary,
            is_primary: true,
            client: screen_point(x, y),
            time_ms,
            click_count: 1,
        }
    }

    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }

    pub fn with_click_count(mut self, click_count: u32) -> Self {
        self.click_count = click_count;
        self
    }

    pub fn with_time(mut self, time_ms: f64) -> Self {
        self.time_ms = time_ms;
        self
    }

    pub fn secondary_finger(mut self) -> Self {
        self.is_primary = false;
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.client = screen_point(x, y);
        self
    }

    pub fn is_touch(&self) -> bool {
        self.kind == PointerKind::Touch
    }
}

/// What a pointer event landed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HitTarget {
    Node(String),
    Canvas,
}

impl HitTarget {
    pub fn node(id: impl Into<String>) -> Self {
        Self::Node(id.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    /// `ctrl_or_meta` is true for Ctrl+Enter / Cmd+Enter.
    Enter { ctrl_or_meta: bool },
    Other,
}
