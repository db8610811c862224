#![forbid(unsafe_code)]

//! Genesis Mind document model + graph store (headless).
//!
//! Design goals:
//! - a single source of truth for the mind-map document (`GraphStore`)
//! - deterministic, testable outputs (typed snapshots, injectable clock)
//! - runtime-agnostic async file helpers (no specific executor required)

pub mod config;
pub mod error;
pub mod geom;
pub mod ids;
pub mod model;
pub mod normalize;
pub mod persist;
pub mod store;
pub mod time;

pub use config::EditorConfig;
pub use error::{Error, Result};
pub use geom::GeometryOptions;
pub use model::{
    DEFAULT_MIND_TYPE, DOCUMENT_VERSION, Document, Graph, Link, Metadata, Node, Position,
    ROOT_ACTION_ID, ROOT_INSIGHT_ID, ViewState,
};
pub use store::{GraphStore, SharedStore, SubscriptionId, ToggleOutcome, UpdateOptions};
