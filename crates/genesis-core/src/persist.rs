//! Document (de)serialization and the export file-name convention.

use crate::error::{Error, Result};
use crate::model::{DEFAULT_MIND_TYPE, Document};
use crate::store::GraphStore;
use crate::time::{self, Clock};
use serde_json::Value;
use std::path::Path;

/// Trimmed, lowercased, ASCII letters only; falls back to `daily`.
pub fn sanitize_type_label(value: &str) -> String {
    let cleaned: String = value
        .trim()
        .to_lowercase()
        .chars()
        .filter(char::is_ascii_lowercase)
        .collect();
    if cleaned.is_empty() {
        DEFAULT_MIND_TYPE.to_string()
    } else {
        cleaned
    }
}

/// The stamp part of an export file name: the stored `created_stamp` when valid, else the stored
/// `created_at` in local time, else now.
pub fn export_stamp(doc: &Document, clock: &Clock) -> String {
    let stored = doc.metadata.created_stamp.trim();
    if time::is_stamp(stored) {
        return stored.to_string();
    }
    time::stamp_from_iso(&doc.metadata.created_at, clock).unwrap_or_else(|| clock.now_stamp())
}

/// `genesis-mind.<type>.<YYYYMMDD-HHMMSS>.json`
pub fn export_file_name(doc: &Document, type_label: &str, clock: &Clock) -> String {
    format!(
        "genesis-mind.{}.{}.json",
        sanitize_type_label(type_label),
        export_stamp(doc, clock)
    )
}

/// Two-space indented JSON, field order as in the document model.
pub fn to_json_pretty(doc: &Document) -> Result<String> {
    Ok(serde_json::to_string_pretty(doc)?)
}

pub fn parse_document_text(text: &str) -> Result<Value> {
    serde_json::from_str(text)
        .map_err(|e| Error::validation(format!("unable to parse JSON: {e}")))
}

/// Parses `text` and bulk-replaces the store's document. The store is left untouched on failure.
pub fn load_document_text(store: &mut GraphStore, text: &str) -> Result<()> {
    let raw = parse_document_text(text)?;
    store.load_from_data(&raw)
}

pub async fn read_document_file(path: impl AsRef<Path>) -> Result<Value> {
    let text = std::fs::read_to_string(path.as_ref())?;
    parse_document_text(&text)
}

pub async fn write_document_file(path: impl AsRef<Path>, doc: &Document) -> Result<()> {
    let mut json = to_json_pretty(doc)?;
    json.push('\n');
    std::fs::write(path.as_ref(), json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use futures::executor::block_on;

    fn clock() -> Clock {
        Clock::fixed(DateTime::parse_from_rfc3339("2025-06-07T08:09:10.000+00:00").unwrap())
    }

    #[test]
    fn type_labels_are_sanitized() {
        assert_eq!(sanitize_type_label("  Monthly "), "monthly");
        assert_eq!(sanitize_type_label("Q3-review!"), "qreview");
        assert_eq!(sanitize_type_label("café"), "caf");
        assert_eq!(sanitize_type_label("123"), "daily");
        assert_eq!(sanitize_type_label(""), "daily");
    }

    #[test]
    fn file_name_prefers_stored_stamp() {
        let mut store = GraphStore::new().with_clock(clock());
        let doc = store.get_state();
        assert_eq!(
            export_file_name(&doc, "Weekly", &clock()),
            "genesis-mind.weekly.20250607-080910.json"
        );

        store.set_mind_type("monthly");
        let mut doc = store.get_state();
        doc.metadata.created_stamp = "bogus".into();
        doc.metadata.created_at = "2024-01-02T03:04:05.000Z".into();
        assert_eq!(
            export_file_name(&doc, "", &clock()),
            "genesis-mind.daily.20240102-030405.json"
        );

        doc.metadata.created_at = "never".into();
        assert_eq!(export_stamp(&doc, &clock()), "20250607-080910");
    }

    #[test]
    fn json_output_uses_wire_field_names() {
        let store = GraphStore::new().with_clock(clock());
        let json = to_json_pretty(&store.get_state()).unwrap();
        assert!(json.contains("\n  \"metadata\": {"));
        assert!(json.contains("\"isRoot\": true"));
        assert!(json.contains("\"viewState\""));
        assert!(json.contains("\"created_stamp\": \"20250607-080910\""));
    }

    #[test]
    fn bad_text_leaves_store_untouched() {
        let mut store = GraphStore::new();
        store.add_node("root_insight", "keep", None).unwrap();
        let before = store.get_state();
        let err = load_document_text(&mut store, "{ not json").unwrap_err();
        assert!(err.is_validation());
        let err = load_document_text(&mut store, "[1, 2]").unwrap_err();
        assert!(err.is_validation());
        assert_eq!(store.get_state().graph, before.graph);
    }

    #[test]
    fn files_round_trip_through_async_helpers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mind.json");
        let mut store = GraphStore::new();
        let id = store.add_node("root_action", "persisted", None).unwrap();
        block_on(write_document_file(&path, &store.get_state())).unwrap();

        let raw = block_on(read_document_file(&path)).unwrap();
        let mut other = GraphStore::new();
        other.load_from_data(&raw).unwrap();
        assert_eq!(other.node(&id).unwrap().content, "persisted");

        let missing = block_on(read_document_file(dir.path().join("nope.json")));
        assert!(matches!(missing, Err(Error::Io(_))));
    }
}
