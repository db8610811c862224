//! Comparison mode: batch-imported documents kept as read-only records until one is loaded.

use crate::interact::Notice;
use genesis_core::ids::generate_id;
use genesis_core::normalize::first_str;
use genesis_core::persist::parse_document_text;
use genesis_core::time::{self, Clock};
use genesis_core::{DEFAULT_MIND_TYPE, Error, GraphStore};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Free,
    Compare,
}

impl Mode {
    /// `"compare"` selects comparison mode; anything else is free mode.
    pub fn resolve(value: &str) -> Self {
        if value == "compare" {
            Self::Compare
        } else {
            Self::Free
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordSummary {
    #[serde(rename = "type")]
    pub mind_type: String,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub nodes: usize,
    pub links: usize,
}

impl RecordSummary {
    /// Reads type, timestamps and counts from a raw payload, accepting legacy key variants.
    pub fn from_value(data: &Value) -> Self {
        let meta = data.get("metadata").and_then(Value::as_object);
        let text = |keys: &[&str]| meta.and_then(|m| first_str(m, keys)).map(str::to_string);
        let count = |key: &str| {
            data.get("graph")
                .and_then(|g| g.get(key))
                .and_then(Value::as_array)
                .map_or(0, Vec::len)
        };
        Self {
            mind_type: text(&["mind_type", "mindType"])
                .unwrap_or_else(|| DEFAULT_MIND_TYPE.to_string()),
            created: text(&["created_at", "createdAt"]),
            updated: text(&["last_updated", "lastUpdated"]),
            nodes: count("nodes"),
            links: count("links"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportRecord {
    pub id: String,
    pub name: String,
    /// Source size in bytes.
    pub size: u64,
    #[serde(rename = "importedAt")]
    pub imported_at: String,
    pub data: Value,
    pub summary: RecordSummary,
}

impl ImportRecord {
    pub fn size_label(&self) -> String {
        format!("{:.1} KB", self.size as f64 / 1024.0)
    }

    /// Card lines: type, counts, dates, size.
    pub fn meta_items(&self) -> Vec<String> {
        let s = &self.summary;
        vec![
            format!("Type: {}", s.mind_type),
            format!("Nodes: {}", s.nodes),
            format!("Links: {}", s.links),
            format!("Created: {}", format_summary_date(s.created.as_deref())),
            format!("Updated: {}", format_summary_date(s.updated.as_deref())),
            format!("Size: {}", self.size_label()),
        ]
    }
}

/// A file handed to [`ComparisonSession::import_batch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFile {
    pub name: String,
    pub text: String,
}

impl ImportFile {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug)]
pub struct ImportFailure {
    pub file_name: String,
    pub error: Error,
}

impl ImportFailure {
    pub fn notice(&self) -> Notice {
        Notice::ImportFailed {
            file_name: self.file_name.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct BatchImport {
    /// Ids of the new records, in file order.
    pub imported: Vec<String>,
    pub failures: Vec<ImportFailure>,
}

#[derive(Debug, Clone, Default)]
pub struct ComparisonSession {
    records: Vec<ImportRecord>,
    mode: Mode,
    clock: Clock,
}

impl ComparisonSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            tracing::debug!(?mode, "comparison mode changed");
        }
        self.mode = mode;
    }

    /// Newest batch first.
    pub fn records(&self) -> &[ImportRecord] {
        &self.records
    }

    pub fn record(&self, id: &str) -> Option<&ImportRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Parses every file into a record without touching any live store. The batch is prepended
    /// to the list; a non-empty batch switches to compare mode.
    pub fn import_batch(&mut self, files: impl IntoIterator<Item = ImportFile>) -> BatchImport {
        let mut batch = Vec::new();
        let mut failures = Vec::new();
        for file in files {
            match self.build_record(&file) {
                Ok(record) => batch.push(record),
                Err(error) => {
                    tracing::warn!(file = %file.name, %error, "failed to import");
                    failures.push(ImportFailure {
                        file_name: file.name,
                        error,
                    });
                }
            }
        }
        let imported: Vec<String> = batch.iter().map(|r| r.id.clone()).collect();
        if !batch.is_empty() {
            batch.append(&mut self.records);
            self.records = batch;
            self.set_mode(Mode::Compare);
        }
        BatchImport { imported, failures }
    }

    /// Reads `paths` and imports them; unreadable files are reported as failures.
    pub async fn import_paths<P: AsRef<Path>>(&mut self, paths: &[P]) -> BatchImport {
        let mut files = Vec::new();
        let mut failures = Vec::new();
        for path in paths {
            let path = path.as_ref();
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            match std::fs::read_to_string(path) {
                Ok(text) => files.push(ImportFile { name, text }),
                Err(err) => failures.push(ImportFailure {
                    file_name: name,
                    error: err.into(),
                }),
            }
        }
        let mut result = self.import_batch(files);
        failures.append(&mut result.failures);
        result.failures = failures;
        result
    }

    fn build_record(&self, file: &ImportFile) -> genesis_core::Result<ImportRecord> {
        let data = parse_document_text(&file.text)?;
        if !data.is_object() {
            return Err(Error::Validation {
                message: "expected a JSON object".to_string(),
            });
        }
        Ok(ImportRecord {
            id: generate_id("record", &self.clock),
            name: file.name.clone(),
            size: file.text.len() as u64,
            imported_at: self.clock.now_iso(),
            summary: RecordSummary::from_value(&data),
            data,
        })
    }

    /// Replaces the live document with record `id`. `Ok(false)` for an unknown id; the store
    /// is untouched on failure.
    pub fn load_record(&self, id: &str, store: &mut GraphStore) -> Result<bool, Notice> {
        let Some(record) = self.record(id) else {
            return Ok(false);
        };
        store.load_from_data(&record.data).map_err(|err| {
            tracing::warn!(record = id, %err, "failed to load record");
            Notice::RecordLoadFailed
        })?;
        Ok(true)
    }
}

/// `YYYY-MM-DD` for an ISO timestamp, the raw value when unparseable, `--` when missing.
pub fn format_summary_date(value: Option<&str>) -> String {
    match value.map(str::trim) {
        None | Some("") => "--".to_string(),
        Some(raw) => time::iso_date(raw).unwrap_or_else(|| raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use serde_json::json;

    fn session() -> ComparisonSession {
        let now = DateTime::parse_from_rfc3339("2025-06-01T08:00:00Z").unwrap();
        ComparisonSession::new().with_clock(Clock::fixed(now))
    }

    fn doc_text(mind_type: &str, nodes: usize) -> String {
        let nodes: Vec<_> = (0..nodes)
            .map(|i| json!({"id": format!("n{i}"), "parent": "root_insight", "content": "x"}))
            .collect();
        json!({
            "metadata": {"mindType": mind_type, "createdAt": "2025-01-02T03:04:05Z"},
            "graph": {"nodes": nodes, "links": []}
        })
        .to_string()
    }

    #[test]
    fn summaries_accept_key_variants() {
        let summary = RecordSummary::from_value(&json!({
            "metadata": {"mind_type": "weekly", "lastUpdated": "2025-02-03T00:00:00Z"},
            "graph": {"nodes": [{}, {}], "links": [{}]}
        }));
        assert_eq!(summary.mind_type, "weekly");
        assert_eq!(summary.created, None);
        assert_eq!(summary.updated.as_deref(), Some("2025-02-03T00:00:00Z"));
        assert_eq!((summary.nodes, summary.links), (2, 1));

        let empty = RecordSummary::from_value(&json!({}));
        assert_eq!(empty.mind_type, "daily");
        assert_eq!((empty.nodes, empty.links), (0, 0));
    }

    #[test]
    fn batches_are_prepended_and_switch_to_compare_mode() {
        let mut s = session();
        assert_eq!(s.mode(), Mode::Free);
        let first = s.import_batch([ImportFile::new("a.json", doc_text("daily", 1))]);
        assert_eq!(first.imported.len(), 1);
        assert_eq!(s.mode(), Mode::Compare);

        s.set_mode(Mode::Free);
        let second = s.import_batch([
            ImportFile::new("b.json", doc_text("weekly", 2)),
            ImportFile::new("broken.json", "{ nope"),
            ImportFile::new("list.json", "[1]"),
            ImportFile::new("c.json", doc_text("monthly", 3)),
        ]);
        assert_eq!(second.imported.len(), 2);
        assert_eq!(second.failures.len(), 2);
        assert_eq!(second.failures[0].file_name, "broken.json");
        assert!(second.failures[0].error.is_validation());
        assert_eq!(
            second.failures[1].notice().to_string(),
            "Unable to import list.json."
        );
        assert_eq!(s.mode(), Mode::Compare);

        let names: Vec<_> = s.records().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["b.json", "c.json", "a.json"]);
        let b = &s.records()[0];
        assert!(b.id.starts_with("record_"));
        assert_eq!(b.imported_at, "2025-06-01T08:00:00.000Z");
        assert_eq!(b.summary.mind_type, "weekly");
        assert_eq!(b.summary.nodes, 2);
    }

    #[test]
    fn failed_batches_leave_mode_and_records_alone() {
        let mut s = session();
        let result = s.import_batch([ImportFile::new("x.json", "not json")]);
        assert!(result.imported.is_empty());
        assert_eq!(s.mode(), Mode::Free);
        assert!(s.records().is_empty());
    }

    #[test]
    fn loading_a_record_replaces_the_live_document() {
        let mut s = session();
        let batch = s.import_batch([ImportFile::new("a.json", doc_text("weekly", 3))]);
        let mut store = GraphStore::new();
        assert_eq!(s.load_record("missing", &mut store), Ok(false));
        assert_eq!(store.node_count(), 2);

        assert_eq!(s.load_record(&batch.imported[0], &mut store), Ok(true));
        assert_eq!(store.node_count(), 5);
        assert_eq!(store.mind_type(), "weekly");
    }

    #[test]
    fn import_from_paths_reports_unreadable_files() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.json");
        std::fs::write(&good, doc_text("daily", 0)).unwrap();
        let missing = dir.path().join("missing.json");

        let mut s = session();
        let result = futures::executor::block_on(s.import_paths(&[&good, &missing]));
        assert_eq!(result.imported.len(), 1);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].file_name, "missing.json");
        assert!(matches!(result.failures[0].error, Error::Io(_)));
        assert_eq!(s.records()[0].name, "good.json");
    }

    #[test]
    fn sizes_and_dates_format_for_cards() {
        let mut s = session();
        let text = doc_text("daily", 0);
        let len = text.len();
        s.import_batch([ImportFile::new("a.json", text)]);
        let record = &s.records()[0];
        assert_eq!(record.size, len as u64);
        assert_eq!(record.size_label(), format!("{:.1} KB", len as f64 / 1024.0));
        let items = record.meta_items();
        assert_eq!(items[0], "Type: daily");
        assert_eq!(items[3], "Created: 2025-01-02");
        assert_eq!(items[4], "Updated: --");

        assert_eq!(format_summary_date(None), "--");
        assert_eq!(format_summary_date(Some("")), "--");
        assert_eq!(format_summary_date(Some("yesterday")), "yesterday");
        assert_eq!(format_summary_date(Some("2025-03-04T05:06:07Z")), "2025-03-04");
    }

    #[test]
    fn mode_resolution_defaults_to_free() {
        assert_eq!(Mode::resolve("compare"), Mode::Compare);
        assert_eq!(Mode::resolve("free"), Mode::Free);
        assert_eq!(Mode::resolve("other"), Mode::Free);
    }
}
