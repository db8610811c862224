/// In-place text editor over one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineEditor {
    node_id: String,
    original: String,
    text: String,
}

impl InlineEditor {
    pub(crate) fn open(node_id: &str, original: &str) -> Self {
        Self {
            node_id: node_id.to_string(),
            original: original.to_string(),
            text: original.to_string(),
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Trimmed text, or the original content when the trimmed text is empty.
    pub fn committed_content(&self) -> &str {
        match self.text.trim() {
            "" => &self.original,
            trimmed => trimmed,
        }
    }
}
