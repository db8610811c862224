use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthStr;

pub const ELLIPSIS: char = '\u{2026}';

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_family: Option<String>,
    pub font_size: f64,
    pub font_weight: Option<String>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: None,
            font_size: 14.4,
            font_weight: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
    pub line_count: usize,
}

pub trait TextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics;
}

/// Font-free measurer: terminal display width (CJK and emoji count double) times a per-column
/// factor of the font size.
#[derive(Debug, Clone, Default)]
pub struct DeterministicTextMeasurer {
    pub char_width_factor: f64,
    pub line_height_factor: f64,
}

impl TextMeasurer for DeterministicTextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics {
        let char_width_factor = if self.char_width_factor == 0.0 {
            0.6
        } else {
            self.char_width_factor
        };
        let line_height_factor = if self.line_height_factor == 0.0 {
            1.35
        } else {
            self.line_height_factor
        };

        let font_size = style.font_size.max(1.0);
        let mut max_cols = 0usize;
        let mut line_count = 0usize;
        for line in text.split('\n') {
            max_cols = max_cols.max(line.width());
            line_count += 1;
        }

        TextMetrics {
            width: max_cols as f64 * font_size * char_width_factor,
            height: line_count as f64 * font_size * line_height_factor,
            line_count,
        }
    }
}

fn fits(measurer: &dyn TextMeasurer, style: &TextStyle, text: &str, max_width: f64) -> bool {
    measurer.measure(text, style).width <= max_width
}

/// Splits a token that is wider than `max_width` on its own into width-sized pieces.
fn break_word(
    word: &str,
    measurer: &dyn TextMeasurer,
    style: &TextStyle,
    max_width: f64,
) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    for ch in word.chars() {
        cur.push(ch);
        if !fits(measurer, style, &cur, max_width) && cur.chars().count() > 1 {
            cur.pop();
            out.push(std::mem::take(&mut cur));
            cur.push(ch);
        }
    }
    if !cur.is_empty() {
        out.push(cur);
    }
    out
}

fn wrap_paragraph(
    line: &str,
    measurer: &dyn TextMeasurer,
    style: &TextStyle,
    max_width: f64,
    out: &mut Vec<String>,
) {
    let mut cur = String::new();
    for word in line.split_whitespace() {
        let candidate = if cur.is_empty() {
            word.to_string()
        } else {
            format!("{cur} {word}")
        };
        if fits(measurer, style, &candidate, max_width) {
            cur = candidate;
            continue;
        }
        if !cur.is_empty() {
            out.push(std::mem::take(&mut cur));
        }
        if fits(measurer, style, word, max_width) {
            cur = word.to_string();
            continue;
        }
        let mut pieces = break_word(word, measurer, style, max_width);
        cur = pieces.pop().unwrap_or_default();
        out.extend(pieces);
    }
    out.push(cur);
}

/// Greedy word wrap of a node label into at most `max_lines` lines of `max_width`.
///
/// Explicit newlines are kept; words wider than a line are broken anywhere. When the text does
/// not fit, the last visible line ends with an ellipsis. Always returns at least one line.
pub fn wrap_label(
    text: &str,
    measurer: &dyn TextMeasurer,
    style: &TextStyle,
    max_width: f64,
    max_lines: usize,
) -> Vec<String> {
    let max_lines = max_lines.max(1);
    let mut lines = Vec::new();
    if max_width.is_finite() && max_width > 0.0 {
        for paragraph in text.split('\n') {
            wrap_paragraph(paragraph, measurer, style, max_width, &mut lines);
        }
    } else {
        lines.extend(text.split('\n').map(str::to_string));
    }

    if lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            loop {
                let candidate = format!("{last}{ELLIPSIS}");
                if last.is_empty() || fits(measurer, style, &candidate, max_width) {
                    *last = candidate;
                    break;
                }
                last.pop();
            }
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
