//! Side-by-side visual diff
//!
//! Texts are aligned line by line; lines inside a replaced region are then
//! paired positionally and aligned character by character. Both sides are
//! padded with filler lines to the same length so they can be rendered next
//! to each other.

use apicmp_core::{Body, Value};
use serde::Serialize;

use crate::matcher::{OpTag, SequenceMatcher};

/// Change annotation for a line or a character span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeTag {
    Unchanged,
    Added,
    Removed,
    Modified,
}

impl std::fmt::Display for ChangeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeTag::Unchanged => write!(f, "unchanged"),
            ChangeTag::Added => write!(f, "added"),
            ChangeTag::Removed => write!(f, "removed"),
            ChangeTag::Modified => write!(f, "modified"),
        }
    }
}

/// A run of characters within a modified line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Span {
    pub tag: ChangeTag,
    pub text: String,
}

impl Span {
    fn new(tag: ChangeTag, text: impl Into<String>) -> Self {
        Self {
            tag,
            text: text.into(),
        }
    }
}

/// One rendered line of one side
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiffLine {
    Unchanged { text: String },
    Added { text: String },
    Removed { text: String },
    /// Paired with a line on the other side; carries character spans
    Modified { spans: Vec<Span> },
    /// Blank padding keeping both sides the same length
    Filler,
}

impl DiffLine {
    /// The line's change tag; `None` for filler
    pub fn tag(&self) -> Option<ChangeTag> {
        match self {
            DiffLine::Unchanged { .. } => Some(ChangeTag::Unchanged),
            DiffLine::Added { .. } => Some(ChangeTag::Added),
            DiffLine::Removed { .. } => Some(ChangeTag::Removed),
            DiffLine::Modified { .. } => Some(ChangeTag::Modified),
            DiffLine::Filler => None,
        }
    }

    /// The plain text of the line
    pub fn text(&self) -> String {
        match self {
            DiffLine::Unchanged { text } | DiffLine::Added { text } | DiffLine::Removed { text } => {
                text.clone()
            }
            DiffLine::Modified { spans } => spans.iter().map(|s| s.text.as_str()).collect(),
            DiffLine::Filler => String::new(),
        }
    }
}

/// Two aligned, equal-length columns of annotated lines
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VisualDiffDocument {
    pub left: Vec<DiffLine>,
    pub right: Vec<DiffLine>,
}

impl VisualDiffDocument {
    /// Number of rows (both sides have this many lines)
    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Check if any line on either side differs
    pub fn has_changes(&self) -> bool {
        self.left
            .iter()
            .chain(self.right.iter())
            .any(|line| !matches!(line, DiffLine::Unchanged { .. } | DiffLine::Filler))
    }

    /// Iterate rows as (left, right) pairs
    pub fn rows(&self) -> impl Iterator<Item = (&DiffLine, &DiffLine)> {
        self.left.iter().zip(self.right.iter())
    }
}

/// Render the visual diff of two texts
pub fn render(text1: &str, text2: &str) -> VisualDiffDocument {
    let lines1 = split_lines(text1);
    let lines2 = split_lines(text2);

    let mut left = Vec::with_capacity(lines1.len());
    let mut right = Vec::with_capacity(lines2.len());

    for op in SequenceMatcher::new(&lines1, &lines2).opcodes() {
        match op.tag {
            OpTag::Equal => {
                left.extend(op.left.clone().map(|i| unchanged(lines1[i])));
                right.extend(op.right.clone().map(|j| unchanged(lines2[j])));
            }
            OpTag::Delete => {
                left.extend(op.left.clone().map(|i| removed(lines1[i])));
            }
            OpTag::Insert => {
                right.extend(op.right.clone().map(|j| added(lines2[j])));
            }
            OpTag::Replace => {
                // Pair the k-th line of each range while both have one
                let paired = op.left.len().min(op.right.len());
                for k in 0..op.left.len() {
                    let line1 = lines1[op.left.start + k];
                    if k < paired {
                        let (spans1, _) = char_diff(line1, lines2[op.right.start + k]);
                        left.push(DiffLine::Modified { spans: spans1 });
                    } else {
                        left.push(removed(line1));
                    }
                }
                for k in 0..op.right.len() {
                    let line2 = lines2[op.right.start + k];
                    if k < paired {
                        let (_, spans2) = char_diff(lines1[op.left.start + k], line2);
                        right.push(DiffLine::Modified { spans: spans2 });
                    } else {
                        right.push(added(line2));
                    }
                }
            }
        }
    }

    let rows = left.len().max(right.len());
    left.resize(rows, DiffLine::Filler);
    right.resize(rows, DiffLine::Filler);

    VisualDiffDocument { left, right }
}

/// Character-level alignment of two lines into left and right spans
pub fn char_diff(line1: &str, line2: &str) -> (Vec<Span>, Vec<Span>) {
    let a: Vec<char> = line1.chars().collect();
    let b: Vec<char> = line2.chars().collect();
    let text = |chars: &[char]| chars.iter().collect::<String>();

    let mut left = Vec::new();
    let mut right = Vec::new();
    for op in SequenceMatcher::new(&a, &b).opcodes() {
        match op.tag {
            OpTag::Equal => {
                let shared = text(&a[op.left.clone()]);
                left.push(Span::new(ChangeTag::Unchanged, shared.clone()));
                right.push(Span::new(ChangeTag::Unchanged, shared));
            }
            OpTag::Delete => left.push(Span::new(ChangeTag::Removed, text(&a[op.left]))),
            OpTag::Insert => right.push(Span::new(ChangeTag::Added, text(&b[op.right]))),
            OpTag::Replace => {
                left.push(Span::new(ChangeTag::Modified, text(&a[op.left])));
                right.push(Span::new(ChangeTag::Modified, text(&b[op.right])));
            }
        }
    }
    (left, right)
}

/// Split text into lines on `\n`, `\r\n` or `\r`, dropping the terminators
///
/// A trailing terminator does not produce an empty last line.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let bytes = text.as_bytes();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&text[start..i]);
                i += 1;
                start = i;
            }
            b'\r' => {
                lines.push(&text[start..i]);
                i += if bytes.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
                start = i;
            }
            _ => i += 1,
        }
    }
    if start < bytes.len() {
        lines.push(&text[start..]);
    }
    lines
}

/// Text used to diff a response body
///
/// JSON objects and arrays are pretty-printed with two-space indentation in
/// their original key order; other JSON values use their text form.
pub fn format_body(body: &Body) -> String {
    match body {
        Body::Json(value @ (Value::Object(_) | Value::Array(_))) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        Body::Json(Value::String(s)) => s.clone(),
        Body::Json(other) => other.to_string(),
        Body::Text(text) => text.clone(),
    }
}

fn unchanged(line: &str) -> DiffLine {
    DiffLine::Unchanged {
        text: line.to_string(),
    }
}

fn added(line: &str) -> DiffLine {
    DiffLine::Added {
        text: line.to_string(),
    }
}

fn removed(line: &str) -> DiffLine {
    DiffLine::Removed {
        text: line.to_string(),
    }
}
