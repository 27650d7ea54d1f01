use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const fn start() -> Self {
        Self {
            offset: 0,
            line: 1,
            column: 1,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    #[serde(default)]
    pub start: Position,
    #[serde(default)]
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Zero-length span at `pos`; used for insertion points.
    pub fn point(pos: Position) -> Self {
        Self::new(pos, pos)
    }

    pub fn to(self, other: Span) -> Span {
        Span::new(self.start, other.end)
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Secondary location attached to a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub span: Span,
    pub message: String,
}

/// Textual edit suggested alongside a diagnostic. An empty span is an insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixIt {
    pub span: Span,
    pub replacement: String,
}

impl FixIt {
    pub fn insert(at: Position, text: impl Into<String>) -> Self {
        Self {
            span: Span::point(at),
            replacement: text.into(),
        }
    }
}

/// A diagnostic kind pinned to a primary span, with optional notes and fix-its.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpannedError<K> {
    kind: K,
    span: Span,
    notes: Vec<Note>,
    fixits: Vec<FixIt>,
}

impl<K> SpannedError<K> {
    pub fn new(kind: K, span: Span) -> Self {
        Self {
            kind,
            span,
            notes: Vec::new(),
            fixits: Vec::new(),
        }
    }

    pub fn kind(&self) -> &K {
        &self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn fixits(&self) -> &[FixIt] {
        &self.fixits
    }

    pub fn with_note(mut self, span: Span, message: impl Into<String>) -> Self {
        self.notes.push(Note {
            span,
            message: message.into(),
        });
        self
    }

    pub fn with_fixit(mut self, fixit: FixIt) -> Self {
        self.fixits.push(fixit);
        self
    }
}

impl<K: Display> Display for SpannedError<K> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

impl<K: fmt::Debug + Display> std::error::Error for SpannedError<K> {}

fn build_marker(len: usize) -> String {
    if len == 1 {
        "^".to_string()
    } else {
        "-".repeat(len.max(1))
    }
}

/// Formats a message with a single-line source snippet and a marker under
/// the span's first line.
///
/// ```text
/// (1:19) stored property 'value' of 'Copyable'-conforming struct 'Box' has non-Copyable type 'T'
/// │ 1 │ struct Box<T: ~Copyable> { var value: T }
/// │   │                               ---------
/// ```
pub fn format_error(source: &str, span: Span, error: impl Display) -> String {
    let line_no = span.start.line.max(1);
    let content = source.lines().nth(line_no - 1).unwrap_or("");
    let number_width = line_no.to_string().len();

    let mut out = format!("({}:{}) {}\n", span.start.line, span.start.column, error);
    out.push_str(&format!(
        "│ {:>number_width$} │ {}\n",
        line_no,
        content,
        number_width = number_width
    ));

    let start_col = span.start.column.max(1);
    let end_col = if span.end.line == span.start.line {
        span.end.column.max(start_col + 1)
    } else {
        content.chars().count() + 1
    };
    let mut marker = " ".repeat(start_col - 1);
    marker.push_str(&build_marker(end_col.saturating_sub(start_col)));
    out.push_str(&format!(
        "│ {:>number_width$} │ {}\n",
        "",
        marker,
        number_width = number_width
    ));
    out
}
