//! Positions in the source stream.

use std::{fmt, sync::Arc};

use saphyr_parser::Marker;

/// The stream name used when the caller does not provide one.
pub const DEFAULT_STREAM_NAME: &str = "<unicode string>";

/// Characters that end a line when rendering a snippet.
fn is_snippet_break(c: char) -> bool {
    matches!(
        c,
        '\0' | '\r' | '\n' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// An immutable position in a named input stream.
///
/// Lines and columns are 0-based. The index counts characters from the start of the stream, not
/// from the start of the document within the stream.
///
/// A `Mark` may hold a shared reference to the full source text, in which case
/// [`Self::get_snippet`] is able to render the line surrounding the position.
///
/// # Warning
/// Equality comparisons **ignore** the attached source buffer.
#[derive(Clone, Debug)]
pub struct Mark {
    name: Arc<str>,
    index: usize,
    line: usize,
    column: usize,
    source: Option<Arc<str>>,
}

impl Mark {
    /// Create a new mark without any source attached.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>, index: usize, line: usize, column: usize) -> Self {
        Self {
            name: name.into(),
            index,
            line,
            column,
            source: None,
        }
    }

    /// Convert a [`Marker`] emitted by the parser.
    ///
    /// The parser counts lines from 1. They are shifted so that the first line is 0.
    #[must_use]
    pub fn from_marker(name: &Arc<str>, marker: &Marker, source: Option<&Arc<str>>) -> Self {
        Self {
            name: Arc::clone(name),
            index: marker.index(),
            line: marker.line().saturating_sub(1),
            column: marker.col(),
            source: source.map(Arc::clone),
        }
    }

    /// Attach the source text to the mark (builder-style).
    #[must_use]
    pub fn with_source(mut self, source: Arc<str>) -> Self {
        self.source = Some(source);
        self
    }

    /// Return the name of the stream this mark points into.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the character offset from the start of the stream.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Return the 0-based line.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Return the 0-based column.
    #[must_use]
    pub fn column(&self) -> usize {
        self.column
    }

    /// Return whether `self` and `other` designate the same position of the same stream.
    #[must_use]
    pub fn same_position(&self, other: &Mark) -> bool {
        self.name == other.name && self.line == other.line && self.column == other.column
    }

    /// Render the source line surrounding the mark, with a caret under the marked character.
    ///
    /// The line is indented by `indent` spaces. If it is longer than `max_length` characters, it
    /// is trimmed on either side of the mark and the elided parts are replaced with `" ... "`.
    ///
    /// # Return
    /// Returns [`None`] if no source is attached to the mark.
    #[must_use]
    pub fn get_snippet(&self, indent: usize, max_length: usize) -> Option<String> {
        let source = self.source.as_deref()?;
        let chars: Vec<char> = source.chars().collect();
        let pointer = self.index.min(chars.len());
        let too_long = |distance: usize| 2 * distance + 2 > max_length;

        let mut head = "";
        let mut start = pointer;
        while start > 0 && !is_snippet_break(chars[start - 1]) {
            start -= 1;
            if too_long(pointer - start) {
                head = " ... ";
                start = (start + 5).min(pointer);
                break;
            }
        }

        let mut tail = "";
        let mut end = pointer;
        while end < chars.len() && !is_snippet_break(chars[end]) {
            end += 1;
            if too_long(end - pointer) {
                tail = " ... ";
                end = end.saturating_sub(5).max(pointer);
                break;
            }
        }

        let snippet: String = chars[start..end].iter().collect();
        Some(format!(
            "{}{head}{snippet}{tail}\n{}^",
            " ".repeat(indent),
            " ".repeat(indent + pointer - start + head.len())
        ))
    }
}

impl PartialEq for Mark {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.index == other.index
            && self.line == other.line
            && self.column == other.column
    }
}

impl Eq for Mark {}

impl Default for Mark {
    fn default() -> Self {
        Self::new(DEFAULT_STREAM_NAME, 0, 0, 0)
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "in \"{}\", line {}, column {}",
            self.name,
            self.line + 1,
            self.column + 1
        )?;
        if let Some(snippet) = self.get_snippet(4, 75) {
            write!(f, ":\n{snippet}")?;
        }
        Ok(())
    }
}
