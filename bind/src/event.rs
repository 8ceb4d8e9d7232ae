//! The primitive event protocol consumed by the [`Composer`].
//!
//! Events are produced by an external parser. [`ParserEvents`] adapts [`saphyr_parser::Parser`];
//! [`EventQueue`] replays events that were materialized beforehand.
//!
//! [`Composer`]: crate::Composer

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use saphyr_parser::{Event as ParserEvent, Parser, ScanError, Span, StrInput, Tag};

use crate::{
    error::{Result, YamlError},
    mark::{Mark, DEFAULT_STREAM_NAME},
    node::ScalarStyle,
};

/// A primitive parsing event.
///
/// Tags are full tag strings (`tag:yaml.org,2002:int`, `!local`), or `"!"` for the non-specific
/// tag. Events must be delivered in well-nested order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Start of the stream.
    StreamStart,
    /// End of the stream.
    StreamEnd,
    /// Start of a document.
    DocumentStart,
    /// End of a document.
    DocumentEnd,
    /// A reference to an anchored node.
    Alias {
        /// The anchor the alias refers to.
        anchor: String,
    },
    /// A leaf value.
    Scalar {
        /// The anchor defined on the scalar, if any.
        anchor: Option<String>,
        /// The explicit tag, if any.
        tag: Option<String>,
        /// The scalar's content.
        value: String,
        /// How the scalar was written.
        style: ScalarStyle,
        /// Whether the tag may be inferred when the scalar is plain, and when it is not.
        implicit: (bool, bool),
    },
    /// Start of a sequence.
    SequenceStart {
        /// The anchor defined on the sequence, if any.
        anchor: Option<String>,
        /// The explicit tag, if any.
        tag: Option<String>,
        /// Whether the tag may be inferred.
        implicit: bool,
        /// Whether the sequence is written in flow style.
        flow_style: bool,
    },
    /// End of a sequence.
    SequenceEnd,
    /// Start of a mapping.
    MappingStart {
        /// The anchor defined on the mapping, if any.
        anchor: Option<String>,
        /// The explicit tag, if any.
        tag: Option<String>,
        /// Whether the tag may be inferred.
        implicit: bool,
        /// Whether the mapping is written in flow style.
        flow_style: bool,
    },
    /// End of a mapping.
    MappingEnd,
}

impl Event {
    /// Create an untagged, unanchored plain scalar event.
    #[must_use]
    pub fn plain(value: impl Into<String>) -> Self {
        Self::Scalar {
            anchor: None,
            tag: None,
            value: value.into(),
            style: ScalarStyle::Plain,
            implicit: (true, false),
        }
    }

    /// Return the anchor defined by the event, if any.
    #[must_use]
    pub fn anchor(&self) -> Option<&str> {
        match self {
            Self::Scalar { anchor, .. }
            | Self::SequenceStart { anchor, .. }
            | Self::MappingStart { anchor, .. } => anchor.as_deref(),
            _ => None,
        }
    }
}

/// An [`Event`] with the position of the input it was produced from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkedEvent {
    /// The event.
    pub event: Event,
    /// Where the event starts.
    pub start_mark: Mark,
    /// Where the event ends.
    pub end_mark: Mark,
}

impl MarkedEvent {
    /// Attach the same mark as start and end to an event.
    #[must_use]
    pub fn at(event: Event, mark: Mark) -> Self {
        Self {
            event,
            end_mark: mark.clone(),
            start_mark: mark,
        }
    }
}

/// A source of [`MarkedEvent`]s for the composer.
pub trait EventSource {
    /// Look at the next event without consuming it.
    ///
    /// # Return
    /// Returns `Ok(None)` once the source is exhausted.
    ///
    /// # Errors
    /// Returns an error if the external parser fails.
    fn peek_event(&mut self) -> Result<Option<&MarkedEvent>>;

    /// Consume the next event.
    ///
    /// # Return
    /// Returns `Ok(None)` once the source is exhausted.
    ///
    /// # Errors
    /// Returns an error if the external parser fails.
    fn next_event(&mut self) -> Result<Option<MarkedEvent>>;
}

/// An [`EventSource`] replaying events from memory.
#[derive(Clone, Debug, Default)]
pub struct EventQueue {
    events: VecDeque<MarkedEvent>,
}

impl EventQueue {
    /// Create a queue from marked events.
    pub fn new(events: impl IntoIterator<Item = MarkedEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }

    /// Create a queue from bare events.
    ///
    /// Each event is given a mark whose index is the position of the event in the queue.
    pub fn from_events(events: impl IntoIterator<Item = Event>) -> Self {
        Self::new(
            events
                .into_iter()
                .enumerate()
                .map(|(i, event)| MarkedEvent::at(event, Mark::new(DEFAULT_STREAM_NAME, i, 0, i))),
        )
    }
}

impl EventSource for EventQueue {
    fn peek_event(&mut self) -> Result<Option<&MarkedEvent>> {
        Ok(self.events.front())
    }

    fn next_event(&mut self) -> Result<Option<MarkedEvent>> {
        Ok(self.events.pop_front())
    }
}

/// An [`EventSource`] pulling events from a [`saphyr_parser::Parser`].
///
/// The parser identifies anchors by number, a new one for each definition. Anchors are named as
/// written in the source, so that a redefinition is seen as such. Marks produced by this source
/// hold the source text, so that errors can show a snippet of the input.
pub struct ParserEvents<'input> {
    parser: Parser<'input, StrInput<'input>>,
    name: Arc<str>,
    source: Arc<str>,
    /// Last `(char index, byte offset)` looked up in `source`.
    cursor: (usize, usize),
    /// Names of the anchors defined so far, by parser id.
    anchors: HashMap<usize, String>,
    peeked: Option<MarkedEvent>,
}

impl<'input> ParserEvents<'input> {
    /// Create a source parsing `input`. Marks will refer to the stream as `name`.
    #[must_use]
    pub fn new(input: &'input str, name: &str) -> Self {
        Self {
            parser: Parser::new_from_str(input),
            name: Arc::from(name),
            source: Arc::from(input),
            cursor: (0, 0),
            anchors: HashMap::new(),
            peeked: None,
        }
    }

    fn mark(&self, marker: &saphyr_parser::Marker) -> Mark {
        Mark::from_marker(&self.name, marker, Some(&self.source))
    }

    /// Return the character at the given character index of the source.
    fn char_at(&mut self, index: usize) -> Option<char> {
        if index < self.cursor.0 {
            self.cursor = (0, 0);
        }
        let (mut char_index, mut byte_offset) = self.cursor;
        while char_index < index {
            let c = self.source.get(byte_offset..)?.chars().next()?;
            byte_offset += c.len_utf8();
            char_index += 1;
        }
        self.cursor = (char_index, byte_offset);
        self.source.get(byte_offset..)?.chars().next()
    }

    /// Convert a parser error. An alias to an unknown anchor is reported as the composer would.
    fn scan_error(&mut self, error: &ScanError) -> YamlError {
        let mark = self.mark(error.marker());
        if let Some(anchor) = self.alias_at(error.marker().index()) {
            return YamlError::composer(format!("found undefined alias '{anchor}'"), Some(mark));
        }
        YamlError::scanner(error.info(), Some(mark))
    }

    /// Return the name of the alias written at the given character index, if any.
    fn alias_at(&mut self, index: usize) -> Option<String> {
        if self.char_at(index)? != '*' {
            return None;
        }
        let start = self.cursor.1 + 1;
        let name: String = self
            .source
            .get(start..)?
            .chars()
            .take_while(|c| !c.is_whitespace() && !matches!(c, ',' | '[' | ']' | '{' | '}'))
            .collect();
        (!name.is_empty()).then_some(name)
    }

    /// Name the anchor `id` defined on the node starting at the given character index.
    ///
    /// The parser reports the node after its properties. The name is read from the properties
    /// preceding it, falling back to the id when the source does not show it.
    fn define_anchor(&mut self, id: usize, index: usize) -> Option<String> {
        if id == 0 {
            return None;
        }
        let name = self
            .anchor_before(index)
            .unwrap_or_else(|| id.to_string());
        self.anchors.insert(id, name.clone());
        Some(name)
    }

    /// Return the name of the anchor an alias refers to.
    fn alias_name(&self, id: usize) -> String {
        self.anchors
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    /// Find `&name` among the (at most two) node properties written right before `index`.
    fn anchor_before(&mut self, index: usize) -> Option<String> {
        self.char_at(index);
        if self.cursor.0 != index {
            return None;
        }
        let mut head = self.source.get(..self.cursor.1)?;
        for _ in 0..2 {
            let trimmed = head.trim_end();
            let property = trimmed.rsplit(is_property_break).next()?;
            if let Some(name) = property.strip_prefix('&') {
                return (!name.is_empty()).then(|| name.to_string());
            }
            if !property.starts_with('!') {
                return None;
            }
            head = &trimmed[..trimmed.len() - property.len()];
        }
        None
    }

    /// Translate a parser event. Returns [`None`] for events that have no counterpart.
    fn convert(&mut self, event: ParserEvent<'input>, span: Span) -> Option<MarkedEvent> {
        let event = match event {
            ParserEvent::Nothing => return None,
            ParserEvent::StreamStart => Event::StreamStart,
            ParserEvent::StreamEnd => Event::StreamEnd,
            ParserEvent::DocumentStart(..) => Event::DocumentStart,
            ParserEvent::DocumentEnd => Event::DocumentEnd,
            ParserEvent::Alias(id) => Event::Alias {
                anchor: self.alias_name(id),
            },
            ParserEvent::Scalar(value, style, id, tag) => {
                let tag = tag.map(|tag| full_tag(&tag));
                let implicit = if tag.is_some() {
                    (false, false)
                } else {
                    (style == ScalarStyle::Plain, style != ScalarStyle::Plain)
                };
                Event::Scalar {
                    anchor: self.define_anchor(id, span.start.index()),
                    tag,
                    value: String::from(value),
                    style,
                    implicit,
                }
            }
            ParserEvent::SequenceStart(id, tag) => {
                let tag = tag.map(|tag| full_tag(&tag));
                Event::SequenceStart {
                    anchor: self.define_anchor(id, span.start.index()),
                    implicit: tag.is_none(),
                    tag,
                    flow_style: self.char_at(span.start.index()) == Some('['),
                }
            }
            ParserEvent::SequenceEnd => Event::SequenceEnd,
            ParserEvent::MappingStart(id, tag) => {
                let tag = tag.map(|tag| full_tag(&tag));
                Event::MappingStart {
                    anchor: self.define_anchor(id, span.start.index()),
                    implicit: tag.is_none(),
                    tag,
                    flow_style: self.char_at(span.start.index()) == Some('{'),
                }
            }
            ParserEvent::MappingEnd => Event::MappingEnd,
        };
        Some(MarkedEvent {
            event,
            start_mark: self.mark(&span.start),
            end_mark: self.mark(&span.end),
        })
    }

    fn fill(&mut self) -> Result<()> {
        while self.peeked.is_none() {
            match self.parser.next() {
                None => return Ok(()),
                Some(Err(error)) => return Err(self.scan_error(&error)),
                Some(Ok((event, span))) => self.peeked = self.convert(event, span),
            }
        }
        Ok(())
    }
}

impl EventSource for ParserEvents<'_> {
    fn peek_event(&mut self) -> Result<Option<&MarkedEvent>> {
        self.fill()?;
        Ok(self.peeked.as_ref())
    }

    fn next_event(&mut self) -> Result<Option<MarkedEvent>> {
        self.fill()?;
        Ok(self.peeked.take())
    }
}

/// Characters separating node properties from what precedes them.
fn is_property_break(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | '[' | ']' | '{' | '}')
}

/// Concatenate the (already resolved) handle and the suffix of a tag.
fn full_tag(tag: &Tag) -> String {
    format!("{}{}", tag.handle, tag.suffix)
}
