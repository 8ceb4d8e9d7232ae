//! Assembling the node graph of documents from a stream of events.

use std::collections::HashMap;

use crate::{
    error::{Result, YamlError},
    event::{Event, EventSource, MarkedEvent},
    node::{Document, Node, NodeId, NodeKind},
    registry::{AnchorPolicy, Registry},
    resolver::{PathStep, Resolver},
    tag,
};

/// Where a node sits in its parent, by id.
#[derive(Clone, Copy)]
enum Position {
    Root,
    Key(NodeId),
    Value(NodeId, NodeId),
    Item(NodeId, usize),
}

/// Builds a [`Document`] for each document of an event stream.
///
/// Untagged nodes get their tag from the resolver of the [`Registry`]. Aliases are resolved to
/// the node of their anchor: the composed graph shares that node, and may contain cycles.
#[derive(Debug)]
pub struct Composer<'r, S> {
    events: S,
    resolver: Resolver<'r>,
    anchor_policy: AnchorPolicy,
    /// Anchors of the document being composed.
    anchors: HashMap<String, NodeId>,
}

impl<'r, S: EventSource> Composer<'r, S> {
    /// Create a composer reading `events`.
    pub fn new(events: S, registry: &'r Registry) -> Self {
        Self {
            events,
            resolver: Resolver::new(&registry.resolvers),
            anchor_policy: registry.anchor_policy,
            anchors: HashMap::new(),
        }
    }

    /// Return whether there is another document in the stream.
    ///
    /// # Errors
    /// Returns an error if the event source fails.
    pub fn check_node(&mut self) -> Result<bool> {
        self.skip_stream_start()?;
        Ok(!self.at_stream_end()?)
    }

    /// Compose the next document of the stream, if any.
    ///
    /// # Errors
    /// Returns an error if the event source fails or if the document is malformed.
    pub fn get_node(&mut self) -> Result<Option<Document>> {
        if self.check_node()? {
            self.compose_document().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Compose the only document of the stream.
    ///
    /// # Return
    /// Returns [`None`] if the stream has no document.
    ///
    /// # Errors
    /// Returns an error if the stream has more than one document, or if [`Self::get_node`] would.
    pub fn get_single_node(&mut self) -> Result<Option<Document>> {
        self.skip_stream_start()?;
        let document = if self.at_stream_end()? {
            None
        } else {
            Some(self.compose_document()?)
        };
        if !self.at_stream_end()? {
            let event = self.next_required("another document")?;
            let context_mark = document.as_ref().and_then(|document| {
                document
                    .root()
                    .map(|root| document[root].start_mark.clone())
            });
            return Err(YamlError::composer(
                "but found another document",
                Some(event.start_mark),
            )
            .with_context("expected a single document in the stream", context_mark));
        }
        // The stream end.
        self.events.next_event()?;
        Ok(document)
    }

    /// Compose the document starting at the next event.
    ///
    /// # Errors
    /// Returns an error if the event source fails, if the events are not those of a document, if
    /// an alias is undefined, or if an anchor is redefined while the policy forbids it.
    pub fn compose_document(&mut self) -> Result<Document> {
        let start = self.next_required("a document start")?;
        if start.event != Event::DocumentStart {
            return Err(unexpected("a document start", &start));
        }
        debug_print!("composer: document starts at {}", start.start_mark);
        self.anchors.clear();
        let mut document = Document::new();
        let root = self.compose_node(&mut document, Position::Root)?;
        document.set_root(root);
        let end = self.next_required("a document end")?;
        if end.event != Event::DocumentEnd {
            return Err(unexpected("a document end", &end));
        }
        self.anchors.clear();
        Ok(document)
    }

    fn compose_node(&mut self, document: &mut Document, position: Position) -> Result<NodeId> {
        let alias = match &self.peek_required("a node")?.event {
            Event::Alias { anchor } => Some(anchor.clone()),
            _ => None,
        };
        if let Some(anchor) = alias {
            let event = self.next_required("a node")?;
            return match self.anchors.get(&anchor) {
                Some(&id) => {
                    debug_print!("composer: alias '{anchor}' resolved to node {}", id.index());
                    Ok(id)
                }
                None => Err(YamlError::composer(
                    format!("found undefined alias '{anchor}'"),
                    Some(event.start_mark),
                )),
            };
        }

        let step = match position {
            Position::Root => PathStep::Root,
            Position::Key(parent) => PathStep::Key(&document[parent]),
            Position::Value(parent, key) => PathStep::Value(&document[parent], &document[key]),
            Position::Item(parent, index) => PathStep::Item(&document[parent], index),
        };
        self.resolver.descend_resolver(step);
        let event = self.next_required("a node")?;
        let id = match event.event {
            Event::Scalar { .. } => self.compose_scalar_node(document, event),
            Event::SequenceStart { .. } => self.compose_sequence_node(document, event),
            Event::MappingStart { .. } => self.compose_mapping_node(document, event),
            _ => Err(unexpected("a node", &event)),
        }?;
        self.resolver.ascend_resolver();
        Ok(id)
    }

    fn compose_scalar_node(
        &mut self,
        document: &mut Document,
        event: MarkedEvent,
    ) -> Result<NodeId> {
        let (anchor, tag, value, style, implicit, start_mark, end_mark) = match event {
            MarkedEvent {
                event:
                    Event::Scalar {
                        anchor,
                        tag,
                        value,
                        style,
                        implicit,
                    },
                start_mark,
                end_mark,
            } => (anchor, tag, value, style, implicit, start_mark, end_mark),
            other => return Err(unexpected("a scalar", &other)),
        };
        let tag = match tag {
            Some(tag) if is_specific(&tag) => tag,
            _ => self
                .resolver
                .resolve(NodeKind::Scalar, Some(&value), implicit)
                .to_string(),
        };
        let id = document.push(Node::scalar(tag, value, style, start_mark, end_mark));
        self.register_anchor(document, anchor, id)?;
        Ok(id)
    }

    fn compose_sequence_node(
        &mut self,
        document: &mut Document,
        event: MarkedEvent,
    ) -> Result<NodeId> {
        let (anchor, tag, implicit, flow_style, start_mark) = match event {
            MarkedEvent {
                event:
                    Event::SequenceStart {
                        anchor,
                        tag,
                        implicit,
                        flow_style,
                    },
                start_mark,
                ..
            } => (anchor, tag, implicit, flow_style, start_mark),
            other => return Err(unexpected("a sequence start", &other)),
        };
        let tag = self.collection_tag(tag, NodeKind::Sequence, implicit);
        let id = document.push(Node::sequence(tag, flow_style, start_mark));
        // Registered before the items, which may refer to it.
        self.register_anchor(document, anchor, id)?;
        let mut index = 0;
        while !self.check_end(&Event::SequenceEnd)? {
            let item = self.compose_node(document, Position::Item(id, index))?;
            document.push_item(id, item);
            index += 1;
        }
        self.close(document, id)?;
        Ok(id)
    }

    fn compose_mapping_node(
        &mut self,
        document: &mut Document,
        event: MarkedEvent,
    ) -> Result<NodeId> {
        let (anchor, tag, implicit, flow_style, start_mark) = match event {
            MarkedEvent {
                event:
                    Event::MappingStart {
                        anchor,
                        tag,
                        implicit,
                        flow_style,
                    },
                start_mark,
                ..
            } => (anchor, tag, implicit, flow_style, start_mark),
            other => return Err(unexpected("a mapping start", &other)),
        };
        let tag = self.collection_tag(tag, NodeKind::Mapping, implicit);
        let id = document.push(Node::mapping(tag, flow_style, start_mark));
        // Registered before the entries, which may refer to it.
        self.register_anchor(document, anchor, id)?;
        while !self.check_end(&Event::MappingEnd)? {
            let key = self.compose_node(document, Position::Key(id))?;
            let value = self.compose_node(document, Position::Value(id, key))?;
            document.push_pair(id, key, value);
        }
        self.close(document, id)?;
        Ok(id)
    }

    fn collection_tag(&self, tag: Option<String>, kind: NodeKind, implicit: bool) -> String {
        match tag {
            Some(tag) if is_specific(&tag) => tag,
            _ => self
                .resolver
                .resolve(kind, None, (implicit, false))
                .to_string(),
        }
    }

    fn register_anchor(
        &mut self,
        document: &Document,
        anchor: Option<String>,
        id: NodeId,
    ) -> Result<()> {
        let Some(anchor) = anchor else {
            return Ok(());
        };
        if let Some(&previous) = self.anchors.get(&anchor) {
            match self.anchor_policy {
                AnchorPolicy::Overwrite => {
                    debug_print!("composer: anchor '{anchor}' redefined");
                }
                AnchorPolicy::Reject => {
                    return Err(YamlError::composer(
                        "second occurrence",
                        Some(document[id].start_mark.clone()),
                    )
                    .with_context(
                        format!("found duplicate anchor '{anchor}'; first occurrence"),
                        Some(document[previous].start_mark.clone()),
                    ));
                }
            }
        }
        self.anchors.insert(anchor, id);
        Ok(())
    }

    /// Consume the end event of a collection and record where the collection ends.
    fn close(&mut self, document: &mut Document, id: NodeId) -> Result<()> {
        let end = self.next_required("a collection end")?;
        if let Some(node) = document.get_mut(id) {
            node.end_mark = end.end_mark;
        }
        Ok(())
    }

    fn skip_stream_start(&mut self) -> Result<()> {
        if matches!(
            self.events.peek_event()?,
            Some(MarkedEvent {
                event: Event::StreamStart,
                ..
            })
        ) {
            self.events.next_event()?;
        }
        Ok(())
    }

    fn at_stream_end(&mut self) -> Result<bool> {
        Ok(matches!(
            self.events.peek_event()?,
            None | Some(MarkedEvent {
                event: Event::StreamEnd,
                ..
            })
        ))
    }

    fn check_end(&mut self, end: &Event) -> Result<bool> {
        Ok(self.peek_required("a node")?.event == *end)
    }

    fn peek_required(&mut self, expected: &str) -> Result<&MarkedEvent> {
        match self.events.peek_event()? {
            Some(event) => Ok(event),
            None => Err(end_of_stream(expected)),
        }
    }

    fn next_required(&mut self, expected: &str) -> Result<MarkedEvent> {
        self.events
            .next_event()?
            .ok_or_else(|| end_of_stream(expected))
    }
}

/// Whether an explicit tag is used as is, rather than resolved.
fn is_specific(tag: &str) -> bool {
    !tag.is_empty() && tag != tag::NON_SPECIFIC
}

fn unexpected(expected: &str, found: &MarkedEvent) -> YamlError {
    YamlError::parser(
        format!("expected {expected}, but found {:?}", found.event),
        Some(found.start_mark.clone()),
    )
}

fn end_of_stream(expected: &str) -> YamlError {
    YamlError::parser(
        format!("expected {expected}, but the event stream ended"),
        None,
    )
}
