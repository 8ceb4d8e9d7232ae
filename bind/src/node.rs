//! The node graph built by the [`Composer`] and consumed by the [`Constructor`].
//!
//! Nodes of a document live in an arena ([`Document`]) and refer to their children through
//! [`NodeId`]s. An alias does not create a node: it reuses the id of the anchored node, so a node
//! may have several parents, and may even be its own descendant. Node identity is the id, not the
//! contents.
//!
//! [`Composer`]: crate::Composer
//! [`Constructor`]: crate::Constructor

use std::fmt;

pub use saphyr_parser::ScalarStyle;

use crate::mark::Mark;

/// The identity of a node within its [`Document`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Return the position of the node in the arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// The shape of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A leaf.
    Scalar,
    /// An ordered list of nodes.
    Sequence,
    /// An ordered list of key/value node pairs.
    Mapping,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeKind::Scalar => "scalar",
            NodeKind::Sequence => "sequence",
            NodeKind::Mapping => "mapping",
        })
    }
}

/// The payload of a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeValue {
    /// The textual value of a scalar, with the style it was written in.
    Scalar {
        /// The scalar's content, after unescaping / folding.
        value: String,
        /// How the scalar was written.
        style: ScalarStyle,
    },
    /// The items of a sequence.
    Sequence {
        /// The items, in document order.
        items: Vec<NodeId>,
        /// Whether the sequence was written in flow style (`[a, b]`).
        flow_style: bool,
    },
    /// The entries of a mapping.
    Mapping {
        /// The key/value pairs, in document order. Keys may repeat.
        pairs: Vec<(NodeId, NodeId)>,
        /// Whether the mapping was written in flow style (`{a: b}`).
        flow_style: bool,
    },
}

/// A tagged, position-marked node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    /// The resolved tag. Never empty once composed.
    pub tag: String,
    /// The contents of the node.
    pub value: NodeValue,
    /// Where the node starts.
    pub start_mark: Mark,
    /// Where the node ends.
    pub end_mark: Mark,
}

impl Node {
    /// Create a scalar node.
    #[must_use]
    pub fn scalar(
        tag: impl Into<String>,
        value: impl Into<String>,
        style: ScalarStyle,
        start_mark: Mark,
        end_mark: Mark,
    ) -> Self {
        Self {
            tag: tag.into(),
            value: NodeValue::Scalar {
                value: value.into(),
                style,
            },
            start_mark,
            end_mark,
        }
    }

    /// Create an empty sequence node.
    #[must_use]
    pub fn sequence(tag: impl Into<String>, flow_style: bool, start_mark: Mark) -> Self {
        Self {
            tag: tag.into(),
            value: NodeValue::Sequence {
                items: vec![],
                flow_style,
            },
            end_mark: start_mark.clone(),
            start_mark,
        }
    }

    /// Create an empty mapping node.
    #[must_use]
    pub fn mapping(tag: impl Into<String>, flow_style: bool, start_mark: Mark) -> Self {
        Self {
            tag: tag.into(),
            value: NodeValue::Mapping {
                pairs: vec![],
                flow_style,
            },
            end_mark: start_mark.clone(),
            start_mark,
        }
    }

    /// Return the shape of the node.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self.value {
            NodeValue::Scalar { .. } => NodeKind::Scalar,
            NodeValue::Sequence { .. } => NodeKind::Sequence,
            NodeValue::Mapping { .. } => NodeKind::Mapping,
        }
    }

    /// Return the content of a scalar node.
    #[must_use]
    pub fn scalar_value(&self) -> Option<&str> {
        match &self.value {
            NodeValue::Scalar { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Return the style of a scalar node.
    #[must_use]
    pub fn scalar_style(&self) -> Option<ScalarStyle> {
        match self.value {
            NodeValue::Scalar { style, .. } => Some(style),
            _ => None,
        }
    }

    /// Return the items of a sequence node, or an empty slice for other nodes.
    #[must_use]
    pub fn items(&self) -> &[NodeId] {
        match &self.value {
            NodeValue::Sequence { items, .. } => items,
            _ => &[],
        }
    }

    /// Return the entries of a mapping node, or an empty slice for other nodes.
    #[must_use]
    pub fn pairs(&self) -> &[(NodeId, NodeId)] {
        match &self.value {
            NodeValue::Mapping { pairs, .. } => pairs,
            _ => &[],
        }
    }

    /// Return whether a collection node was written in flow style.
    #[must_use]
    pub fn flow_style(&self) -> bool {
        match self.value {
            NodeValue::Scalar { .. } => false,
            NodeValue::Sequence { flow_style, .. } | NodeValue::Mapping { flow_style, .. } => {
                flow_style
            }
        }
    }
}

/// The nodes of a single document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Document {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl Document {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to the arena and return its id.
    ///
    /// The first node added becomes the root, unless [`Self::set_root`] says otherwise.
    pub fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.root.get_or_insert(id);
        id
    }

    /// Set which node is the root of the document.
    ///
    /// # Panics
    /// Panics if `id` does not belong to this document.
    pub fn set_root(&mut self, id: NodeId) {
        assert!(id.0 < self.nodes.len(), "node id out of the document");
        self.root = Some(id);
    }

    /// Return the root node's id, or [`None`] if the document is empty.
    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Return the node with the given id.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Return the node with the given id, mutably.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Return the number of distinct nodes in the document.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Return whether the document has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append an item to the sequence node `parent`.
    ///
    /// Does nothing if `parent` is not a sequence.
    pub fn push_item(&mut self, parent: NodeId, item: NodeId) {
        if let Some(NodeValue::Sequence { items, .. }) = self.get_mut(parent).map(|n| &mut n.value)
        {
            items.push(item);
        }
    }

    /// Append an entry to the mapping node `parent`.
    ///
    /// Does nothing if `parent` is not a mapping.
    pub fn push_pair(&mut self, parent: NodeId, key: NodeId, value: NodeId) {
        if let Some(NodeValue::Mapping { pairs, .. }) = self.get_mut(parent).map(|n| &mut n.value) {
            pairs.push((key, value));
        }
    }
}

impl std::ops::Index<NodeId> for Document {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }
}
