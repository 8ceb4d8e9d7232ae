//! Turning a composed [`Document`] into a [`Value`].
//!
//! Each node is handed to the constructor registered for its tag in the [`Registry`]. The
//! constructor of a container may build it in two phases: it first returns an empty placeholder
//! and a [`Continuation`] that fills it later. The placeholder is recorded for the node right
//! away, so that aliases met while filling the container (including aliases of the container
//! itself) resolve to it instead of recursing forever.

pub mod standard;

use std::collections::{HashMap, HashSet};
use std::fmt;

pub use standard::construct_tagged;

use crate::{
    error::{Result, YamlError},
    node::{Document, Node, NodeId, NodeKind},
    registry::Registry,
    tag,
    value::{Mapping, Pairs, Sequence, Value},
};

/// The second phase of a two-phase construction. Fills the placeholder built for `node`.
pub type Continuation = Box<dyn FnOnce(&mut Constructor<'_>, &Node) -> Result<()>>;

/// A constructor for nodes with a given tag.
pub type ExactFn = Box<dyn Fn(&mut Constructor<'_>, &Node) -> Result<Construct>>;

/// A constructor for nodes whose tag starts with a given prefix. It receives the rest of the tag.
pub type PrefixFn = Box<dyn Fn(&mut Constructor<'_>, &str, &Node) -> Result<Construct>>;

/// What a tag constructor produces.
pub enum Construct {
    /// The complete value.
    Value(Value),
    /// A placeholder and how to fill it.
    ///
    /// The placeholder must share its storage with the final value (e.g. an empty
    /// [`Value::Sequence`] that the continuation pushes into).
    Deferred(Value, Continuation),
}

impl Construct {
    /// Create a two-phase construction.
    pub fn deferred<F>(placeholder: Value, fill: F) -> Self
    where
        F: FnOnce(&mut Constructor<'_>, &Node) -> Result<()> + 'static,
    {
        Self::Deferred(placeholder, Box::new(fill))
    }
}

impl fmt::Debug for Construct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Deferred(placeholder, _) => f.debug_tuple("Deferred").field(placeholder).finish(),
        }
    }
}

/// Which tags a constructor applies to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TagRule {
    /// Exactly this tag.
    Exact(String),
    /// Any tag starting with this prefix.
    Prefix(String),
    /// Any tag, the constructor receiving the tag.
    AnyPrefix,
    /// Any tag.
    Any,
}

pub(crate) enum Handler {
    Exact(ExactFn),
    Prefix(PrefixFn),
}

/// The constructor table of a [`Registry`], in registration order.
#[derive(Default)]
pub(crate) struct TagRules {
    rules: Vec<(TagRule, Handler)>,
}

impl TagRules {
    /// Add a rule, replacing the handler of an identical rule.
    pub(crate) fn insert(&mut self, rule: TagRule, handler: Handler) {
        if let Some(slot) = self.rules.iter_mut().find(|(r, _)| *r == rule) {
            slot.1 = handler;
        } else {
            self.rules.push((rule, handler));
        }
    }

    pub(crate) fn contains(&self, rule: &TagRule) -> bool {
        self.rules.iter().any(|(r, _)| r == rule)
    }

    /// Find the handler for `tag` and the part of the tag it receives.
    ///
    /// An exact rule wins over a prefix rule, which wins over the catch-alls. Among prefixes, the
    /// longest wins.
    fn lookup<'s, 't>(&'s self, tag: &'t str) -> Option<(&'s Handler, &'t str)> {
        let mut best: Option<((u8, usize), &Handler, &str)> = None;
        for (rule, handler) in &self.rules {
            let (precedence, suffix) = match rule {
                TagRule::Exact(exact) if exact == tag => ((0, 0), ""),
                TagRule::Prefix(prefix) if tag.starts_with(prefix.as_str()) => {
                    // Longer prefixes sort first.
                    ((1, usize::MAX - prefix.len()), &tag[prefix.len()..])
                }
                TagRule::AnyPrefix => ((2, 0), tag),
                TagRule::Any => ((3, 0), tag),
                _ => continue,
            };
            if best.map_or(true, |(current, ..)| precedence < current) {
                best = Some((precedence, handler, suffix));
            }
        }
        best.map(|(_, handler, suffix)| (handler, suffix))
    }
}

impl fmt::Debug for TagRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|(rule, _)| rule))
            .finish()
    }
}

/// Builds the values of one document.
///
/// A constructor is consumed by [`Self::construct_document`]; every document gets a fresh one.
/// Tag constructors receive it to build the children of the node they are given.
pub struct Constructor<'a> {
    registry: &'a Registry,
    document: &'a Document,
    /// Values of the nodes constructed so far, placeholders included.
    constructed: HashMap<NodeId, Value>,
    /// Nodes whose constructor has not returned yet.
    in_progress: HashSet<NodeId>,
    /// Second phases waiting for the first pass over the document to end.
    deferred: Vec<(NodeId, Continuation)>,
    /// Whether second phases run as soon as their first phase returns.
    deep_construct: bool,
}

impl<'a> Constructor<'a> {
    /// Create a constructor for `document`.
    #[must_use]
    pub fn new(registry: &'a Registry, document: &'a Document) -> Self {
        Self {
            registry,
            document,
            constructed: HashMap::new(),
            in_progress: HashSet::new(),
            deferred: vec![],
            deep_construct: false,
        }
    }

    /// Return the registry in use.
    #[must_use]
    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    /// Return the document being constructed.
    #[must_use]
    pub fn document(&self) -> &'a Document {
        self.document
    }

    /// Build the value of the whole document.
    ///
    /// An empty document is null.
    ///
    /// # Errors
    /// Returns the first error raised by a tag constructor.
    pub fn construct_document(mut self) -> Result<Value> {
        let Some(root) = self.document.root() else {
            return Ok(Value::Null);
        };
        let data = self.construct_object(root, false)?;
        while !self.deferred.is_empty() {
            let pending = std::mem::take(&mut self.deferred);
            debug_print!("constructor: running {} deferred construction(s)", pending.len());
            let document = self.document;
            for (id, fill) in pending {
                fill(&mut self, &document[id])?;
            }
        }
        Ok(data)
    }

    /// Build the value of the node `id`.
    ///
    /// A node that was already built yields the same value (containers are shared). If `deep` is
    /// true, the value is complete when this returns, second phases included; otherwise the
    /// second phases of containers may run later.
    ///
    /// # Errors
    /// Returns an error if the node is being built and its constructor does not support
    /// recursion, or if its constructor fails.
    pub fn construct_object(&mut self, id: NodeId, deep: bool) -> Result<Value> {
        if let Some(value) = self.constructed.get(&id) {
            return Ok(value.clone());
        }
        let document = self.document;
        let node = &document[id];
        if self.in_progress.contains(&id) {
            return Err(YamlError::constructor(
                "found unconstructable recursive node",
                Some(node.start_mark.clone()),
            ));
        }
        let old_deep = self.deep_construct;
        if deep {
            self.deep_construct = true;
        }
        let result = self.construct_uncached(id, node);
        self.deep_construct = old_deep;
        result
    }

    fn construct_uncached(&mut self, id: NodeId, node: &Node) -> Result<Value> {
        self.in_progress.insert(id);
        let construct = self.dispatch(node);
        self.in_progress.remove(&id);
        match construct? {
            Construct::Value(value) => {
                self.constructed.insert(id, value.clone());
                Ok(value)
            }
            Construct::Deferred(placeholder, fill) => {
                self.constructed.insert(id, placeholder.clone());
                if self.deep_construct {
                    fill(self, node)?;
                } else {
                    self.deferred.push((id, fill));
                }
                Ok(placeholder)
            }
        }
    }

    fn dispatch(&mut self, node: &Node) -> Result<Construct> {
        let registry = self.registry;
        match registry.constructors.lookup(&node.tag) {
            Some((Handler::Exact(f), _)) => f(self, node),
            Some((Handler::Prefix(f), suffix)) => {
                debug_print!("constructor: '{}' handled by prefix rule ('{suffix}')", node.tag);
                f(self, suffix, node)
            }
            None => {
                debug_print!("constructor: no rule for '{}', using node shape", node.tag);
                standard::construct_from_shape(self, node)
            }
        }
    }

    /// Fail unless `node` has the given shape.
    ///
    /// # Errors
    /// Returns "expected a `kind` node, but found `actual`".
    pub fn expect_kind(&self, node: &Node, kind: NodeKind) -> Result<()> {
        if node.kind() == kind {
            Ok(())
        } else {
            Err(YamlError::constructor(
                format!("expected a {kind} node, but found {}", node.kind()),
                Some(node.start_mark.clone()),
            ))
        }
    }

    /// Return the content of a scalar node.
    ///
    /// # Errors
    /// Returns an error if `node` is not a scalar.
    pub fn construct_scalar(&self, node: &Node) -> Result<String> {
        self.expect_kind(node, NodeKind::Scalar)?;
        Ok(node.scalar_value().unwrap_or_default().to_string())
    }

    /// Build the items of a sequence node.
    ///
    /// # Errors
    /// Returns an error if `node` is not a sequence, or if an item fails to build.
    pub fn construct_sequence(&mut self, node: &Node, deep: bool) -> Result<Sequence> {
        self.expect_kind(node, NodeKind::Sequence)?;
        node.items()
            .iter()
            .map(|&item| self.construct_object(item, deep))
            .collect()
    }

    /// Build the entries of a mapping node.
    ///
    /// Keys are fully built before being inserted and must be hashable. A repeated key keeps its
    /// first position and its last value. If merge keys are enabled, the entries of the mappings
    /// designated by `<<` keys are added, unless the mapping itself defines them.
    ///
    /// # Errors
    /// Returns an error if `node` is not a mapping, if a key is not hashable, if a `<<` key
    /// designates something else than mappings, or if an entry fails to build.
    pub fn construct_mapping(&mut self, node: &Node, deep: bool) -> Result<Mapping> {
        self.expect_kind(node, NodeKind::Mapping)?;
        let document = self.document;
        let pairs = if self.registry.merge_keys {
            self.flatten_mapping(node, &mut vec![])?
        } else {
            node.pairs().to_vec()
        };
        let mut mapping = Mapping::new();
        for (key_id, value_id) in pairs {
            let key = self.construct_object(key_id, true)?;
            if !key.is_hashable() {
                return Err(YamlError::constructor(
                    "found unhashable key",
                    Some(document[key_id].start_mark.clone()),
                )
                .with_context("while constructing a mapping", Some(node.start_mark.clone())));
            }
            let value = self.construct_object(value_id, deep)?;
            insert_keeping_position(&mut mapping, key, value);
        }
        Ok(mapping)
    }

    /// Replace `<<` entries with the entries of the mappings they designate.
    ///
    /// Merged entries come first, so that the entries of the mapping itself override them. Among
    /// the mappings of a `<<: [*a, *b]` list, the first one wins.
    fn flatten_mapping(
        &self,
        node: &Node,
        merging: &mut Vec<NodeId>,
    ) -> Result<Vec<(NodeId, NodeId)>> {
        let document = self.document;
        let mut merged = vec![];
        let mut own = vec![];
        for &(key_id, value_id) in node.pairs() {
            if document[key_id].tag != tag::MERGE {
                own.push((key_id, value_id));
                continue;
            }
            let source = &document[value_id];
            let sources = match source.kind() {
                NodeKind::Mapping => vec![value_id],
                NodeKind::Sequence => {
                    for &item in source.items() {
                        let item = &document[item];
                        if item.kind() != NodeKind::Mapping {
                            return Err(merge_error(
                                format!(
                                    "expected a mapping for merging, but found {}",
                                    item.kind()
                                ),
                                item,
                                node,
                            ));
                        }
                    }
                    source.items().iter().rev().copied().collect()
                }
                NodeKind::Scalar => {
                    return Err(merge_error(
                        format!(
                            "expected a mapping or list of mappings for merging, but found {}",
                            source.kind()
                        ),
                        source,
                        node,
                    ));
                }
            };
            for id in sources {
                if merging.contains(&id) {
                    return Err(merge_error(
                        "found unconstructable recursive node".to_string(),
                        &document[id],
                        node,
                    ));
                }
                merging.push(id);
                let entries = self.flatten_mapping(&document[id], merging)?;
                merging.pop();
                debug_print!("constructor: merging {} entries", entries.len());
                merged.extend(entries);
            }
        }
        merged.extend(own);
        Ok(merged)
    }

    /// Build the entries of a sequence of single-entry mappings (`!!omap`, `!!pairs`).
    ///
    /// # Errors
    /// Returns an error if `node` is not a sequence of single-entry mappings, or if an entry
    /// fails to build.
    pub fn construct_pairs(&mut self, node: &Node, deep: bool) -> Result<Pairs> {
        self.pairs_in_context(node, deep, "while constructing pairs")
    }

    pub(crate) fn expect_pairs(&self, node: &Node, context: &str) -> Result<()> {
        if node.kind() == NodeKind::Sequence {
            return Ok(());
        }
        Err(YamlError::constructor(
            format!("expected a sequence, but found {}", node.kind()),
            Some(node.start_mark.clone()),
        )
        .with_context(context, Some(node.start_mark.clone())))
    }

    pub(crate) fn pairs_in_context(
        &mut self,
        node: &Node,
        deep: bool,
        context: &str,
    ) -> Result<Pairs> {
        self.expect_pairs(node, context)?;
        let context_mark = Some(node.start_mark.clone());
        let document = self.document;
        let mut pairs = Pairs::new();
        for &item in node.items() {
            let item = &document[item];
            let entries = item.pairs();
            if item.kind() != NodeKind::Mapping || entries.len() != 1 {
                let found = if item.kind() == NodeKind::Mapping {
                    format!("{} items", entries.len())
                } else {
                    item.kind().to_string()
                };
                return Err(YamlError::constructor(
                    format!("expected a mapping of length 1, but found {found}"),
                    Some(item.start_mark.clone()),
                )
                .with_context(context, context_mark));
            }
            let (key, value) = entries[0];
            let key = self.construct_object(key, deep)?;
            let value = self.construct_object(value, deep)?;
            pairs.push((key, value));
        }
        Ok(pairs)
    }
}

impl fmt::Debug for Constructor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("constructed", &self.constructed.len())
            .field("in_progress", &self.in_progress)
            .field("deferred", &self.deferred.len())
            .field("deep_construct", &self.deep_construct)
            .finish_non_exhaustive()
    }
}

fn merge_error(problem: String, culprit: &Node, mapping: &Node) -> YamlError {
    YamlError::constructor(problem, Some(culprit.start_mark.clone()))
        .with_context("while constructing a mapping", Some(mapping.start_mark.clone()))
}

/// Insert an entry. An existing key keeps its position and gets the new value.
fn insert_keeping_position(mapping: &mut Mapping, key: Value, value: Value) {
    if let Some(slot) = mapping.get_mut(&key) {
        *slot = value;
    } else {
        mapping.insert(key, value);
    }
}
