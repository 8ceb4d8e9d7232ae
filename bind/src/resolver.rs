//! Tag resolution for nodes that carry no explicit tag.
//!
//! A tag is chosen, in order, by:
//!   1. Path resolvers: rules matching the position of the node in the document (e.g. "every
//!      scalar under the `items` key").
//!   2. For plain scalars: the core schema inference of the parsing engine, then the implicit
//!      resolvers registered for the first character of the scalar, then those registered for
//!      any character.
//!   3. The default tag for the node's shape (`!!str`, `!!seq` or `!!map`).
//!
//! The tables live in the [`Registry`]. A [`Resolver`] borrows them and tracks, while the
//! composer walks down and up the document, which path resolvers still apply.
//!
//! [`Registry`]: crate::Registry

pub mod core;

use std::collections::HashMap;

use regex::Regex;

use crate::{
    error::{Result, YamlError},
    node::{Node, NodeKind},
    tag,
};

/// What a [`PathElement`] requires from the parent collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeCheck {
    /// Any parent.
    Any,
    /// A parent of the given shape.
    Kind(NodeKind),
    /// A parent with the given tag.
    Tag(String),
}

/// What a [`PathElement`] requires from the position of the child within its parent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IndexCheck {
    /// A mapping key.
    Key,
    /// Any mapping value or sequence item.
    Any,
    /// The value of the mapping entry whose key is the given scalar.
    Field(String),
    /// The sequence item at the given position.
    Item(usize),
}

/// One step of a path resolver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathElement {
    /// The check on the parent.
    pub node_check: NodeCheck,
    /// The check on the position within the parent.
    pub index_check: IndexCheck,
}

impl PathElement {
    /// The value of the mapping entry keyed `name`.
    #[must_use]
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            node_check: NodeCheck::Kind(NodeKind::Mapping),
            index_check: IndexCheck::Field(name.into()),
        }
    }

    /// The sequence item at position `index`.
    #[must_use]
    pub fn item(index: usize) -> Self {
        Self {
            node_check: NodeCheck::Kind(NodeKind::Sequence),
            index_check: IndexCheck::Item(index),
        }
    }

    /// Any mapping value or sequence item.
    #[must_use]
    pub fn any() -> Self {
        Self {
            node_check: NodeCheck::Any,
            index_check: IndexCheck::Any,
        }
    }

    /// Any mapping key.
    #[must_use]
    pub fn key() -> Self {
        Self {
            node_check: NodeCheck::Kind(NodeKind::Mapping),
            index_check: IndexCheck::Key,
        }
    }

    /// Replace the check on the parent (builder-style).
    #[must_use]
    pub fn with_node_check(mut self, node_check: NodeCheck) -> Self {
        self.node_check = node_check;
        self
    }

    /// Reject elements that can never match anything.
    fn validate(&self) -> Result<()> {
        let parent = match &self.node_check {
            NodeCheck::Tag(tag) if tag.is_empty() => {
                return Err(YamlError::resolver("invalid node checker: empty tag", None));
            }
            NodeCheck::Kind(NodeKind::Scalar) => {
                return Err(YamlError::resolver(
                    "invalid node checker: a scalar has no children",
                    None,
                ));
            }
            NodeCheck::Kind(kind) => Some(*kind),
            _ => None,
        };
        let valid = match (&self.index_check, parent) {
            (IndexCheck::Key | IndexCheck::Field(_), Some(NodeKind::Sequence))
            | (IndexCheck::Item(_), Some(NodeKind::Mapping)) => false,
            _ => true,
        };
        if valid {
            Ok(())
        } else {
            Err(YamlError::resolver(
                format!(
                    "invalid index checker: {:?} cannot apply to a {}",
                    self.index_check,
                    parent.map_or_else(|| "node".to_string(), |kind| kind.to_string())
                ),
                None,
            ))
        }
    }

    fn matches(&self, step: &PathStep<'_>) -> bool {
        let (parent, index) = match step {
            PathStep::Root => return false,
            PathStep::Key(parent) => (*parent, None),
            PathStep::Value(parent, key) => (*parent, Some(Position::Value(key))),
            PathStep::Item(parent, index) => (*parent, Some(Position::Item(*index))),
        };
        let node_ok = match &self.node_check {
            NodeCheck::Any => true,
            NodeCheck::Kind(kind) => parent.kind() == *kind,
            NodeCheck::Tag(tag) => parent.tag == *tag,
        };
        node_ok
            && match (&self.index_check, index) {
                (IndexCheck::Key, None) => true,
                (IndexCheck::Any, Some(_)) => true,
                (IndexCheck::Field(name), Some(Position::Value(key))) => {
                    key.scalar_value() == Some(name.as_str())
                }
                (IndexCheck::Item(expected), Some(Position::Item(index))) => *expected == index,
                _ => false,
            }
    }
}

enum Position<'a> {
    Value(&'a Node),
    Item(usize),
}

/// Where a node about to be composed sits relative to its parent.
#[derive(Clone, Copy, Debug)]
pub enum PathStep<'a> {
    /// The node is the root of the document.
    Root,
    /// The node is a key of the given mapping.
    Key(&'a Node),
    /// The node is the value associated with the given key node in the given mapping.
    Value(&'a Node, &'a Node),
    /// The node is the item at the given position of the given sequence.
    Item(&'a Node, usize),
}

#[derive(Debug)]
pub(crate) struct PathResolver {
    path: Vec<PathElement>,
    kind: Option<NodeKind>,
    tag: String,
}

#[derive(Debug)]
struct ImplicitResolver {
    tag: String,
    regex: Regex,
}

/// The resolution tables of a [`Registry`].
///
/// [`Registry`]: crate::Registry
#[derive(Debug, Default)]
pub(crate) struct ResolverTables {
    /// Keyed by first character. `None` is the wildcard bucket.
    implicit: HashMap<Option<char>, Vec<ImplicitResolver>>,
    paths: Vec<PathResolver>,
    pub(crate) core_inference: bool,
}

impl ResolverTables {
    pub(crate) fn add_implicit_resolver(
        &mut self,
        tag: &str,
        regex: &str,
        first_chars: Option<&str>,
    ) -> Result<()> {
        if tag.is_empty() {
            return Err(YamlError::resolver("invalid implicit resolver: empty tag", None));
        }
        // Match from the start of the value, as a regex `match` would.
        let regex = Regex::new(&format!("^(?:{regex})")).map_err(|e| {
            YamlError::resolver(format!("invalid implicit resolver for '{tag}': {e}"), None)
        })?;
        let keys: Vec<Option<char>> = match first_chars {
            Some(chars) if !chars.is_empty() => chars.chars().map(Some).collect(),
            _ => vec![None],
        };
        for key in keys {
            self.implicit.entry(key).or_default().push(ImplicitResolver {
                tag: tag.to_string(),
                regex: regex.clone(),
            });
        }
        Ok(())
    }

    pub(crate) fn add_path_resolver(
        &mut self,
        tag: &str,
        path: Vec<PathElement>,
        kind: Option<NodeKind>,
    ) -> Result<()> {
        if tag.is_empty() {
            return Err(YamlError::resolver("invalid path resolver: empty tag", None));
        }
        for element in &path {
            element.validate()?;
        }
        if let Some(existing) = self
            .paths
            .iter_mut()
            .find(|resolver| resolver.path == path && resolver.kind == kind)
        {
            existing.tag = tag.to_string();
        } else {
            self.paths.push(PathResolver {
                path,
                kind,
                tag: tag.to_string(),
            });
        }
        Ok(())
    }
}

/// Tag resolution state for the composition of one document.
#[derive(Debug)]
pub struct Resolver<'r> {
    tables: &'r ResolverTables,
    /// Tags forced for the current node, keyed by node kind (`None` for any kind).
    exact_paths: Vec<HashMap<Option<NodeKind>, &'r str>>,
    /// Path resolvers that may still match a descendant of the current node.
    prefix_paths: Vec<Vec<&'r PathResolver>>,
}

impl<'r> Resolver<'r> {
    pub(crate) fn new(tables: &'r ResolverTables) -> Self {
        Self {
            tables,
            exact_paths: vec![],
            prefix_paths: vec![],
        }
    }

    /// Enter a node. Must be paired with [`Self::ascend_resolver`].
    pub fn descend_resolver(&mut self, step: PathStep<'_>) {
        if self.tables.paths.is_empty() {
            return;
        }
        let mut exact = HashMap::new();
        let mut prefix = vec![];
        if let PathStep::Root = step {
            for resolver in &self.tables.paths {
                if resolver.path.is_empty() {
                    exact.insert(resolver.kind, resolver.tag.as_str());
                } else {
                    prefix.push(resolver);
                }
            }
        } else {
            let depth = self.prefix_paths.len();
            if let Some(candidates) = self.prefix_paths.last() {
                for resolver in candidates {
                    let Some(element) = resolver.path.get(depth - 1) else {
                        continue;
                    };
                    if !element.matches(&step) {
                        continue;
                    }
                    if resolver.path.len() > depth {
                        prefix.push(*resolver);
                    } else {
                        exact.insert(resolver.kind, resolver.tag.as_str());
                    }
                }
            }
        }
        self.exact_paths.push(exact);
        self.prefix_paths.push(prefix);
    }

    /// Leave the node entered by the last [`Self::descend_resolver`].
    pub fn ascend_resolver(&mut self) {
        if self.tables.paths.is_empty() {
            return;
        }
        self.exact_paths.pop();
        self.prefix_paths.pop();
    }

    /// Determine the tag of an untagged node at the current position.
    ///
    /// `implicit.0` tells whether a plain scalar's content may be inspected. `value` is ignored for
    /// collections.
    #[must_use]
    pub fn resolve(&self, kind: NodeKind, value: Option<&str>, implicit: (bool, bool)) -> &'r str {
        if let Some(exact) = self.exact_paths.last() {
            if let Some(&tag) = exact.get(&Some(kind)).or_else(|| exact.get(&None)) {
                return tag;
            }
        }
        match kind {
            NodeKind::Scalar if implicit.0 => self.resolve_implicit(value.unwrap_or_default()),
            NodeKind::Scalar => tag::STR,
            NodeKind::Sequence => tag::SEQ,
            NodeKind::Mapping => tag::MAP,
        }
    }

    fn resolve_implicit(&self, value: &str) -> &'r str {
        if value.is_empty() {
            return tag::NULL;
        }
        // The engine reads `.` as a float. It is a string here.
        if self.tables.core_inference && value != "." {
            let inferred = core::infer(value);
            if inferred != core::CoreType::Str {
                return inferred.tag();
            }
        }
        // The bucket of the first character, then the wildcard bucket.
        let implicit = &self.tables.implicit;
        let first = value.chars().next();
        [first, None]
            .iter()
            .filter_map(|key| implicit.get(key))
            .flatten()
            .find(|resolver| resolver.regex.is_match(value))
            .map_or(tag::STR, |resolver| resolver.tag.as_str())
    }
}
