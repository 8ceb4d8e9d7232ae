// Copyright 2015, Yuheng Chen.
// Copyright 2023, Ethiraric.
// See the LICENSE file at the top-level directory of this distribution.

//! Tag-driven construction of native values from YAML.
//!
//! Text is turned into events by [`saphyr_parser`], events into a graph of nodes by the
//! [`Composer`], and nodes into [`Value`]s by the [`Constructor`]. What tags plain scalars
//! resolve to, and which function builds the value of each tag, is configured in a
//! [`Registry`].
//!
//! # Usage
//! ```
//! use saphyr_bind::{load, Value};
//!
//! let value = load("port: 8080\nhosts: [a, b]\nenabled: yes\n").unwrap();
//! assert_eq!(value.get("port"), Some(Value::Integer(8080)));
//! assert_eq!(value.get("enabled"), Some(Value::Boolean(true)));
//! assert_eq!(value.get("hosts").unwrap().len(), Some(2));
//! ```
//!
//! # Anchors and aliases
//! An alias constructs to the very value of its anchor. Containers are shared, so an alias to a
//! sequence or a mapping yields the same container, and a container may contain itself:
//! ```
//! let value = saphyr_bind::load("&x [1, *x]").unwrap();
//! assert!(value.get(1).unwrap().ptr_eq(&value));
//! # value.as_sequence().unwrap().borrow_mut().clear();
//! ```
//!
//! # Schemas
//! [`Registry::yaml11`] (the default) follows YAML 1.1: `yes`/`no` are booleans, `0b1010`,
//! `1_000` and `1:30` are integers, `2001-12-14` is a timestamp, and `<<` merges mappings.
//! [`Registry::core`] follows the YAML 1.2 core schema. [`Registry::base`] registers nothing,
//! every node is built from its shape.
//!
//! # User-defined tags
//! Constructors can be registered for exact tags or tag prefixes. Tags no constructor claims
//! fail to construct in the standard registries. [`construct_tagged`] keeps the tag alongside
//! the value instead:
//! ```
//! use saphyr_bind::{construct_tagged, load_with, Registry, Value};
//!
//! let mut registry = Registry::yaml11();
//! registry.add_fallback_multi_constructor(construct_tagged);
//! let value = load_with("!point [1, 2]", &registry, &Default::default()).unwrap();
//! let (tag, inner) = value.as_tagged().unwrap();
//! assert_eq!(tag, "!point");
//! assert_eq!(inner.get(0), Some(Value::Integer(1)));
//! ```
//!
//! # Features
//! #### `debug_prints`
//! Compiles in debug output on the error stream. It is only printed if the `SAPHYR_BIND_DEBUG`
//! environment variable is set.

#![warn(missing_docs, clippy::pedantic)]

#[macro_use]
mod debug;
#[macro_use]
mod macros;

mod composer;
pub mod constructor;
mod emitter;
mod error;
mod event;
mod index;
mod loader;
mod mark;
mod node;
mod registry;
pub mod resolver;
pub mod tag;
mod value;

pub use crate::composer::Composer;
pub use crate::constructor::{
    construct_tagged, Construct, Constructor, Continuation, ExactFn, PrefixFn, TagRule,
};
pub use crate::emitter::{dump, dump_with};
pub use crate::error::{ErrorKind, MarkedError, Result, YamlError};
pub use crate::event::{Event, EventQueue, EventSource, MarkedEvent, ParserEvents};
pub use crate::index::Accessor;
pub use crate::loader::{
    compose, compose_all, construct_document, load, load_all, load_all_with, load_with, Loader,
    LoaderOptions,
};
pub use crate::mark::{Mark, DEFAULT_STREAM_NAME};
pub use crate::node::{Document, Node, NodeId, NodeKind, NodeValue, ScalarStyle};
pub use crate::registry::{AnchorPolicy, Registry};
pub use crate::resolver::{IndexCheck, NodeCheck, PathElement, PathStep, Resolver};
pub use crate::value::{Mapping, Pairs, Sequence, Set, Shared, Time, Timestamp, Value};
