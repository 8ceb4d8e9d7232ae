//! Configuration shared by the composer and the constructor.

use crate::{
    constructor::{standard, Construct, Constructor, Handler, TagRule, TagRules},
    error::Result,
    node::{Node, NodeKind},
    resolver::{PathElement, ResolverTables},
};

/// What the composer does when an anchor is defined twice in the same document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AnchorPolicy {
    /// The latest definition wins. Aliases refer to the closest preceding definition.
    #[default]
    Overwrite,
    /// Fail with a "found duplicate anchor" error.
    Reject,
}

/// Tag constructors, tag resolvers and the switches governing how documents are loaded.
///
/// Registration order matters: implicit resolvers are tried in the order they were added. A
/// registry is meant to be set up once, then shared by every load using it.
///
/// ```
/// use saphyr_bind::{Construct, Registry, Value};
///
/// let mut registry = Registry::yaml11();
/// registry.add_constructor("!upper", |ctor, node| {
///     Ok(Construct::Value(Value::String(ctor.construct_scalar(node)?.to_uppercase())))
/// });
/// let value = saphyr_bind::load_with("!upper abc", &registry, &Default::default()).unwrap();
/// assert_eq!(value.as_str(), Some("ABC"));
/// ```
pub struct Registry {
    pub(crate) constructors: TagRules,
    pub(crate) resolvers: ResolverTables,
    pub(crate) merge_keys: bool,
    pub(crate) anchor_policy: AnchorPolicy,
}

impl Registry {
    /// A registry with no tag constructor and no implicit resolver.
    ///
    /// Plain scalars are still typed by the core schema inference, but since no constructor is
    /// registered for these types, every node is built from its shape: scalars become strings,
    /// sequences and mappings become containers.
    #[must_use]
    pub fn base() -> Self {
        let mut resolvers = ResolverTables::default();
        resolvers.core_inference = true;
        Self {
            constructors: TagRules::default(),
            resolvers,
            merge_keys: false,
            anchor_policy: AnchorPolicy::default(),
        }
    }

    /// A registry following the YAML 1.2 core schema.
    ///
    /// Constructors are registered for the standard tags. `<<` has no special meaning, and
    /// `yes`/`no`/`on`/`off` are strings unless explicitly tagged `!!bool`.
    #[must_use]
    pub fn core() -> Self {
        let mut registry = Self::base();
        standard::register(&mut registry, false);
        registry
    }

    /// A registry compatible with YAML 1.1.
    ///
    /// On top of [`Self::core`], the YAML 1.1 implicit types are recognized (`yes`, `0b1010`,
    /// `1_000`, `1:30`, `2001-12-14`, ...) and `<<` merges mappings into the enclosing one.
    #[must_use]
    pub fn yaml11() -> Self {
        let mut registry = Self::base();
        standard::register(&mut registry, true);
        registry.merge_keys = true;
        for (tag, regex, first_chars) in standard::YAML11_IMPLICIT_RESOLVERS {
            // The expressions are static and known to compile.
            if let Err(_e) = registry.add_implicit_resolver(tag, regex, Some(first_chars)) {
                debug_print!("bad builtin implicit resolver for {tag}: {_e}");
            }
        }
        registry
    }

    /// Register the constructor for nodes tagged exactly `tag`.
    ///
    /// A previous constructor for the same tag is replaced.
    pub fn add_constructor<F>(&mut self, tag: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&mut Constructor<'_>, &Node) -> Result<Construct> + 'static,
    {
        self.constructors
            .insert(TagRule::Exact(tag.into()), Handler::Exact(Box::new(f)));
        self
    }

    /// Register the constructor for nodes whose tag starts with `prefix`.
    ///
    /// The constructor is given the rest of the tag. When several prefixes match, the longest
    /// one is used.
    pub fn add_multi_constructor<F>(&mut self, prefix: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&mut Constructor<'_>, &str, &Node) -> Result<Construct> + 'static,
    {
        self.constructors
            .insert(TagRule::Prefix(prefix.into()), Handler::Prefix(Box::new(f)));
        self
    }

    /// Register the constructor for tags no exact or prefix constructor claims.
    ///
    /// The constructor is given the full tag. It takes precedence over
    /// [`Self::add_fallback_constructor`].
    pub fn add_fallback_multi_constructor<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut Constructor<'_>, &str, &Node) -> Result<Construct> + 'static,
    {
        self.constructors
            .insert(TagRule::AnyPrefix, Handler::Prefix(Box::new(f)));
        self
    }

    /// Register the constructor of last resort.
    ///
    /// Without any, nodes with unclaimed tags are built from their shape.
    pub fn add_fallback_constructor<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut Constructor<'_>, &Node) -> Result<Construct> + 'static,
    {
        self.constructors
            .insert(TagRule::Any, Handler::Exact(Box::new(f)));
        self
    }

    /// Resolve untagged plain scalars matching `regex` to `tag`.
    ///
    /// The resolver is only tried on scalars starting with one of `first_chars`. If
    /// `first_chars` is [`None`] or empty, it is tried on every scalar, after the resolvers
    /// registered for the scalar's first character.
    ///
    /// # Errors
    /// Returns a [`YamlError::Resolver`] if `tag` is empty or `regex` is invalid.
    ///
    /// [`YamlError::Resolver`]: crate::YamlError::Resolver
    pub fn add_implicit_resolver(
        &mut self,
        tag: &str,
        regex: &str,
        first_chars: Option<&str>,
    ) -> Result<&mut Self> {
        self.resolvers
            .add_implicit_resolver(tag, regex, first_chars)?;
        Ok(self)
    }

    /// Force the tag of untagged nodes found at `path`.
    ///
    /// If `kind` is given, only nodes of that shape are affected.
    ///
    /// # Errors
    /// Returns a [`YamlError::Resolver`] if `tag` is empty or an element of `path` can never
    /// match.
    ///
    /// [`YamlError::Resolver`]: crate::YamlError::Resolver
    pub fn add_path_resolver(
        &mut self,
        tag: &str,
        path: Vec<PathElement>,
        kind: Option<NodeKind>,
    ) -> Result<&mut Self> {
        self.resolvers.add_path_resolver(tag, path, kind)?;
        Ok(self)
    }

    /// Enable or disable `<<` merge keys.
    pub fn set_merge_keys(&mut self, enabled: bool) -> &mut Self {
        self.merge_keys = enabled;
        self
    }

    /// Enable or disable the core schema inference of plain scalars.
    pub fn set_core_inference(&mut self, enabled: bool) -> &mut Self {
        self.resolvers.core_inference = enabled;
        self
    }

    /// Set what happens when an anchor is redefined.
    pub fn set_anchor_policy(&mut self, policy: AnchorPolicy) -> &mut Self {
        self.anchor_policy = policy;
        self
    }

    /// Return whether `<<` merge keys are honored.
    #[must_use]
    pub fn merge_keys(&self) -> bool {
        self.merge_keys
    }

    /// Return the anchor redefinition policy.
    #[must_use]
    pub fn anchor_policy(&self) -> AnchorPolicy {
        self.anchor_policy
    }

    /// Return whether the registry has a constructor for exactly `tag`.
    #[must_use]
    pub fn has_constructor(&self, tag: &str) -> bool {
        self.constructors.contains(&TagRule::Exact(tag.to_string()))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::yaml11()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("constructors", &self.constructors)
            .field("resolvers", &self.resolvers)
            .field("merge_keys", &self.merge_keys)
            .field("anchor_policy", &self.anchor_policy)
            .finish()
    }
}
