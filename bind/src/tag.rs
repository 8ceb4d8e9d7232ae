//! Well-known tags.
//!
//! These are the tags of the [YAML types repository](https://yaml.org/type/), the ones the
//! standard constructors are registered for.

/// The prefix the `!!` handle expands to.
pub const CORE_SCHEMA_PREFIX: &str = "tag:yaml.org,2002:";

/// `!!null`
pub const NULL: &str = "tag:yaml.org,2002:null";
/// `!!bool`
pub const BOOL: &str = "tag:yaml.org,2002:bool";
/// `!!int`
pub const INT: &str = "tag:yaml.org,2002:int";
/// `!!float`
pub const FLOAT: &str = "tag:yaml.org,2002:float";
/// `!!str`
pub const STR: &str = "tag:yaml.org,2002:str";
/// `!!binary`
pub const BINARY: &str = "tag:yaml.org,2002:binary";
/// `!!timestamp`
pub const TIMESTAMP: &str = "tag:yaml.org,2002:timestamp";
/// `!!seq`
pub const SEQ: &str = "tag:yaml.org,2002:seq";
/// `!!map`
pub const MAP: &str = "tag:yaml.org,2002:map";
/// `!!set`
pub const SET: &str = "tag:yaml.org,2002:set";
/// `!!omap`
pub const OMAP: &str = "tag:yaml.org,2002:omap";
/// `!!pairs`
pub const PAIRS: &str = "tag:yaml.org,2002:pairs";
/// `!!merge`, the tag of the `<<` key.
pub const MERGE: &str = "tag:yaml.org,2002:merge";
/// `!!value`, the tag of the `=` key.
pub const VALUE: &str = "tag:yaml.org,2002:value";

/// The non-specific tag. A node carrying it has its tag resolved as if it had none, except that
/// its content is not inspected.
pub const NON_SPECIFIC: &str = "!";

/// Render a tag the short way if possible (`!!int` rather than `tag:yaml.org,2002:int`).
#[must_use]
pub fn shorthand(tag: &str) -> String {
    if let Some(suffix) = tag.strip_prefix(CORE_SCHEMA_PREFIX) {
        format!("!!{suffix}")
    } else if tag.starts_with('!') {
        tag.to_string()
    } else {
        format!("!<{tag}>")
    }
}
