//! Keys used to look into constructed values.

/// An accessor into a sequence or a mapping, used by [`Value::get`].
///
/// [`Value::get`]: crate::Value::get
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Accessor {
    /// Accessing a string key in a mapping.
    Field(String),
    /// Accessing an element of a sequence, or an integer key in a mapping.
    Index(usize),
}

impl From<usize> for Accessor {
    fn from(val: usize) -> Self {
        Accessor::Index(val)
    }
}

impl From<String> for Accessor {
    fn from(val: String) -> Self {
        Accessor::Field(val)
    }
}

impl From<&str> for Accessor {
    fn from(val: &str) -> Self {
        Accessor::Field(val.to_string())
    }
}
