//! Internal helpers for generating code.

/// Generate `as_TYPE` methods for [`Value`], returning a copy of the inner object.
///
/// [`Value`]: crate::Value
macro_rules! define_as (
    ($fn_name:ident, $t:ty, $($variant:tt)+) => (
/// Get a copy of the inner object in the value if it is a `$t`.
///
/// # Return
/// If `self` is of the matching variant, return `Some($t)` with a copy of the `$t` contained.
/// Otherwise, return `None`.
#[must_use]
pub fn $fn_name(&self) -> Option<$t> {
    match *self {
        $($variant)+,
        _ => None
    }
}
    );
);

/// Generate `as_TYPE` methods for [`Value`], returning references.
///
/// [`Value`]: crate::Value
macro_rules! define_as_ref (
    ($fn_name:ident, $t:ty, $($variant:tt)+) => (
/// Get a reference to the inner object in the value if it is a `$t`.
///
/// # Return
/// If `self` is of the matching variant, return `Some(&$t)` with the `$t` contained. Otherwise,
/// return `None`.
#[must_use]
pub fn $fn_name(&self) -> Option<$t> {
    match self {
        $($variant)+,
        _ => None
    }
}
    );
);

/// Generate `is_TYPE` methods for [`Value`].
///
/// [`Value`]: crate::Value
macro_rules! define_is (
    ($fn_name:ident, $variant:pat) => (
/// Check whether the value is of the given variant.
///
/// # Return
/// If the variant of `self` is `$variant`, return `true`. Otherwise, return `false`.
#[must_use]
pub fn $fn_name(&self) -> bool {
    matches!(self, $variant)
}
    );
);
