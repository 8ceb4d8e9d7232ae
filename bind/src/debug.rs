//! Debugging helpers.
//!
//! Debugging is governed by two conditions:
//!   1. The `debug_prints` feature. Debugging code is not emitted unless the crate is built with
//!      it.
//!   2. The `SAPHYR_BIND_DEBUG` environment variable. When built with the feature, debug helpers
//!      only trigger if that variable is set when running the program.

// If debugging is compiled in, use stuff in the debug submodule.
#[cfg(feature = "debug_prints")]
#[allow(unused_imports)]
pub use debug::enabled;

// Otherwise, just export dummies for publicly visible functions.
/// Evaluates to nothing.
#[cfg(not(feature = "debug_prints"))]
macro_rules! debug_print {
    ($($arg:tt)*) => {{}};
}

#[cfg(feature = "debug_prints")]
#[macro_use]
#[allow(clippy::module_inception)]
mod debug {
    use std::sync::OnceLock;

    /// If debugging is [`enabled`], print the format string on the error output.
    macro_rules! debug_print {
        ($($arg:tt)*) => {{
            if $crate::debug::enabled() {
                eprintln!($($arg)*)
            }
        }};
    }

    /// Return whether debugging features are enabled in this execution.
    pub fn enabled() -> bool {
        static ENABLED: OnceLock<bool> = OnceLock::new();
        *ENABLED.get_or_init(|| std::env::var("SAPHYR_BIND_DEBUG").is_ok())
    }
}
