//! Logging shim for the interpreter and scene.
//!
//! With the `tracing` feature these are the `tracing` macros. What gets logged:
//!
//! - `debug`: program compiled (line count), run ended (steps, outcome),
//!   shapes created and cloned, scene reset, timers cancelled, info notices
//! - `trace`: each dispatched command and each scene operation that failed
//! - `warn`: error-channel notices
//!
//! Without the feature they expand to nothing and the arguments are never
//! evaluated, so bind side effects before logging them.

#[cfg(feature = "tracing")]
pub use tracing::{debug, trace, warn};

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
pub use crate::{debug, trace, warn};
