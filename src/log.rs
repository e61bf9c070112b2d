//! Logging facade.
//!
//! With the `log` cargo feature, these are the `log` crate's macros. Without
//! it, every logging call expands to nothing.

#![allow(unused_macros, unused_imports)]

#[cfg(feature = "log")]
pub(crate) use ::log::{debug, error, info, trace, warn};

#[cfg(not(feature = "log"))]
mod disabled {
    macro_rules! discard {
        ($($tt:tt)*) => {};
    }

    pub(crate) use discard as debug;
    pub(crate) use discard as error;
    pub(crate) use discard as info;
    pub(crate) use discard as trace;
    pub(crate) use discard as warn;
}

#[cfg(not(feature = "log"))]
pub(crate) use disabled::{debug, error, info, trace, warn};
