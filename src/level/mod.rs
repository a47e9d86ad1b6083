//! Android API levels and the lattice used to propagate them.
//!
//! [`AndroidApiLevel`] is the ordinal platform scale. [`ComputedApiLevel`]
//! wraps it in a three-state lattice so callers can tell "not computed yet"
//! and "deliberately untracked" apart from a concrete answer.

mod android;
mod computed;

pub use android::AndroidApiLevel;
pub use computed::{ComputedApiLevel, OptionalBool};
