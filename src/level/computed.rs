//! The `{NotSet, Unknown, Known}` lattice over API levels.
//!
//! Ordering:
//!
//! ```text
//! Known(a) >= Known(b)  iff  a >= b
//! Unknown  >  Known(_)
//! NotSet   -- never ordered; any relational use is a programming error
//! ```

use crate::level::AndroidApiLevel;
use std::fmt;

/// A boolean that may be undetermined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionalBool {
    /// Definitely true.
    True,
    /// Definitely false.
    False,
    /// Cannot be decided.
    Unknown,
}

impl OptionalBool {
    /// Returns true only for [`OptionalBool::True`].
    pub fn is_true(self) -> bool {
        self == OptionalBool::True
    }

    /// Returns true only for [`OptionalBool::False`].
    pub fn is_false(self) -> bool {
        self == OptionalBool::False
    }

    /// Returns true only for [`OptionalBool::Unknown`].
    pub fn is_unknown(self) -> bool {
        self == OptionalBool::Unknown
    }
}

impl From<bool> for OptionalBool {
    fn from(value: bool) -> Self {
        if value {
            OptionalBool::True
        } else {
            OptionalBool::False
        }
    }
}

/// An API level as computed for a reference or definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ComputedApiLevel {
    /// No value has been assigned yet.
    #[default]
    NotSet,
    /// The level is deliberately untracked or cannot be determined.
    Unknown,
    /// A concrete platform level.
    Known(AndroidApiLevel),
}

impl ComputedApiLevel {
    /// Shorthand for `Known(AndroidApiLevel::ANDROID_PLATFORM)`.
    pub fn platform() -> Self {
        ComputedApiLevel::Known(AndroidApiLevel::ANDROID_PLATFORM)
    }

    /// Returns true for [`ComputedApiLevel::NotSet`].
    pub fn is_not_set(&self) -> bool {
        matches!(self, ComputedApiLevel::NotSet)
    }

    /// Returns true for [`ComputedApiLevel::Unknown`].
    pub fn is_unknown(&self) -> bool {
        matches!(self, ComputedApiLevel::Unknown)
    }

    /// Returns true for [`ComputedApiLevel::Known`].
    pub fn is_known(&self) -> bool {
        matches!(self, ComputedApiLevel::Known(_))
    }

    /// Returns the concrete level, if known.
    pub fn as_known(&self) -> Option<AndroidApiLevel> {
        match self {
            ComputedApiLevel::Known(level) => Some(*level),
            _ => None,
        }
    }

    /// Returns the greater of the two values.
    ///
    /// # Panics
    ///
    /// Panics if either side is [`ComputedApiLevel::NotSet`].
    pub fn max(self, other: Self) -> Self {
        self.require_set("max");
        other.require_set("max");
        match (self, other) {
            (ComputedApiLevel::Known(a), ComputedApiLevel::Known(b)) => {
                ComputedApiLevel::Known(a.max(b))
            }
            _ => ComputedApiLevel::Unknown,
        }
    }

    /// Strict greater-than on the lattice.
    ///
    /// # Panics
    ///
    /// Panics if either side is [`ComputedApiLevel::NotSet`].
    pub fn is_greater_than(&self, other: &Self) -> bool {
        self.require_set("is_greater_than");
        other.require_set("is_greater_than");
        match (self, other) {
            (ComputedApiLevel::Known(a), ComputedApiLevel::Known(b)) => a > b,
            (ComputedApiLevel::Unknown, ComputedApiLevel::Known(_)) => true,
            _ => false,
        }
    }

    /// Greater-than-or-equal on the lattice.
    ///
    /// # Panics
    ///
    /// Panics if either side is [`ComputedApiLevel::NotSet`].
    pub fn is_greater_than_or_equal(&self, other: &Self) -> bool {
        self.require_set("is_greater_than_or_equal");
        other.require_set("is_greater_than_or_equal");
        match (self, other) {
            (ComputedApiLevel::Known(a), ComputedApiLevel::Known(b)) => a >= b,
            (ComputedApiLevel::Unknown, _) => true,
            _ => false,
        }
    }

    /// Compares against a concrete platform level.
    ///
    /// An unknown value cannot be placed on the scale, so the answer is
    /// [`OptionalBool::Unknown`].
    ///
    /// # Panics
    ///
    /// Panics if `self` is [`ComputedApiLevel::NotSet`].
    pub fn is_less_than_or_equal(&self, level: AndroidApiLevel) -> OptionalBool {
        self.require_set("is_less_than_or_equal");
        match self {
            ComputedApiLevel::Known(known) => OptionalBool::from(*known <= level),
            _ => OptionalBool::Unknown,
        }
    }

    fn require_set(&self, operation: &str) {
        assert!(!self.is_not_set(), "{} applied to an unset API level", operation);
    }
}

impl From<AndroidApiLevel> for ComputedApiLevel {
    fn from(level: AndroidApiLevel) -> Self {
        ComputedApiLevel::Known(level)
    }
}

impl fmt::Display for ComputedApiLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputedApiLevel::NotSet => write!(f, "<not set>"),
            ComputedApiLevel::Unknown => write!(f, "<unknown>"),
            ComputedApiLevel::Known(level) => write!(f, "{}", level),
        }
    }
}
