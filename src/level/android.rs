//! The Android platform API level scale.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An Android platform API level.
///
/// Levels are totally ordered by their numeric value. [`AndroidApiLevel::B`]
/// is the lowest level ("available since the beginning") and
/// [`AndroidApiLevel::ANDROID_PLATFORM`] is the high sentinel used for the
/// in-development platform and for anything introduced after the newest
/// finalized level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AndroidApiLevel(u16);

/// Codenames for the finalized levels, indexed by `level - 1`.
const CODENAMES: [&str; 35] = [
    "B", "B_1_1", "C", "D", "E", "E_0_1", "E_MR1", "F", "G", "G_MR1", "H", "H_MR1", "H_MR2", "I",
    "I_MR1", "J", "J_MR1", "J_MR2", "K", "K_WATCH", "L", "L_MR1", "M", "N", "N_MR1", "O", "O_MR1",
    "P", "Q", "R", "S", "Sv2", "T", "U", "V",
];

#[allow(missing_docs, non_upper_case_globals)]
impl AndroidApiLevel {
    pub const B: Self = Self(1);
    pub const B_1_1: Self = Self(2);
    pub const C: Self = Self(3);
    pub const D: Self = Self(4);
    pub const E: Self = Self(5);
    pub const E_0_1: Self = Self(6);
    pub const E_MR1: Self = Self(7);
    pub const F: Self = Self(8);
    pub const G: Self = Self(9);
    pub const G_MR1: Self = Self(10);
    pub const H: Self = Self(11);
    pub const H_MR1: Self = Self(12);
    pub const H_MR2: Self = Self(13);
    pub const I: Self = Self(14);
    pub const I_MR1: Self = Self(15);
    pub const J: Self = Self(16);
    pub const J_MR1: Self = Self(17);
    pub const J_MR2: Self = Self(18);
    pub const K: Self = Self(19);
    pub const K_WATCH: Self = Self(20);
    pub const L: Self = Self(21);
    pub const L_MR1: Self = Self(22);
    pub const M: Self = Self(23);
    pub const N: Self = Self(24);
    pub const N_MR1: Self = Self(25);
    pub const O: Self = Self(26);
    pub const O_MR1: Self = Self(27);
    pub const P: Self = Self(28);
    pub const Q: Self = Self(29);
    pub const R: Self = Self(30);
    pub const S: Self = Self(31);
    pub const Sv2: Self = Self(32);
    pub const T: Self = Self(33);
    pub const U: Self = Self(34);
    pub const V: Self = Self(35);
}

impl AndroidApiLevel {
    /// The newest finalized platform level known to this crate.
    pub const LATEST: Self = Self::V;

    /// Sentinel for the in-development platform and unknown future levels.
    pub const ANDROID_PLATFORM: Self = Self(10000);

    /// Alias of [`AndroidApiLevel::ANDROID_PLATFORM`].
    pub const MASTER: Self = Self::ANDROID_PLATFORM;

    /// Byte value the database uses to encode [`AndroidApiLevel::ANDROID_PLATFORM`].
    pub const PLATFORM_STORED_BYTE: u8 = 0xFF;

    /// Creates a level from its numeric value.
    ///
    /// Zero is not a platform level and is rejected. Values above
    /// [`AndroidApiLevel::LATEST`] are accepted as-is so newer platforms can be
    /// described before this crate learns their codename.
    pub fn new(level: u16) -> Result<Self> {
        if level == 0 {
            return Err(Error::invalid_argument("API level must be at least 1"));
        }
        Ok(Self(level))
    }

    /// Decodes the level byte stored in a database triple.
    pub fn from_stored_byte(byte: u8) -> Self {
        if byte == Self::PLATFORM_STORED_BYTE {
            return Self::ANDROID_PLATFORM;
        }
        // A zero byte never comes out of the generator; clamp to the floor.
        debug_assert!(byte != 0, "stored API level byte must be non-zero");
        Self(u16::from(byte.max(1)))
    }

    /// The lowest level of the scale.
    pub const fn lowest() -> Self {
        Self::B
    }

    /// Returns the numeric level.
    pub const fn level(self) -> u16 {
        self.0
    }

    /// Returns the platform codename, if this is a finalized level.
    pub fn codename(self) -> Option<&'static str> {
        if self == Self::ANDROID_PLATFORM {
            return Some("ANDROID_PLATFORM");
        }
        CODENAMES.get(usize::from(self.0).checked_sub(1)?).copied()
    }

    /// Returns true for [`AndroidApiLevel::ANDROID_PLATFORM`].
    pub fn is_platform(self) -> bool {
        self == Self::ANDROID_PLATFORM
    }
}

impl Default for AndroidApiLevel {
    fn default() -> Self {
        Self::B
    }
}

impl fmt::Display for AndroidApiLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.codename() {
            Some(name) if self.is_platform() => write!(f, "{}", name),
            Some(name) => write!(f, "{} (API {})", name, self.0),
            None => write!(f, "API {}", self.0),
        }
    }
}

impl FromStr for AndroidApiLevel {
    type Err = Error;

    /// Parses either a numeric level (`"19"`) or a codename (`"K"`, `"Sv2"`).
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(level) = s.parse::<u16>() {
            return Self::new(level);
        }
        if s.eq_ignore_ascii_case("ANDROID_PLATFORM") || s.eq_ignore_ascii_case("MASTER") {
            return Ok(Self::ANDROID_PLATFORM);
        }
        CODENAMES
            .iter()
            .position(|name| *name == s)
            .map(|index| Self(index as u16 + 1))
            .ok_or_else(|| Error::invalid_argument(format!("Unknown API level: {}", s)))
    }
}
