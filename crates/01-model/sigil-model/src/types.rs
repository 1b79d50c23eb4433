//! Identity, priority, and category types shared across the engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Priority ring a sigil lives in (ring 0 is highest).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    /// Ring 0, reserved for core sigils.
    Core,
    /// Ring 1.
    Inner,
    /// Ring 2.
    Middle,
    /// Ring 3, the outermost and lowest priority.
    Outer,
}

impl Priority {
    /// Every ring ordered from highest to lowest priority.
    pub const ALL: [Priority; 4] = [
        Priority::Core,
        Priority::Inner,
        Priority::Middle,
        Priority::Outer,
    ];

    /// Maps a raw ring number onto a priority. Anything outside `0..=3` lands in ring 3.
    pub fn from_level(level: i64) -> Self {
        match level {
            0 => Priority::Core,
            1 => Priority::Inner,
            2 => Priority::Middle,
            _ => Priority::Outer,
        }
    }

    /// Ring number in `0..=3`.
    pub fn index(self) -> usize {
        match self {
            Priority::Core => 0,
            Priority::Inner => 1,
            Priority::Middle => 2,
            Priority::Outer => 3,
        }
    }

    /// Adjacent ring with a lower number, or `None` at ring 0.
    pub fn promoted(self) -> Option<Self> {
        match self {
            Priority::Core => None,
            Priority::Inner => Some(Priority::Core),
            Priority::Middle => Some(Priority::Inner),
            Priority::Outer => Some(Priority::Middle),
        }
    }

    /// Adjacent ring with a higher number, or `None` at ring 3.
    pub fn demoted(self) -> Option<Self> {
        match self {
            Priority::Core => Some(Priority::Inner),
            Priority::Inner => Some(Priority::Middle),
            Priority::Middle => Some(Priority::Outer),
            Priority::Outer => None,
        }
    }
}

impl From<u8> for Priority {
    fn from(level: u8) -> Self {
        Priority::from_level(i64::from(level))
    }
}

/// Routing category of a sigil.
///
/// Threshold envelopes, base entropy, and routing handlers are all keyed by
/// this enum, so every table is matched exhaustively.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SigilCategory {
    Revive,
    Pause,
    Reflect,
    Seal,
    Dream,
    Pulse,
    Whisper,
    Echo,
    /// Sigils with no routing house; no envelope and no entropy contribution.
    Unbound,
}

impl SigilCategory {
    /// Number of categories.
    pub const COUNT: usize = 9;

    /// Every category in table order.
    pub const ALL: [SigilCategory; Self::COUNT] = [
        SigilCategory::Revive,
        SigilCategory::Pause,
        SigilCategory::Reflect,
        SigilCategory::Seal,
        SigilCategory::Dream,
        SigilCategory::Pulse,
        SigilCategory::Whisper,
        SigilCategory::Echo,
        SigilCategory::Unbound,
    ];

    /// Position of this category in [`SigilCategory::ALL`].
    pub fn index(self) -> usize {
        match self {
            SigilCategory::Revive => 0,
            SigilCategory::Pause => 1,
            SigilCategory::Reflect => 2,
            SigilCategory::Seal => 3,
            SigilCategory::Dream => 4,
            SigilCategory::Pulse => 5,
            SigilCategory::Whisper => 6,
            SigilCategory::Echo => 7,
            SigilCategory::Unbound => 8,
        }
    }

    /// Lowercase label used in logs and audit output.
    pub fn name(self) -> &'static str {
        match self {
            SigilCategory::Revive => "revive",
            SigilCategory::Pause => "pause",
            SigilCategory::Reflect => "reflect",
            SigilCategory::Seal => "seal",
            SigilCategory::Dream => "dream",
            SigilCategory::Pulse => "pulse",
            SigilCategory::Whisper => "whisper",
            SigilCategory::Echo => "echo",
            SigilCategory::Unbound => "unbound",
        }
    }
}

impl fmt::Display for SigilCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a label does not name a known category.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sigil category `{0}`")]
pub struct ParseCategoryError(pub String);

impl FromStr for SigilCategory {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        SigilCategory::ALL
            .into_iter()
            .find(|category| category.name() == lowered)
            .ok_or_else(|| ParseCategoryError(s.to_owned()))
    }
}

/// Registration record held by the priority ring store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SigilRecord {
    /// Unique sigil identifier.
    pub id: String,
    /// Heat recorded at insertion time.
    pub temperature: f64,
    /// Routing category.
    pub category: SigilCategory,
    /// Free-form grouping label used for display only.
    pub house: String,
    /// Ring currently holding the record.
    pub priority: Priority,
}

impl SigilRecord {
    /// Creates a record whose house label defaults to the category name.
    pub fn new(
        id: impl Into<String>,
        temperature: f64,
        category: SigilCategory,
        priority: Priority,
    ) -> Self {
        Self {
            id: id.into(),
            temperature,
            category,
            house: category.name().to_owned(),
            priority,
        }
    }

    /// Replaces the display house label.
    pub fn with_house(mut self, house: impl Into<String>) -> Self {
        self.house = house.into();
        self
    }
}
