//! Per-user preferences: marker color palette and saved-city outcomes.
//!
//! # Invariants
//! - `MarkerColor` is a closed palette; unknown codes never reach storage.
//! - Storage codes (`red`, `blue`, ...) are stable and lowercase.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Telegram-style user/chat identifier.
pub type UserId = i64;

/// Fixed marker color palette offered to users.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerColor {
    #[default]
    Red,
    Blue,
    Green,
    Purple,
    Orange,
    Black,
}

impl MarkerColor {
    /// Palette in presentation order.
    pub const ALL: [MarkerColor; 6] = [
        MarkerColor::Red,
        MarkerColor::Blue,
        MarkerColor::Green,
        MarkerColor::Purple,
        MarkerColor::Orange,
        MarkerColor::Black,
    ];

    /// Stable storage/callback code.
    pub fn code(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Purple => "purple",
            Self::Orange => "orange",
            Self::Black => "black",
        }
    }

    /// Human-readable label used in selection lists.
    pub fn label(self) -> &'static str {
        match self {
            Self::Red => "Red ❤️",
            Self::Blue => "Blue 💙",
            Self::Green => "Green 💚",
            Self::Purple => "Purple 💜",
            Self::Orange => "Orange 🧡",
            Self::Black => "Black ⚫",
        }
    }

    /// Marker fill as RGB, matching the usual named-color values.
    pub fn rgb(self) -> [u8; 3] {
        match self {
            Self::Red => [255, 0, 0],
            Self::Blue => [0, 0, 255],
            Self::Green => [0, 128, 0],
            Self::Purple => [128, 0, 128],
            Self::Orange => [255, 165, 0],
            Self::Black => [0, 0, 0],
        }
    }
}

impl Display for MarkerColor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Rejected marker color code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownColor(pub String);

impl Display for UnknownColor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown marker color `{}`; expected red|blue|green|purple|orange|black",
            self.0
        )
    }
}

impl Error for UnknownColor {}

impl FromStr for MarkerColor {
    type Err = UnknownColor;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|color| color.code() == normalized)
            .ok_or_else(|| UnknownColor(value.to_string()))
    }
}

/// Result of saving a city to a user's list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// New association created.
    Saved,
    /// Association already existed; nothing changed.
    AlreadySaved,
    /// Name is not present in the city reference table.
    UnknownCity,
}

/// Result of removing a city from a user's list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Association existed and was removed.
    Deleted,
    /// City is known, but the user had not saved it.
    NotSaved,
    /// Name is not present in the city reference table.
    UnknownCity,
}

impl DeleteOutcome {
    pub fn is_deleted(self) -> bool {
        matches!(self, Self::Deleted)
    }
}
