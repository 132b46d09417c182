//! Canonical task priority and its normalization boundary.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The canonical five-level task priority.
///
/// This is the cross-system representation: the local store and the wire
/// format always carry one of these labels. Older rows and some clients
/// represent priority as a numeric level `"1"`..`"5"`; those are mapped at
/// the edges via [`Priority::from_legacy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Casual,
    Low,
    Mid,
    High,
    Extreme,
}

impl Priority {
    /// All priorities in ascending order.
    pub const ALL: [Self; 5] = [
        Self::Casual,
        Self::Low,
        Self::Mid,
        Self::High,
        Self::Extreme,
    ];

    /// The canonical label used on the wire and in the local store.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Casual => "Casual",
            Self::Low => "Low",
            Self::Mid => "Mid",
            Self::High => "High",
            Self::Extreme => "Extreme",
        }
    }

    /// Normalize a legacy or untrusted value to the canonical enumeration.
    ///
    /// Canonical labels pass through, numeric levels `"1"`..`"5"` map to
    /// Casual..Extreme, anything else falls back to the default `Mid`.
    #[must_use]
    pub fn from_legacy(value: &str) -> Self {
        match value.trim() {
            "Casual" | "1" => Self::Casual,
            "Low" | "2" => Self::Low,
            "High" | "4" => Self::High,
            "Extreme" | "5" => Self::Extreme,
            "Mid" | "3" => Self::Mid,
            other => {
                if !other.is_empty() {
                    tracing::warn!(value = other, "Unrecognized priority, defaulting to Mid");
                }
                Self::Mid
            }
        }
    }

    /// The numeric level (1..=5) of this priority.
    #[must_use]
    pub const fn level(self) -> u8 {
        match self {
            Self::Casual => 1,
            Self::Low => 2,
            Self::Mid => 3,
            Self::High => 4,
            Self::Extreme => 5,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Mid
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
