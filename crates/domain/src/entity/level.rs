//! Binary output level shared by toggles and modes.

use serde::{Deserialize, Serialize};

/// Logic level of a physically bound binary output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[default]
    Low,
    High,
}

impl Level {
    #[must_use]
    pub fn is_high(self) -> bool {
        matches!(self, Self::High)
    }

    /// The opposite level.
    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            Self::Low => Self::High,
            Self::High => Self::Low,
        }
    }

    /// Wire digit used in feedback frames (`"0"` or `"1"`).
    #[must_use]
    pub fn as_digit(self) -> &'static str {
        match self {
            Self::Low => "0",
            Self::High => "1",
        }
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Self::High } else { Self::Low }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_digit())
    }
}
