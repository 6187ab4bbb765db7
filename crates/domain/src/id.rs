//! Observer identity.

use std::fmt;

/// Unique identifier for a connected observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(uuid::Uuid);

impl Default for ObserverId {
    fn default() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl ObserverId {
    /// Generate a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
