//! Engineering-unit range of an analog channel and its mapping onto the
//! physical drive resolution.

use serde::Serialize;

use crate::error::ValidationError;

/// Inclusive `[min, max]` range of an analog channel, in engineering units.
///
/// Always satisfies `min < max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnalogRange {
    min: i64,
    max: i64,
}

impl AnalogRange {
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidRange`] unless `min < max`.
    pub fn new(min: i64, max: i64) -> Result<Self, ValidationError> {
        if min >= max {
            return Err(ValidationError::InvalidRange { min, max });
        }
        Ok(Self { min, max })
    }

    #[must_use]
    pub fn min(self) -> i64 {
        self.min
    }

    #[must_use]
    pub fn max(self) -> i64 {
        self.max
    }

    /// Clamp an arbitrary engineering value into the range.
    #[must_use]
    pub fn clamp(self, value: i64) -> i64 {
        value.clamp(self.min, self.max)
    }

    /// Map an engineering value onto `0..=resolution` drive units.
    ///
    /// The input is clamped first, so the result never exceeds `resolution`.
    /// The mapping is linear, monotonic and truncates toward zero.
    #[must_use]
    pub fn to_drive(self, value: i64, resolution: u16) -> u16 {
        let offset = i128::from(self.clamp(value)) - i128::from(self.min);
        let span = i128::from(self.max) - i128::from(self.min);
        let scaled = offset * i128::from(resolution) / span;
        u16::try_from(scaled).unwrap_or(resolution)
    }
}
