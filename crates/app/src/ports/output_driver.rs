//! Output driver port: the physical side of physically bound entities.
//!
//! Writes are synchronous: when a call returns `Ok`, the pin already carries
//! the new level or duty cycle.

use iopanel_domain::entity::Level;
use iopanel_domain::error::PanelError;

/// Hardware (or simulated hardware) that drives output pins.
pub trait OutputDriver: Send + Sync {
    /// Put `pin` in output mode.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError`] if the pin cannot be used as an output.
    fn configure_output(&self, pin: u8) -> Result<(), DriverError>;

    /// Drive a digital level on `pin`.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError`] if the write fails.
    fn write_digital(&self, pin: u8, level: Level) -> Result<(), DriverError>;

    /// Drive a PWM duty cycle, in drive units, on `pin`.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError`] if the write fails.
    fn write_analog(&self, pin: u8, duty: u16) -> Result<(), DriverError>;
}

impl<T: OutputDriver + ?Sized> OutputDriver for std::sync::Arc<T> {
    fn configure_output(&self, pin: u8) -> Result<(), DriverError> {
        (**self).configure_output(pin)
    }

    fn write_digital(&self, pin: u8, level: Level) -> Result<(), DriverError> {
        (**self).write_digital(pin, level)
    }

    fn write_analog(&self, pin: u8, duty: u16) -> Result<(), DriverError> {
        (**self).write_analog(pin, duty)
    }
}

/// Errors reported by an [`OutputDriver`].
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The pin does not exist or is reserved.
    #[error("pin {0} is not available")]
    PinUnavailable(u8),

    /// The pin was written before being configured as an output.
    #[error("pin {0} is not configured as an output")]
    NotConfigured(u8),

    /// The underlying device failed.
    #[error("write to pin {pin} failed")]
    Io {
        pin: u8,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl From<DriverError> for PanelError {
    fn from(err: DriverError) -> Self {
        Self::Driver(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_into_panel_driver_error() {
        let err: PanelError = DriverError::PinUnavailable(40).into();
        assert!(matches!(err, PanelError::Driver(_)));
    }

    #[test]
    fn should_display_unavailable_pin() {
        assert_eq!(
            DriverError::PinUnavailable(40).to_string(),
            "pin 40 is not available"
        );
    }
}
