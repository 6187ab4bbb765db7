//! # iopanel-adapter-virtual
//!
//! Simulated GPIO board that implements the [`OutputDriver`] port, so the
//! whole panel can run and be tested on a machine without real pins.
//!
//! ## Behaviour
//!
//! | Call | Effect |
//! |------|--------|
//! | `configure_output(pin)` | marks the pin as an output, level low, duty 0 |
//! | `write_digital(pin, level)` | stores the level; pin must be configured |
//! | `write_analog(pin, duty)` | stores the PWM duty; pin must be configured |
//!
//! Pins can be declared unavailable up front to simulate a broken or reserved
//! line.
//!
//! ## Dependency rule
//!
//! Depends on `iopanel-app` (port traits) and `iopanel-domain` only.

mod pin;

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use iopanel_app::ports::{DriverError, OutputDriver};
use iopanel_domain::entity::Level;

pub use pin::PinState;

/// In-memory board holding the last value written to every pin.
#[derive(Debug, Default)]
pub struct VirtualBoard {
    pins: Mutex<HashMap<u8, PinState>>,
    unavailable: HashSet<u8>,
}

impl VirtualBoard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every access to `pin` fail with [`DriverError::PinUnavailable`].
    #[must_use]
    pub fn with_unavailable_pin(mut self, pin: u8) -> Self {
        self.unavailable.insert(pin);
        self
    }

    fn pins(&self) -> MutexGuard<'_, HashMap<u8, PinState>> {
        self.pins.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of a configured pin.
    #[must_use]
    pub fn pin(&self, pin: u8) -> Option<PinState> {
        self.pins().get(&pin).copied()
    }

    /// Digital level last written to `pin`.
    #[must_use]
    pub fn level(&self, pin: u8) -> Option<Level> {
        self.pin(pin).map(|state| state.level)
    }

    /// PWM duty last written to `pin`.
    #[must_use]
    pub fn duty(&self, pin: u8) -> Option<u16> {
        self.pin(pin).map(|state| state.duty)
    }

    fn update(&self, pin: u8, apply: impl FnOnce(&mut PinState)) -> Result<(), DriverError> {
        if self.unavailable.contains(&pin) {
            return Err(DriverError::PinUnavailable(pin));
        }
        let mut pins = self.pins();
        let state = pins.get_mut(&pin).ok_or(DriverError::NotConfigured(pin))?;
        apply(state);
        Ok(())
    }
}

impl OutputDriver for VirtualBoard {
    fn configure_output(&self, pin: u8) -> Result<(), DriverError> {
        if self.unavailable.contains(&pin) {
            return Err(DriverError::PinUnavailable(pin));
        }
        self.pins().entry(pin).or_default();
        tracing::trace!(pin, "virtual pin configured as output");
        Ok(())
    }

    fn write_digital(&self, pin: u8, level: Level) -> Result<(), DriverError> {
        self.update(pin, |state| state.level = level)?;
        tracing::trace!(pin, %level, "virtual digital write");
        Ok(())
    }

    fn write_analog(&self, pin: u8, duty: u16) -> Result<(), DriverError> {
        self.update(pin, |state| state.duty = duty)?;
        tracing::trace!(pin, duty, "virtual pwm write");
        Ok(())
    }
}
