//! Shared fixtures for unit tests.

use std::collections::HashSet;
use std::sync::Mutex;

use iopanel_domain::entity::{
    AnalogChannel, AnalogRange, BinaryMode, Level, NamedVariable, Toggle,
};

use crate::ports::{DriverError, OutputDriver};
use crate::registry::Declarations;

/// One call received by [`RecordingDriver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    Configure(u8),
    Digital(u8, Level),
    Analog(u8, u16),
}

/// Driver that records every call and can be told to fail on given pins.
#[derive(Default)]
pub struct RecordingDriver {
    writes: Mutex<Vec<Write>>,
    failing: Mutex<HashSet<u8>>,
}

impl RecordingDriver {
    pub fn writes(&self) -> Vec<Write> {
        self.writes.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.writes.lock().unwrap().clear();
    }

    pub fn fail_on(&self, pin: u8) {
        self.failing.lock().unwrap().insert(pin);
    }

    fn record(&self, pin: u8, write: Write) -> Result<(), DriverError> {
        if self.failing.lock().unwrap().contains(&pin) {
            return Err(DriverError::PinUnavailable(pin));
        }
        self.writes.lock().unwrap().push(write);
        Ok(())
    }
}

impl OutputDriver for RecordingDriver {
    fn configure_output(&self, pin: u8) -> Result<(), DriverError> {
        self.record(pin, Write::Configure(pin))
    }

    fn write_digital(&self, pin: u8, level: Level) -> Result<(), DriverError> {
        self.record(pin, Write::Digital(pin, level))
    }

    fn write_analog(&self, pin: u8, duty: u16) -> Result<(), DriverError> {
        self.record(pin, Write::Analog(pin, duty))
    }
}

/// The stock panel: two modes, toggles 12/14, PWM 5 and 15, `tSET`/`rhSET`.
pub fn panel() -> Declarations {
    Declarations {
        modes: vec![
            BinaryMode::builder()
                .token("STATE")
                .pin(2)
                .high("bON", "ON")
                .low("bOFF", "OFF")
                .build()
                .unwrap(),
            BinaryMode::builder()
                .token("MODE")
                .pin(4)
                .high("bAUTO", "AUTO")
                .low("bMAN", "MAN")
                .build()
                .unwrap(),
        ],
        toggles: vec![Toggle::new(12), Toggle::new(14)],
        analog: vec![
            AnalogChannel::new(5, AnalogRange::new(0, 1000).unwrap(), 0),
            AnalogChannel::new(15, AnalogRange::new(50, 350).unwrap(), 0),
        ],
        variables: vec![
            NamedVariable::new("tSET", 0).unwrap(),
            NamedVariable::new("rhSET", 0).unwrap(),
        ],
    }
}
