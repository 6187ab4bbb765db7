//! Command: one parsed client request.
//!
//! Each inbound frame is a JSON object. At most one command is recognized per
//! frame, by probing fields in a fixed precedence:
//!
//! 1. `all`: full resync
//! 2. `but`: button press
//! 3. `d_o`: toggle a digital output
//! 4. `a_o` (+ `value`): tune an analog channel
//! 5. `set` (+ `value`): set a named variable
//!
//! The first field present wins; any other field is ignored.

use serde_json::{Map, Value};

use crate::error::{MalformedMessageError, PanelError};

const FULL_SYNC_KEY: &str = "all";
const BUTTON_KEY: &str = "but";
const TOGGLE_KEY: &str = "d_o";
const ANALOG_KEY: &str = "a_o";
const VARIABLE_KEY: &str = "set";
const VALUE_KEY: &str = "value";

/// A typed client request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    RequestFullSync,
    PressButton(String),
    ToggleOutput(u8),
    TuneAnalog { channel: u8, value: i64 },
    SetVariable { name: String, value: i64 },
}

impl Command {
    /// Decode one inbound frame.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::MalformedMessage`] when the payload is not a JSON
    /// object or a recognized field carries an unusable value, and
    /// [`PanelError::UnrecognizedCommand`] when no known field is present.
    pub fn decode(payload: &str) -> Result<Self, PanelError> {
        let value: Value = serde_json::from_str(payload).map_err(MalformedMessageError::Json)?;
        let Value::Object(fields) = value else {
            return Err(MalformedMessageError::NotAnObject.into());
        };

        if fields.contains_key(FULL_SYNC_KEY) {
            return Ok(Self::RequestFullSync);
        }
        if let Some(button) = fields.get(BUTTON_KEY) {
            return Ok(Self::PressButton(text_field(BUTTON_KEY, button)?));
        }
        if let Some(channel) = fields.get(TOGGLE_KEY) {
            return Ok(Self::ToggleOutput(channel_field(TOGGLE_KEY, channel)?));
        }
        if let Some(channel) = fields.get(ANALOG_KEY) {
            return Ok(Self::TuneAnalog {
                channel: channel_field(ANALOG_KEY, channel)?,
                value: value_field(&fields)?,
            });
        }
        if let Some(name) = fields.get(VARIABLE_KEY) {
            return Ok(Self::SetVariable {
                name: text_field(VARIABLE_KEY, name)?,
                value: value_field(&fields)?,
            });
        }
        Err(PanelError::UnrecognizedCommand)
    }
}

fn text_field(field: &'static str, value: &Value) -> Result<String, MalformedMessageError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or(MalformedMessageError::InvalidField { field })
}

fn channel_field(field: &'static str, value: &Value) -> Result<u8, MalformedMessageError> {
    integer(value)
        .and_then(|n| u8::try_from(n).ok())
        .ok_or(MalformedMessageError::InvalidField { field })
}

fn value_field(fields: &Map<String, Value>) -> Result<i64, MalformedMessageError> {
    let value = fields
        .get(VALUE_KEY)
        .ok_or(MalformedMessageError::MissingField { field: VALUE_KEY })?;
    integer(value).ok_or(MalformedMessageError::InvalidField { field: VALUE_KEY })
}

/// Read an integer sent either as a JSON number or as text.
///
/// Browsers compute `value * factor` in floating point, so a float with
/// rounding noise (`"11.000000000000002"`) is truncated toward zero.
fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(truncate)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(truncate))
        }
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn truncate(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range
    let bound = i64::MAX as f64;
    if f.is_finite() && f >= -bound && f < bound {
        Some(f.trunc() as i64)
    } else {
        None
    }
}
