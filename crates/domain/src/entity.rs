//! Entity: a controllable or reportable piece of device state.
//!
//! Four variants exist, each with its own identity namespace:
//!
//! | Variant | Identity | Physical binding |
//! |---------|----------|------------------|
//! | [`BinaryMode`] | symbolic token (`STATE`, `MODE`) | one output pin |
//! | [`Toggle`] | channel number | the channel's pin |
//! | [`AnalogChannel`] | channel number | PWM on the channel's pin |
//! | [`NamedVariable`] | name (`tSET`) | none |
//!
//! Entities are declared once at startup; only their current value changes.

mod level;
mod range;

pub use level::Level;
pub use range::AnalogRange;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ValidationError;

/// Discriminant of [`ControllableEntity`], also used to name namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Mode,
    Toggle,
    Analog,
    Variable,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mode => f.write_str("mode"),
            Self::Toggle => f.write_str("toggle"),
            Self::Analog => f.write_str("analog"),
            Self::Variable => f.write_str("variable"),
        }
    }
}

impl FromStr for EntityKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mode" => Ok(Self::Mode),
            "toggle" => Ok(Self::Toggle),
            "analog" => Ok(Self::Analog),
            "variable" => Ok(Self::Variable),
            _ => Err(()),
        }
    }
}

/// Identity of an entity, scoped by its variant namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityKey {
    Mode(String),
    Toggle(u8),
    Analog(u8),
    Variable(String),
}

impl EntityKey {
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Mode(_) => EntityKind::Mode,
            Self::Toggle(_) => EntityKind::Toggle,
            Self::Analog(_) => EntityKind::Analog,
            Self::Variable(_) => EntityKind::Variable,
        }
    }

    /// Build a key from a kind and the textual id used on the wire / in URLs.
    ///
    /// Returns `None` when a channel id is not a valid channel number.
    #[must_use]
    pub fn parse(kind: EntityKind, id: &str) -> Option<Self> {
        match kind {
            EntityKind::Mode => Some(Self::Mode(id.to_string())),
            EntityKind::Toggle => id.parse().ok().map(Self::Toggle),
            EntityKind::Analog => id.parse().ok().map(Self::Analog),
            EntityKind::Variable => Some(Self::Variable(id.to_string())),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mode(token) => f.write_str(token),
            Self::Toggle(channel) | Self::Analog(channel) => channel.fmt(f),
            Self::Variable(name) => f.write_str(name),
        }
    }
}

/// A binary digital output flipped by toggle requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toggle {
    pub channel: u8,
    pub level: Level,
}

impl Toggle {
    #[must_use]
    pub fn new(channel: u8) -> Self {
        Self {
            channel,
            level: Level::Low,
        }
    }
}

/// A PWM-driven output whose value lives in a declared engineering range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalogChannel {
    pub channel: u8,
    pub range: AnalogRange,
    value: i64,
}

impl AnalogChannel {
    /// Declare a channel; `initial` is clamped into `range`.
    #[must_use]
    pub fn new(channel: u8, range: AnalogRange, initial: i64) -> Self {
        Self {
            channel,
            range,
            value: range.clamp(initial),
        }
    }

    #[must_use]
    pub fn value(&self) -> i64 {
        self.value
    }

    /// Store `raw` clamped into the range and return the stored value.
    pub fn set_value(&mut self, raw: i64) -> i64 {
        self.value = self.range.clamp(raw);
        self.value
    }

    /// Current value in drive units.
    #[must_use]
    pub fn drive(&self, resolution: u16) -> u16 {
        self.range.to_drive(self.value, resolution)
    }
}

/// A free-form integer control variable with no physical binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedVariable {
    pub name: String,
    pub value: i64,
}

impl NamedVariable {
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] when `name` is empty.
    pub fn new(name: impl Into<String>, initial: i64) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(Self {
            name,
            value: initial,
        })
    }
}

/// A button bound to one side of a [`BinaryMode`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ButtonBinding {
    /// Token sent by the client (`bON`).
    pub button: String,
    /// Label reported while the mode is at this side's level (`ON`).
    pub label: String,
}

/// A binary output driven by a pair of momentary buttons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BinaryMode {
    pub token: String,
    pub pin: u8,
    pub level: Level,
    pub high: ButtonBinding,
    pub low: ButtonBinding,
}

impl BinaryMode {
    #[must_use]
    pub fn builder() -> BinaryModeBuilder {
        BinaryModeBuilder::default()
    }

    /// Label describing the current level.
    #[must_use]
    pub fn label(&self) -> &str {
        match self.level {
            Level::High => &self.high.label,
            Level::Low => &self.low.label,
        }
    }

    /// The level a button token drives this mode to, if it belongs here.
    #[must_use]
    pub fn level_for_button(&self, button: &str) -> Option<Level> {
        if self.high.button == button {
            Some(Level::High)
        } else if self.low.button == button {
            Some(Level::Low)
        } else {
            None
        }
    }
}

/// Step-by-step builder for [`BinaryMode`].
#[derive(Debug, Default)]
pub struct BinaryModeBuilder {
    token: Option<String>,
    pin: u8,
    high: Option<(String, String)>,
    low: Option<(String, String)>,
}

impl BinaryModeBuilder {
    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    #[must_use]
    pub fn pin(mut self, pin: u8) -> Self {
        self.pin = pin;
        self
    }

    /// Button that drives the mode high, and the label reported when high.
    #[must_use]
    pub fn high(mut self, button: impl Into<String>, label: impl Into<String>) -> Self {
        self.high = Some((button.into(), label.into()));
        self
    }

    /// Button that drives the mode low, and the label reported when low.
    #[must_use]
    pub fn low(mut self, button: impl Into<String>, label: impl Into<String>) -> Self {
        self.low = Some((button.into(), label.into()));
        self
    }

    /// Consume the builder and return a [`BinaryMode`] starting low.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyToken`] if the mode token or a button
    /// token is missing or empty, and [`ValidationError::DuplicateButton`]
    /// if both sides use the same button.
    pub fn build(self) -> Result<BinaryMode, ValidationError> {
        let token = self.token.unwrap_or_default();
        let (high_button, high_label) = self.high.unwrap_or_default();
        let (low_button, low_label) = self.low.unwrap_or_default();
        if token.is_empty() || high_button.is_empty() || low_button.is_empty() {
            return Err(ValidationError::EmptyToken);
        }
        if high_button == low_button {
            return Err(ValidationError::DuplicateButton(high_button));
        }
        Ok(BinaryMode {
            token,
            pin: self.pin,
            level: Level::Low,
            high: ButtonBinding {
                button: high_button,
                label: high_label,
            },
            low: ButtonBinding {
                button: low_button,
                label: low_label,
            },
        })
    }
}

/// Any declared entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ControllableEntity {
    Mode(BinaryMode),
    Toggle(Toggle),
    Analog(AnalogChannel),
    Variable(NamedVariable),
}

impl ControllableEntity {
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Mode(_) => EntityKind::Mode,
            Self::Toggle(_) => EntityKind::Toggle,
            Self::Analog(_) => EntityKind::Analog,
            Self::Variable(_) => EntityKind::Variable,
        }
    }

    #[must_use]
    pub fn key(&self) -> EntityKey {
        match self {
            Self::Mode(mode) => EntityKey::Mode(mode.token.clone()),
            Self::Toggle(toggle) => EntityKey::Toggle(toggle.channel),
            Self::Analog(analog) => EntityKey::Analog(analog.channel),
            Self::Variable(variable) => EntityKey::Variable(variable.name.clone()),
        }
    }

    /// Output pin the entity drives, if physically bound.
    #[must_use]
    pub fn pin(&self) -> Option<u8> {
        match self {
            Self::Mode(mode) => Some(mode.pin),
            Self::Toggle(toggle) => Some(toggle.channel),
            Self::Analog(analog) => Some(analog.channel),
            Self::Variable(_) => None,
        }
    }
}

impl From<BinaryMode> for ControllableEntity {
    fn from(mode: BinaryMode) -> Self {
        Self::Mode(mode)
    }
}

impl From<Toggle> for ControllableEntity {
    fn from(toggle: Toggle) -> Self {
        Self::Toggle(toggle)
    }
}

impl From<AnalogChannel> for ControllableEntity {
    fn from(analog: AnalogChannel) -> Self {
        Self::Analog(analog)
    }
}

impl From<NamedVariable> for ControllableEntity {
    fn from(variable: NamedVariable) -> Self {
        Self::Variable(variable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_mode() -> BinaryMode {
        BinaryMode::builder()
            .token("STATE")
            .pin(2)
            .high("bON", "ON")
            .low("bOFF", "OFF")
            .build()
            .unwrap()
    }

    #[test]
    fn should_build_mode_starting_low() {
        let mode = state_mode();
        assert_eq!(mode.level, Level::Low);
        assert_eq!(mode.label(), "OFF");
    }

    #[test]
    fn should_report_high_label_when_high() {
        let mut mode = state_mode();
        mode.level = Level::High;
        assert_eq!(mode.label(), "ON");
    }

    #[test]
    fn should_resolve_buttons_case_sensitively() {
        let mode = state_mode();
        assert_eq!(mode.level_for_button("bON"), Some(Level::High));
        assert_eq!(mode.level_for_button("bOFF"), Some(Level::Low));
        assert_eq!(mode.level_for_button("bon"), None);
    }

    #[test]
    fn should_reject_mode_without_token() {
        let result = BinaryMode::builder().high("bA", "A").low("bB", "B").build();
        assert_eq!(result, Err(ValidationError::EmptyToken));
    }

    #[test]
    fn should_reject_mode_using_same_button_twice() {
        let result = BinaryMode::builder()
            .token("MODE")
            .high("bX", "X")
            .low("bX", "Y")
            .build();
        assert_eq!(result, Err(ValidationError::DuplicateButton("bX".into())));
    }

    #[test]
    fn should_clamp_initial_analog_value() {
        let analog = AnalogChannel::new(15, AnalogRange::new(50, 350).unwrap(), 0);
        assert_eq!(analog.value(), 50);
    }

    #[test]
    fn should_clamp_when_setting_analog_value() {
        let mut analog = AnalogChannel::new(5, AnalogRange::new(0, 1000).unwrap(), 0);
        assert_eq!(analog.set_value(1500), 1000);
        assert_eq!(analog.set_value(-3), 0);
        assert_eq!(analog.set_value(15), 15);
    }

    #[test]
    fn should_reject_variable_with_empty_name() {
        assert_eq!(NamedVariable::new("", 0), Err(ValidationError::EmptyName));
    }

    #[test]
    fn should_scope_keys_by_namespace() {
        let toggle: ControllableEntity = Toggle::new(5).into();
        let analog: ControllableEntity =
            AnalogChannel::new(5, AnalogRange::new(0, 10).unwrap(), 0).into();
        assert_ne!(toggle.key(), analog.key());
        assert_eq!(toggle.key().to_string(), analog.key().to_string());
    }

    #[test]
    fn should_only_bind_variables_to_no_pin() {
        let variable: ControllableEntity = NamedVariable::new("tSET", 0).unwrap().into();
        let mode: ControllableEntity = state_mode().into();
        assert_eq!(variable.pin(), None);
        assert_eq!(mode.pin(), Some(2));
    }

    #[test]
    fn should_parse_key_from_kind_and_text() {
        assert_eq!(
            EntityKey::parse(EntityKind::Toggle, "12"),
            Some(EntityKey::Toggle(12))
        );
        assert_eq!(EntityKey::parse(EntityKind::Analog, "abc"), None);
        assert_eq!(
            EntityKey::parse(EntityKind::Variable, "rhSET"),
            Some(EntityKey::Variable("rhSET".into()))
        );
    }

    #[test]
    fn should_parse_kind_from_lowercase_name() {
        assert_eq!("analog".parse::<EntityKind>(), Ok(EntityKind::Analog));
        assert!("Analog".parse::<EntityKind>().is_err());
    }

    #[test]
    fn should_serialize_entity_with_kind_tag() {
        let entity: ControllableEntity = Toggle::new(12).into();
        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["kind"], "toggle");
        assert_eq!(json["channel"], 12);
        assert_eq!(json["level"], "low");
    }
}
