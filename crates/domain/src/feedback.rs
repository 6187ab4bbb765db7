//! Feedback frames: the canonical wire rendering of an entity's state.
//!
//! Frames are produced for both unsolicited broadcasts and full resyncs:
//!
//! | Entity | Wire text |
//! |--------|-----------|
//! | Toggle | `{"dfb":"12","state":"1"}` |
//! | Analog channel | `{"afb":"5","value":"15"}` |
//! | Named variable | `{"afb":"tSET","value":"22"}` |
//! | Binary mode | bare label, e.g. `ON` |

use serde_json::json;

use crate::entity::{ControllableEntity, Level};

/// One encoded state update addressed to every observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackMessage {
    /// Level of a toggle output.
    Digital { channel: u8, level: Level },
    /// Value of an analog channel (by number) or named variable (by name).
    Analog { id: String, value: i64 },
    /// Bare token, used for binary-mode labels and button echoes.
    Token(String),
}

impl FeedbackMessage {
    /// Render an entity's current state.
    #[must_use]
    pub fn encode(entity: &ControllableEntity) -> Self {
        match entity {
            ControllableEntity::Mode(mode) => Self::Token(mode.label().to_string()),
            ControllableEntity::Toggle(toggle) => Self::Digital {
                channel: toggle.channel,
                level: toggle.level,
            },
            ControllableEntity::Analog(analog) => Self::Analog {
                id: analog.channel.to_string(),
                value: analog.value(),
            },
            ControllableEntity::Variable(variable) => Self::Analog {
                id: variable.name.clone(),
                value: variable.value,
            },
        }
    }

    /// Echo of a button token with its first character stripped
    /// (`bXYZ` becomes `XYZ`), as existing clients expect.
    ///
    /// Returns `None` for an empty token.
    #[must_use]
    pub fn button_echo(button: &str) -> Option<Self> {
        let mut chars = button.chars();
        chars.next()?;
        Some(Self::Token(chars.as_str().to_string()))
    }

    /// Text sent in one WebSocket frame.
    #[must_use]
    pub fn to_wire(&self) -> String {
        match self {
            Self::Digital { channel, level } => json!({
                "dfb": channel.to_string(),
                "state": level.as_digit(),
            })
            .to_string(),
            Self::Analog { id, value } => json!({
                "afb": id,
                "value": value.to_string(),
            })
            .to_string(),
            Self::Token(token) => token.clone(),
        }
    }
}
