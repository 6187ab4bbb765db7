//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `iopanel.toml` in the working directory (or the path in
//! `IOPANEL_CONFIG`). Every field has a default reproducing the stock panel
//! so the file is optional. Environment variables take precedence over file
//! values.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use iopanel_app::registry::Declarations;
use iopanel_domain::entity::{AnalogChannel, AnalogRange, BinaryMode, NamedVariable, Toggle};
use iopanel_domain::error::ValidationError;

const DEFAULT_PATH: &str = "iopanel.toml";

/// Top-level configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Protocol tuning.
    pub panel: PanelConfig,
    /// Page assets.
    pub assets: AssetsConfig,
    /// Binary modes, in full-sync order.
    pub modes: Vec<ModeConfig>,
    /// Toggle outputs, in full-sync order.
    pub toggles: Vec<ToggleConfig>,
    /// PWM channels, in full-sync order.
    pub analog: Vec<AnalogConfig>,
    /// Named variables, in full-sync order.
    pub variables: Vec<VariableConfig>,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Top of the PWM drive range.
    pub pwm_resolution: u16,
    /// Frames queued per observer before it is dropped.
    pub observer_buffer: usize,
    /// Seconds between two liveness sweeps.
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Directory holding `index.html` and the files it references.
    pub dir: PathBuf,
}

/// One button of a binary mode and the label it selects.
#[derive(Debug, Clone, Deserialize)]
pub struct ButtonConfig {
    pub button: String,
    pub label: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModeConfig {
    pub token: String,
    pub pin: u8,
    pub high: ButtonConfig,
    pub low: ButtonConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToggleConfig {
    pub channel: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalogConfig {
    pub channel: u8,
    pub min: i64,
    pub max: i64,
    #[serde(default)]
    pub initial: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariableConfig {
    pub name: String,
    #[serde(default)]
    pub initial: i64,
}

impl Config {
    /// Load configuration from `iopanel.toml` (or `IOPANEL_CONFIG`, if set)
    /// then apply environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("IOPANEL_CONFIG").unwrap_or_else(|_| DEFAULT_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("IOPANEL_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("IOPANEL_PORT")
            && let Ok(port) = val.parse()
        {
            self.server.port = port;
        }
        if let Ok(val) = std::env::var("IOPANEL_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("IOPANEL_ASSETS") {
            self.assets.dir = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("IOPANEL_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.panel.observer_buffer == 0 {
            return Err(ConfigError::Validation(
                "observer buffer must be non-zero".to_string(),
            ));
        }
        if self.panel.sweep_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "sweep interval must be non-zero".to_string(),
            ));
        }
        if self.panel.pwm_resolution == 0 {
            return Err(ValidationError::ZeroResolution.into());
        }
        let entities = self.declarations()?.entity_count();
        if self.panel.observer_buffer < entities {
            return Err(ConfigError::Validation(format!(
                "observer buffer ({}) must hold a full sync of {entities} frames",
                self.panel.observer_buffer
            )));
        }
        Ok(())
    }

    /// Build the entity declarations for the output registry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Panel`] if a declaration breaks an entity
    /// invariant (empty name, inverted range, duplicate id, button or pin).
    pub fn declarations(&self) -> Result<Declarations, ConfigError> {
        let modes = self
            .modes
            .iter()
            .map(|mode| {
                BinaryMode::builder()
                    .token(&mode.token)
                    .pin(mode.pin)
                    .high(&mode.high.button, &mode.high.label)
                    .low(&mode.low.button, &mode.low.label)
                    .build()
            })
            .collect::<Result<_, _>>()?;
        let toggles = self
            .toggles
            .iter()
            .map(|toggle| Toggle::new(toggle.channel))
            .collect();
        let analog = self
            .analog
            .iter()
            .map(|analog| {
                AnalogRange::new(analog.min, analog.max)
                    .map(|range| AnalogChannel::new(analog.channel, range, analog.initial))
            })
            .collect::<Result<_, _>>()?;
        let variables = self
            .variables
            .iter()
            .map(|variable| NamedVariable::new(&variable.name, variable.initial))
            .collect::<Result<_, _>>()?;

        let declarations = Declarations {
            modes,
            toggles,
            analog,
            variables,
        };
        declarations.validate()?;
        Ok(declarations)
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.panel.sweep_interval_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        let button = |button: &str, label: &str| ButtonConfig {
            button: button.to_string(),
            label: label.to_string(),
        };
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            panel: PanelConfig::default(),
            assets: AssetsConfig::default(),
            modes: vec![
                ModeConfig {
                    token: "STATE".to_string(),
                    pin: 2,
                    high: button("bON", "ON"),
                    low: button("bOFF", "OFF"),
                },
                ModeConfig {
                    token: "MODE".to_string(),
                    pin: 4,
                    high: button("bAUTO", "AUTO"),
                    low: button("bMAN", "MAN"),
                },
            ],
            toggles: vec![ToggleConfig { channel: 12 }, ToggleConfig { channel: 14 }],
            analog: vec![
                AnalogConfig {
                    channel: 5,
                    min: 0,
                    max: 1000,
                    initial: 0,
                },
                AnalogConfig {
                    channel: 15,
                    min: 50,
                    max: 350,
                    initial: 0,
                },
            ],
            variables: vec![
                VariableConfig {
                    name: "tSET".to_string(),
                    initial: 0,
                },
                VariableConfig {
                    name: "rhSET".to_string(),
                    initial: 0,
                },
            ],
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "iopaneld=info,iopanel=info,tower_http=info".to_string(),
        }
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            pwm_resolution: 255,
            observer_buffer: 32,
            sweep_interval_secs: 2,
        }
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
    /// An entity declaration breaks a panel invariant.
    #[error("invalid panel declaration")]
    Panel(#[from] ValidationError),
}
