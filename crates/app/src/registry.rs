//! Output registry: the canonical in-memory state of every declared entity
//! and its physical binding.
//!
//! Entities are declared once, at construction, and never added or removed.
//! Lookups go through an [`EntityKey`] map; iteration follows the full-sync
//! order: binary modes, toggles, analog channels, then named variables, each
//! group in declaration order.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use iopanel_domain::entity::{
    AnalogChannel, BinaryMode, ControllableEntity, EntityKey, Level, NamedVariable, Toggle,
};
use iopanel_domain::error::{PanelError, UnknownEntityError, ValidationError};

use crate::ports::{DriverError, OutputDriver};

/// Entities declared at startup, grouped by variant in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Declarations {
    pub modes: Vec<BinaryMode>,
    pub toggles: Vec<Toggle>,
    pub analog: Vec<AnalogChannel>,
    pub variables: Vec<NamedVariable>,
}

impl Declarations {
    /// Number of declared entities, which is also the number of frames a full
    /// sync emits.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.modes.len() + self.toggles.len() + self.analog.len() + self.variables.len()
    }

    /// Check the invariants that span several declarations: ids unique per
    /// namespace, button tokens unique across modes, one entity per pin.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut buttons = HashSet::new();
        for binding in self.modes.iter().flat_map(|mode| [&mode.high, &mode.low]) {
            if !buttons.insert(binding.button.as_str()) {
                return Err(ValidationError::DuplicateButton(binding.button.clone()));
            }
        }

        let bindings = self
            .modes
            .iter()
            .map(|mode| (EntityKey::Mode(mode.token.clone()), Some(mode.pin)))
            .chain(
                self.toggles
                    .iter()
                    .map(|toggle| (EntityKey::Toggle(toggle.channel), Some(toggle.channel))),
            )
            .chain(
                self.analog
                    .iter()
                    .map(|analog| (EntityKey::Analog(analog.channel), Some(analog.channel))),
            )
            .chain(
                self.variables
                    .iter()
                    .map(|variable| (EntityKey::Variable(variable.name.clone()), None)),
            );

        let mut keys = HashSet::new();
        let mut pins = HashSet::new();
        for (key, pin) in bindings {
            if keys.contains(&key) {
                return Err(ValidationError::Duplicate {
                    kind: key.kind(),
                    id: key.to_string(),
                });
            }
            if let Some(pin) = pin
                && !pins.insert(pin)
            {
                return Err(ValidationError::PinConflict(pin));
            }
            keys.insert(key);
        }
        Ok(())
    }
}

/// The mode and level a button press drives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonTarget {
    pub mode: EntityKey,
    pub level: Level,
}

/// Single-instance container of all entity state.
pub struct OutputRegistry<D> {
    driver: D,
    resolution: u16,
    buttons: HashMap<String, ButtonTarget>,
    entities: Mutex<IndexMap<EntityKey, ControllableEntity>>,
}

impl<D: OutputDriver> OutputRegistry<D> {
    /// Validate the declarations, configure every bound pin as an output and
    /// drive it to its initial value.
    ///
    /// `resolution` is the top of the PWM drive range (`255` for 8-bit PWM).
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Validation`] for duplicate ids, buttons or pins,
    /// or a zero resolution; [`PanelError::Driver`] if a pin cannot be set up.
    pub fn new(driver: D, resolution: u16, declarations: Declarations) -> Result<Self, PanelError> {
        if resolution == 0 {
            return Err(ValidationError::ZeroResolution.into());
        }

        declarations.validate()?;
        let Declarations {
            modes,
            toggles,
            analog,
            variables,
        } = declarations;

        let buttons = modes
            .iter()
            .flat_map(|mode| {
                let key = EntityKey::Mode(mode.token.clone());
                [(&mode.high, Level::High), (&mode.low, Level::Low)].map(|(binding, level)| {
                    let target = ButtonTarget {
                        mode: key.clone(),
                        level,
                    };
                    (binding.button.clone(), target)
                })
            })
            .collect();

        let entities: IndexMap<EntityKey, ControllableEntity> = modes
            .into_iter()
            .map(ControllableEntity::from)
            .chain(toggles.into_iter().map(ControllableEntity::from))
            .chain(analog.into_iter().map(ControllableEntity::from))
            .chain(variables.into_iter().map(ControllableEntity::from))
            .map(|entity| (entity.key(), entity))
            .collect();

        let registry = Self {
            driver,
            resolution,
            buttons,
            entities: Mutex::new(entities),
        };
        registry.initialise_outputs()?;
        Ok(registry)
    }

    fn initialise_outputs(&self) -> Result<(), PanelError> {
        let guard = self.lock();
        for entity in guard.iter() {
            if let Some(pin) = entity.pin() {
                self.driver.configure_output(pin)?;
                drive(&self.driver, self.resolution, entity)?;
                tracing::debug!(pin, kind = %entity.kind(), id = %entity.key(), "output initialised");
            }
        }
        Ok(())
    }

    /// Take exclusive access to the entity table.
    ///
    /// Hold the guard across "mutate then report" so that feedback frames
    /// leave in the same order as the commits they describe.
    pub fn lock(&self) -> RegistryGuard<'_, D> {
        RegistryGuard {
            driver: &self.driver,
            resolution: self.resolution,
            entities: self
                .entities
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Resolve a button token against the static button table.
    #[must_use]
    pub fn button(&self, button: &str) -> Option<&ButtonTarget> {
        self.buttons.get(button)
    }

    /// Clone the current state of one entity.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::UnknownEntity`] if `key` was never declared.
    pub fn get(&self, key: &EntityKey) -> Result<ControllableEntity, PanelError> {
        self.lock().get(key).cloned()
    }

    /// Apply `raw` to one entity; see [`RegistryGuard::set`].
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::UnknownEntity`] or [`PanelError::Driver`].
    pub fn set(&self, key: &EntityKey, raw: i64) -> Result<i64, PanelError> {
        self.lock().set(key, raw)
    }

    /// Clone every entity, in full-sync order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ControllableEntity> {
        self.lock().iter().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exclusive view of the entity table, obtained from [`OutputRegistry::lock`].
pub struct RegistryGuard<'a, D> {
    driver: &'a D,
    resolution: u16,
    entities: MutexGuard<'a, IndexMap<EntityKey, ControllableEntity>>,
}

impl<D: OutputDriver> RegistryGuard<'_, D> {
    /// # Errors
    ///
    /// Returns [`PanelError::UnknownEntity`] if `key` was never declared.
    pub fn get(&self, key: &EntityKey) -> Result<&ControllableEntity, PanelError> {
        self.entities.get(key).ok_or_else(|| unknown(key))
    }

    /// Every entity, in full-sync order.
    pub fn iter(&self) -> impl Iterator<Item = &ControllableEntity> {
        self.entities.values()
    }

    /// Apply `raw` with the entity's own semantics and return the previous
    /// value (`0`/`1` for binary entities):
    ///
    /// - toggle: `raw` is ignored, the level flips
    /// - binary mode: non-zero drives high, zero drives low
    /// - analog channel: `raw` is clamped into the declared range
    /// - named variable: `raw` is stored verbatim
    ///
    /// The pin is written before the new value is committed; if the driver
    /// fails, the registry keeps the old value.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::UnknownEntity`] if `key` was never declared, or
    /// [`PanelError::Driver`] if the pin write fails.
    pub fn set(&mut self, key: &EntityKey, raw: i64) -> Result<i64, PanelError> {
        let slot = self.entities.get_mut(key).ok_or_else(|| unknown(key))?;
        let mut next = slot.clone();
        let previous = apply(&mut next, raw);
        drive(self.driver, self.resolution, &next)?;
        *slot = next;
        Ok(previous)
    }
}

fn apply(entity: &mut ControllableEntity, raw: i64) -> i64 {
    match entity {
        ControllableEntity::Toggle(toggle) => {
            let previous = toggle.level;
            toggle.level = previous.flipped();
            level_value(previous)
        }
        ControllableEntity::Mode(mode) => {
            let previous = mode.level;
            mode.level = Level::from(raw != 0);
            level_value(previous)
        }
        ControllableEntity::Analog(analog) => {
            let previous = analog.value();
            analog.set_value(raw);
            previous
        }
        ControllableEntity::Variable(variable) => std::mem::replace(&mut variable.value, raw),
    }
}

fn drive<D: OutputDriver>(
    driver: &D,
    resolution: u16,
    entity: &ControllableEntity,
) -> Result<(), DriverError> {
    match entity {
        ControllableEntity::Mode(mode) => driver.write_digital(mode.pin, mode.level),
        ControllableEntity::Toggle(toggle) => driver.write_digital(toggle.channel, toggle.level),
        ControllableEntity::Analog(analog) => {
            driver.write_analog(analog.channel, analog.drive(resolution))
        }
        ControllableEntity::Variable(_) => Ok(()),
    }
}

fn level_value(level: Level) -> i64 {
    i64::from(level.is_high())
}

fn unknown(key: &EntityKey) -> PanelError {
    UnknownEntityError {
        kind: key.kind(),
        id: key.to_string(),
    }
    .into()
}
