//! Command interpreter: decode a frame, apply it and report the result.
//!
//! One inbound frame yields at most one command. Each command that commits a
//! change reports it with exactly one feedback frame; failures are logged and
//! swallowed, nothing is ever sent back for them.

use std::sync::Arc;

use iopanel_domain::command::Command;
use iopanel_domain::entity::EntityKey;
use iopanel_domain::error::PanelError;
use iopanel_domain::feedback::FeedbackMessage;

use crate::ports::{FeedbackPublisher, OutputDriver};
use crate::registry::{OutputRegistry, RegistryGuard};

/// Drives the [`OutputRegistry`] from client commands and publishes the
/// resulting feedback.
pub struct CommandInterpreter<D, P> {
    registry: Arc<OutputRegistry<D>>,
    publisher: P,
}

impl<D, P> CommandInterpreter<D, P>
where
    D: OutputDriver,
    P: FeedbackPublisher,
{
    pub fn new(registry: Arc<OutputRegistry<D>>, publisher: P) -> Self {
        Self {
            registry,
            publisher,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<OutputRegistry<D>> {
        &self.registry
    }

    /// Process one inbound frame and swallow any failure.
    ///
    /// This is the transport entry point: protocol errors are logged at
    /// `debug`, driver failures at `warn`.
    pub fn receive(&self, payload: &str) {
        match self.handle_message(payload) {
            Ok(frames) => tracing::trace!(frames, "command handled"),
            Err(PanelError::Driver(err)) => {
                tracing::warn!(error = %err, "output driver rejected write");
            }
            Err(err) => tracing::debug!(%err, payload, "inbound frame dropped"),
        }
    }

    /// Decode and execute one inbound frame.
    ///
    /// Returns the number of feedback frames published.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::MalformedMessage`] or
    /// [`PanelError::UnrecognizedCommand`] if the frame does not decode, and
    /// whatever [`Self::execute`] returns otherwise.
    pub fn handle_message(&self, payload: &str) -> Result<usize, PanelError> {
        let command = Command::decode(payload)?;
        self.execute(command)
    }

    /// Execute a decoded command.
    ///
    /// Returns the number of feedback frames published.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::UnknownEntity`] if the target is not declared and
    /// [`PanelError::Driver`] if the pin write fails. No feedback is published
    /// in either case.
    #[tracing::instrument(skip(self), level = "debug")]
    pub fn execute(&self, command: Command) -> Result<usize, PanelError> {
        match command {
            Command::RequestFullSync => Ok(self.full_sync()),
            Command::PressButton(button) => self.press_button(&button),
            Command::ToggleOutput(channel) => self.commit(&EntityKey::Toggle(channel), 0),
            Command::TuneAnalog { channel, value } => {
                self.commit(&EntityKey::Analog(channel), value)
            }
            Command::SetVariable { name, value } => self.commit(&EntityKey::Variable(name), value),
        }
    }

    fn full_sync(&self) -> usize {
        let guard = self.registry.lock();
        let mut frames = 0;
        for entity in guard.iter() {
            self.publisher.publish(&FeedbackMessage::encode(entity));
            frames += 1;
        }
        frames
    }

    fn press_button(&self, button: &str) -> Result<usize, PanelError> {
        let Some(target) = self.registry.button(button) else {
            // unmatched tokens are echoed back without touching the registry
            return Ok(match FeedbackMessage::button_echo(button) {
                Some(echo) => {
                    self.publisher.publish(&echo);
                    1
                }
                None => 0,
            });
        };
        let raw = i64::from(target.level.is_high());
        self.commit(&target.mode, raw)
    }

    fn commit(&self, key: &EntityKey, raw: i64) -> Result<usize, PanelError> {
        let mut guard = self.registry.lock();
        guard.set(key, raw)?;
        self.report(&guard, key)?;
        Ok(1)
    }

    // publishing under the registry lock keeps frame order equal to commit order
    fn report(&self, guard: &RegistryGuard<'_, D>, key: &EntityKey) -> Result<(), PanelError> {
        let entity = guard.get(key)?;
        self.publisher.publish(&FeedbackMessage::encode(entity));
        Ok(())
    }
}
