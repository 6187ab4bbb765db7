//! # iopanel-app
//!
//! Application layer: the state-synchronization core and its **port
//! definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `OutputDriver`: physical pin writes (GPIO, PWM)
//!   - `FeedbackPublisher`: fan-out of feedback frames to observers
//! - Own the **Output Registry**: canonical state of every declared entity
//! - Provide the **Observer hub**: the in-process broadcast channel and the
//!   single point of truth for which observers are connected
//! - Provide the driving use-cases:
//!   - `CommandInterpreter`: turns client frames into state changes and feedback
//!   - `ConnectionManager`: observer lifecycle and liveness sweep
//!
//! ## Dependency rule
//! Depends on `iopanel-domain` only (plus `tokio` for channels and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod observer_hub;
pub mod ports;
pub mod registry;
pub mod services;

#[cfg(test)]
mod testing;
