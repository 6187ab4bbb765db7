//! # iopanel-domain
//!
//! Pure domain model for the iopanel network I/O controller.
//!
//! ## Responsibilities
//! - Define **Entities**: toggles, PWM analog channels, named control
//!   variables and button-driven binary modes
//! - Define the **engineering-unit ↔ drive-unit** mapping for analog channels
//! - Define the inbound **Command** grammar and its wire decoding
//! - Define **Feedback** frames and their wire encoding
//! - Contain all invariant enforcement (range clamping, declaration rules)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;

pub mod command;
pub mod entity;
pub mod feedback;
