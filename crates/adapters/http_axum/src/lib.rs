//! # iopanel-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Terminate the **WebSocket sync protocol** at `/ws`: one observer per
//!   socket, inbound text frames go to the command interpreter, feedback
//!   frames go back out
//! - Serve **read-only observation surfaces**: a JSON snapshot of every
//!   entity (`/api/entities`) and an SSE feed of feedback frames
//!   (`/api/feedback/stream`)
//! - Render the **panel page** (`/`) with the current mode labels and serve
//!   the other static assets next to it
//!
//! ## Dependency rule
//! Depends on `iopanel-app` (for services and ports) and `iopanel-domain`
//! (for entity types used in responses). Never leaks axum types into the
//! domain.

pub mod api;
pub mod error;
pub mod page;
pub mod router;
pub mod state;
pub mod ws;
