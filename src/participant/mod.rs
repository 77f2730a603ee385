//! # Chat Participant System
//!
//! Participant registration and per-turn dispatch for the host chat surface.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod context;
pub mod extension;
pub mod handler;
pub mod handlers;
pub mod registry;

// Re-export handler infrastructure
pub use context::HandlerContext;
pub use extension::{ExtensionContext, PARTICIPANT_ICON};
pub use handler::{ChatRequest, ChatRequestHandler};
pub use handlers::{DalleHandler, DALLE_PARTICIPANT_ID};
pub use registry::{ChatParticipant, ParticipantRegistry};
