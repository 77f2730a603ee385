//! Per-participant handler implementations
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Add DalleHandler

pub mod dalle;

use std::sync::Arc;

use super::handler::ChatRequestHandler;

pub use dalle::{DalleHandler, DALLE_PARTICIPANT_ID};

/// Create all participant handlers
///
/// Returns a vector of handlers ready to be registered with ParticipantRegistry.
pub fn create_all_handlers() -> Vec<Arc<dyn ChatRequestHandler>> {
    vec![Arc::new(dalle::DalleHandler)]
}
