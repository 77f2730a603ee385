//! Process-wide extension state: activation, dispatch and teardown
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Initial implementation with icon attached at activation

use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::context::HandlerContext;
use super::handler::ChatRequest;
use super::handlers::{create_all_handlers, DALLE_PARTICIPANT_ID};
use super::registry::ParticipantRegistry;
use crate::host::ChatResponseStream;

/// Icon shown next to the image participant, relative to the extension root
pub const PARTICIPANT_ICON: &str = "images/dall-e.png";

/// Owns everything registered at activation until `deactivate`
pub struct ExtensionContext {
    extension_path: PathBuf,
    handler_ctx: Arc<HandlerContext>,
    registry: ParticipantRegistry,
}

impl ExtensionContext {
    /// Register every participant and attach the icon once
    pub fn activate(handler_ctx: HandlerContext) -> Self {
        let extension_path = handler_ctx.config.extension_path.clone();

        let mut registry = ParticipantRegistry::new();
        for handler in create_all_handlers() {
            registry.register(handler);
        }

        let icon = extension_path.join(PARTICIPANT_ICON);
        if !icon.exists() {
            warn!("Participant icon not found at {}", icon.display());
        }
        registry.set_icon_path(DALLE_PARTICIPANT_ID, icon);

        info!(
            "Activated {} participant(s): {}",
            registry.len(),
            registry.participant_ids().join(", ")
        );
        Self {
            extension_path,
            handler_ctx: Arc::new(handler_ctx),
            registry,
        }
    }

    pub fn extension_path(&self) -> &Path {
        &self.extension_path
    }

    pub fn registry(&self) -> &ParticipantRegistry {
        &self.registry
    }

    /// Route one turn to the participant registered under `participant_id`
    pub async fn dispatch(
        &self,
        participant_id: &str,
        request: &ChatRequest,
        response: &mut dyn ChatResponseStream,
    ) -> Result<()> {
        let participant = self
            .registry
            .get(participant_id)
            .ok_or_else(|| anyhow!("No chat participant registered as '{participant_id}'"))?;
        debug!("Dispatching turn to {}", participant.id());
        participant
            .handler()
            .handle(Arc::clone(&self.handler_ctx), request, response)
            .await
    }

    /// Drop all registrations
    pub fn deactivate(mut self) {
        self.registry.clear();
        info!("Deactivated chat participants");
    }
}
