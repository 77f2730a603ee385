//! Chat participant registry
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Initial implementation for participant dispatch

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::handler::ChatRequestHandler;

/// A registered participant: its id, optional icon and handler
#[derive(Clone)]
pub struct ChatParticipant {
    id: &'static str,
    icon_path: Option<PathBuf>,
    handler: Arc<dyn ChatRequestHandler>,
}

impl ChatParticipant {
    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn icon_path(&self) -> Option<&Path> {
        self.icon_path.as_deref()
    }

    pub fn handler(&self) -> Arc<dyn ChatRequestHandler> {
        Arc::clone(&self.handler)
    }
}

/// Registry mapping participant ids to participants
///
/// A handler declaring several ids is registered once per id.
///
/// # Example
///
/// ```ignore
/// let mut registry = ParticipantRegistry::new();
/// registry.register(Arc::new(DalleHandler));
///
/// if let Some(participant) = registry.get("dalle.chat") {
///     participant.handler().handle(ctx, &request, &mut stream).await?;
/// }
/// ```
#[derive(Clone, Default)]
pub struct ParticipantRegistry {
    participants: HashMap<&'static str, ChatParticipant>,
}

impl ParticipantRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            participants: HashMap::new(),
        }
    }

    /// Register a handler for its declared participant ids
    pub fn register(&mut self, handler: Arc<dyn ChatRequestHandler>) {
        for &id in handler.participant_ids() {
            self.participants.insert(
                id,
                ChatParticipant {
                    id,
                    icon_path: None,
                    handler: Arc::clone(&handler),
                },
            );
        }
    }

    /// Attach an icon to a registered participant
    ///
    /// Returns false if no participant has that id.
    pub fn set_icon_path(&mut self, id: &str, icon: PathBuf) -> bool {
        match self.participants.get_mut(id) {
            Some(participant) => {
                participant.icon_path = Some(icon);
                true
            }
            None => false,
        }
    }

    /// Get a participant by id
    pub fn get(&self, id: &str) -> Option<&ChatParticipant> {
        self.participants.get(id)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Drop every participant
    pub fn clear(&mut self) {
        self.participants.clear();
    }

    /// Registered ids in sorted order
    pub fn participant_ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self.participants.values().map(ChatParticipant::id).collect();
        ids.sort_unstable();
        ids
    }
}
