//! Chat request handler trait and per-turn request type
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Initial implementation for participant dispatch

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::context::HandlerContext;
use crate::host::ChatResponseStream;

/// One user turn addressed to a participant
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub prompt: String,
    pub cancellation: CancellationToken,
}

impl ChatRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(prompt: impl Into<String>, cancellation: CancellationToken) -> Self {
        Self {
            prompt: prompt.into(),
            cancellation,
        }
    }
}

/// Trait for chat participant handlers
///
/// Each handler answers the turns sent to one or more participant ids.
/// Handlers are registered with a ParticipantRegistry and dispatched by id.
///
/// # Example
///
/// ```ignore
/// pub struct EchoHandler;
///
/// #[async_trait]
/// impl ChatRequestHandler for EchoHandler {
///     fn participant_ids(&self) -> &'static [&'static str] {
///         &["echo"]
///     }
///
///     async fn handle(
///         &self,
///         ctx: Arc<HandlerContext>,
///         request: &ChatRequest,
///         response: &mut dyn ChatResponseStream,
///     ) -> Result<()> {
///         response.markdown(&request.prompt);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait ChatRequestHandler: Send + Sync {
    /// Participant id(s) this handler answers for
    fn participant_ids(&self) -> &'static [&'static str];

    /// Handle one turn
    ///
    /// # Arguments
    ///
    /// * `ctx` - Shared services: config, credentials, models, HTTP clients
    /// * `request` - The user's phrase and its cancellation token
    /// * `response` - Where reply fragments are written
    async fn handle(
        &self,
        ctx: Arc<HandlerContext>,
        request: &ChatRequest,
        response: &mut dyn ChatResponseStream,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test that the trait is object-safe (can be used with dyn)
    fn _assert_object_safe(_: &dyn ChatRequestHandler) {}

    #[test]
    fn test_request_new_is_not_cancelled() {
        let request = ChatRequest::new("a cat");
        assert_eq!(request.prompt, "a cat");
        assert!(!request.cancellation.is_cancelled());
    }
}
