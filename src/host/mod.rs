//! # Host Ports
//!
//! Traits describing what the hosting chat surface provides: secret storage,
//! an input box, language models and a response stream.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Initial creation with terminal host implementation

pub mod terminal;

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub use terminal::{
    next_prompt_event, FileSecretStorage, PromptEvent, StdoutResponseStream, TerminalInput,
};

/// Lazily produced text fragments of a model reply, consumed once in order
pub type TextStream = BoxStream<'static, Result<String>>;

/// Persistent, per-key secret storage owned by the host
#[async_trait]
pub trait SecretStorage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn store(&self, key: &str, value: &str) -> Result<()>;
}

/// Options for an interactive single-line prompt
#[derive(Debug, Clone, Default)]
pub struct InputBoxOptions {
    pub placeholder: String,
    pub prompt: String,
    pub password: bool,
}

/// Interactive input owned by the host
#[async_trait]
pub trait InputPrompt: Send + Sync {
    /// Returns `None` when the user dismisses the prompt
    async fn show_input_box(&self, options: InputBoxOptions) -> Result<Option<String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// A chat-capable language model exposed by the host
#[async_trait]
pub trait LanguageModelChat: Send + Sync {
    fn id(&self) -> &str;

    /// Capability family, e.g. `gpt-4`
    fn family(&self) -> &str;

    /// Send a conversation and receive the reply as a stream of text fragments
    async fn send_request(
        &self,
        messages: Vec<ChatMessage>,
        cancellation: CancellationToken,
    ) -> Result<TextStream>;
}

/// Host-side lookup of available language models
#[async_trait]
pub trait LanguageModelCatalog: Send + Sync {
    async fn select_chat_models(&self, family: &str) -> Result<Vec<Arc<dyn LanguageModelChat>>>;
}

/// A fixed set of models, filtered by family on selection
#[derive(Clone, Default)]
pub struct StaticModelCatalog {
    models: Vec<Arc<dyn LanguageModelChat>>,
}

impl StaticModelCatalog {
    pub fn new(models: Vec<Arc<dyn LanguageModelChat>>) -> Self {
        Self { models }
    }
}

#[async_trait]
impl LanguageModelCatalog for StaticModelCatalog {
    async fn select_chat_models(&self, family: &str) -> Result<Vec<Arc<dyn LanguageModelChat>>> {
        Ok(self
            .models
            .iter()
            .filter(|m| m.family() == family)
            .cloned()
            .collect())
    }
}

/// Sink for the fragments of one chat reply
pub trait ChatResponseStream: Send {
    /// Append a markdown fragment to the reply
    fn markdown(&mut self, text: &str);

    /// Show a transient progress line
    fn progress(&mut self, text: &str);
}
