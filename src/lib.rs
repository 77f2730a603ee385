// Core layer - config, errors, file helpers and reply rendering
pub mod core;

// Features layer - the stages of an image turn
pub mod features;

// Host layer - traits the chat surface implements, plus the terminal host
pub mod host;

// Application layer - participant registration and dispatch
pub mod participant;

pub use core::{ChatError, Config};

pub use features::{
    // Credentials
    CredentialKind, CredentialStore,
    // Image generation
    GeneratedImage, ImageBackend, ImageGenerator,
    // Prompt rewriting
    OpenAiChatModel, PromptRewriter,
};

pub use participant::{ChatRequest, ExtensionContext, HandlerContext, DALLE_PARTICIPANT_ID};
