//! # Prompt Rewriter
//!
//! Turns a short phrase into a detailed, style-aware image prompt using a
//! streaming chat model.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod openai;
pub mod rewriter;

pub use openai::OpenAiChatModel;
pub use rewriter::{
    progress_message, strip_reference_markup, PromptRewriter, DEFAULT_PHRASE,
    LANGUAGE_MODEL_FAMILY, REWRITE_INSTRUCTION,
};
