//! # Features
//!
//! The stages of an image turn: credentials, prompt rewriting, image
//! generation and thumbnails.

pub mod credentials;
pub mod image_gen;
pub mod prompt_rewriter;
pub mod thumbnail;

pub use credentials::{CredentialKind, CredentialStore};
pub use image_gen::{GeneratedImage, ImageBackend, ImageGenerator};
pub use prompt_rewriter::{OpenAiChatModel, PromptRewriter};
pub use thumbnail::{create_thumbnail, THUMBNAIL_WIDTH};
