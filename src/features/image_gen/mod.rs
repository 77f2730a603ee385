//! # Image Generation Feature
//!
//! DALL-E 3 powered image creation through OpenAI or an Azure OpenAI deployment.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod generator;

pub use generator::{GeneratedImage, ImageBackend, ImageGenerator};
