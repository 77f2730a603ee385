//! Error taxonomy for a single chat turn
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Untyped language model failures get their own variant
//! - 1.0.0: Initial creation with credential, model, download and image errors

use thiserror::Error;

use crate::features::credentials::CredentialKind;

pub type Result<T> = std::result::Result<T, ChatError>;

/// Every failure is terminal for the current turn; nothing here is retried.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The user declined to enter an API key
    #[error("Missing {0} API key")]
    MissingCredential(CredentialKind),

    /// No language model of the required family is available
    #[error("No language model available for family '{0}'")]
    NoModelAvailable(String),

    /// The turn was cancelled while the prompt was being rewritten
    #[error("Request cancelled")]
    Cancelled,

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Too many redirects (limit {limit}) while fetching {url}")]
    TooManyRedirects { url: String, limit: usize },

    /// Upstream returned a non-success status
    #[error("Provider API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The language model failed without an HTTP status to report
    #[error("Language model error: {0}")]
    Model(String),

    /// Image endpoint answered without a usable URL
    #[error("Image generation response contained no image URL")]
    EmptyImageResponse,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing failed: {0}")]
    Image(#[from] image::ImageError),
}

impl ChatError {
    /// Whether this error should end the turn without anything shown to the user
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::NoModelAvailable(_) | Self::Cancelled)
    }
}
