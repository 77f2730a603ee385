//! Shared context for participant handlers
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Initial implementation with credentials, models and image services

use anyhow::Result;
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;

use crate::core::config::Config;
use crate::core::file_utils::{default_artifact_dir, download_client};
use crate::features::credentials::CredentialStore;
use crate::features::image_gen::ImageGenerator;
use crate::features::prompt_rewriter::PromptRewriter;
use crate::host::{InputPrompt, LanguageModelCatalog, SecretStorage};

/// Shared context for all participant handlers
///
/// Contains the services a turn needs:
/// - Config for backend selection
/// - CredentialStore for API keys
/// - LanguageModelCatalog for prompt rewriting
/// - ImageGenerator for DALL-E calls
/// - A redirect-free client for image downloads
#[derive(Clone)]
pub struct HandlerContext {
    pub config: Arc<Config>,
    pub credentials: CredentialStore,
    pub models: Arc<dyn LanguageModelCatalog>,
    pub rewriter: PromptRewriter,
    pub image_generator: ImageGenerator,
    pub download_client: Client,
    /// Where image artifacts are written
    pub artifact_dir: PathBuf,
}

impl HandlerContext {
    /// Create a HandlerContext from host services
    pub fn new(
        config: Config,
        secrets: Arc<dyn SecretStorage>,
        input: Arc<dyn InputPrompt>,
        models: Arc<dyn LanguageModelCatalog>,
    ) -> Result<Self> {
        let credentials = CredentialStore::new(secrets, input, config.api_token.clone());
        Ok(Self {
            config: Arc::new(config),
            credentials,
            models,
            rewriter: PromptRewriter::new(),
            image_generator: ImageGenerator::new(Client::new()),
            download_client: download_client()?,
            artifact_dir: default_artifact_dir(),
        })
    }

    /// Write artifacts somewhere other than the OS temp directory
    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = dir.into();
        self
    }
}
