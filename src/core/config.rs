//! Runtime configuration loaded from the environment
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Initial creation with Azure gateway, OpenAI and host settings

use anyhow::Result;
use std::path::PathBuf;

/// Default OpenAI API base URL
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default Azure OpenAI REST API version for image generation
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-02-01";

/// Default chat model used by the OpenAI-backed language model
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4";

#[derive(Debug, Clone)]
pub struct Config {
    /// Azure OpenAI endpoint; its presence selects the enterprise gateway backend
    pub azure_endpoint: Option<String>,
    pub deployment_name: Option<String>,
    /// Fallback Azure key when the secret store has none
    pub api_token: Option<String>,
    pub azure_api_version: String,
    pub openai_base_url: String,
    pub openai_chat_model: String,
    /// Key for the chat model; the secret store is used when unset
    pub openai_api_key: Option<String>,
    pub secrets_path: PathBuf,
    /// Root the participant icon is resolved against
    pub extension_path: PathBuf,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            azure_endpoint: env_opt("DALLE_CHAT_AZURE_ENDPOINT"),
            deployment_name: env_opt("DALLE_CHAT_DEPLOYMENT_NAME"),
            api_token: env_opt("DALLE_CHAT_API_TOKEN"),
            azure_api_version: env_opt("DALLE_CHAT_AZURE_API_VERSION")
                .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string()),
            openai_base_url: env_opt("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            openai_chat_model: env_opt("OPENAI_CHAT_MODEL")
                .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            openai_api_key: env_opt("OPENAI_API_KEY"),
            secrets_path: env_opt("DALLE_CHAT_SECRETS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(default_secrets_path),
            extension_path: match env_opt("DALLE_CHAT_EXTENSION_PATH") {
                Some(path) => PathBuf::from(path),
                None => std::env::current_dir()?,
            },
            log_level: env_opt("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Whether image generation should go through the Azure gateway
    pub fn uses_enterprise_gateway(&self) -> bool {
        self.azure_endpoint.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            azure_endpoint: None,
            deployment_name: None,
            api_token: None,
            azure_api_version: DEFAULT_AZURE_API_VERSION.to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            openai_chat_model: DEFAULT_CHAT_MODEL.to_string(),
            openai_api_key: None,
            secrets_path: default_secrets_path(),
            extension_path: PathBuf::from("."),
            log_level: "info".to_string(),
        }
    }
}

/// Read an environment variable, treating blank values as unset
fn env_opt(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn default_secrets_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("dalle-chat").join("secrets.json"))
        .unwrap_or_else(|| PathBuf::from(".dalle-chat-secrets.json"))
}
