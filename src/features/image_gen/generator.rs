//! DALL-E request building for the direct and Azure gateway backends
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Direct (dall-e-3, hd) and Azure deployment backends

use log::{debug, error, info};
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::core::config::Config;
use crate::core::error::{ChatError, Result};
use crate::features::credentials::CredentialKind;

/// Model requested from the direct backend
pub const DIRECT_MODEL: &str = "dall-e-3";

pub const IMAGE_SIZE: &str = "1024x1024";

pub const DIRECT_QUALITY: &str = "hd";

/// Where the image request goes, chosen once per call from configuration
#[derive(Debug, Clone)]
pub enum ImageBackend {
    Direct {
        base_url: String,
        api_key: SecretString,
    },
    EnterpriseGateway {
        endpoint: String,
        deployment: String,
        api_version: String,
        api_key: SecretString,
    },
}

impl ImageBackend {
    /// Credential kind needed for the backend this configuration selects
    pub fn credential_kind(config: &Config) -> CredentialKind {
        if config.uses_enterprise_gateway() {
            CredentialKind::EnterpriseGateway
        } else {
            CredentialKind::Direct
        }
    }

    /// Build the backend for `config` with an already resolved key
    pub fn from_config(config: &Config, api_key: SecretString) -> Result<Self> {
        if api_key.expose_secret().trim().is_empty() {
            return Err(ChatError::MissingCredential(Self::credential_kind(config)));
        }

        match &config.azure_endpoint {
            Some(endpoint) => {
                let deployment = config.deployment_name.clone().ok_or_else(|| {
                    ChatError::Config(
                        "DALLE_CHAT_DEPLOYMENT_NAME is required with an Azure endpoint".into(),
                    )
                })?;
                Ok(ImageBackend::EnterpriseGateway {
                    endpoint: endpoint.trim_end_matches('/').to_string(),
                    deployment,
                    api_version: config.azure_api_version.clone(),
                    api_key,
                })
            }
            None => Ok(ImageBackend::Direct {
                base_url: config.openai_base_url.trim_end_matches('/').to_string(),
                api_key,
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ImageBackend::Direct { .. } => "openai",
            ImageBackend::EnterpriseGateway { .. } => "azure",
        }
    }
}

#[derive(Serialize)]
struct DirectImageRequest<'a> {
    prompt: &'a str,
    model: &'a str,
    n: u32,
    size: &'a str,
    quality: &'a str,
}

#[derive(Serialize)]
struct GatewayImageRequest<'a> {
    prompt: &'a str,
    n: u32,
    size: &'a str,
}

#[derive(Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
struct ImageData {
    url: Option<String>,
    revised_prompt: Option<String>,
}

/// Result of a single image generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    /// Short-lived provider-hosted URL
    pub url: String,
    pub revised_prompt: Option<String>,
}

#[derive(Clone)]
pub struct ImageGenerator {
    client: Client,
}

impl ImageGenerator {
    pub fn new(client: Client) -> Self {
        ImageGenerator { client }
    }

    /// Generate one 1024x1024 image and return the URL of the first result
    pub async fn generate_image(
        &self,
        backend: &ImageBackend,
        prompt: &str,
    ) -> Result<GeneratedImage> {
        info!(
            "Generating image | Backend: {} | Prompt: '{}'",
            backend.name(),
            prompt.chars().take(100).collect::<String>()
        );

        let request = self.build_request(backend, prompt);
        let response = request.send().await.map_err(|e| {
            error!("Image generation request failed: {e}");
            ChatError::Http(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Image generation API error ({status}): {message}");
            return Err(ChatError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ImageResponse = response.json().await?;
        let first = body
            .data
            .into_iter()
            .next()
            .ok_or(ChatError::EmptyImageResponse)?;
        let url = first
            .url
            .filter(|u| !u.is_empty())
            .ok_or(ChatError::EmptyImageResponse)?;

        info!("Image generated: {url}");
        Ok(GeneratedImage {
            url,
            revised_prompt: first.revised_prompt,
        })
    }

    fn build_request(&self, backend: &ImageBackend, prompt: &str) -> RequestBuilder {
        match backend {
            ImageBackend::Direct { base_url, api_key } => {
                let url = format!("{base_url}/images/generations");
                debug!("POST {url} (model {DIRECT_MODEL})");
                self.client
                    .post(url)
                    .bearer_auth(api_key.expose_secret())
                    .json(&DirectImageRequest {
                        prompt,
                        model: DIRECT_MODEL,
                        n: 1,
                        size: IMAGE_SIZE,
                        quality: DIRECT_QUALITY,
                    })
            }
            ImageBackend::EnterpriseGateway {
                endpoint,
                deployment,
                api_version,
                api_key,
            } => {
                let url = format!("{endpoint}/openai/deployments/{deployment}/images/generations");
                debug!("POST {url} (api-version {api_version})");
                self.client
                    .post(url)
                    .query(&[("api-version", api_version.as_str())])
                    .header("api-key", api_key.expose_secret())
                    .json(&GatewayImageRequest {
                        prompt,
                        n: 1,
                        size: IMAGE_SIZE,
                    })
            }
        }
    }
}
