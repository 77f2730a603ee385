//! OpenAI-compatible streaming chat model
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Server-sent event streaming of chat completion deltas

use anyhow::Result;
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use log::{debug, error};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::core::error::ChatError;
use crate::host::{ChatMessage, LanguageModelChat, TextStream};

/// Chat model served by `/chat/completions` with `stream: true`
pub struct OpenAiChatModel {
    client: Client,
    base_url: String,
    model: String,
    family: String,
    api_key: SecretString,
}

impl OpenAiChatModel {
    pub fn new(client: Client, base_url: &str, model: &str, api_key: SecretString) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            family: family_of(model).to_string(),
            api_key,
        }
    }
}

/// Capability family of a model name; every `gpt-4*` variant counts as `gpt-4`
pub fn family_of(model: &str) -> &str {
    if model.starts_with("gpt-4") {
        "gpt-4"
    } else {
        model
    }
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Deserialize, Default)]
struct StreamDelta {
    content: Option<String>,
}

/// Text carried by one SSE `data:` payload, if any
fn chunk_text(data: &str) -> Option<String> {
    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => {
            let text: String = chunk
                .choices
                .into_iter()
                .filter_map(|c| c.delta.content)
                .collect();
            if text.is_empty() {
                None
            } else {
                Some(text)
            }
        }
        Err(e) => {
            debug!("Skipping unparseable SSE chunk: {e}");
            None
        }
    }
}

#[async_trait]
impl LanguageModelChat for OpenAiChatModel {
    fn id(&self) -> &str {
        &self.model
    }

    fn family(&self) -> &str {
        &self.family
    }

    async fn send_request(
        &self,
        messages: Vec<ChatMessage>,
        cancellation: CancellationToken,
    ) -> Result<TextStream> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = WireRequest {
            model: &self.model,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            stream: true,
        };

        debug!("Sending streaming chat request to {url} (model {})", self.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(ChatError::from)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("Chat completion returned {status}");
            return Err(ChatError::Api {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let fragments = response
            .bytes_stream()
            .eventsource()
            .take_while(|event| {
                let done = matches!(event, Ok(e) if e.data.trim() == "[DONE]");
                futures::future::ready(!done)
            })
            .filter_map(|event| {
                futures::future::ready(match event {
                    Ok(event) => chunk_text(event.data.trim()).map(Ok),
                    Err(e) => Some(Err(anyhow::anyhow!("Stream error: {e}"))),
                })
            })
            .take_until(cancellation.cancelled_owned());

        Ok(Box::pin(fragments))
    }
}
