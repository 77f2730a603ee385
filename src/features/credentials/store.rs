//! API key resolution and persistence
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Secret slot, config fallback and prompt-and-persist lookup

use anyhow::Result;
use log::{debug, info};
use secrecy::SecretString;
use std::fmt;
use std::sync::Arc;

use crate::host::{InputBoxOptions, InputPrompt, SecretStorage};

/// Which provider a key authenticates against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKind {
    Direct,
    EnterpriseGateway,
}

impl CredentialKind {
    /// Slot name in the secret store
    pub fn secret_key(&self) -> &'static str {
        match self {
            CredentialKind::Direct => "openai.aiKey",
            CredentialKind::EnterpriseGateway => "azure.openai.aiKey",
        }
    }

    fn input_box(&self) -> InputBoxOptions {
        match self {
            CredentialKind::Direct => InputBoxOptions {
                placeholder: "Enter your OpenAI API key".to_string(),
                prompt: "You can create an API key at https://platform.openai.com/api-keys"
                    .to_string(),
                password: true,
            },
            CredentialKind::EnterpriseGateway => InputBoxOptions {
                placeholder: "Enter your Azure OpenAI API key".to_string(),
                prompt: "This can be found in your Azure portal".to_string(),
                password: true,
            },
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialKind::Direct => write!(f, "OpenAI"),
            CredentialKind::EnterpriseGateway => write!(f, "Azure OpenAI"),
        }
    }
}

#[derive(Clone)]
pub struct CredentialStore {
    secrets: Arc<dyn SecretStorage>,
    input: Arc<dyn InputPrompt>,
    /// Configured Azure key, consulted for the gateway kind only
    configured_gateway_key: Option<String>,
}

impl CredentialStore {
    pub fn new(
        secrets: Arc<dyn SecretStorage>,
        input: Arc<dyn InputPrompt>,
        configured_gateway_key: Option<String>,
    ) -> Self {
        Self {
            secrets,
            input,
            configured_gateway_key,
        }
    }

    /// Look up a key, prompting for and persisting a new one if none is known.
    ///
    /// Returns `Ok(None)` when the user declines to enter a key.
    pub async fn resolve(&self, kind: CredentialKind) -> Result<Option<SecretString>> {
        let stored = non_empty(self.secrets.get(kind.secret_key()).await?);
        if let Some(key) = stored {
            debug!("Using stored {kind} key");
            return Ok(Some(SecretString::from(key)));
        }

        if kind == CredentialKind::EnterpriseGateway {
            if let Some(key) = non_empty(self.configured_gateway_key.clone()) {
                debug!("Using configured {kind} key");
                return Ok(Some(SecretString::from(key)));
            }
        }

        let entered = non_empty(self.input.show_input_box(kind.input_box()).await?);
        match entered {
            Some(key) => {
                self.secrets.store(kind.secret_key(), &key).await?;
                info!("Saved new {kind} key to secret storage");
                Ok(Some(SecretString::from(key)))
            }
            None => {
                info!("No {kind} key entered");
                Ok(None)
            }
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
