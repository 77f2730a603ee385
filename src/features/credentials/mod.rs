//! # Credential Store
//!
//! Resolves OpenAI or Azure OpenAI API keys from the secret store, configuration
//! or an interactive prompt.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod store;

pub use store::{CredentialKind, CredentialStore};
