//! Phrase cleanup and streamed prompt rewriting
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Reference markup stripping, model selection and cancellable stream collection

use futures::StreamExt;
use log::{debug, info, warn};
use rand::seq::IndexedRandom;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tokio_util::sync::CancellationToken;

use crate::core::error::{ChatError, Result};
use crate::host::{ChatMessage, LanguageModelCatalog, LanguageModelChat};

/// Model family the rewrite request requires
pub const LANGUAGE_MODEL_FAMILY: &str = "gpt-4";

/// Used when the user sends an empty phrase
pub const DEFAULT_PHRASE: &str = "A photo of a bicyclist in Seattle carrying a laptop and writing code while simultaneously riding a bike.";

pub const REWRITE_INSTRUCTION: &str = "You write creative prompts for an AI image generator. The user will give a short phrase, and you must generate a prompt for DALL-E based on that phrase. Don't forget to include the art style for the image. For example, it could be an oil painting, a photograph, a cartoon, a charcoal drawing, or something else. Reply with the prompt and no other text.";

const PROGRESS_MESSAGES: &[&str] = &[
    "Sketching some ideas...",
    "Mixing the paints...",
    "Picking an art style...",
    "Consulting the muse...",
    "Sharpening the pencils...",
    "Stretching the canvas...",
];

/// Inline references such as `[#file:src/main.rs](values:file:src/main.rs)`
static REFERENCE_MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(^|\s)\[(#)([\w_\-]+)(:[\w_\-\.]+)?\]\(values:([\w_\-]+)(:[\w_\-\.]+)?\)")
        .expect("reference markup pattern is valid")
});

/// Remove every inline reference from a phrase, falling back to the default
/// phrase when nothing is left
pub fn strip_reference_markup(phrase: &str) -> String {
    let phrase = if phrase.trim().is_empty() {
        DEFAULT_PHRASE
    } else {
        phrase
    };

    REFERENCE_MARKUP.replace_all(phrase, "").into_owned()
}

/// A random line to show while the rewrite is running
pub fn progress_message() -> &'static str {
    PROGRESS_MESSAGES
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or("Working on it...")
}

/// Asks a language model for a richer image prompt
#[derive(Debug, Clone)]
pub struct PromptRewriter {
    family: String,
}

impl PromptRewriter {
    pub fn new() -> Self {
        Self::with_family(LANGUAGE_MODEL_FAMILY)
    }

    pub fn with_family(family: &str) -> Self {
        Self {
            family: family.to_string(),
        }
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    /// First available model of the configured family
    pub async fn select_model(
        &self,
        catalog: &dyn LanguageModelCatalog,
    ) -> Result<Arc<dyn LanguageModelChat>> {
        let models = catalog
            .select_chat_models(&self.family)
            .await
            .map_err(into_chat_error)?;

        match models.into_iter().next() {
            Some(model) => Ok(model),
            None => {
                warn!("No models available for family '{}'", self.family);
                Err(ChatError::NoModelAvailable(self.family.clone()))
            }
        }
    }

    /// Select a model and rewrite `phrase` with it
    pub async fn rewrite(
        &self,
        catalog: &dyn LanguageModelCatalog,
        phrase: &str,
        cancellation: &CancellationToken,
    ) -> Result<String> {
        let model = self.select_model(catalog).await?;
        self.rewrite_with(model.as_ref(), phrase, cancellation).await
    }

    /// Ask `model` for an image prompt based on `phrase`.
    ///
    /// The reply fragments are concatenated in arrival order. `cancellation`
    /// is checked before sending and between fragments.
    pub async fn rewrite_with(
        &self,
        model: &dyn LanguageModelChat,
        phrase: &str,
        cancellation: &CancellationToken,
    ) -> Result<String> {
        debug!("Rewriting prompt with model '{}'", model.id());

        let messages = vec![
            ChatMessage::system(REWRITE_INSTRUCTION),
            ChatMessage::user(phrase),
        ];

        if cancellation.is_cancelled() {
            return Err(ChatError::Cancelled);
        }

        let mut fragments = model
            .send_request(messages, cancellation.clone())
            .await
            .map_err(into_chat_error)?;

        let mut prompt = String::new();
        loop {
            tokio::select! {
                biased;
                _ = cancellation.cancelled() => {
                    info!("Prompt rewrite cancelled after {} chars", prompt.len());
                    return Err(ChatError::Cancelled);
                }
                next = fragments.next() => match next {
                    Some(fragment) => prompt.push_str(&fragment.map_err(into_chat_error)?),
                    None => break,
                },
            }
        }

        info!(
            "Rewritten prompt: '{}'",
            prompt.chars().take(100).collect::<String>()
        );
        Ok(prompt)
    }
}

impl Default for PromptRewriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Keep typed errors raised inside a model implementation, wrap anything else
fn into_chat_error(err: anyhow::Error) -> ChatError {
    match err.downcast::<ChatError>() {
        Ok(chat) => chat,
        Err(other) => ChatError::Model(format!("{other:#}")),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::host::{StaticModelCatalog, TextStream};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replies with a fixed list of fragments and records what it was sent
    pub(crate) struct CannedModel {
        pub(crate) fragments: Vec<&'static str>,
        pub(crate) sent: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl CannedModel {
        pub(crate) fn new(fragments: Vec<&'static str>) -> Self {
            Self {
                fragments,
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LanguageModelChat for CannedModel {
        fn id(&self) -> &str {
            "canned"
        }

        fn family(&self) -> &str {
            LANGUAGE_MODEL_FAMILY
        }

        async fn send_request(
            &self,
            messages: Vec<ChatMessage>,
            _cancellation: CancellationToken,
        ) -> anyhow::Result<TextStream> {
            self.sent.lock().unwrap().push(messages);
            let items: Vec<anyhow::Result<String>> =
                self.fragments.iter().map(|f| Ok(f.to_string())).collect();
            Ok(Box::pin(futures::stream::iter(items)))
        }
    }

    /// Yields one fragment, then never finishes
    struct StallingModel;

    #[async_trait]
    impl LanguageModelChat for StallingModel {
        fn id(&self) -> &str {
            "stalling"
        }

        fn family(&self) -> &str {
            LANGUAGE_MODEL_FAMILY
        }

        async fn send_request(
            &self,
            _messages: Vec<ChatMessage>,
            _cancellation: CancellationToken,
        ) -> anyhow::Result<TextStream> {
            let first = futures::stream::once(async { Ok("partial ".to_string()) });
            Ok(Box::pin(first.chain(futures::stream::pending())))
        }
    }

    /// Yields one fragment, then the given error
    struct BrokenModel {
        error: fn() -> anyhow::Error,
    }

    #[async_trait]
    impl LanguageModelChat for BrokenModel {
        fn id(&self) -> &str {
            "broken"
        }

        fn family(&self) -> &str {
            LANGUAGE_MODEL_FAMILY
        }

        async fn send_request(
            &self,
            _messages: Vec<ChatMessage>,
            _cancellation: CancellationToken,
        ) -> anyhow::Result<TextStream> {
            let items = vec![Ok("partial ".to_string()), Err((self.error)())];
            Ok(Box::pin(futures::stream::iter(items)))
        }
    }

    #[test]
    fn test_strip_single_reference() {
        assert_eq!(
            strip_reference_markup("a cat [#file:main.rs](values:file:main.rs) painting"),
            "a cat painting"
        );
    }

    #[test]
    fn test_strip_reference_at_start_and_case_insensitive() {
        assert_eq!(
            strip_reference_markup("[#Selection](VALUES:selection) sunset over hills"),
            " sunset over hills"
        );
    }

    #[test]
    fn test_strip_adjacent_references() {
        let phrase = "dog [#file:a.rs](values:file:a.rs) [#file:b.rs](values:file:b.rs) [#editor](values:editor)";
        let stripped = strip_reference_markup(phrase);
        assert_eq!(stripped, "dog");
        assert!(!stripped.contains("values:"));
    }

    #[test]
    fn test_plain_links_are_kept() {
        let phrase = "see [docs](https://example.com) for a dragon";
        assert_eq!(strip_reference_markup(phrase), phrase);
    }

    #[test]
    fn test_empty_phrase_uses_default() {
        assert_eq!(strip_reference_markup(""), DEFAULT_PHRASE);
        assert_eq!(strip_reference_markup("   "), DEFAULT_PHRASE);
    }

    #[test]
    fn test_progress_message_is_from_list() {
        assert!(PROGRESS_MESSAGES.contains(&progress_message()));
    }

    #[tokio::test]
    async fn test_rewrite_concatenates_fragments_in_order() {
        let model = Arc::new(CannedModel::new(vec!["A ", "cat ", "painting"]));
        let catalog = StaticModelCatalog::new(vec![model.clone()]);

        let prompt = PromptRewriter::new()
            .rewrite(&catalog, "cat", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(prompt, "A cat painting");

        let sent = model.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0][0], ChatMessage::system(REWRITE_INSTRUCTION));
        assert_eq!(sent[0][1], ChatMessage::user("cat"));
    }

    #[tokio::test]
    async fn test_rewrite_without_models_fails() {
        let catalog = StaticModelCatalog::default();

        let err = PromptRewriter::new()
            .rewrite(&catalog, "cat", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::NoModelAvailable(ref f) if f == "gpt-4"));
    }

    #[tokio::test]
    async fn test_rewrite_honours_cancellation_mid_stream() {
        let catalog = StaticModelCatalog::new(vec![Arc::new(StallingModel)]);
        let token = CancellationToken::new();

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let err = PromptRewriter::new()
            .rewrite(&catalog, "cat", &token)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Cancelled));
    }

    #[tokio::test]
    async fn test_rewrite_with_cancelled_token_sends_nothing() {
        let model = Arc::new(CannedModel::new(vec!["unused"]));
        let catalog = StaticModelCatalog::new(vec![model.clone()]);
        let token = CancellationToken::new();
        token.cancel();

        let err = PromptRewriter::new()
            .rewrite(&catalog, "cat", &token)
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::Cancelled));
        assert!(model.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_untyped_model_failure_is_a_model_error() {
        let model = BrokenModel {
            error: || anyhow::anyhow!("connection reset by peer"),
        };

        let err = PromptRewriter::new()
            .rewrite_with(&model, "cat", &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            ChatError::Model(message) => assert!(message.contains("connection reset")),
            other => panic!("expected Model error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_typed_model_failure_is_kept() {
        let model = BrokenModel {
            error: || {
                ChatError::Api {
                    status: 429,
                    message: "rate limited".into(),
                }
                .into()
            },
        };

        let err = PromptRewriter::new()
            .rewrite_with(&model, "cat", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::Api { status: 429, .. }));
    }
}
