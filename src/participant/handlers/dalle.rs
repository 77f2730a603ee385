//! Image generation participant handler
//!
//! Handles: dalle.chat
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Rewrite, generate, download, thumbnail and present in one turn

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::header::HeaderMap;
use std::sync::Arc;
use std::time::Instant;

use crate::core::error::ChatError;
use crate::core::file_utils::{download_file, ImageArtifact};
use crate::core::response::present_image;
use crate::features::image_gen::ImageBackend;
use crate::features::prompt_rewriter::{progress_message, strip_reference_markup};
use crate::features::thumbnail::create_thumbnail;
use crate::host::ChatResponseStream;
use crate::participant::context::HandlerContext;
use crate::participant::handler::{ChatRequest, ChatRequestHandler};

/// Participant id of the image generator
pub const DALLE_PARTICIPANT_ID: &str = "dalle.chat";

/// Handler for the DALL-E chat participant
pub struct DalleHandler;

#[async_trait]
impl ChatRequestHandler for DalleHandler {
    fn participant_ids(&self) -> &'static [&'static str] {
        &[DALLE_PARTICIPANT_ID]
    }

    async fn handle(
        &self,
        ctx: Arc<HandlerContext>,
        request: &ChatRequest,
        response: &mut dyn ChatResponseStream,
    ) -> Result<()> {
        let start_time = Instant::now();
        match self.generate(&ctx, request, response).await {
            Ok(()) => {
                info!("Image reply sent | Total time: {:?}", start_time.elapsed());
                Ok(())
            }
            Err(e) if e.is_silent() => {
                warn!("Turn ended without an image: {e}");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl DalleHandler {
    async fn generate(
        &self,
        ctx: &HandlerContext,
        request: &ChatRequest,
        response: &mut dyn ChatResponseStream,
    ) -> Result<(), ChatError> {
        let phrase = strip_reference_markup(&request.prompt);
        debug!(
            "Starting image turn | Phrase: '{}'",
            phrase.chars().take(100).collect::<String>()
        );

        let model = ctx.rewriter.select_model(ctx.models.as_ref()).await?;
        response.progress(progress_message());
        let prompt = ctx
            .rewriter
            .rewrite_with(model.as_ref(), &phrase, &request.cancellation)
            .await?;

        let kind = ImageBackend::credential_kind(&ctx.config);
        let api_key = ctx
            .credentials
            .resolve(kind)
            .await
            .map_err(|e| ChatError::Config(format!("Credential lookup failed: {e}")))?
            .ok_or(ChatError::MissingCredential(kind))?;
        let backend = ImageBackend::from_config(&ctx.config, api_key)?;

        let image = ctx.image_generator.generate_image(&backend, &prompt).await?;
        if let Some(revised) = &image.revised_prompt {
            debug!("{} revised the prompt to '{revised}'", backend.name());
        }

        let artifact = ImageArtifact::new_in(&ctx.artifact_dir);
        debug!("Downloading image to {}", artifact.full_path.display());
        download_file(
            &ctx.download_client,
            &image.url,
            &artifact.full_path,
            &HeaderMap::new(),
        )
        .await?;

        let thumbnail = create_thumbnail(&artifact.full_path).await?;
        present_image(response, &thumbnail, &image.url);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::core::response::tests::RecordingStream;
    use crate::features::credentials::store::tests::{MemorySecrets, ScriptedInput};
    use crate::features::prompt_rewriter::rewriter::tests::CannedModel;
    use crate::host::{SecretStorage, StaticModelCatalog};
    use image::{ImageBuffer, ImageFormat, Rgba};
    use std::io::Cursor;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    struct Fixture {
        ctx: Arc<HandlerContext>,
        secrets: Arc<MemorySecrets>,
        model: Arc<CannedModel>,
        _dir: tempfile::TempDir,
    }

    async fn fixture(
        server: &MockServer,
        stored_key: Option<&str>,
        typed_key: Option<&str>,
        with_model: bool,
    ) -> Fixture {
        let secrets = Arc::new(MemorySecrets::default());
        if let Some(key) = stored_key {
            secrets.store("openai.aiKey", key).await.unwrap();
        }
        let model = Arc::new(CannedModel::new(vec!["A ", "cat ", "painting"]));
        let catalog = if with_model {
            StaticModelCatalog::new(vec![model.clone()])
        } else {
            StaticModelCatalog::default()
        };
        let config = Config {
            openai_base_url: server.uri(),
            ..Config::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let ctx = HandlerContext::new(
            config,
            secrets.clone(),
            Arc::new(ScriptedInput::new(typed_key)),
            Arc::new(catalog),
        )
        .unwrap()
        .with_artifact_dir(dir.path());

        Fixture {
            ctx: Arc::new(ctx),
            secrets,
            model,
            _dir: dir,
        }
    }

    async fn mount_image_api(server: &MockServer, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path("/images/generations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "created": 1,
                "data": [{ "url": format!("{}/files/cat.png", server.uri()) }]
            })))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    #[test]
    fn test_dalle_handler_ids() {
        let handler = DalleHandler;
        assert_eq!(handler.participant_ids(), &["dalle.chat"]);
    }

    #[tokio::test]
    async fn test_full_turn_renders_thumbnail_and_link() {
        let server = MockServer::start().await;
        mount_image_api(&server, 1).await;
        Mock::given(method("GET"))
            .and(path("/files/cat.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes(1024, 1024)))
            .expect(1)
            .mount(&server)
            .await;

        let fx = fixture(&server, Some("sk-stored"), None, true).await;
        let mut stream = RecordingStream::default();

        DalleHandler
            .handle(fx.ctx.clone(), &ChatRequest::new("a cat"), &mut stream)
            .await
            .unwrap();

        assert_eq!(stream.progress.len(), 1);
        assert_eq!(stream.markdown.len(), 5);
        assert!(stream.markdown[0].starts_with("![image](file://"));
        assert!(stream.markdown[0].ends_with("-small.png)"));
        assert_eq!(
            stream.markdown[2],
            format!("[Full size]({}/files/cat.png)  ", server.uri())
        );
        assert_eq!(stream.markdown[4], "Have a great day!");

        // Exactly one artifact pair with a shared base name
        let mut names: Vec<String> = std::fs::read_dir(&fx.ctx.artifact_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names.len(), 2);
        let base = names[0].trim_end_matches(".png").trim_end_matches("-small");
        assert!(names.contains(&format!("{base}.png")));
        assert!(names.contains(&format!("{base}-small.png")));

        let requests = server.received_requests().await.unwrap();
        let image_call = requests
            .iter()
            .find(|r| r.url.path() == "/images/generations")
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&image_call.body).unwrap();
        assert_eq!(body["prompt"], "A cat painting");
    }

    #[tokio::test]
    async fn test_markup_is_stripped_before_rewrite() {
        let server = MockServer::start().await;
        let fx = fixture(&server, None, None, true).await;
        let mut stream = RecordingStream::default();

        let request = ChatRequest::new("a fox [#file:fox.rs](values:file:fox.rs) at dawn");
        let _ = DalleHandler.handle(fx.ctx.clone(), &request, &mut stream).await;

        let sent = fx.model.sent.lock().unwrap();
        assert_eq!(sent[0][1].content, "a fox at dawn");
    }

    #[tokio::test]
    async fn test_no_model_ends_silently_before_image_call() {
        let server = MockServer::start().await;
        mount_image_api(&server, 0).await;

        let fx = fixture(&server, Some("sk-stored"), None, false).await;
        let mut stream = RecordingStream::default();

        DalleHandler
            .handle(fx.ctx.clone(), &ChatRequest::new("a cat"), &mut stream)
            .await
            .unwrap();

        assert!(stream.markdown.is_empty());
        assert!(stream.progress.is_empty());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_declined_key_aborts_before_image_call() {
        let server = MockServer::start().await;
        mount_image_api(&server, 0).await;

        let fx = fixture(&server, None, None, true).await;
        let mut stream = RecordingStream::default();

        let err = DalleHandler
            .handle(fx.ctx.clone(), &ChatRequest::new("a cat"), &mut stream)
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ChatError>(),
            Some(ChatError::MissingCredential(_))
        ));
        assert_eq!(err.to_string(), "Missing OpenAI API key");
        assert!(stream.markdown.is_empty());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_typed_key_is_saved_for_next_turn() {
        let server = MockServer::start().await;
        mount_image_api(&server, 1).await;
        Mock::given(method("GET"))
            .and(path("/files/cat.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes(64, 32)))
            .mount(&server)
            .await;

        let fx = fixture(&server, None, Some("sk-typed"), true).await;
        let mut stream = RecordingStream::default();

        DalleHandler
            .handle(fx.ctx.clone(), &ChatRequest::new("a cat"), &mut stream)
            .await
            .unwrap();

        assert_eq!(
            fx.secrets.get("openai.aiKey").await.unwrap().as_deref(),
            Some("sk-typed")
        );
    }

    #[tokio::test]
    async fn test_download_not_found_is_an_error() {
        let server = MockServer::start().await;
        mount_image_api(&server, 1).await;
        Mock::given(method("GET"))
            .and(path("/files/cat.png"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fx = fixture(&server, Some("sk-stored"), None, true).await;
        let mut stream = RecordingStream::default();

        let err = DalleHandler
            .handle(fx.ctx.clone(), &ChatRequest::new("a cat"), &mut stream)
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ChatError>(),
            Some(ChatError::NotFound(_))
        ));
        assert!(stream.markdown.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_turn_skips_image_call() {
        let server = MockServer::start().await;
        mount_image_api(&server, 0).await;

        let fx = fixture(&server, Some("sk-stored"), None, true).await;
        let mut stream = RecordingStream::default();
        let request = ChatRequest::new("a cat");
        request.cancellation.cancel();

        DalleHandler
            .handle(fx.ctx.clone(), &request, &mut stream)
            .await
            .unwrap();

        assert!(stream.markdown.is_empty());
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
