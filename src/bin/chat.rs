use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info, warn};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use dalle_chat::core::Config;
use dalle_chat::features::{CredentialKind, CredentialStore, OpenAiChatModel};
use dalle_chat::host::{
    next_prompt_event, FileSecretStorage, LanguageModelChat, PromptEvent, StaticModelCatalog,
    StdoutResponseStream, TerminalInput,
};
use dalle_chat::participant::{ChatRequest, ExtensionContext, HandlerContext, DALLE_PARTICIPANT_ID};

/// Chat models offered to the participant: the OpenAI model when a key is known
async fn chat_models(
    config: &Config,
    credentials: &CredentialStore,
) -> Result<Vec<Arc<dyn LanguageModelChat>>> {
    let key = match &config.openai_api_key {
        Some(key) => Some(SecretString::from(key.clone())),
        None => credentials.resolve(CredentialKind::Direct).await?,
    };

    Ok(match key {
        Some(key) if !key.expose_secret().is_empty() => {
            info!("Chat model: {}", config.openai_chat_model);
            let model: Arc<dyn LanguageModelChat> = Arc::new(OpenAiChatModel::new(
                Client::new(),
                &config.openai_base_url,
                &config.openai_chat_model,
                key,
            ));
            vec![model]
        }
        _ => {
            warn!("No OpenAI key for the chat model - prompts cannot be rewritten");
            Vec::new()
        }
    })
}

fn print_prompt() {
    print!("\n@dalle > ");
    let _ = std::io::stdout().flush();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting dalle-chat...");

    let secrets = Arc::new(FileSecretStorage::new(config.secrets_path.clone()));
    let input = Arc::new(TerminalInput);
    info!("Secret store: {}", secrets.path().display());

    let credentials = CredentialStore::new(secrets.clone(), input.clone(), config.api_token.clone());
    let catalog = StaticModelCatalog::new(chat_models(&config, &credentials).await?);

    let handler_ctx = HandlerContext::new(config, secrets, input, Arc::new(catalog))?;
    let extension = ExtensionContext::activate(handler_ctx);

    eprintln!("Describe an image (Ctrl-C cancels a turn or quits at the prompt, 'exit' quits).");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print_prompt();
        let phrase = match next_prompt_event(&mut lines, tokio::signal::ctrl_c()).await? {
            PromptEvent::Phrase(phrase) => phrase,
            PromptEvent::Exit => break,
        };

        let cancellation = CancellationToken::new();
        let request = ChatRequest::with_cancellation(phrase, cancellation.clone());
        let mut stream = StdoutResponseStream::new();

        let turn = extension.dispatch(DALLE_PARTICIPANT_ID, &request, &mut stream);
        tokio::pin!(turn);
        let result = loop {
            tokio::select! {
                result = &mut turn => break result,
                _ = tokio::signal::ctrl_c() => {
                    info!("Cancelling current turn");
                    cancellation.cancel();
                }
            }
        };

        println!();
        if let Err(e) = result {
            error!("Turn failed: {e:#}");
            eprintln!("Error: {e}");
        }
    }

    extension.deactivate();
    info!("Goodbye");
    Ok(())
}
