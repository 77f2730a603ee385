//! Terminal implementations of the host ports
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Idle prompt that also ends on an interrupt
//! - 1.0.0: JSON file secret storage, dialoguer input box, stdout response stream

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncBufRead, Lines};
use tokio::sync::Mutex;

use super::{ChatResponseStream, InputBoxOptions, InputPrompt, SecretStorage};

/// Secret storage backed by a JSON map on disk, readable only by the owner
pub struct FileSecretStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSecretStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path).await {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("Corrupt secret store at {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, secrets: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let raw = serde_json::to_string_pretty(secrets)?;
        fs::write(&self.path, raw).await?;
        restrict_permissions(&self.path).await;
        Ok(())
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await {
        warn!("Could not restrict permissions on {}: {e}", path.display());
    }
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) {}

#[async_trait]
impl SecretStorage for FileSecretStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn store(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut secrets = self.load().await?;
        secrets.insert(key.to_string(), value.to_string());
        self.save(&secrets).await?;
        debug!("Stored secret '{key}' in {}", self.path.display());
        Ok(())
    }
}

/// Input box rendered on the controlling terminal
pub struct TerminalInput;

#[async_trait]
impl InputPrompt for TerminalInput {
    async fn show_input_box(&self, options: InputBoxOptions) -> Result<Option<String>> {
        let answer = tokio::task::spawn_blocking(move || -> Result<String> {
            if !options.prompt.is_empty() {
                eprintln!("{}", options.prompt);
            }
            let value = if options.password {
                dialoguer::Password::new()
                    .with_prompt(&options.placeholder)
                    .allow_empty_password(true)
                    .interact()?
            } else {
                dialoguer::Input::<String>::new()
                    .with_prompt(&options.placeholder)
                    .allow_empty(true)
                    .interact_text()?
            };
            Ok(value)
        })
        .await??;

        let answer = answer.trim().to_string();
        Ok(if answer.is_empty() { None } else { Some(answer) })
    }
}

/// Writes reply fragments straight to stdout
pub struct StdoutResponseStream {
    out: std::io::Stdout,
}

impl StdoutResponseStream {
    pub fn new() -> Self {
        Self {
            out: std::io::stdout(),
        }
    }
}

impl Default for StdoutResponseStream {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatResponseStream for StdoutResponseStream {
    fn markdown(&mut self, text: &str) {
        let mut out = self.out.lock();
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }

    fn progress(&mut self, text: &str) {
        eprintln!("… {text}");
    }
}

/// What the idle prompt produced
#[derive(Debug, PartialEq, Eq)]
pub enum PromptEvent {
    Phrase(String),
    Exit,
}

/// Wait for the next phrase, or for `interrupt` to fire while idle
///
/// EOF, `exit`, `quit` and the interrupt all end the session.
pub async fn next_prompt_event<R, F>(
    lines: &mut Lines<R>,
    interrupt: F,
) -> std::io::Result<PromptEvent>
where
    R: AsyncBufRead + Unpin,
    F: Future<Output = std::io::Result<()>>,
{
    tokio::select! {
        biased;
        signal = interrupt => {
            signal?;
            debug!("Interrupted at the idle prompt");
            Ok(PromptEvent::Exit)
        }
        line = lines.next_line() => Ok(match line? {
            None => PromptEvent::Exit,
            Some(line) => match line.trim() {
                "exit" | "quit" => PromptEvent::Exit,
                phrase => PromptEvent::Phrase(phrase.to_string()),
            },
        }),
    }
}
