//! File utility functions for generated image artifacts
//!
//! Helpers for naming temp artifacts, downloading images with a bounded
//! redirect chain, and formatting sizes for logs.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Initial creation with artifact naming and streaming download

use futures::StreamExt;
use log::{debug, info, warn};
use reqwest::header::{HeaderMap, LOCATION};
use reqwest::{Client, StatusCode};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::core::error::{ChatError, Result};

// ============================================================================
// Constants
// ============================================================================

/// Subfolder of the OS temp directory holding downloaded images
pub const TEMP_SUBFOLDER: &str = "chat-agent-dalle";

/// Suffix of the full-size download
pub const FULL_SUFFIX: &str = ".png";

/// Suffix of the resized copy
pub const THUMBNAIL_SUFFIX: &str = "-small.png";

/// Maximum number of `Location` hops followed by [`download_file`]
pub const MAX_REDIRECTS: usize = 10;

/// Random bytes in an artifact name (hex-encoded to twice as many chars)
const NAME_BYTES: usize = 20;

// ============================================================================
// Types
// ============================================================================

/// Full-size and thumbnail paths sharing one random base name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageArtifact {
    pub base: PathBuf,
    pub full_path: PathBuf,
    pub thumbnail_path: PathBuf,
}

/// Default artifact directory: `<temp>/chat-agent-dalle/`
pub fn default_artifact_dir() -> PathBuf {
    std::env::temp_dir().join(TEMP_SUBFOLDER)
}

impl ImageArtifact {
    /// New artifact pair with a random hex name under `dir`
    pub fn new_in(dir: &Path) -> Self {
        let bytes: [u8; NAME_BYTES] = rand::random();
        Self::with_base(dir.join(hex::encode(bytes)))
    }

    fn with_base(base: PathBuf) -> Self {
        let full_path = with_suffix(&base, FULL_SUFFIX);
        let thumbnail_path = thumbnail_path_for(&full_path);
        Self {
            base,
            full_path,
            thumbnail_path,
        }
    }
}

/// Thumbnail path derived from a full-size path: `<stem>-small.png` beside it
pub fn thumbnail_path_for(full_path: &Path) -> PathBuf {
    let stem = full_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    full_path.with_file_name(format!("{stem}{THUMBNAIL_SUFFIX}"))
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut raw = base.as_os_str().to_owned();
    raw.push(suffix);
    PathBuf::from(raw)
}

// ============================================================================
// Download
// ============================================================================

/// Download `url` into `dest`, following up to [`MAX_REDIRECTS`] redirects.
///
/// `client` must not follow redirects itself; see [`download_client`].
/// Every hop is sent with the same `headers`. A 404 fails with
/// [`ChatError::NotFound`] before anything is written. The body is streamed to
/// disk chunk by chunk; a failed write leaves the partial file in place.
/// Returns the number of bytes written.
pub async fn download_file(
    client: &Client,
    url: &str,
    dest: &Path,
    headers: &HeaderMap,
) -> Result<u64> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).await?;
    }

    let mut current = url.to_string();
    let mut hops = 0;

    let response = loop {
        let response = match client.get(&current).headers(headers.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                if e.is_connect() || e.is_request() {
                    // Nothing was opened yet for a fresh destination
                    let _ = fs::remove_file(dest).await;
                }
                return Err(ChatError::Http(e));
            }
        };

        if let Some(location) = response.headers().get(LOCATION) {
            if hops == MAX_REDIRECTS {
                warn!("Giving up on {url} after {MAX_REDIRECTS} redirects");
                return Err(ChatError::TooManyRedirects {
                    url: url.to_string(),
                    limit: MAX_REDIRECTS,
                });
            }
            let location = location
                .to_str()
                .map_err(|e| ChatError::Config(format!("Invalid redirect location: {e}")))?;
            let next = resolve_location(&current, location)?;
            debug!("Following redirect to {next}");
            current = next;
            hops += 1;
            continue;
        }

        break response;
    };

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(ChatError::NotFound(current));
    }
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(ChatError::Api {
            status: status.as_u16(),
            message,
        });
    }

    let mut file = fs::File::create(dest).await?;
    let mut written: u64 = 0;
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    if written == 0 {
        warn!("Downloaded file is empty (0 bytes)");
    }
    info!(
        "Downloaded {} to {}",
        format_file_size(written),
        dest.display()
    );
    Ok(written)
}

/// HTTP client for [`download_file`]: no automatic redirects, no timeout
pub fn download_client() -> Result<Client> {
    Ok(Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()?)
}

/// Resolve a possibly relative `Location` value against the URL that sent it
fn resolve_location(current: &str, location: &str) -> Result<String> {
    let base = Url::parse(current)
        .map_err(|e| ChatError::Config(format!("Invalid URL {current}: {e}")))?;
    let next = base
        .join(location)
        .map_err(|e| ChatError::Config(format!("Invalid redirect location {location}: {e}")))?;
    Ok(next.into())
}

// ============================================================================
// Formatting
// ============================================================================

/// Format a byte count as a human-readable size
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

// ============================================================================
// Tests
// ============================================================================
