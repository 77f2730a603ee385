//! # Core Module
//!
//! Configuration, error taxonomy, file helpers and reply rendering shared by
//! every feature.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod config;
pub mod error;
pub mod file_utils;
pub mod response;

// Re-export commonly used items
pub use config::Config;
pub use error::ChatError;
pub use file_utils::{
    default_artifact_dir, download_client, download_file, ImageArtifact, MAX_REDIRECTS,
};
pub use response::{present_image, CLOSING_REMARK};
