//! Chat reply rendering for generated images
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Thumbnail embed, full-size link and closing line

use std::path::Path;
use url::Url;

use crate::host::ChatResponseStream;

/// Last line of every image reply
pub const CLOSING_REMARK: &str = "Have a great day!";

/// `file://` URI for a local path
pub fn file_uri(path: &Path) -> String {
    match Url::from_file_path(path) {
        Ok(url) => url.to_string(),
        // Relative paths cannot become URLs; keep the raw form
        Err(()) => format!("file://{}", path.display()),
    }
}

/// Fragments of the reply, in emission order
pub fn image_reply_fragments(thumbnail: &Path, full_url: &str) -> Vec<String> {
    vec![
        format!("![image]({})", file_uri(thumbnail)),
        "\n".to_string(),
        format!("[Full size]({full_url})  "),
        "\n".to_string(),
        CLOSING_REMARK.to_string(),
    ]
}

/// Render the thumbnail embed, a link to the full-size image and a closing line
pub fn present_image(stream: &mut dyn ChatResponseStream, thumbnail: &Path, full_url: &str) {
    for fragment in image_reply_fragments(thumbnail, full_url) {
        stream.markdown(&fragment);
    }
}
