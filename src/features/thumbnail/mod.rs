//! # Thumbnail Producer
//!
//! Resizes a downloaded image to a fixed width, keeping its aspect ratio.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

use image::imageops::FilterType;
use image::{ImageFormat, ImageReader};
use log::debug;
use std::path::{Path, PathBuf};

use crate::core::error::{ChatError, Result};
use crate::core::file_utils::thumbnail_path_for;

/// Thumbnail width in pixels
pub const THUMBNAIL_WIDTH: u32 = 400;

/// Height that keeps the aspect ratio at [`THUMBNAIL_WIDTH`], never below 1
pub fn scaled_height(width: u32, height: u32) -> u32 {
    if width == 0 {
        return 1;
    }
    let scaled = (f64::from(THUMBNAIL_WIDTH) * f64::from(height) / f64::from(width)).round();
    (scaled as u32).max(1)
}

/// Write a resized PNG copy of `full_path` to `<stem>-small.png` beside it
///
/// The input may be any decodable format; the thumbnail is always PNG.
pub async fn create_thumbnail(full_path: &Path) -> Result<PathBuf> {
    let source = full_path.to_path_buf();
    tokio::task::spawn_blocking(move || resize_file(&source))
        .await
        .map_err(|e| ChatError::Io(std::io::Error::other(e)))?
}

fn resize_file(full_path: &Path) -> Result<PathBuf> {
    let img = ImageReader::open(full_path)?
        .with_guessed_format()?
        .decode()?;

    let height = scaled_height(img.width(), img.height());
    debug!(
        "Resizing {}x{} to {THUMBNAIL_WIDTH}x{height}",
        img.width(),
        img.height()
    );
    let small = img.resize_exact(THUMBNAIL_WIDTH, height, FilterType::Lanczos3);

    let out = thumbnail_path_for(full_path);
    small.save_with_format(&out, ImageFormat::Png)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    fn write_png(path: &Path, width: u32, height: u32) {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
        });
        img.save_with_format(path, ImageFormat::Png).unwrap();
    }

    #[test]
    fn test_scaled_height() {
        assert_eq!(scaled_height(1024, 1024), 400);
        assert_eq!(scaled_height(1792, 1024), 229);
        assert_eq!(scaled_height(1024, 1792), 700);
        assert_eq!(scaled_height(3000, 1), 1);
    }

    #[tokio::test]
    async fn test_square_thumbnail() {
        let dir = tempfile::tempdir().unwrap();
        let full = dir.path().join("abc.png");
        write_png(&full, 1024, 1024);

        let small = create_thumbnail(&full).await.unwrap();

        assert_eq!(small, dir.path().join("abc-small.png"));
        let (w, h) = image::image_dimensions(&small).unwrap();
        assert_eq!((w, h), (400, 400));
    }

    #[tokio::test]
    async fn test_wide_thumbnail_keeps_aspect() {
        let dir = tempfile::tempdir().unwrap();
        let full = dir.path().join("wide.png");
        write_png(&full, 1000, 300);

        let small = create_thumbnail(&full).await.unwrap();

        let (w, h) = image::image_dimensions(&small).unwrap();
        assert_eq!(w, 400);
        assert_eq!(h, 120);
    }

    #[tokio::test]
    async fn test_jpeg_download_gets_png_thumbnail() {
        let dir = tempfile::tempdir().unwrap();
        let full = dir.path().join("abc.png");
        let img = ImageBuffer::from_pixel(1024, 1024, image::Rgb([30u8, 60, 90]));
        img.save_with_format(&full, ImageFormat::Jpeg).unwrap();

        let small = create_thumbnail(&full).await.unwrap();

        let bytes = std::fs::read(&small).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
        assert_eq!(image::image_dimensions(&small).unwrap(), (400, 400));
    }

    #[tokio::test]
    async fn test_undecodable_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        let full = dir.path().join("junk.png");
        std::fs::write(&full, b"definitely not an image").unwrap();

        let err = create_thumbnail(&full).await.unwrap_err();
        assert!(matches!(err, ChatError::Image(_)));
        assert!(!dir.path().join("junk-small.png").exists());
    }
}
