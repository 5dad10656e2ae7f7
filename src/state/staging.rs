/// Optimistic photo preview for the open form dialog
///
/// A picked file is decoded off the UI thread into a small RGBA thumbnail.
/// The preview is never persisted: it is dropped when the dialog closes,
/// whatever the outcome. Every `stage` hands out a ticket; a decode that
/// finishes after a newer stage or a `clear` is discarded.

use iced::widget::image::Handle;
use image::imageops::FilterType;
use tokio::task;

use crate::api::ImageUpload;
use crate::error::{ClientError, ClientResult};

/// Longest edge of the displayed preview
const PREVIEW_SIZE: u32 = 256;

/// A decoded photo waiting to be submitted with the form
#[derive(Debug, Clone)]
pub struct ImagePreview {
    /// The original file, sent as-is on submit
    pub upload: ImageUpload,
    /// Dimensions of the original image
    pub width: u32,
    pub height: u32,
    /// Thumbnail pixels, built once so every redraw reuses the same image
    pub handle: Handle,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
}

/// Identifies one stage request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTicket(u64);

#[derive(Debug, Default)]
pub struct ImageStagingBuffer {
    preview: Option<ImagePreview>,
    /// Bumped by every stage and clear; only the latest ticket may land
    generation: u64,
    decoding: bool,
}

impl ImageStagingBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn preview(&self) -> Option<&ImagePreview> {
        self.preview.as_ref()
    }

    pub fn is_decoding(&self) -> bool {
        self.decoding
    }

    /// Start staging a new file; the caller runs `decode_preview` and hands the result to `accept`
    pub fn stage(&mut self) -> StageTicket {
        self.generation += 1;
        self.decoding = true;
        StageTicket(self.generation)
    }

    /// Apply a finished decode.
    ///
    /// Returns `Ok(false)` when the ticket is stale and the result was dropped.
    /// A failed decode keeps whatever preview was there before.
    pub fn accept(
        &mut self,
        ticket: StageTicket,
        result: ClientResult<ImagePreview>,
    ) -> ClientResult<bool> {
        if ticket.0 != self.generation {
            tracing::debug!(ticket = ticket.0, current = self.generation, "discarding stale image preview");
            return Ok(false);
        }
        self.decoding = false;

        match result {
            Ok(preview) => {
                tracing::info!(
                    file = %preview.upload.file_name,
                    width = preview.width,
                    height = preview.height,
                    "image preview staged"
                );
                self.preview = Some(preview);
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(error = %e, "image preview failed, keeping previous preview");
                Err(e)
            }
        }
    }

    /// Drop the preview and invalidate any decode still running
    pub fn clear(&mut self) {
        self.generation += 1;
        self.decoding = false;
        self.preview = None;
    }

    /// The file to attach to the next submit
    pub fn upload(&self) -> Option<&ImageUpload> {
        self.preview.as_ref().map(|p| &p.upload)
    }
}

/// Decode a picked file into a preview without blocking the UI
pub async fn decode_preview(file_name: String, bytes: Vec<u8>) -> ClientResult<ImagePreview> {
    // Spawn blocking because image decoding is CPU-bound
    task::spawn_blocking(move || decode_preview_blocking(file_name, bytes))
        .await
        .map_err(|e| ClientError::Image(format!("decode task failed: {e}")))?
}

/// Blocking version of preview decoding
fn decode_preview_blocking(file_name: String, bytes: Vec<u8>) -> ClientResult<ImagePreview> {
    let format = image::guess_format(&bytes)
        .map_err(|e| ClientError::Image(format!("{file_name}: {e}")))?;
    let img = image::load_from_memory_with_format(&bytes, format)
        .map_err(|e| ClientError::Image(format!("{file_name}: {e}")))?;

    let (width, height) = (img.width(), img.height());
    let thumbnail = if width > PREVIEW_SIZE || height > PREVIEW_SIZE {
        img.resize(PREVIEW_SIZE, PREVIEW_SIZE, FilterType::Triangle)
    } else {
        img
    }
    .to_rgba8();
    let (thumbnail_width, thumbnail_height) = thumbnail.dimensions();

    Ok(ImagePreview {
        upload: ImageUpload {
            file_name,
            mime: format.to_mime_type().to_string(),
            bytes,
        },
        width,
        height,
        handle: Handle::from_rgba(thumbnail_width, thumbnail_height, thumbnail.into_raw()),
        thumbnail_width,
        thumbnail_height,
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use image::{DynamicImage, ImageFormat, RgbaImage};
    use std::io::Cursor;

    /// A solid-colour PNG of the given size
    pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, image::Rgba([200, 40, 40, 255])));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::png_bytes;
    use super::*;

    #[tokio::test]
    async fn test_decode_small_png() {
        let preview = decode_preview("dot.png".to_string(), png_bytes(4, 3)).await.unwrap();

        assert_eq!((preview.width, preview.height), (4, 3));
        assert_eq!((preview.thumbnail_width, preview.thumbnail_height), (4, 3));
        assert_eq!(preview.upload.mime, "image/png");
        assert_eq!(preview.upload.file_name, "dot.png");
    }

    #[tokio::test]
    async fn test_decode_large_png_is_downscaled() {
        let preview = decode_preview("wide.png".to_string(), png_bytes(1024, 512)).await.unwrap();

        assert_eq!((preview.width, preview.height), (1024, 512));
        assert_eq!((preview.thumbnail_width, preview.thumbnail_height), (256, 128));
    }

    #[tokio::test]
    async fn test_decode_garbage_fails() {
        let result = decode_preview("notes.txt".to_string(), b"hello".to_vec()).await;
        assert!(matches!(result, Err(ClientError::Image(_))));
    }

    #[tokio::test]
    async fn test_failed_decode_keeps_previous_preview() {
        let mut buffer = ImageStagingBuffer::new();
        let first = buffer.stage();
        let ok = decode_preview("a.png".to_string(), png_bytes(2, 2)).await;
        assert_eq!(buffer.accept(first, ok), Ok(true));

        let second = buffer.stage();
        let bad = decode_preview("b.png".to_string(), b"nope".to_vec()).await;
        assert!(buffer.accept(second, bad).is_err());

        assert_eq!(buffer.upload().map(|u| u.file_name.as_str()), Some("a.png"));
        assert!(!buffer.is_decoding());
    }

    #[tokio::test]
    async fn test_late_result_after_clear_is_discarded() {
        let mut buffer = ImageStagingBuffer::new();
        let ticket = buffer.stage();
        assert!(buffer.is_decoding());

        buffer.clear();
        let late = decode_preview("late.png".to_string(), png_bytes(2, 2)).await;

        assert_eq!(buffer.accept(ticket, late), Ok(false));
        assert!(buffer.preview().is_none());
    }

    #[tokio::test]
    async fn test_older_stage_cannot_overwrite_newer() {
        let mut buffer = ImageStagingBuffer::new();
        let older = buffer.stage();
        let newer = buffer.stage();

        let newer_result = decode_preview("new.png".to_string(), png_bytes(2, 2)).await;
        let older_result = decode_preview("old.png".to_string(), png_bytes(2, 2)).await;
        assert_eq!(buffer.accept(newer, newer_result), Ok(true));
        assert_eq!(buffer.accept(older, older_result), Ok(false));

        assert_eq!(buffer.upload().map(|u| u.file_name.as_str()), Some("new.png"));
    }
}
