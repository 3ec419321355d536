//! Image decoding with content-based format detection.
//!
//! Uploaded bytes are decoded once to prove they are an image, then turned
//! into the inline payload the model accepts. Formats the model cannot take
//! inline are re-encoded to PNG from the decoded pixels.

use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;

use crate::error::{CaptionError, CaptionResult};
use crate::llm::ImageInput;

/// Result of decoding an uploaded image.
pub struct DecodedImage {
    /// The decoded image data
    pub image: DynamicImage,
    /// Detected image format
    pub format: ImageFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// The undecoded bytes
    pub bytes: Vec<u8>,
}

impl DecodedImage {
    /// Build the model payload, reusing the original bytes when possible.
    pub fn into_image_input(self) -> CaptionResult<ImageInput> {
        if let Some(media_type) = inline_media_type(self.format) {
            return Ok(ImageInput::from_bytes(&self.bytes, media_type));
        }

        tracing::debug!(
            "Re-encoding {} upload as PNG for the model",
            format_to_string(self.format)
        );
        let mut png = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| CaptionError::Encode {
                format: "png".to_string(),
                message: e.to_string(),
            })?;
        Ok(ImageInput::from_bytes(&png, "image/png"))
    }
}

/// Decode the bytes and build the model payload on a blocking thread.
pub async fn prepare_image(bytes: Vec<u8>) -> CaptionResult<ImageInput> {
    tokio::task::spawn_blocking(move || {
        let decoded = decode_sync(bytes)?;
        tracing::debug!(
            format = %format_to_string(decoded.format),
            width = decoded.width,
            height = decoded.height,
            "Decoded upload"
        );
        decoded.into_image_input()
    })
    .await
    .map_err(|e| CaptionError::Task(e.to_string()))?
}

/// Synchronous decode from bytes (runs in spawn_blocking).
pub fn decode_sync(bytes: Vec<u8>) -> CaptionResult<DecodedImage> {
    let reader = image::ImageReader::new(Cursor::new(bytes.as_slice()))
        .with_guessed_format()
        .map_err(|e| CaptionError::Decode(format!("cannot detect image format: {e}")))?;
    let format = reader
        .format()
        .ok_or_else(|| CaptionError::Decode("unrecognised image format".to_string()))?;
    let image = reader
        .decode()
        .map_err(|e| CaptionError::Decode(e.to_string()))?;

    let (width, height) = image.dimensions();
    Ok(DecodedImage {
        image,
        format,
        width,
        height,
        bytes,
    })
}

/// MIME type for formats the model accepts as inline data.
fn inline_media_type(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::Png => Some("image/png"),
        ImageFormat::WebP => Some("image/webp"),
        _ => None,
    }
}

/// Convert an ImageFormat to a string representation.
pub fn format_to_string(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "jpeg".to_string(),
        ImageFormat::Png => "png".to_string(),
        ImageFormat::WebP => "webp".to_string(),
        ImageFormat::Gif => "gif".to_string(),
        ImageFormat::Tiff => "tiff".to_string(),
        ImageFormat::Bmp => "bmp".to_string(),
        ImageFormat::Ico => "ico".to_string(),
        ImageFormat::Pnm => "pnm".to_string(),
        ImageFormat::Avif => "avif".to_string(),
        _ => "unknown".to_string(),
    }
}

/// Encode a small solid image in the given format. Shared by tests.
#[cfg(test)]
pub(crate) fn sample_image(format: ImageFormat) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        8,
        6,
        image::Rgb([200, 120, 40]),
    ));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), format)
        .unwrap();
    bytes
}
