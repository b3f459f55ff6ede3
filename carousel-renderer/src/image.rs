//! Image decoding utilities.
//!
//! Every image embedded in an export is decoded here and re-encoded as a
//! PNG data URI, so the rasterizer only ever sees one well-formed format.

use std::io::Cursor;

use base64::Engine;

use crate::error::{RenderError, RenderResult};

/// Largest side of a generated placeholder, in pixels.
pub const MAX_PLACEHOLDER_SIDE: u32 = 512;

/// Detected image container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// GIF (first frame is used).
    Gif,
    /// WebP (alpha support).
    WebP,
    /// Unknown/other format.
    Unknown,
}

impl ImageFormat {
    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.len() < 4 {
            return Self::Unknown;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Self::Png;
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Self::Jpeg;
        }

        // GIF: "GIF8"
        if data.starts_with(b"GIF8") {
            return Self::Gif;
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Self::WebP;
        }

        Self::Unknown
    }
}

/// A decoded image, ready to embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// PNG encoding of the image.
    pub png: Vec<u8>,
}

impl DecodedImage {
    /// The image as a `data:image/png;base64,` URI.
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.png)
        )
    }
}

/// Decode raw image bytes and re-encode them as PNG.
///
/// The container is detected from the bytes themselves, never from a file
/// name or a served MIME type. PNG input is kept as-is.
///
/// # Errors
///
/// Returns an error if the bytes are not a supported image.
pub fn decode_image(data: &[u8]) -> RenderResult<DecodedImage> {
    let img = image::load_from_memory(data)
        .map_err(|e| RenderError::Resource(format!("Failed to decode image: {e}")))?;
    let (width, height) = (img.width(), img.height());

    if ImageFormat::from_magic_bytes(data) == ImageFormat::Png {
        return Ok(DecodedImage {
            width,
            height,
            png: data.to_vec(),
        });
    }

    let mut png = Cursor::new(Vec::new());
    img.to_rgba8()
        .write_to(&mut png, image::ImageFormat::Png)
        .map_err(|e| RenderError::Resource(format!("Failed to re-encode image: {e}")))?;

    Ok(DecodedImage {
        width,
        height,
        png: png.into_inner(),
    })
}

/// Extract the payload of a data URI.
///
/// Supports formats like: `data:image/png;base64,iVBORw0KGgo...` and
/// percent-encoded payloads.
///
/// # Errors
///
/// Returns an error if the data URI is malformed.
pub fn data_uri_bytes(uri: &str) -> RenderResult<Vec<u8>> {
    let uri_data = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Resource("Not a data URI".to_string()))?;

    let (metadata, encoded_data) = uri_data
        .split_once(',')
        .ok_or_else(|| RenderError::Resource("Invalid data URI: missing comma".to_string()))?;

    if metadata.contains(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(encoded_data.trim())
            .map_err(|e| RenderError::Resource(format!("Failed to decode base64: {e}")))
    } else {
        percent_decode(encoded_data)
    }
}

/// Decode percent-encoded bytes.
fn percent_decode(input: &str) -> RenderResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = input
                .get(i + 1..i + 3)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| RenderError::Resource("Invalid URL encoding".to_string()))?;
            result.push(byte);
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }

    Ok(result)
}

/// Create a checkerboard placeholder, capped at [`MAX_PLACEHOLDER_SIDE`].
///
/// # Errors
///
/// Returns an error if PNG encoding fails.
pub fn create_placeholder(width: u32, height: u32) -> RenderResult<DecodedImage> {
    let width = width.clamp(1, MAX_PLACEHOLDER_SIDE);
    let height = height.clamp(1, MAX_PLACEHOLDER_SIDE);
    let cell_size = 16u32;

    let img = image::RgbaImage::from_fn(width, height, |x, y| {
        if ((x / cell_size) + (y / cell_size)) % 2 == 0 {
            image::Rgba([200, 200, 200, 255])
        } else {
            image::Rgba([150, 150, 150, 255])
        }
    });

    let mut png = Cursor::new(Vec::new());
    img.write_to(&mut png, image::ImageFormat::Png)
        .map_err(|e| RenderError::Resource(format!("Failed to encode placeholder: {e}")))?;

    Ok(DecodedImage {
        width,
        height,
        png: png.into_inner(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A 1x1 red PNG.
    const RED_PIXEL_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    #[test]
    fn test_format_detection_from_magic_bytes() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
            ImageFormat::Png
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]),
            ImageFormat::Jpeg
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"GIF89a"), ImageFormat::Gif);
        assert_eq!(
            ImageFormat::from_magic_bytes(b"RIFF\x00\x00\x00\x00WEBP"),
            ImageFormat::WebP
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"ab"), ImageFormat::Unknown);
    }

    #[test]
    fn test_data_uri_decoding() {
        let uri = format!("data:image/png;base64,{RED_PIXEL_PNG}");
        let bytes = data_uri_bytes(&uri).expect("valid data URI");
        let image = decode_image(&bytes).expect("decodes");
        assert_eq!((image.width, image.height), (1, 1));
        assert_eq!(image.png, bytes);
        assert!(image.to_data_uri().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_gif_is_reencoded_as_png() {
        let mut gif = Cursor::new(Vec::new());
        image::RgbaImage::from_pixel(3, 2, image::Rgba([0, 128, 255, 255]))
            .write_to(&mut gif, image::ImageFormat::Gif)
            .expect("encode gif");
        let gif = gif.into_inner();

        let image = decode_image(&gif).expect("decodes");
        assert_eq!((image.width, image.height), (3, 2));
        assert_eq!(ImageFormat::from_magic_bytes(&image.png), ImageFormat::Png);
    }

    #[test]
    fn test_percent_encoded_data_uri() {
        let bytes = data_uri_bytes("data:text/plain,a%20b%2Cc").expect("decodes");
        assert_eq!(bytes, b"a b,c");
        assert!(data_uri_bytes("data:text/plain,bad%zz").is_err());
    }

    #[test]
    fn test_invalid_data_uri() {
        assert!(data_uri_bytes("not a data uri").is_err());
        assert!(data_uri_bytes("data:image/png").is_err());
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        assert!(matches!(
            decode_image(b"definitely not an image"),
            Err(RenderError::Resource(_))
        ));
    }

    #[test]
    fn test_placeholder_is_capped_png() {
        let placeholder = create_placeholder(4000, 32).expect("placeholder");
        assert_eq!(placeholder.width, MAX_PLACEHOLDER_SIDE);
        assert_eq!(placeholder.height, 32);
        assert_eq!(&placeholder.png[0..4], &[137, 80, 78, 71]);
    }
}
