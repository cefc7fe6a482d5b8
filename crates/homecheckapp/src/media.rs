//! Photo compression and thumbnails.
//!
//! Images travel as `data:` URLs (`data:<mime>;base64,<payload>`), the same
//! encoding stored on [`Photo`](crate::model::Photo) records. Everything here is
//! a pure function of its inputs: decode, scale down to fit a bounding square
//! keeping the aspect ratio, and re-encode as JPEG. Images already within the
//! bound are re-encoded but never scaled up.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;

use crate::config::HomecheckConfig;
use crate::error::{HomecheckError, Result};

pub const JPEG_MIME: &str = "image/jpeg";

/// A decoded `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl DataUrl {
    pub fn parse(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| HomecheckError::Image("not a data URL".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| HomecheckError::Image("data URL has no payload".to_string()))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| HomecheckError::Image("only base64 data URLs are supported".to_string()))?;
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| HomecheckError::Image(format!("invalid base64 payload: {}", e)))?;
        Ok(Self {
            mime_type: mime_type.to_string(),
            bytes,
        })
    }

    pub fn encode(mime_type: &str, bytes: &[u8]) -> String {
        format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
    }
}

/// Size-and-quality settings for captured photos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhotoOptions {
    pub max_dimension: u32,
    pub quality: u8,
    pub thumbnail_dimension: u32,
    pub thumbnail_quality: u8,
}

impl Default for PhotoOptions {
    fn default() -> Self {
        Self {
            max_dimension: 1920,
            quality: 80,
            thumbnail_dimension: 200,
            thumbnail_quality: 60,
        }
    }
}

impl From<&HomecheckConfig> for PhotoOptions {
    fn from(config: &HomecheckConfig) -> Self {
        Self {
            max_dimension: config.photo_max_dimension,
            quality: config.photo_quality,
            thumbnail_dimension: config.thumbnail_dimension,
            thumbnail_quality: config.thumbnail_quality,
        }
    }
}

/// Scale an image down to fit `max_dimension` and re-encode it as JPEG at
/// `quality` (1-100). Returns a JPEG data URL.
pub fn compress_image(data_url: &str, max_dimension: u32, quality: u8) -> Result<String> {
    let image = decode(data_url)?;
    let scaled = fit_within(image, max_dimension);
    encode_jpeg(&scaled, quality)
}

/// Small JPEG preview of an image.
pub fn generate_thumbnail(data_url: &str, dimension: u32, quality: u8) -> Result<String> {
    compress_image(data_url, dimension, quality)
}

/// Byte size of the payload carried by a data URL.
pub fn payload_size(data_url: &str) -> Result<u64> {
    Ok(DataUrl::parse(data_url)?.bytes.len() as u64)
}

fn decode(data_url: &str) -> Result<DynamicImage> {
    let url = DataUrl::parse(data_url)?;
    Ok(image::load_from_memory(&url.bytes)?)
}

fn fit_within(image: DynamicImage, max_dimension: u32) -> DynamicImage {
    let max_dimension = max_dimension.max(1);
    if image.width() <= max_dimension && image.height() <= max_dimension {
        return image;
    }
    image.resize(max_dimension, max_dimension, FilterType::Triangle)
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<String> {
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
    // JPEG has no alpha channel
    DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)?;
    Ok(DataUrl::encode(JPEG_MIME, &bytes))
}
