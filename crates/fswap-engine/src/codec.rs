//! JPEG codec helpers shared by the client and the job runner.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;

use crate::error::EngineResult;

/// JPEG quality used for every encoded result.
pub const JPEG_QUALITY: u8 = 90;

/// Decode an image from raw bytes (format sniffed from content).
pub fn decode(bytes: &[u8]) -> EngineResult<DynamicImage> {
    Ok(image::load_from_memory(bytes)?)
}

/// Encode an image as JPEG at the service-wide quality setting.
pub fn encode_jpeg(img: &DynamicImage) -> EngineResult<Vec<u8>> {
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut buf), JPEG_QUALITY);
    // JPEG has no alpha channel; flatten before encoding.
    img.to_rgb8().write_with_encoder(encoder)?;
    Ok(buf)
}
