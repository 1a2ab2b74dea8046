//! Image encoding: `RgbaImage` → Flate-compressed sample streams for PDF.
//!
//! PDF has no RGBA image type. Colour goes into an 8-bit DeviceRGB stream;
//! alpha, when the buffer actually uses it, goes into a separate DeviceGray
//! soft mask (`/SMask`). Both are zlib streams (`/FlateDecode`), so the
//! embedding is lossless: decoded samples equal the rendered pixels.

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::RgbaImage;
use std::io::Write;
use tracing::debug;

/// A page image ready to be written as an image XObject.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub width: u32,
    pub height: u32,
    /// zlib-compressed RGB samples, row-major, top row first.
    pub rgb: Vec<u8>,
    /// zlib-compressed alpha samples; `None` when every pixel is opaque.
    pub alpha: Option<Vec<u8>>,
}

impl EncodedImage {
    /// Compressed bytes this image adds to the document.
    pub fn encoded_len(&self) -> usize {
        self.rgb.len() + self.alpha.as_ref().map_or(0, Vec::len)
    }
}

/// Encode a composited page. Consumes the buffer so it is freed as soon as
/// the samples are compressed.
pub fn encode_image(image: RgbaImage, level: u32) -> std::io::Result<EncodedImage> {
    let (width, height) = image.dimensions();
    let pixels = image.into_raw();
    let count = pixels.len() / 4;

    let mut rgb = Vec::with_capacity(count * 3);
    let mut alpha = Vec::with_capacity(count);
    let mut opaque = true;
    for px in pixels.chunks_exact(4) {
        rgb.extend_from_slice(&px[..3]);
        alpha.push(px[3]);
        opaque &= px[3] == u8::MAX;
    }
    drop(pixels);

    let compression = Compression::new(level.min(9));
    let rgb = deflate(&rgb, compression)?;
    let alpha = if opaque {
        None
    } else {
        Some(deflate(&alpha, compression)?)
    };

    let encoded = EncodedImage {
        width,
        height,
        rgb,
        alpha,
    };
    debug!(
        "Encoded {}x{} image → {} bytes (soft mask: {})",
        width,
        height,
        encoded.encoded_len(),
        encoded.alpha.is_some()
    );
    Ok(encoded)
}

fn deflate(data: &[u8], level: Compression) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 4), level);
    encoder.write_all(data)?;
    encoder.finish()
}
