//! Image normalization: bounded resize and storage-friendly re-encoding.
//!
//! Pure byte-to-byte transformation — no I/O. Format policy: JPEG stays
//! JPEG (as does anything whose format cannot be determined), PNG stays
//! PNG, and every other format is flattened onto an opaque white
//! background and re-encoded as JPEG so stored images never carry alpha.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, Rgb, RgbImage};

use crate::error::ImageError;

/// Quality for every JPEG this crate emits.
pub(crate) const JPEG_QUALITY: u8 = 85;

/// Decode, bound to `max_dimension`, and re-encode image bytes.
///
/// Images already within the bound are not resized (and never upscaled);
/// larger ones are downscaled with Lanczos3 so the longer side lands
/// exactly on `max_dimension`, preserving aspect ratio.
///
/// # Errors
///
/// Returns [`ImageError::Decode`] when the bytes do not decode as an
/// image or the re-encode fails.
pub fn transcode(bytes: &[u8], max_dimension: u32) -> Result<Vec<u8>, ImageError> {
    let format = image::guess_format(bytes).ok();
    let mut img = image::load_from_memory(bytes)?;

    if img.width().max(img.height()) > max_dimension {
        img = img.resize(max_dimension, max_dimension, FilterType::Lanczos3);
    }

    match format {
        Some(ImageFormat::Png) => encode_png(&img),
        Some(ImageFormat::Jpeg) | None => encode_jpeg_rgb(&img.to_rgb8()),
        Some(_) => encode_jpeg_rgb(&flatten_onto_white(&img)),
    }
}

/// Encode an RGB bitmap as an optimized JPEG at [`JPEG_QUALITY`].
pub(crate) fn encode_jpeg_rgb(rgb: &RgbImage) -> Result<Vec<u8>, ImageError> {
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
    encoder.write_image(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(buf)
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

/// Composite an image over an opaque white background, discarding alpha.
fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut out = RgbImage::new(width, height);
    for (x, y, px) in rgba.enumerate_pixels() {
        let alpha = u32::from(px[3]);
        #[allow(clippy::cast_possible_truncation)]
        let blend =
            |c: u8| -> u8 { ((u32::from(c) * alpha + 255 * (255 - alpha)) / 255) as u8 };
        out.put_pixel(x, y, Rgb([blend(px[0]), blend(px[1]), blend(px[2])]));
    }
    out
}
