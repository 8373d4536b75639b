//! Synthetic in-memory images for `test:` photo references.
//!
//! Lets fixtures and smoke tests exercise the full pipeline without any
//! network traffic: the fetcher checks for the prefix before building
//! strategies and returns a generated image instead.

use image::{Rgb, RgbImage};

use crate::error::ImageError;
use crate::transcode::encode_jpeg_rgb;

/// Photo references starting with this prefix bypass the network; the
/// remainder of the reference seeds the generated image deterministically.
pub const TEST_SENTINEL_PREFIX: &str = "test:";

/// Builds the deterministic fixture image for a sentinel name.
pub(crate) fn synthetic_image(name: &str) -> Result<Vec<u8>, ImageError> {
    let seed = name
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b)));
    // Keep channels off full black so the fixture is visibly an image.
    #[allow(clippy::cast_possible_truncation)]
    let color = Rgb([
        (seed & 0x7f) as u8 + 0x40,
        ((seed >> 7) & 0x7f) as u8 + 0x40,
        ((seed >> 14) & 0x7f) as u8 + 0x40,
    ]);
    let img = RgbImage::from_pixel(64, 48, color);
    encode_jpeg_rgb(&img)
}
