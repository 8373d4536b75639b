//! Generated fallback images for lots whose photo could not be fetched.

use image::{Rgb, RgbImage};

use crate::error::ImageError;
use crate::transcode::encode_jpeg_rgb;

const WIDTH: u32 = 400;
const HEIGHT: u32 = 300;
const BORDER: u32 = 5;

/// A flat light-gray JPEG with a darker border.
///
/// Substituted for a lot's image when every fetch strategy fails, so
/// downstream rendering still has something to show. Callers decide when
/// to use it — the pipeline only applies it as a configured fallback,
/// which the CLI enables in development environments only.
///
/// # Errors
///
/// Returns [`ImageError::Decode`] if JPEG encoding fails.
pub fn placeholder_image() -> Result<Vec<u8>, ImageError> {
    let mut img = RgbImage::from_pixel(WIDTH, HEIGHT, Rgb([240, 240, 240]));
    for (x, y, px) in img.enumerate_pixels_mut() {
        let on_border = x < BORDER || y < BORDER || x >= WIDTH - BORDER || y >= HEIGHT - BORDER;
        if on_border {
            *px = Rgb([200, 200, 200]);
        }
    }
    encode_jpeg_rgb(&img)
}
