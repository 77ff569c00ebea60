//! One-off preparation of the images behind and inside the droplets.

use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::compute::{BlurRegion, stack_blur};

/// Resize `source` to `width x height` unless it already has that size.
fn fit(source: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if source.dimensions() == (width, height) {
        source.clone()
    } else {
        imageops::resize(source, width, height, FilterType::Triangle)
    }
}

/// Background shown through the glass: the source fitted to the surface
/// and stack-blurred with `blur_radius`.
pub fn prepare_background(source: &RgbaImage, width: u32, height: u32, blur_radius: f32) -> RgbaImage {
    let mut background = fit(source, width, height);
    let (w, h) = (width as usize, height as usize);
    stack_blur(&mut background, w, h, BlurRegion::full(w, h), blur_radius);
    background
}

/// Reflection source: the unblurred image fitted to the surface and turned
/// upside down, as a lens would show it.
pub fn prepare_reflection(source: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    imageops::rotate180(&fit(source, width, height))
}

/// Vertical two-colour gradient, used when no background image is given.
pub fn gradient(width: u32, height: u32, top: [u8; 3], bottom: [u8; 3]) -> RgbaImage {
    let span = height.saturating_sub(1).max(1) as f32;
    RgbaImage::from_fn(width, height, |_, y| {
        let t = y as f32 / span;
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        image::Rgba([mix(top[0], bottom[0]), mix(top[1], bottom[1]), mix(top[2], bottom[2]), 255])
    })
}
