//! How the inside of a droplet is painted.

use image::RgbaImage;

use super::{Rect, Surface};
use crate::schema::ReflectionPolicy;

#[derive(Debug, Clone)]
pub enum Reflection {
    /// Flat colour fill.
    Tint([u8; 4]),
    /// Miniature of the scene, already rotated by 180°, squeezed into each
    /// droplet's bounding square.
    Miniature(RgbaImage),
}

impl Reflection {
    /// Build the reflection for `policy`. `Miniature` without a source image
    /// degrades to the tint.
    pub fn from_policy(policy: ReflectionPolicy, source: Option<RgbaImage>, fill_color: [u8; 4]) -> Self {
        match (policy, source) {
            (ReflectionPolicy::Miniature, Some(image)) if image.width() > 0 && image.height() > 0 => {
                Reflection::Miniature(image)
            }
            (ReflectionPolicy::Miniature, _) => {
                log::warn!("No reflection image available, falling back to tint");
                Reflection::Tint(fill_color)
            }
            (ReflectionPolicy::None, _) => Reflection::Tint(fill_color),
        }
    }

    /// Paint a droplet whose outline is `clip` and bounding square `bounds`.
    pub fn draw<S: Surface + ?Sized>(&self, surface: &mut S, clip: &[(f32, f32)], bounds: Rect) {
        match self {
            Reflection::Tint(color) => surface.fill_polygon(clip, *color),
            Reflection::Miniature(image) => surface.draw_image_clipped(clip, image, bounds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Canvas;
    use image::Rgba;

    const TINT: [u8; 4] = [1, 2, 3, 255];

    fn clip() -> Vec<(f32, f32)> {
        vec![(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]
    }

    #[test]
    fn test_policy_selection() {
        let image = RgbaImage::from_pixel(2, 2, Rgba([9, 9, 9, 255]));

        assert!(matches!(
            Reflection::from_policy(ReflectionPolicy::Miniature, Some(image.clone()), TINT),
            Reflection::Miniature(_)
        ));
        assert!(matches!(
            Reflection::from_policy(ReflectionPolicy::None, Some(image), TINT),
            Reflection::Tint(TINT)
        ));
        assert!(matches!(
            Reflection::from_policy(ReflectionPolicy::Miniature, None, TINT),
            Reflection::Tint(TINT)
        ));
        assert!(matches!(
            Reflection::from_policy(ReflectionPolicy::Miniature, Some(RgbaImage::new(0, 0)), TINT),
            Reflection::Tint(TINT)
        ));
    }

    #[test]
    fn test_draw_tint_and_miniature() {
        let bounds = Rect::new(0.0, 0.0, 4.0, 4.0);

        let mut canvas = Canvas::new(8, 8);
        Reflection::Tint(TINT).draw(&mut canvas, &clip(), bounds);
        assert_eq!(canvas.image().get_pixel(1, 1).0, TINT);

        let mut canvas = Canvas::new(8, 8);
        let image = RgbaImage::from_pixel(3, 3, Rgba([7, 8, 9, 255]));
        Reflection::Miniature(image).draw(&mut canvas, &clip(), bounds);
        assert_eq!(canvas.image().get_pixel(1, 1).0, [7, 8, 9, 255]);
        assert_eq!(canvas.covered_pixels(), 16);
    }
}
