//! The drawing surface droplets are rendered onto.

use image::RgbaImage;

/// Axis-aligned rectangle in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whole-pixel span `[x0, x1) x [y0, y1)` covered by the rectangle,
    /// clipped to a `width x height` surface. `None` if nothing is covered.
    pub fn pixel_bounds(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let clip = |lo: f32, hi: f32, len: u32| -> Option<(u32, u32)> {
            let lo = lo.floor().max(0.0);
            let hi = hi.ceil().min(len as f32);
            (lo < hi).then(|| (lo as u32, hi as u32))
        };
        let (x0, x1) = clip(self.x, self.x + self.width, width)?;
        let (y0, y1) = clip(self.y, self.y + self.height, height)?;
        Some((x0, y0, x1, y1))
    }
}

/// Rendering target of the simulation (the glass layer).
///
/// Clip paths are closed polygons given as `(x, y)` vertices.
pub trait Surface {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Make every pixel touched by `rect` fully transparent.
    fn erase(&mut self, rect: Rect);

    /// Fill the polygon `clip` with a flat colour.
    fn fill_polygon(&mut self, clip: &[(f32, f32)], color: [u8; 4]);

    /// Draw `image` scaled into `dest`, showing only the part inside `clip`.
    fn draw_image_clipped(&mut self, clip: &[(f32, f32)], image: &RgbaImage, dest: Rect);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_bounds() {
        let r = Rect::new(1.5, 2.0, 3.0, 4.0);
        assert_eq!(r.pixel_bounds(100, 100), Some((1, 2, 5, 6)));
    }

    #[test]
    fn test_pixel_bounds_clipped() {
        let r = Rect::new(-5.0, 95.0, 10.0, 10.0);
        assert_eq!(r.pixel_bounds(100, 100), Some((0, 95, 5, 100)));
        assert_eq!(Rect::new(120.0, 0.0, 5.0, 5.0).pixel_bounds(100, 100), None);
        assert_eq!(Rect::new(10.0, 10.0, 0.0, 5.0).pixel_bounds(100, 100), None);
    }
}
