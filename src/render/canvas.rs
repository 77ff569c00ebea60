//! Software glass layer backed by an RGBA image.

use image::{Rgba, RgbaImage};

use super::{Rect, Surface};

/// Transparent RGBA layer that droplets are painted on.
#[derive(Debug, Clone)]
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Number of pixels with non-zero alpha.
    pub fn covered_pixels(&self) -> usize {
        self.image.pixels().filter(|p| p[3] != 0).count()
    }

    /// Alpha-blend the glass layer over `background`.
    ///
    /// Glass alpha is scaled by `opacity`, clamped to `[0, 1]`. Only the
    /// overlapping area of the two images is blended.
    pub fn composite(&self, background: &RgbaImage, opacity: f32) -> RgbaImage {
        let opacity = if opacity.is_nan() { 0.0 } else { opacity.clamp(0.0, 1.0) };
        let mut out = background.clone();
        let width = out.width().min(self.image.width());
        let height = out.height().min(self.image.height());

        for y in 0..height {
            for x in 0..width {
                let glass = self.image.get_pixel(x, y);
                let a = glass[3] as f32 / 255.0 * opacity;
                if a == 0.0 {
                    continue;
                }
                let dst = out.get_pixel_mut(x, y);
                for c in 0..3 {
                    dst[c] = blend(glass[c], dst[c], a);
                }
                dst[3] = (a * 255.0 + dst[3] as f32 * (1.0 - a)).round() as u8;
            }
        }
        out
    }
}

#[inline]
fn blend(src: u8, dst: u8, alpha: f32) -> u8 {
    (src as f32 * alpha + dst as f32 * (1.0 - alpha)).round() as u8
}

/// Call `span(y, x0, x1)` for every half-open run of pixels whose centre lies
/// inside `clip` (even-odd rule), restricted to a `width x height` surface.
fn scanline_spans(clip: &[(f32, f32)], width: u32, height: u32, mut span: impl FnMut(u32, u32, u32)) {
    if clip.len() < 3 || width == 0 || height == 0 {
        return;
    }

    let (min_y, max_y) = clip
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &(_, y)| (lo.min(y), hi.max(y)));
    if !min_y.is_finite() || !max_y.is_finite() {
        return;
    }

    let first = min_y.floor().max(0.0) as u32;
    let last = max_y.ceil().min(height as f32 - 1.0);
    if last < 0.0 {
        return;
    }
    let last = last as u32;

    let n = clip.len();
    let mut crossings = Vec::with_capacity(n);
    for y in first..=last {
        crossings.clear();
        let yf = y as f32 + 0.5;

        for i in 0..n {
            let (x1, y1) = clip[i];
            let (x2, y2) = clip[(i + 1) % n];
            if (y1 <= yf && y2 > yf) || (y2 <= yf && y1 > yf) {
                crossings.push(x1 + (yf - y1) / (y2 - y1) * (x2 - x1));
            }
        }

        crossings.sort_unstable_by(f32::total_cmp);
        for pair in crossings.chunks_exact(2) {
            let x0 = (pair[0] - 0.5).ceil().max(0.0);
            let x1 = (pair[1] - 0.5).ceil().min(width as f32);
            if x0 < x1 {
                span(y, x0 as u32, x1 as u32);
            }
        }
    }
}

impl Surface for Canvas {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn erase(&mut self, rect: Rect) {
        let Some((x0, y0, x1, y1)) = rect.pixel_bounds(self.image.width(), self.image.height())
        else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                self.image.put_pixel(x, y, Rgba([0, 0, 0, 0]));
            }
        }
    }

    fn fill_polygon(&mut self, clip: &[(f32, f32)], color: [u8; 4]) {
        let image = &mut self.image;
        scanline_spans(clip, image.width(), image.height(), |y, x0, x1| {
            for x in x0..x1 {
                image.put_pixel(x, y, Rgba(color));
            }
        });
    }

    fn draw_image_clipped(&mut self, clip: &[(f32, f32)], source: &RgbaImage, dest: Rect) {
        let (sw, sh) = source.dimensions();
        if sw == 0 || sh == 0 || !(dest.width > 0.0 && dest.height > 0.0) {
            return;
        }

        // Nearest-neighbour sampling, clamped at the source edges
        let sample = |v: f32, origin: f32, extent: f32, len: u32| -> u32 {
            let t = ((v + 0.5 - origin) / extent * len as f32).floor();
            if t > 0.0 { (t as u32).min(len - 1) } else { 0 }
        };

        let image = &mut self.image;
        scanline_spans(clip, image.width(), image.height(), |y, x0, x1| {
            let sy = sample(y as f32, dest.y, dest.height, sh);
            for x in x0..x1 {
                let sx = sample(x as f32, dest.x, dest.width, sw);
                image.put_pixel(x, y, *source.get_pixel(sx, sy));
            }
        });
    }
}
