//! Stack blur: a fast Gaussian approximation for RGBA pixel buffers.
//!
//! Each pass slides a window of `2r + 1` samples along a line, weighting them
//! triangularly (centre weight `r + 1`, falling off linearly). Running sums of
//! the samples entering and leaving the window keep the cost per pixel
//! independent of the radius, and the final division by `(r + 1)^2` is done
//! as a multiply and shift using precomputed tables.
//!
//! The horizontal pass runs row by row in parallel. The vertical pass runs the
//! same line kernel over a transposed copy of the region.

use rayon::prelude::*;

/// Largest radius covered by the multiplier tables.
pub const MAX_BLUR_RADIUS: usize = 254;

#[rustfmt::skip]
const MUL_TABLE: [u64; MAX_BLUR_RADIUS + 1] = [
    512, 512, 456, 512, 328, 456, 335, 512, 405, 328, 271, 456, 388, 335, 292, 512,
    454, 405, 364, 328, 298, 271, 496, 456, 420, 388, 360, 335, 312, 292, 273, 512,
    482, 454, 428, 405, 383, 364, 345, 328, 312, 298, 284, 271, 259, 496, 475, 456,
    437, 420, 404, 388, 374, 360, 347, 335, 323, 312, 302, 292, 282, 273, 265, 512,
    497, 482, 468, 454, 441, 428, 417, 405, 394, 383, 373, 364, 354, 345, 337, 328,
    320, 312, 305, 298, 291, 284, 278, 271, 265, 259, 507, 496, 485, 475, 465, 456,
    446, 437, 428, 420, 412, 404, 396, 388, 381, 374, 367, 360, 354, 347, 341, 335,
    329, 323, 318, 312, 307, 302, 297, 292, 287, 282, 278, 273, 269, 265, 261, 512,
    505, 497, 489, 482, 475, 468, 461, 454, 447, 441, 435, 428, 422, 417, 411, 405,
    399, 394, 389, 383, 378, 373, 368, 364, 359, 354, 350, 345, 341, 337, 332, 328,
    324, 320, 316, 312, 309, 305, 301, 298, 294, 291, 287, 284, 281, 278, 274, 271,
    268, 265, 262, 259, 257, 507, 501, 496, 491, 485, 480, 475, 470, 465, 460, 456,
    451, 446, 442, 437, 433, 428, 424, 420, 416, 412, 408, 404, 400, 396, 392, 388,
    385, 381, 377, 374, 370, 367, 363, 360, 357, 354, 350, 347, 344, 341, 338, 335,
    332, 329, 326, 323, 320, 318, 315, 312, 310, 307, 304, 302, 299, 297, 294, 292,
    289, 287, 285, 282, 280, 278, 275, 273, 271, 269, 267, 265, 263, 261, 259,
];

#[rustfmt::skip]
const SHG_TABLE: [u32; MAX_BLUR_RADIUS + 1] = [
     9, 11, 12, 13, 13, 14, 14, 15, 15, 15, 15, 16, 16, 16, 16, 17,
    17, 17, 17, 17, 17, 17, 18, 18, 18, 18, 18, 18, 18, 18, 18, 19,
    19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 20, 20, 20,
    20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 21,
    21, 21, 21, 21, 21, 21, 21, 21, 21, 21, 21, 21, 21, 21, 21, 21,
    21, 21, 21, 21, 21, 21, 21, 21, 21, 21, 22, 22, 22, 22, 22, 22,
    22, 22, 22, 22, 22, 22, 22, 22, 22, 22, 22, 22, 22, 22, 22, 22,
    22, 22, 22, 22, 22, 22, 22, 22, 22, 22, 22, 22, 22, 22, 22, 23,
    23, 23, 23, 23, 23, 23, 23, 23, 23, 23, 23, 23, 23, 23, 23, 23,
    23, 23, 23, 23, 23, 23, 23, 23, 23, 23, 23, 23, 23, 23, 23, 23,
    23, 23, 23, 23, 23, 23, 23, 23, 23, 23, 23, 23, 23, 23, 23, 23,
    23, 23, 23, 23, 23, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24,
    24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24,
    24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24,
    24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24,
    24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24,
];

type Pixel = [u8; 4];

/// Rectangular area of an image, in whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlurRegion {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl BlurRegion {
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Region covering a whole `width x height` image.
    pub fn full(width: usize, height: usize) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Intersect with the bounds of a `width x height` image.
    fn clamp_to(self, width: usize, height: usize) -> Self {
        let x = self.x.min(width);
        let y = self.y.min(height);
        Self {
            x,
            y,
            width: self.width.min(width - x),
            height: self.height.min(height - y),
        }
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Convert a requested radius to a table index. `None` means no blur.
#[inline]
fn effective_radius(radius: f32) -> Option<usize> {
    if radius.is_nan() || radius < 1.0 {
        return None;
    }
    Some((radius as usize).min(MAX_BLUR_RADIUS))
}

/// Blur the RGB channels of `region` in place. Alpha is left untouched.
///
/// `pixels` is a row-major RGBA buffer of `width * height` pixels. A NaN
/// radius or one below 1 leaves the buffer unchanged; radii above
/// [`MAX_BLUR_RADIUS`] are clamped. Samples outside the region are never read:
/// the region's border pixels are repeated instead.
pub fn stack_blur(
    pixels: &mut [u8],
    width: usize,
    height: usize,
    region: BlurRegion,
    radius: f32,
) {
    let Some(radius) = effective_radius(radius) else {
        return;
    };
    if pixels.len() != width * height * 4 {
        log::warn!(
            "stack_blur: buffer of {} bytes does not match {width}x{height}",
            pixels.len()
        );
        return;
    }

    let region = region.clamp_to(width, height);
    if region.is_empty() {
        return;
    }

    let image: &mut [Pixel] = bytemuck::cast_slice_mut(pixels);

    // Copy the region out so both passes work on contiguous lines
    let mut rows = vec![[0u8; 4]; region.width * region.height];
    for (row, line) in rows.chunks_exact_mut(region.width).enumerate() {
        let start = (region.y + row) * width + region.x;
        line.copy_from_slice(&image[start..start + region.width]);
    }

    blur_lines(&mut rows, region.width, radius);

    let mut columns = transpose(&rows, region.width, region.height);
    blur_lines(&mut columns, region.height, radius);
    let rows = transpose(&columns, region.height, region.width);

    for (row, line) in rows.chunks_exact(region.width).enumerate() {
        let start = (region.y + row) * width + region.x;
        image[start..start + region.width].copy_from_slice(line);
    }
}

/// Blur every `line_len`-long line of `data` independently.
fn blur_lines(data: &mut [Pixel], line_len: usize, radius: usize) {
    data.par_chunks_mut(line_len).for_each_init(
        || vec![[0u32; 3]; 2 * radius + 1],
        |stack, line| blur_line(line, radius, stack),
    );
}

/// One stack blur pass over a single line.
///
/// `stack` is the ring of the last `2r + 1` samples; slot `i` holds the
/// sample at offset `i - r` from the pixel being written, modulo rotation.
fn blur_line(line: &mut [Pixel], radius: usize, stack: &mut [[u32; 3]]) {
    let div = stack.len();
    let last = line.len() - 1;
    let radius_plus_1 = radius as u32 + 1;
    let sum_factor = radius_plus_1 * (radius_plus_1 + 1) / 2;
    let mul = MUL_TABLE[radius];
    let shg = SHG_TABLE[radius];

    let mut sum = [0u32; 3];
    let mut in_sum = [0u32; 3];
    let mut out_sum = [0u32; 3];

    let first = rgb(line[0]);
    for c in 0..3 {
        out_sum[c] = radius_plus_1 * first[c];
        sum[c] = sum_factor * first[c];
    }

    // Left half (and centre) repeat the first pixel
    for slot in stack.iter_mut().take(radius + 1) {
        *slot = first;
    }

    // Right half, clamped to the end of the line
    for i in 1..=radius {
        let sample = rgb(line[i.min(last)]);
        let weight = radius_plus_1 - i as u32;
        stack[radius + i] = sample;
        for c in 0..3 {
            sum[c] += sample[c] * weight;
            in_sum[c] += sample[c];
        }
    }

    let mut stack_in = 0;
    let mut stack_out = radius + 1;

    for x in 0..=last {
        let incoming = rgb(line[(x + radius + 1).min(last)]);

        let out = &mut line[x];
        for c in 0..3 {
            out[c] = ((sum[c] as u64 * mul) >> shg) as u8;
        }

        for c in 0..3 {
            sum[c] -= out_sum[c];
            out_sum[c] -= stack[stack_in][c];
        }

        stack[stack_in] = incoming;
        for c in 0..3 {
            in_sum[c] += incoming[c];
            sum[c] += in_sum[c];
        }
        stack_in = (stack_in + 1) % div;

        let leaving = stack[stack_out];
        for c in 0..3 {
            out_sum[c] += leaving[c];
            in_sum[c] -= leaving[c];
        }
        stack_out = (stack_out + 1) % div;
    }
}

#[inline]
fn rgb(pixel: Pixel) -> [u32; 3] {
    [pixel[0] as u32, pixel[1] as u32, pixel[2] as u32]
}

/// Transpose a `width x height` pixel grid into `height x width`.
fn transpose(data: &[Pixel], width: usize, height: usize) -> Vec<Pixel> {
    let mut out = vec![[0u8; 4]; data.len()];
    for y in 0..height {
        for x in 0..width {
            out[x * height + y] = data[y * width + x];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn solid(width: usize, height: usize, color: Pixel) -> Vec<u8> {
        (0..width * height).flat_map(|_| color).collect()
    }

    #[test]
    fn test_tables_cover_radius_range() {
        assert_eq!(MUL_TABLE.len(), MAX_BLUR_RADIUS + 1);
        assert_eq!(SHG_TABLE.len(), MAX_BLUR_RADIUS + 1);
    }

    #[test]
    fn test_flat_field_radius_20() {
        let color = [12, 200, 97, 255];
        let mut pixels = solid(100, 100, color);
        stack_blur(&mut pixels, 100, 100, BlurRegion::full(100, 100), 20.0);

        for px in pixels.chunks_exact(4) {
            assert_eq!(px, color);
        }
    }

    #[test]
    fn test_invalid_radius_is_noop() {
        let mut pixels: Vec<u8> = (0..16 * 16 * 4).map(|i| (i * 7 % 251) as u8).collect();
        let original = pixels.clone();

        stack_blur(&mut pixels, 16, 16, BlurRegion::full(16, 16), 0.0);
        assert_eq!(pixels, original);
        stack_blur(&mut pixels, 16, 16, BlurRegion::full(16, 16), 0.5);
        assert_eq!(pixels, original);
        stack_blur(&mut pixels, 16, 16, BlurRegion::full(16, 16), f32::NAN);
        assert_eq!(pixels, original);
        stack_blur(&mut pixels, 16, 16, BlurRegion::full(16, 16), -3.0);
        assert_eq!(pixels, original);
    }

    #[test]
    fn test_single_bright_pixel_spreads() {
        let (w, h) = (9, 9);
        let mut pixels = solid(w, h, [0, 0, 0, 255]);
        let centre = (4 * w + 4) * 4;
        pixels[centre] = 255;

        stack_blur(&mut pixels, w, h, BlurRegion::full(w, h), 2.0);

        let at = |x: usize, y: usize| pixels[(y * w + x) * 4];
        assert!(at(4, 4) > 0 && at(4, 4) < 255);
        assert!(at(4, 4) >= at(5, 4));
        assert!(at(5, 4) >= at(6, 4));
        assert_eq!(at(0, 0), 0);
        // Symmetric kernel
        assert_eq!(at(3, 4), at(5, 4));
        assert_eq!(at(4, 3), at(4, 5));
    }

    #[test]
    fn test_alpha_untouched() {
        let (w, h) = (8, 8);
        let mut pixels: Vec<u8> = (0..w * h)
            .flat_map(|i| [(i * 31 % 256) as u8, 0, 0, (i % 256) as u8])
            .collect();
        let alphas: Vec<u8> = pixels.chunks_exact(4).map(|p| p[3]).collect();

        stack_blur(&mut pixels, w, h, BlurRegion::full(w, h), 3.0);

        let after: Vec<u8> = pixels.chunks_exact(4).map(|p| p[3]).collect();
        assert_eq!(alphas, after);
    }

    #[test]
    fn test_region_leaves_outside_untouched() {
        let (w, h) = (20, 20);
        let mut pixels: Vec<u8> = (0..w * h * 4).map(|i| (i * 13 % 256) as u8).collect();
        let original = pixels.clone();

        stack_blur(&mut pixels, w, h, BlurRegion::new(5, 5, 10, 10), 4.0);

        for y in 0..h {
            for x in 0..w {
                let inside = (5..15).contains(&x) && (5..15).contains(&y);
                let idx = (y * w + x) * 4;
                if !inside {
                    assert_eq!(&pixels[idx..idx + 4], &original[idx..idx + 4]);
                }
            }
        }
        assert_ne!(pixels, original);
    }

    #[test]
    fn test_region_clamped_to_image() {
        let mut pixels = solid(4, 4, [9, 9, 9, 9]);
        stack_blur(&mut pixels, 4, 4, BlurRegion::new(2, 2, 100, 100), 5.0);
        assert_eq!(pixels, solid(4, 4, [9, 9, 9, 9]));

        // Fully outside
        stack_blur(&mut pixels, 4, 4, BlurRegion::new(10, 10, 3, 3), 5.0);
        assert_eq!(pixels.len(), 4 * 4 * 4);
    }

    #[test]
    fn test_one_pixel_lines() {
        let mut pixels = solid(1, 7, [50, 60, 70, 80]);
        stack_blur(&mut pixels, 1, 7, BlurRegion::full(1, 7), 3.0);
        assert_eq!(pixels, solid(1, 7, [50, 60, 70, 80]));
    }

    proptest! {
        #[test]
        fn prop_flat_field_invariant(
            r in any::<u8>(),
            g in any::<u8>(),
            b in any::<u8>(),
            radius in 1u32..=300,
            w in 1usize..24,
            h in 1usize..24,
        ) {
            let color = [r, g, b, 255];
            let mut pixels = solid(w, h, color);
            stack_blur(&mut pixels, w, h, BlurRegion::full(w, h), radius as f32);
            prop_assert_eq!(pixels.len(), w * h * 4);
            for px in pixels.chunks_exact(4) {
                prop_assert_eq!(px, &color[..]);
            }
        }

        #[test]
        fn prop_output_within_input_range(
            data in proptest::collection::vec(any::<u8>(), 12 * 12 * 4),
            radius in 1u32..16,
        ) {
            let mut pixels = data.clone();
            stack_blur(&mut pixels, 12, 12, BlurRegion::full(12, 12), radius as f32);

            for c in 0..3 {
                let lo = data.chunks_exact(4).map(|p| p[c]).min().unwrap();
                let hi = data.chunks_exact(4).map(|p| p[c]).max().unwrap();
                for px in pixels.chunks_exact(4) {
                    prop_assert!(px[c] >= lo && px[c] <= hi);
                }
            }
        }
    }
}
