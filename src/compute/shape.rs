//! Irregular droplet outlines built by midpoint displacement.
//!
//! An outline is an ordered list of points whose `x` runs from 0 to 1 (the
//! angle around the droplet, as a fraction of a full turn) and whose `y` is
//! a jitter value normalised to `[0, 1]` that modulates the radius.

use std::collections::HashMap;
use std::f32::consts::TAU;
use std::rc::Rc;

use rand::Rng;
use rand_distr::{Distribution, Uniform};

use crate::schema::Preset;

/// One outline point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlinePoint {
    /// Fraction of a full turn, in `[0, 1]`.
    pub x: f32,
    /// Normalised radius jitter, in `[0, 1]`.
    pub y: f32,
}

/// Closed irregular-circle outline.
#[derive(Debug, Clone, PartialEq)]
pub struct Outline {
    points: Vec<OutlinePoint>,
}

impl Outline {
    /// Generate an outline with `iterations` rounds of midpoint subdivision.
    ///
    /// Produces `2^iterations + 1` points. Every call yields a different shape.
    pub fn generate<R: Rng + ?Sized>(iterations: u32, rng: &mut R) -> Self {
        let jitter = Uniform::new_inclusive(-1.0f32, 1.0);
        let mut points = vec![OutlinePoint { x: 0.0, y: 1.0 }, OutlinePoint { x: 1.0, y: 1.0 }];

        for _ in 0..iterations {
            let mut next = Vec::with_capacity(points.len() * 2 - 1);
            for pair in points.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                let dx = b.x - a.x;
                next.push(a);
                next.push(OutlinePoint {
                    x: 0.5 * (a.x + b.x),
                    y: 0.5 * (a.y + b.y) + dx * jitter.sample(rng),
                });
            }
            next.extend(points.last().copied());
            points = next;
        }

        normalize(&mut points);
        Self { points }
    }

    pub fn points(&self) -> &[OutlinePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Polygon for a droplet centred at `(cx, cy)`.
    ///
    /// Each vertex sits at angle `2π·x` with a radius between `r_minor` and
    /// `r_major` picked by the point's jitter, minus a fresh random wobble so
    /// the edge shimmers from frame to frame.
    pub fn clip_path<R: Rng + ?Sized>(
        &self,
        cx: f32,
        cy: f32,
        r_major: f32,
        r_minor: f32,
        rng: &mut R,
    ) -> Vec<(f32, f32)> {
        let spread = r_major - r_minor;
        let wobble = Uniform::new(0.0f32, 1.0);

        self.points
            .iter()
            .map(|p| {
                let theta = TAU * p.x;
                let rad = r_minor + p.y * spread - 0.5 * wobble.sample(rng) * spread;
                (cx + rad * theta.cos(), cy + rad * theta.sin())
            })
            .collect()
    }
}

/// Rescale `y` so its minimum maps to 0 and maximum to 1 (all 1 if flat).
fn normalize(points: &mut [OutlinePoint]) {
    let (min_y, max_y) = points
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.y), hi.max(p.y))
        });

    if max_y > min_y {
        let rate = 1.0 / (max_y - min_y);
        for p in points.iter_mut() {
            p.y = rate * (p.y - min_y);
        }
    } else {
        for p in points.iter_mut() {
            p.y = 1.0;
        }
    }
}

/// Shared outlines, one per distinct `(min, base)` preset.
#[derive(Debug, Default)]
pub struct OutlineCache {
    iterations: u32,
    outlines: HashMap<(u32, u32), Rc<Outline>>,
}

impl OutlineCache {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations,
            outlines: HashMap::new(),
        }
    }

    /// Outline for droplets of the given size class, generated on first use.
    pub fn get<R: Rng + ?Sized>(&mut self, min: f32, base: f32, rng: &mut R) -> Rc<Outline> {
        let iterations = self.iterations;
        self.outlines
            .entry((min.to_bits(), base.to_bits()))
            .or_insert_with(|| Rc::new(Outline::generate(iterations, rng)))
            .clone()
    }

    /// Outline for a preset.
    pub fn for_preset<R: Rng + ?Sized>(&mut self, preset: &Preset, rng: &mut R) -> Rc<Outline> {
        self.get(preset.min, preset.base, rng)
    }

    pub fn len(&self) -> usize {
        self.outlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outlines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_zero_iterations_is_flat() {
        let mut rng = StdRng::seed_from_u64(1);
        let outline = Outline::generate(0, &mut rng);
        assert_eq!(outline.len(), 2);
        assert!(outline.points().iter().all(|p| p.y == 1.0));
    }

    #[test]
    fn test_x_is_ordered() {
        let mut rng = StdRng::seed_from_u64(7);
        let outline = Outline::generate(5, &mut rng);
        for pair in outline.points().windows(2) {
            assert!(pair[0].x < pair[1].x);
        }
        assert_eq!(outline.points()[0].x, 0.0);
        assert_eq!(outline.points()[outline.len() - 1].x, 1.0);
    }

    #[test]
    fn test_clip_path_stays_within_major_radius() {
        let mut rng = StdRng::seed_from_u64(3);
        let outline = Outline::generate(4, &mut rng);
        let path = outline.clip_path(50.0, 40.0, 10.0, 8.0, &mut rng);

        assert_eq!(path.len(), outline.len());
        for (x, y) in path {
            let d = ((x - 50.0).powi(2) + (y - 40.0).powi(2)).sqrt();
            assert!(d <= 10.0 + 1e-4, "vertex at distance {d}");
            assert!(d >= 7.0 - 1e-4, "vertex at distance {d}");
        }
    }

    #[test]
    fn test_cache_shares_per_preset() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut cache = OutlineCache::new(3);

        let a = cache.get(1.0, 2.0, &mut rng);
        let b = cache.get(1.0, 2.0, &mut rng);
        let c = cache.for_preset(&Preset::new(0.0, 2.0, 1.0), &mut rng);

        assert!(Rc::ptr_eq(&a, &b));
        assert!(!Rc::ptr_eq(&a, &c));
        assert_eq!(cache.len(), 2);
        assert_eq!(a.len(), 9);
    }

    proptest! {
        #[test]
        fn prop_point_count_and_normalization(iterations in 0u32..10, seed in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let outline = Outline::generate(iterations, &mut rng);

            prop_assert_eq!(outline.len(), (1usize << iterations) + 1);

            let min = outline.points().iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
            let max = outline.points().iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);
            if min == max {
                prop_assert!(outline.points().iter().all(|p| p.y == 1.0));
            } else {
                prop_assert!(min.abs() < 1e-6);
                prop_assert!((max - 1.0).abs() < 1e-5);
            }
        }
    }
}
