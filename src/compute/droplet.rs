//! A single droplet: geometry plus physics state.

use std::rc::Rc;

use rand::Rng;

use super::{GridCell, Outline};
use crate::animation::TaskHandle;
use crate::render::Rect;

/// Smallest radius a droplet can have.
pub const MIN_RADIUS: f32 = 0.5;

/// Ratio of the minor to the major radius at creation.
pub const MINOR_RADIUS_RATIO: f32 = 0.8;

/// Monotonic droplet identity, allocated by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DropletHandle(pub u64);

/// Velocity in surface units per tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone)]
pub struct Droplet {
    pub handle: DropletHandle,
    /// Centre, y grows downward.
    pub x: f32,
    pub y: f32,
    pub r_major: f32,
    pub r_minor: f32,
    pub outline: Rc<Outline>,
    /// `None` until gravity first moves the droplet.
    pub velocity: Option<Velocity>,
    /// Ticks left in the current non-linear gravity phase.
    pub seed: i32,
    pub slowing: bool,
    pub skipping: bool,
    /// y at the last trail spawn.
    pub trail_y: Option<f32>,
    /// Collision grid bucket, once registered.
    pub grid_cell: Option<GridCell>,
    /// Animation task, for animated droplets.
    pub task: Option<TaskHandle>,
    pub terminated: bool,
}

impl Droplet {
    /// Create a droplet centred on `(x, y)` (floored) with radius
    /// `uniform(0, 1) * base + min`.
    pub fn new<R: Rng + ?Sized>(
        handle: DropletHandle,
        x: f32,
        y: f32,
        min: f32,
        base: f32,
        outline: Rc<Outline>,
        rng: &mut R,
    ) -> Self {
        let r_major = (rng.gen_range(0.0f32..1.0) * base + min).max(MIN_RADIUS);

        Self {
            handle,
            x: x.floor(),
            y: y.floor(),
            r_major,
            r_minor: MINOR_RADIUS_RATIO * r_major,
            outline,
            velocity: None,
            seed: 0,
            // The first phase roll flips this, starting droplets off accelerating
            skipping: true,
            slowing: false,
            trail_y: None,
            grid_cell: None,
            task: None,
            terminated: false,
        }
    }

    /// Square covering everything a draw may have touched, with a 1px margin.
    pub fn footprint(&self) -> Rect {
        let r = self.r_major;
        Rect::new(self.x - r - 1.0, self.y - r - 1.0, 2.0 * r + 2.0, 2.0 * r + 2.0)
    }

    /// Bounding square of the droplet, where reflections are drawn.
    pub fn bounds(&self) -> Rect {
        let r = self.r_major;
        Rect::new(self.x - r, self.y - r, 2.0 * r, 2.0 * r)
    }

    /// True once the droplet has fully left a `width x height` surface past
    /// the bottom edge or either side.
    pub fn has_exited(&self, width: f32, height: f32) -> bool {
        self.y - self.r_major > height
            || self.x - self.r_major > width
            || self.x + self.r_major < 0.0
    }

    /// Current outline polygon.
    pub fn clip_path<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<(f32, f32)> {
        self.outline
            .clip_path(self.x, self.y, self.r_major, self.r_minor, rng)
    }

    /// Set both radii from a new major radius.
    pub fn resize(&mut self, r_major: f32) {
        self.r_major = r_major.max(MIN_RADIUS);
        self.r_minor = MINOR_RADIUS_RATIO * self.r_major;
    }
}
