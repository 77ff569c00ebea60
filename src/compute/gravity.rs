//! Gravity policies: per-tick droplet motion.

use rand::Rng;

use super::{Droplet, Velocity};
use crate::schema::{GravityPolicy, RainConfig};

/// Velocity decay applied every tick of the slowing phase.
pub const SLOWING_DIVISOR: f32 = 1.1;

/// Acceleration multiplier of the non-linear accelerating phase.
pub const NON_LINEAR_BOOST: f32 = 10.0;

/// Result of advancing a droplet by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    /// The droplet moved (or may move again) and must be redrawn.
    Moved,
    /// The droplet is done; its task should be cancelled.
    Stopped,
}

/// Everything a gravity policy reads besides the droplet itself.
#[derive(Debug, Clone, Copy)]
pub struct GravityContext {
    /// Base horizontal velocity increment.
    pub force_x: f32,
    /// Base vertical velocity increment.
    pub force_y: f32,
    pub fps: u32,
    pub width: f32,
    pub height: f32,
}

impl GravityContext {
    pub fn from_config(config: &RainConfig) -> Self {
        Self {
            force_x: config.force_x(),
            force_y: config.force_y(),
            fps: config.fps,
            width: config.width as f32,
            height: config.height as f32,
        }
    }

    #[inline]
    fn base_velocity(&self) -> Velocity {
        Velocity {
            x: self.force_x,
            y: self.force_y,
        }
    }
}

impl GravityPolicy {
    /// Advance `droplet` by one tick.
    ///
    /// A droplet that has left the surface is reported stopped without being
    /// touched.
    pub fn advance<R: Rng + ?Sized>(
        self,
        droplet: &mut Droplet,
        ctx: &GravityContext,
        rng: &mut R,
    ) -> Motion {
        match self {
            GravityPolicy::None => Motion::Stopped,
            GravityPolicy::Linear => linear(droplet, ctx),
            GravityPolicy::NonLinear => non_linear(droplet, ctx, rng),
        }
    }
}

fn linear(droplet: &mut Droplet, ctx: &GravityContext) -> Motion {
    if droplet.has_exited(ctx.width, ctx.height) {
        return Motion::Stopped;
    }

    let weight = droplet.r_major.floor();
    let velocity = match droplet.velocity {
        Some(v) => Velocity {
            x: v.x + ctx.force_x * weight,
            y: v.y + ctx.force_y * weight,
        },
        None => ctx.base_velocity(),
    };

    droplet.velocity = Some(velocity);
    droplet.x += velocity.x;
    droplet.y += velocity.y;
    Motion::Moved
}

fn non_linear<R: Rng + ?Sized>(droplet: &mut Droplet, ctx: &GravityContext, rng: &mut R) -> Motion {
    if droplet.has_exited(ctx.width, ctx.height) {
        return Motion::Stopped;
    }

    if droplet.seed <= 0 {
        droplet.seed = (rng.gen_range(0.0f32..1.0) * ctx.fps as f32).floor() as i32;
        droplet.skipping = !droplet.skipping;
        droplet.slowing = true;
    }
    droplet.seed -= 1;

    let weight = NON_LINEAR_BOOST * droplet.r_major.floor();
    let velocity = match droplet.velocity {
        Some(v) if droplet.slowing => {
            let v = Velocity {
                x: v.x / SLOWING_DIVISOR,
                y: v.y / SLOWING_DIVISOR,
            };
            if v.y < ctx.force_y {
                droplet.slowing = false;
            }
            v
        }
        Some(_) if droplet.skipping => ctx.base_velocity(),
        Some(v) => Velocity {
            x: v.x + ctx.force_x * weight,
            y: v.y + ctx.force_y * weight,
        },
        None => ctx.base_velocity(),
    };

    droplet.velocity = Some(velocity);
    droplet.x += velocity.x;
    droplet.y += velocity.y;
    Motion::Moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::{DropletHandle, Outline};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::rc::Rc;

    fn ctx() -> GravityContext {
        GravityContext::from_config(&RainConfig {
            width: 200,
            height: 200,
            ..RainConfig::default()
        })
    }

    fn droplet(y: f32, radius: f32) -> Droplet {
        let mut rng = StdRng::seed_from_u64(0);
        let outline = Rc::new(Outline::generate(2, &mut rng));
        Droplet::new(DropletHandle(1), 100.0, y, radius, 0.0, outline, &mut rng)
    }

    #[test]
    fn test_none_stops_immediately() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut d = droplet(50.0, 5.0);
        assert_eq!(GravityPolicy::None.advance(&mut d, &ctx(), &mut rng), Motion::Stopped);
        assert_eq!(d.y, 50.0);
    }

    #[test]
    fn test_exited_droplet_stops_under_every_policy() {
        let mut rng = StdRng::seed_from_u64(0);
        for policy in [GravityPolicy::None, GravityPolicy::Linear, GravityPolicy::NonLinear] {
            let mut d = droplet(300.0, 5.0);
            let before = d.clone();
            assert_eq!(policy.advance(&mut d, &ctx(), &mut rng), Motion::Stopped);
            assert_eq!(d.y, before.y);
            assert_eq!(d.seed, before.seed);
            assert!(d.velocity.is_none());
        }
    }

    #[test]
    fn test_linear_accelerates() {
        let mut rng = StdRng::seed_from_u64(0);
        let ctx = ctx();
        let mut d = droplet(10.0, 10.0);

        assert_eq!(GravityPolicy::Linear.advance(&mut d, &ctx, &mut rng), Motion::Moved);
        assert_eq!(d.velocity.unwrap().y, ctx.force_y);
        assert!((d.y - (10.0 + ctx.force_y)).abs() < 1e-6);

        GravityPolicy::Linear.advance(&mut d, &ctx, &mut rng);
        let expected = ctx.force_y + ctx.force_y * 10.0;
        assert!((d.velocity.unwrap().y - expected).abs() < 1e-6);
    }

    #[test]
    fn test_non_linear_slowing_is_strictly_decreasing() {
        let mut rng = StdRng::seed_from_u64(5);
        let ctx = ctx();
        let mut d = droplet(10.0, 8.0);
        d.velocity = Some(Velocity { x: 0.0, y: 4.0 });
        d.slowing = true;
        d.seed = i32::MAX;

        let mut last = 4.0f32;
        while d.slowing {
            GravityPolicy::NonLinear.advance(&mut d, &ctx, &mut rng);
            let speed = d.velocity.unwrap().y;
            assert!(speed < last, "{speed} !< {last}");
            last = speed;
        }
        assert!(last < ctx.force_y);
    }

    #[test]
    fn test_non_linear_skipping_resets_velocity() {
        let mut rng = StdRng::seed_from_u64(5);
        let ctx = ctx();
        let mut d = droplet(10.0, 8.0);
        d.velocity = Some(Velocity { x: 0.0, y: 3.0 });
        d.slowing = false;
        d.skipping = true;
        d.seed = 10;

        GravityPolicy::NonLinear.advance(&mut d, &ctx, &mut rng);
        assert_eq!(d.velocity.unwrap().y, ctx.force_y);
        assert_eq!(d.seed, 9);
    }

    #[test]
    fn test_non_linear_accelerating_phase() {
        let mut rng = StdRng::seed_from_u64(5);
        let ctx = ctx();
        let mut d = droplet(10.0, 8.0);
        d.velocity = Some(Velocity { x: 0.0, y: 1.0 });
        d.slowing = false;
        d.skipping = false;
        d.seed = 10;

        GravityPolicy::NonLinear.advance(&mut d, &ctx, &mut rng);
        let expected = 1.0 + ctx.force_y * NON_LINEAR_BOOST * 8.0;
        assert!((d.velocity.unwrap().y - expected).abs() < 1e-6);
    }

    #[test]
    fn test_non_linear_phase_roll_flips_skipping() {
        let mut rng = StdRng::seed_from_u64(5);
        let ctx = ctx();
        let mut d = droplet(10.0, 8.0);
        let skipping = d.skipping;

        GravityPolicy::NonLinear.advance(&mut d, &ctx, &mut rng);
        assert_eq!(d.skipping, !skipping);
        assert!(d.slowing);
        assert!(d.seed < ctx.fps as i32);
        assert_eq!(d.velocity.unwrap().y, ctx.force_y);
    }

    #[test]
    fn test_non_linear_eventually_falls_off_surface() {
        let mut rng = StdRng::seed_from_u64(9);
        let ctx = ctx();
        let mut d = droplet(10.0, 8.0);

        let mut ticks = 0;
        while GravityPolicy::NonLinear.advance(&mut d, &ctx, &mut rng) == Motion::Moved {
            ticks += 1;
            assert!(ticks < 1_000_000, "droplet never left the surface");
        }
        assert!(d.y - d.r_major > 200.0);
    }
}
