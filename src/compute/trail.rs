//! Trailing policies: small droplets left behind falling ones.

use rand::Rng;

use super::Droplet;
use crate::schema::TrailPolicy;

/// Vertical gap between a falling droplet's top edge and its trail droplet.
pub const TRAIL_GAP: f32 = 5.0;

/// A droplet the trail policy wants spawned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailSpawn {
    pub x: f32,
    pub y: f32,
    pub min: f32,
    pub base: f32,
}

impl TrailPolicy {
    /// Decide whether `droplet` leaves a trail droplet this tick.
    ///
    /// `Drops` spawns once the droplet has fallen at least
    /// `uniform(0, 10) * r_major` since its last trail droplet.
    pub fn trail<R: Rng + ?Sized>(self, droplet: &mut Droplet, rng: &mut R) -> Option<TrailSpawn> {
        match self {
            TrailPolicy::None => None,
            TrailPolicy::Drops => {
                let due = match droplet.trail_y {
                    None => true,
                    Some(trail_y) => {
                        droplet.y - trail_y >= rng.gen_range(0.0f32..10.0) * droplet.r_major
                    }
                };
                if !due {
                    return None;
                }

                droplet.trail_y = Some(droplet.y);
                Some(TrailSpawn {
                    x: droplet.x,
                    y: droplet.y - droplet.r_major - TRAIL_GAP,
                    min: 0.0,
                    base: (droplet.r_major / 5.0).ceil(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::{DropletHandle, Outline};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::rc::Rc;

    fn droplet(y: f32, radius: f32) -> Droplet {
        let mut rng = StdRng::seed_from_u64(0);
        let outline = Rc::new(Outline::generate(2, &mut rng));
        Droplet::new(DropletHandle(1), 40.0, y, radius, 0.0, outline, &mut rng)
    }

    #[test]
    fn test_none_never_trails() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut d = droplet(50.0, 8.0);
        assert!(TrailPolicy::None.trail(&mut d, &mut rng).is_none());
        assert!(d.trail_y.is_none());
    }

    #[test]
    fn test_first_trail_is_immediate() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut d = droplet(50.0, 8.0);

        let spawn = TrailPolicy::Drops.trail(&mut d, &mut rng).unwrap();
        assert_eq!(d.trail_y, Some(50.0));
        assert_eq!(spawn.x, 40.0);
        assert_eq!(spawn.y, 50.0 - 8.0 - TRAIL_GAP);
        assert_eq!(spawn.min, 0.0);
        assert_eq!(spawn.base, 2.0);
    }

    #[test]
    fn test_no_trail_without_falling() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut d = droplet(50.0, 8.0);
        d.trail_y = Some(50.0);

        // gen_range(0..10) * r is zero with probability zero; no distance was covered
        let spawned = (0..100)
            .filter(|_| TrailPolicy::Drops.trail(&mut d, &mut rng).is_some())
            .count();
        assert!(spawned <= 1);
    }

    #[test]
    fn test_trail_after_long_fall() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut d = droplet(50.0, 8.0);
        d.trail_y = Some(50.0);
        d.y = 50.0 + 10.0 * 8.0;

        assert!(TrailPolicy::Drops.trail(&mut d, &mut rng).is_some());
        assert_eq!(d.trail_y, Some(130.0));
    }
}
