//! Configuration types for rain simulation parameters.

use std::f32::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

/// Largest accepted outline subdivision count (2^n + 1 points per outline).
pub const MAX_SHAPE_ITERATIONS: u32 = 12;

/// How a droplet's velocity evolves per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GravityPolicy {
    /// Droplets never move.
    None,
    /// Constant acceleration.
    Linear,
    /// Slide-stick-slide motion with random dwell phases.
    #[default]
    NonLinear,
}

/// Rule for spawning small droplets behind a moving one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailPolicy {
    /// No trail.
    None,
    /// Small static droplets left above the falling one.
    #[default]
    Drops,
}

/// What is rendered inside a droplet's outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReflectionPolicy {
    /// Flat tint using `RainConfig::fill_color`.
    None,
    /// Miniature, upside-down copy of the background.
    #[default]
    Miniature,
}

/// What happens to two droplets found colliding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Remove the second droplet and move the first to the pair's midpoint.
    #[default]
    Simple,
    /// Like `Simple`, but the survivor also takes over the other's volume.
    Absorb,
}

fn default_opacity() -> f32 {
    1.0
}

fn default_shape_iterations() -> u32 {
    4
}

/// Top-level rain configuration.
///
/// Fixed at `Simulator` construction; policies never change during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RainConfig {
    /// Surface width in pixels.
    pub width: u32,
    /// Surface height in pixels.
    pub height: u32,
    /// Background blur radius. Values below 1 disable the blur.
    pub blur_radius: f32,
    /// Opacity of the glass (droplet) layer in the final composite.
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    #[serde(default)]
    pub gravity: GravityPolicy,
    #[serde(default)]
    pub trail: TrailPolicy,
    #[serde(default)]
    pub reflection: ReflectionPolicy,
    #[serde(default)]
    pub collision: CollisionPolicy,
    /// Enable collision detection between animated droplets.
    #[serde(default)]
    pub collisions: bool,
    /// Animation frames per second of each droplet.
    pub fps: u32,
    /// Direction of gravity in radians; `π/2` is straight down.
    pub gravity_angle: f32,
    /// Droplets with a radius at or below this stay where they are drawn.
    pub gravity_threshold: f32,
    /// RGBA tint used when reflections are off.
    pub fill_color: [u8; 4],
    /// Midpoint subdivisions used to build droplet outlines.
    #[serde(default = "default_shape_iterations")]
    pub shape_iterations: u32,
    /// Fixed RNG seed for reproducible runs.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

impl Default for RainConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            blur_radius: 20.0,
            opacity: 1.0,
            gravity: GravityPolicy::NonLinear,
            trail: TrailPolicy::Drops,
            reflection: ReflectionPolicy::Miniature,
            collision: CollisionPolicy::Simple,
            collisions: false,
            fps: 25,
            gravity_angle: FRAC_PI_2,
            gravity_threshold: 3.0,
            fill_color: [0x8e, 0xd6, 0xff, 0xff],
            shape_iterations: 4,
            rng_seed: None,
        }
    }
}

impl RainConfig {
    /// Base vertical velocity increment per tick.
    #[inline]
    pub fn force_y(&self) -> f32 {
        self.fps as f32 * 0.005 / 25.0
    }

    /// Base horizontal velocity increment per tick, zero when falling straight down.
    #[inline]
    pub fn force_x(&self) -> f32 {
        (FRAC_PI_2 - self.gravity_angle) * self.fps as f32 * 0.005 / 50.0
    }

    /// Interval between two animation ticks of one droplet.
    #[inline]
    pub fn tick_interval_ms(&self) -> u64 {
        1000 / self.fps.max(1) as u64
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if self.fps == 0 {
            return Err(ConfigError::InvalidFps);
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(ConfigError::InvalidOpacity(self.opacity));
        }
        if self.shape_iterations > MAX_SHAPE_ITERATIONS {
            return Err(ConfigError::TooManyShapeIterations(self.shape_iterations));
        }
        if !self.gravity_angle.is_finite() || !self.gravity_threshold.is_finite() {
            return Err(ConfigError::InvalidGravity);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Surface dimensions (width, height) must be non-zero")]
    InvalidDimensions,
    #[error("Frame rate must be non-zero")]
    InvalidFps,
    #[error("Opacity must be within [0, 1], got {0}")]
    InvalidOpacity(f32),
    #[error("Shape iterations must be at most 12, got {0}")]
    TooManyShapeIterations(u32),
    #[error("Gravity angle and threshold must be finite")]
    InvalidGravity,
    #[error("Preset {index} has invalid sizes (min {min}, base {base})")]
    InvalidPreset { index: usize, min: f32, base: f32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(RainConfig::default().validate().is_ok());
    }

    #[test]
    fn test_forces() {
        let config = RainConfig::default();
        assert!((config.force_y() - 0.005).abs() < 1e-7);
        assert_eq!(config.force_x(), 0.0);
        assert_eq!(config.tick_interval_ms(), 40);

        let tilted = RainConfig {
            gravity_angle: 0.0,
            ..RainConfig::default()
        };
        assert!(tilted.force_x() > 0.0);
    }

    #[test]
    fn test_rejects_bad_values() {
        let zero = RainConfig {
            width: 0,
            ..RainConfig::default()
        };
        assert!(matches!(zero.validate(), Err(ConfigError::InvalidDimensions)));

        let opaque = RainConfig {
            opacity: 1.5,
            ..RainConfig::default()
        };
        assert!(matches!(
            opaque.validate(),
            Err(ConfigError::InvalidOpacity(_))
        ));

        let jagged = RainConfig {
            shape_iterations: 20,
            ..RainConfig::default()
        };
        assert!(matches!(
            jagged.validate(),
            Err(ConfigError::TooManyShapeIterations(20))
        ));
    }

    #[test]
    fn test_json_defaults() {
        let config: RainConfig = serde_json::from_str(
            r#"{
                "width": 200,
                "height": 100,
                "blur_radius": 0,
                "fps": 30,
                "gravity_angle": 1.5,
                "gravity_threshold": 3,
                "fill_color": [0, 0, 0, 255],
                "gravity": "linear"
            }"#,
        )
        .unwrap();

        assert_eq!(config.gravity, GravityPolicy::Linear);
        assert_eq!(config.trail, TrailPolicy::Drops);
        assert_eq!(config.reflection, ReflectionPolicy::Miniature);
        assert!(!config.collisions);
        assert_eq!(config.shape_iterations, 4);
        assert_eq!(config.opacity, 1.0);
    }
}
