//! Droplet size presets.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// One droplet size class.
///
/// A droplet created from a preset has radius `uniform(0, 1) * base + min`.
/// `quan` is read as an exact count in static mode and as a cumulative
/// probability threshold when droplets are spawned continuously.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// Minimum droplet radius.
    pub min: f32,
    /// Random radius added on top of `min`.
    pub base: f32,
    /// Count (static mode) or cumulative probability (animated mode).
    pub quan: f32,
}

impl Preset {
    pub fn new(min: f32, base: f32, quan: f32) -> Self {
        Self { min, base, quan }
    }

    /// Largest radius a droplet from this preset can reach.
    #[inline]
    pub fn max_radius(&self) -> f32 {
        self.min + self.base
    }

    /// Number of droplets placed in static mode.
    #[inline]
    pub fn count(&self) -> usize {
        if self.quan.is_finite() && self.quan > 0.0 {
            self.quan.ceil() as usize
        } else {
            0
        }
    }

    /// Validate a preset list.
    ///
    /// Zero-sized presets are accepted: their droplets get the minimum
    /// radius and the collision grid is simply not built.
    pub fn validate_all(presets: &[Preset]) -> Result<(), ConfigError> {
        for (index, preset) in presets.iter().enumerate() {
            let sizes_ok = preset.min.is_finite()
                && preset.base.is_finite()
                && preset.min >= 0.0
                && preset.base >= 0.0;
            if !sizes_ok {
                return Err(ConfigError::InvalidPreset {
                    index,
                    min: preset.min,
                    base: preset.base,
                });
            }
        }
        Ok(())
    }
}

/// Largest possible droplet radius across a preset list.
pub fn max_droplet_radius(presets: &[Preset]) -> f32 {
    presets
        .iter()
        .map(Preset::max_radius)
        .fold(0.0, f32::max)
}

/// The classic rain preset mix: mostly tiny static
/// droplets with the occasional large runner.
pub fn default_presets() -> Vec<Preset> {
    vec![
        Preset::new(0.0, 2.0, 0.5),
        Preset::new(4.0, 4.0, 0.9),
        Preset::new(6.0, 4.0, 1.0),
    ]
}
