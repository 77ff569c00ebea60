//! Scene files: everything the CLI needs to run one rain simulation.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{ConfigError, Preset, RainConfig, default_presets};

fn default_speed() -> u64 {
    50
}

fn default_output() -> PathBuf {
    PathBuf::from("rain.png")
}

/// A complete scene description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    pub config: RainConfig,
    /// Droplet size presets, in selection order.
    pub presets: Vec<Preset>,
    /// Spawn interval in milliseconds; 0 renders a static population.
    #[serde(default = "default_speed")]
    pub speed: u64,
    /// Background image. A synthetic gradient is used when absent.
    #[serde(default)]
    pub background: Option<PathBuf>,
    /// Where the final composite is written.
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            config: RainConfig::default(),
            presets: default_presets(),
            speed: default_speed(),
            background: None,
            output: default_output(),
        }
    }
}

impl Scene {
    /// Load and validate a scene from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SceneError> {
        let text = fs::read_to_string(path)?;
        let scene: Scene = serde_json::from_str(&text)?;
        scene.validate()?;
        Ok(scene)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.config.validate()?;
        Preset::validate_all(&self.presets)
    }
}

/// Errors raised while loading a scene.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("Failed to read scene: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse scene: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid scene: {0}")]
    Config(#[from] ConfigError),
}
