//! Schema module - Configuration, preset and scene types for rain simulations.

mod config;
mod preset;
mod scene;

pub use config::*;
pub use preset::*;
pub use scene::*;
