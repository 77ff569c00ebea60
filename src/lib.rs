//! rainyday - Rain drops sliding down a pane of glass.
//!
//! This crate simulates liquid droplets on a window over a static image: the
//! image is stack-blurred once to form the background, and every droplet is
//! drawn as an irregular blob showing a tiny, upside-down reflection of the
//! scene. Droplets fall under configurable gravity, leave trails of smaller
//! droplets and merge when they run into each other.
//!
//! # Architecture
//!
//! The crate is split into four modules:
//!
//! - `schema`: Configuration, droplet presets and scene files
//! - `compute`: Stack blur, droplet outlines, physics and the collision grid
//! - `render`: The drawing surface, the glass canvas and image preparation
//! - `animation`: Droplet storage, the virtual-time scheduler and the simulator
//!
//! # Example
//!
//! ```rust,no_run
//! use rainyday::{
//!     render::{Canvas, Reflection, gradient, prepare_background, prepare_reflection},
//!     schema::{RainConfig, default_presets},
//!     Simulator,
//! };
//!
//! let config = RainConfig::default();
//! let source = gradient(config.width, config.height, [40, 50, 80], [160, 170, 190]);
//! let background = prepare_background(&source, config.width, config.height, config.blur_radius);
//! let reflection = Reflection::from_policy(
//!     config.reflection,
//!     Some(prepare_reflection(&source, config.width, config.height)),
//!     config.fill_color,
//! );
//!
//! let canvas = Canvas::new(config.width, config.height);
//! let mut simulator = Simulator::new(config, canvas, reflection).unwrap();
//! simulator.start(&default_presets(), 50).unwrap();
//! simulator.advance(10_000);
//!
//! println!("Droplets still running: {}", simulator.stats().active);
//! let frame = simulator.into_surface().composite(&background, 1.0);
//! frame.save("rain.png").unwrap();
//! ```

pub mod animation;
pub mod compute;
pub mod render;
pub mod schema;

// Re-export commonly used types
pub use animation::{SimulationStats, Simulator};
pub use render::{Canvas, Reflection, Surface};
pub use schema::{Preset, RainConfig, Scene};
