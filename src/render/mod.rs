//! Render module - Drawing surface, glass canvas and image preparation.

mod background;
mod canvas;
mod reflection;
mod surface;

pub use background::*;
pub use canvas::*;
pub use reflection::*;
pub use surface::*;
