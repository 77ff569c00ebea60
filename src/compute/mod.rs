//! Compute module - Blur, droplet shapes and droplet physics.

mod blur;
mod collision;
mod droplet;
mod gravity;
mod shape;
mod trail;

pub use blur::*;
pub use collision::*;
pub use droplet::*;
pub use gravity::*;
pub use shape::*;
pub use trail::*;
