//! Animation module - Droplet storage, timer queue and the simulation loop.
//!
//! Everything here runs on a single thread. The [`Scheduler`] works in
//! virtual milliseconds, so a run advances exactly as far as the caller asks
//! and never sleeps:
//!
//! ```text
//! Simulator::advance(ms)
//!   └─ Scheduler::pop_due ──► Task::Spawn         put_droplet from presets
//!                          └► Task::Animate(key)  gravity → trail → grid → merge
//! ```

mod droplets;
mod scheduler;
mod simulator;

pub use droplets::{DropletKey, Droplets};
pub use scheduler::{Scheduler, TaskHandle};
pub use simulator::{MERGE_LOG_LIMIT, MergeEvent, SimulationStats, Simulator, Task};
