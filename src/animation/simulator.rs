//! Simulator - Main driver of a rain run.
//!
//! Owns every droplet, the glass surface and the timer queue. Exactly one
//! task runs at a time: either the spawn task, which drops new droplets onto
//! the glass, or the animation task of a single droplet.

use std::collections::VecDeque;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use super::{DropletKey, Droplets, Scheduler, TaskHandle};
use crate::compute::{
    CollisionGrid, Droplet, DropletHandle, GravityContext, Motion, OutlineCache, TrailSpawn,
};
use crate::render::{Reflection, Surface};
use crate::schema::{ConfigError, GravityPolicy, Preset, RainConfig, max_droplet_radius};

/// Work item of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Maybe spawn one droplet from the presets.
    Spawn,
    /// Advance one droplet.
    Animate(DropletKey),
}

/// Counters describing a run so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SimulationStats {
    /// Droplets created, drawn-only ones included.
    pub spawned: usize,
    /// Droplets that got an animation task.
    pub animated: usize,
    /// Animated droplets still alive.
    pub active: usize,
    /// Droplets that slid off the surface.
    pub exited: usize,
    /// Collisions resolved.
    pub merged: usize,
    /// Trail droplets spawned.
    pub trails: usize,
    /// Animation tasks cancelled.
    pub cancelled: usize,
}

/// Merge events kept by a [`Simulator`] before the oldest are dropped.
pub const MERGE_LOG_LIMIT: usize = 4096;

/// A resolved collision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeEvent {
    /// Virtual time of the merge.
    pub at_ms: u64,
    pub kept: DropletHandle,
    pub removed: DropletHandle,
    /// Survivor geometry right after the merge.
    pub x: f32,
    pub y: f32,
    pub r_major: f32,
}

pub struct Simulator<S: Surface> {
    config: RainConfig,
    gravity: GravityContext,
    surface: S,
    reflection: Reflection,
    rng: StdRng,
    outlines: OutlineCache,
    droplets: Droplets,
    scheduler: Scheduler<Task>,
    grid: Option<CollisionGrid>,
    presets: Vec<Preset>,
    /// Started with a non-zero tick interval.
    animated: bool,
    spawn_task: Option<TaskHandle>,
    next_handle: u64,
    stats: SimulationStats,
    merges: VecDeque<MergeEvent>,
}

impl<S: Surface> Simulator<S> {
    /// Create a simulator drawing onto `surface`.
    ///
    /// The configuration is validated once here and stays fixed for the
    /// whole run.
    pub fn new(config: RainConfig, surface: S, reflection: Reflection) -> Result<Self, ConfigError> {
        config.validate()?;

        if (surface.width(), surface.height()) != (config.width, config.height) {
            warn!(
                "Surface is {}x{} but config says {}x{}",
                surface.width(),
                surface.height(),
                config.width,
                config.height
            );
        }

        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            gravity: GravityContext::from_config(&config),
            outlines: OutlineCache::new(config.shape_iterations),
            config,
            surface,
            reflection,
            rng,
            droplets: Droplets::new(),
            scheduler: Scheduler::new(),
            grid: None,
            presets: Vec::new(),
            animated: false,
            spawn_task: None,
            next_handle: 0,
            stats: SimulationStats::default(),
            merges: VecDeque::new(),
        })
    }

    /// Start raining with `presets`.
    ///
    /// A `tick_interval_ms` of 0 draws a static population, each preset's
    /// `quan` being an exact count. Otherwise a spawn task runs every
    /// `tick_interval_ms` and droplets above the gravity threshold are
    /// animated.
    pub fn start(&mut self, presets: &[Preset], tick_interval_ms: u64) -> Result<(), ConfigError> {
        Preset::validate_all(presets)?;
        self.presets = presets.to_vec();

        if let Some(task) = self.spawn_task.take() {
            self.scheduler.cancel(task);
        }

        if tick_interval_ms == 0 {
            self.animated = false;
            info!("Drawing static rain from {} presets", presets.len());
            let (width, height) = (self.config.width as f32, self.config.height as f32);
            for preset in presets {
                for _ in 0..preset.count() {
                    let x = self.rng.gen_range(0.0..width);
                    let y = self.rng.gen_range(0.0..height);
                    self.put_droplet(x, y, preset.min, preset.base);
                }
            }
            return Ok(());
        }

        self.animated = true;
        if self.config.collisions && self.grid.is_none() {
            let max_radius = max_droplet_radius(presets);
            self.grid = CollisionGrid::new(self.config.width, self.config.height, max_radius);
            if self.grid.is_none() {
                warn!("Largest droplet radius is {max_radius}, collisions disabled");
            }
        }

        self.spawn_task = Some(self.scheduler.schedule_repeating(Task::Spawn, tick_interval_ms));
        info!(
            "Rain started: {}x{}, spawn every {}ms, {} fps, collisions {}",
            self.config.width,
            self.config.height,
            tick_interval_ms,
            self.config.fps,
            if self.grid.is_some() { "on" } else { "off" }
        );
        Ok(())
    }

    /// Create and draw a droplet of radius `uniform(0, 1) * base + min`
    /// centred on `(x, y)`.
    ///
    /// In animated mode droplets above the gravity threshold get an
    /// animation task and join the collision grid; their key is returned.
    pub fn put_droplet(&mut self, x: f32, y: f32, min: f32, base: f32) -> Option<DropletKey> {
        let outline = self.outlines.get(min, base, &mut self.rng);
        let handle = DropletHandle(self.next_handle);
        self.next_handle += 1;

        let droplet = Droplet::new(handle, x, y, min, base, outline, &mut self.rng);
        draw(&mut self.surface, &self.reflection, &mut self.rng, &droplet);
        self.stats.spawned += 1;

        if !self.animated || droplet.r_major <= self.config.gravity_threshold {
            return None;
        }

        debug!(
            "Droplet {} at ({}, {}) r={:.2}",
            handle.0, droplet.x, droplet.y, droplet.r_major
        );
        let key = self.droplets.checkout(droplet);
        let task = self
            .scheduler
            .schedule_repeating(Task::Animate(key), self.config.tick_interval_ms());
        if let Some(droplet) = self.droplets.get_mut(key) {
            droplet.task = Some(task);
            if let Some(grid) = self.grid.as_mut() {
                grid.update(key.index, droplet, false);
            }
        }
        self.stats.animated += 1;
        Some(key)
    }

    /// Run every task due within the next `elapsed_ms` virtual milliseconds.
    pub fn advance(&mut self, elapsed_ms: u64) {
        let until = self.scheduler.now().saturating_add(elapsed_ms);
        while let Some((handle, task)) = self.scheduler.pop_due(until) {
            match task {
                Task::Spawn => self.spawn(),
                Task::Animate(key) => self.animate(handle, key),
            }
        }
    }

    fn spawn(&mut self) {
        let u: f32 = self.rng.gen_range(0.0..1.0);
        let Some(preset) = self.presets.iter().find(|p| u < p.quan).copied() else {
            return;
        };
        let x = self.rng.gen_range(0.0..self.config.width as f32);
        let y = self.rng.gen_range(0.0..self.config.height as f32);
        self.put_droplet(x, y, preset.min, preset.base);
    }

    /// One animation tick of the droplet at `key`.
    fn animate(&mut self, handle: TaskHandle, key: DropletKey) {
        let now = self.scheduler.now();
        let Some(droplet) = self.droplets.get_mut(key).filter(|d| !d.terminated) else {
            debug!("Dropping stale task {}", handle.0);
            if self.scheduler.cancel(handle) {
                self.stats.cancelled += 1;
            }
            return;
        };

        let motion = match self.config.gravity {
            GravityPolicy::None => Motion::Stopped,
            policy => {
                self.surface.erase(droplet.footprint());
                let motion = policy.advance(droplet, &self.gravity, &mut self.rng);
                if motion == Motion::Moved {
                    draw(&mut self.surface, &self.reflection, &mut self.rng, droplet);
                }
                motion
            }
        };
        let stopped = motion == Motion::Stopped;

        let trail: Option<TrailSpawn> = if stopped {
            None
        } else {
            self.config.trail.trail(droplet, &mut self.rng)
        };

        let collided = match self.grid.as_mut() {
            Some(grid) => grid.update(key.index, droplet, stopped),
            None => None,
        };
        let exited = droplet.has_exited(self.gravity.width, self.gravity.height);

        if let Some(other) = collided {
            self.merge(key, other, now);
        }

        if stopped {
            if exited {
                debug!("Droplet {} left the surface", key.handle.0);
                self.stats.exited += 1;
            }
            self.terminate(key);
        }

        if let Some(spawn) = trail {
            self.stats.trails += 1;
            self.put_droplet(spawn.x, spawn.y, spawn.min, spawn.base);
        }
    }

    /// Fold the droplet in slot `other` into the one at `key`.
    fn merge(&mut self, key: DropletKey, other: usize, now: u64) {
        let Some(other_key) = self.droplets.key_at(other).filter(|k| *k != key) else {
            return;
        };
        let (Some(kept), Some(removed)) = (self.droplets.get(key), self.droplets.get(other_key))
        else {
            return;
        };
        let (kept_area, removed_area) = (kept.footprint(), removed.footprint());
        self.surface.erase(kept_area);
        self.surface.erase(removed_area);

        let Some(removed) = self.terminate(other_key) else {
            return;
        };
        let Some(survivor) = self.droplets.get_mut(key) else {
            return;
        };
        self.config.collision.resolve(survivor, &removed);
        draw(&mut self.surface, &self.reflection, &mut self.rng, survivor);

        let event = MergeEvent {
            at_ms: now,
            kept: survivor.handle,
            removed: removed.handle,
            x: survivor.x,
            y: survivor.y,
            r_major: survivor.r_major,
        };
        debug!(
            "Droplet {} absorbed {} at ({}, {})",
            event.kept.0, event.removed.0, event.x, event.y
        );
        self.stats.merged += 1;
        self.record_merge(event);
    }

    fn record_merge(&mut self, event: MergeEvent) {
        if self.merges.len() == MERGE_LOG_LIMIT {
            self.merges.pop_front();
        }
        self.merges.push_back(event);
    }

    /// Stop the droplet at `key` for good: cancel its task, drop it from
    /// the grid and free its slot. What it drew stays on the surface.
    fn terminate(&mut self, key: DropletKey) -> Option<Droplet> {
        let droplet = self.droplets.get_mut(key)?;
        droplet.terminated = true;

        if let Some(grid) = self.grid.as_mut() {
            grid.update(key.index, droplet, true);
        }
        if let Some(task) = droplet.task.take()
            && self.scheduler.cancel(task)
        {
            self.stats.cancelled += 1;
        }

        self.droplets.free(key)
    }

    pub fn config(&self) -> &RainConfig {
        &self.config
    }

    pub fn stats(&self) -> SimulationStats {
        SimulationStats {
            active: self.droplets.len(),
            ..self.stats
        }
    }

    /// Recent collisions, oldest first. Only the last [`MERGE_LOG_LIMIT`]
    /// are kept; `stats().merged` counts all of them.
    pub fn merges(&self) -> &VecDeque<MergeEvent> {
        &self.merges
    }

    /// Take the recorded collisions, leaving the log empty.
    pub fn drain_merges(&mut self) -> Vec<MergeEvent> {
        self.merges.drain(..).collect()
    }

    pub fn droplet(&self, key: DropletKey) -> Option<&Droplet> {
        self.droplets.get(key)
    }

    pub fn droplets(&self) -> &Droplets {
        &self.droplets
    }

    pub fn collisions_enabled(&self) -> bool {
        self.grid.is_some()
    }

    /// Current virtual time in milliseconds.
    pub fn now(&self) -> u64 {
        self.scheduler.now()
    }

    /// Number of live scheduler tasks, spawn task included.
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.len()
    }

    pub fn is_task_scheduled(&self, handle: TaskHandle) -> bool {
        self.scheduler.is_scheduled(handle)
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }
}

fn draw<S: Surface + ?Sized>(surface: &mut S, reflection: &Reflection, rng: &mut StdRng, droplet: &Droplet) {
    let clip = droplet.clip_path(rng);
    reflection.draw(surface, &clip, droplet.bounds());
}
