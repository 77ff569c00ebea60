//! Uniform collision grid and merge policies.
//!
//! The surface is split into square buckets one droplet diameter wide, so two
//! touching droplets always sit in the same or adjacent buckets. Droplets only
//! travel downward, which means a moving droplet needs to look at its own
//! bucket and the five around and below it.

use super::Droplet;
use crate::schema::CollisionPolicy;

/// Bucket coordinates inside a [`CollisionGrid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCell {
    pub column: usize,
    pub row: usize,
}

/// Offsets scanned after a droplet's own bucket: left, ahead-left, ahead,
/// ahead-right, right. "Ahead" is one row further down.
const NEIGHBOURS: [(isize, isize); 5] = [(-1, 0), (-1, 1), (0, 1), (1, 1), (1, 0)];

#[derive(Debug, Clone)]
pub struct CollisionGrid {
    cell_size: f32,
    columns: usize,
    rows: usize,
    /// Arena slot indices, row-major.
    buckets: Vec<Vec<usize>>,
}

impl CollisionGrid {
    /// Grid covering a `width x height` surface for droplets up to
    /// `max_radius`. `None` when a cell would be narrower than one pixel.
    pub fn new(width: u32, height: u32, max_radius: f32) -> Option<Self> {
        let cell_size = (2.0 * max_radius).ceil();
        if cell_size.is_nan() || cell_size < 1.0 {
            return None;
        }

        let columns = ((width as f32 / cell_size).ceil() as usize).max(1);
        let rows = ((height as f32 / cell_size).ceil() as usize).max(1);

        Some(Self {
            cell_size,
            columns,
            rows,
            buckets: vec![Vec::new(); columns * rows],
        })
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Bucket holding position `(x, y)`, clamped into the grid.
    pub fn cell_for(&self, x: f32, y: f32) -> GridCell {
        let clamp = |v: f32, len: usize| -> usize {
            let i = (v / self.cell_size).floor();
            if i > 0.0 { (i as usize).min(len - 1) } else { 0 }
        };
        GridCell {
            column: clamp(x, self.columns),
            row: clamp(y, self.rows),
        }
    }

    /// Slots currently stored in `cell`.
    pub fn bucket(&self, cell: GridCell) -> &[usize] {
        &self.buckets[self.index(cell)]
    }

    /// True if `slot` is stored anywhere in the grid.
    pub fn contains(&self, slot: usize) -> bool {
        self.buckets.iter().any(|b| b.contains(&slot))
    }

    /// Re-bucket the droplet in arena `slot` and look for a collision.
    ///
    /// The first registration of a droplet never reports a collision. With
    /// `force_remove` the droplet is dropped from the grid and its
    /// `grid_cell` cleared. Otherwise returns the first other slot found in
    /// the droplet's bucket or one of its five forward neighbours.
    pub fn update(&mut self, slot: usize, droplet: &mut Droplet, force_remove: bool) -> Option<usize> {
        let Some(previous) = droplet.grid_cell else {
            if !force_remove {
                let cell = self.cell_for(droplet.x, droplet.y);
                self.insert(slot, cell);
                droplet.grid_cell = Some(cell);
            }
            return None;
        };

        self.remove(slot, previous);
        if force_remove {
            droplet.grid_cell = None;
            return None;
        }

        let cell = self.cell_for(droplet.x, droplet.y);
        self.insert(slot, cell);
        droplet.grid_cell = Some(cell);

        self.scan(slot, cell)
    }

    fn scan(&self, slot: usize, cell: GridCell) -> Option<usize> {
        let own = std::iter::once(cell);
        let around = NEIGHBOURS.iter().filter_map(|&(dc, dr)| {
            let column = cell.column.checked_add_signed(dc)?;
            let row = cell.row.checked_add_signed(dr)?;
            (column < self.columns && row < self.rows).then_some(GridCell { column, row })
        });

        own.chain(around)
            .flat_map(|c| self.bucket(c).iter().copied())
            .find(|&other| other != slot)
    }

    fn insert(&mut self, slot: usize, cell: GridCell) {
        let i = self.index(cell);
        self.buckets[i].push(slot);
    }

    fn remove(&mut self, slot: usize, cell: GridCell) {
        let i = self.index(cell);
        let bucket = &mut self.buckets[i];
        if let Some(pos) = bucket.iter().position(|&s| s == slot) {
            bucket.swap_remove(pos);
        }
    }

    #[inline]
    fn index(&self, cell: GridCell) -> usize {
        cell.row * self.columns + cell.column
    }
}

impl CollisionPolicy {
    /// Fold `absorbed` into `survivor`.
    pub fn resolve(self, survivor: &mut Droplet, absorbed: &Droplet) {
        survivor.x = 0.5 * (survivor.x + absorbed.x);
        survivor.y = 0.5 * (survivor.y + absorbed.y);

        if self == CollisionPolicy::Absorb {
            let volume = survivor.r_major.powi(3) + absorbed.r_major.powi(3);
            survivor.resize(volume.cbrt());
        }
    }
}
