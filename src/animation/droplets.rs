//! Slot arena holding every live droplet.

use std::collections::VecDeque;

use crate::compute::{Droplet, DropletHandle};

/// Address of a droplet in [`Droplets`].
///
/// The handle guards against slot reuse: once the droplet is freed and its
/// slot handed to another droplet, the key stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DropletKey {
    pub index: usize,
    pub handle: DropletHandle,
}

#[derive(Debug, Default)]
pub struct Droplets {
    slots: Vec<Option<Droplet>>,
    unused: VecDeque<usize>,
    active: usize,
}

impl Droplets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            unused: VecDeque::with_capacity(capacity),
            active: 0,
        }
    }

    /// Store `droplet` in a free slot, growing the arena if none is left.
    pub fn checkout(&mut self, droplet: Droplet) -> DropletKey {
        let handle = droplet.handle;
        let index = match self.unused.pop_front() {
            Some(index) => {
                self.slots[index] = Some(droplet);
                index
            }
            None => {
                self.slots.push(Some(droplet));
                self.slots.len() - 1
            }
        };
        self.active += 1;
        DropletKey { index, handle }
    }

    /// Release the slot of `key`, returning its droplet. Stale keys free
    /// nothing.
    pub fn free(&mut self, key: DropletKey) -> Option<Droplet> {
        self.get(key)?;
        let droplet = self.slots[key.index].take()?;
        self.unused.push_back(key.index);
        self.active -= 1;
        Some(droplet)
    }

    /// True while `key` still names the droplet it was issued for.
    pub fn resolves(&self, key: DropletKey) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: DropletKey) -> Option<&Droplet> {
        self.slots
            .get(key.index)?
            .as_ref()
            .filter(|d| d.handle == key.handle)
    }

    pub fn get_mut(&mut self, key: DropletKey) -> Option<&mut Droplet> {
        self.slots
            .get_mut(key.index)?
            .as_mut()
            .filter(|d| d.handle == key.handle)
    }

    /// Key of whatever droplet currently occupies slot `index`.
    pub fn key_at(&self, index: usize) -> Option<DropletKey> {
        let droplet = self.slots.get(index)?.as_ref()?;
        Some(DropletKey {
            index,
            handle: droplet.handle,
        })
    }

    /// Number of live droplets.
    pub fn len(&self) -> usize {
        self.active
    }

    pub fn is_empty(&self) -> bool {
        self.active == 0
    }

    /// Number of slots, live or free.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DropletKey, &Droplet)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.as_ref().map(|d| {
                (
                    DropletKey {
                        index,
                        handle: d.handle,
                    },
                    d,
                )
            })
        })
    }
}
