//! Insertion-ordered set with constant-time membership updates.
//!
//! Index buckets hold row handles in the order they were added. Removal
//! leaves a tombstone that is reclaimed once tombstones outnumber live
//! entries, so `add`, `remove` and `contains` stay O(1) amortized.

use core::hash::Hash;
use hashbrown::HashMap;

/// An insertion-ordered set.
#[derive(Clone, Debug)]
pub struct OrderedSet<T> {
    /// Slots in insertion order. `None` marks a removed entry.
    slots: Vec<Option<T>>,
    /// Slot position of every live entry.
    positions: HashMap<T, usize>,
}

impl<T: Eq + Hash + Clone> OrderedSet<T> {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Adds an item at the end. Returns false if it was already present.
    pub fn insert(&mut self, item: T) -> bool {
        if self.positions.contains_key(&item) {
            return false;
        }
        self.positions.insert(item.clone(), self.slots.len());
        self.slots.push(Some(item));
        true
    }

    /// Removes an item. Returns false if it was not present.
    pub fn remove(&mut self, item: &T) -> bool {
        match self.positions.remove(item) {
            Some(pos) => {
                self.slots[pos] = None;
                self.maybe_compact();
                true
            }
            None => false,
        }
    }

    /// Returns true if the item is present.
    #[inline]
    pub fn contains(&self, item: &T) -> bool {
        self.positions.contains_key(item)
    }

    /// Returns the number of live items.
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns true if the set holds no items.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Returns the first live item.
    pub fn first(&self) -> Option<&T> {
        self.iter().next()
    }

    /// Iterates live items in insertion order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        self.slots.iter().flatten()
    }

    /// Removes every item.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.positions.clear();
    }

    fn maybe_compact(&mut self) {
        let live = self.positions.len();
        if live == 0 {
            self.slots.clear();
            return;
        }
        if self.slots.len() < 16 || self.slots.len() <= live * 2 {
            return;
        }
        self.slots.retain(Option::is_some);
        for (pos, slot) in self.slots.iter().enumerate() {
            if let Some(item) = slot {
                if let Some(p) = self.positions.get_mut(item) {
                    *p = pos;
                }
            }
        }
    }
}

impl<T: Eq + Hash + Clone> Default for OrderedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Eq + Hash + Clone> FromIterator<T> for OrderedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        for item in iter {
            set.insert(item);
        }
        set
    }
}

impl<T: Eq + Hash + Clone> Extend<T> for OrderedSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.insert(item);
        }
    }
}
