//! Doubling tracking table with tombstone slots.
//!
//! [`GrowableTable`] is the shared storage discipline of the transient
//! arena and the handle cache. Entries are appended at the high-water
//! mark; a removed entry leaves a tombstone (an empty slot) behind so
//! indices and scan order never shift. When the high-water mark reaches
//! capacity, capacity doubles (0 grows to 1). The backing storage only
//! grows: [`drain`](GrowableTable::drain) resets the high-water mark but
//! keeps the allocation for the next episode.

use tether_core::{FatalError, TableKind};

/// A growable, index-stable table of owned entries.
pub struct GrowableTable<T> {
    /// Slots `[0, high_water_mark)`. `None` is a tombstone.
    entries: Vec<Option<T>>,
    /// Logical capacity. Always zero or a power of two.
    length: usize,
    /// Which table this is, for growth-failure diagnostics.
    kind: TableKind,
}

impl<T> GrowableTable<T> {
    /// Create an empty table with zero capacity.
    pub const fn new(kind: TableKind) -> Self {
        Self {
            entries: Vec::new(),
            length: 0,
            kind,
        }
    }

    /// Create a table with room for `capacity` entries before the first
    /// growth. `capacity` must be zero or a power of two.
    pub fn with_capacity(kind: TableKind, capacity: usize) -> Result<Self, FatalError> {
        debug_assert!(capacity == 0 || capacity.is_power_of_two());
        let mut table = Self::new(kind);
        table
            .entries
            .try_reserve_exact(capacity)
            .map_err(|_| FatalError::TableGrowthFailed {
                table: kind,
                requested: capacity,
            })?;
        table.length = capacity;
        Ok(table)
    }

    /// Append `value` at the high-water mark, growing if full.
    ///
    /// Returns the slot index. Tombstones are never reused.
    pub fn push(&mut self, value: T) -> Result<usize, FatalError> {
        if self.entries.len() == self.length {
            self.grow()?;
        }
        let index = self.entries.len();
        self.entries.push(Some(value));
        Ok(index)
    }

    fn grow(&mut self) -> Result<(), FatalError> {
        let requested = if self.length == 0 {
            1
        } else {
            self.length
                .checked_mul(2)
                .ok_or(FatalError::TableGrowthFailed {
                    table: self.kind,
                    requested: usize::MAX,
                })?
        };
        self.entries
            .try_reserve_exact(requested - self.entries.len())
            .map_err(|_| FatalError::TableGrowthFailed {
                table: self.kind,
                requested,
            })?;
        tracing::debug!(table = %self.kind, from = self.length, to = requested, "table grown");
        self.length = requested;
        Ok(())
    }

    /// Shared access to a live slot.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.entries.get(index)?.as_ref()
    }

    /// Mutable access to a live slot.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.entries.get_mut(index)?.as_mut()
    }

    /// Clear a slot, leaving a tombstone. Returns the removed entry.
    pub fn take(&mut self, index: usize) -> Option<T> {
        self.entries.get_mut(index)?.take()
    }

    /// Iterate live entries in insertion order, skipping tombstones.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|v| (i, v)))
    }

    /// Index of the first live entry matching `pred`.
    pub fn position(&self, mut pred: impl FnMut(&T) -> bool) -> Option<usize> {
        self.iter().find(|(_, v)| pred(v)).map(|(i, _)| i)
    }

    /// Remove every entry and reset the high-water mark to zero.
    ///
    /// Capacity is retained. Tombstones are skipped.
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.entries.drain(..).flatten()
    }

    /// Number of slots in use, tombstones included.
    pub fn high_water_mark(&self) -> usize {
        self.entries.len()
    }

    /// Number of live (non-tombstone) entries.
    pub fn live_count(&self) -> usize {
        self.entries.iter().filter(|slot| slot.is_some()).count()
    }

    /// Whether the table holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(Option::is_none)
    }

    /// Current logical capacity.
    pub fn capacity(&self) -> usize {
        self.length
    }

    /// Which table this is.
    pub fn kind(&self) -> TableKind {
        self.kind
    }
}
