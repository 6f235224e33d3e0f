//! Bounded undo history, delta-encoded.
//!
//! Each entry records only the chunks that changed across one generation,
//! as `(before, after)` pairs where None means "no chunk on that side".
//! Memory is proportional to change, not to population, which is what makes
//! watching an oscillator cheap to rewind.
use std::collections::HashMap;

use aeon_grid::{Chunk, ChunkCoord, ChunkStore};

pub const MIN_CAPACITY: usize = 5;
pub const MAX_CAPACITY: usize = 100;
pub const DEFAULT_CAPACITY: usize = 20;

pub struct HistoryEntry {
    pub pre_generation: u64,
    pub pre_population: u64,
    delta: HashMap<ChunkCoord, (Option<Chunk>, Option<Chunk>)>,
}

impl HistoryEntry {
    /// Diff two stores.  Returns None when nothing changed, so quiescent
    /// generations don't occupy ring slots.
    pub fn diff(
        pre: &ChunkStore,
        post: &ChunkStore,
        pre_generation: u64,
    ) -> Option<HistoryEntry> {
        let mut delta = HashMap::new();
        for (coord, chunk) in pre.iter() {
            match post.get_chunk(coord) {
                Some(after) if after == chunk => {}
                after => {
                    delta.insert(coord, (Some(*chunk), after.copied()));
                }
            }
        }
        for (coord, chunk) in post.iter() {
            if pre.get_chunk(coord).is_none() {
                delta.insert(coord, (None, Some(*chunk)));
            }
        }

        if delta.is_empty() {
            return None;
        }
        Some(HistoryEntry {
            pre_generation,
            pre_population: pre.population(),
            delta,
        })
    }

    /// Put the store back the way it was before this entry's generation.
    pub fn revert(self, store: &mut ChunkStore) {
        for (coord, (before, _after)) in self.delta {
            match before {
                Some(chunk) => store.insert_chunk(coord, chunk),
                None => {
                    store.remove_chunk(coord);
                }
            }
        }
        debug_assert_eq!(store.population(), self.pre_population);
    }
}

/// FIFO of [HistoryEntry] with a bounded capacity; the oldest entry falls
/// off the front.
pub struct HistoryRing {
    entries: std::collections::VecDeque<HistoryEntry>,
    capacity: usize,
}

impl HistoryRing {
    pub fn new(capacity: usize) -> HistoryRing {
        HistoryRing {
            entries: Default::default(),
            capacity: capacity.clamp(MIN_CAPACITY, MAX_CAPACITY),
        }
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn pop(&mut self) -> Option<HistoryEntry> {
        self.entries.pop_back()
    }

    /// Resize, discarding oldest entries if shrinking below the current
    /// length.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.clamp(MIN_CAPACITY, MAX_CAPACITY);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
