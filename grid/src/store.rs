//! The sparse store: a HashMap of [Chunk]s.
//!
//! Invariants, relied on by everything downstream:
//!
//! - Every stored chunk has at least one live bit.  Writes that clear the
//!   last bit of a chunk drop the chunk on the spot.
//! - `population` always equals the sum of popcounts over stored chunks.
//! - The cached bounding rectangle covers every stored chunk.  It can be
//!   stale in the other direction (bigger than the live region) until a
//!   caller asks for it after a removal.
use std::collections::HashMap;

use crate::chunk::Chunk;
use crate::coords::{CellAddress, ChunkCoord, ChunkRect};

// Don't derive Debug: printing millions of cells helps nobody.
#[derive(Clone, Default)]
pub struct ChunkStore {
    chunks: HashMap<ChunkCoord, Chunk>,
    population: u64,
    bbox: Option<ChunkRect>,
    bbox_dirty: bool,
}

impl ChunkStore {
    pub fn new() -> ChunkStore {
        Default::default()
    }

    /// Read a cell.  Absent chunks read as dead.
    pub fn get_cell(&self, x: i64, y: i64) -> bool {
        let addr = CellAddress::from_global(x, y);
        self.chunks
            .get(&addr.chunk)
            .map(|c| c.get(addr.lx, addr.ly))
            .unwrap_or(false)
    }

    /// Write a cell, returning the old value.
    ///
    /// A dead write to a coordinate whose chunk is absent is a no-op and
    /// does not allocate.
    pub fn set_cell(&mut self, x: i64, y: i64, alive: bool) -> bool {
        let addr = CellAddress::from_global(x, y);
        if !alive {
            let chunk = match self.chunks.get_mut(&addr.chunk) {
                Some(c) => c,
                None => return false,
            };
            let old = chunk.set(addr.lx, addr.ly, false);
            if old {
                self.population -= 1;
                if chunk.is_empty() {
                    self.chunks.remove(&addr.chunk);
                    self.bbox_dirty = true;
                }
            }
            return old;
        }

        let chunk = self.chunks.entry(addr.chunk).or_insert_with(|| {
            log::trace!("materializing chunk at {:?}", addr.chunk);
            Chunk::new()
        });
        let old = chunk.set(addr.lx, addr.ly, true);
        if !old {
            self.population += 1;
            self.expand_bbox(addr.chunk);
        }
        old
    }

    pub fn get_chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    pub fn contains_chunk(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    /// Install a whole chunk, replacing whatever was there.  Used by the
    /// generator, the loaders, and history replay.
    pub fn insert_chunk(&mut self, coord: ChunkCoord, chunk: Chunk) {
        debug_assert!(!chunk.is_empty(), "empty chunks must never be stored");
        self.population += chunk.population() as u64;
        if let Some(old) = self.chunks.insert(coord, chunk) {
            self.population -= old.population() as u64;
        }
        self.expand_bbox(coord);
    }

    pub fn remove_chunk(&mut self, coord: ChunkCoord) -> Option<Chunk> {
        let old = self.chunks.remove(&coord);
        if let Some(c) = old.as_ref() {
            self.population -= c.population() as u64;
            self.bbox_dirty = true;
        }
        old
    }

    /// Unordered iteration over stored chunks.
    pub fn iter(&self) -> impl Iterator<Item = (ChunkCoord, &Chunk)> {
        self.chunks.iter().map(|(c, ch)| (*c, ch))
    }

    /// Visit every live cell as a global coordinate.
    pub fn for_each_live(&self, mut f: impl FnMut(i64, i64)) {
        for (coord, chunk) in self.iter() {
            let (ox, oy) = coord.origin();
            for ly in 0..crate::CHUNK_SIZE {
                let mut row = chunk.row(ly);
                while row != 0 {
                    let lx = row.trailing_zeros();
                    f(ox + lx as i64, oy + ly as i64);
                    row &= row - 1;
                }
            }
        }
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn population(&self) -> u64 {
        self.population
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
        self.population = 0;
        self.bbox = None;
        self.bbox_dirty = false;
    }

    /// The chunk-aligned bounding rectangle, or None when the store is
    /// empty.  Recomputed here if a removal left the cache stale.
    pub fn bounding_rect(&mut self) -> Option<ChunkRect> {
        if self.bbox_dirty {
            self.bbox = None;
            for coord in self.chunks.keys() {
                match self.bbox.as_mut() {
                    Some(r) => r.expand(*coord),
                    None => self.bbox = Some(ChunkRect::of(*coord)),
                }
            }
            self.bbox_dirty = false;
        }
        self.bbox
    }

    fn expand_bbox(&mut self, coord: ChunkCoord) {
        if self.bbox_dirty {
            return;
        }
        match self.bbox.as_mut() {
            Some(r) => r.expand(coord),
            None => self.bbox = Some(ChunkRect::of(coord)),
        }
    }
}
