//! Byte-per-cell tiles, parallel to the bit-packed chunks.
//!
//! Overlays (cell age, activity heat) want one `u8` per cell rather than one
//! bit.  This mirrors [crate::ChunkStore]: a HashMap of fixed tiles keyed by
//! [ChunkCoord], all-zero tiles never retained.
use std::collections::HashMap;

use crate::chunk::CHUNK_SIZE;
use crate::coords::{CellAddress, ChunkCoord};

/// Bytes per tile: one per cell of a 32x32 chunk.
pub const TILE_BYTES: usize = (CHUNK_SIZE * CHUNK_SIZE) as usize;

/// One byte tile.  Byte `ly * 32 + lx` belongs to local cell `(lx, ly)`.
#[derive(Clone, Eq, PartialEq)]
pub struct ByteChunk {
    bytes: [u8; TILE_BYTES],
}

impl Default for ByteChunk {
    fn default() -> Self {
        ByteChunk {
            bytes: [0; TILE_BYTES],
        }
    }
}

impl ByteChunk {
    pub fn new() -> ByteChunk {
        Default::default()
    }

    pub fn get(&self, lx: u32, ly: u32) -> u8 {
        debug_assert!(lx < CHUNK_SIZE);
        debug_assert!(ly < CHUNK_SIZE);
        self.bytes[(ly * CHUNK_SIZE + lx) as usize]
    }

    pub fn set(&mut self, lx: u32, ly: u32, val: u8) {
        debug_assert!(lx < CHUNK_SIZE);
        debug_assert!(ly < CHUNK_SIZE);
        self.bytes[(ly * CHUNK_SIZE + lx) as usize] = val;
    }

    pub fn saturating_add(&mut self, lx: u32, ly: u32, amount: u8) {
        let b = &mut self.bytes[(ly * CHUNK_SIZE + lx) as usize];
        *b = b.saturating_add(amount);
    }

    pub fn bytes(&self) -> &[u8; TILE_BYTES] {
        &self.bytes
    }

    pub fn bytes_mut(&mut self) -> &mut [u8; TILE_BYTES] {
        &mut self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.iter().all(|b| *b == 0)
    }
}

#[derive(Clone, Default)]
pub struct ByteStore {
    tiles: HashMap<ChunkCoord, ByteChunk>,
}

impl ByteStore {
    pub fn new() -> ByteStore {
        Default::default()
    }

    /// Read a cell's byte.  Absent tiles read as zero.
    pub fn get_cell(&self, x: i64, y: i64) -> u8 {
        let addr = CellAddress::from_global(x, y);
        self.tiles
            .get(&addr.chunk)
            .map(|t| t.get(addr.lx, addr.ly))
            .unwrap_or(0)
    }

    pub fn tile(&self, coord: ChunkCoord) -> Option<&ByteChunk> {
        self.tiles.get(&coord)
    }

    /// Get a tile for writing, materializing a zero tile if absent.  The
    /// caller is responsible for not leaving it all-zero; sweeps below
    /// enforce the invariant after bulk updates.
    pub fn tile_mut(&mut self, coord: ChunkCoord) -> &mut ByteChunk {
        self.tiles.entry(coord).or_default()
    }

    pub fn insert_tile(&mut self, coord: ChunkCoord, tile: ByteChunk) {
        debug_assert!(!tile.is_empty(), "all-zero tiles must never be stored");
        self.tiles.insert(coord, tile);
    }

    pub fn remove_tile(&mut self, coord: ChunkCoord) -> Option<ByteChunk> {
        self.tiles.remove(&coord)
    }

    /// Drop every all-zero tile.
    pub fn sweep_empty(&mut self) {
        self.tiles.retain(|_, t| !t.is_empty());
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChunkCoord, &ByteChunk)> {
        self.tiles.iter().map(|(c, t)| (*c, t))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ChunkCoord, &mut ByteChunk)> {
        self.tiles.iter_mut().map(|(c, t)| (*c, t))
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
    }
}
