//! Visual overlays: per-cell age and per-cell activity heat.
//!
//! Both are byte-per-cell [ByteStore]s parallel to the chunk store.  They
//! are observational only; nothing in the simulation reads them back.
//!
//! Invariant for ages: a byte is non-zero exactly when the paired cell bit
//! is set.  That holds because the age store is rebuilt from the live cells
//! every step rather than patched.
use aeon_grid::{ByteChunk, ByteStore, Chunk, ChunkStore, CHUNK_SIZE};

/// How much a cell's heat counter rises when its state flips.
pub const HEATMAP_BOOST: u8 = 5;

/// Every this many steps, every positive heat counter drops by one.
pub const HEATMAP_DECAY_INTERVAL: u64 = 10;

/// Age store for a freshly-enabled overlay: every currently live cell is
/// age 1.
pub fn seed_ages(store: &ChunkStore) -> ByteStore {
    let mut ages = ByteStore::new();
    for (coord, chunk) in store.iter() {
        let mut tile = ByteChunk::new();
        for ly in 0..CHUNK_SIZE {
            let mut row = chunk.row(ly);
            while row != 0 {
                let lx = row.trailing_zeros();
                tile.set(lx, ly, 1);
                row &= row - 1;
            }
        }
        ages.insert_tile(coord, tile);
    }
    ages
}

/// Build the post-step age store: live cells carry `min(previous + 1, 255)`,
/// dead cells carry nothing.  Cells alive for the first time get 1 because
/// their previous age reads as 0.
pub fn advance_ages(previous: &ByteStore, next_cells: &ChunkStore) -> ByteStore {
    let mut ages = ByteStore::new();
    for (coord, chunk) in next_cells.iter() {
        let prev_tile = previous.tile(coord);
        let mut tile = ByteChunk::new();
        for ly in 0..CHUNK_SIZE {
            let mut row = chunk.row(ly);
            while row != 0 {
                let lx = row.trailing_zeros();
                let prev = prev_tile.map(|t| t.get(lx, ly)).unwrap_or(0);
                tile.set(lx, ly, prev.saturating_add(1));
                row &= row - 1;
            }
        }
        // A stored chunk always has a live bit, so the tile can't be empty.
        ages.insert_tile(coord, tile);
    }
    ages
}

/// Bump heat wherever a cell flipped between the two stores.
pub fn record_activity(heat: &mut ByteStore, pre: &ChunkStore, post: &ChunkStore) {
    let mut bump = |coord, pre_chunk: Option<&Chunk>, post_chunk: Option<&Chunk>| {
        let mut changed_any = false;
        for ly in 0..CHUNK_SIZE {
            let a = pre_chunk.map(|c| c.row(ly)).unwrap_or(0);
            let b = post_chunk.map(|c| c.row(ly)).unwrap_or(0);
            if a != b {
                changed_any = true;
                break;
            }
        }
        if !changed_any {
            return;
        }

        let tile = heat.tile_mut(coord);
        for ly in 0..CHUNK_SIZE {
            let a = pre_chunk.map(|c| c.row(ly)).unwrap_or(0);
            let b = post_chunk.map(|c| c.row(ly)).unwrap_or(0);
            let mut flipped = a ^ b;
            while flipped != 0 {
                let lx = flipped.trailing_zeros();
                tile.saturating_add(lx, ly, HEATMAP_BOOST);
                flipped &= flipped - 1;
            }
        }
    };

    for (coord, pre_chunk) in pre.iter() {
        bump(coord, Some(pre_chunk), post.get_chunk(coord));
    }
    for (coord, post_chunk) in post.iter() {
        if pre.get_chunk(coord).is_none() {
            bump(coord, None, Some(post_chunk));
        }
    }
}

/// One decay tick: every positive counter drops by one, and tiles that hit
/// all-zero are dropped.
pub fn decay_heat(heat: &mut ByteStore) {
    for (_, tile) in heat.iter_mut() {
        for b in tile.bytes_mut().iter_mut() {
            *b = b.saturating_sub(1);
        }
    }
    heat.sweep_empty();
}
