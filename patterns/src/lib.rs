//! Pattern interchange: RLE in and out, flat packed bitmaps, and a bounded
//! macrocell (quadtree) reader.
//!
//! Parsers here are strict about resource caps and loose about everything
//! else: unknown characters are skipped, metadata lines are ignored, and a
//! failed parse never produces a partial result.
mod macrocell;
mod packed;
mod rle;
#[cfg(test)]
mod tests;

pub use macrocell::*;
pub use packed::*;
pub use rle::*;

/// Longest run a single RLE count may encode.
pub const MAX_RUN: u64 = 100_000;

/// Most live cells any loader will produce.
pub const MAX_CELLS: usize = 10_000_000;

/// Most nodes a macrocell file may define.
pub const MAX_NODES: usize = 1_000_000;

#[derive(Debug, Eq, PartialEq, derive_more::Display, thiserror::Error)]
pub enum PatternError {
    /// A run count or the total cell output exceeded its cap.
    PatternTooLarge,

    /// A macrocell line that doesn't scan as either a leaf or a branch.
    MacrocellMalformed,

    /// A macrocell node referring to itself or a node not yet defined.
    MacrocellBadReference,

    /// More macrocell nodes than [MAX_NODES].
    MacrocellNodeLimit,
}

/// Tight bounds of a set of cells as `(min_x, min_y, w, h)`, or None for an
/// empty set.
pub fn cell_bounds(cells: &[(i64, i64)]) -> Option<(i64, i64, u64, u64)> {
    let (mut min_x, mut min_y) = (i64::MAX, i64::MAX);
    let (mut max_x, mut max_y) = (i64::MIN, i64::MIN);
    for &(x, y) in cells {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    if cells.is_empty() {
        return None;
    }
    Some((
        min_x,
        min_y,
        (max_x - min_x + 1) as u64,
        (max_y - min_y + 1) as u64,
    ))
}
