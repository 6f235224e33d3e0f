//! One generation over the whole plane.
//!
//! The per-chunk kernel is SWAR: each 32-bit row word holds 32 cells, and
//! the eight neighbor rows are aligned into eight vectors whose per-lane sum
//! is computed by a carry-save adder tree.  Four result planes `total0..3`
//! then encode every lane's neighbor count in `0..=8` and the rule is
//! applied as a pair of OR-ed count masks.  No per-cell loop anywhere.
use std::collections::HashSet;

use aeon_grid::{Chunk, ChunkCoord, ChunkStore, CHUNK_SIZE};

use crate::rule::Rule;

/// The nine chunks around (and including) a target, missing ones treated as
/// all-dead.
struct Neighborhood<'a> {
    grid: [[Option<&'a Chunk>; 3]; 3],
}

impl<'a> Neighborhood<'a> {
    fn fetch(store: &'a ChunkStore, center: ChunkCoord) -> Neighborhood<'a> {
        let mut grid = [[None; 3]; 3];
        for (dy, row) in grid.iter_mut().enumerate() {
            for (dx, slot) in row.iter_mut().enumerate() {
                *slot = store.get_chunk(center.offset(dx as i32 - 1, dy as i32 - 1));
            }
        }
        Neighborhood { grid }
    }

    /// Row word at horizontal chunk offset `col` (-1, 0, 1) and row `ry` in
    /// `-1..=32`, crossing into the chunk above or below when `ry` leaves
    /// `[0, 32)`.
    fn row(&self, col: i32, ry: i32) -> u32 {
        let (vert, ly) = if ry < 0 {
            (0, CHUNK_SIZE - 1)
        } else if ry >= CHUNK_SIZE as i32 {
            (2, 0)
        } else {
            (1, ry as u32)
        };
        self.grid[vert][(col + 1) as usize]
            .map(|c| c.row(ly))
            .unwrap_or(0)
    }
}

#[inline(always)]
fn majority3(a: u32, b: u32, c: u32) -> u32 {
    (a & b) | (a & c) | (b & c)
}

/// Compute one output row.  `c` is the center row; the other eight are the
/// neighbor vectors already aligned with it.
#[inline(always)]
fn advance_row(rule: Rule, c: u32, vectors: [u32; 8]) -> u32 {
    let [n, s, w, e, nw, ne, sw, se] = vectors;

    // Pairwise half-adders, then fold the sum and carry planes separately.
    let s0 = n ^ s;
    let c0 = n & s;
    let s1 = w ^ e;
    let c1 = w & e;
    let s2 = nw ^ sw;
    let c2 = nw & sw;
    let s3 = ne ^ se;
    let c3 = ne & se;

    let s01 = s0 ^ s1;
    let c01 = s0 & s1;
    let s23 = s2 ^ s3;
    let c23 = s2 & s3;

    let total0 = s01 ^ s23;
    let carry_s = s01 & s23;

    let sum_a = c01 ^ c23 ^ carry_s;
    let carry_a = majority3(c01, c23, carry_s);

    let c01x = c0 ^ c1;
    let c01a = c0 & c1;
    let c23x = c2 ^ c3;
    let c23a = c2 & c3;
    let sum_b = c01x ^ c23x;
    // The three weight-4 carries here can never all fire in one lane, but
    // c01a and c23a can fire together (all eight neighbors alive), and that
    // lane's unit belongs at weight 8, not OR-ed away at weight 4.
    let carry_b = c01a ^ c23a ^ (c01x & c23x);
    let overflow = c01a & c23a;

    let total1 = sum_a ^ sum_b;
    let carry_ab = sum_a & sum_b;
    let total2 = carry_a ^ carry_b ^ carry_ab;
    let total3 = majority3(carry_a, carry_b, carry_ab) | overflow;

    // A lane summing eight one-bit inputs can't exceed 8, so the 8-bit can
    // never coincide with a low bit.  If it does the adder tree is wrong.
    debug_assert_eq!(total3 & (total0 | total1 | total2), 0);

    let mut birth_mask = 0u32;
    let mut survival_mask = 0u32;
    for count in 0..=8u32 {
        let lane = (if count & 1 != 0 { total0 } else { !total0 })
            & (if count & 2 != 0 { total1 } else { !total1 })
            & (if count & 4 != 0 { total2 } else { !total2 })
            & (if count & 8 != 0 { total3 } else { !total3 });
        if rule.birth_contains(count) {
            birth_mask |= lane;
        }
        if rule.survival_contains(count) {
            survival_mask |= lane;
        }
    }

    (!c & birth_mask) | (c & survival_mask)
}

/// Compute the next state of one chunk.  Returns None when no cell comes out
/// alive, which is how empty chunks never reach the store.
fn advance_chunk(nb: &Neighborhood, rule: Rule) -> Option<Chunk> {
    let mut out = Chunk::new();
    let mut any = 0u32;
    for y in 0..CHUNK_SIZE as i32 {
        let c = nb.row(0, y);
        let n = nb.row(0, y - 1);
        let s = nb.row(0, y + 1);

        // West neighbors shift the row left by one lane, pulling bit 31 of
        // the westward word into lane 0; east is the mirror image.  The
        // diagonal vectors apply the same shifts to the north and south
        // rows, which is where the corner chunks come in.
        let w = (c << 1) | (nb.row(-1, y) >> 31);
        let e = (c >> 1) | (nb.row(1, y) << 31);
        let nw = (n << 1) | (nb.row(-1, y - 1) >> 31);
        let ne = (n >> 1) | (nb.row(1, y - 1) << 31);
        let sw = (s << 1) | (nb.row(-1, y + 1) >> 31);
        let se = (s >> 1) | (nb.row(1, y + 1) << 31);

        let next = advance_row(rule, c, [n, s, w, e, nw, ne, sw, se]);
        out.set_row(y as u32, next);
        any |= next;
    }
    (any != 0).then_some(out)
}

/// Apply `rule` once to every cell of `store`, producing the next store.
///
/// The work set is the 3x3 chunk dilation of the current store: exactly the
/// chunks that could contain a live cell afterwards.  The input is only
/// borrowed; the one allocation is the output map.
pub fn step(store: &ChunkStore, rule: Rule) -> ChunkStore {
    let mut work: HashSet<ChunkCoord> = HashSet::with_capacity(store.chunk_count() * 2);
    for (coord, _) in store.iter() {
        for dy in -1..=1 {
            for dx in -1..=1 {
                work.insert(coord.offset(dx, dy));
            }
        }
    }

    let mut next = ChunkStore::new();
    for coord in work {
        let nb = Neighborhood::fetch(store, coord);
        if let Some(chunk) = advance_chunk(&nb, rule) {
            next.insert_chunk(coord, chunk);
        }
    }
    next
}
