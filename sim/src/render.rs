//! Projects a rectangular window of the plane into dense presenter-facing
//! buffers.
//!
//! The cell bitmap is row-major packed `u32` words, `ceil(w / 32)` words per
//! row, LSB-first within a word like the chunks themselves.  Because the
//! window can sit at any offset, each chunk row contributes a sub-run of
//! bits that lands at an arbitrary destination bit position, possibly
//! spanning two output words.
use aeon_grid::{ByteStore, ChunkCoord, ChunkStore, CHUNK_SIZE};

/// The window the presenter wants rendered.  `x`/`y` are global cell
/// coordinates of the top-left corner; `w`/`h` are in cells and may be zero.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Viewport {
    pub x: i64,
    pub y: i64,
    pub w: u32,
    pub h: u32,
}

impl Viewport {
    pub fn new(x: i64, y: i64, w: u32, h: u32) -> Viewport {
        Viewport { x, y, w, h }
    }

    /// Output words per bitmap row.
    pub fn stride(&self) -> usize {
        ((self.w as usize) + 31) / 32
    }

    pub fn cell_count(&self) -> usize {
        self.w as usize * self.h as usize
    }

    /// Inclusive chunk coordinate range intersecting the window, or None
    /// when the window has no area.
    fn chunk_range(&self) -> Option<(ChunkCoord, ChunkCoord)> {
        if self.w == 0 || self.h == 0 {
            return None;
        }
        let shift = CHUNK_SIZE.trailing_zeros();
        let min = ChunkCoord::new((self.x >> shift) as i32, (self.y >> shift) as i32);
        let max = ChunkCoord::new(
            ((self.x + self.w as i64 - 1) >> shift) as i32,
            ((self.y + self.h as i64 - 1) >> shift) as i32,
        );
        Some((min, max))
    }

    /// Intersection of a chunk's cell rectangle with the window, as
    /// `(x0, y0, x1, y1)` in global cells, half-open.
    fn intersect_chunk(&self, coord: ChunkCoord) -> (i64, i64, i64, i64) {
        let (ox, oy) = coord.origin();
        let x0 = ox.max(self.x);
        let y0 = oy.max(self.y);
        let x1 = (ox + CHUNK_SIZE as i64).min(self.x + self.w as i64);
        let y1 = (oy + CHUNK_SIZE as i64).min(self.y + self.h as i64);
        (x0, y0, x1, y1)
    }
}

/// Render the window into a packed bitmap of `stride * h` words.
pub fn project_cells(store: &ChunkStore, view: &Viewport) -> Vec<u32> {
    let stride = view.stride();
    let mut out = vec![0u32; stride * view.h as usize];
    let (min, max) = match view.chunk_range() {
        Some(r) => r,
        None => return out,
    };

    for cy in min.cy..=max.cy {
        for cx in min.cx..=max.cx {
            let coord = ChunkCoord::new(cx, cy);
            let chunk = match store.get_chunk(coord) {
                Some(c) => c,
                None => continue,
            };
            let (ox, oy) = coord.origin();
            let (x0, y0, x1, y1) = view.intersect_chunk(coord);

            let src_bit_start = (x0 - ox) as u32;
            let bit_count = (x1 - x0) as u32;
            debug_assert!(bit_count >= 1 && bit_count <= CHUNK_SIZE);
            let run_mask = u32::MAX >> (32 - bit_count);

            for gy in y0..y1 {
                let row = chunk.row((gy - oy) as u32);
                let bits = (row >> src_bit_start) & run_mask;
                if bits == 0 {
                    continue;
                }

                let dest_x = (x0 - view.x) as usize;
                let dest_row = (gy - view.y) as usize * stride;
                let word = dest_x / 32;
                let shift = (dest_x % 32) as u32;
                out[dest_row + word] |= bits << shift;
                // A run crossing a word boundary spills its high bits into
                // the next word.
                if shift != 0 && shift + bit_count > 32 {
                    out[dest_row + word + 1] |= bits >> (32 - shift);
                }
            }
        }
    }
    out
}

/// Render a byte overlay into a `w * h` byte buffer, one byte per window
/// cell.
pub fn project_bytes(bytes: &ByteStore, view: &Viewport) -> Vec<u8> {
    let mut out = vec![0u8; view.cell_count()];
    let (min, max) = match view.chunk_range() {
        Some(r) => r,
        None => return out,
    };

    for cy in min.cy..=max.cy {
        for cx in min.cx..=max.cx {
            let coord = ChunkCoord::new(cx, cy);
            let tile = match bytes.tile(coord) {
                Some(t) => t,
                None => continue,
            };
            let (ox, oy) = coord.origin();
            let (x0, y0, x1, y1) = view.intersect_chunk(coord);

            for gy in y0..y1 {
                let dest_row = (gy - view.y) as usize * view.w as usize;
                for gx in x0..x1 {
                    let v = tile.get((gx - ox) as u32, (gy - oy) as u32);
                    if v != 0 {
                        out[dest_row + (gx - view.x) as usize] = v;
                    }
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn store_of(cells: &[(i64, i64)]) -> ChunkStore {
        let mut store = ChunkStore::new();
        for &(x, y) in cells {
            store.set_cell(x, y, true);
        }
        store
    }

    fn bitmap_get(bitmap: &[u32], view: &Viewport, dx: u32, dy: u32) -> bool {
        let word = bitmap[dy as usize * view.stride() + (dx / 32) as usize];
        word >> (dx % 32) & 1 != 0
    }

    #[test]
    fn test_zero_area_views() {
        let store = store_of(&[(0, 0)]);
        for view in &[Viewport::new(0, 0, 0, 10), Viewport::new(0, 0, 10, 0)] {
            assert!(project_cells(&store, view).is_empty());
            assert!(project_bytes(&ByteStore::new(), view).is_empty());
        }
    }

    #[test]
    fn test_identity_window() {
        // A window exactly over chunk (0, 0).
        let store = store_of(&[(0, 0), (31, 0), (0, 31), (15, 15)]);
        let view = Viewport::new(0, 0, 32, 32);
        let bm = project_cells(&store, &view);
        assert_eq!(bm.len(), 32);
        assert!(bitmap_get(&bm, &view, 0, 0));
        assert!(bitmap_get(&bm, &view, 31, 0));
        assert!(bitmap_get(&bm, &view, 0, 31));
        assert!(bitmap_get(&bm, &view, 15, 15));
        assert!(!bitmap_get(&bm, &view, 1, 1));
    }

    #[test]
    fn test_offset_window_stitches_chunks() {
        // A window straddling the four chunks meeting at the origin.
        let cells = &[(-1, -1), (0, 0), (-1, 0), (0, -1), (-16, -16), (15, 15)];
        let store = store_of(cells);
        let view = Viewport::new(-16, -16, 32, 32);
        let bm = project_cells(&store, &view);
        for &(x, y) in cells {
            let dx = (x - view.x) as u32;
            let dy = (y - view.y) as u32;
            assert!(bitmap_get(&bm, &view, dx, dy), "cell ({}, {})", x, y);
        }
        let total: u32 = bm.iter().map(|w| w.count_ones()).sum();
        assert_eq!(total as usize, cells.len());
    }

    #[test]
    fn test_bytes_projection() {
        let mut bytes = ByteStore::new();
        let addr = aeon_grid::CellAddress::from_global(-1, 2);
        bytes.tile_mut(addr.chunk).set(addr.lx, addr.ly, 42);
        let view = Viewport::new(-5, 0, 10, 10);
        let out = project_bytes(&bytes, &view);
        assert_eq!(out[2 * 10 + 4], 42);
        assert_eq!(out.iter().filter(|b| **b != 0).count(), 1);
    }

    proptest! {
        // Any window over any soup: every window cell must equal get_cell.
        #[test]
        fn test_matches_point_reads(
            cells in prop::collection::hash_set((-70i64..70, -70i64..70), 0..200),
            vx in -80i64..80,
            vy in -80i64..80,
            vw in 0u32..100,
            vh in 0u32..70,
        ) {
            let cells: Vec<_> = cells.into_iter().collect();
            let store = store_of(&cells);
            let view = Viewport::new(vx, vy, vw, vh);
            let bm = project_cells(&store, &view);
            prop_assert_eq!(bm.len(), view.stride() * vh as usize);
            for dy in 0..vh {
                for dx in 0..vw {
                    let expected = store.get_cell(vx + dx as i64, vy + dy as i64);
                    prop_assert_eq!(
                        bitmap_get(&bm, &view, dx, dy),
                        expected,
                        "window cell ({}, {})", dx, dy
                    );
                }
            }
        }
    }
}
