//! Run-length-encoded patterns, the lingua franca of Life collections.
//!
//! Reading: `#`-comments and the `x = ...` header are skipped, digits
//! accumulate a run count, `b`/`.` skips dead cells, `o`/`*` emits live
//! ones, `$` ends a row, `!` ends the pattern, anything else is ignored.
//!
//! Writing: rows top to bottom, trailing dead cells dropped, 70-column
//! lines.  What we emit re-parses to the same cells translated to a zero
//! origin.
use crate::{cell_bounds, PatternError, MAX_CELLS, MAX_RUN};

/// Parse RLE text into live-cell coordinates relative to the pattern's
/// top-left corner.
pub fn parse_rle(input: &str) -> Result<Vec<(i64, i64)>, PatternError> {
    let mut cells = vec![];
    let mut x = 0i64;
    let mut y = 0i64;
    let mut run = 0u64;

    'lines: for line in input.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('#') || trimmed.starts_with("x =") || trimmed.starts_with("x=") {
            continue;
        }

        for c in trimmed.chars() {
            match c {
                '0'..='9' => {
                    run = run * 10 + (c as u64 - '0' as u64);
                    if run > MAX_RUN {
                        return Err(PatternError::PatternTooLarge);
                    }
                }
                'b' | 'B' | '.' => {
                    x += run.max(1) as i64;
                    run = 0;
                }
                'o' | 'O' | '*' => {
                    let count = run.max(1);
                    if cells.len() + count as usize > MAX_CELLS {
                        return Err(PatternError::PatternTooLarge);
                    }
                    for _ in 0..count {
                        cells.push((x, y));
                        x += 1;
                    }
                    run = 0;
                }
                '$' => {
                    y += run.max(1) as i64;
                    x = 0;
                    run = 0;
                }
                '!' => break 'lines,
                // Stray characters (including whitespace) carry no meaning.
                _ => {}
            }
        }
    }

    Ok(cells)
}

/// Longest line we'll emit.
const WRAP_COLUMN: usize = 70;

struct TokenWriter {
    out: String,
    line_len: usize,
}

impl TokenWriter {
    fn push(&mut self, token: &str) {
        if self.line_len + token.len() > WRAP_COLUMN {
            self.out.push('\n');
            self.line_len = 0;
        }
        self.out.push_str(token);
        self.line_len += token.len();
    }

    fn push_run(&mut self, count: i64, tag: char) {
        debug_assert!(count >= 1);
        if count == 1 {
            self.push(&tag.to_string());
        } else {
            self.push(&format!("{}{}", count, tag));
        }
    }
}

/// Emit RLE for a set of live cells under the given rule string.
pub fn emit_rle(cells: &[(i64, i64)], rule: &str) -> String {
    let (min_x, min_y, w, h) = cell_bounds(cells).unwrap_or((0, 0, 0, 0));

    let mut out = String::from("#C generated by aeon\n");
    out.push_str(&format!("x = {}, y = {}, rule = {}\n", w, h, rule));

    let mut sorted = cells.to_vec();
    sorted.sort_unstable_by_key(|&(x, y)| (y, x));
    sorted.dedup();

    let mut writer = TokenWriter { out, line_len: 0 };
    let mut row = min_y;
    let mut cursor = min_x;
    let mut i = 0;
    while i < sorted.len() {
        let (x, y) = sorted[i];
        if y != row {
            writer.push_run(y - row, '$');
            row = y;
            cursor = min_x;
        }
        if x > cursor {
            writer.push_run(x - cursor, 'b');
        }

        // Fold the maximal run of consecutive live cells into one token.
        let mut run = 1i64;
        while i + (run as usize) < sorted.len() && sorted[i + run as usize] == (x + run, y) {
            run += 1;
        }
        writer.push_run(run, 'o');
        cursor = x + run;
        i += run as usize;
    }
    writer.push("!");
    writer.out.push('\n');
    writer.out
}
