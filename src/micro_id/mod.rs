//! # Micro-ID Codec
//!
//! Encodes a serial integer `n ∈ 1..=1_048_575` as a 5×5 dot-matrix grid
//! with fixed corner anchors, an off-grid orientation mark, and an
//! even-parity cell. The codec is bit-exact: `decode(encode(n)) == n` for
//! every `n` in range, and malformed grids are rejected rather than
//! silently misread.
//!
//! ## Geometry
//!
//! Dot radius is 0.05mm, pitch is 0.225mm. Cell `(row, col)` — row 0 top,
//! col 0 left — has its center at
//! `(0.05 + col * 0.225, 0.05 + row * 0.225)` mm relative to the grid
//! origin. The orientation mark sits outside the grid at
//! `(-0.175, 0.05)` mm.
//!
//! ## Bit layout
//!
//! Anchors `(0,0)`, `(0,4)`, `(4,0)`, `(4,4)` are always ON. The parity
//! cell is `(4,3)`. The remaining 20 cells carry bits 19..0 of `n` in
//! row-major order over the cells that are neither anchors nor parity.
//! This mapping is the contractual wire format: any implementation must
//! agree bit-for-bit with [`DATA_CELLS`].

use crate::error::{CoreError, CoreResult};

/// Dot radius, in millimetres.
pub const DOT_RADIUS_MM: f64 = 0.05;
/// Center-to-center spacing between adjacent grid cells, in millimetres.
pub const DOT_PITCH_MM: f64 = 0.225;
/// Grid dimension (5×5).
pub const GRID_SIZE: usize = 5;

/// The four corner anchors, always ON.
pub const ANCHORS: [(usize, usize); 4] = [(0, 0), (0, 4), (4, 0), (4, 4)];

/// The even-parity cell.
pub const PARITY_CELL: (usize, usize) = (4, 3);

/// The off-grid orientation mark, in millimetres relative to the grid origin.
pub const ORIENTATION_MARK_MM: (f64, f64) = (-0.175, 0.05);

/// The 20 data-bearing cells, in row-major order over the grid with
/// [`ANCHORS`] and [`PARITY_CELL`] excluded. `DATA_CELLS[0]` carries bit
/// 19 (MSB) of the encoded integer; `DATA_CELLS[19]` carries bit 0 (LSB).
///
/// This table is the wire contract verified against the canonical fixture
/// at `n = 123454` (see the `fixture_n_123454` test below).
pub const DATA_CELLS: [(usize, usize); 20] = [
    (0, 1),
    (0, 2),
    (0, 3),
    (1, 0),
    (1, 1),
    (1, 2),
    (1, 3),
    (1, 4),
    (2, 0),
    (2, 1),
    (2, 2),
    (2, 3),
    (2, 4),
    (3, 0),
    (3, 1),
    (3, 2),
    (3, 3),
    (3, 4),
    (4, 1),
    (4, 2),
];

/// Smallest valid serial.
pub const MIN_SERIAL: u32 = 1;
/// Largest valid serial (2^20 - 1).
pub const MAX_SERIAL: u32 = 1_048_575;

/// A 5×5 boolean dot grid, plus the always-present orientation mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    cells: [[bool; GRID_SIZE]; GRID_SIZE],
}

impl Grid {
    fn empty() -> Self {
        Self {
            cells: [[false; GRID_SIZE]; GRID_SIZE],
        }
    }

    /// Whether cell `(row, col)` is ON. Panics if out of `0..5` bounds.
    pub fn get(&self, row: usize, col: usize) -> bool {
        self.cells[row][col]
    }

    fn set(&mut self, row: usize, col: usize, on: bool) {
        self.cells[row][col] = on;
    }

    /// Count of ON cells among the 4 anchors, 20 data cells, and the
    /// parity cell — the population the even-parity invariant covers.
    /// The orientation mark is excluded, per spec.
    pub fn parity_population(&self) -> u32 {
        let mut count = 0u32;
        for &(r, c) in ANCHORS.iter().chain(DATA_CELLS.iter()) {
            if self.get(r, c) {
                count += 1;
            }
        }
        if self.get(PARITY_CELL.0, PARITY_CELL.1) {
            count += 1;
        }
        count
    }

    /// Millimetre-precision centers of every ON cell, relative to
    /// `origin_xy`, plus the always-on orientation mark.
    pub fn dots(&self, origin_xy: (f64, f64)) -> Vec<(f64, f64)> {
        let (ox, oy) = origin_xy;
        let mut out = Vec::new();
        for row in 0..GRID_SIZE {
            for col in 0..GRID_SIZE {
                if self.cells[row][col] {
                    out.push(cell_center_mm(row, col, (ox, oy)));
                }
            }
        }
        out.push((ox + ORIENTATION_MARK_MM.0, oy + ORIENTATION_MARK_MM.1));
        out
    }

    /// Render this grid (plus orientation mark) as filled-circle SVG
    /// elements, `fill="#000000"` with no stroke.
    pub fn render_svg(&self, origin_xy: (f64, f64)) -> String {
        let mut out = String::new();
        for (x, y) in self.dots(origin_xy) {
            out.push_str(&format!(
                "<circle cx=\"{x:.4}\" cy=\"{y:.4}\" r=\"{r:.4}\" fill=\"#000000\" stroke=\"none\"/>",
                x = x,
                y = y,
                r = DOT_RADIUS_MM,
            ));
        }
        out
    }
}

/// Center, in millimetres, of grid cell `(row, col)` relative to `origin`.
pub fn cell_center_mm(row: usize, col: usize, origin: (f64, f64)) -> (f64, f64) {
    (
        origin.0 + DOT_RADIUS_MM + col as f64 * DOT_PITCH_MM,
        origin.1 + DOT_RADIUS_MM + row as f64 * DOT_PITCH_MM,
    )
}

/// Encode `n` as a 5×5 dot grid. Fails with [`CoreError::OutOfRange`] if
/// `n` is outside `[1, 1_048_575]`.
pub fn encode(n: u32) -> CoreResult<Grid> {
    if !(MIN_SERIAL..=MAX_SERIAL).contains(&n) {
        return Err(CoreError::OutOfRange(n));
    }

    let mut grid = Grid::empty();
    for &(r, c) in ANCHORS.iter() {
        grid.set(r, c, true);
    }

    for (i, &(r, c)) in DATA_CELLS.iter().enumerate() {
        // DATA_CELLS[0] carries bit 19 (MSB) down to DATA_CELLS[19] (bit 0).
        let bit_index = 19 - i;
        let bit = (n >> bit_index) & 1 == 1;
        grid.set(r, c, bit);
    }

    // Even parity over anchors + data + parity cell, orientation excluded.
    let pre_parity_ones = grid.parity_population();
    let parity_bit = pre_parity_ones % 2 != 0;
    grid.set(PARITY_CELL.0, PARITY_CELL.1, parity_bit);

    Ok(grid)
}

/// Decode a grid back to its serial integer. Fails with
/// [`CoreError::AnchorError`] if any corner anchor is not ON, or
/// [`CoreError::ParityError`] if the even-parity invariant is violated.
pub fn decode(grid: &Grid) -> CoreResult<u32> {
    for &(r, c) in ANCHORS.iter() {
        if !grid.get(r, c) {
            return Err(CoreError::AnchorError);
        }
    }

    if grid.parity_population() % 2 != 0 {
        return Err(CoreError::ParityError);
    }

    let mut n: u32 = 0;
    for (i, &(r, c)) in DATA_CELLS.iter().enumerate() {
        let bit_index = 19 - i;
        if grid.get(r, c) {
            n |= 1 << bit_index;
        }
    }

    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_n_123454() {
        let grid = encode(123454).unwrap();

        // Binary = 00011110001000111110; parity bit = 0.
        assert!(!grid.get(PARITY_CELL.0, PARITY_CELL.1));

        for &(r, c) in ANCHORS.iter() {
            assert!(grid.get(r, c), "anchor ({r},{c}) must be ON");
        }

        let corners = grid.dots((0.0, 0.0));
        assert!(corners.contains(&(0.05, 0.05)));
        assert!(corners.contains(&(0.95, 0.05)));
        assert!(corners.contains(&(0.05, 0.95)));
        assert!(corners.contains(&(0.95, 0.95)));

        let orientation = (-0.175, 0.05);
        assert!(corners.contains(&orientation));

        assert_eq!(decode(&grid).unwrap(), 123454);
    }

    #[test]
    fn boundary_n_1() {
        let grid = encode(1).unwrap();
        let on_count = (0..GRID_SIZE)
            .flat_map(|r| (0..GRID_SIZE).map(move |c| (r, c)))
            .filter(|&(r, c)| grid.get(r, c))
            .count();
        // 4 anchors + 1 data bit on + 1 parity on, + orientation (off-grid) = 7
        assert_eq!(on_count + 1, 7);
    }

    #[test]
    fn boundary_n_max() {
        let grid = encode(MAX_SERIAL).unwrap();
        let on_count = (0..GRID_SIZE)
            .flat_map(|r| (0..GRID_SIZE).map(move |c| (r, c)))
            .filter(|&(r, c)| grid.get(r, c))
            .count();
        // All 20 data bits on + 4 anchors + parity off + orientation = 25
        assert_eq!(on_count + 1, 25);
    }

    #[test]
    fn boundary_out_of_range() {
        assert!(matches!(encode(0), Err(CoreError::OutOfRange(0))));
        assert!(matches!(
            encode(1_048_576),
            Err(CoreError::OutOfRange(1_048_576))
        ));
    }

    #[test]
    fn round_trip_sampled() {
        // Exhaustive round-trip over the full range is slow; sample
        // the boundary plus a spread of values across the space.
        let samples: Vec<u32> = (0..200)
            .map(|i| 1 + i * (MAX_SERIAL / 200))
            .chain([1, MAX_SERIAL])
            .collect();
        for n in samples {
            let grid = encode(n).unwrap();
            assert_eq!(decode(&grid).unwrap(), n, "round-trip failed for {n}");
            assert_eq!(grid.parity_population() % 2, 0);
        }
    }

    #[test]
    fn decode_rejects_broken_anchor() {
        let mut grid = encode(42).unwrap();
        grid.set(0, 0, false);
        assert!(matches!(decode(&grid), Err(CoreError::AnchorError)));
    }

    #[test]
    fn decode_rejects_bad_parity() {
        let mut grid = encode(42).unwrap();
        let (r, c) = PARITY_CELL;
        grid.set(r, c, !grid.get(r, c));
        assert!(matches!(decode(&grid), Err(CoreError::ParityError)));
    }

    #[test]
    fn render_svg_emits_filled_circles_no_stroke() {
        let grid = encode(5).unwrap();
        let svg = grid.render_svg((0.0, 0.0));
        assert!(svg.contains("fill=\"#000000\""));
        assert!(svg.contains("stroke=\"none\""));
        assert!(!svg.contains("stroke=\"#"));
    }
}
