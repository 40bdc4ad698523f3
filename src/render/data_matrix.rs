//! # Data-Matrix Renderer
//!
//! Produces an SVG group of filled squares forming an ISO/IEC 16022 Data
//! Matrix symbol, via [`rxing`]'s conformant encoder. The symbol is
//! centered at the configured origin after the Y-flip. Every cell becomes
//! an adjacent, gapless `<rect>` with no stroke — the downstream engraver
//! treats any outline as a second pass.

use rxing::{BarcodeFormat, Writer};

use crate::error::{CoreError, CoreResult};

/// A decoded Data Matrix symbol: a square boolean grid plus its side
/// length in cells.
pub struct DataMatrixSymbol {
    pub grid: Vec<Vec<bool>>,
    pub dim: usize,
}

/// Encode `data` as a Data Matrix symbol.
///
/// Fails with [`CoreError::InvalidData`] on empty input or if the
/// encoder rejects the payload.
pub fn encode(data: &str) -> CoreResult<DataMatrixSymbol> {
    if data.is_empty() {
        return Err(CoreError::InvalidData);
    }

    let writer = rxing::MultiFormatWriter;
    let matrix = writer
        .encode(data, &BarcodeFormat::DATA_MATRIX, 0, 0)
        .map_err(|_| CoreError::InvalidData)?;

    let width = matrix.get_width() as usize;
    let height = matrix.get_height() as usize;
    let dim = width.max(height);

    let mut grid = vec![vec![false; dim]; dim];
    for y in 0..height {
        for x in 0..width {
            if matrix.get(x as u32, y as u32) {
                grid[y][x] = true;
            }
        }
    }

    Ok(DataMatrixSymbol { grid, dim })
}

/// Render a Data Matrix symbol as SVG filled squares, centered at
/// `origin_xy` with total side `symbol_size_mm`.
pub fn render_svg(symbol: &DataMatrixSymbol, origin_xy: (f64, f64), symbol_size_mm: f64) -> String {
    if symbol.dim == 0 {
        return String::new();
    }
    let cell = symbol_size_mm / symbol.dim as f64;
    let (ox, oy) = (
        origin_xy.0 - symbol_size_mm / 2.0,
        origin_xy.1 - symbol_size_mm / 2.0,
    );

    let mut out = String::new();
    for (row, cells) in symbol.grid.iter().enumerate() {
        for (col, &on) in cells.iter().enumerate() {
            if !on {
                continue;
            }
            let x = ox + col as f64 * cell;
            let y = oy + row as f64 * cell;
            out.push_str(&format!(
                "<rect x=\"{x:.4}\" y=\"{y:.4}\" width=\"{cell:.4}\" height=\"{cell:.4}\" fill=\"#000000\" stroke=\"none\"/>",
            ));
        }
    }
    out
}
