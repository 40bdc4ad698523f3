//! # QR Renderer
//!
//! Renders the design-level QR code (`quadi.ca/{qsa-id-lowercase}`) as an
//! SVG group of filled squares. Error-correction level is fixed at `M`,
//! matching the reference printer-document assembler's default.

use qrcode::types::QrError;
use qrcode::{EcLevel, QrCode};

use crate::error::{CoreError, CoreResult};

/// Default element size, in millimetres, when no config override is set.
pub const DEFAULT_SIZE_MM: f64 = 10.0;

/// Build the `quadi.ca/{...}` URL path for a QSA id.
///
/// The stored QSA id keeps its original case; only the URL path
/// lowercases it.
pub fn qsa_url(qsa_id: &str) -> String {
    format!("quadi.ca/{}", qsa_id.to_lowercase())
}

/// A rendered QR symbol: a square grid of booleans plus its side length.
pub struct QrSymbol {
    pub grid: Vec<Vec<bool>>,
    pub dim: usize,
}

/// Encode `data` as a QR symbol at error-correction level M.
///
/// Fails with [`CoreError::InvalidData`] on empty input, or
/// [`CoreError::DataTooLong`] if `data` exceeds the largest QR version's
/// capacity.
pub fn encode(data: &str) -> CoreResult<QrSymbol> {
    if data.is_empty() {
        return Err(CoreError::InvalidData);
    }

    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::M).map_err(
        |e| match e {
            QrError::DataTooLong => CoreError::DataTooLong,
            _ => CoreError::InvalidData,
        },
    )?;

    let dim = code.width();
    let colors = code.to_colors();
    let grid = colors
        .chunks(dim)
        .map(|row| row.iter().map(|c| *c == qrcode::Color::Dark).collect())
        .collect();

    Ok(QrSymbol { grid, dim })
}

/// Render a QR symbol as SVG filled squares, centered at `origin_xy` with
/// total side `size_mm`. No stroke, no gaps between adjacent cells.
pub fn render_svg(symbol: &QrSymbol, origin_xy: (f64, f64), size_mm: f64) -> String {
    if symbol.dim == 0 {
        return String::new();
    }
    let cell = size_mm / symbol.dim as f64;
    let (ox, oy) = (origin_xy.0 - size_mm / 2.0, origin_xy.1 - size_mm / 2.0);

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_lowercases_only_path() {
        assert_eq!(qsa_url("STAR00123"), "quadi.ca/star00123");
    }

    #[test]
    fn rejects_empty_data() {
        assert!(matches!(encode(""), Err(CoreError::InvalidData)));
    }

    #[test]
    fn rejects_overlong_data() {
        let huge = "x".repeat(10_000);
        assert!(matches!(encode(&huge), Err(CoreError::DataTooLong)));
    }

    #[test]
    fn encodes_and_renders_without_stroke() {
        let symbol = encode("quadi.ca/star00123").unwrap();
        assert!(symbol.dim > 0);
        let svg = render_svg(&symbol, (50.0, 50.0), DEFAULT_SIZE_MM);
        assert!(svg.contains("fill=\"#000000\""));
        assert!(svg.contains("stroke=\"none\""));
    }
}
