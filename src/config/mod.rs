//! # Engrave Configuration
//!
//! Process-wide defaults for canvas geometry and calibration, the
//! engraving-domain analogue of a hardware profile: loaded once per
//! process, never mutated, and threaded explicitly through the entry
//! point rather than read from globals.
//!
//! ## Example
//!
//! ```
//! use qsa_engrave::config::EngraveConfig;
//!
//! let config = EngraveConfig::default();
//! assert_eq!(config.canvas_width_mm, 148.0);
//! ```

use serde::{Deserialize, Serialize};

fn default_width() -> f64 {
    148.0
}

fn default_height() -> f64 {
    113.7
}

/// Canvas rotation, applied to the whole SVG document (§4.K).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanvasRotation {
    #[default]
    Rotate0,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl CanvasRotation {
    /// Degrees of clockwise rotation.
    pub fn degrees(self) -> u16 {
        match self {
            Self::Rotate0 => 0,
            Self::Rotate90 => 90,
            Self::Rotate180 => 180,
            Self::Rotate270 => 270,
        }
    }

    /// Whether the root `width`/`height` attributes must be swapped.
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Self::Rotate90 | Self::Rotate270)
    }
}

/// Process-wide defaults for canvas size, calibration offset, and rotation.
///
/// Fixture-fixed: 148.0 × 113.7 mm is the default canvas; any deployment
/// that calibrates a different physical fixture overrides via TOML rather
/// than recompiling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngraveConfig {
    /// Canvas width in millimetres, before rotation-driven swap.
    #[serde(default = "default_width")]
    pub canvas_width_mm: f64,
    /// Canvas height in millimetres, before rotation-driven swap.
    #[serde(default = "default_height")]
    pub canvas_height_mm: f64,
    /// Calibration offset `(dx, dy)` added to CAD coordinates before the
    /// Y-flip (§4.E). Defaults to zero.
    #[serde(default)]
    pub calibration_offset_mm: (f64, f64),
    /// Default canvas rotation when a caller doesn't specify one.
    #[serde(default)]
    pub default_rotation: CanvasRotation,
    /// Default vertical-offset group translation, in millimetres.
    /// Clamped to `[-5.0, 5.0]` in 0.02mm steps by the assembler.
    #[serde(default)]
    pub default_offset_mm: f64,
}

impl Default for EngraveConfig {
    fn default() -> Self {
        Self {
            canvas_width_mm: default_width(),
            canvas_height_mm: default_height(),
            calibration_offset_mm: (0.0, 0.0),
            default_rotation: CanvasRotation::default(),
            default_offset_mm: 0.0,
        }
    }
}

impl EngraveConfig {
    /// Load a config from a TOML file, falling back to defaults for any
    /// field the file omits.
    pub fn load_from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Clamp a requested vertical offset to the documented range and step.
    pub fn clamp_offset_mm(offset_mm: f64) -> f64 {
        let clamped = offset_mm.clamp(-5.0, 5.0);
        (clamped / 0.02).round() * 0.02
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixture() {
        let config = EngraveConfig::default();
        assert_eq!(config.canvas_width_mm, 148.0);
        assert_eq!(config.canvas_height_mm, 113.7);
        assert_eq!(config.calibration_offset_mm, (0.0, 0.0));
    }

    #[test]
    fn loads_partial_toml() {
        let config = EngraveConfig::load_from_toml("canvas_width_mm = 200.0\n").unwrap();
        assert_eq!(config.canvas_width_mm, 200.0);
        assert_eq!(config.canvas_height_mm, 113.7);
    }

    #[test]
    fn offset_clamps_to_range_and_step() {
        assert_eq!(EngraveConfig::clamp_offset_mm(10.0), 5.0);
        assert_eq!(EngraveConfig::clamp_offset_mm(-10.0), -5.0);
        assert_eq!(EngraveConfig::clamp_offset_mm(1.234), 1.24);
    }

    #[test]
    fn rotation_swap_flag() {
        assert!(!CanvasRotation::Rotate0.swaps_dimensions());
        assert!(CanvasRotation::Rotate90.swaps_dimensions());
        assert!(!CanvasRotation::Rotate180.swaps_dimensions());
        assert!(CanvasRotation::Rotate270.swaps_dimensions());
    }
}
