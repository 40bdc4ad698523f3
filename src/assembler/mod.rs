//! # SVG Document Assembler
//!
//! Composes one array's SVG document: canvas, rotation group, vertical
//! offset group, module blocks (Micro-ID, optional Data-Matrix, optional
//! text), and the design-level QR code. Draws on [`crate::render`] for
//! primitive geometry and [`crate::elements`] for placement lookups, and
//! emits opcodes into an [`crate::svg::Program`] rather than building
//! XML directly — see [`crate::svg`].

use crate::config::{CanvasRotation, EngraveConfig};
use crate::elements::{ConfigStore, DesignKey, ElementKind};
use crate::error::{CoreError, CoreResult};
use crate::micro_id;
use crate::render::{data_matrix, qr, text, transform};
use crate::svg::{Program, SvgOp};

/// Operator-chosen, per-array render options. Replaces the "global
/// runtime state" the original kept in process-wide option flags (spec
/// design note): this struct is threaded explicitly from the entry
/// point through to the assembler.
#[derive(Debug, Clone, Copy)]
pub struct AssemblerOptions {
    pub rotation: CanvasRotation,
    pub offset_mm: f64,
}

impl Default for AssemblerOptions {
    fn default() -> Self {
        Self { rotation: CanvasRotation::Rotate0, offset_mm: 0.0 }
    }
}

/// One module slot's content for this array.
#[derive(Debug, Clone)]
pub struct ModulePlacement {
    pub position: u8,
    pub micro_id_serial: u32,
    pub module_id_text: Option<String>,
    pub serial_url_text: Option<String>,
    pub led_codes: Vec<u8>,
}

/// Assemble one array's SVG document.
///
/// `qsa_id` is the design-level QSA identifier; its URL (lowercased
/// path) is rendered as the QR code at position 0. Missing optional
/// elements are skipped; a missing `micro_id` config for an occupied
/// position is fatal (`ConfigMissing`).
pub fn assemble(
    design: &DesignKey,
    qsa_id: &str,
    modules: &[ModulePlacement],
    config: &dyn ConfigStore,
    canvas: &EngraveConfig,
    options: &AssemblerOptions,
) -> CoreResult<String> {
    let (root_w, root_h) = if options.rotation.swaps_dimensions() {
        (canvas.canvas_height_mm, canvas.canvas_width_mm)
    } else {
        (canvas.canvas_width_mm, canvas.canvas_height_mm)
    };

    let mut program = Program::new(root_w, root_h);
    program.push(SvgOp::GroupStart { transform: rotation_transform(options.rotation, canvas) });
    program.push(SvgOp::GroupStart {
        transform: Some(format!("translate(0, {:.4})", options.offset_mm)),
    });

    emit_qr(design, qsa_id, config, canvas, &mut program)?;

    for module in modules {
        emit_module(design, module, config, canvas, &mut program)?;
    }

    program.push(SvgOp::GroupEnd);
    program.push(SvgOp::GroupEnd);

    Ok(program.to_xml())
}

fn rotation_transform(rotation: CanvasRotation, canvas: &EngraveConfig) -> Option<String> {
    let (w, h) = (canvas.canvas_width_mm, canvas.canvas_height_mm);
    match rotation {
        CanvasRotation::Rotate0 => None,
        CanvasRotation::Rotate90 => Some(format!("translate({h:.4}, 0) rotate(90)")),
        CanvasRotation::Rotate180 => Some(format!("translate({w:.4}, {h:.4}) rotate(180)")),
        CanvasRotation::Rotate270 => Some(format!("translate(0, {w:.4}) rotate(270)")),
    }
}

fn emit_qr(
    design: &DesignKey,
    qsa_id: &str,
    config: &dyn ConfigStore,
    canvas: &EngraveConfig,
    program: &mut Program,
) -> CoreResult<()> {
    let Some(cfg) = config.get(design, 0, ElementKind::QrCode)? else {
        return Ok(());
    };
    let origin = transform::cad_to_svg(
        cfg.origin_mm,
        (canvas.canvas_width_mm, canvas.canvas_height_mm),
        canvas.calibration_offset_mm,
    );
    let size = cfg.element_size_mm.unwrap_or(qr::DEFAULT_SIZE_MM);
    let symbol = qr::encode(&qr::qsa_url(qsa_id))?;
    emit_raw_fragment(program, &qr::render_svg(&symbol, origin, size));
    Ok(())
}

fn emit_module(
    design: &DesignKey,
    module: &ModulePlacement,
    config: &dyn ConfigStore,
    canvas: &EngraveConfig,
    program: &mut Program,
) -> CoreResult<()> {
    let canvas_wh = (canvas.canvas_width_mm, canvas.canvas_height_mm);

    let micro_id_cfg = config
        .get(design, module.position, ElementKind::MicroId)?
        .ok_or_else(|| CoreError::ConfigMissing(format!("micro_id at position {}", module.position)))?;
    let origin = transform::cad_to_svg(micro_id_cfg.origin_mm, canvas_wh, canvas.calibration_offset_mm);
    let grid = micro_id::encode(module.micro_id_serial)?;
    emit_raw_fragment(program, &grid.render_svg(origin));

    if let Some(cfg) = config.get(design, module.position, ElementKind::DataMatrix)? {
        let origin = transform::cad_to_svg(cfg.origin_mm, canvas_wh, canvas.calibration_offset_mm);
        let size = cfg.element_size_mm.unwrap_or(data_matrix_default_size());
        if let Some(payload) = &module.serial_url_text {
            let symbol = data_matrix::encode(payload)?;
            emit_raw_fragment(program, &data_matrix::render_svg(&symbol, origin, size));
        }
    }

    if let Some(content) = &module.module_id_text {
        emit_text(design, module.position, ElementKind::ModuleId, content, config, canvas, program)?;
    }
    if let Some(content) = &module.serial_url_text {
        emit_text(design, module.position, ElementKind::SerialUrl, content, config, canvas, program)?;
    }
    for &led in &module.led_codes {
        if let Some(kind_cfg_slot) = led_code_kind(led) {
            let content = led.to_string();
            emit_text(design, module.position, kind_cfg_slot, &content, config, canvas, program)?;
        }
    }

    Ok(())
}

fn led_code_kind(led: u8) -> Option<ElementKind> {
    if (1..=4).contains(&led) {
        Some(ElementKind::LedCode(led))
    } else {
        None
    }
}

fn data_matrix_default_size() -> f64 {
    5.0
}

fn emit_text(
    design: &DesignKey,
    position: u8,
    kind: ElementKind,
    content: &str,
    config: &dyn ConfigStore,
    canvas: &EngraveConfig,
    program: &mut Program,
) -> CoreResult<()> {
    let Some(cfg) = config.get(design, position, kind)? else {
        return Ok(());
    };
    let origin = transform::cad_to_svg(
        cfg.origin_mm,
        (canvas.canvas_width_mm, canvas.canvas_height_mm),
        canvas.calibration_offset_mm,
    );
    let run = text::TextRun {
        content: content.to_string(),
        origin_mm: origin,
        rotation_deg: cfg.rotation_deg.unwrap_or(0.0),
        text_height_mm: cfg.text_height_mm.unwrap_or(2.0),
        tracking_multiplier: cfg.tracking_multiplier,
    };
    emit_raw_fragment(program, &run.render_svg());
    Ok(())
}

/// Renderer leaves return pre-built SVG fragments (circles/rects/text
/// already carrying `fill`/`stroke`); splice them in verbatim rather
/// than re-modeling every cell as an [`SvgOp`].
fn emit_raw_fragment(program: &mut Program, fragment: &str) {
    if fragment.is_empty() {
        return;
    }
    program.push(SvgOp::Raw(fragment.to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{ElementConfig, InMemoryConfigStore};

    fn config_with_micro_id(design: &DesignKey) -> InMemoryConfigStore {
        let store = InMemoryConfigStore::new();
        store
            .set(design.clone(), 1, ElementKind::MicroId, ElementConfig::new((10.0, 10.0)))
            .unwrap();
        store
            .set(design.clone(), 0, ElementKind::QrCode, ElementConfig::new((74.0, 56.0)))
            .unwrap();
        store
    }

    #[test]
    fn missing_micro_id_config_is_fatal() {
        let design = DesignKey::new("STAR", None);
        let store = InMemoryConfigStore::new();
        let canvas = EngraveConfig::default();
        let options = AssemblerOptions::default();
        let modules = vec![ModulePlacement {
            position: 1,
            micro_id_serial: 5,
            module_id_text: None,
            serial_url_text: None,
            led_codes: vec![],
        }];
        let err = assemble(&design, "STAR00005", &modules, &store, &canvas, &options).unwrap_err();
        assert!(matches!(err, CoreError::ConfigMissing(_)));
    }

    #[test]
    fn rotation_90_swaps_root_width_and_height() {
        let design = DesignKey::new("STAR", None);
        let store = config_with_micro_id(&design);
        let canvas = EngraveConfig::default();
        let options = AssemblerOptions { rotation: CanvasRotation::Rotate90, offset_mm: 0.0 };
        let modules = vec![ModulePlacement {
            position: 1,
            micro_id_serial: 5,
            module_id_text: None,
            serial_url_text: None,
            led_codes: vec![],
        }];
        let svg = assemble(&design, "STAR00005", &modules, &store, &canvas, &options).unwrap();
        assert!(svg.contains(&format!("width=\"{:.4}\"", canvas.canvas_height_mm)));
        assert!(svg.contains(&format!("height=\"{:.4}\"", canvas.canvas_width_mm)));
    }

    #[test]
    fn assembles_without_error_when_optional_elements_missing() {
        let design = DesignKey::new("STAR", None);
        let store = config_with_micro_id(&design);
        let canvas = EngraveConfig::default();
        let options = AssemblerOptions::default();
        let modules = vec![ModulePlacement {
            position: 1,
            micro_id_serial: 5,
            module_id_text: None,
            serial_url_text: None,
            led_codes: vec![],
        }];
        let svg = assemble(&design, "STAR00005", &modules, &store, &canvas, &options).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("circle"));
    }
}
