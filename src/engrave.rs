//! # Engrave Entry Point
//!
//! The single typed entry point external callers drive: validate
//! inputs, resolve SKUs, pull element configs, reserve/commit serials
//! through the lifecycle engine, invoke the assembler, and write the
//! resulting SVG to an artifact sink. Compensates (voids the
//! reservation) if anything downstream fails after serials were
//! reserved.

use std::path::PathBuf;
use std::sync::Arc;

use crate::assembler::{self, AssemblerOptions, ModulePlacement};
use crate::batch::repository::{SerialRequest, SerialStore};
use crate::batch::state_machine::{BatchStore, StateMachine};
use crate::batch::types::Serial;
use crate::config::EngraveConfig;
use crate::elements::{ConfigStore, DesignKey};
use crate::error::{CoreError, CoreResult};
use crate::render::qr;
use crate::sku::SkuResolver;

/// Where a rendered artifact's bytes get written. Out of scope per the
/// specification (filename scheme, transport); this trait is the seam
/// a caller plugs a real sink into.
#[async_trait::async_trait]
pub trait ArtifactSink: Send + Sync {
    async fn write(&self, name: &str, contents: &str) -> CoreResult<Option<PathBuf>>;
}

/// Reference sink that writes SVG files under a base directory.
pub struct FsArtifactSink {
    pub base_dir: PathBuf,
}

#[async_trait::async_trait]
impl ArtifactSink for FsArtifactSink {
    async fn write(&self, name: &str, contents: &str) -> CoreResult<Option<PathBuf>> {
        let path = self.base_dir.join(name);
        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| CoreError::TransactionFailed(e.to_string()))?;
        Ok(Some(path))
    }
}

/// One module requested for this array, identified by its as-submitted
/// SKU (native or legacy) and carrying whatever LED codes it needs
/// engraved. `engrave()` resolves `sku` before reserving anything.
#[derive(Debug, Clone)]
pub struct EngraveModuleInput {
    pub sku: String,
    pub led_codes: Vec<u8>,
}

pub struct EngraveResult {
    pub svg: String,
    pub serials: Vec<Serial>,
    pub artifact_path: Option<PathBuf>,
}

/// Drives one array's worth of engraving for `(batch_id, qsa_sequence)`.
pub struct EngravePipeline<'a, B: BatchStore, S: SerialStore> {
    pub design: DesignKey,
    pub qsa_id: String,
    pub batches: &'a B,
    pub serials: &'a S,
    pub resolver: Arc<SkuResolver>,
    pub config: Arc<dyn ConfigStore>,
    pub canvas: EngraveConfig,
    pub sink: Arc<dyn ArtifactSink>,
}

impl<'a, B: BatchStore, S: SerialStore> EngravePipeline<'a, B, S> {
    pub async fn engrave(
        &self,
        batch_id: i64,
        qsa_sequence: u32,
        start_position: u8,
        modules: Vec<EngraveModuleInput>,
        options: AssemblerOptions,
    ) -> CoreResult<EngraveResult> {
        if !(1..=8).contains(&start_position) {
            return Err(CoreError::InvalidStartPosition(start_position));
        }

        let sm = StateMachine::new(self.batches, self.serials);

        // Resolve each module's SKU, dropping any the resolver can't place,
        // and position what's left starting from `start_position`.
        let mut resolved_modules: Vec<EngraveModuleInput> = Vec::new();
        let mut requests: Vec<SerialRequest> = Vec::new();
        for module in &modules {
            let Some(resolution) = self.resolver.resolve(&module.sku)? else {
                continue;
            };
            let position = start_position + resolved_modules.len() as u8;
            requests.push(SerialRequest {
                sku: resolution.canonical_sku,
                module_position: position,
                original_sku: resolution.is_legacy.then_some(resolution.original_sku),
            });
            resolved_modules.push(module.clone());
        }

        let start_result = sm.start(batch_id, qsa_sequence, requests).await?;
        let serials = start_result.serials;

        let svg = match self.build_document(&resolved_modules, &serials, options) {
            Ok(svg) => svg,
            Err(e) => {
                self.serials.void(batch_id, qsa_sequence).await.ok();
                return Err(e);
            }
        };

        let artifact_name = format!("{}-{}-{}.svg", self.qsa_id, batch_id, qsa_sequence);
        let artifact_path = match self.sink.write(&artifact_name, &svg).await {
            Ok(path) => path,
            Err(e) => {
                self.serials.void(batch_id, qsa_sequence).await.ok();
                return Err(e);
            }
        };

        Ok(EngraveResult { svg, serials, artifact_path })
    }

    fn build_document(
        &self,
        modules: &[EngraveModuleInput],
        serials: &[Serial],
        options: AssemblerOptions,
    ) -> CoreResult<String> {
        let placements: Vec<ModulePlacement> = serials
            .iter()
            .zip(modules.iter())
            .map(|(serial, module)| {
                let url = qr::qsa_url(&format!("{}{:05}", self.design.code, serial.serial_integer));
                ModulePlacement {
                    position: serial.module_position,
                    micro_id_serial: serial.serial_integer,
                    module_id_text: Some(format!("{:05}", serial.serial_integer)),
                    serial_url_text: Some(url),
                    led_codes: module.led_codes.clone(),
                }
            })
            .collect();

        assembler::assemble(
            &self.design,
            &self.qsa_id,
            &placements,
            self.config.as_ref(),
            &self.canvas,
            &options,
        )
    }
}
