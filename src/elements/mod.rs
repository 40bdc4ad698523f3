//! # Config Store Adapter
//!
//! Per-design placement configuration for every element kind the
//! assembler can draw. Mirrors the "monkey-patchable hook" shape of the
//! reference printer-document assembler's device profiles: a trait for
//! the collaborator, plus an in-memory reference implementation used by
//! tests and the CLI's default run mode.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::{CoreError, CoreResult};

/// A design identity: a 4-letter code with an optional lowercase
/// revision suffix (e.g. `STAR` or `STAR` rev `a`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DesignKey {
    pub code: String,
    pub revision: Option<char>,
}

impl DesignKey {
    pub fn new(code: impl Into<String>, revision: Option<char>) -> Self {
        Self { code: code.into(), revision }
    }
}

/// Every element the assembler knows how to place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    MicroId,
    ModuleId,
    SerialUrl,
    LedCode(u8),
    DataMatrix,
    QrCode,
}

impl ElementKind {
    /// QR is design-level and must sit at position 0; every other
    /// element is module-level and must sit at positions 1..=8.
    pub fn position_kind_ok(&self, position: u8) -> bool {
        match self {
            ElementKind::QrCode => position == 0,
            _ => (1..=8).contains(&position),
        }
    }
}

/// Placement and styling for one element within one array position.
#[derive(Debug, Clone)]
pub struct ElementConfig {
    pub origin_mm: (f64, f64),
    pub rotation_deg: Option<f64>,
    pub element_size_mm: Option<f64>,
    pub text_height_mm: Option<f64>,
    pub tracking_multiplier: Option<f64>,
}

impl ElementConfig {
    pub fn new(origin_mm: (f64, f64)) -> Self {
        Self {
            origin_mm,
            rotation_deg: None,
            element_size_mm: None,
            text_height_mm: None,
            tracking_multiplier: None,
        }
    }
}

/// A configured collaborator the assembler pulls element placement
/// from. Implementations may be backed by a database, a file, or (as
/// here) an in-memory map.
pub trait ConfigStore: Send + Sync {
    fn get(
        &self,
        design: &DesignKey,
        position: u8,
        kind: ElementKind,
    ) -> CoreResult<Option<ElementConfig>>;

    /// All configured elements for a design, keyed by `(position, kind)`.
    fn get_for_design(
        &self,
        design: &DesignKey,
    ) -> CoreResult<HashMap<(u8, ElementKind), ElementConfig>>;
}

#[derive(Default)]
pub struct InMemoryConfigStore {
    entries: RwLock<HashMap<DesignKey, HashMap<(u8, ElementKind), ElementConfig>>>,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one element's placement config. Rejects positions that
    /// violate the QR-is-design-level / everything-else-is-module-level
    /// invariant in either direction.
    pub fn set(
        &self,
        design: DesignKey,
        position: u8,
        kind: ElementKind,
        config: ElementConfig,
    ) -> CoreResult<()> {
        if !kind.position_kind_ok(position) {
            return Err(CoreError::InvalidPosition {
                position,
                kind: format!("{kind:?}"),
            });
        }
        self.entries
            .write()
            .entry(design)
            .or_default()
            .insert((position, kind), config);
        Ok(())
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn get(
        &self,
        design: &DesignKey,
        position: u8,
        kind: ElementKind,
    ) -> CoreResult<Option<ElementConfig>> {
        Ok(self
            .entries
            .read()
            .get(design)
            .and_then(|m| m.get(&(position, kind)))
            .cloned())
    }

    fn get_for_design(
        &self,
        design: &DesignKey,
    ) -> CoreResult<HashMap<(u8, ElementKind), ElementConfig>> {
        Ok(self.entries.read().get(design).cloned().unwrap_or_default())
    }
}
