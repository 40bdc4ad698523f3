//! # Batch / Row / Serial data model

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    InProgress,
    Done,
}

#[derive(Debug, Clone)]
pub struct Batch {
    pub id: i64,
    pub name: String,
    pub status: BatchStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    Pending,
    InProgress,
    Done,
}

#[derive(Debug, Clone)]
pub struct Row {
    pub batch_id: i64,
    pub qsa_sequence: u32,
    pub sku_composition: Vec<String>,
    pub qty: u32,
    pub status: RowStatus,
    pub start_position: u8,
    pub engraved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialStatus {
    Reserved,
    Engraved,
    Void,
}

#[derive(Debug, Clone)]
pub struct Serial {
    pub batch_id: i64,
    pub qsa_sequence: u32,
    pub serial_integer: u32,
    pub sku: String,
    pub module_position: u8,
    pub status: SerialStatus,
    pub original_sku: Option<String>,
}

/// A module requested for engraving before resolution/grouping: its SKU
/// as submitted, an optional original (legacy) SKU, and its LED codes in
/// submission order (deduplicated by the sorter, not here).
#[derive(Debug, Clone)]
pub struct ModuleRequest {
    pub sku: String,
    pub led_codes: Vec<u8>,
    pub original_position: usize,
}

/// One visual line presented to an operator: consecutive QSA rows that
/// share an identical resolved canonical SKU.
#[derive(Debug, Clone)]
pub struct Group {
    pub canonical_sku: String,
    pub qsa_sequences: Vec<u32>,
    pub total_qty: u32,
}
