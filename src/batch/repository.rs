//! # Serial Repository
//!
//! Atomic allocation, commit, and void of serial integers for
//! `(batch_id, qsa_sequence)`. The in-memory reference store guards its
//! whole state behind one `parking_lot::Mutex` so every operation runs
//! as if inside a serializable transaction, the way the state machine
//! (§4.J) expects.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::batch::types::{Serial, SerialStatus};
use crate::error::{CoreError, CoreResult};

/// One position/SKU pair to reserve a serial for.
#[derive(Debug, Clone)]
pub struct SerialRequest {
    pub sku: String,
    pub module_position: u8,
    pub original_sku: Option<String>,
}

#[async_trait::async_trait]
pub trait SerialStore: Send + Sync {
    async fn count_committable(&self, batch_id: i64, qsa_sequence: u32) -> CoreResult<u32>;

    async fn count_engraved(&self, batch_id: i64, qsa_sequence: u32) -> CoreResult<u32>;

    async fn reserve(
        &self,
        batch_id: i64,
        qsa_sequence: u32,
        requests: Vec<SerialRequest>,
    ) -> CoreResult<Vec<Serial>>;

    async fn commit(&self, batch_id: i64, qsa_sequence: u32) -> CoreResult<u32>;

    async fn void(&self, batch_id: i64, qsa_sequence: u32) -> CoreResult<u32>;

    /// All serials currently on record for this row, regardless of status.
    /// Lets a duplicate `start` call recover the serials a prior call
    /// already reserved instead of reserving (or losing) them again.
    async fn list_for_row(&self, batch_id: i64, qsa_sequence: u32) -> CoreResult<Vec<Serial>>;
}

struct State {
    next_serial: u32,
    rows: HashMap<(i64, u32), Vec<Serial>>,
}

pub struct InMemorySerialStore {
    state: Mutex<State>,
}

impl Default for InMemorySerialStore {
    fn default() -> Self {
        Self {
            state: Mutex::new(State {
                next_serial: crate::micro_id::MIN_SERIAL,
                rows: HashMap::new(),
            }),
        }
    }
}

impl InMemorySerialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SerialStore for InMemorySerialStore {
    async fn count_committable(&self, batch_id: i64, qsa_sequence: u32) -> CoreResult<u32> {
        let state = self.state.lock();
        let count = state
            .rows
            .get(&(batch_id, qsa_sequence))
            .map(|rows| {
                rows.iter()
                    .filter(|s| s.status == SerialStatus::Reserved)
                    .count() as u32
            })
            .unwrap_or(0);
        Ok(count)
    }

    async fn count_engraved(&self, batch_id: i64, qsa_sequence: u32) -> CoreResult<u32> {
        let state = self.state.lock();
        let count = state
            .rows
            .get(&(batch_id, qsa_sequence))
            .map(|rows| {
                rows.iter()
                    .filter(|s| s.status == SerialStatus::Engraved)
                    .count() as u32
            })
            .unwrap_or(0);
        Ok(count)
    }

    async fn reserve(
        &self,
        batch_id: i64,
        qsa_sequence: u32,
        requests: Vec<SerialRequest>,
    ) -> CoreResult<Vec<Serial>> {
        let mut state = self.state.lock();

        if let Some(existing) = state.rows.get(&(batch_id, qsa_sequence)) {
            if existing
                .iter()
                .any(|s| matches!(s.status, SerialStatus::Reserved | SerialStatus::Engraved))
            {
                return Err(CoreError::AlreadyReserved { batch_id, qsa_sequence });
            }
        }

        let mut serials = Vec::with_capacity(requests.len());
        for req in requests {
            if state.next_serial > crate::micro_id::MAX_SERIAL {
                return Err(CoreError::OutOfRange(state.next_serial));
            }
            let serial_integer = state.next_serial;
            state.next_serial += 1;
            serials.push(Serial {
                batch_id,
                qsa_sequence,
                serial_integer,
                sku: req.sku,
                module_position: req.module_position,
                status: SerialStatus::Reserved,
                original_sku: req.original_sku,
            });
        }

        state
            .rows
            .entry((batch_id, qsa_sequence))
            .or_default()
            .extend(serials.clone());
        Ok(serials)
    }

    async fn commit(&self, batch_id: i64, qsa_sequence: u32) -> CoreResult<u32> {
        let mut state = self.state.lock();
        let Some(rows) = state.rows.get_mut(&(batch_id, qsa_sequence)) else {
            return Ok(0);
        };
        let mut committed = 0;
        for row in rows.iter_mut() {
            if row.status == SerialStatus::Reserved {
                row.status = SerialStatus::Engraved;
                committed += 1;
            }
        }
        Ok(committed)
    }

    async fn void(&self, batch_id: i64, qsa_sequence: u32) -> CoreResult<u32> {
        let mut state = self.state.lock();
        let Some(rows) = state.rows.get_mut(&(batch_id, qsa_sequence)) else {
            return Ok(0);
        };
        let mut voided = 0;
        for row in rows.iter_mut() {
            if row.status == SerialStatus::Reserved {
                row.status = SerialStatus::Void;
                voided += 1;
            }
        }
        Ok(voided)
    }

    async fn list_for_row(&self, batch_id: i64, qsa_sequence: u32) -> CoreResult<Vec<Serial>> {
        let state = self.state.lock();
        Ok(state
            .rows
            .get(&(batch_id, qsa_sequence))
            .cloned()
            .unwrap_or_default())
    }
}
