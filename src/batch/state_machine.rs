//! # Batch/Queue State Machine
//!
//! Rows move through `pending -> in_progress -> done`. Every transition
//! is idempotent: a duplicate call returns success with a flag rather
//! than an error, mirroring the RPC envelope in the external interface
//! (`{success, flags, data?, error?}`).

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;

use crate::batch::repository::{SerialRequest, SerialStore};
use crate::batch::types::{Batch, BatchStatus, Row, RowStatus, Serial};
use crate::error::CoreResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    AlreadyStarted,
    AlreadyDone,
    RaceDetected,
    UseRetry,
}

#[derive(Debug, Default)]
pub struct TransitionResult {
    pub success: bool,
    pub flags: HashSet<Flag>,
    pub serials: Vec<Serial>,
}

impl TransitionResult {
    fn ok() -> Self {
        Self { success: true, ..Default::default() }
    }

    fn with_flag(mut self, flag: Flag) -> Self {
        self.flags.insert(flag);
        self
    }

    fn with_serials(mut self, serials: Vec<Serial>) -> Self {
        self.serials = serials;
        self
    }
}

#[async_trait::async_trait]
pub trait BatchStore: Send + Sync {
    async fn get_row(&self, batch_id: i64, qsa_sequence: u32) -> CoreResult<Option<Row>>;
    async fn put_row(&self, row: Row) -> CoreResult<()>;
    async fn get_batch(&self, batch_id: i64) -> CoreResult<Option<Batch>>;
    async fn put_batch(&self, batch: Batch) -> CoreResult<()>;
    async fn rows_for_batch(&self, batch_id: i64) -> CoreResult<Vec<Row>>;
}

pub struct InMemoryBatchStore {
    rows: Mutex<HashMap<(i64, u32), Row>>,
    batches: Mutex<HashMap<i64, Batch>>,
}

impl Default for InMemoryBatchStore {
    fn default() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            batches: Mutex::new(HashMap::new()),
        }
    }
}

impl InMemoryBatchStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl BatchStore for InMemoryBatchStore {
    async fn get_row(&self, batch_id: i64, qsa_sequence: u32) -> CoreResult<Option<Row>> {
        Ok(self.rows.lock().get(&(batch_id, qsa_sequence)).cloned())
    }

    async fn put_row(&self, row: Row) -> CoreResult<()> {
        self.rows.lock().insert((row.batch_id, row.qsa_sequence), row);
        Ok(())
    }

    async fn get_batch(&self, batch_id: i64) -> CoreResult<Option<Batch>> {
        Ok(self.batches.lock().get(&batch_id).cloned())
    }

    async fn put_batch(&self, batch: Batch) -> CoreResult<()> {
        self.batches.lock().insert(batch.id, batch);
        Ok(())
    }

    async fn rows_for_batch(&self, batch_id: i64) -> CoreResult<Vec<Row>> {
        Ok(self
            .rows
            .lock()
            .values()
            .filter(|r| r.batch_id == batch_id)
            .cloned()
            .collect())
    }
}

/// Drives row/batch transitions against a [`BatchStore`] and
/// [`SerialStore`] pair. One instance is shared across operator
/// requests; all mutation happens through the stores' own locking.
pub struct StateMachine<'a, B: BatchStore, S: SerialStore> {
    pub batches: &'a B,
    pub serials: &'a S,
}

impl<'a, B: BatchStore, S: SerialStore> StateMachine<'a, B, S> {
    pub fn new(batches: &'a B, serials: &'a S) -> Self {
        Self { batches, serials }
    }

    pub async fn start(
        &self,
        batch_id: i64,
        qsa_sequence: u32,
        requests: Vec<SerialRequest>,
    ) -> CoreResult<TransitionResult> {
        let Some(mut row) = self.batches.get_row(batch_id, qsa_sequence).await? else {
            return Ok(TransitionResult { success: false, ..Default::default() });
        };

        match row.status {
            RowStatus::Done => {
                let existing = self.serials.list_for_row(batch_id, qsa_sequence).await?;
                return Ok(TransitionResult::ok().with_flag(Flag::AlreadyDone).with_serials(existing));
            }
            RowStatus::InProgress => {
                let existing = self.serials.list_for_row(batch_id, qsa_sequence).await?;
                return Ok(TransitionResult::ok().with_flag(Flag::AlreadyStarted).with_serials(existing));
            }
            RowStatus::Pending => {}
        }

        let serials = self.serials.reserve(batch_id, qsa_sequence, requests).await?;

        row.status = RowStatus::InProgress;
        if let Err(e) = self.batches.put_row(row).await {
            self.serials.void(batch_id, qsa_sequence).await.ok();
            return Err(e);
        }

        Ok(TransitionResult::ok().with_serials(serials))
    }

    pub async fn next_array(&self, batch_id: i64, qsa_sequence: u32) -> CoreResult<TransitionResult> {
        let Some(row) = self.batches.get_row(batch_id, qsa_sequence).await? else {
            return Ok(TransitionResult { success: false, ..Default::default() });
        };
        if row.status == RowStatus::Done {
            return Ok(TransitionResult::ok().with_flag(Flag::AlreadyDone));
        }

        self.serials.commit(batch_id, qsa_sequence).await?;
        Ok(TransitionResult::ok())
    }

    pub async fn complete(&self, batch_id: i64, qsa_sequence: u32) -> CoreResult<TransitionResult> {
        let Some(mut row) = self.batches.get_row(batch_id, qsa_sequence).await? else {
            return Ok(TransitionResult { success: false, ..Default::default() });
        };
        if row.status == RowStatus::Done {
            return Ok(TransitionResult::ok().with_flag(Flag::AlreadyDone));
        }

        let committed = self.serials.commit(batch_id, qsa_sequence).await?;
        let mut result = TransitionResult::ok();

        if committed == 0 {
            let engraved = self.serials.count_engraved(batch_id, qsa_sequence).await?;
            if engraved == 0 {
                return Ok(TransitionResult::ok().with_flag(Flag::UseRetry));
            }
            result = result.with_flag(Flag::RaceDetected);
        }

        row.status = RowStatus::Done;
        self.batches.put_row(row).await?;
        self.close_batch_if_all_done(batch_id).await?;
        Ok(result)
    }

    pub async fn resend(&self, batch_id: i64, qsa_sequence: u32) -> CoreResult<TransitionResult> {
        let Some(row) = self.batches.get_row(batch_id, qsa_sequence).await? else {
            return Ok(TransitionResult { success: false, ..Default::default() });
        };
        let _ = row;
        Ok(TransitionResult::ok())
    }

    pub async fn retry(
        &self,
        batch_id: i64,
        qsa_sequence: u32,
        requests: Vec<SerialRequest>,
    ) -> CoreResult<TransitionResult> {
        self.serials.void(batch_id, qsa_sequence).await?;
        let serials = self.serials.reserve(batch_id, qsa_sequence, requests).await?;
        Ok(TransitionResult::ok().with_serials(serials))
    }

    pub async fn rerun(&self, batch_id: i64, qsa_sequence: u32) -> CoreResult<TransitionResult> {
        let Some(mut row) = self.batches.get_row(batch_id, qsa_sequence).await? else {
            return Ok(TransitionResult { success: false, ..Default::default() });
        };
        // Engraved serials are physically on parts; never voided here.
        row.status = RowStatus::Pending;
        self.batches.put_row(row).await?;

        if let Some(mut batch) = self.batches.get_batch(batch_id).await? {
            if batch.status == BatchStatus::Done {
                batch.status = BatchStatus::InProgress;
                self.batches.put_batch(batch).await?;
            }
        }

        Ok(TransitionResult::ok())
    }

    pub async fn update_start_position(
        &self,
        batch_id: i64,
        qsa_sequence: u32,
        position: u8,
    ) -> CoreResult<TransitionResult> {
        let Some(mut row) = self.batches.get_row(batch_id, qsa_sequence).await? else {
            return Ok(TransitionResult { success: false, ..Default::default() });
        };
        if row.status != RowStatus::Pending {
            return Ok(TransitionResult { success: false, ..Default::default() });
        }
        row.start_position = position;
        self.batches.put_row(row).await?;
        Ok(TransitionResult::ok())
    }

    async fn close_batch_if_all_done(&self, batch_id: i64) -> CoreResult<()> {
        let rows = self.batches.rows_for_batch(batch_id).await?;
        if rows.iter().all(|r| r.status == RowStatus::Done) {
            if let Some(mut batch) = self.batches.get_batch(batch_id).await? {
                batch.status = BatchStatus::Done;
                self.batches.put_batch(batch).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::repository::InMemorySerialStore;
    use chrono::Utc;

    fn pending_row(batch_id: i64, qsa_sequence: u32) -> Row {
        Row {
            batch_id,
            qsa_sequence,
            sku_composition: vec!["STAR-00001".to_string()],
            qty: 2,
            status: RowStatus::Pending,
            start_position: 1,
            engraved_at: None,
        }
    }

    fn reqs() -> Vec<SerialRequest> {
        vec![
            SerialRequest { sku: "STAR-00001".to_string(), module_position: 1, original_sku: None },
            SerialRequest { sku: "STAR-00001".to_string(), module_position: 2, original_sku: None },
        ]
    }

    async fn setup() -> (InMemoryBatchStore, InMemorySerialStore) {
        let batches = InMemoryBatchStore::new();
        let serials = InMemorySerialStore::new();
        batches
            .put_batch(Batch { id: 1, name: "B".into(), status: BatchStatus::InProgress, created_at: Utc::now() })
            .await
            .unwrap();
        batches.put_row(pending_row(1, 1)).await.unwrap();
        (batches, serials)
    }

    #[tokio::test]
    async fn start_reserves_serials_and_advances_status() {
        let (batches, serials) = setup().await;
        let sm = StateMachine::new(&batches, &serials);
        let result = sm.start(1, 1, reqs()).await.unwrap();
        assert!(result.success);
        assert_eq!(result.serials.len(), 2);
        let row = batches.get_row(1, 1).await.unwrap().unwrap();
        assert_eq!(row.status, RowStatus::InProgress);
    }

    #[tokio::test]
    async fn start_is_idempotent_when_already_started() {
        let (batches, serials) = setup().await;
        let sm = StateMachine::new(&batches, &serials);
        let first = sm.start(1, 1, reqs()).await.unwrap();
        let second = sm.start(1, 1, reqs()).await.unwrap();
        assert!(second.flags.contains(&Flag::AlreadyStarted));
        assert_eq!(second.serials.len(), first.serials.len());
    }

    #[tokio::test]
    async fn complete_marks_row_and_batch_done() {
        let (batches, serials) = setup().await;
        let sm = StateMachine::new(&batches, &serials);
        sm.start(1, 1, reqs()).await.unwrap();
        let result = sm.complete(1, 1).await.unwrap();
        assert!(result.success);
        assert!(result.flags.is_empty());
        assert_eq!(batches.get_row(1, 1).await.unwrap().unwrap().status, RowStatus::Done);
        assert_eq!(batches.get_batch(1).await.unwrap().unwrap().status, BatchStatus::Done);
    }

    #[tokio::test]
    async fn complete_detects_race_when_already_engraved_elsewhere() {
        let (batches, serials) = setup().await;
        let sm = StateMachine::new(&batches, &serials);
        sm.start(1, 1, reqs()).await.unwrap();
        serials.commit(1, 1).await.unwrap();
        let result = sm.complete(1, 1).await.unwrap();
        assert!(result.flags.contains(&Flag::RaceDetected));
        assert_eq!(batches.get_row(1, 1).await.unwrap().unwrap().status, RowStatus::Done);
    }

    #[tokio::test]
    async fn complete_without_reservation_returns_use_retry() {
        let (batches, serials) = setup().await;
        let sm = StateMachine::new(&batches, &serials);
        let result = sm.complete(1, 1).await.unwrap();
        assert!(result.flags.contains(&Flag::UseRetry));
        assert_eq!(batches.get_row(1, 1).await.unwrap().unwrap().status, RowStatus::Pending);
    }

    #[tokio::test]
    async fn rerun_resets_row_without_touching_engraved_serials() {
        let (batches, serials) = setup().await;
        let sm = StateMachine::new(&batches, &serials);
        sm.start(1, 1, reqs()).await.unwrap();
        sm.complete(1, 1).await.unwrap();
        sm.rerun(1, 1).await.unwrap();
        assert_eq!(batches.get_row(1, 1).await.unwrap().unwrap().status, RowStatus::Pending);
        assert_eq!(serials.count_engraved(1, 1).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn update_start_position_rejected_once_in_progress() {
        let (batches, serials) = setup().await;
        let sm = StateMachine::new(&batches, &serials);
        sm.start(1, 1, reqs()).await.unwrap();
        let result = sm.update_start_position(1, 1, 3).await.unwrap();
        assert!(!result.success);
    }
}
