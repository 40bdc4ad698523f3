//! # Error Types
//!
//! Single error taxonomy for the engraving core, grouped by the categories
//! in the system design: validation, state, integrity, and storage. Every
//! fallible operation in this crate returns `Result<T, CoreError>`.

use thiserror::Error;

/// Main error type for the engraving core.
#[derive(Debug, Error)]
pub enum CoreError {
    // ===== Validation =====
    /// Micro-ID serial integer outside `[1, 1_048_575]`.
    #[error("serial {0} is out of range [1, 1048575]")]
    OutOfRange(u32),

    /// `start_position` outside `1..=8`.
    #[error("invalid start position {0}, must be 1..=8")]
    InvalidStartPosition(u8),

    /// An element config row's `(position, kind)` pair violates the
    /// design-level-vs-module-level invariant.
    #[error("invalid position {position} for element kind {kind:?}")]
    InvalidPosition { position: u8, kind: String },

    /// Unknown `match_type` string for a legacy SKU mapping row.
    #[error("invalid match type: {0}")]
    InvalidMatchType(String),

    /// Canonical design code is not exactly 4 uppercase ASCII letters.
    #[error("canonical code {0:?} must be exactly 4 uppercase letters")]
    CanonicalCodeMalformed(String),

    /// A mapping row collides on the unique `(pattern, match_type)` key.
    #[error("duplicate mapping for pattern {pattern:?} with match type {match_type:?}")]
    DuplicateMapping { pattern: String, match_type: String },

    /// QR payload is empty.
    #[error("QR code data must not be empty")]
    InvalidData,

    /// QR payload exceeds the chosen QR version's capacity.
    #[error("QR code data too long for available versions")]
    DataTooLong,

    // ===== State =====
    /// A reservation already exists for this `(batch, qsa_sequence)`.
    #[error("serials already reserved for batch {batch_id} qsa {qsa_sequence}")]
    AlreadyReserved { batch_id: i64, qsa_sequence: u32 },

    /// `commit`'s auto-fix of empty/null rows failed; the whole commit aborted.
    #[error("auto-fix of corrupted serial rows failed for batch {batch_id} qsa {qsa_sequence}")]
    AutoFixFailed { batch_id: i64, qsa_sequence: u32 },

    /// A non-idempotent operation was invoked against a row in the wrong status.
    #[error("row is not in the required status for this operation: {0}")]
    RowNotInRequiredStatus(String),

    // ===== Integrity =====
    /// Micro-ID decode: even-parity check failed.
    #[error("micro-ID parity check failed")]
    ParityError,

    /// Micro-ID decode: one or more of the four corner anchors is not ON.
    #[error("micro-ID anchor dots missing or incorrect")]
    AnchorError,

    /// A required element (e.g. `micro_id`) has no config row for this design/position.
    #[error("required element config missing: {0:?}")]
    ConfigMissing(String),

    // ===== Storage =====
    /// A storage transaction could not be started or completed.
    #[error("storage transaction failed: {0}")]
    TransactionFailed(String),

    /// A commit to the backing store failed after a transaction began.
    #[error("storage commit failed: {0}")]
    CommitFailed(String),

    /// A rollback itself failed; the backing store may be left inconsistent.
    #[error("storage rollback failed: {0}")]
    RollbackFailed(String),
}

/// Convenience alias used throughout the crate.
pub type CoreResult<T> = Result<T, CoreError>;
