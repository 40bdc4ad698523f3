//! # Batch / Serial Lifecycle Engine
//!
//! Groups the data model ([`types`]), the sort/breakdown pass
//! ([`sorter`]), the serial allocator ([`repository`]), and the row
//! state machine ([`state_machine`]) that together drive a batch from
//! a module selection to committed, engraved serials.

pub mod repository;
pub mod sorter;
pub mod state_machine;
pub mod types;
