//! Application layer containing the core business logic orchestration.
//!
//! [`WorkLedger`] is the single entry point. Its operations are grouped by
//! component: the connection ledger, the job engine and the payment ledger,
//! each in its own module, all consulting [`crate::domain::policy`] inside
//! the store's atomic updates.

pub mod connections;
pub mod engine;
pub mod jobs;
pub mod payments;

pub use engine::{JobReport, LedgerConfig, WorkLedger};
