//! Refstore background worker
//!
//! Hosts the periodic sweeps the engine relies on: delayed storage request
//! promotion and request group reconciliation. Both are idempotent, so a
//! crashed or skipped cycle only delays progress.

pub mod sweeper;
pub mod telemetry;

pub use sweeper::{SweepWorker, SweepWorkerConfig};
pub use telemetry::init_telemetry;
