//! Bulk request orchestration.

pub mod service;

pub use service::RequestOrchestrator;
