//! Storage request status derivation and the delayed-request sweep.

pub mod engine;

pub use engine::{new_status, BlockingState, StatusEngine};
