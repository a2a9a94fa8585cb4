//! Test helpers: in-memory stores and recording collaborators.
//!
//! These allow exercising the orchestrator, status engine and group tracker
//! without a database or message bus.

pub mod mock_stores;

pub use mock_stores::{Counters, InMemoryStore, RecordingNotifier, RecordingPublisher};
