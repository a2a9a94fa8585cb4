//! Refstore persistence layer
//!
//! Concrete sqlx/Postgres repositories plus the narrow store traits the
//! service layer consumes. Services depend on the traits so the engine can
//! be exercised against in-memory mocks without a database.

pub mod db;

pub use db::traits::{DeletionStore, GroupStore, ReferenceStore, StorageRequestStore};
pub use db::{
    DeletionRequestRepository, FileReferenceRepository, RequestGroupRepository,
    StorageRequestRepository,
};
