//! Storage plugin abstraction
//!
//! The engine never performs storage I/O itself; it talks to registered
//! plugins through the [`StoragePlugin`] trait and only consults the
//! registry to answer "is this storage backed by a known plugin".

pub mod local;
pub mod registry;
pub mod traits;

pub use local::LocalStoragePlugin;
pub use registry::PluginRegistry;
pub use traits::{StorageClass, StoragePlugin, StorageError, StorageResult, StoredLocation};
