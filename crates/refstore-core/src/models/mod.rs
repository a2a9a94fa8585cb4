//! Domain models shared across the Refstore crates.

pub mod deletion;
pub mod group;
pub mod reference;
pub mod request;
pub mod storage_request;

pub use deletion::{DeletionRequestStatus, FileDeletionRequest};
pub use group::{GroupStatus, RequestGroup, RequestResultInfo, RequestType};
pub use reference::{FileMetaInfo, FileReference};
pub use request::{
    CopyItem, DeleteItem, ItemDisposition, ItemOutcome, ReferenceItem, SessionInfo, StorageItem,
};
pub use storage_request::{FileStorageRequest, NewStorageRequest, StorageRequestStatus};
