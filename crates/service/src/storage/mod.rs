//! Storage abstractions for the service layer
//!
//! `blob_store` persists opaque serialized blobs by name; `record_store`
//! layers an ordered, indexed record collection on top of one blob.

pub mod blob_store;
pub mod record_store;

pub use blob_store::{BlobStore, FileBlobStore, MemoryBlobStore};
pub use record_store::{Loaded, RecordStore};
