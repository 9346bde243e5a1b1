//! # Storage
//!
//! Durable key-value access for the toolbar. All other modules go through
//! [`StorageAdapter`] and never see the backend directly.
//!
//! - **Backend**: raw string store (`MemoryBackend`, `LocalBackend`)
//! - **Adapter**: namespacing and JSON encoding, corrupt data reads as absent

pub mod adapter;
pub mod backend;
pub mod errors;
pub mod local;
pub mod memory;

pub use adapter::{StorageAdapter, StorageSuffix, DEFAULT_NAMESPACE, KEY_SEPARATOR};
pub use backend::KeyValueBackend;
pub use errors::{StorageError, StorageResult};
pub use local::LocalBackend;
pub use memory::MemoryBackend;
