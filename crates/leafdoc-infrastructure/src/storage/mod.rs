//! Key-value store implementations.

pub mod atomic_file;
pub mod file_store;
pub mod memory_store;

pub use file_store::FileKeyValueStore;
pub use memory_store::MemoryKeyValueStore;
