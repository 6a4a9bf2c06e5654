pub mod database;
pub mod providers;
pub mod storage;

pub use database::{ImageDb, MetadataStore};
pub use storage::{GcsAuth, GcsStorage, LocalStorage, Storage, StorageError};
