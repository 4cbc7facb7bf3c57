//! Profile record store adapters.

mod file;
mod memory;
mod rest;

pub use file::FileProfileRecordStore;
pub use memory::InMemoryProfileRecordStore;
pub use rest::{RestProfileRecordStore, RestStoreConfig};
