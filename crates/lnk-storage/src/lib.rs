//! Campaign persistence: the storage contract and its file-backed
//! implementation.

pub mod store;

pub use store::{FileStore, Storage};
