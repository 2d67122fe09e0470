//! Search-result scanning: the platform client seam and the paged,
//! deduplicating profile scanner built on top of it.

pub mod client;
pub mod scanner;

pub use client::{
    ConnectResponse, ConnectStatus, PlatformClient, PlatformError, ResponseMeta, SearchPage,
};
pub use scanner::{PartialScan, ProfileScanner, ScanConfig, ScanError};
