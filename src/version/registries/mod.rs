//! Registry implementations for fetching published versions

pub mod releases;

pub use releases::ReleasesRegistry;
