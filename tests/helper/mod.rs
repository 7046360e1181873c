//! Shared helpers for integration tests

#![allow(dead_code)]

pub mod release_site;

pub use release_site::*;
