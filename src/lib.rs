//! tfrun: run the Terraform version a project asks for
//!
//! - config.rs: launcher settings and defaults
//! - parser/: reading `required_version` from project files
//! - version/: constraint parsing, catalog fetching and selection
//! - install/: download, verification and the local version cache
//! - launcher.rs: the resolve-then-provision pipeline
//! - exec.rs: running the provisioned executable
//! - error.rs: top-level error and exit codes
//! - http.rs: HTTP client and retry helpers
//! - logging.rs: tracing subscriber setup

pub mod config;
pub mod error;
pub mod exec;
pub mod http;
pub mod install;
pub mod launcher;
pub mod logging;
pub mod parser;
pub mod version;

pub use error::LaunchError;
pub use launcher::Launcher;
