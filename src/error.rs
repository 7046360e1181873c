//! Top-level error of a launch
//!
//! Each stage keeps its own error type; `LaunchError` gathers them so the
//! binary can map a failure category to an exit code. Timeouts from either
//! network stage are lifted into [`LaunchError::Timeout`].

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigFileError;
use crate::install::ProvisionError;
use crate::parser::ConfigError;
use crate::version::error::{ParseError, RegistryError, SelectError};

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    ConfigFile(#[from] ConfigFileError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Fetch(RegistryError),

    #[error(transparent)]
    NoMatch(#[from] SelectError),

    #[error(transparent)]
    Provision(ProvisionError),

    #[error("Timed out during {operation} ({url})")]
    Timeout {
        operation: &'static str,
        url: String,
    },

    #[error("Failed to execute {path:?}")]
    Exec {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LaunchError {
    /// Process exit code for this failure category
    pub fn exit_code(&self) -> u8 {
        match self {
            LaunchError::Config(_) | LaunchError::ConfigFile(_) => 2,
            LaunchError::Parse(_) => 3,
            LaunchError::Fetch(_) => 4,
            LaunchError::NoMatch(_) => 5,
            LaunchError::Provision(_) => 6,
            LaunchError::Timeout { .. } => 7,
            LaunchError::Exec { .. } => 8,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, LaunchError::Timeout { .. })
    }
}

impl From<RegistryError> for LaunchError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Timeout { url } => LaunchError::Timeout {
                operation: "version index fetch",
                url,
            },
            other => LaunchError::Fetch(other),
        }
    }
}

impl From<ProvisionError> for LaunchError {
    fn from(err: ProvisionError) -> Self {
        match err {
            ProvisionError::Timeout { url } => LaunchError::Timeout {
                operation: "download",
                url,
            },
            other => LaunchError::Provision(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ConfigError::NoConstraint { dir: PathBuf::from(".") }.into(), 2)]
    #[case(ParseError::Empty.into(), 3)]
    #[case(RegistryError::EmptyCatalog { url: "u".into() }.into(), 4)]
    #[case(SelectError::NoMatch { constraint: "= 1.0.0".into(), candidates: 2 }.into(), 5)]
    #[case(ProvisionError::NotFound { url: "u".into() }.into(), 6)]
    #[case(RegistryError::Timeout { url: "u".into() }.into(), 7)]
    #[case(LaunchError::Exec { path: PathBuf::from("tf"), source: std::io::Error::other("x") }, 8)]
    fn exit_code_is_distinct_per_category(#[case] err: LaunchError, #[case] expected: u8) {
        assert_eq!(err.exit_code(), expected);
    }

    #[test]
    fn registry_timeout_is_lifted() {
        let err = LaunchError::from(RegistryError::Timeout {
            url: "https://releases.example.com/terraform/".to_string(),
        });

        assert!(err.is_timeout());
        assert_eq!(
            err.to_string(),
            "Timed out during version index fetch (https://releases.example.com/terraform/)"
        );
    }

    #[test]
    fn provision_timeout_is_lifted() {
        let err = LaunchError::from(ProvisionError::Timeout {
            url: "https://releases.example.com/a.zip".to_string(),
        });

        assert!(matches!(
            err,
            LaunchError::Timeout { operation: "download", .. }
        ));
    }

    #[test]
    fn other_provision_errors_keep_their_category() {
        let err = LaunchError::from(ProvisionError::ChecksumMismatch {
            file: "a.zip".to_string(),
            expected: "00".to_string(),
            actual: "11".to_string(),
        });

        assert!(!err.is_timeout());
        assert_eq!(err.exit_code(), 6);
    }

    #[test]
    fn alternate_display_names_the_cause_once() {
        let err = anyhow::Error::from(LaunchError::Exec {
            path: PathBuf::from("cache/1.5.3/terraform"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        });

        let message = format!("{:#}", err);

        assert_eq!(
            message,
            "Failed to execute \"cache/1.5.3/terraform\": no such file"
        );
    }

    #[test]
    fn lifted_stage_errors_name_the_cause_once() {
        let err = anyhow::Error::from(LaunchError::from(ProvisionError::Io {
            operation: "write completion marker".to_string(),
            source: std::io::Error::other("disk full"),
        }));

        let message = format!("{:#}", err);

        assert_eq!(message, "Failed to write completion marker: disk full");
    }
}
