use thiserror::Error;

use crate::http::Retryable;

/// A single version token that could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid version \"{input}\": {reason}")]
pub struct VersionParseError {
    pub input: String,
    pub reason: &'static str,
}

impl VersionParseError {
    pub(crate) fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("version constraint is empty")]
    Empty,

    #[error("invalid version constraint \"{input}\": clause {position} is empty")]
    EmptyClause { input: String, position: usize },

    #[error("invalid version constraint \"{input}\": unknown operator \"{operator}\"")]
    UnknownOperator { input: String, operator: String },

    #[error("invalid version constraint \"{input}\": malformed version \"{clause}\"")]
    MalformedVersion { input: String, clause: String },
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Network error fetching {url}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Timed out fetching {url}")]
    Timeout { url: String },

    #[error("Unexpected status {status} from {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("No recognizable versions found at {url}; the index format may have changed")]
    EmptyCatalog { url: String },
}

impl RegistryError {
    pub(crate) fn from_reqwest(url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Network {
                url: url.to_string(),
                source,
            }
        }
    }
}

impl Retryable for RegistryError {
    fn is_retryable(&self) -> bool {
        match self {
            RegistryError::Network { .. } | RegistryError::Timeout { .. } => true,
            RegistryError::Status { status, .. } => crate::http::is_transient_status(*status),
            RegistryError::EmptyCatalog { .. } => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectError {
    #[error(
        "no published version satisfies \"{constraint}\" ({candidates} versions considered)"
    )]
    NoMatch {
        constraint: String,
        candidates: usize,
    },
}
