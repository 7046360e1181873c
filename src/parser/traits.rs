//! Constraint source trait definition

use std::fmt;
use std::path::{Path, PathBuf};

/// A version constraint declared in a project file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredConstraint {
    /// File the constraint was found in
    pub file: PathBuf,
    /// Raw constraint text, not yet parsed
    pub constraint: String,
}

impl fmt::Display for DeclaredConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .file
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| self.file.to_string_lossy());
        write!(f, "\"{}\" in {}", self.constraint, name)
    }
}

/// Trait for reading the required version constraint out of a project directory
pub trait ConstraintSource {
    /// Collect every constraint declared in `dir`, in file-name order
    fn declared_constraints(&self, dir: &Path) -> Result<Vec<DeclaredConstraint>, ConfigError>;

    /// The single constraint the project requires
    ///
    /// Fails when the project declares none, or more than one, since the
    /// launcher cannot pick between them reliably.
    fn required_constraint(&self, dir: &Path) -> Result<String, ConfigError> {
        let mut found = self.declared_constraints(dir)?;
        match found.len() {
            0 => Err(ConfigError::NoConstraint {
                dir: dir.to_path_buf(),
            }),
            1 => Ok(found.remove(0).constraint),
            _ => Err(ConfigError::Ambiguous {
                dir: dir.to_path_buf(),
                found,
            }),
        }
    }
}

/// Error type for reading project configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No required_version constraint found in {dir:?}")]
    NoConstraint { dir: PathBuf },

    #[error(
        "Cannot reliably determine the required version in {dir:?}, found {} constraints: {}",
        .found.len(),
        .found.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
    )]
    Ambiguous {
        dir: PathBuf,
        found: Vec<DeclaredConstraint>,
    },

    #[error("Failed to read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON configuration {path:?}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSource(Vec<&'static str>);

    impl ConstraintSource for FixedSource {
        fn declared_constraints(
            &self,
            _dir: &Path,
        ) -> Result<Vec<DeclaredConstraint>, ConfigError> {
            Ok(self
                .0
                .iter()
                .map(|c| DeclaredConstraint {
                    file: PathBuf::from("versions.tf"),
                    constraint: c.to_string(),
                })
                .collect())
        }
    }

    #[test]
    fn required_constraint_returns_single_declaration() {
        let source = FixedSource(vec![">= 1.2.0"]);
        assert_eq!(
            source.required_constraint(Path::new(".")).unwrap(),
            ">= 1.2.0"
        );
    }

    #[test]
    fn required_constraint_fails_without_declaration() {
        let source = FixedSource(vec![]);
        assert!(matches!(
            source.required_constraint(Path::new(".")),
            Err(ConfigError::NoConstraint { .. })
        ));
    }

    #[test]
    fn required_constraint_lists_every_candidate_when_ambiguous() {
        let source = FixedSource(vec![">= 1.2.0", "~> 1.5"]);

        let err = source.required_constraint(Path::new(".")).unwrap_err();

        assert!(matches!(&err, ConfigError::Ambiguous { found, .. } if found.len() == 2));
        let message = err.to_string();
        assert!(message.contains("found 2 constraints"));
        assert!(message.contains("\">= 1.2.0\" in versions.tf"));
        assert!(message.contains("\"~> 1.5\" in versions.tf"));
    }
}
