//! Common version types

use std::collections::BTreeSet;

use crate::version::semver::SemanticVersion;

/// The set of published versions observed at run time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionCatalog {
    versions: BTreeSet<SemanticVersion>,
}

impl VersionCatalog {
    pub fn new(versions: impl IntoIterator<Item = SemanticVersion>) -> Self {
        Self {
            versions: versions.into_iter().collect(),
        }
    }

    /// Adds a version, returning false if it was already present
    pub fn insert(&mut self, version: SemanticVersion) -> bool {
        self.versions.insert(version)
    }

    pub fn contains(&self, version: &SemanticVersion) -> bool {
        self.versions.contains(version)
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Iterates in ascending version order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &SemanticVersion> {
        self.versions.iter()
    }
}

impl FromIterator<SemanticVersion> for VersionCatalog {
    fn from_iter<T: IntoIterator<Item = SemanticVersion>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl<'a> IntoIterator for &'a VersionCatalog {
    type Item = &'a SemanticVersion;
    type IntoIter = std::collections::btree_set::Iter<'a, SemanticVersion>;

    fn into_iter(self) -> Self::IntoIter {
        self.versions.iter()
    }
}
