//! Best-match version selection
//!
//! Picks the semantically maximum catalog version that satisfies every clause
//! of a constraint. Pre-releases only take part when an exact or lower-bound
//! clause names one (or the caller opts in), so a beta never shadows a stable release.

use crate::version::constraint::VersionConstraint;
use crate::version::error::SelectError;
use crate::version::semver::SemanticVersion;
use crate::version::types::VersionCatalog;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectOptions {
    /// Let pre-releases compete even when no clause names one
    pub allow_prerelease: bool,
}

/// Select the highest version in `catalog` satisfying `constraint`
pub fn select(
    constraint: &VersionConstraint,
    catalog: &VersionCatalog,
    options: SelectOptions,
) -> Result<SemanticVersion, SelectError> {
    let prerelease_eligible = options.allow_prerelease || constraint.pins_prerelease();

    catalog
        .iter()
        .rev()
        .filter(|v| prerelease_eligible || !v.is_prerelease())
        .find(|v| constraint.satisfies(v))
        .cloned()
        .ok_or_else(|| SelectError::NoMatch {
            constraint: constraint.to_string(),
            candidates: catalog.len(),
        })
}
