use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::version::error::VersionParseError;

/// A released (or pre-released) version of the managed tool.
///
/// Ordering is numeric on `major.minor.patch`. A version carrying a pre-release
/// tag sorts below the same numeric version without one, and two tags compare
/// as plain strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SemanticVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre: Option<String>,
}

impl SemanticVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: None,
        }
    }

    pub fn with_pre(mut self, tag: impl Into<String>) -> Self {
        self.pre = Some(tag.into());
        self
    }

    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some()
    }

    /// Parse the canonical `MAJOR.MINOR.PATCH[-TAG]` form.
    pub fn parse(input: &str) -> Result<Self, VersionParseError> {
        let (core, pre) = split_pre(input)?;
        let parsed = semver::Version::parse(core)
            .map_err(|_| VersionParseError::new(input, "expected MAJOR.MINOR.PATCH"))?;

        Ok(Self {
            major: parsed.major,
            minor: parsed.minor,
            patch: parsed.patch,
            pre,
        })
    }

    /// Parse a version that may omit trailing components, padding them with zeros.
    ///
    /// Examples:
    /// - "1" -> 1.0.0
    /// - "1.2" -> 1.2.0
    /// - "1.2.3-rc1" -> 1.2.3-rc1
    pub fn parse_partial(input: &str) -> Result<Self, VersionParseError> {
        let (core, pre) = split_pre(input)?;
        let parts: Vec<&str> = core.split('.').collect();
        let normalized = match parts.len() {
            1 => format!("{}.0.0", parts[0]),
            2 => format!("{}.{}.0", parts[0], parts[1]),
            _ => core.to_string(),
        };

        let mut version = Self::parse(&normalized)
            .map_err(|_| VersionParseError::new(input, "expected a dotted numeric version"))?;
        version.pre = pre;
        Ok(version)
    }
}

/// Split off the pre-release tag, rejecting build metadata and empty tags.
fn split_pre(input: &str) -> Result<(&str, Option<String>), VersionParseError> {
    if input.contains('+') {
        return Err(VersionParseError::new(input, "build metadata is not supported"));
    }

    match input.split_once('-') {
        None => Ok((input, None)),
        Some((core, tag)) => {
            let valid = !tag.is_empty()
                && tag
                    .split('.')
                    .all(|ident| !ident.is_empty() && ident.chars().all(|c| c.is_ascii_alphanumeric()));
            if !valid {
                return Err(VersionParseError::new(input, "invalid pre-release tag"));
            }
            Ok((core, Some(tag.to_string())))
        }
    }
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
            .then_with(|| match (&self.pre, &other.pre) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

impl FromStr for SemanticVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
