//! Version constraint parsing
//!
//! Supports Terraform-style `required_version` expressions:
//! - `1.2.3`, `= 1.2.3` - exact match
//! - `!= 1.2.3` - anything but this version
//! - `>= 1.2`, `> 1.2`, `<= 1.2`, `< 1.2` - comparison operators
//! - `~> 1.2` - pessimistic: >=1.2.0 <2.0.0
//! - `~> 1.2.3` - pessimistic: >=1.2.3 <1.3.0
//! - `>= 1.2, < 2.0` - comma-separated clauses, all of which must hold

use std::fmt;
use std::str::FromStr;

use crate::version::error::ParseError;
use crate::version::semver::SemanticVersion;

/// Comparison operator of a single clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
    /// `~>`: allows only the right-most specified component to increase
    Pessimistic,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "!=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Pessimistic => "~>",
        }
    }
}

/// One `(operator, version)` pair of a constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub operator: Operator,
    pub version: SemanticVersion,
    /// Number of components written by the user (1 for `~> 1`, 2 for `~> 1.2`).
    /// Only meaningful for `~>`.
    pub precision: usize,
}

impl Clause {
    /// Parse a single clause (no commas)
    fn parse(clause: &str, input: &str) -> Result<Self, ParseError> {
        let (operator, rest) = split_operator(clause).ok_or_else(|| ParseError::UnknownOperator {
            input: input.to_string(),
            operator: leading_symbols(clause).to_string(),
        })?;

        let token = rest.trim();
        let malformed = || ParseError::MalformedVersion {
            input: input.to_string(),
            clause: clause.to_string(),
        };

        let version = SemanticVersion::parse_partial(token).map_err(|_| malformed())?;
        let precision = token
            .split_once('-')
            .map_or(token, |(core, _)| core)
            .split('.')
            .count();

        Ok(Self {
            operator,
            version,
            precision,
        })
    }

    /// Check if a version satisfies this clause
    pub fn satisfies(&self, version: &SemanticVersion) -> bool {
        let v = &self.version;
        match self.operator {
            Operator::Eq => version == v,
            Operator::NotEq => version != v,
            Operator::Gt => version > v,
            Operator::Gte => version >= v,
            Operator::Lt => version < v,
            Operator::Lte => version <= v,
            Operator::Pessimistic => {
                if version < v {
                    return false;
                }
                match self.precision {
                    // ~> 1 : any 1.x or later
                    1 => true,
                    // ~> 1.2 : >=1.2.0 <2.0.0
                    2 => version.major == v.major,
                    // ~> 1.2.3 : >=1.2.3 <1.3.0
                    _ => version.major == v.major && version.minor == v.minor,
                }
            }
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.operator.as_str(), self.version)
    }
}

/// Return the operator and the remainder of the clause.
///
/// A clause beginning with a digit has an implicit `=`. Anything else that is
/// not a recognized operator yields `None`.
fn split_operator(clause: &str) -> Option<(Operator, &str)> {
    const OPERATORS: [(&str, Operator); 7] = [
        (">=", Operator::Gte),
        ("<=", Operator::Lte),
        ("!=", Operator::NotEq),
        ("~>", Operator::Pessimistic),
        (">", Operator::Gt),
        ("<", Operator::Lt),
        ("=", Operator::Eq),
    ];

    for (symbol, operator) in OPERATORS {
        if let Some(rest) = clause.strip_prefix(symbol) {
            // "=>" or ">>" are not operators
            if rest.starts_with(['=', '>', '<', '!', '~', '^']) {
                return None;
            }
            return Some((operator, rest));
        }
    }

    match clause.chars().next() {
        Some(c) if c.is_ascii_digit() => Some((Operator::Eq, clause)),
        // Let the version parser report things like "abc" as malformed
        Some(c) if c.is_ascii_alphabetic() => Some((Operator::Eq, clause)),
        _ => None,
    }
}

fn leading_symbols(clause: &str) -> &str {
    let end = clause
        .find(|c: char| c.is_ascii_alphanumeric() || c.is_whitespace())
        .unwrap_or(clause.len());
    &clause[..end]
}

/// A parsed version constraint: every clause must hold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConstraint {
    clauses: Vec<Clause>,
}

impl VersionConstraint {
    /// Parse a comma-separated constraint expression
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        if input.trim().is_empty() {
            return Err(ParseError::Empty);
        }

        let clauses = input
            .split(',')
            .map(str::trim)
            .enumerate()
            .map(|(i, clause)| {
                if clause.is_empty() {
                    Err(ParseError::EmptyClause {
                        input: input.to_string(),
                        position: i + 1,
                    })
                } else {
                    Clause::parse(clause, input)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { clauses })
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Check if a version satisfies all clauses
    pub fn satisfies(&self, version: &SemanticVersion) -> bool {
        self.clauses.iter().all(|clause| clause.satisfies(version))
    }

    /// Whether a lower-bounding or exact clause names a pre-release
    ///
    /// Exclusions (`!=`) and upper bounds (`<`, `<=`) only narrow the range,
    /// so a tag there does not make pre-releases eligible.
    pub fn pins_prerelease(&self) -> bool {
        self.clauses.iter().any(|clause| {
            clause.version.is_prerelease()
                && matches!(
                    clause.operator,
                    Operator::Eq | Operator::Gt | Operator::Gte | Operator::Pessimistic
                )
        })
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", clause)?;
        }
        Ok(())
    }
}

impl FromStr for VersionConstraint {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
