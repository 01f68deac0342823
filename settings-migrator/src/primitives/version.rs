use std::fmt::Display;

pub use semver::Version;

use crate::migration::{MigrationError, MigrationResult};

/// Parses a semantic version string (`major.minor.patch`, optionally with pre-release/build metadata).
///
/// Surrounding whitespace is ignored. Comparisons between parsed versions follow semver precedence,
/// so `1.10.0 > 1.9.0` even though the strings order the other way.
///
/// # Errors
/// - `MigrationError::InvalidVersion` if `version` is not a valid semantic version.
pub fn parse_version(version: &str) -> MigrationResult<Version> {
    Version::parse(version.trim()).map_err(|e| MigrationError::InvalidVersion {
        version: version.to_string(),
        message: e.to_string(),
    })
}

/// A half-open version range `[from, to)`.
///
/// A migration step covering a range applies to every version inside it, including versions that
/// were never released. `from` is always strictly lower than `to`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionRange {
    from: Version,
    to: Version,
}

impl VersionRange {
    /// Creates a range, rejecting empty and backward ranges.
    ///
    /// # Errors
    /// - `MigrationError::InvalidStep` if `from >= to`.
    pub fn new(from: Version, to: Version) -> MigrationResult<Self> {
        if from >= to {
            return Err(MigrationError::InvalidStep {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        Ok(Self { from, to })
    }

    /// Parses both bounds and creates the range.
    ///
    /// # Errors
    /// - `MigrationError::InvalidVersion` if either bound fails to parse.
    /// - `MigrationError::InvalidStep` if `from >= to`.
    pub fn parse(from: &str, to: &str) -> MigrationResult<Self> {
        Self::new(parse_version(from)?, parse_version(to)?)
    }

    /// Inclusive lower bound.
    #[must_use]
    pub const fn from(&self) -> &Version {
        &self.from
    }

    /// Exclusive upper bound; the version a blob reaches after the step.
    #[must_use]
    pub const fn to(&self) -> &Version {
        &self.to
    }

    /// Whether `version` falls inside `[from, to)`.
    #[must_use]
    pub fn contains(&self, version: &Version) -> bool {
        &self.from <= version && version < &self.to
    }
}

impl Display for VersionRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version() {
        let version = parse_version(" 1.5.2 ").unwrap();
        assert_eq!(version, Version::new(1, 5, 2));
    }

    #[test]
    fn test_parse_version_invalid() {
        let err = parse_version("1.5").unwrap_err();
        match err {
            MigrationError::InvalidVersion { version, .. } => assert_eq!(version, "1.5"),
            e => panic!("Expected InvalidVersion error, got: {e:?}"),
        }
    }

    #[test]
    fn test_semver_precedence_not_lexical() {
        assert!(parse_version("1.10.0").unwrap() > parse_version("1.9.0").unwrap());
        assert!(parse_version("1.5.0-beta.1").unwrap() < parse_version("1.5.0").unwrap());
    }

    #[test]
    fn test_range_is_half_open() {
        let range = VersionRange::parse("1.5.1", "1.5.2").unwrap();

        assert!(range.contains(&parse_version("1.5.1").unwrap()));
        assert!(range.contains(&parse_version("1.5.2-rc.1").unwrap()));
        assert!(!range.contains(&parse_version("1.5.2").unwrap()));
        assert!(!range.contains(&parse_version("1.5.0").unwrap()));
    }

    #[test]
    fn test_range_covers_unlisted_versions() {
        let range = VersionRange::parse("1.0.0", "2.0.0").unwrap();
        assert!(range.contains(&parse_version("1.7.3").unwrap()));
    }

    #[test]
    fn test_range_rejects_backward_and_empty() {
        assert!(matches!(
            VersionRange::parse("1.5.2", "1.5.1"),
            Err(MigrationError::InvalidStep { .. })
        ));
        assert!(matches!(
            VersionRange::parse("1.5.1", "1.5.1"),
            Err(MigrationError::InvalidStep { .. })
        ));
    }

    #[test]
    fn test_range_display() {
        let range = VersionRange::parse("1.4.3", "1.5.0").unwrap();
        assert_eq!(range.to_string(), "1.4.3 -> 1.5.0");
    }
}
