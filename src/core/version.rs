//! Version and version-range handling.
//!
//! Library versions follow NuGet conventions: short forms (`6.0`), four-part
//! assembly versions (`4.0.0.0`) and floating project versions (`1.0.0-*`)
//! are all accepted and normalized to semver.

use std::fmt;
use std::str::FromStr;

use semver::{Comparator, Op, Version, VersionReq};
use thiserror::Error;

/// Error parsing a version or version range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("invalid version `{0}`")]
    InvalidVersion(String),

    #[error("invalid version range `{0}`")]
    InvalidRange(String),
}

/// Parse a version string, allowing for incomplete or four-part versions.
pub fn parse_version_lenient(s: &str) -> Option<Version> {
    let s = s.trim();
    let s = s.strip_suffix("-*").unwrap_or(s);

    // Try exact parse first
    if let Ok(v) = s.parse() {
        return Some(v);
    }

    // Try adding (or dropping) components
    let (core, pre) = match s.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (s, None),
    };
    let parts = core
        .split('.')
        .map(|p| p.parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;

    let mut version = match parts.as_slice() {
        [major] => Version::new(*major, 0, 0),
        [major, minor] => Version::new(*major, *minor, 0),
        // The revision of an assembly version has no semver counterpart.
        [major, minor, patch, _revision] => Version::new(*major, *minor, *patch),
        _ => return None,
    };

    if let Some(pre) = pre {
        version.pre = semver::Prerelease::new(pre).ok()?;
    }

    Some(version)
}

/// A requested version window.
///
/// A bare version (`6.0`) means "this version or higher", matching NuGet.
/// Interval notation (`[1.0,2.0)`, `[1.0]`, `(,2.0]`) and semver
/// requirement syntax (`>=1.0, <2.0`) are both accepted.
///
/// A floating version (`4.0.20-*`) also admits every prerelease of its
/// core version and of anything higher.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionRange {
    req: VersionReq,
    floating: bool,
}

impl VersionRange {
    /// Range accepting `version` or anything higher.
    pub fn at_least(version: &Version) -> Self {
        VersionRange {
            req: VersionReq {
                comparators: vec![comparator(Op::GreaterEq, version)],
            },
            floating: false,
        }
    }

    /// Range accepting exactly `version`.
    pub fn exact(version: &Version) -> Self {
        VersionRange {
            req: VersionReq {
                comparators: vec![comparator(Op::Exact, version)],
            },
            floating: false,
        }
    }

    /// Range accepting any build of `version`'s core version or higher,
    /// prereleases included.
    pub fn floating(version: &Version) -> Self {
        VersionRange {
            floating: true,
            ..VersionRange::at_least(&core_version(version))
        }
    }

    /// Parse a range string.
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(VersionError::InvalidRange(s.to_string()));
        }

        if s.starts_with('[') || s.starts_with('(') {
            return parse_interval(s);
        }

        if let Some(version) = parse_version_lenient(s) {
            if s.ends_with("-*") {
                return Ok(VersionRange::floating(&version));
            }
            return Ok(VersionRange::at_least(&version));
        }

        VersionReq::parse(s)
            .map(|req| VersionRange { req, floating: false })
            .map_err(|_| VersionError::InvalidRange(s.to_string()))
    }

    /// Check whether a version falls inside this range.
    pub fn matches(&self, version: &Version) -> bool {
        if self.floating {
            // semver hides prereleases from `>=`; compare the core instead
            self.req.matches(&core_version(version))
        } else {
            self.req.matches(version)
        }
    }

    pub fn is_floating(&self) -> bool {
        self.floating
    }

    /// The lowest version this range admits, if it has a lower bound.
    pub fn min_version(&self) -> Option<Version> {
        self.req.comparators.iter().find_map(|c| match c.op {
            Op::Exact | Op::Greater | Op::GreaterEq | Op::Tilde | Op::Caret | Op::Wildcard => {
                let mut version = Version::new(c.major, c.minor.unwrap_or(0), c.patch.unwrap_or(0));
                version.pre = c.pre.clone();
                Some(version)
            }
            _ => None,
        })
    }

    /// The underlying semver requirement.
    pub fn as_req(&self) -> &VersionReq {
        &self.req
    }
}

impl FromStr for VersionRange {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VersionRange::parse(s)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.req)?;
        if self.floating {
            write!(f, "-*")?;
        }
        Ok(())
    }
}

fn core_version(version: &Version) -> Version {
    Version::new(version.major, version.minor, version.patch)
}

fn comparator(op: Op, version: &Version) -> Comparator {
    Comparator {
        op,
        major: version.major,
        minor: Some(version.minor),
        patch: Some(version.patch),
        pre: version.pre.clone(),
    }
}

fn parse_interval(s: &str) -> Result<VersionRange, VersionError> {
    let invalid = || VersionError::InvalidRange(s.to_string());

    let min_inclusive = s.starts_with('[');
    let max_inclusive = match s.chars().last() {
        Some(']') => true,
        Some(')') => false,
        _ => return Err(invalid()),
    };
    let inner = &s[1..s.len() - 1];

    let bound = |part: &str| -> Result<Option<Version>, VersionError> {
        let part = part.trim();
        if part.is_empty() {
            Ok(None)
        } else {
            parse_version_lenient(part).map(Some).ok_or_else(invalid)
        }
    };

    let comparators = match inner.split_once(',') {
        None => {
            // `[1.0]` pins a single version
            let version = bound(inner)?.ok_or_else(invalid)?;
            if !(min_inclusive && max_inclusive) {
                return Err(invalid());
            }
            vec![comparator(Op::Exact, &version)]
        }
        Some((lower, upper)) => {
            let mut comparators = Vec::new();
            if let Some(lower) = bound(lower)? {
                let op = if min_inclusive { Op::GreaterEq } else { Op::Greater };
                comparators.push(comparator(op, &lower));
            }
            if let Some(upper) = bound(upper)? {
                let op = if max_inclusive { Op::LessEq } else { Op::Less };
                comparators.push(comparator(op, &upper));
            }
            if comparators.is_empty() {
                return Err(invalid());
            }
            comparators
        }
    };

    Ok(VersionRange {
        req: VersionReq { comparators },
        floating: false,
    })
}
