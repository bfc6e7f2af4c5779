//! Package version numbers.

use semver::{BuildMetadata, Prerelease};
use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};
use thiserror::Error;

/// Represents an error parsing a [`NuGetVersion`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    /// The version string was empty.
    #[error("version string is empty")]
    Empty,

    /// A numeric part of the version was not a number.
    #[error("`{version}` is not a valid version: `{part}` is not a number")]
    InvalidNumber {
        /// The version being parsed.
        version: String,
        /// The offending part.
        part: String,
    },

    /// The version has more than four numeric parts.
    #[error("`{0}` is not a valid version: more than four numeric parts")]
    TooManyParts(String),

    /// The prerelease label is malformed.
    #[error("`{version}` has an invalid prerelease label: {message}")]
    InvalidPrerelease {
        /// The version being parsed.
        version: String,
        /// The underlying parser message.
        message: String,
    },

    /// The build metadata is malformed.
    #[error("`{version}` has invalid build metadata: {message}")]
    InvalidMetadata {
        /// The version being parsed.
        version: String,
        /// The underlying parser message.
        message: String,
    },
}

/// A package version of the form `major.minor[.patch[.revision]][-label][+metadata]`.
///
/// Missing numeric parts are treated as zero. Prerelease labels compare
/// case-insensitively and build metadata never participates in comparisons.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct NuGetVersion {
    major: u64,
    minor: u64,
    patch: u64,
    revision: u64,
    pre: Prerelease,
    build: BuildMetadata,
}

impl NuGetVersion {
    /// Creates a stable version from its numeric parts.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            revision: 0,
            pre: Prerelease::EMPTY,
            build: BuildMetadata::EMPTY,
        }
    }

    /// Returns the version with the given prerelease label.
    pub fn with_prerelease(mut self, label: &str) -> Result<Self, VersionError> {
        self.pre = Prerelease::new(label).map_err(|e| VersionError::InvalidPrerelease {
            version: self.to_string(),
            message: e.to_string(),
        })?;
        Ok(self)
    }

    /// The major version number.
    pub fn major(&self) -> u64 {
        self.major
    }

    /// The minor version number.
    pub fn minor(&self) -> u64 {
        self.minor
    }

    /// The patch version number.
    pub fn patch(&self) -> u64 {
        self.patch
    }

    /// The revision (fourth) version number.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The prerelease label, empty for stable versions.
    pub fn release_label(&self) -> &str {
        self.pre.as_str()
    }

    /// The build metadata, empty if none was given.
    pub fn metadata(&self) -> &str {
        self.build.as_str()
    }

    /// Determines if this is a prerelease version.
    pub fn is_prerelease(&self) -> bool {
        !self.pre.is_empty()
    }

    /// Determines if the numeric parts of two versions are equal.
    pub fn same_numbers(&self, other: &Self) -> bool {
        self.numbers() == other.numbers()
    }

    fn numbers(&self) -> (u64, u64, u64, u64) {
        (self.major, self.minor, self.patch, self.revision)
    }

    /// Parses a version string.
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        let version = s.trim();
        if version.is_empty() {
            return Err(VersionError::Empty);
        }

        let (rest, build) = match version.split_once('+') {
            Some((rest, build)) => (rest, Some(build)),
            None => (version, None),
        };
        let (numbers, pre) = match rest.split_once('-') {
            Some((numbers, pre)) => (numbers, Some(pre)),
            None => (rest, None),
        };

        let mut parts = [0u64; 4];
        let mut count = 0;
        for part in numbers.split('.') {
            if count == parts.len() {
                return Err(VersionError::TooManyParts(version.to_string()));
            }
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(VersionError::InvalidNumber {
                    version: version.to_string(),
                    part: part.to_string(),
                });
            }
            parts[count] = part.parse().map_err(|_| VersionError::InvalidNumber {
                version: version.to_string(),
                part: part.to_string(),
            })?;
            count += 1;
        }

        let pre = match pre {
            Some("") => {
                return Err(VersionError::InvalidPrerelease {
                    version: version.to_string(),
                    message: "empty label".to_string(),
                })
            }
            Some(pre) => {
                Prerelease::new(pre).map_err(|e| VersionError::InvalidPrerelease {
                    version: version.to_string(),
                    message: e.to_string(),
                })?
            }
            None => Prerelease::EMPTY,
        };
        let build = match build {
            Some("") => {
                return Err(VersionError::InvalidMetadata {
                    version: version.to_string(),
                    message: "empty metadata".to_string(),
                })
            }
            Some(build) => {
                BuildMetadata::new(build).map_err(|e| VersionError::InvalidMetadata {
                    version: version.to_string(),
                    message: e.to_string(),
                })?
            }
            None => BuildMetadata::EMPTY,
        };

        Ok(Self {
            major: parts[0],
            minor: parts[1],
            patch: parts[2],
            revision: parts[3],
            pre,
            build,
        })
    }
}

/// Compares dot-separated prerelease labels; numeric identifiers sort
/// numerically and before alphanumeric ones, others compare ignoring case.
fn compare_labels(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ordering = match (l.parse::<u64>(), r.parse::<u64>()) {
                    (Ok(l), Ok(r)) => l.cmp(&r),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => l
                        .bytes()
                        .map(|b| b.to_ascii_lowercase())
                        .cmp(r.bytes().map(|b| b.to_ascii_lowercase())),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

impl Ord for NuGetVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.numbers()
            .cmp(&other.numbers())
            .then_with(|| match (self.is_prerelease(), other.is_prerelease()) {
                (false, false) => Ordering::Equal,
                (false, true) => Ordering::Greater,
                (true, false) => Ordering::Less,
                (true, true) => compare_labels(self.pre.as_str(), other.pre.as_str()),
            })
    }
}

impl PartialOrd for NuGetVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for NuGetVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NuGetVersion {}

impl Hash for NuGetVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.numbers().hash(state);
        self.pre.as_str().to_ascii_lowercase().hash(state);
    }
}

impl fmt::Display for NuGetVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if self.revision > 0 {
            write!(f, ".{}", self.revision)?;
        }
        if self.is_prerelease() {
            write!(f, "-{}", self.pre)?;
        }
        Ok(())
    }
}

impl FromStr for NuGetVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for NuGetVersion {
    type Error = VersionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<NuGetVersion> for String {
    fn from(version: NuGetVersion) -> Self {
        version.to_string()
    }
}
