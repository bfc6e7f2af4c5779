//! Version ranges and floating version patterns.
//!
//! The accepted syntax is the bracket notation used by NuGet feeds:
//!
//! * `1.0` - version 1.0 or higher
//! * `[1.0]` - exactly 1.0
//! * `(1.0,)`, `[1.0,2.0)`, `(,2.0]` - exclusive/inclusive intervals
//! * `*`, `1.*`, `1.2.*`, `1.2.3.*` - the highest stable version matching the pattern
//! * `1.0.0-*`, `1.0.0-beta*`, `1.*-*`, `*-*` - as above, prereleases included

use crate::version::{NuGetVersion, VersionError};
use serde::Deserialize;
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Represents an error parsing a [`VersionRange`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    /// The range string was empty.
    #[error("version range is empty")]
    Empty,

    /// The range string is malformed.
    #[error("`{range}` is not a valid version range: {message}")]
    Invalid {
        /// The range being parsed.
        range: String,
        /// A description of the problem.
        message: &'static str,
    },

    /// A version inside the range is malformed.
    #[error("`{range}` is not a valid version range: {source}")]
    Version {
        /// The range being parsed.
        range: String,
        /// The version error.
        #[source]
        source: VersionError,
    },
}

/// How a floating range selects versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatBehavior {
    /// `1.0.0-beta*`: prereleases of one version with a label prefix.
    Prerelease,
    /// `1.0.0.*`
    Revision,
    /// `1.0.*`
    Patch,
    /// `1.*`
    Minor,
    /// `*`
    Major,
    /// `*-*`: any version, prereleases included.
    AbsoluteLatest,
    /// `1.0.0.*-*`
    PrereleaseRevision,
    /// `1.0.*-*`
    PrereleasePatch,
    /// `1.*-*`
    PrereleaseMinor,
}

/// A floating version pattern such as `1.*` or `2.0.0-rc*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloatRange {
    behavior: FloatBehavior,
    min: NuGetVersion,
    release_prefix: Option<String>,
}

impl FloatRange {
    /// Parses a floating version pattern.
    pub fn parse(text: &str) -> Result<Self, RangeError> {
        let pattern = text.trim();
        let invalid = |message| RangeError::Invalid {
            range: pattern.to_string(),
            message,
        };

        let (numbers, label) = match pattern.split_once('-') {
            Some((numbers, label)) => (numbers, Some(label)),
            None => (pattern, None),
        };

        let release_prefix = match label {
            Some(label) => {
                let prefix = label
                    .strip_suffix('*')
                    .ok_or_else(|| invalid("a floating prerelease label must end with `*`"))?;
                if prefix.contains('*') {
                    return Err(invalid("a prerelease label may contain only one `*`"));
                }
                Some(prefix.to_string())
            }
            None => None,
        };

        let (fixed, star) = match numbers {
            "*" => ("", true),
            _ => match numbers.strip_suffix(".*") {
                Some(fixed) => (fixed, true),
                None => (numbers, false),
            },
        };
        if fixed.contains('*') {
            return Err(invalid("`*` may only appear as the last version part"));
        }

        let fixed_parts = if fixed.is_empty() {
            0
        } else {
            fixed.split('.').count()
        };
        let behavior = match (star, fixed_parts, release_prefix.is_some()) {
            (false, 0, _) => return Err(invalid("expected a version before the label")),
            (false, _, false) => return Err(invalid("expected a `*`")),
            (false, _, true) => FloatBehavior::Prerelease,
            (true, 0, false) => FloatBehavior::Major,
            (true, 1, false) => FloatBehavior::Minor,
            (true, 2, false) => FloatBehavior::Patch,
            (true, 3, false) => FloatBehavior::Revision,
            (true, 0, true) => FloatBehavior::AbsoluteLatest,
            (true, 1, true) => FloatBehavior::PrereleaseMinor,
            (true, 2, true) => FloatBehavior::PrereleasePatch,
            (true, 3, true) => FloatBehavior::PrereleaseRevision,
            (true, _, _) => return Err(invalid("too many version parts before `*`")),
        };

        let version_error = |source| RangeError::Version {
            range: pattern.to_string(),
            source,
        };
        let mut min = if fixed.is_empty() {
            NuGetVersion::new(0, 0, 0)
        } else {
            NuGetVersion::parse(fixed).map_err(version_error)?
        };
        if let (Some(prefix), false) = (&release_prefix, fixed.is_empty()) {
            let label = match prefix.trim_end_matches('.') {
                "" => "0",
                label => label,
            };
            min = min.with_prerelease(label).map_err(version_error)?;
        }

        Ok(Self {
            behavior,
            min,
            release_prefix,
        })
    }

    /// Gets the float behavior.
    pub fn behavior(&self) -> FloatBehavior {
        self.behavior
    }

    /// Gets the lowest version the pattern can match.
    pub fn min(&self) -> &NuGetVersion {
        &self.min
    }

    /// Determines if the pattern matches prerelease versions.
    pub fn includes_prerelease(&self) -> bool {
        self.release_prefix.is_some()
    }

    /// The lower bound implied by the pattern, if any.
    fn lower_bound(&self) -> Option<NuGetVersion> {
        match self.behavior {
            FloatBehavior::Major | FloatBehavior::AbsoluteLatest => None,
            _ => Some(self.min.clone()),
        }
    }

    /// Determines if the given version matches the pattern.
    pub fn satisfies(&self, version: &NuGetVersion) -> bool {
        let min = &self.min;
        let numbers_match = match self.behavior {
            FloatBehavior::Major | FloatBehavior::AbsoluteLatest => true,
            FloatBehavior::Minor | FloatBehavior::PrereleaseMinor => version.major() == min.major(),
            FloatBehavior::Patch | FloatBehavior::PrereleasePatch => {
                (version.major(), version.minor()) == (min.major(), min.minor())
            }
            FloatBehavior::Revision | FloatBehavior::PrereleaseRevision => {
                (version.major(), version.minor(), version.patch())
                    == (min.major(), min.minor(), min.patch())
            }
            FloatBehavior::Prerelease => version.same_numbers(min),
        };

        numbers_match
            && match &self.release_prefix {
                None => !version.is_prerelease(),
                Some(prefix) => {
                    !version.is_prerelease()
                        || version
                            .release_label()
                            .to_ascii_lowercase()
                            .starts_with(&prefix.to_ascii_lowercase())
                }
            }
    }
}

impl fmt::Display for FloatRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let min = &self.min;
        match self.behavior {
            FloatBehavior::Major | FloatBehavior::AbsoluteLatest => write!(f, "*")?,
            FloatBehavior::Minor | FloatBehavior::PrereleaseMinor => write!(f, "{}.*", min.major())?,
            FloatBehavior::Patch | FloatBehavior::PrereleasePatch => {
                write!(f, "{}.{}.*", min.major(), min.minor())?
            }
            FloatBehavior::Revision | FloatBehavior::PrereleaseRevision => {
                write!(f, "{}.{}.{}.*", min.major(), min.minor(), min.patch())?
            }
            FloatBehavior::Prerelease => {
                write!(f, "{}.{}.{}", min.major(), min.minor(), min.patch())?;
                if min.revision() > 0 {
                    write!(f, ".{}", min.revision())?;
                }
            }
        }
        if let Some(prefix) = &self.release_prefix {
            write!(f, "-{prefix}*")?;
        }
        Ok(())
    }
}

/// A constraint over package versions.
///
/// A range has optional lower and upper bounds and, optionally, a floating
/// pattern. Floating ranges resolve to the highest matching version while
/// fixed ranges resolve to the lowest one.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct VersionRange {
    min: Option<NuGetVersion>,
    min_inclusive: bool,
    max: Option<NuGetVersion>,
    max_inclusive: bool,
    float: Option<FloatRange>,
}

impl VersionRange {
    /// The range selecting the latest stable version.
    pub fn all_stable_floating() -> Self {
        Self::floating(FloatRange {
            behavior: FloatBehavior::Major,
            min: NuGetVersion::new(0, 0, 0),
            release_prefix: None,
        })
    }

    /// The range selecting the latest version, prereleases included.
    pub fn all_floating() -> Self {
        Self::floating(FloatRange {
            behavior: FloatBehavior::AbsoluteLatest,
            min: NuGetVersion::new(0, 0, 0),
            release_prefix: Some(String::new()),
        })
    }

    /// A range matching exactly the given version.
    pub fn exact(version: NuGetVersion) -> Self {
        Self {
            min: Some(version.clone()),
            min_inclusive: true,
            max: Some(version),
            max_inclusive: true,
            float: None,
        }
    }

    /// A range matching the given version or anything higher.
    pub fn at_least(version: NuGetVersion) -> Self {
        Self {
            min: Some(version),
            min_inclusive: true,
            max: None,
            max_inclusive: false,
            float: None,
        }
    }

    fn floating(float: FloatRange) -> Self {
        Self {
            min: float.lower_bound(),
            min_inclusive: true,
            max: None,
            max_inclusive: false,
            float: Some(float),
        }
    }

    /// Parses a version range.
    pub fn parse(text: &str) -> Result<Self, RangeError> {
        let range = text.trim();
        if range.is_empty() {
            return Err(RangeError::Empty);
        }

        let invalid = |message| RangeError::Invalid {
            range: range.to_string(),
            message,
        };
        let version = |s: &str| {
            NuGetVersion::parse(s).map_err(|source| RangeError::Version {
                range: range.to_string(),
                source,
            })
        };

        let min_inclusive = if range.starts_with('[') {
            true
        } else if range.starts_with('(') {
            false
        } else if range.contains('*') {
            return Ok(Self::floating(FloatRange::parse(range)?));
        } else {
            return Ok(Self::at_least(version(range)?));
        };

        let max_inclusive = if range.len() < 2 {
            return Err(invalid("expected a closing `]` or `)`"));
        } else if range.ends_with(']') {
            true
        } else if range.ends_with(')') {
            false
        } else {
            return Err(invalid("expected a closing `]` or `)`"));
        };

        let inner = &range[1..range.len() - 1];
        let Some((lower, upper)) = inner.split_once(',') else {
            if !min_inclusive || !max_inclusive {
                return Err(invalid("an exact version must be enclosed in `[` and `]`"));
            }
            if inner.contains('*') {
                return Err(invalid("an exact version cannot float"));
            }
            return Ok(Self::exact(version(inner.trim())?));
        };

        if upper.contains(',') {
            return Err(invalid("expected at most one `,`"));
        }
        let (lower, upper) = (lower.trim(), upper.trim());
        if lower.is_empty() && upper.is_empty() {
            return Err(invalid("expected at least one bound"));
        }
        if upper.contains('*') {
            return Err(invalid("the upper bound cannot float"));
        }

        let (min, float) = if lower.is_empty() {
            (None, None)
        } else if lower.contains('*') {
            let float = FloatRange::parse(lower)?;
            (float.lower_bound(), Some(float))
        } else {
            (Some(version(lower)?), None)
        };
        let max = if upper.is_empty() {
            None
        } else {
            Some(version(upper)?)
        };

        if let (Some(min), Some(max)) = (&min, &max) {
            if min > max || (min == max && !(min_inclusive && max_inclusive)) {
                return Err(invalid("the range does not contain any version"));
            }
        }

        Ok(Self {
            min,
            min_inclusive,
            max,
            max_inclusive,
            float,
        })
    }

    /// Gets the lower bound of the range.
    pub fn min(&self) -> Option<&NuGetVersion> {
        self.min.as_ref()
    }

    /// Gets the upper bound of the range.
    pub fn max(&self) -> Option<&NuGetVersion> {
        self.max.as_ref()
    }

    /// Gets the floating pattern of the range.
    pub fn float(&self) -> Option<&FloatRange> {
        self.float.as_ref()
    }

    /// Determines if the range floats to the highest matching version.
    pub fn is_floating(&self) -> bool {
        self.float.is_some()
    }

    /// Determines if prerelease versions can satisfy the range.
    pub fn allows_prerelease(&self) -> bool {
        match &self.float {
            Some(float) => float.includes_prerelease(),
            None => {
                self.min.as_ref().is_some_and(NuGetVersion::is_prerelease)
                    || self.max.as_ref().is_some_and(NuGetVersion::is_prerelease)
            }
        }
    }

    /// Determines if the given version satisfies the range.
    pub fn satisfies(&self, version: &NuGetVersion) -> bool {
        if let Some(min) = &self.min {
            if version < min || (!self.min_inclusive && version == min) {
                return false;
            }
        }
        if let Some(max) = &self.max {
            if version > max || (!self.max_inclusive && version == max) {
                return false;
            }
        }

        match &self.float {
            Some(float) => float.satisfies(version),
            None => !version.is_prerelease() || self.allows_prerelease(),
        }
    }

    /// Selects the best version among the candidates.
    ///
    /// Floating ranges pick the highest satisfying version; fixed ranges pick
    /// the lowest.
    pub fn find_best_match<'a>(
        &self,
        versions: impl IntoIterator<Item = &'a NuGetVersion>,
    ) -> Option<&'a NuGetVersion> {
        let candidates = versions.into_iter().filter(|v| self.satisfies(v));
        if self.is_floating() {
            candidates.max()
        } else {
            candidates.min()
        }
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (Some(min), Some(max), None) = (&self.min, &self.max, &self.float) {
            if min == max && self.min_inclusive && self.max_inclusive {
                return write!(f, "={min}");
            }
        }

        let mut parts = Vec::with_capacity(2);
        match (&self.float, &self.min) {
            (Some(float), _) => parts.push(float.to_string()),
            (None, Some(min)) => {
                parts.push(format!("{}{min}", if self.min_inclusive { ">=" } else { ">" }))
            }
            (None, None) => {}
        }
        if let Some(max) = &self.max {
            parts.push(format!("{}{max}", if self.max_inclusive { "<=" } else { "<" }));
        }

        if parts.is_empty() {
            return write!(f, "*");
        }
        write!(f, "{}", parts.join(" "))
    }
}

impl FromStr for VersionRange {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VersionRange {
    type Error = RangeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}
