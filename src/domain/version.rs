use crate::error::{ReleaseError, Result};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Version used when no previous release tag exists or it cannot be parsed.
pub const DEFAULT_VERSION: Version = Version {
    major: 1,
    minor: 0,
    patch: 0,
};

fn tag_regex() -> &'static Regex {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    TAG_RE.get_or_init(|| {
        Regex::new(r"^v(\d+)\.(\d+)\.(\d+)$").expect("release tag pattern is a valid regex")
    })
}

/// Semantic version representation
///
/// Field order matters: the derived `Ord` compares major, then minor, then patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    /// Create a new version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Version {
            major,
            minor,
            patch,
        }
    }

    /// Parse a release tag of the exact form `vMAJOR.MINOR.PATCH`.
    pub fn parse_tag(tag: &str) -> Result<Self> {
        let captures = tag_regex()
            .captures(tag)
            .ok_or_else(|| ReleaseError::InvalidTagFormat(tag.to_string()))?;

        let component = |idx: usize| -> Result<u64> {
            captures[idx]
                .parse::<u64>()
                .map_err(|_| ReleaseError::InvalidTagFormat(tag.to_string()))
        };

        Ok(Version {
            major: component(1)?,
            minor: component(2)?,
            patch: component(3)?,
        })
    }

    /// Bump version according to bump kind
    ///
    /// Fails with [`ReleaseError::VersionOverflow`] when the bumped component
    /// is already `u64::MAX`.
    pub fn bump(&self, kind: BumpKind) -> Result<Self> {
        let overflow = || ReleaseError::VersionOverflow {
            version: self.to_string(),
            bump: kind.as_str(),
        };

        let next = match kind {
            BumpKind::Major => Version {
                major: self.major.checked_add(1).ok_or_else(overflow)?,
                minor: 0,
                patch: 0,
            },
            BumpKind::Minor => Version {
                major: self.major,
                minor: self.minor.checked_add(1).ok_or_else(overflow)?,
                patch: 0,
            },
            BumpKind::Patch => Version {
                major: self.major,
                minor: self.minor,
                patch: self.patch.checked_add(1).ok_or_else(overflow)?,
            },
        };
        Ok(next)
    }

    /// Render as a release tag, e.g. `v1.2.3`.
    pub fn tag(&self) -> String {
        format!("v{}", self)
    }

    pub fn to_semver(&self) -> semver::Version {
        semver::Version::new(self.major, self.minor, self.patch)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl From<Version> for semver::Version {
    fn from(version: Version) -> Self {
        version.to_semver()
    }
}

/// Requested version increment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BumpKind {
    #[default]
    Patch,
    Minor,
    Major,
}

impl BumpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BumpKind::Patch => "patch",
            BumpKind::Minor => "minor",
            BumpKind::Major => "major",
        }
    }
}

impl fmt::Display for BumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BumpKind {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "patch" => Ok(BumpKind::Patch),
            "minor" => Ok(BumpKind::Minor),
            "major" => Ok(BumpKind::Major),
            other => Err(ReleaseError::config(format!(
                "Unknown bump kind '{}': expected patch, minor or major",
                other
            ))),
        }
    }
}

/// Compute the next version from the last release tag.
///
/// Fails with [`ReleaseError::InvalidTagFormat`] when `last_tag` is not
/// `vMAJOR.MINOR.PATCH`; see [`resolve_or_default`] for the recovering form.
/// Fails with [`ReleaseError::VersionOverflow`] when no greater version exists.
pub fn resolve(last_tag: &str, bump: BumpKind) -> Result<Version> {
    Version::parse_tag(last_tag)?.bump(bump)
}

/// Outcome of version resolution with the documented fallback applied.
#[derive(Debug)]
pub struct Resolution {
    pub version: Version,
    /// Set when the last tag existed but could not be parsed.
    pub fallback: Option<ReleaseError>,
}

/// Resolve the next version, substituting [`DEFAULT_VERSION`] when there is
/// no previous tag or it is malformed.
///
/// Only a malformed tag is recovered; an overflowing bump is returned as an
/// error since falling back would move the version backwards.
pub fn resolve_or_default(last_tag: Option<&str>, bump: BumpKind) -> Result<Resolution> {
    let tag = match last_tag {
        Some(tag) => tag,
        None => {
            return Ok(Resolution {
                version: DEFAULT_VERSION,
                fallback: None,
            })
        }
    };

    match resolve(tag, bump) {
        Ok(version) => Ok(Resolution {
            version,
            fallback: None,
        }),
        Err(e @ ReleaseError::InvalidTagFormat(_)) => {
            tracing::warn!(tag, error = %e, "falling back to default version");
            Ok(Resolution {
                version: DEFAULT_VERSION,
                fallback: Some(e),
            })
        }
        Err(e) => Err(e),
    }
}
