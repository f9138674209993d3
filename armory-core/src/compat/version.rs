//! Host version probing.
//!
//! The probe reduces whatever version string the host reports to a discrete,
//! totally ordered [`VersionTag`]. It is a pure function of host-provided
//! metadata: deterministic for a fixed host and callable any number of times.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::CompatError;

/// Discrete identifier for a host release, ordered so that capability
/// resolution can fall back to the nearest supported tag at or below it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct VersionTag {
    major: u16,
    minor: u16,
    patch: u16,
}

impl VersionTag {
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// The backward-compatible family this tag belongs to.
    pub fn family(&self) -> (u16, u16) {
        (self.major, self.minor)
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for VersionTag {
    type Err = CompatError;

    /// Accepts `"1.16.2"`, `"1.17"`, and release-suffixed forms such as
    /// `"1.16.2-R0.1"` or `"1.17-SNAPSHOT"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unsupported = || CompatError::UnsupportedHost {
            reported: s.to_string(),
        };

        let numeric = s.split('-').next().unwrap_or(s).trim();
        let mut parts = numeric.split('.');

        let mut segment = |required: bool| -> Result<Option<u16>, CompatError> {
            match parts.next() {
                Some(raw) => raw.parse::<u16>().map(Some).map_err(|_| unsupported()),
                None if required => Err(unsupported()),
                None => Ok(None),
            }
        };

        let major = segment(true)?.ok_or_else(unsupported)?;
        let minor = segment(true)?.ok_or_else(unsupported)?;
        let patch = segment(false)?.unwrap_or(0);

        if parts.next().is_some() {
            return Err(unsupported());
        }

        Ok(Self::new(major, minor, patch))
    }
}

/// Metadata the host makes available about itself. The embedding layer fills
/// this from whatever the running server actually reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    /// Server brand string, e.g. `"Paper"`. Informational only.
    pub brand: String,
    /// Reported version. Either a bare tag or the long form
    /// `"git-Paper-388 (MC: 1.16.5)"`.
    pub version: String,
}

impl HostInfo {
    pub fn new(brand: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            brand: brand.into(),
            version: version.into(),
        }
    }
}

/// Determines the host's version tag from its reported metadata.
///
/// Fails with [`CompatError::UnsupportedHost`] when the reported string
/// cannot be reduced to a tag.
pub fn probe(host: &HostInfo) -> Result<VersionTag, CompatError> {
    let reported = host.version.as_str();

    // Long-form reports embed the actual game version in an "(MC: x.y.z)"
    // suffix; the leading build identifier is not parseable as a tag.
    let raw = match reported.split_once("(MC: ") {
        Some((_, rest)) => rest
            .split_once(')')
            .map(|(inner, _)| inner)
            .ok_or_else(|| CompatError::UnsupportedHost {
                reported: reported.to_string(),
            })?,
        None => reported,
    };

    raw.trim().parse().map_err(|_| CompatError::UnsupportedHost {
        reported: reported.to_string(),
    })
}
