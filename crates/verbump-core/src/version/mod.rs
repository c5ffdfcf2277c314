//! Version parsing and bump arithmetic.
//!
//! Declared versions are short dotted forms (`2`, `1.4`, `1.4.2`). They are
//! widened to a full `MAJOR.MINOR.PATCH` triple before bumping, so the bumped
//! version is always written back with three components.

use semver::Version;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from version operations.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum VersionError {
    /// The string had no components, or more than three.
    #[error("invalid version `{0}`: expected MAJOR[.MINOR[.PATCH]]")]
    Malformed(String),

    /// A component was not a non-negative integer that fits in 64 bits.
    #[error("invalid version component `{component}` in `{version}`")]
    InvalidComponent {
        /// The full version string.
        version: String,
        /// The offending component.
        component: String,
    },

    /// The component being bumped is already at its maximum.
    #[error("cannot bump {level} of `{version}`: component at maximum")]
    Overflow {
        /// The full version string.
        version: String,
        /// The requested bump.
        level: BumpLevel,
    },
}

/// Result alias for version operations.
pub type VersionResult<T> = Result<T, VersionError>;

/// Semver bump level.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum BumpLevel {
    /// Patch release (x.y.Z).
    #[default]
    Patch,
    /// Minor release (x.Y.0).
    Minor,
    /// Major release (X.0.0).
    Major,
}

impl std::fmt::Display for BumpLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Patch => write!(f, "patch"),
            Self::Minor => write!(f, "minor"),
            Self::Major => write!(f, "major"),
        }
    }
}

/// Compute the next version by applying a bump level.
///
/// # Errors
///
/// Returns [`VersionError::Overflow`] when the bumped component is already
/// `u64::MAX`.
pub fn next_version(current: &Version, level: BumpLevel) -> VersionResult<Version> {
    let overflow = || VersionError::Overflow {
        version: current.to_string(),
        level,
    };
    let next = match level {
        BumpLevel::Patch => {
            let patch = current.patch.checked_add(1).ok_or_else(overflow)?;
            Version::new(current.major, current.minor, patch)
        }
        BumpLevel::Minor => {
            let minor = current.minor.checked_add(1).ok_or_else(overflow)?;
            Version::new(current.major, minor, 0)
        }
        BumpLevel::Major => {
            let major = current.major.checked_add(1).ok_or_else(overflow)?;
            Version::new(major, 0, 0)
        }
    };
    Ok(next)
}

/// Parse a declared version of one to three dotted components.
///
/// Missing trailing components default to zero, so `"2"` parses as `2.0.0`
/// and `"1.4"` as `1.4.0`.
pub fn parse_declared(s: &str) -> VersionResult<Version> {
    let components: Vec<&str> = s.split('.').collect();
    if s.is_empty() || components.len() > 3 {
        return Err(VersionError::Malformed(s.to_string()));
    }

    let mut parts = [0_u64; 3];
    for (slot, component) in parts.iter_mut().zip(&components) {
        if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid_component(s, component));
        }
        *slot = component
            .parse()
            .map_err(|_| invalid_component(s, component))?;
    }

    let [major, minor, patch] = parts;
    Ok(Version::new(major, minor, patch))
}

/// Parse a declared version and apply a bump level in one step.
pub fn bump_declared(s: &str, level: BumpLevel) -> VersionResult<Version> {
    next_version(&parse_declared(s)?, level)
}

fn invalid_component(version: &str, component: &str) -> VersionError {
    VersionError::InvalidComponent {
        version: version.to_string(),
        component: component.to_string(),
    }
}
