//! RESTlet protocol version handling.
//!
//! Uses the `semver` crate; short versions such as `1.0` are padded first.

use semver::Version;

use crate::error::RestError;

/// Oldest RESTlet revision this client can talk to
pub const MIN_RESTLET_VERSION: &str = "1.0.2";

/// Parse a version as the RESTlet reports it. `v1.0` and `1.0` are read as
/// `1.0.0`.
pub fn parse_version(raw: &str) -> Result<Version, semver::Error> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix(['v', 'V']).unwrap_or(trimmed);

    let (core, rest) = match trimmed.find(['-', '+']) {
        Some(idx) => trimmed.split_at(idx),
        None => (trimmed, ""),
    };
    let parts = core.split('.').count();
    let padded = match parts {
        1 => format!("{}.0.0{}", core, rest),
        2 => format!("{}.0{}", core, rest),
        _ => trimmed.to_string(),
    };
    Version::parse(&padded)
}

pub fn minimum_version() -> Version {
    Version::new(1, 0, 2)
}

/// Outcome of the pre-flight version check
#[derive(Debug)]
pub enum VersionCheck {
    /// Remote is at or above the minimum
    Compatible(Version),
    /// Remote answered with an older version
    Outdated(Version),
    /// The version could not be fetched or read
    Failed(RestError),
}

impl VersionCheck {
    /// Classify a reported version string
    pub fn from_reported(raw: &str) -> Self {
        match parse_version(raw) {
            Ok(remote) if remote < minimum_version() => VersionCheck::Outdated(remote),
            Ok(remote) => VersionCheck::Compatible(remote),
            Err(e) => VersionCheck::Failed(RestError::MalformedResponse(format!(
                "invalid restletVersion {:?}: {}",
                raw, e
            ))),
        }
    }

    pub fn needs_update(&self) -> bool {
        !matches!(self, VersionCheck::Compatible(_))
    }

    /// The error that went with a failed check, if any
    pub fn error(&self) -> Option<&RestError> {
        match self {
            VersionCheck::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Guard stage: pass for compatible endpoints, the advisory otherwise
    pub fn into_result(self) -> Result<Version, RestError> {
        match self {
            VersionCheck::Compatible(remote) => Ok(remote),
            VersionCheck::Outdated(remote) => Err(RestError::OutdatedEndpoint {
                remote: remote.to_string(),
                minimum: MIN_RESTLET_VERSION.to_string(),
            }),
            VersionCheck::Failed(cause) => Err(RestError::VersionCheckFailed(Box::new(cause))),
        }
    }
}
