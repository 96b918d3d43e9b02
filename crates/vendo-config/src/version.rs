//! Engine version floor check.

use crate::error::{Error, Result};

/// Fail when `current` precedes the configured `required` floor.
pub fn check_minimum_required(current: &str, required: &str) -> Result<()> {
    let cur = parse(current)?;
    let req = parse(required)?;

    if cur < req {
        return Err(Error::EngineTooOld {
            required: required.to_string(),
            current: current.to_string(),
        });
    }
    Ok(())
}

fn parse(version: &str) -> Result<semver::Version> {
    // Tolerate a leading 'v', the common tag spelling.
    let trimmed = version.strip_prefix('v').unwrap_or(version);
    semver::Version::parse(trimmed).map_err(|source| Error::Version {
        version: version.to_string(),
        source,
    })
}
