use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use semver::Version;

use crate::version::error::VersionError;

/// Leading `major.minor[.patch]`; anything after it is ignored
static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\.(\d+)(?:\.(\d+))?").expect("Invalid version regex")
});

/// Parse the leading `major.minor[.patch]` of a version string.
///
/// A missing patch defaults to 0. Pre-release and build suffixes are dropped,
/// so ordering is strictly on (major, minor, patch).
///
/// Examples:
/// - "1.2" -> Version(1, 2, 0)
/// - "1.2.3" -> Version(1, 2, 3)
/// - "1.2.3-beta" -> Version(1, 2, 3)
pub fn parse_version(version: &str) -> Result<Version, VersionError> {
    let malformed = || VersionError::Malformed(version.to_string());
    let caps = VERSION_RE.captures(version.trim()).ok_or_else(malformed)?;

    let number = |idx: usize| -> Result<u64, VersionError> {
        match caps.get(idx) {
            Some(m) => m.as_str().parse().map_err(|_| malformed()),
            None => Ok(0),
        }
    };

    Ok(Version::new(number(1)?, number(2)?, number(3)?))
}

/// Compare two version strings numerically, component by component
pub fn compare_versions(a: &str, b: &str) -> Result<Ordering, VersionError> {
    Ok(parse_version(a)?.cmp(&parse_version(b)?))
}

/// Format the constraint pinned to a selected version.
///
/// Pre-1.0 releases pin the minor (`~> 0.<minor>`), everything else pins
/// the major (`~> <major>.0`).
pub fn format_constraint(version: &str, major: u64) -> Result<String, VersionError> {
    if major == 0 {
        let parsed = parse_version(version)?;
        Ok(format!("~> 0.{}", parsed.minor))
    } else {
        Ok(format!("~> {}.0", major))
    }
}

/// Highest version of a list, keeping the original spelling
///
/// Any unparseable entry fails the whole selection.
pub fn find_latest<'a, I>(versions: I) -> Result<Option<(&'a str, Version)>, VersionError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut latest: Option<(&str, Version)> = None;
    for raw in versions {
        let parsed = parse_version(raw)?;
        let is_newer = match &latest {
            Some((current, _)) => compare_versions(raw, current)? == Ordering::Greater,
            None => true,
        };
        if is_newer {
            latest = Some((raw, parsed));
        }
    }
    Ok(latest)
}
