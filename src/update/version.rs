use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::error::UpdateError;

/// Dotted numeric version such as `1.0` or `1.2.3`.
///
/// Missing trailing components compare as zero, so `1.0` and `1.0.0` are
/// equal. The original text is kept for display.
#[derive(Debug, Clone)]
pub struct Version {
    parts: Vec<u64>,
    raw: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    UpToDate,
    UpdateAvailable,
}

impl Version {
    /// Parse a version string (with or without 'v' prefix)
    pub fn parse(version_str: &str) -> Result<Self, UpdateError> {
        let invalid = || UpdateError::InvalidVersion(version_str.to_string());
        let trimmed = version_str.trim();
        let cleaned = trimmed.strip_prefix('v').unwrap_or(trimmed);

        // Digits only: `u64::from_str` alone would also take a leading `+`
        let parts = cleaned
            .split('.')
            .map(|part| {
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid());
                }
                part.parse::<u64>().map_err(|_| invalid())
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            parts,
            raw: cleaned.to_string(),
        })
    }

    pub fn zero() -> Self {
        Self {
            parts: vec![0, 0, 0],
            raw: "0.0.0".to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    fn component(&self, index: usize) -> u64 {
        self.parts.get(index).copied().unwrap_or(0)
    }
}

/// Decide whether `remote` is worth installing over `local`.
/// Equal versions are up to date.
pub fn compare(local: &Version, remote: &Version) -> Comparison {
    if local >= remote {
        Comparison::UpToDate
    } else {
        Comparison::UpdateAvailable
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        (0..len)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl FromStr for Version {
    type Err = UpdateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_parse_version() {
        assert!(Version::parse("1.0.0").is_ok());
        assert!(Version::parse("v1.0.0").is_ok());
        assert!(Version::parse("1.0").is_ok());
        assert!(Version::parse("2").is_ok());
        assert!(Version::parse("invalid").is_err());
        assert!(Version::parse("1.x.0").is_err());
        assert!(Version::parse("").is_err());
        assert!(Version::parse("1..2").is_err());
        assert!(Version::parse("+1").is_err());
        assert!(Version::parse("+1.+2").is_err());
        assert!(Version::parse("vv1").is_err());
        assert!(Version::parse("v").is_err());
        assert!(Version::parse("1.-2").is_err());
        assert!(Version::parse("1.0.").is_err());
    }

    #[test]
    fn test_zero_padding() {
        assert_eq!(v("1.0"), v("1.0.0"));
        assert_eq!(v("1"), v("1.0.0.0"));
        assert_eq!(v("0.0.0"), Version::zero());
    }

    #[test]
    fn test_numeric_ordering() {
        // String comparison would get these wrong
        assert!(v("1.2") < v("1.10"));
        assert!(v("1.9.9") < v("1.10.0"));
        assert!(v("10.0") > v("9.99"));
        assert!(v("1.0.1") > v("1.0"));
    }

    #[test]
    fn test_compare() {
        assert_eq!(compare(&v("1.0"), &v("1.0")), Comparison::UpToDate);
        assert_eq!(compare(&v("1.0"), &v("1.0.0")), Comparison::UpToDate);
        assert_eq!(compare(&v("1.1"), &v("1.0")), Comparison::UpToDate);
        assert_eq!(compare(&v("1.0"), &v("1.1")), Comparison::UpdateAvailable);
        assert_eq!(compare(&Version::zero(), &v("0.0.1")), Comparison::UpdateAvailable);
    }

    #[test]
    fn test_ordering_is_total() {
        let mut versions = vec![v("1.10"), v("1.2"), v("0.9"), v("1.2.0"), v("2")];
        versions.sort();
        let sorted: Vec<&str> = versions.iter().map(|v| v.as_str()).collect();
        assert_eq!(sorted, vec!["0.9", "1.2", "1.2.0", "1.10", "2"]);
    }

    #[test]
    fn test_display_keeps_original_text() {
        assert_eq!(v("v1.2").to_string(), "1.2");
        assert_eq!(Version::zero().to_string(), "0.0.0");
    }
}
