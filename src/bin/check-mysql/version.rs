//! MySQL server version strings

use std::fmt;
use std::str::FromStr;

use regex::Regex;

/// The leading `MAJOR.MINOR.PATCH` triple of a server version string.
///
/// Servers report versions with build suffixes (`5.5.44-0+deb8u1-log`,
/// `8.0.36-debug`); only the numeric triple matters here. Ordering is
/// lexicographic over (major, minor, patch).
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub(crate) struct MysqlVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

#[derive(Debug, PartialEq)]
pub(crate) struct VersionParseError {
    raw: String,
}

impl fmt::Display for VersionParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "could not parse MySQL version from {:?}", self.raw)
    }
}

impl FromStr for MysqlVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<MysqlVersion, VersionParseError> {
        let triple = Regex::new(r"^(\d+)\.(\d+)\.(\d+)").expect("static pattern");
        let caps = triple.captures(s).ok_or_else(|| VersionParseError {
            raw: s.to_owned(),
        })?;
        let part = |i: usize| -> Result<u32, VersionParseError> {
            caps[i].parse().map_err(|_| VersionParseError {
                raw: s.to_owned(),
            })
        };
        Ok(MysqlVersion {
            major: part(1)?,
            minor: part(2)?,
            patch: part(3)?,
        })
    }
}

impl fmt::Display for MysqlVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[cfg(test)]
mod test {
    use super::MysqlVersion;

    fn version(major: u32, minor: u32, patch: u32) -> MysqlVersion {
        MysqlVersion {
            major,
            minor,
            patch,
        }
    }

    #[test]
    fn suffixes_are_ignored() {
        assert_eq!(
            "5.5.44-0+deb8u1-log".parse(),
            Ok(version(5, 5, 44))
        );
        assert_eq!("8.0.36-debug".parse(), Ok(version(8, 0, 36)));
        assert_eq!("10.11.6-MariaDB".parse(), Ok(version(10, 11, 6)));
    }

    #[test]
    fn bare_triples_parse() {
        assert_eq!("8.4.0".parse(), Ok(version(8, 4, 0)));
    }

    #[test]
    fn incomplete_triples_are_errors() {
        assert!("8.0".parse::<MysqlVersion>().is_err());
        assert!("".parse::<MysqlVersion>().is_err());
        assert!("mysql-8.0.22".parse::<MysqlVersion>().is_err());
    }

    #[test]
    fn ordering_is_numeric_not_textual() {
        assert!(version(8, 0, 22) > version(8, 0, 9));
        assert!(version(8, 0, 22) > version(5, 7, 44));
        assert!(version(8, 0, 22) >= version(8, 0, 22));
        assert!(version(8, 0, 21) < version(8, 0, 22));
    }
}
