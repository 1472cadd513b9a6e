//! `RINEX` revision description
use thiserror::Error;

/// Old revision produced by this package
pub const VERSION_2: Version = Version {
    major: 2,
    minor: 10,
};

/// Modern revision produced by this package
pub const VERSION_3: Version = Version { major: 3, minor: 4 };

/// Version is used to describe RINEX standards revisions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Version {
    /// Version major number
    pub major: u8,
    /// Version minor number
    pub minor: u8,
}

#[derive(Clone, Debug, Error)]
pub enum ParsingError {
    #[error("non supported version \"{0}\"")]
    NotSupported(String),
    #[error("failed to parse version")]
    ParseIntError(#[from] std::num::ParseIntError),
}

impl Default for Version {
    fn default() -> Self {
        VERSION_3
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.major, self.minor)
    }
}

impl std::str::FromStr for Version {
    type Err = ParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.contains('.') {
            true => {
                let mut digits = s.split('.');
                let major = digits.next().unwrap_or("").trim().parse::<u8>()?;
                // "3.04" and "3.4" denote the same revision
                let minor = digits.next().unwrap_or("0").trim().parse::<u8>()?;
                Ok(Self { major, minor })
            },
            false => Ok(Self {
                major: s.trim().parse::<u8>()?,
                minor: 0,
            }),
        }
    }
}

impl Version {
    /// Builds a new `Version` object
    pub fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// Returns true if this revision can be produced by this package:
    /// only 2.10 and 3.04 generation is supported.
    pub fn is_supported(&self) -> bool {
        *self == VERSION_2 || *self == VERSION_3
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn version() {
        let version = Version::default();
        assert_eq!(version, VERSION_3);
        assert!(version.is_supported());

        let version = Version::from_str("2.10").unwrap();
        assert_eq!(version.major, 2);
        assert_eq!(version.minor, 10);
        assert!(version.is_supported());
        assert_eq!(version.to_string(), "2.10");

        let version = Version::from_str("3.04").unwrap();
        assert_eq!(version.major, 3);
        assert_eq!(version.minor, 4);
        assert!(version.is_supported());
        assert_eq!(version.to_string(), "3.04");

        let version = Version::from_str("3").unwrap();
        assert_eq!(version.minor, 0);
        assert!(!version.is_supported());

        assert!(Version::from_str("a.b").is_err());
    }

    #[test]
    fn version_comparison() {
        let v_a = Version::from_str("2.10").unwrap();
        let v_b = Version::from_str("3.04").unwrap();
        assert!(v_b > v_a);
        assert!(v_b != v_a);
    }
}
