//! `RINEX` file kinds produced by this package
use crate::header::ParsingError;
use crate::prelude::Constellation;

/// The two `RINEX` file kinds this package produces and reads
#[derive(Default, Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Type {
    /// Observation Data (OBS):
    /// pseudo range, carrier phase, doppler and signal strength measurements
    #[default]
    ObservationData,
    /// Navigation Data (NAV):
    /// broadcast ephemeris frames
    NavigationData,
}

impl std::fmt::Display for Type {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::ObservationData => write!(fmt, "OBS DATA"),
            Self::NavigationData => write!(fmt, "NAVIGATION DATA"),
        }
    }
}

impl Type {
    /// Converts `Self` to the VERSION header record descriptor
    pub fn to_string(&self, constell: Option<Constellation>) -> String {
        match *self {
            Self::ObservationData => String::from("OBSERVATION DATA"),
            Self::NavigationData => match constell {
                Some(Constellation::Glonass) => String::from("GLONASS NAV DATA"),
                _ => String::from("NAV DATA"),
            },
        }
    }

    /// Single character file-kind code used in standard file names
    pub fn code(&self) -> char {
        match self {
            Self::ObservationData => 'O',
            Self::NavigationData => 'N',
        }
    }
}

impl std::str::FromStr for Type {
    type Err = ParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq("NAVIGATION DATA") || s.contains("NAV DATA") {
            Ok(Self::NavigationData)
        } else if s.eq("OBSERVATION DATA") {
            Ok(Self::ObservationData)
        } else {
            Err(ParsingError::TypeParsing(String::from(s)))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn file_kind() {
        assert_eq!(Type::from_str("OBSERVATION DATA").unwrap(), Type::ObservationData);
        assert_eq!(Type::from_str("NAV DATA").unwrap(), Type::NavigationData);
        assert_eq!(Type::from_str("GLONASS NAV DATA").unwrap(), Type::NavigationData);
        assert!(Type::from_str("METEOROLOGICAL DATA").is_err());
        assert_eq!(Type::ObservationData.code(), 'O');
        assert_eq!(Type::NavigationData.code(), 'N');
    }
}
