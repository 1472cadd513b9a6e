//! Observation epoch flag
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown epoch flag value")]
    UnknownValue,
}

/// `EpochFlag` validates an epoch,
/// or describes the special event it announces
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EpochFlag {
    /// Epoch is sane
    #[default]
    Ok,
    /// Power failure since previous epoch
    PowerFailure,
    /// Antenna is being moved at current epoch
    AntennaBeingMoved,
    /// Site has changed, receiver has moved since last epoch
    NewSiteOccupation,
    /// New header information to come after this epoch
    HeaderInformationFollows,
    /// External event - significant event in this epoch
    ExternalEvent,
    /// Cycle slip at this epoch
    CycleSlip,
}

impl EpochFlag {
    /// Returns true if this epoch carries observation data
    /// (flags 0, 1 and 6), false for the special events (2..=5)
    pub fn carries_observations(self) -> bool {
        matches!(
            self,
            EpochFlag::Ok | EpochFlag::PowerFailure | EpochFlag::CycleSlip
        )
    }

    pub fn is_ok(self) -> bool {
        self == EpochFlag::Ok
    }
}

impl From<EpochFlag> for u8 {
    fn from(flag: EpochFlag) -> u8 {
        match flag {
            EpochFlag::Ok => 0,
            EpochFlag::PowerFailure => 1,
            EpochFlag::AntennaBeingMoved => 2,
            EpochFlag::NewSiteOccupation => 3,
            EpochFlag::HeaderInformationFollows => 4,
            EpochFlag::ExternalEvent => 5,
            EpochFlag::CycleSlip => 6,
        }
    }
}

impl TryFrom<u8> for EpochFlag {
    type Error = Error;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(EpochFlag::Ok),
            1 => Ok(EpochFlag::PowerFailure),
            2 => Ok(EpochFlag::AntennaBeingMoved),
            3 => Ok(EpochFlag::NewSiteOccupation),
            4 => Ok(EpochFlag::HeaderInformationFollows),
            5 => Ok(EpochFlag::ExternalEvent),
            6 => Ok(EpochFlag::CycleSlip),
            _ => Err(Error::UnknownValue),
        }
    }
}

impl FromStr for EpochFlag {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().parse::<u8>().map_err(|_| Error::UnknownValue)?;
        Self::try_from(value)
    }
}

impl std::fmt::Display for EpochFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}
