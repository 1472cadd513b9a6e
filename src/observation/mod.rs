//! Observation epoch model
pub mod flag;
pub mod lli;
pub mod snr;

mod formatting;
mod parsing;

pub use flag::EpochFlag;
pub use formatting::format_obs_epoch;
pub use lli::LliFlags;
pub use parsing::{read_obs_epoch, ReadStatus};
pub use snr::Ssi;

/// One observable value for one satellite in the current epoch
#[derive(Clone, Debug, PartialEq)]
pub struct SatObs {
    /// Index of the [crate::header::SystemDef] this satellite belongs to
    pub system_index: usize,
    /// Satellite number within its constellation
    pub prn: u8,
    /// Index of the observable code within the system definition
    pub obs_index: usize,
    /// Measurement, in the units the observable code implies
    pub value: f64,
    /// Loss of lock indication, phase observables only
    pub lli: Option<LliFlags>,
    /// Signal strength class
    pub ssi: Option<Ssi>,
}

/// Current epoch observation buffer.
///
/// All entries share one `time_tag`: a save against a different tag is
/// rejected without mutation, the caller is expected to print or clear
/// the buffer and start the next epoch first.
#[derive(Clone, Debug, Default)]
pub struct ObsEpoch {
    pub week: u32,
    /// Time of week, seconds
    pub tow: f64,
    /// Receiver clock offset, seconds
    pub clock_offset: f64,
    pub flag: EpochFlag,
    /// Raw receiver time tag all buffered observations must share
    pub time_tag: f64,
    pub observations: Vec<SatObs>,
}

impl ObsEpoch {
    pub fn new(week: u32, tow: f64, clock_offset: f64, flag: EpochFlag, time_tag: f64) -> Self {
        Self {
            week,
            tow,
            clock_offset,
            flag,
            time_tag,
            observations: Vec::new(),
        }
    }

    /// Buffers one observation. Returns false (buffer untouched) when
    /// the time tag does not match the current epoch.
    pub fn save(&mut self, obs: SatObs, time_tag: f64) -> bool {
        if time_tag != self.time_tag {
            return false;
        }
        self.observations.push(obs);
        true
    }

    /// Number of distinct satellites currently buffered
    pub fn num_satellites(&self) -> usize {
        let mut seen: Vec<(usize, u8)> = self
            .observations
            .iter()
            .map(|o| (o.system_index, o.prn))
            .collect();
        seen.sort_unstable();
        seen.dedup();
        seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn clear(&mut self) {
        self.observations.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn obs(prn: u8) -> SatObs {
        SatObs {
            system_index: 0,
            prn,
            obs_index: 0,
            value: 2.0E7,
            lli: None,
            ssi: None,
        }
    }

    #[test]
    fn epoch_isolation() {
        let mut epoch = ObsEpoch::new(2190, 345_600.0, 0.0, EpochFlag::Ok, 345_600.0);
        assert!(epoch.save(obs(12), 345_600.0));
        // stale tag rejected, buffer untouched
        assert!(!epoch.save(obs(13), 345_630.0));
        assert_eq!(epoch.observations.len(), 1);
    }

    #[test]
    fn distinct_satellites() {
        let mut epoch = ObsEpoch::new(2190, 0.0, 0.0, EpochFlag::Ok, 0.0);
        for prn in [12, 12, 13] {
            assert!(epoch.save(obs(prn), 0.0));
        }
        assert_eq!(epoch.num_satellites(), 2);
    }
}
