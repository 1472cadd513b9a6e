//! Navigation (broadcast ephemeris) epoch model
mod formatting;
mod parsing;

pub use formatting::format_nav_epochs;
pub use parsing::read_nav_epoch;

use crate::prelude::{Constellation, Epoch};

/// Rows of the broadcast orbit matrix: the clock row, the ephemeris
/// parameter rows per the constellation ICD layout, and trailing rows
/// carrying ionospheric / time system / leap second side data where
/// the constellation transmits them.
pub const BROADCAST_ORBIT_ROWS: usize = 12;

/// One decoded, ICD scaled navigation data set for one satellite
#[derive(Clone, Debug)]
pub struct SatNavData {
    /// Raw receiver time tag identifying the emission epoch
    pub time_tag: f64,
    pub system: Constellation,
    pub prn: u8,
    /// Epoch of the clock data set (toc)
    pub epoch: Epoch,
    /// Row 0 holds the clock terms, following rows the ephemeris
    /// parameters in RINEX broadcast orbit line order
    pub broadcast_orbit: [[f64; 4]; BROADCAST_ORBIT_ROWS],
}

impl SatNavData {
    /// Number of broadcast orbit lines this constellation prints
    /// after the clock line
    pub fn orbit_lines(&self) -> usize {
        match self.system {
            Constellation::Glonass => 3,
            _ => 7,
        }
    }
}

/// Navigation record buffer with per (system, satellite, time tag)
/// uniqueness: duplicate saves are rejected, not overwritten.
#[derive(Clone, Debug, Default)]
pub struct NavRecordStore {
    records: Vec<SatNavData>,
}

impl NavRecordStore {
    /// Returns false when an entry with the same system, satellite and
    /// time tag already exists; the store is left untouched.
    pub fn save(&mut self, data: SatNavData) -> bool {
        let duplicate = self.records.iter().any(|r| {
            r.system == data.system && r.prn == data.prn && r.time_tag == data.time_tag
        });
        if duplicate {
            return false;
        }
        self.records.push(data);
        true
    }

    pub fn records(&self) -> &[SatNavData] {
        &self.records
    }

    pub fn retain<F: FnMut(&SatNavData) -> bool>(&mut self, keep: F) {
        self.records.retain(keep);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hifitime::Epoch;

    fn nav(prn: u8, time_tag: f64) -> SatNavData {
        SatNavData {
            time_tag,
            system: Constellation::GPS,
            prn,
            epoch: Epoch::from_gregorian_utc_at_midnight(2021, 1, 1),
            broadcast_orbit: [[0.0; 4]; BROADCAST_ORBIT_ROWS],
        }
    }

    #[test]
    fn duplicate_rejection() {
        let mut store = NavRecordStore::default();
        assert!(store.save(nav(12, 345_600.0)));
        assert!(!store.save(nav(12, 345_600.0)));
        assert!(store.save(nav(12, 352_800.0)));
        assert!(store.save(nav(13, 345_600.0)));
        assert_eq!(store.len(), 3);
    }
}
