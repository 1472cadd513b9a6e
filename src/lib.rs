#![cfg_attr(docrs, feature(doc_cfg))]
//! GNSS raw data (GRD) decoding and RINEX 2.10 / 3.04 production.
//!
//! This package converts receiver captured raw observation (ORD) and
//! navigation (NRD) message streams into RINEX observation and
//! navigation files, and parses such files back into the same model.
//!
//! The three building blocks are:
//! - [MessageStream]: sequential reader over the finite raw message
//!   sequence,
//! - [GrdDecoder]: the stateful raw message decoding engine,
//! - [Rinex]: the version aware header record store plus the epoch
//!   observation / navigation buffers and their text codecs.

#[macro_use]
extern crate lazy_static;

pub mod constants;
pub mod decoder;
pub mod filename;
pub mod header;
pub mod navigation;
pub mod observation;
pub mod stream;
pub mod types;
pub mod version;

mod epoch;
mod fmt;

use std::io::{BufRead, BufWriter, Write};

use log::warn;
use thiserror::Error;

use crate::{
    constants::v2_equivalent,
    header::{
        Correction, CorrectionType, FieldError, HeaderField, HeaderLabel, HeaderRecord,
        HeaderRecordStore, Obligation, SystemDef,
    },
    navigation::{NavRecordStore, SatNavData},
    observation::{EpochFlag, LliFlags, ObsEpoch, ReadStatus, SatObs, Ssi},
    types::Type,
    version::Version,
};

use gnss_rs::prelude::Constellation;

/// Package to include all basic structures
pub mod prelude {
    pub use crate::{
        decoder::GrdDecoder,
        header::{Correction, CorrectionType, HeaderField, HeaderLabel, SystemDef},
        observation::{EpochFlag, LliFlags, ObsEpoch, ReadStatus, SatObs, Ssi},
        navigation::SatNavData,
        stream::{MessageStream, MessageType, RawMessage},
        types::Type,
        version::Version,
        Error, FormattingError, Rinex,
    };

    // pub re-export
    pub use gnss_rs::prelude::{Constellation, SV};
    pub use hifitime::{Duration, Epoch, TimeScale};
}

use prelude::SV;

/// Errors raised while producing RINEX text
#[derive(Error, Debug)]
pub enum FormattingError {
    /// The output revision must be resolved (2.10 or 3.04) before
    /// anything can be printed
    #[error("RINEX revision still undetermined")]
    VersionUndetermined,
    #[error("revision {0} cannot be produced")]
    UnsupportedVersion(Version),
    #[error("unknown system identifier \"{0}\"")]
    UnknownSystem(String),
    #[error("no observable definition for system \"{0}\"")]
    MissingObservableDefinition(String),
    #[error("output error")]
    Io(#[from] std::io::Error),
}

/// Top level error, aggregating all package concerns
#[derive(Error, Debug)]
pub enum Error {
    #[error("formatting error")]
    Formatting(#[from] FormattingError),
    #[error("header parsing error")]
    HeaderParsing(#[from] header::ParsingError),
    #[error("header field error")]
    Field(#[from] FieldError),
    #[error("raw stream error")]
    Stream(#[from] stream::Error),
}

/// Version aware RINEX data model: label indexed header record store,
/// per-system observable definitions and the current epoch
/// observation / navigation buffers.
#[derive(Debug, Default)]
pub struct Rinex {
    /// Output revision, undetermined until resolved by the caller or a
    /// parsed VERSION record
    pub version: Option<Version>,
    /// Observation or navigation file kind
    pub file_type: Type,
    /// Constellation summary, `Mixed` when several are present
    pub constellation: Option<Constellation>,
    store: HeaderRecordStore,
    systems: Vec<SystemDef>,
    obs_epoch: Option<ObsEpoch>,
    nav_records: NavRecordStore,
    /// Labels received through their V2.10 alias, so printing under
    /// 2.10 can restore the original record name
    v2_aliases: Vec<HeaderLabel>,
    /// Shared observable pattern declared by a parsed 2.10 header.
    /// Expanded per system once satellites actually show up.
    pub(crate) v2_pending_pattern: Vec<String>,
}

impl Rinex {
    pub fn new(file_type: Type) -> Self {
        Self {
            file_type,
            ..Default::default()
        }
    }

    /// Resolves the output revision. Only 2.10 and 3.04 are accepted.
    pub fn set_version(&mut self, version: Version) -> Result<(), FormattingError> {
        if !version.is_supported() {
            return Err(FormattingError::UnsupportedVersion(version));
        }
        self.version = Some(version);
        self.refresh_printable();
        Ok(())
    }

    /// Resolved revision, or the undetermined-version fault
    pub(crate) fn version_or_err(&self) -> Result<Version, FormattingError> {
        self.version.ok_or(FormattingError::VersionUndetermined)
    }

    /// Stores one typed header field; the label is marked as carrying
    /// data. V2.10-only correction labels are transparently rewritten
    /// into their V3.04 generalized form, remembering the V2 origin.
    pub fn set_field(&mut self, field: HeaderField) -> Result<(), FieldError> {
        field.coherent()?;
        let field = match field {
            HeaderField::Correction(label, mut corr) => {
                if let Some(ctype) = Self::v2_correction_alias(label) {
                    if !self.v2_aliases.contains(&label) {
                        self.v2_aliases.push(label);
                    }
                    corr.ctype = ctype;
                    HeaderField::Correction(ctype.v3_label(), corr)
                } else {
                    HeaderField::Correction(label, corr)
                }
            },
            other => other,
        };
        self.store.store(field)
    }

    /// Correction family implied by a V2.10-only correction label
    fn v2_correction_alias(label: HeaderLabel) -> Option<CorrectionType> {
        match label {
            HeaderLabel::IonAlpha => Some(CorrectionType::GpsAlpha),
            HeaderLabel::IonBeta => Some(CorrectionType::GpsBeta),
            HeaderLabel::DeltaUtc => Some(CorrectionType::GpsUtc),
            HeaderLabel::CorrToSystemTime => Some(CorrectionType::GlonassUtc),
            HeaderLabel::DUtcGeo => Some(CorrectionType::SbasUtc),
            _ => None,
        }
    }

    pub(crate) fn came_from_v2_alias(&self, label: HeaderLabel) -> bool {
        self.v2_aliases.contains(&label)
    }

    /// Inserts a COMMENT before the first occurrence of the anchor
    /// label, or before END OF HEADER when absent
    pub fn add_comment(&mut self, text: &str, anchor: HeaderLabel) {
        self.store.insert_comment_before(
            anchor,
            HeaderField::Text(HeaderLabel::Comment, text.to_string()),
        );
    }

    /// Restartable iteration over header records carrying data
    pub fn records_with_data(&self) -> impl Iterator<Item = &HeaderRecord> {
        self.store.records_with_data()
    }

    pub fn record(&self, label: HeaderLabel) -> Option<&HeaderRecord> {
        self.store.record(label)
    }

    /// First payload stored under the label, when any
    pub fn field(&self, label: HeaderLabel) -> Option<&HeaderField> {
        self.store.record(label)?.payloads.first()
    }

    /// Clears every header record flag and payload.
    /// Part of the special event protocol: callers clear, re-set the
    /// records the event carries, then print the event epoch.
    pub fn clear_header_data(&mut self) {
        self.store.clear();
    }

    pub(crate) fn store(&self) -> &HeaderRecordStore {
        &self.store
    }

    /*
     * System / observable registry
     */

    /// Registers a constellation, returning its stable index
    pub fn register_system(&mut self, constellation: Constellation) -> usize {
        if let Some(index) = self.system_index(constellation) {
            return index;
        }
        self.systems.push(SystemDef::new(constellation));
        self.constellation = match self.constellation {
            None => Some(constellation),
            Some(c) if c == constellation => Some(c),
            Some(_) => Some(Constellation::Mixed),
        };
        self.refresh_printable();
        self.systems.len() - 1
    }

    pub fn system_index(&self, constellation: Constellation) -> Option<usize> {
        self.systems
            .iter()
            .position(|s| s.constellation == constellation)
    }

    pub fn systems(&self) -> &[SystemDef] {
        &self.systems
    }

    /// Registers an observable code for a system (registering the
    /// system on the fly), returns (system index, observable index)
    pub fn register_observable(
        &mut self,
        constellation: Constellation,
        code: &str,
    ) -> (usize, usize) {
        let system_index = self.register_system(constellation);
        let obs_index = self.systems[system_index].register_observable(code);
        self.refresh_printable();
        (system_index, obs_index)
    }

    /// Recomputes the printable flag of every observable for the
    /// current output revision: under 2.10 only codes with a V2
    /// equivalent can render.
    fn refresh_printable(&mut self) {
        let major = self.version.map(|v| v.major).unwrap_or(3);
        for system in self.systems.iter_mut() {
            for obs in system.obs_types.iter_mut() {
                obs.printable = major >= 3 || v2_equivalent(&obs.code).is_some();
            }
        }
    }

    /*
     * Observation buffer
     */

    /// Starts a new observation epoch, dropping any stale buffer
    pub fn set_epoch_time(
        &mut self,
        week: u32,
        tow: f64,
        clock_offset: f64,
        flag: EpochFlag,
        time_tag: f64,
    ) {
        self.obs_epoch = Some(ObsEpoch::new(week, tow, clock_offset, flag, time_tag));
    }

    /// Buffers one observable. Returns false when the system or
    /// observable is unknown, no epoch is open, or the time tag does
    /// not match the open epoch.
    pub fn save_obs_data(
        &mut self,
        constellation: Constellation,
        prn: u8,
        code: &str,
        value: f64,
        lli: Option<LliFlags>,
        ssi: Option<Ssi>,
        time_tag: f64,
    ) -> bool {
        let Some(system_index) = self.system_index(constellation) else {
            warn!("observation for unregistered system {:x}", constellation);
            return false;
        };
        let Some(obs_index) = self.systems[system_index].observable_index(code) else {
            warn!("unregistered observable {} for {:x}", code, constellation);
            return false;
        };
        let Some(epoch) = self.obs_epoch.as_mut() else {
            return false;
        };
        epoch.save(
            SatObs {
                system_index,
                prn,
                obs_index,
                value,
                lli,
                ssi,
            },
            time_tag,
        )
    }

    pub fn obs_epoch(&self) -> Option<&ObsEpoch> {
        self.obs_epoch.as_ref()
    }

    pub fn clear_obs_data(&mut self) {
        if let Some(epoch) = self.obs_epoch.as_mut() {
            epoch.clear();
        }
    }

    /*
     * Navigation buffer
     */

    /// Stores one navigation data set; duplicates per
    /// (system, satellite, time tag) are rejected
    pub fn save_nav_data(&mut self, data: SatNavData) -> bool {
        self.register_system(data.system);
        self.nav_records.save(data)
    }

    pub fn nav_records(&self) -> &[SatNavData] {
        self.nav_records.records()
    }

    /*
     * Filtering
     */

    /// Applies a satellite and observable selection.
    ///
    /// Satellite tokens are `"G"` (whole system) or `"G12"`; an empty
    /// list resets every system to fully selected, a non-empty list
    /// replaces the selection entirely. Observable tokens are
    /// `"GC1C"`, with `"M"` as system prefix meaning every system.
    /// Unknown tokens are dropped with a warning; the call returns
    /// false when any token was incoherent, valid ones still apply.
    pub fn set_filter(&mut self, satellites: &[&str], observables: &[&str]) -> bool {
        let mut coherent = true;

        if satellites.is_empty() {
            for system in self.systems.iter_mut() {
                system.selected = true;
                system.selected_sats.clear();
            }
        } else {
            for system in self.systems.iter_mut() {
                system.selected = false;
                system.selected_sats.clear();
            }
            for token in satellites {
                coherent &= self.apply_satellite_token(token);
            }
        }

        if observables.is_empty() {
            for system in self.systems.iter_mut() {
                for obs in system.obs_types.iter_mut() {
                    obs.selected = true;
                }
            }
        } else {
            for system in self.systems.iter_mut() {
                for obs in system.obs_types.iter_mut() {
                    obs.selected = false;
                }
            }
            for token in observables {
                coherent &= self.apply_observable_token(token);
            }
        }

        coherent
    }

    fn apply_satellite_token(&mut self, token: &str) -> bool {
        let token = token.trim();
        let Some(system_char) = token.chars().next() else {
            warn!("empty satellite selection token");
            return false;
        };
        let Ok(constellation) = system_char.to_string().parse::<Constellation>() else {
            warn!("satellite selection \"{}\": unknown system", token);
            return false;
        };
        let Some(index) = self.system_index(constellation) else {
            warn!("satellite selection \"{}\": system not present", token);
            return false;
        };
        if token.len() == 1 {
            self.systems[index].selected = true;
            return true;
        }
        match token[1..].trim().parse::<u8>() {
            Ok(prn) => {
                self.systems[index].selected = true;
                if !self.systems[index].selected_sats.contains(&prn) {
                    self.systems[index].selected_sats.push(prn);
                }
                true
            },
            Err(_) => {
                warn!("satellite selection \"{}\": bad satellite number", token);
                false
            },
        }
    }

    fn apply_observable_token(&mut self, token: &str) -> bool {
        let token = token.trim();
        if token.len() != 4 {
            warn!("observable selection \"{}\": expecting SCCC", token);
            return false;
        }
        let (prefix, code) = token.split_at(1);
        let all_systems = prefix == "M";
        let constellation = if all_systems {
            None
        } else {
            match prefix.parse::<Constellation>() {
                Ok(c) => Some(c),
                Err(_) => {
                    warn!("observable selection \"{}\": unknown system", token);
                    return false;
                },
            }
        };

        let mut matched = false;
        for system in self.systems.iter_mut() {
            if let Some(c) = constellation {
                if system.constellation != c {
                    continue;
                }
            }
            for obs in system.obs_types.iter_mut() {
                if obs.code == code {
                    obs.selected = true;
                    matched = true;
                }
            }
        }
        if !matched {
            warn!("observable selection \"{}\": no such observable", token);
        }
        matched
    }

    /// Drops buffered observations not matching the current selection;
    /// `remove_unprintable` additionally drops codes the output
    /// revision cannot render. Returns whether anything remains.
    pub fn filter_obs_data(&mut self, remove_unprintable: bool) -> bool {
        let systems = &self.systems;
        let Some(epoch) = self.obs_epoch.as_mut() else {
            return false;
        };
        epoch.observations.retain(|obs| {
            let Some(system) = systems.get(obs.system_index) else {
                return false;
            };
            let Some(obs_type) = system.obs_types.get(obs.obs_index) else {
                return false;
            };
            system.selected
                && system.satellite_selected(obs.prn)
                && obs_type.selected
                && (!remove_unprintable || obs_type.printable)
        });
        !epoch.observations.is_empty()
    }

    /// Drops navigation records not matching the current selection.
    /// Returns whether anything remains.
    pub fn filter_nav_data(&mut self) -> bool {
        let systems = &self.systems;
        self.nav_records.retain(|record| {
            match systems.iter().find(|s| s.constellation == record.system) {
                Some(system) => system.selected && system.satellite_selected(record.prn),
                None => false,
            }
        });
        !self.nav_records.is_empty()
    }

    /*
     * Codec entry points
     */

    /// Prints the complete header. The output revision must be
    /// resolved; obligatory records without data produce a warning and
    /// are skipped.
    pub fn format_header<W: Write>(&self, w: &mut BufWriter<W>) -> Result<(), FormattingError> {
        header::format_header(w, self)
    }

    /// Prints and consumes the buffered observation epoch
    pub fn format_obs_epoch<W: Write>(
        &mut self,
        w: &mut BufWriter<W>,
    ) -> Result<(), FormattingError> {
        observation::format_obs_epoch(w, self)?;
        self.clear_obs_data();
        Ok(())
    }

    /// Applies the navigation filter, then prints and consumes every
    /// buffered navigation record
    pub fn format_nav_epochs<W: Write>(
        &mut self,
        w: &mut BufWriter<W>,
    ) -> Result<(), FormattingError> {
        self.filter_nav_data();
        navigation::format_nav_epochs(w, self)?;
        self.nav_records.clear();
        Ok(())
    }

    /// Parses an existing RINEX header into this model
    pub fn read_header<R: BufRead>(&mut self, reader: &mut R) -> Result<(), header::ParsingError> {
        header::read_rinex_header(reader, self)
    }

    /// Parses one observation epoch from RINEX text
    pub fn read_obs_epoch<R: BufRead>(&mut self, reader: &mut R) -> ReadStatus {
        observation::read_obs_epoch(reader, self)
    }

    /// Parses one navigation epoch from RINEX text
    pub fn read_nav_epoch<R: BufRead>(&mut self, reader: &mut R) -> ReadStatus {
        navigation::read_nav_epoch(reader, self)
    }

    /*
     * V2.10 observable reconciliation
     */

    /// Under 2.10 every system shares one observable pattern: the
    /// union of per-system selected V2-capable codes, in first-seen
    /// order. Each system intersects this pattern with its own
    /// availability at render time (missing codes blank out).
    pub(crate) fn v2_obs_pattern(&self) -> Vec<&'static str> {
        let mut pattern: Vec<&'static str> = Vec::new();
        for system in self.systems.iter() {
            for obs in system.obs_types.iter() {
                if !obs.selected {
                    continue;
                }
                if let Some(v2) = v2_equivalent(&obs.code) {
                    if !pattern.contains(&v2) {
                        pattern.push(v2);
                    }
                }
            }
        }
        pattern
    }

    /// Observable index of the V2 pattern slot for a system, when the
    /// system carries an equivalent code
    pub(crate) fn v2_slot_index(&self, system: &SystemDef, v2_code: &str) -> Option<usize> {
        system
            .obs_types
            .iter()
            .position(|o| o.selected && o.v2_code() == Some(v2_code))
    }

    /// Warns for every record the standard marks obligatory for this
    /// file kind and revision which still carries no data
    pub(crate) fn warn_missing_obligatory(&self, major: u8) {
        for label in header::LABEL_PRINT_ORDER.iter() {
            // these records are synthesized at print time
            if matches!(
                label,
                HeaderLabel::Version
                    | HeaderLabel::EndOfHeader
                    | HeaderLabel::SysObsTypes
                    | HeaderLabel::ObsTypes
            ) {
                continue;
            }
            if !label.applies_to(major) {
                continue;
            }
            if label.obligation(self.file_type) == Obligation::Obligatory
                && !self.store.has_data(*label)
            {
                warn!(
                    "obligatory record \"{}\" has no data, skipped",
                    label.tag()
                );
            }
        }
    }
}

/// Satellite identity helper: RINEX body rendering expects `G01`
pub(crate) fn format_sv(constellation: Constellation, prn: u8) -> String {
    SV::new(constellation, prn).to_string()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn filter_reset() {
        let mut rinex = Rinex::new(Type::ObservationData);
        rinex.register_observable(Constellation::GPS, "C1C");
        rinex.register_observable(Constellation::Glonass, "C1C");

        assert!(rinex.set_filter(&["G12", "G14"], &["GC1C"]));
        assert!(rinex.systems()[0].selected);
        assert_eq!(rinex.systems()[0].selected_sats, vec![12, 14]);
        assert!(!rinex.systems()[1].selected);

        // empty lists reset every system to fully selected
        assert!(rinex.set_filter(&[], &[]));
        for system in rinex.systems() {
            assert!(system.selected);
            assert!(system.selected_sats.is_empty());
            assert!(system.obs_types.iter().all(|o| o.selected));
        }
    }

    #[test]
    fn filter_incoherent_tokens() {
        let mut rinex = Rinex::new(Type::ObservationData);
        rinex.register_observable(Constellation::GPS, "C1C");

        // "X" is no system: incoherent, but "G12" still applies
        assert!(!rinex.set_filter(&["X09", "G12"], &[]));
        assert_eq!(rinex.systems()[0].selected_sats, vec![12]);

        assert!(!rinex.set_filter(&[], &["GC9X"]));
    }

    #[test]
    fn mixed_constellation_tracking() {
        let mut rinex = Rinex::new(Type::ObservationData);
        rinex.register_system(Constellation::GPS);
        assert_eq!(rinex.constellation, Some(Constellation::GPS));
        rinex.register_system(Constellation::Galileo);
        assert_eq!(rinex.constellation, Some(Constellation::Mixed));
    }

    #[test]
    fn save_obs_requires_epoch_coherence() {
        let mut rinex = Rinex::new(Type::ObservationData);
        rinex.register_observable(Constellation::GPS, "C1C");
        rinex.set_epoch_time(2190, 345_600.0, 0.0, EpochFlag::Ok, 345_600.0);

        assert!(rinex.save_obs_data(
            Constellation::GPS,
            12,
            "C1C",
            2.1E7,
            None,
            None,
            345_600.0
        ));
        // stale time tag rejected without mutation
        assert!(!rinex.save_obs_data(
            Constellation::GPS,
            13,
            "C1C",
            2.1E7,
            None,
            None,
            345_630.0
        ));
        assert_eq!(rinex.obs_epoch().unwrap().observations.len(), 1);
    }

    #[test]
    fn v2_alias_rewrite() {
        let mut rinex = Rinex::new(Type::NavigationData);
        rinex
            .set_field(HeaderField::Correction(
                HeaderLabel::IonAlpha,
                Correction {
                    ctype: CorrectionType::GpsAlpha,
                    coefficients: [1.0E-8, 2.0E-8, -1.0E-7, 0.0],
                    ref_tow: 0.0,
                    ref_week: 0,
                },
            ))
            .unwrap();
        // rewritten under the generalized V3 label
        assert!(rinex.record(HeaderLabel::IonoCorr).unwrap().has_data);
        assert!(rinex.came_from_v2_alias(HeaderLabel::IonAlpha));
    }

    #[test]
    fn v2_shared_pattern() {
        let mut rinex = Rinex::new(Type::ObservationData);
        // GPS carries C1C/L1C/D1C/S1C + C5Q; Galileo adds C7Q
        rinex.register_observable(Constellation::GPS, "C5Q");
        rinex.register_observable(Constellation::Galileo, "C7Q");
        let pattern = rinex.v2_obs_pattern();
        assert_eq!(
            pattern,
            vec!["C1", "L1", "D1", "S1", "C5", "C7"],
            "union of V2 equivalents in first-seen order"
        );
    }
}
