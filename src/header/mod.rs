//! RINEX header records: label registry, payload shapes, ordered store
use crate::constants::v2_equivalent;
use crate::prelude::{Constellation, Epoch, SV};
use crate::types::Type;
use thiserror::Error;

mod formatting;
mod parsing;

pub use formatting::format_header;
pub use parsing::read_rinex_header;
pub(crate) use formatting::render_data_records;
pub(crate) use parsing::{parse_d, parse_label, RecordParser};

#[derive(Error, Debug)]
pub enum ParsingError {
    #[error("header line should be at least 61 byte long")]
    HeaderLineTooShort,
    #[error("invalid VERSION header")]
    VersionParsing,
    #[error("file type not recognized \"{0}\"")]
    TypeParsing(String),
    #[error("failed to parse epoch field")]
    DateTimeParsing(#[from] crate::epoch::ParsingError),
    #[error("constellation parsing error")]
    ConstellationParsing(#[from] gnss_rs::constellation::ParsingError),
    #[error("i/o error while reading header")]
    Io(#[from] std::io::Error),
}

/// Label/payload coherence faults: these denote programming errors,
/// not malformed input data.
#[derive(Error, Debug, PartialEq)]
pub enum FieldError {
    #[error("label {0:?} does not accept this payload shape")]
    ShapeMismatch(HeaderLabel),
    #[error("{0:?} is a pseudo label, it cannot carry data")]
    PseudoLabel(HeaderLabel),
}

/// Whether a header record applies to a file kind, and how.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Obligation {
    NotApplicable,
    Obligatory,
    Optional,
}

/// RINEX revisions a header record belongs to
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VersionMask {
    V2Only,
    V3Only,
    Both,
}

/// Closed registry of RINEX header record kinds.
/// Each label knows its column 61..80 tag, the revisions it applies to
/// and its per-file-kind obligation. `NoLabel` and `DontMatch` are
/// pseudo labels representing parse failures, never real records.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HeaderLabel {
    Version,
    RunBy,
    Comment,
    MarkerName,
    MarkerNumber,
    MarkerType,
    Agency,
    Receiver,
    AntennaType,
    ApproxPosition,
    AntennaDelta,
    WaveLength,
    SysObsTypes,
    SignalUnit,
    Interval,
    ObsTypes,
    FirstObs,
    LastObs,
    ClockOffsetApplied,
    Dcbs,
    Pcvs,
    ScaleFactor,
    PhaseShift,
    GlonassSlots,
    GlonassCpBias,
    LeapSeconds,
    NumSatellites,
    PrnObsCount,
    IonAlpha,
    IonBeta,
    DeltaUtc,
    CorrToSystemTime,
    DUtcGeo,
    IonoCorr,
    TimeCorr,
    EndOfHeader,
    /// Line carried no label at all
    NoLabel,
    /// Line label matched nothing in the registry
    DontMatch,
}

/// Canonical record order used when printing headers
pub(crate) const LABEL_PRINT_ORDER: &[HeaderLabel] = &[
    HeaderLabel::Version,
    HeaderLabel::RunBy,
    HeaderLabel::Comment,
    HeaderLabel::MarkerName,
    HeaderLabel::MarkerNumber,
    HeaderLabel::MarkerType,
    HeaderLabel::Agency,
    HeaderLabel::Receiver,
    HeaderLabel::AntennaType,
    HeaderLabel::ApproxPosition,
    HeaderLabel::AntennaDelta,
    HeaderLabel::WaveLength,
    HeaderLabel::SysObsTypes,
    HeaderLabel::ObsTypes,
    HeaderLabel::SignalUnit,
    HeaderLabel::Interval,
    HeaderLabel::FirstObs,
    HeaderLabel::LastObs,
    HeaderLabel::ClockOffsetApplied,
    HeaderLabel::Dcbs,
    HeaderLabel::Pcvs,
    HeaderLabel::ScaleFactor,
    HeaderLabel::PhaseShift,
    HeaderLabel::GlonassSlots,
    HeaderLabel::GlonassCpBias,
    HeaderLabel::IonAlpha,
    HeaderLabel::IonBeta,
    HeaderLabel::DeltaUtc,
    HeaderLabel::CorrToSystemTime,
    HeaderLabel::DUtcGeo,
    HeaderLabel::IonoCorr,
    HeaderLabel::TimeCorr,
    HeaderLabel::LeapSeconds,
    HeaderLabel::NumSatellites,
    HeaderLabel::PrnObsCount,
    HeaderLabel::EndOfHeader,
];

impl HeaderLabel {
    /// Column 61..80 record tag
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Version => "RINEX VERSION / TYPE",
            Self::RunBy => "PGM / RUN BY / DATE",
            Self::Comment => "COMMENT",
            Self::MarkerName => "MARKER NAME",
            Self::MarkerNumber => "MARKER NUMBER",
            Self::MarkerType => "MARKER TYPE",
            Self::Agency => "OBSERVER / AGENCY",
            Self::Receiver => "REC # / TYPE / VERS",
            Self::AntennaType => "ANT # / TYPE",
            Self::ApproxPosition => "APPROX POSITION XYZ",
            Self::AntennaDelta => "ANTENNA: DELTA H/E/N",
            Self::WaveLength => "WAVELENGTH FACT L1/2",
            Self::SysObsTypes => "SYS / # / OBS TYPES",
            Self::SignalUnit => "SIGNAL STRENGTH UNIT",
            Self::Interval => "INTERVAL",
            Self::ObsTypes => "# / TYPES OF OBSERV",
            Self::FirstObs => "TIME OF FIRST OBS",
            Self::LastObs => "TIME OF LAST OBS",
            Self::ClockOffsetApplied => "RCV CLOCK OFFS APPL",
            Self::Dcbs => "SYS / DCBS APPLIED",
            Self::Pcvs => "SYS / PCVS APPLIED",
            Self::ScaleFactor => "SYS / SCALE FACTOR",
            Self::PhaseShift => "SYS / PHASE SHIFT",
            Self::GlonassSlots => "GLONASS SLOT / FRQ #",
            Self::GlonassCpBias => "GLONASS COD/PHS/BIS",
            Self::LeapSeconds => "LEAP SECONDS",
            Self::NumSatellites => "# OF SATELLITES",
            Self::PrnObsCount => "PRN / # OF OBS",
            Self::IonAlpha => "ION ALPHA",
            Self::IonBeta => "ION BETA",
            Self::DeltaUtc => "DELTA-UTC: A0,A1,T,W",
            Self::CorrToSystemTime => "CORR TO SYSTEM TIME",
            Self::DUtcGeo => "D-UTC A0,A1,T,W,S,U",
            Self::IonoCorr => "IONOSPHERIC CORR",
            Self::TimeCorr => "TIME SYSTEM CORR",
            Self::EndOfHeader => "END OF HEADER",
            Self::NoLabel | Self::DontMatch => "",
        }
    }

    pub const fn version_mask(&self) -> VersionMask {
        match self {
            Self::MarkerType
            | Self::SysObsTypes
            | Self::SignalUnit
            | Self::Dcbs
            | Self::Pcvs
            | Self::ScaleFactor
            | Self::PhaseShift
            | Self::GlonassSlots
            | Self::GlonassCpBias
            | Self::IonoCorr
            | Self::TimeCorr => VersionMask::V3Only,
            Self::WaveLength
            | Self::ObsTypes
            | Self::IonAlpha
            | Self::IonBeta
            | Self::DeltaUtc
            | Self::CorrToSystemTime
            | Self::DUtcGeo => VersionMask::V2Only,
            _ => VersionMask::Both,
        }
    }

    /// True if this record exists in the given revision
    pub fn applies_to(&self, major: u8) -> bool {
        match self.version_mask() {
            VersionMask::Both => true,
            VersionMask::V2Only => major < 3,
            VersionMask::V3Only => major >= 3,
        }
    }

    pub const fn obligation(&self, file_kind: Type) -> Obligation {
        match file_kind {
            Type::ObservationData => self.obs_obligation(),
            Type::NavigationData => self.nav_obligation(),
        }
    }

    const fn obs_obligation(&self) -> Obligation {
        match self {
            Self::Version
            | Self::RunBy
            | Self::MarkerName
            | Self::MarkerType
            | Self::Agency
            | Self::Receiver
            | Self::AntennaType
            | Self::ApproxPosition
            | Self::AntennaDelta
            | Self::SysObsTypes
            | Self::ObsTypes
            | Self::FirstObs
            | Self::PhaseShift
            | Self::GlonassSlots
            | Self::GlonassCpBias
            | Self::EndOfHeader => Obligation::Obligatory,
            Self::IonAlpha
            | Self::IonBeta
            | Self::DeltaUtc
            | Self::CorrToSystemTime
            | Self::DUtcGeo
            | Self::IonoCorr
            | Self::TimeCorr
            | Self::NoLabel
            | Self::DontMatch => Obligation::NotApplicable,
            _ => Obligation::Optional,
        }
    }

    const fn nav_obligation(&self) -> Obligation {
        match self {
            Self::Version | Self::RunBy | Self::EndOfHeader => Obligation::Obligatory,
            Self::Comment
            | Self::IonAlpha
            | Self::IonBeta
            | Self::DeltaUtc
            | Self::CorrToSystemTime
            | Self::DUtcGeo
            | Self::IonoCorr
            | Self::TimeCorr
            | Self::LeapSeconds => Obligation::Optional,
            _ => Obligation::NotApplicable,
        }
    }

    pub const fn is_pseudo(&self) -> bool {
        matches!(self, Self::NoLabel | Self::DontMatch)
    }
}

/// Correction families carried by IONC/TIMC (and their V2 ancestors)
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CorrectionType {
    /// GPS ionosphere model, alpha coefficients
    GpsAlpha,
    /// GPS ionosphere model, beta coefficients
    GpsBeta,
    /// Galileo ionosphere model, ai coefficients
    GalAi,
    /// GPS to UTC time system correction
    GpsUtc,
    /// GLONASS to UTC time system correction
    GlonassUtc,
    /// Galileo to UTC time system correction
    GalileoUtc,
    /// SBAS to UTC time system correction
    SbasUtc,
}

impl CorrectionType {
    /// Correction descriptor used by V3.04 IONOSPHERIC CORR / TIME SYSTEM CORR
    pub const fn descriptor(&self) -> &'static str {
        match self {
            Self::GpsAlpha => "GPSA",
            Self::GpsBeta => "GPSB",
            Self::GalAi => "GAL ",
            Self::GpsUtc => "GPUT",
            Self::GlonassUtc => "GLUT",
            Self::GalileoUtc => "GAUT",
            Self::SbasUtc => "SBUT",
        }
    }

    /// True for the ionosphere model corrections (IONC family)
    pub const fn is_iono(&self) -> bool {
        matches!(self, Self::GpsAlpha | Self::GpsBeta | Self::GalAi)
    }

    /// The generalized V3.04 label this correction prints under
    pub const fn v3_label(&self) -> HeaderLabel {
        if self.is_iono() {
            HeaderLabel::IonoCorr
        } else {
            HeaderLabel::TimeCorr
        }
    }
}

/// One correction record: 4 coefficients plus reference time
#[derive(Clone, Debug, PartialEq)]
pub struct Correction {
    pub ctype: CorrectionType,
    pub coefficients: [f64; 4],
    pub ref_tow: f64,
    pub ref_week: i32,
}

/// Header record payloads, one variant per payload shape.
/// Each shape group accepts a fixed subset of labels, checked by
/// [HeaderField::coherent].
#[derive(Clone, Debug, PartialEq)]
pub enum HeaderField {
    /// Single free-text body
    Text(HeaderLabel, String),
    /// Two text columns (program/url, number/type)
    TextPair(HeaderLabel, String, String),
    /// Three text columns (program/run-by/date, number/type/version)
    TextTriple(HeaderLabel, String, String, String),
    /// Three reals (coordinates, antenna excentricities)
    Vector3(HeaderLabel, f64, f64, f64),
    /// One real (observation interval)
    Real(HeaderLabel, f64),
    /// One integer (leap seconds, clock offset flag, satellite count)
    Integer(HeaderLabel, i32),
    /// Two integers (wavelength factors)
    IntegerPair(HeaderLabel, i32, i32),
    /// Epoch body (time of first/last obs)
    TimeTag(HeaderLabel, Epoch),
    /// Iono / time system correction
    Correction(HeaderLabel, Correction),
    /// GLONASS slot / frequency channel pairs
    GloSlots(HeaderLabel, Vec<(u8, i8)>),
    /// GLONASS code-phase bias pairs (signal code, bias in meters)
    GloPhaseBias(HeaderLabel, Vec<(String, f64)>),
    /// Per-system carrier phase shift (system, observable code, correction)
    PhaseShift(HeaderLabel, Constellation, String, Option<f64>),
    /// Per-system scale factor (system, factor, affected observables)
    ScaleFactor(HeaderLabel, Constellation, u16, Vec<String>),
    /// Per-satellite observation count
    PrnObsCount(HeaderLabel, SV, Vec<u32>),
}

impl HeaderField {
    pub fn label(&self) -> HeaderLabel {
        match self {
            Self::Text(l, ..)
            | Self::TextPair(l, ..)
            | Self::TextTriple(l, ..)
            | Self::Vector3(l, ..)
            | Self::Real(l, ..)
            | Self::Integer(l, ..)
            | Self::IntegerPair(l, ..)
            | Self::TimeTag(l, ..)
            | Self::Correction(l, ..)
            | Self::GloSlots(l, ..)
            | Self::GloPhaseBias(l, ..)
            | Self::PhaseShift(l, ..)
            | Self::ScaleFactor(l, ..)
            | Self::PrnObsCount(l, ..) => *l,
        }
    }

    /// Validates the label/shape contract of this payload
    pub fn coherent(&self) -> Result<(), FieldError> {
        let label = self.label();
        if label.is_pseudo() {
            return Err(FieldError::PseudoLabel(label));
        }
        let ok = match self {
            Self::Text(l, _) => matches!(
                l,
                HeaderLabel::Comment
                    | HeaderLabel::MarkerName
                    | HeaderLabel::MarkerNumber
                    | HeaderLabel::MarkerType
                    | HeaderLabel::SignalUnit
            ),
            Self::TextPair(l, ..) => matches!(
                l,
                HeaderLabel::Agency
                    | HeaderLabel::AntennaType
                    | HeaderLabel::Dcbs
                    | HeaderLabel::Pcvs
            ),
            Self::TextTriple(l, ..) => {
                matches!(l, HeaderLabel::RunBy | HeaderLabel::Receiver)
            },
            Self::Vector3(l, ..) => matches!(
                l,
                HeaderLabel::ApproxPosition | HeaderLabel::AntennaDelta
            ),
            Self::Real(l, _) => matches!(l, HeaderLabel::Interval),
            Self::Integer(l, _) => matches!(
                l,
                HeaderLabel::ClockOffsetApplied
                    | HeaderLabel::LeapSeconds
                    | HeaderLabel::NumSatellites
            ),
            Self::IntegerPair(l, ..) => matches!(l, HeaderLabel::WaveLength),
            Self::TimeTag(l, _) => {
                matches!(l, HeaderLabel::FirstObs | HeaderLabel::LastObs)
            },
            Self::Correction(l, ..) => matches!(
                l,
                HeaderLabel::IonAlpha
                    | HeaderLabel::IonBeta
                    | HeaderLabel::DeltaUtc
                    | HeaderLabel::CorrToSystemTime
                    | HeaderLabel::DUtcGeo
                    | HeaderLabel::IonoCorr
                    | HeaderLabel::TimeCorr
            ),
            Self::GloSlots(l, _) => matches!(l, HeaderLabel::GlonassSlots),
            Self::GloPhaseBias(l, _) => matches!(l, HeaderLabel::GlonassCpBias),
            Self::PhaseShift(l, ..) => matches!(l, HeaderLabel::PhaseShift),
            Self::ScaleFactor(l, ..) => matches!(l, HeaderLabel::ScaleFactor),
            Self::PrnObsCount(l, ..) => matches!(l, HeaderLabel::PrnObsCount),
        };
        if ok {
            Ok(())
        } else {
            Err(FieldError::ShapeMismatch(label))
        }
    }
}

/// One entry of the header record store
#[derive(Clone, Debug)]
pub struct HeaderRecord {
    pub label: HeaderLabel,
    pub has_data: bool,
    /// Accumulated payloads. Most labels carry at most one; corrections,
    /// phase shifts and PRN counts accumulate.
    pub payloads: Vec<HeaderField>,
}

impl HeaderRecord {
    fn empty(label: HeaderLabel) -> Self {
        Self {
            label,
            has_data: false,
            payloads: Vec::new(),
        }
    }
}

/// Ordered header record store: exactly one live entry per
/// non-COMMENT label, any number of COMMENT entries inserted at
/// position-significant anchors.
#[derive(Clone, Debug)]
pub struct HeaderRecordStore {
    records: Vec<HeaderRecord>,
}

impl Default for HeaderRecordStore {
    fn default() -> Self {
        Self {
            records: LABEL_PRINT_ORDER
                .iter()
                .filter(|l| **l != HeaderLabel::Comment)
                .map(|l| HeaderRecord::empty(*l))
                .collect(),
        }
    }
}

/// Labels whose payloads accumulate rather than replace
fn accumulates(label: HeaderLabel) -> bool {
    matches!(
        label,
        HeaderLabel::IonAlpha
            | HeaderLabel::IonBeta
            | HeaderLabel::DeltaUtc
            | HeaderLabel::CorrToSystemTime
            | HeaderLabel::DUtcGeo
            | HeaderLabel::IonoCorr
            | HeaderLabel::TimeCorr
            | HeaderLabel::PhaseShift
            | HeaderLabel::ScaleFactor
            | HeaderLabel::PrnObsCount
            | HeaderLabel::Dcbs
            | HeaderLabel::Pcvs
    )
}

impl HeaderRecordStore {
    /// Stores a payload under its label. Non-accumulating labels replace
    /// their previous payload; duplicate corrections (same type and
    /// coefficients) are silently rejected.
    pub fn store(&mut self, field: HeaderField) -> Result<(), FieldError> {
        field.coherent()?;
        let label = field.label();

        if label == HeaderLabel::Comment {
            // unanchored comment: insert before END OF HEADER
            self.insert_comment_before(HeaderLabel::EndOfHeader, field);
            return Ok(());
        }

        let record = self
            .records
            .iter_mut()
            .find(|r| r.label == label)
            .ok_or(FieldError::PseudoLabel(label))?;

        if accumulates(label) {
            if let HeaderField::Correction(_, ref new_corr) = field {
                let duplicate = record.payloads.iter().any(|p| match p {
                    HeaderField::Correction(_, c) => {
                        c.ctype == new_corr.ctype && c.coefficients == new_corr.coefficients
                    },
                    _ => false,
                });
                if duplicate {
                    return Ok(());
                }
            }
            record.payloads.push(field);
        } else {
            record.payloads.clear();
            record.payloads.push(field);
        }
        record.has_data = true;
        Ok(())
    }

    /// Inserts a COMMENT entry before the first occurrence of the anchor
    /// label, or before END OF HEADER when the anchor is absent.
    pub fn insert_comment_before(&mut self, anchor: HeaderLabel, field: HeaderField) {
        let index = self
            .records
            .iter()
            .position(|r| r.label == anchor)
            .or_else(|| {
                self.records
                    .iter()
                    .position(|r| r.label == HeaderLabel::EndOfHeader)
            })
            .unwrap_or(self.records.len());
        self.records.insert(
            index,
            HeaderRecord {
                label: HeaderLabel::Comment,
                has_data: true,
                payloads: vec![field],
            },
        );
    }

    /// Every record in canonical print order, including empty ones
    pub(crate) fn records(&self) -> &[HeaderRecord] {
        &self.records
    }

    /// Restartable iterator over records currently carrying data
    pub fn records_with_data(&self) -> impl Iterator<Item = &HeaderRecord> {
        self.records.iter().filter(|r| r.has_data)
    }

    pub fn record(&self, label: HeaderLabel) -> Option<&HeaderRecord> {
        self.records.iter().find(|r| r.label == label)
    }

    pub fn has_data(&self, label: HeaderLabel) -> bool {
        self.records
            .iter()
            .any(|r| r.label == label && r.has_data)
    }

    /// Clears every data flag and payload (special event protocol)
    pub fn clear(&mut self) {
        self.records.retain(|r| r.label != HeaderLabel::Comment);
        for record in self.records.iter_mut() {
            record.has_data = false;
            record.payloads.clear();
        }
    }
}

/// One observable type of a [SystemDef]
#[derive(Clone, Debug, PartialEq)]
pub struct ObsType {
    /// V3.04 three character code
    pub code: String,
    /// Cleared by the observable filter
    pub selected: bool,
    /// True when this code renders in the output revision
    pub printable: bool,
}

impl ObsType {
    pub fn new(code: &str) -> Self {
        Self {
            code: code.to_string(),
            selected: true,
            printable: true,
        }
    }

    /// V2.10 equivalent code, when one exists
    pub fn v2_code(&self) -> Option<&'static str> {
        v2_equivalent(&self.code)
    }
}

/// Per-constellation definition: discovered observables and the
/// satellite selection used by the filters.
#[derive(Clone, Debug)]
pub struct SystemDef {
    pub constellation: Constellation,
    /// Ordered, unique observable codes.
    /// Pre-seeded with the primary band codes that have a V2.10
    /// equivalent, so V2/V3 reconciliation stays mechanical.
    pub obs_types: Vec<ObsType>,
    /// Cleared when a satellite filter names other systems only
    pub selected: bool,
    /// Selected satellites; empty means all selected
    pub selected_sats: Vec<u8>,
}

impl SystemDef {
    pub fn new(constellation: Constellation) -> Self {
        let band = match constellation {
            Constellation::BeiDou => "2I",
            _ => "1C",
        };
        let obs_types = ["C", "L", "D", "S"]
            .iter()
            .map(|kind| ObsType::new(&format!("{}{}", kind, band)))
            .collect();
        Self {
            constellation,
            obs_types,
            selected: true,
            selected_sats: Vec::new(),
        }
    }

    /// Registers an observable code, keeping codes unique.
    /// Returns its index within the ordered list.
    pub fn register_observable(&mut self, code: &str) -> usize {
        if let Some(index) = self.obs_types.iter().position(|o| o.code == code) {
            index
        } else {
            self.obs_types.push(ObsType::new(code));
            self.obs_types.len() - 1
        }
    }

    pub fn observable_index(&self, code: &str) -> Option<usize> {
        self.obs_types.iter().position(|o| o.code == code)
    }

    /// True when the satellite passes the current selection
    pub fn satellite_selected(&self, prn: u8) -> bool {
        self.selected_sats.is_empty() || self.selected_sats.contains(&prn)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn label_registry() {
        assert_eq!(HeaderLabel::Version.tag(), "RINEX VERSION / TYPE");
        assert_eq!(HeaderLabel::EndOfHeader.tag(), "END OF HEADER");
        assert!(HeaderLabel::ObsTypes.applies_to(2));
        assert!(!HeaderLabel::ObsTypes.applies_to(3));
        assert!(HeaderLabel::SysObsTypes.applies_to(3));
        assert!(!HeaderLabel::SysObsTypes.applies_to(2));
        assert_eq!(
            HeaderLabel::MarkerName.obligation(Type::ObservationData),
            Obligation::Obligatory
        );
        assert_eq!(
            HeaderLabel::MarkerName.obligation(Type::NavigationData),
            Obligation::NotApplicable
        );
        assert!(HeaderLabel::NoLabel.is_pseudo());
    }

    #[test]
    fn field_shape_contract() {
        let ok = HeaderField::Text(HeaderLabel::MarkerName, "POTS".to_string());
        assert!(ok.coherent().is_ok());

        let bad = HeaderField::Real(HeaderLabel::MarkerName, 30.0);
        assert_eq!(
            bad.coherent(),
            Err(FieldError::ShapeMismatch(HeaderLabel::MarkerName))
        );

        let pseudo = HeaderField::Text(HeaderLabel::NoLabel, "".to_string());
        assert_eq!(
            pseudo.coherent(),
            Err(FieldError::PseudoLabel(HeaderLabel::NoLabel))
        );
    }

    #[test]
    fn store_replace_and_accumulate() {
        let mut store = HeaderRecordStore::default();
        store
            .store(HeaderField::Text(
                HeaderLabel::MarkerName,
                "OLD".to_string(),
            ))
            .unwrap();
        store
            .store(HeaderField::Text(
                HeaderLabel::MarkerName,
                "NEW".to_string(),
            ))
            .unwrap();
        let record = store.record(HeaderLabel::MarkerName).unwrap();
        assert_eq!(record.payloads.len(), 1);

        let corr = Correction {
            ctype: CorrectionType::GpsAlpha,
            coefficients: [1.0, 2.0, 3.0, 4.0],
            ref_tow: 0.0,
            ref_week: 0,
        };
        store
            .store(HeaderField::Correction(HeaderLabel::IonoCorr, corr.clone()))
            .unwrap();
        // duplicate silently rejected
        store
            .store(HeaderField::Correction(HeaderLabel::IonoCorr, corr))
            .unwrap();
        assert_eq!(
            store.record(HeaderLabel::IonoCorr).unwrap().payloads.len(),
            1
        );
    }

    #[test]
    fn anchored_comments() {
        let mut store = HeaderRecordStore::default();
        store.insert_comment_before(
            HeaderLabel::MarkerName,
            HeaderField::Text(HeaderLabel::Comment, "before marker".to_string()),
        );
        let labels: Vec<_> = store.records_with_data().map(|r| r.label).collect();
        assert_eq!(labels, vec![HeaderLabel::Comment]);
    }

    #[test]
    fn system_def_seed() {
        let def = SystemDef::new(Constellation::GPS);
        let codes: Vec<_> = def.obs_types.iter().map(|o| o.code.as_str()).collect();
        assert_eq!(codes, vec!["C1C", "L1C", "D1C", "S1C"]);
        assert!(def.satellite_selected(12));

        let mut def = SystemDef::new(Constellation::Galileo);
        let index = def.register_observable("C5Q");
        assert_eq!(index, 4);
        // duplicates keep codes unique
        assert_eq!(def.register_observable("C5Q"), 4);
    }
}
