//! Header parsing: label recognition and per-record body grammars
use std::io::BufRead;

use log::warn;

use crate::{
    epoch,
    header::{
        Correction, CorrectionType, HeaderField, HeaderLabel, ParsingError, LABEL_PRINT_ORDER,
    },
    prelude::{Constellation, TimeScale, SV},
    types::Type,
    version::Version,
    Rinex,
};

/// Unlabeled lines tolerated before giving up on a damaged header
const MAX_UNLABELED_LINES: u32 = 10;

/// Where the header read stands in the mandated record order
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
enum HeaderStage {
    ExpectVersion,
    PostVersion,
    PostObsTypes,
    PostNumSatellites,
}

/// Advances the stage for `label` and reports misplaced records.
/// Returns false when the record is out of order. Never fatal: the
/// record body is still interpreted afterwards.
fn track_ordering(label: HeaderLabel, stage: &mut HeaderStage) -> bool {
    match label {
        HeaderLabel::Version => {
            *stage = HeaderStage::PostVersion;
            true
        },
        _ if *stage == HeaderStage::ExpectVersion => {
            warn!("\"{}\" before RINEX VERSION / TYPE", label.tag());
            false
        },
        HeaderLabel::SysObsTypes | HeaderLabel::ObsTypes => {
            if *stage < HeaderStage::PostObsTypes {
                *stage = HeaderStage::PostObsTypes;
            }
            true
        },
        HeaderLabel::NumSatellites => {
            if *stage < HeaderStage::PostNumSatellites {
                *stage = HeaderStage::PostNumSatellites;
            }
            true
        },
        HeaderLabel::Dcbs | HeaderLabel::Pcvs | HeaderLabel::ScaleFactor => {
            if *stage < HeaderStage::PostObsTypes {
                warn!("\"{}\" before the observable tables", label.tag());
                return false;
            }
            true
        },
        HeaderLabel::PrnObsCount => {
            if *stage < HeaderStage::PostNumSatellites {
                warn!("\"{}\" before # OF SATELLITES", label.tag());
                return false;
            }
            true
        },
        _ => true,
    }
}

/// Splits a header line into its 60 column body and recognized label.
/// Yields [HeaderLabel::NoLabel] for short or unlabeled lines and
/// [HeaderLabel::DontMatch] when the label text matches nothing.
pub(crate) fn parse_label(line: &str) -> (&str, HeaderLabel) {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(body) = line.get(..60) else {
        return (line, HeaderLabel::NoLabel);
    };
    let tag = line[60..].trim();
    if tag.is_empty() {
        return (body, HeaderLabel::NoLabel);
    }
    for label in LABEL_PRINT_ORDER.iter() {
        if tag == label.tag() {
            return (body, *label);
        }
    }
    (body, HeaderLabel::DontMatch)
}

/// Reads a complete RINEX header into the model, stopping at
/// END OF HEADER, end of stream, or after too many unlabeled lines.
/// Malformed optional record bodies are skipped with a warning, and
/// misplaced records are reported but still interpreted.
pub fn read_rinex_header<R: BufRead>(
    reader: &mut R,
    rinex: &mut Rinex,
) -> Result<(), ParsingError> {
    let mut line = String::new();
    let mut unlabeled = 0_u32;
    let mut stage = HeaderStage::ExpectVersion;
    let mut parser = RecordParser::default();

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            warn!("end of stream before END OF HEADER");
            return Ok(());
        }

        let (body, label) = parse_label(&line);
        match label {
            HeaderLabel::NoLabel | HeaderLabel::DontMatch => {
                if !body.trim().is_empty() {
                    warn!("unlabeled header line \"{}\"", body.trim());
                }
                unlabeled += 1;
                if unlabeled >= MAX_UNLABELED_LINES {
                    warn!("too many unlabeled lines, giving up on this header");
                    return Ok(());
                }
                continue;
            },
            HeaderLabel::EndOfHeader => return Ok(()),
            _ => unlabeled = 0,
        }

        track_ordering(label, &mut stage);
        parser.process(body, label, rinex)?;
    }
}

/// Per-record body interpreter, carrying the continuation state of
/// multi line records. Also drives the header lines embedded in
/// observation special events.
#[derive(Default)]
pub(crate) struct RecordParser {
    obs_types_system: Option<Constellation>,
    glo_slots: Vec<(u8, i8)>,
    glo_biases: Vec<(String, f64)>,
}

impl RecordParser {
    pub(crate) fn process(
        &mut self,
        body: &str,
        label: HeaderLabel,
        rinex: &mut Rinex,
    ) -> Result<(), ParsingError> {
        match label {
            HeaderLabel::Version => parse_version(body, rinex)?,
            HeaderLabel::RunBy | HeaderLabel::Receiver => {
                store(
                    rinex,
                    HeaderField::TextTriple(
                        label,
                        column(body, 0, 20),
                        column(body, 20, 40),
                        column(body, 40, 60),
                    ),
                );
            },
            HeaderLabel::Comment => {
                store(
                    rinex,
                    HeaderField::Text(label, body.trim_end().to_string()),
                );
            },
            HeaderLabel::MarkerName => {
                store(rinex, HeaderField::Text(label, body.trim().to_string()));
            },
            HeaderLabel::MarkerNumber | HeaderLabel::MarkerType | HeaderLabel::SignalUnit => {
                store(rinex, HeaderField::Text(label, column(body, 0, 20)));
            },
            HeaderLabel::Agency => {
                store(
                    rinex,
                    HeaderField::TextPair(label, column(body, 0, 20), column(body, 20, 60)),
                );
            },
            HeaderLabel::AntennaType => {
                store(
                    rinex,
                    HeaderField::TextPair(label, column(body, 0, 20), column(body, 20, 40)),
                );
            },
            HeaderLabel::Dcbs | HeaderLabel::Pcvs => {
                store(
                    rinex,
                    HeaderField::TextPair(label, column(body, 0, 20), column(body, 20, 60)),
                );
            },
            HeaderLabel::ApproxPosition | HeaderLabel::AntennaDelta => {
                match reals::<3>(body) {
                    Some([x, y, z]) => store(rinex, HeaderField::Vector3(label, x, y, z)),
                    None => warn!("malformed \"{}\" body, skipped", label.tag()),
                }
            },
            HeaderLabel::WaveLength => match integers::<2>(body) {
                Some([l1, l2]) => store(rinex, HeaderField::IntegerPair(label, l1, l2)),
                None => warn!("malformed \"{}\" body, skipped", label.tag()),
            },
            HeaderLabel::Interval => match body.trim().parse::<f64>() {
                Ok(dt) => store(rinex, HeaderField::Real(label, dt)),
                Err(_) => warn!("malformed INTERVAL body, skipped"),
            },
            HeaderLabel::ClockOffsetApplied
            | HeaderLabel::LeapSeconds
            | HeaderLabel::NumSatellites => {
                let token = body.split_whitespace().next().unwrap_or("");
                match token.parse::<i32>() {
                    Ok(value) => store(rinex, HeaderField::Integer(label, value)),
                    Err(_) => warn!("malformed \"{}\" body, skipped", label.tag()),
                }
            },
            HeaderLabel::FirstObs | HeaderLabel::LastObs => {
                let epoch = parse_obs_time_tag(body)?;
                store(rinex, HeaderField::TimeTag(label, epoch));
            },
            HeaderLabel::SysObsTypes => {
                parse_sys_obs_types(body, rinex, &mut self.obs_types_system);
            },
            HeaderLabel::ObsTypes => parse_v2_obs_types(body, rinex),
            HeaderLabel::ScaleFactor => parse_scale_factor(body, rinex),
            HeaderLabel::PhaseShift => parse_phase_shift(body, rinex),
            HeaderLabel::GlonassSlots => {
                parse_glonass_slots(body, &mut self.glo_slots);
                store(rinex, HeaderField::GloSlots(label, self.glo_slots.clone()));
            },
            HeaderLabel::GlonassCpBias => {
                parse_glonass_biases(body, &mut self.glo_biases);
                store(rinex, HeaderField::GloPhaseBias(label, self.glo_biases.clone()));
            },
            HeaderLabel::PrnObsCount => parse_prn_obs_count(body, rinex),
            HeaderLabel::IonAlpha | HeaderLabel::IonBeta => {
                match reals_d::<4>(body) {
                    Some(coefficients) => {
                        let ctype = if label == HeaderLabel::IonAlpha {
                            CorrectionType::GpsAlpha
                        } else {
                            CorrectionType::GpsBeta
                        };
                        store(
                            rinex,
                            HeaderField::Correction(
                                label,
                                Correction {
                                    ctype,
                                    coefficients,
                                    ref_tow: 0.0,
                                    ref_week: 0,
                                },
                            ),
                        );
                    },
                    None => warn!("malformed \"{}\" body, skipped", label.tag()),
                }
            },
            HeaderLabel::DeltaUtc | HeaderLabel::DUtcGeo => parse_v2_utc(body, label, rinex),
            HeaderLabel::CorrToSystemTime => parse_corr_to_system_time(body, rinex),
            HeaderLabel::IonoCorr | HeaderLabel::TimeCorr => parse_v3_correction(body, label, rinex),
            HeaderLabel::EndOfHeader | HeaderLabel::NoLabel | HeaderLabel::DontMatch => {},
        }
        Ok(())
    }
}

/// set_field wrapper: a shape fault here is a parser bug, never fatal
fn store(rinex: &mut Rinex, field: HeaderField) {
    if let Err(e) = rinex.set_field(field) {
        warn!("rejected header field: {}", e);
    }
}

fn column(body: &str, from: usize, to: usize) -> String {
    let end = to.min(body.len());
    if from >= end {
        return String::new();
    }
    body[from..end].trim().to_string()
}

fn reals<const N: usize>(body: &str) -> Option<[f64; N]> {
    let mut values = [0.0; N];
    let mut tokens = body.split_whitespace();
    for value in values.iter_mut() {
        *value = tokens.next()?.parse::<f64>().ok()?;
    }
    Some(values)
}

// same, tolerating FORTRAN "D" exponents
fn reals_d<const N: usize>(body: &str) -> Option<[f64; N]> {
    let mut values = [0.0; N];
    let mut tokens = body.split_whitespace();
    for value in values.iter_mut() {
        *value = parse_d(tokens.next()?)?;
    }
    Some(values)
}

fn integers<const N: usize>(body: &str) -> Option<[i32; N]> {
    let mut values = [0; N];
    let mut tokens = body.split_whitespace();
    for value in values.iter_mut() {
        *value = tokens.next()?.parse::<i32>().ok()?;
    }
    Some(values)
}

pub(crate) fn parse_d(token: &str) -> Option<f64> {
    token
        .replace(['D', 'd'], "E")
        .trim()
        .parse::<f64>()
        .ok()
}

fn parse_version(body: &str, rinex: &mut Rinex) -> Result<(), ParsingError> {
    let version = column(body, 0, 20)
        .parse::<Version>()
        .map_err(|_| ParsingError::VersionParsing)?;
    if !version.is_supported() {
        warn!("revision {} is outside the supported set", version);
    }
    rinex.version = Some(version);

    let descriptor = column(body, 20, 40);
    rinex.file_type = descriptor
        .parse::<Type>()
        .map_err(|_| ParsingError::TypeParsing(descriptor.clone()))?;

    let system = column(body, 40, 60);
    if let Some(token) = system.split_whitespace().next() {
        match token.parse::<Constellation>() {
            Ok(c) => rinex.constellation = Some(c),
            Err(e) => return Err(ParsingError::ConstellationParsing(e)),
        }
    } else if rinex.file_type == Type::NavigationData {
        // V2 navigation: the system hides in the descriptor
        rinex.constellation = if descriptor.contains("GLONASS") {
            Some(Constellation::Glonass)
        } else {
            Some(Constellation::GPS)
        };
    }
    Ok(())
}

/// TIME OF FIRST/LAST OBS carries a trailing timescale token
fn parse_obs_time_tag(body: &str) -> Result<hifitime::Epoch, ParsingError> {
    let tokens: Vec<&str> = body.split_whitespace().collect();
    let (datetime, ts) = match tokens.last() {
        Some(&"GPS") => (&tokens[..tokens.len() - 1], TimeScale::GPST),
        Some(&"GAL") => (&tokens[..tokens.len() - 1], TimeScale::GST),
        Some(&"BDT") => (&tokens[..tokens.len() - 1], TimeScale::BDT),
        Some(&"GLO") | Some(&"UTC") => (&tokens[..tokens.len() - 1], TimeScale::UTC),
        _ => (&tokens[..], TimeScale::GPST),
    };
    let epoch = epoch::parse_in_timescale(&datetime.join(" "), ts)?;
    Ok(epoch)
}

/// SYS / # / OBS TYPES with continuation lines (blank system column)
fn parse_sys_obs_types(body: &str, rinex: &mut Rinex, current: &mut Option<Constellation>) {
    let lead = column(body, 0, 6);
    if let Some(token) = lead.split_whitespace().next() {
        match token.parse::<Constellation>() {
            Ok(c) => *current = Some(c),
            Err(_) => {
                warn!("observable record for unknown system \"{}\"", token);
                *current = None;
                return;
            },
        }
    }
    let Some(constellation) = *current else {
        return;
    };
    for code in body.get(6..).unwrap_or("").split_whitespace() {
        if code.len() == 3 {
            rinex.register_observable(constellation, code);
        } else if code.parse::<u16>().is_err() {
            warn!("dropped malformed observable code \"{}\"", code);
        }
    }
}

/// # / TYPES OF OBSERV: the V2 pattern is shared by every system, it
/// expands per system once satellites show up in the body
fn parse_v2_obs_types(body: &str, rinex: &mut Rinex) {
    for code in body.get(6..).unwrap_or("").split_whitespace() {
        if code.len() == 2 {
            rinex.v2_pending_pattern.push(code.to_string());
        } else {
            warn!("dropped malformed V2 observable code \"{}\"", code);
        }
    }
}

fn parse_scale_factor(body: &str, rinex: &mut Rinex) {
    let mut tokens = body.split_whitespace();
    let (Some(system), Some(factor)) = (tokens.next(), tokens.next()) else {
        warn!("malformed SYS / SCALE FACTOR body, skipped");
        return;
    };
    let Ok(constellation) = system.parse::<Constellation>() else {
        warn!("scale factor for unknown system \"{}\"", system);
        return;
    };
    let Ok(factor) = factor.parse::<u16>() else {
        warn!("malformed scale factor value, skipped");
        return;
    };
    // third token is the affected code count, codes follow
    let codes: Vec<String> = tokens.skip(1).map(|c| c.to_string()).collect();
    store(
        rinex,
        HeaderField::ScaleFactor(HeaderLabel::ScaleFactor, constellation, factor, codes),
    );
}

fn parse_phase_shift(body: &str, rinex: &mut Rinex) {
    let mut tokens = body.split_whitespace();
    let (Some(system), Some(code)) = (tokens.next(), tokens.next()) else {
        warn!("malformed SYS / PHASE SHIFT body, skipped");
        return;
    };
    let Ok(constellation) = system.parse::<Constellation>() else {
        warn!("phase shift for unknown system \"{}\"", system);
        return;
    };
    let correction = tokens.next().and_then(|t| t.parse::<f64>().ok());
    store(
        rinex,
        HeaderField::PhaseShift(
            HeaderLabel::PhaseShift,
            constellation,
            code.to_string(),
            correction,
        ),
    );
}

/// GLONASS SLOT / FRQ # body: optional count, then (Rnn, fcn) pairs
fn parse_glonass_slots(body: &str, slots: &mut Vec<(u8, i8)>) {
    let mut tokens = body.split_whitespace().peekable();
    while let Some(token) = tokens.next() {
        let Some(slot) = token.strip_prefix('R') else {
            // leading pair count
            continue;
        };
        let (Ok(slot), Some(fcn)) = (slot.parse::<u8>(), tokens.next()) else {
            warn!("malformed GLONASS slot entry \"{}\"", token);
            return;
        };
        match fcn.parse::<i8>() {
            Ok(fcn) => slots.push((slot, fcn)),
            Err(_) => warn!("malformed channel number for R{:02}", slot),
        }
    }
}

fn parse_glonass_biases(body: &str, biases: &mut Vec<(String, f64)>) {
    let mut tokens = body.split_whitespace();
    while let Some(code) = tokens.next() {
        let Some(value) = tokens.next().and_then(|t| t.parse::<f64>().ok()) else {
            warn!("malformed GLONASS bias entry \"{}\"", code);
            return;
        };
        biases.push((code.to_string(), value));
    }
}

fn parse_prn_obs_count(body: &str, rinex: &mut Rinex) {
    let lead = column(body, 0, 7);
    let Ok(sv) = lead.parse::<SV>() else {
        // continuation lines of oversized count lists are dropped
        return;
    };
    let counts: Vec<u32> = body
        .get(7..)
        .unwrap_or("")
        .split_whitespace()
        .filter_map(|t| t.parse::<u32>().ok())
        .collect();
    store(
        rinex,
        HeaderField::PrnObsCount(HeaderLabel::PrnObsCount, sv, counts),
    );
}

/// DELTA-UTC / D-UTC: A0, A1, reference time and week
fn parse_v2_utc(body: &str, label: HeaderLabel, rinex: &mut Rinex) {
    let mut tokens = body.split_whitespace();
    let (Some(a0), Some(a1), Some(tow), Some(week)) = (
        tokens.next().and_then(parse_d),
        tokens.next().and_then(parse_d),
        tokens.next().and_then(|t| t.parse::<f64>().ok()),
        tokens.next().and_then(|t| t.parse::<i32>().ok()),
    ) else {
        warn!("malformed \"{}\" body, skipped", label.tag());
        return;
    };
    let ctype = if label == HeaderLabel::DeltaUtc {
        CorrectionType::GpsUtc
    } else {
        CorrectionType::SbasUtc
    };
    store(
        rinex,
        HeaderField::Correction(
            label,
            Correction {
                ctype,
                coefficients: [a0, a1, 0.0, 0.0],
                ref_tow: tow,
                ref_week: week,
            },
        ),
    );
}

/// CORR TO SYSTEM TIME: calendar date then -TauC
fn parse_corr_to_system_time(body: &str, rinex: &mut Rinex) {
    let mut tokens = body.split_whitespace();
    let (Some(y), Some(m), Some(d), Some(tau)) = (
        tokens.next().and_then(|t| t.parse::<i32>().ok()),
        tokens.next().and_then(|t| t.parse::<u8>().ok()),
        tokens.next().and_then(|t| t.parse::<u8>().ok()),
        tokens.next().and_then(parse_d),
    ) else {
        warn!("malformed CORR TO SYSTEM TIME body, skipped");
        return;
    };
    let reference = hifitime::Epoch::from_gregorian(y, m, d, 0, 0, 0, 0, TimeScale::UTC);
    store(
        rinex,
        HeaderField::Correction(
            HeaderLabel::CorrToSystemTime,
            Correction {
                ctype: CorrectionType::GlonassUtc,
                coefficients: [tau, 0.0, 0.0, 0.0],
                ref_tow: epoch::epoch_to_tow(reference),
                ref_week: epoch::epoch_to_week(reference) as i32,
            },
        ),
    );
}

/// IONOSPHERIC CORR / TIME SYSTEM CORR: descriptor then coefficients
fn parse_v3_correction(body: &str, label: HeaderLabel, rinex: &mut Rinex) {
    let descriptor = column(body, 0, 5);
    let ctype = match descriptor.as_str() {
        "GPSA" => CorrectionType::GpsAlpha,
        "GPSB" => CorrectionType::GpsBeta,
        "GAL" => CorrectionType::GalAi,
        "GPUT" => CorrectionType::GpsUtc,
        "GLUT" => CorrectionType::GlonassUtc,
        "GAUT" => CorrectionType::GalileoUtc,
        "SBUT" => CorrectionType::SbasUtc,
        other => {
            warn!("unsupported correction descriptor \"{}\"", other);
            return;
        },
    };
    let rest = body.get(5..).unwrap_or("");
    let correction = if ctype.is_iono() {
        match reals_d::<4>(rest) {
            Some(coefficients) => Correction {
                ctype,
                coefficients,
                ref_tow: 0.0,
                ref_week: 0,
            },
            None => {
                warn!("malformed \"{}\" body, skipped", label.tag());
                return;
            },
        }
    } else {
        let mut tokens = rest.split_whitespace();
        let (Some(a0), Some(a1), Some(tow), Some(week)) = (
            tokens.next().and_then(parse_d),
            tokens.next().and_then(parse_d),
            tokens.next().and_then(|t| t.parse::<f64>().ok()),
            tokens.next().and_then(|t| t.parse::<i32>().ok()),
        ) else {
            warn!("malformed \"{}\" body, skipped", label.tag());
            return;
        };
        Correction {
            ctype,
            coefficients: [a0, a1, 0.0, 0.0],
            ref_tow: tow,
            ref_week: week,
        }
    };
    store(rinex, HeaderField::Correction(label, correction));
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::BufReader;

    #[test]
    fn label_recognition() {
        let line = format!("{:<60}{}", "TLSE", "MARKER NAME");
        let (body, label) = parse_label(&line);
        assert_eq!(label, HeaderLabel::MarkerName);
        assert_eq!(body.trim(), "TLSE");

        let (_, label) = parse_label("too short");
        assert_eq!(label, HeaderLabel::NoLabel);

        let line = format!("{:<60}{}", "", "NO SUCH RECORD");
        let (_, label) = parse_label(&line);
        assert_eq!(label, HeaderLabel::DontMatch);
    }

    #[test]
    fn record_ordering_stages() {
        let mut stage = HeaderStage::ExpectVersion;
        assert!(!track_ordering(HeaderLabel::MarkerName, &mut stage));
        assert!(track_ordering(HeaderLabel::Version, &mut stage));

        // corrections land before the observable tables
        assert!(!track_ordering(HeaderLabel::Dcbs, &mut stage));
        assert!(!track_ordering(HeaderLabel::ScaleFactor, &mut stage));
        assert!(track_ordering(HeaderLabel::SysObsTypes, &mut stage));
        assert!(track_ordering(HeaderLabel::Dcbs, &mut stage));

        assert!(!track_ordering(HeaderLabel::PrnObsCount, &mut stage));
        assert!(track_ordering(HeaderLabel::NumSatellites, &mut stage));
        assert!(track_ordering(HeaderLabel::PrnObsCount, &mut stage));
    }

    #[test]
    fn misplaced_record_still_interpreted() {
        let content = "     3.04           OBSERVATION DATA    M                   RINEX VERSION / TYPE
G DCBS-TOOL         http://example.org                      SYS / DCBS APPLIED
G    4 C1C L1C D1C S1C                                      SYS / # / OBS TYPES
                                                            END OF HEADER
";
        let mut rinex = Rinex::default();
        let mut reader = BufReader::new(content.as_bytes());
        read_rinex_header(&mut reader, &mut rinex).unwrap();

        // reported as misplaced but never dropped
        let dcbs = rinex.record(HeaderLabel::Dcbs).unwrap();
        assert!(matches!(
            &dcbs.payloads[0],
            HeaderField::TextPair(_, program, _) if program == "G DCBS-TOOL"
        ));
        assert_eq!(rinex.systems().len(), 1);
    }

    #[test]
    fn v3_observation_header() {
        let content = "     3.04           OBSERVATION DATA    M                   RINEX VERSION / TYPE
grd2rinex           unit test           20260101 000000 UTC PGM / RUN BY / DATE
TLSE                                                        MARKER NAME
G    4 C1C L1C D1C S1C                                      SYS / # / OBS TYPES
R    4 C1C L1C D1C S1C                                      SYS / # / OBS TYPES
  4567890.0000  1234567.0000  4000000.0000                  APPROX POSITION XYZ
        18                                                  LEAP SECONDS
                                                            END OF HEADER
";
        let mut rinex = Rinex::default();
        let mut reader = BufReader::new(content.as_bytes());
        read_rinex_header(&mut reader, &mut rinex).unwrap();

        assert_eq!(rinex.version, Some(crate::version::VERSION_3));
        assert_eq!(rinex.file_type, Type::ObservationData);
        assert_eq!(rinex.constellation, Some(Constellation::Mixed));
        assert_eq!(rinex.systems().len(), 2);
        assert_eq!(
            rinex.systems()[0].observable_index("S1C"),
            Some(3),
            "observable order must follow the header"
        );
        assert!(matches!(
            rinex.field(HeaderLabel::LeapSeconds),
            Some(HeaderField::Integer(_, 18))
        ));
        assert!(matches!(
            rinex.field(HeaderLabel::ApproxPosition),
            Some(HeaderField::Vector3(..))
        ));
    }

    #[test]
    fn v2_navigation_header() {
        let content = "     2.10           NAV DATA                                RINEX VERSION / TYPE
  0.1176D-07  0.2235D-07 -0.1192D-06 -0.1192D-06            ION ALPHA
   0.133179128170D-06 0.107469588780D-12   552960     2190  DELTA-UTC: A0,A1,T,W
                                                            END OF HEADER
";
        let mut rinex = Rinex::default();
        let mut reader = BufReader::new(content.as_bytes());
        read_rinex_header(&mut reader, &mut rinex).unwrap();

        assert_eq!(rinex.file_type, Type::NavigationData);
        assert_eq!(rinex.constellation, Some(Constellation::GPS));

        // both V2 records generalize into their V3 families
        let iono = rinex.record(HeaderLabel::IonoCorr).unwrap();
        assert_eq!(iono.payloads.len(), 1);
        let HeaderField::Correction(_, corr) = &iono.payloads[0] else {
            panic!("expecting a correction payload");
        };
        assert_eq!(corr.ctype, CorrectionType::GpsAlpha);
        assert!((corr.coefficients[0] - 0.1176E-7).abs() < 1.0E-12);

        let timec = rinex.record(HeaderLabel::TimeCorr).unwrap();
        let HeaderField::Correction(_, corr) = &timec.payloads[0] else {
            panic!("expecting a correction payload");
        };
        assert_eq!(corr.ctype, CorrectionType::GpsUtc);
        assert_eq!(corr.ref_week, 2190);
    }

    #[test]
    fn damaged_header_gives_up() {
        let mut garbage = String::from(
            "     3.04           OBSERVATION DATA    G                   RINEX VERSION / TYPE\n",
        );
        for _ in 0..12 {
            garbage.push_str("complete nonsense\n");
        }
        let mut rinex = Rinex::default();
        let mut reader = BufReader::new(garbage.as_bytes());
        // tolerated, never an error
        read_rinex_header(&mut reader, &mut rinex).unwrap();
        assert_eq!(rinex.version, Some(crate::version::VERSION_3));
    }
}
