//! Observation epoch parsing, both revisions
use std::io::BufRead;

use log::warn;

use crate::{
    constants::v3_default,
    epoch,
    header::{parse_label, RecordParser, SystemDef},
    observation::{EpochFlag, LliFlags, Ssi},
    prelude::{Constellation, TimeScale, SV},
    Rinex,
};

/// Observation / navigation epoch read outcome
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReadStatus {
    /// Epoch completely interpreted
    Ok,
    /// Epoch interpreted, some malformed fields were dropped
    PartialFieldErrors,
    /// Content does not match an epoch of this revision
    WrongFormat,
    /// End of stream
    Eof,
}

/// One 16 column observation slot
enum Slot {
    Empty,
    Value(f64, Option<LliFlags>, Option<Ssi>),
    Bad,
}

/// Reads one observation epoch (or special event) into the model.
/// The header must have been interpreted first; the epoch buffer is
/// replaced, not accumulated.
pub fn read_obs_epoch<R: BufRead>(reader: &mut R, rinex: &mut Rinex) -> ReadStatus {
    let Some(version) = rinex.version else {
        return ReadStatus::WrongFormat;
    };
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => return ReadStatus::Eof,
            Ok(_) => {},
            Err(e) => {
                warn!("read failure: {}", e);
                return ReadStatus::Eof;
            },
        }
        if !line.trim().is_empty() {
            break;
        }
    }
    let line = line.trim_end_matches(['\r', '\n']).to_string();
    if version.major >= 3 {
        read_v3_epoch(reader, rinex, &line)
    } else {
        read_v2_epoch(reader, rinex, &line)
    }
}

fn next_line<R: BufRead>(reader: &mut R) -> Option<String> {
    let mut line = String::new();
    match reader.read_line(&mut line) {
        Ok(0) => None,
        Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        Err(e) => {
            warn!("read failure: {}", e);
            None
        },
    }
}

/// Special events embed regular header lines
fn read_event_records<R: BufRead>(reader: &mut R, rinex: &mut Rinex, count: usize) -> ReadStatus {
    let mut parser = RecordParser::default();
    for _ in 0..count {
        let Some(line) = next_line(reader) else {
            return ReadStatus::PartialFieldErrors;
        };
        let (body, label) = parse_label(&line);
        if label.is_pseudo() {
            warn!("unrecognized event record \"{}\"", line.trim());
            continue;
        }
        if parser.process(body, label, rinex).is_err() {
            warn!("dropped malformed event record \"{}\"", label.tag());
        }
    }
    ReadStatus::Ok
}

fn read_v3_epoch<R: BufRead>(reader: &mut R, rinex: &mut Rinex, line: &str) -> ReadStatus {
    let Some(rest) = line.strip_prefix('>') else {
        return ReadStatus::WrongFormat;
    };
    let tokens: Vec<&str> = rest.split_whitespace().collect();
    if tokens.len() < 8 {
        return ReadStatus::WrongFormat;
    }
    let Ok(datetime) = epoch::parse_in_timescale(&tokens[..6].join(" "), TimeScale::GPST) else {
        return ReadStatus::WrongFormat;
    };
    let Ok(flag) = tokens[6].parse::<EpochFlag>() else {
        return ReadStatus::WrongFormat;
    };
    let Ok(count) = tokens[7].parse::<usize>() else {
        return ReadStatus::WrongFormat;
    };
    let clock_offset = tokens
        .get(8)
        .and_then(|t| t.parse::<f64>().ok())
        .unwrap_or(0.0);

    let tow = epoch::epoch_to_tow(datetime);
    rinex.set_epoch_time(epoch::epoch_to_week(datetime), tow, clock_offset, flag, tow);

    if !flag.carries_observations() {
        return read_event_records(reader, rinex, count);
    }

    let mut partial = false;
    for _ in 0..count {
        let Some(line) = next_line(reader) else {
            return ReadStatus::PartialFieldErrors;
        };
        let Ok(sv) = line.get(..3).unwrap_or("").trim().parse::<SV>() else {
            warn!("unparsable satellite identity \"{}\"", line.trim());
            partial = true;
            continue;
        };
        let Some(system_index) = rinex.system_index(sv.constellation) else {
            warn!("observation for undeclared system {:x}", sv.constellation);
            partial = true;
            continue;
        };
        let codes: Vec<String> = rinex.systems()[system_index]
            .obs_types
            .iter()
            .map(|o| o.code.clone())
            .collect();
        for (index, code) in codes.iter().enumerate() {
            match parse_slot(&line, 3 + 16 * index) {
                Slot::Empty => {},
                Slot::Bad => partial = true,
                Slot::Value(value, lli, ssi) => {
                    rinex.save_obs_data(sv.constellation, sv.prn, code, value, lli, ssi, tow);
                },
            }
        }
    }
    if partial {
        ReadStatus::PartialFieldErrors
    } else {
        ReadStatus::Ok
    }
}

fn read_v2_epoch<R: BufRead>(reader: &mut R, rinex: &mut Rinex, line: &str) -> ReadStatus {
    if line.len() < 32 {
        return ReadStatus::WrongFormat;
    }
    let Ok(datetime) = epoch::parse_in_timescale(&line[..26], TimeScale::GPST) else {
        return ReadStatus::WrongFormat;
    };
    let Ok(flag) = line[26..29].trim().parse::<EpochFlag>() else {
        return ReadStatus::WrongFormat;
    };
    let Ok(count) = line[29..32].trim().parse::<usize>() else {
        return ReadStatus::WrongFormat;
    };
    let clock_offset = line
        .get(68..)
        .and_then(|t| t.trim().parse::<f64>().ok())
        .unwrap_or(0.0);

    let tow = epoch::epoch_to_tow(datetime);
    rinex.set_epoch_time(epoch::epoch_to_week(datetime), tow, clock_offset, flag, tow);

    if !flag.carries_observations() {
        return read_event_records(reader, rinex, count);
    }

    // satellite list, 12 identities per line
    let mut partial = false;
    let mut identities = collect_identities(line, rinex);
    while identities.len() < count {
        let Some(continuation) = next_line(reader) else {
            return ReadStatus::PartialFieldErrors;
        };
        let more = collect_identities(&continuation, rinex);
        if more.is_empty() {
            warn!("truncated satellite list, expecting {} entries", count);
            return ReadStatus::PartialFieldErrors;
        }
        identities.extend(more);
    }

    let pattern = v2_read_pattern(rinex);
    if pattern.is_empty() {
        warn!("no observable definition, epoch dropped");
        return ReadStatus::PartialFieldErrors;
    }
    let lines_per_sat = pattern.len().div_ceil(5);

    for sv in identities.iter().take(count) {
        let mut data_lines: Vec<String> = Vec::with_capacity(lines_per_sat);
        for _ in 0..lines_per_sat {
            match next_line(reader) {
                Some(line) => data_lines.push(line),
                None => return ReadStatus::PartialFieldErrors,
            }
        }
        // data lines of an unidentified satellite are consumed, not used
        let Some(sv) = sv else {
            partial = true;
            continue;
        };
        register_v2_system(rinex, sv.constellation, &pattern);
        let Some(system_index) = rinex.system_index(sv.constellation) else {
            partial = true;
            continue;
        };
        for (slot, v2_code) in pattern.iter().enumerate() {
            let code = {
                let system: &SystemDef = &rinex.systems()[system_index];
                rinex
                    .v2_slot_index(system, v2_code)
                    .map(|i| system.obs_types[i].code.clone())
            };
            let Some(code) = code else {
                continue;
            };
            match parse_slot(&data_lines[slot / 5], (slot % 5) * 16) {
                Slot::Empty => {},
                Slot::Bad => partial = true,
                Slot::Value(value, lli, ssi) => {
                    rinex.save_obs_data(sv.constellation, sv.prn, &code, value, lli, ssi, tow);
                },
            }
        }
    }
    if partial {
        ReadStatus::PartialFieldErrors
    } else {
        ReadStatus::Ok
    }
}

/// Satellite identities from columns 33..68 of a V2 epoch line.
/// Old files may blank the system character in single system files.
fn collect_identities(line: &str, rinex: &Rinex) -> Vec<Option<SV>> {
    let mut identities = Vec::new();
    let section = line.get(32..line.len().min(68)).unwrap_or("");
    let chars: Vec<char> = section.chars().collect();
    for id in chars.chunks(3) {
        let id: String = id.iter().collect();
        if id.trim().is_empty() {
            continue;
        }
        if let Ok(sv) = id.trim().parse::<SV>() {
            identities.push(Some(sv));
            continue;
        }
        let fallback = match rinex.constellation {
            Some(c) if c != Constellation::Mixed => Some(c),
            _ => Some(Constellation::GPS),
        };
        match (id.trim().parse::<u8>(), fallback) {
            (Ok(prn), Some(c)) => identities.push(Some(SV::new(c, prn))),
            _ => {
                warn!("unparsable satellite identity \"{}\"", id.trim());
                identities.push(None);
            },
        }
    }
    identities
}

/// The shared V2 pattern: the one a parsed header declared, else the
/// one the current system registry implies
fn v2_read_pattern(rinex: &Rinex) -> Vec<String> {
    if !rinex.v2_pending_pattern.is_empty() {
        return rinex.v2_pending_pattern.clone();
    }
    rinex
        .v2_obs_pattern()
        .iter()
        .map(|code| code.to_string())
        .collect()
}

/// Systems discovered mid-body expand the shared pattern into default
/// V3 observables
fn register_v2_system(rinex: &mut Rinex, constellation: Constellation, pattern: &[String]) {
    if rinex.system_index(constellation).is_some() {
        return;
    }
    rinex.register_system(constellation);
    for v2_code in pattern.iter() {
        match v3_default(v2_code) {
            Some(code) => {
                rinex.register_observable(constellation, &code);
            },
            None => warn!("no modern equivalent for \"{}\"", v2_code),
        }
    }
}

fn parse_slot(line: &str, offset: usize) -> Slot {
    let end = (offset + 14).min(line.len());
    if offset >= end {
        return Slot::Empty;
    }
    let field = line[offset..end].trim();
    if field.is_empty() {
        return Slot::Empty;
    }
    let Ok(value) = field.parse::<f64>() else {
        warn!("unparsable observation \"{}\"", field);
        return Slot::Bad;
    };
    let lli = line
        .get(offset + 14..offset + 15)
        .and_then(|c| c.trim().parse::<u8>().ok())
        .and_then(LliFlags::from_bits);
    let ssi = line
        .get(offset + 15..offset + 16)
        .and_then(|c| c.trim().parse::<u8>().ok())
        .map(Ssi::from);
    Slot::Value(value, lli, ssi)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::version::{VERSION_2, VERSION_3};
    use std::io::BufReader;

    #[test]
    fn v3_epoch() {
        let mut rinex = Rinex::default();
        rinex.set_version(VERSION_3).unwrap();
        rinex.register_system(Constellation::GPS);

        let content = "\
> 2021 12 21 00 00  0.0000000  0  2
G12  21000000.000 8 110000000.00018
G14  22000000.000 7
";
        let mut reader = BufReader::new(content.as_bytes());
        assert_eq!(read_obs_epoch(&mut reader, &mut rinex), ReadStatus::Ok);

        let epoch = rinex.obs_epoch().unwrap();
        assert_eq!(epoch.num_satellites(), 2);
        assert_eq!(epoch.observations.len(), 3);
        assert_eq!(epoch.flag, EpochFlag::Ok);

        let phase = epoch
            .observations
            .iter()
            .find(|o| o.obs_index == 1)
            .unwrap();
        assert_eq!(phase.value, 1.1E8);
        assert_eq!(phase.lli, Some(LliFlags::LOCK_LOSS));
        assert_eq!(phase.ssi, Some(Ssi::from(8)));

        assert_eq!(read_obs_epoch(&mut reader, &mut rinex), ReadStatus::Eof);
    }

    #[test]
    fn v2_epoch() {
        let mut rinex = Rinex::default();
        rinex.set_version(VERSION_2).unwrap();
        rinex.constellation = Some(Constellation::GPS);
        rinex.v2_pending_pattern = vec!["C1".to_string(), "L1".to_string()];

        let content = " 21 12 21  0  0  0.0000000  0  1G12
  21000000.000 8 110000000.00018
";
        let mut reader = BufReader::new(content.as_bytes());
        assert_eq!(read_obs_epoch(&mut reader, &mut rinex), ReadStatus::Ok);

        // system materialized on first sighting, with default codes
        let index = rinex.system_index(Constellation::GPS).unwrap();
        assert!(rinex.systems()[index].observable_index("C1C").is_some());

        let epoch = rinex.obs_epoch().unwrap();
        assert_eq!(epoch.observations.len(), 2);
        assert_eq!(epoch.observations[0].value, 2.1E7);
    }

    #[test]
    fn v3_special_event() {
        let mut rinex = Rinex::default();
        rinex.set_version(VERSION_3).unwrap();

        let content = format!(
            "> 2021 12 21 00 30  0.0000000  3  1\n{:<60}{}\n",
            "RELOCATED", "MARKER NAME"
        );
        let mut reader = BufReader::new(content.as_bytes());
        assert_eq!(read_obs_epoch(&mut reader, &mut rinex), ReadStatus::Ok);
        assert_eq!(
            rinex.obs_epoch().unwrap().flag,
            EpochFlag::NewSiteOccupation
        );
        assert!(matches!(
            rinex.field(crate::header::HeaderLabel::MarkerName),
            Some(crate::header::HeaderField::Text(_, name)) if name == "RELOCATED"
        ));
    }

    #[test]
    fn garbage_is_wrong_format() {
        let mut rinex = Rinex::default();
        rinex.set_version(VERSION_3).unwrap();
        let mut reader = BufReader::new("this is not an epoch line at all".as_bytes());
        assert_eq!(
            read_obs_epoch(&mut reader, &mut rinex),
            ReadStatus::WrongFormat
        );
    }
}
