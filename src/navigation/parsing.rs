//! Navigation record parsing, both revisions
use std::io::BufRead;

use log::warn;

use crate::{
    epoch,
    navigation::{SatNavData, BROADCAST_ORBIT_ROWS},
    observation::ReadStatus,
    prelude::{Constellation, TimeScale, SV},
    Rinex,
};

/// Reads one navigation data set into the model.
/// The satellite identity grammar and field offsets depend on the
/// resolved revision; the header must have been interpreted first.
pub fn read_nav_epoch<R: BufRead>(reader: &mut R, rinex: &mut Rinex) -> ReadStatus {
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

    let (sv, datetime_field, mut offset) = if version.major >= 3 {
        let Ok(sv) = line.get(..3).unwrap_or("").trim().parse::<SV>() else {
            return ReadStatus::WrongFormat;
        };
        (sv, line.get(4..23).unwrap_or(""), 23)
    } else {
        let Ok(prn) = line.get(..2).unwrap_or("").trim().parse::<u8>() else {
            return ReadStatus::WrongFormat;
        };
        let constellation = match rinex.constellation {
            Some(c) if c != Constellation::Mixed => c,
            _ => Constellation::GPS,
        };
        (SV::new(constellation, prn), line.get(3..22).unwrap_or(""), 22)
    };

    let ts = system_timescale(sv.constellation);
    let Ok(toc) = epoch::parse_in_timescale(datetime_field, ts) else {
        return ReadStatus::WrongFormat;
    };

    let mut partial = false;
    let mut broadcast_orbit = [[0.0; 4]; BROADCAST_ORBIT_ROWS];
    for slot in 0..3 {
        match parse_field(&line, offset) {
            Some(value) => broadcast_orbit[0][slot] = value,
            None => partial = true,
        }
        offset += 19;
    }

    let mut data = SatNavData {
        time_tag: epoch::epoch_to_tow(toc),
        system: sv.constellation,
        prn: sv.prn,
        epoch: toc,
        broadcast_orbit,
    };
    let orbit_lines = data.orbit_lines();

    let indent = if version.major >= 3 { 4 } else { 3 };
    for row in 1..=orbit_lines {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => return ReadStatus::PartialFieldErrors,
            Ok(_) => {},
            Err(e) => {
                warn!("read failure: {}", e);
                return ReadStatus::PartialFieldErrors;
            },
        }
        let line = line.trim_end_matches(['\r', '\n']);
        for slot in 0..4 {
            match parse_field(line, indent + 19 * slot) {
                Some(value) => data.broadcast_orbit[row][slot] = value,
                None => {
                    // rows legitimately end short of four values
                    if !line.get(indent + 19 * slot..).unwrap_or("").trim().is_empty() {
                        partial = true;
                    }
                },
            }
        }
    }

    if !rinex.save_nav_data(data) {
        warn!("duplicate navigation data set for {}, dropped", sv);
    }
    if partial {
        ReadStatus::PartialFieldErrors
    } else {
        ReadStatus::Ok
    }
}

fn system_timescale(constellation: Constellation) -> TimeScale {
    match constellation {
        Constellation::Glonass => TimeScale::UTC,
        Constellation::Galileo => TimeScale::GST,
        Constellation::BeiDou => TimeScale::BDT,
        _ => TimeScale::GPST,
    }
}

/// One D19.12 field, tolerant of both exponent markers
fn parse_field(line: &str, offset: usize) -> Option<f64> {
    let end = (offset + 19).min(line.len());
    if offset >= end {
        return None;
    }
    let field = line[offset..end].trim();
    if field.is_empty() {
        return None;
    }
    crate::header::parse_d(field)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::Type;
    use crate::version::{VERSION_2, VERSION_3};
    use std::io::BufReader;

    #[test]
    fn v3_gps_roundtrip() {
        let content = "\
G12 2021 12 21 00 00 00 0.133179128170D-06 0.107469588780D-13 0.000000000000D+00
     0.255000000000D+03-0.718750000000D+01 0.470608650700D-08-0.708230000000D+00
     0.000000000000D+00 0.000000000000D+00 0.000000000000D+00 0.000000000000D+00
     0.000000000000D+00 0.000000000000D+00 0.000000000000D+00 0.000000000000D+00
     0.000000000000D+00 0.000000000000D+00 0.000000000000D+00 0.000000000000D+00
     0.000000000000D+00 0.000000000000D+00 0.000000000000D+00 0.000000000000D+00
     0.000000000000D+00 0.000000000000D+00 0.000000000000D+00 0.000000000000D+00
     0.000000000000D+00 0.000000000000D+00 0.000000000000D+00 0.000000000000D+00
";
        let mut rinex = Rinex::new(Type::NavigationData);
        rinex.set_version(VERSION_3).unwrap();
        let mut reader = BufReader::new(content.as_bytes());
        assert_eq!(read_nav_epoch(&mut reader, &mut rinex), ReadStatus::Ok);

        let records = rinex.nav_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].system, Constellation::GPS);
        assert_eq!(records[0].prn, 12);
        assert!((records[0].broadcast_orbit[0][0] - 0.133179128170E-6).abs() < 1.0E-18);
        assert!((records[0].broadcast_orbit[1][1] + 7.1875).abs() < 1.0E-9);

        assert_eq!(read_nav_epoch(&mut reader, &mut rinex), ReadStatus::Eof);
    }

    #[test]
    fn v2_glonass_record() {
        let content = " 5 21 12 21  0  0  0.0 GARBAGE CLOCK FIELD
";
        // corrupted clock terms: tolerated, flagged partial
        let mut rinex = Rinex::new(Type::NavigationData);
        rinex.set_version(VERSION_2).unwrap();
        rinex.constellation = Some(Constellation::Glonass);
        let mut reader = BufReader::new(content.as_bytes());
        assert_eq!(
            read_nav_epoch(&mut reader, &mut rinex),
            ReadStatus::PartialFieldErrors
        );
    }

    #[test]
    fn v2_glonass_complete() {
        let content = " 5 21 12 21  0  0  0.0 0.636000000000D-04 0.909494701773D-12 0.345600000000D+06
    0.123456000000D+05-0.145000000000D+01 0.000000000000D+00 0.000000000000D+00
    0.234567000000D+05 0.215000000000D+01 0.000000000000D+00 0.100000000000D+01
   -0.987654000000D+04 0.305000000000D+01 0.000000000000D+00 0.000000000000D+00
";
        let mut rinex = Rinex::new(Type::NavigationData);
        rinex.set_version(VERSION_2).unwrap();
        rinex.constellation = Some(Constellation::Glonass);
        let mut reader = BufReader::new(content.as_bytes());
        assert_eq!(read_nav_epoch(&mut reader, &mut rinex), ReadStatus::Ok);

        let records = rinex.nav_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].system, Constellation::Glonass);
        // GLONASS carries 3 orbit rows, position in row 1 slot 0
        assert!((records[0].broadcast_orbit[1][0] - 1.23456E4).abs() < 1.0E-6);
        assert!((records[0].broadcast_orbit[3][1] - 3.05).abs() < 1.0E-9);
    }
}
