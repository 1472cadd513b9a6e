//! Observation epoch formatting, both revisions
use std::io::{BufWriter, Write};

use itertools::Itertools;

use crate::{
    epoch,
    format_sv,
    header::{self, SystemDef},
    observation::{ObsEpoch, SatObs},
    prelude::TimeScale,
    types::Type,
    FormattingError, Rinex,
};

/// Satellites per V2 epoch line
const V2_SATS_PER_LINE: usize = 12;
/// Observable slots per V2 data line
const V2_OBS_PER_LINE: usize = 5;

/// Prints the buffered observation epoch.
/// Regular flags print the satellite observation block; special event
/// flags print the header records currently carrying data instead.
pub fn format_obs_epoch<W: Write>(
    w: &mut BufWriter<W>,
    rinex: &Rinex,
) -> Result<(), FormattingError> {
    let version = rinex.version_or_err()?;
    let major = version.major;

    let Some(epoch) = rinex.obs_epoch() else {
        return Ok(());
    };
    let datetime = epoch::week_tow_to_epoch(epoch.week, epoch.tow, TimeScale::GPST);
    let epoch_str = epoch::format(datetime, Type::ObservationData, major);

    if !epoch.flag.carries_observations() {
        return format_special_event(w, rinex, &epoch_str, epoch, major);
    }
    if epoch.is_empty() {
        return Ok(());
    }

    // stable body order: system, satellite, observable
    let sorted: Vec<&SatObs> = epoch
        .observations
        .iter()
        .sorted_by_key(|o| (o.system_index, o.prn, o.obs_index))
        .collect();
    let satellites: Vec<(usize, u8)> = sorted
        .iter()
        .map(|o| (o.system_index, o.prn))
        .dedup()
        .collect();

    if major >= 3 {
        format_v3_body(w, rinex, epoch, &epoch_str, &sorted, &satellites)
    } else {
        format_v2_body(w, rinex, epoch, &epoch_str, &sorted, &satellites)
    }
}

fn format_special_event<W: Write>(
    w: &mut BufWriter<W>,
    rinex: &Rinex,
    epoch_str: &str,
    epoch: &ObsEpoch,
    major: u8,
) -> Result<(), FormattingError> {
    let (records, lines) = header::render_data_records(rinex, major)?;
    if major >= 3 {
        writeln!(w, "> {}  {}{:3}", epoch_str, epoch.flag, lines)?;
    } else {
        writeln!(w, " {}  {}{:3}", epoch_str, epoch.flag, lines)?;
    }
    w.write_all(records.as_bytes())?;
    Ok(())
}

fn format_v3_body<W: Write>(
    w: &mut BufWriter<W>,
    rinex: &Rinex,
    epoch: &ObsEpoch,
    epoch_str: &str,
    sorted: &[&SatObs],
    satellites: &[(usize, u8)],
) -> Result<(), FormattingError> {
    write!(
        w,
        "> {}  {}{:3}",
        epoch_str,
        epoch.flag,
        satellites.len()
    )?;
    if epoch.clock_offset != 0.0 {
        write!(w, "      {:15.12}", epoch.clock_offset)?;
    }
    writeln!(w)?;

    for (system_index, prn) in satellites.iter() {
        let system = &rinex.systems()[*system_index];
        let mut line = format_sv(system.constellation, *prn);
        for (obs_index, obs_type) in system.obs_types.iter().enumerate() {
            if !obs_type.selected || !obs_type.printable {
                continue;
            }
            match find_observation(sorted, *system_index, *prn, obs_index) {
                Some(obs) => line.push_str(&format_value(obs)),
                None => line.push_str(&" ".repeat(16)),
            }
        }
        writeln!(w, "{}", line.trim_end())?;
    }
    Ok(())
}

fn format_v2_body<W: Write>(
    w: &mut BufWriter<W>,
    rinex: &Rinex,
    epoch: &ObsEpoch,
    epoch_str: &str,
    sorted: &[&SatObs],
    satellites: &[(usize, u8)],
) -> Result<(), FormattingError> {
    let pattern = rinex.v2_obs_pattern();
    if pattern.is_empty() {
        return Err(FormattingError::MissingObservableDefinition(
            "no observable renders under 2.10".to_string(),
        ));
    }

    // epoch line: 12 satellite identities per line, receiver clock
    // offset trailing the first line
    write!(w, " {}  {}{:3}", epoch_str, epoch.flag, satellites.len())?;
    for (index, (system_index, prn)) in satellites.iter().enumerate() {
        if index > 0 && index % V2_SATS_PER_LINE == 0 {
            writeln!(w)?;
            write!(w, "{:32}", "")?;
        }
        let system = &rinex.systems()[*system_index];
        write!(w, "{}", format_sv(system.constellation, *prn))?;
        if index == V2_SATS_PER_LINE - 1 && epoch.clock_offset != 0.0 {
            write!(w, "{:12.9}", epoch.clock_offset)?;
        }
    }
    if satellites.len() < V2_SATS_PER_LINE && epoch.clock_offset != 0.0 {
        let padding = (V2_SATS_PER_LINE - satellites.len()) * 3;
        write!(w, "{:pad$}{:12.9}", "", epoch.clock_offset, pad = padding)?;
    }
    writeln!(w)?;

    // data block: every satellite renders the shared pattern,
    // blanking the slots its system cannot fill
    for (system_index, prn) in satellites.iter() {
        let system = &rinex.systems()[*system_index];
        let mut line = String::new();
        for (slot, v2_code) in pattern.iter().enumerate() {
            if slot > 0 && slot % V2_OBS_PER_LINE == 0 {
                writeln!(w, "{}", line.trim_end())?;
                line.clear();
            }
            let rendered = v2_slot(rinex, system, sorted, *system_index, *prn, v2_code);
            line.push_str(&rendered);
        }
        writeln!(w, "{}", line.trim_end())?;
    }
    Ok(())
}

fn v2_slot(
    rinex: &Rinex,
    system: &SystemDef,
    sorted: &[&SatObs],
    system_index: usize,
    prn: u8,
    v2_code: &str,
) -> String {
    let Some(obs_index) = rinex.v2_slot_index(system, v2_code) else {
        return " ".repeat(16);
    };
    match find_observation(sorted, system_index, prn, obs_index) {
        Some(obs) => format_value(obs),
        None => " ".repeat(16),
    }
}

fn find_observation<'a>(
    sorted: &[&'a SatObs],
    system_index: usize,
    prn: u8,
    obs_index: usize,
) -> Option<&'a SatObs> {
    sorted
        .iter()
        .find(|o| o.system_index == system_index && o.prn == prn && o.obs_index == obs_index)
        .copied()
}

/// One F14.3 value with its LLI and SSI digits
fn format_value(obs: &SatObs) -> String {
    let lli = match obs.lli {
        Some(flags) if !flags.is_empty() => {
            char::from_digit(flags.bits() as u32, 10).unwrap_or(' ')
        },
        _ => ' ',
    };
    let ssi = match obs.ssi {
        Some(ssi) => char::from_digit(ssi.class() as u32, 10).unwrap_or(' '),
        None => ' ',
    };
    format!("{:14.3}{}{}", obs.value, lli, ssi)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::observation::{EpochFlag, LliFlags, Ssi};
    use crate::prelude::Constellation;
    use crate::version::{VERSION_2, VERSION_3};

    fn model(major: u8) -> Rinex {
        let mut rinex = Rinex::new(Type::ObservationData);
        rinex
            .set_version(if major >= 3 { VERSION_3 } else { VERSION_2 })
            .unwrap();
        rinex.register_system(Constellation::GPS);
        rinex.register_system(Constellation::Glonass);
        rinex
    }

    fn render(rinex: &mut Rinex) -> String {
        let mut buffer = BufWriter::new(Vec::new());
        format_obs_epoch(&mut buffer, rinex).unwrap();
        String::from_utf8(buffer.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn v3_epoch_block() {
        let mut rinex = model(3);
        rinex.set_epoch_time(2190, 518_400.0, 0.0, EpochFlag::Ok, 518_400.0);
        // out of order on purpose, the body must sort
        for (c, prn, code, value) in [
            (Constellation::Glonass, 5, "C1C", 1.9E7),
            (Constellation::GPS, 14, "C1C", 2.2E7),
            (Constellation::GPS, 12, "C1C", 2.1E7),
            (Constellation::GPS, 12, "L1C", 1.1E8),
        ] {
            assert!(rinex.save_obs_data(c, prn, code, value, None, Some(Ssi::from(7)), 518_400.0));
        }

        let content = render(&mut rinex);
        let lines: Vec<&str> = content.lines().collect();
        assert!(lines[0].starts_with(">"));
        assert!(lines[0].contains("  0  3"), "3 satellites: {}", lines[0]);
        assert!(lines[1].starts_with("G12"));
        assert!(lines[2].starts_with("G14"));
        assert!(lines[3].starts_with("R05"));

        // G12 carries C1C and L1C, G14 only C1C
        assert!(lines[1].contains("21000000.000"));
        assert!(lines[1].contains("110000000.000"));
        assert!(!lines[2].contains("110000000.000"));
    }

    #[test]
    fn v2_epoch_block() {
        let mut rinex = model(2);
        rinex.set_epoch_time(2190, 518_400.0, 0.0, EpochFlag::Ok, 518_400.0);
        assert!(rinex.save_obs_data(
            Constellation::GPS,
            12,
            "C1C",
            2.1E7,
            None,
            Some(Ssi::from(8)),
            518_400.0
        ));
        assert!(rinex.save_obs_data(
            Constellation::GPS,
            12,
            "L1C",
            1.1E8,
            Some(LliFlags::LOCK_LOSS),
            Some(Ssi::from(8)),
            518_400.0
        ));

        let content = render(&mut rinex);
        let lines: Vec<&str> = content.lines().collect();
        // epoch line carries the satellite list
        assert!(lines[0].contains("  0  1G12"), "{}", lines[0]);
        // shared pattern C1 L1 D1 S1: value, value+lli+ssi, blanks
        assert!(lines[1].starts_with("  21000000.000 8 110000000.00018"));
    }

    #[test]
    fn v2_many_satellites_wrap() {
        let mut rinex = model(2);
        rinex.set_epoch_time(2190, 0.0, 0.0, EpochFlag::Ok, 0.0);
        for prn in 1..=14 {
            assert!(rinex.save_obs_data(Constellation::GPS, prn, "C1C", 2.0E7, None, None, 0.0));
        }
        let content = render(&mut rinex);
        let lines: Vec<&str> = content.lines().collect();
        assert!(lines[0].contains(" 14G01"));
        assert!(lines[0].ends_with("G12"));
        // continuation carries the 13th and 14th identities
        assert_eq!(lines[1].trim(), "G13G14");
    }

    #[test]
    fn special_event_prints_header_records() {
        use crate::header::{HeaderField, HeaderLabel};

        let mut rinex = model(3);
        rinex.clear_header_data();
        rinex
            .set_field(HeaderField::Text(
                HeaderLabel::MarkerName,
                "NEW SITE".to_string(),
            ))
            .unwrap();
        rinex.set_epoch_time(2190, 0.0, 0.0, EpochFlag::NewSiteOccupation, 0.0);

        let content = render(&mut rinex);
        let lines: Vec<&str> = content.lines().collect();
        assert!(lines[0].starts_with(">"));
        assert!(lines[0].contains("  3  1"), "{}", lines[0]);
        assert!(lines[1].contains("NEW SITE"));
        assert!(lines[1].contains("MARKER NAME"));
    }
}
