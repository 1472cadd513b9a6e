//! Navigation record formatting, both revisions
use std::io::{BufWriter, Write};

use itertools::Itertools;

use crate::{
    epoch,
    fmt::fmt_exp,
    format_sv,
    navigation::SatNavData,
    prelude::Constellation,
    types::Type,
    FormattingError, Rinex,
};

/// Prints every buffered navigation record, chronologically.
/// 2.10 only expresses GPS and GLONASS ephemerides; a buffered record
/// for any other system is a fault under that revision.
pub fn format_nav_epochs<W: Write>(
    w: &mut BufWriter<W>,
    rinex: &Rinex,
) -> Result<(), FormattingError> {
    let version = rinex.version_or_err()?;
    let major = version.major;

    let records = rinex
        .nav_records()
        .iter()
        .sorted_by_key(|r| (r.epoch, format!("{:x}", r.system), r.prn));

    for record in records {
        if major < 3
            && !matches!(record.system, Constellation::GPS | Constellation::Glonass)
        {
            return Err(FormattingError::UnknownSystem(format!(
                "{:x}",
                record.system
            )));
        }
        format_record(w, record, major)?;
    }
    Ok(())
}

fn format_record<W: Write>(
    w: &mut BufWriter<W>,
    record: &SatNavData,
    major: u8,
) -> Result<(), FormattingError> {
    let epoch_str = epoch::format(record.epoch, Type::NavigationData, major);
    if major >= 3 {
        write!(w, "{} {}", format_sv(record.system, record.prn), epoch_str)?;
    } else {
        write!(w, "{:2} {}", record.prn, epoch_str)?;
    }
    // V2.10 bodies carry FORTRAN D exponents, V3.04 bodies E
    let marker = if major >= 3 { 'E' } else { 'D' };
    // clock terms share the epoch line
    for value in record.broadcast_orbit[0].iter().take(3) {
        write!(w, "{}", fmt_exp(*value, 19, 12, marker))?;
    }
    writeln!(w)?;

    let indent = if major >= 3 { 4 } else { 3 };
    for row in 1..=record.orbit_lines() {
        write!(w, "{:indent$}", "", indent = indent)?;
        for value in record.broadcast_orbit[row].iter() {
            write!(w, "{}", fmt_exp(*value, 19, 12, marker))?;
        }
        writeln!(w)?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::navigation::BROADCAST_ORBIT_ROWS;
    use crate::prelude::Epoch;
    use crate::version::{VERSION_2, VERSION_3};

    fn record(system: Constellation, prn: u8) -> SatNavData {
        let mut broadcast_orbit = [[0.0; 4]; BROADCAST_ORBIT_ROWS];
        broadcast_orbit[0] = [1.331791281700E-7, 1.074695887800E-13, 0.0, 0.0];
        broadcast_orbit[1] = [2.55E2, -7.1875E0, 4.706086507E-9, -7.0823E-1];
        SatNavData {
            time_tag: 345_600.0,
            system,
            prn,
            epoch: Epoch::from_gregorian_utc(2021, 12, 21, 0, 0, 0, 0),
            broadcast_orbit,
        }
    }

    fn render(rinex: &mut Rinex) -> String {
        let mut buffer = BufWriter::new(Vec::new());
        format_nav_epochs(&mut buffer, rinex).unwrap();
        String::from_utf8(buffer.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn v3_gps_record() {
        let mut rinex = Rinex::new(Type::NavigationData);
        rinex.set_version(VERSION_3).unwrap();
        assert!(rinex.save_nav_data(record(Constellation::GPS, 12)));

        let content = render(&mut rinex);
        let lines: Vec<&str> = content.lines().collect();
        // clock line, then 7 orbit rows
        assert_eq!(lines.len(), 8);
        assert!(lines[0].starts_with("G12 2021 12 21 00 00 00"));
        assert!(lines[0].contains("0.133179128170E-06"));
        assert!(lines[1].starts_with("    "));
        assert!(lines[1].contains("0.255000000000E+03"));
        assert!(!content.contains('D'), "V3 bodies use the E marker");
    }

    #[test]
    fn v2_glonass_record() {
        let mut rinex = Rinex::new(Type::NavigationData);
        rinex.set_version(VERSION_2).unwrap();
        assert!(rinex.save_nav_data(record(Constellation::Glonass, 5)));

        let content = render(&mut rinex);
        let lines: Vec<&str> = content.lines().collect();
        // clock line, then the 3 GLONASS orbit rows
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with(" 5 21 12 21  0  0  0.0"));
        assert!(lines[0].contains("0.133179128170D-06"));
    }

    #[test]
    fn v2_rejects_galileo() {
        let mut rinex = Rinex::new(Type::NavigationData);
        rinex.set_version(VERSION_2).unwrap();
        assert!(rinex.save_nav_data(record(Constellation::Galileo, 1)));

        let mut buffer = BufWriter::new(Vec::new());
        assert!(matches!(
            format_nav_epochs(&mut buffer, &rinex),
            Err(FormattingError::UnknownSystem(_))
        ));
    }

    #[test]
    fn chronological_order() {
        let mut rinex = Rinex::new(Type::NavigationData);
        rinex.set_version(VERSION_3).unwrap();
        let mut late = record(Constellation::GPS, 14);
        late.epoch = Epoch::from_gregorian_utc(2021, 12, 21, 2, 0, 0, 0);
        late.time_tag = 352_800.0;
        assert!(rinex.save_nav_data(late));
        assert!(rinex.save_nav_data(record(Constellation::GPS, 12)));

        let content = render(&mut rinex);
        let first = content.lines().next().unwrap();
        assert!(first.starts_with("G12"), "expecting oldest first: {}", first);
    }
}
