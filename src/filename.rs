//! Standardized output file naming
use crate::{
    epoch::epoch_decompose,
    header::{HeaderField, HeaderLabel},
    prelude::{Constellation, Epoch},
    types::Type,
    Rinex,
};

/// Standardized name for the model content, picking the short (V2.10)
/// or long (V3.04) convention from the resolved revision. Falls back
/// to the long convention when the revision is still undetermined.
pub fn standard_filename(rinex: &Rinex) -> String {
    let short = rinex.version.map(|v| v.major == 2).unwrap_or(false);
    filename(rinex, short, None)
}

/// Standardized name with an explicit convention choice and an
/// optional custom suffix
pub fn filename(rinex: &Rinex, short: bool, suffix: Option<&str>) -> String {
    let site = site_name(rinex);
    let epoch = reference_epoch(rinex);

    let (yyyy, ddd, hh, mm) = match epoch {
        Some(epoch) => {
            let (y, _, _, hh, mm, _, _) = epoch_decompose(epoch);
            let ddd = epoch.day_of_year().round() as u32;
            (y, format!("{:03}", ddd), hh, mm)
        },
        None => (2000, "DDD".to_string(), 0, 0),
    };

    let mut name = if short {
        let session = (b'a' + hh) as char;
        let ext = match rinex.file_type {
            Type::NavigationData if rinex.constellation == Some(Constellation::Glonass) => 'G',
            kind => kind.code(),
        };
        format!(
            "{}{}{}{:02}.{:02}{}",
            &site[..4],
            ddd,
            session,
            mm,
            yyyy.rem_euclid(100),
            ext
        )
    } else {
        /* long / V3 like format */
        let fmt = match rinex.file_type {
            Type::ObservationData => "MO".to_string(),
            Type::NavigationData => match rinex.constellation {
                Some(Constellation::Mixed) | None => "MN".to_string(),
                Some(constellation) => format!("{:x}N", constellation),
            },
        };
        format!(
            "{}_R_{:04}{}{:02}{:02}_01D_{}_{}.rnx",
            site, yyyy, ddd, hh, mm, sampling_period(rinex), fmt,
        )
    };
    if let Some(suffix) = suffix {
        name.push_str(suffix);
    }
    name
}

/// 9 character site block SSSSMRCCC, padded from the marker name.
/// Short names reuse its first 4 characters.
fn site_name(rinex: &Rinex) -> String {
    let marker = match rinex.field(HeaderLabel::MarkerName) {
        Some(HeaderField::Text(_, name)) => name.trim().to_uppercase(),
        _ => String::new(),
    };
    let mut site: String = marker.chars().filter(char::is_ascii_alphanumeric).collect();
    if site.len() > 9 {
        site.truncate(9);
    }
    while site.len() < 4 {
        site.push('X');
    }
    // monument + receiver digits and country fill when the marker does
    // not carry them
    while site.len() < 6 {
        site.push('0');
    }
    while site.len() < 9 {
        site.push('X');
    }
    site
}

/// First observation when known, else the earliest buffered
/// navigation record
fn reference_epoch(rinex: &Rinex) -> Option<Epoch> {
    if let Some(HeaderField::TimeTag(_, epoch)) = rinex.field(HeaderLabel::FirstObs) {
        return Some(*epoch);
    }
    rinex
        .nav_records()
        .iter()
        .map(|record| record.epoch)
        .min()
}

/// Sampling period field of long names, from the INTERVAL record
fn sampling_period(rinex: &Rinex) -> String {
    let seconds = match rinex.field(HeaderLabel::Interval) {
        Some(HeaderField::Real(_, interval)) if *interval > 0.0 => interval.round() as u32,
        _ => 30,
    };
    if seconds >= 3600 && seconds % 3600 == 0 {
        format!("{:02}H", seconds / 3600)
    } else if seconds >= 60 && seconds % 60 == 0 {
        format!("{:02}M", seconds / 60)
    } else {
        format!("{:02}S", seconds)
    }
}
