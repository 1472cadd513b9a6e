//! GNSS time arithmetic and RINEX epoch field rendering
use crate::types::Type;
use hifitime::{Epoch, TimeScale};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParsingError {
    #[error("failed to parse timestamp")]
    EpochError(#[from] hifitime::HifitimeError),
    #[error("expecting \"yyyy mm dd hh mm ss.ssss\" format")]
    FormatError,
    #[error("failed to parse years from \"{0}\"")]
    YearField(String),
    #[error("failed to parse months from \"{0}\"")]
    MonthField(String),
    #[error("failed to parse days from \"{0}\"")]
    DayField(String),
    #[error("failed to parse hours from \"{0}\"")]
    HoursField(String),
    #[error("failed to parse minutes field from \"{0}\"")]
    MinutesField(String),
    #[error("failed to parse seconds field from \"{0}\"")]
    SecondsField(String),
    #[error("failed to parse nanos from \"{0}\"")]
    NanosecondsField(String),
}

/// Builds an [Epoch] from a GNSS week number and time of week (seconds)
pub fn week_tow_to_epoch(week: u32, tow: f64, ts: TimeScale) -> Epoch {
    let nanos = (tow * 1.0E9).round() as u64;
    Epoch::from_time_of_week(week, nanos, ts)
}

/// Week number for given [Epoch], in its own timescale
pub fn epoch_to_week(epoch: Epoch) -> u32 {
    let (week, _) = epoch.to_time_of_week();
    week
}

/// Time of week (seconds) for given [Epoch], in its own timescale
pub fn epoch_to_tow(epoch: Epoch) -> f64 {
    let (_, nanos) = epoch.to_time_of_week();
    (nanos as f64) * 1.0E-9
}

/// Modified Julian Day for given GNSS week and time of week
pub fn mjd_from_week_tow(week: u32, tow: f64, ts: TimeScale) -> f64 {
    week_tow_to_epoch(week, tow, ts).to_mjd_utc_days()
}

/*
 * Gregorian decomposition in the timescale the epoch was expressed in.
 */
pub(crate) fn epoch_decompose(e: Epoch) -> (i32, u8, u8, u8, u8, u8, u32) {
    e.to_gregorian(e.time_scale)
}

/*
 * Formats given epoch to string, matching standard specifications
 */
pub(crate) fn format(epoch: Epoch, t: Type, major: u8) -> String {
    let (y, m, d, hh, mm, ss, nanos) = epoch_decompose(epoch);

    match t {
        Type::ObservationData => {
            if major < 3 {
                // old RINEX wants 2 digit YY field
                let mut y = y - 2000;
                if y < 0 {
                    // files recorded prior 21st century
                    y += 100;
                }
                format!(
                    "{:02} {:>2} {:>2} {:>2} {:>2} {:>2}.{:07}",
                    y,
                    m,
                    d,
                    hh,
                    mm,
                    ss,
                    nanos / 100,
                )
            } else {
                format!(
                    "{:04} {:02} {:02} {:02} {:02} {:>2}.{:07}",
                    y,
                    m,
                    d,
                    hh,
                    mm,
                    ss,
                    nanos / 100,
                )
            }
        },
        Type::NavigationData => {
            if major < 3 {
                let mut y = y - 2000;
                if y < 0 {
                    y += 100;
                }
                format!(
                    "{:02} {:>2} {:>2} {:>2} {:>2} {:>2}.{:1}",
                    y,
                    m,
                    d,
                    hh,
                    mm,
                    ss,
                    nanos / 100_000_000
                )
            } else {
                format!("{:04} {:02} {:02} {:02} {:02} {:02}", y, m, d, hh, mm, ss)
            }
        },
    }
}

/*
 * TIME OF FIRST OBS / TIME OF LAST OBS body rendering,
 * shared by both supported revisions.
 */
pub(crate) fn format_first_last_obs(epoch: Epoch) -> String {
    let (y, m, d, hh, mm, ss, nanos) = epoch_decompose(epoch);
    let ts = match epoch.time_scale {
        TimeScale::GPST => "GPS",
        TimeScale::GST => "GAL",
        TimeScale::BDT => "BDT",
        TimeScale::UTC => "GLO",
        _ => "GPS",
    };
    format!(
        "  {:04}    {:02}    {:02}    {:02}    {:02}   {:2}.{:07}     {:3}",
        y,
        m,
        d,
        hh,
        mm,
        ss,
        nanos / 100,
        ts
    )
}

/*
 * Parses an Epoch, interpreted as a datetime within specified TimeScale.
 */
pub(crate) fn parse_in_timescale(content: &str, ts: TimeScale) -> Result<Epoch, ParsingError> {
    let mut y = 0_i32;
    let mut m = 0_u8;
    let mut d = 0_u8;
    let mut hh = 0_u8;
    let mut mm = 0_u8;
    let mut ss = 0_u8;
    let mut ns = 0_u32;

    if content.split_ascii_whitespace().count() < 6 {
        return Err(ParsingError::FormatError);
    }

    for (field_index, item) in content.split_ascii_whitespace().enumerate() {
        match field_index {
            0 => {
                y = item
                    .parse::<i32>()
                    .map_err(|_| ParsingError::YearField(item.to_string()))?;

                /* old RINEX problem: YY is sometimes encoded on two digits */
                if y < 100 {
                    if y < 80 {
                        y += 2000;
                    } else {
                        y += 1900;
                    }
                }
            },
            1 => {
                m = item
                    .parse::<u8>()
                    .map_err(|_| ParsingError::MonthField(item.to_string()))?;
            },
            2 => {
                d = item
                    .parse::<u8>()
                    .map_err(|_| ParsingError::DayField(item.to_string()))?;
            },
            3 => {
                hh = item
                    .parse::<u8>()
                    .map_err(|_| ParsingError::HoursField(item.to_string()))?;
            },
            4 => {
                mm = item
                    .parse::<u8>()
                    .map_err(|_| ParsingError::MinutesField(item.to_string()))?;
            },
            5 => {
                if let Some(dot) = item.find('.') {
                    let is_nav = item.trim().len() < 7;

                    ss = item[..dot]
                        .trim()
                        .parse::<u8>()
                        .map_err(|_| ParsingError::SecondsField(item.to_string()))?;

                    ns = item[dot + 1..]
                        .trim()
                        .parse::<u32>()
                        .map_err(|_| ParsingError::NanosecondsField(item.to_string()))?;

                    if is_nav {
                        // NAV RINEX : 100ms precision
                        ns *= 100_000_000;
                    } else {
                        // OBS RINEX : 100ns precision
                        ns *= 100;
                    }
                } else {
                    ss = item
                        .trim()
                        .parse::<u8>()
                        .map_err(|_| ParsingError::SecondsField(item.to_string()))?;
                }
            },
            _ => {},
        }
    }

    // totally invalid content would make from_gregorian panic
    if y == 0 {
        return Err(ParsingError::FormatError);
    }

    Ok(Epoch::from_gregorian(y, m, d, hh, mm, ss, ns, ts))
}

/*
 * Infaillible `Epoch::now()` call.
 */
pub(crate) fn now() -> Epoch {
    Epoch::now().unwrap_or(Epoch::from_gregorian_utc_at_midnight(2000, 1, 1))
}
