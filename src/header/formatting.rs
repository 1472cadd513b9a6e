//! Header formatting: canonical record order, both revisions
use std::io::{BufWriter, Write};

use log::warn;

use crate::{
    epoch,
    fmt::{fmt_comment, fmt_d, fmt_rinex},
    header::{Correction, CorrectionType, HeaderField, HeaderLabel, HeaderRecord},
    prelude::TimeScale,
    types::Type,
    version::Version,
    FormattingError, Rinex,
};

/// Prints the complete header in canonical record order.
/// Only records flagged as carrying data render; the VERSION line,
/// the observable definition records and END OF HEADER are
/// synthesized from the model.
pub fn format_header<W: Write>(w: &mut BufWriter<W>, rinex: &Rinex) -> Result<(), FormattingError> {
    let version = rinex.version_or_err()?;
    let major = version.major;

    rinex.warn_missing_obligatory(major);
    format_version(w, rinex, version)?;

    for record in rinex.store().records() {
        match record.label {
            HeaderLabel::Version | HeaderLabel::EndOfHeader => {},
            HeaderLabel::SysObsTypes => {
                if major >= 3 && rinex.file_type == Type::ObservationData {
                    format_sys_obs_types(w, rinex)?;
                }
            },
            HeaderLabel::ObsTypes => {
                if major < 3 && rinex.file_type == Type::ObservationData {
                    format_v2_obs_types(w, rinex)?;
                }
            },
            HeaderLabel::IonoCorr | HeaderLabel::TimeCorr => {
                if record.has_data {
                    format_corrections(w, record, major)?;
                }
            },
            label => {
                if !record.has_data || !label.applies_to(major) {
                    continue;
                }
                for payload in record.payloads.iter() {
                    format_field(w, payload)?;
                }
            },
        }
    }

    writeln!(w, "{}", fmt_rinex("", HeaderLabel::EndOfHeader.tag()))?;
    Ok(())
}

/// Renders every record currently carrying data, as embedded in
/// observation special events. Returns the text and its line count.
pub(crate) fn render_data_records(
    rinex: &Rinex,
    major: u8,
) -> Result<(String, usize), FormattingError> {
    let mut w = BufWriter::new(Vec::new());
    for record in rinex.store().records() {
        if !record.has_data {
            continue;
        }
        match record.label {
            HeaderLabel::IonoCorr | HeaderLabel::TimeCorr => {
                format_corrections(&mut w, record, major)?;
            },
            label if label.applies_to(major) => {
                for payload in record.payloads.iter() {
                    format_field(&mut w, payload)?;
                }
            },
            _ => {},
        }
    }
    let bytes = w
        .into_inner()
        .map_err(|e| FormattingError::Io(e.into_error()))?;
    let text = String::from_utf8_lossy(&bytes).into_owned();
    let lines = text.lines().count();
    Ok((text, lines))
}

fn format_version<W: Write>(
    w: &mut BufWriter<W>,
    rinex: &Rinex,
    version: Version,
) -> Result<(), FormattingError> {
    let descriptor = match (rinex.file_type, version.major) {
        (Type::NavigationData, major) if major >= 3 => "N: GNSS NAV DATA".to_string(),
        (file_type, _) => file_type.to_string(rinex.constellation),
    };
    let system = match rinex.file_type {
        Type::ObservationData => rinex
            .constellation
            .map(|c| format!("{:x}", c))
            .unwrap_or_default(),
        Type::NavigationData => {
            if version.major >= 3 {
                rinex
                    .constellation
                    .map(|c| format!("{:x}", c))
                    .unwrap_or_default()
            } else {
                String::new()
            }
        },
    };
    let body = format!("{:>9}{:11}{:<20}{:<20}", version.to_string(), "", descriptor, system);
    writeln!(w, "{}", fmt_rinex(&body, HeaderLabel::Version.tag()))?;
    Ok(())
}

/// SYS / # / OBS TYPES: one record per system, 13 codes per line,
/// selected codes only
fn format_sys_obs_types<W: Write>(w: &mut BufWriter<W>, rinex: &Rinex) -> Result<(), FormattingError> {
    let tag = HeaderLabel::SysObsTypes.tag();
    for system in rinex.systems() {
        let codes: Vec<&str> = system
            .obs_types
            .iter()
            .filter(|o| o.selected)
            .map(|o| o.code.as_str())
            .collect();
        if codes.is_empty() {
            continue;
        }
        let mut body = format!("{:x}  {:3}", system.constellation, codes.len());
        for (index, code) in codes.iter().enumerate() {
            if index > 0 && index % 13 == 0 {
                writeln!(w, "{}", fmt_rinex(&body, tag))?;
                body = " ".repeat(6);
            }
            body.push_str(&format!(" {}", code));
        }
        writeln!(w, "{}", fmt_rinex(&body, tag))?;
    }
    Ok(())
}

/// # / TYPES OF OBSERV: the single pattern every system shares under
/// 2.10, 9 codes per line
fn format_v2_obs_types<W: Write>(w: &mut BufWriter<W>, rinex: &Rinex) -> Result<(), FormattingError> {
    let pattern = rinex.v2_obs_pattern();
    if pattern.is_empty() {
        warn!("no observable renders under 2.10, observable record skipped");
        return Ok(());
    }
    let tag = HeaderLabel::ObsTypes.tag();
    let mut body = format!("{:6}", pattern.len());
    for (index, code) in pattern.iter().enumerate() {
        if index > 0 && index % 9 == 0 {
            writeln!(w, "{}", fmt_rinex(&body, tag))?;
            body = " ".repeat(6);
        }
        body.push_str(&format!("{:>6}", code));
    }
    writeln!(w, "{}", fmt_rinex(&body, tag))?;
    Ok(())
}

/// Correction rendering. Under 3.04 every correction prints in its
/// generalized IONOSPHERIC CORR / TIME SYSTEM CORR form; under 2.10
/// each family falls back to its historical record, and families
/// 2.10 never knew are skipped with a warning.
fn format_corrections<W: Write>(
    w: &mut BufWriter<W>,
    record: &HeaderRecord,
    major: u8,
) -> Result<(), FormattingError> {
    for payload in record.payloads.iter() {
        let HeaderField::Correction(_, corr) = payload else {
            continue;
        };
        if major >= 3 {
            format_v3_correction(w, corr)?;
        } else {
            format_v2_correction(w, corr)?;
        }
    }
    Ok(())
}

fn format_v3_correction<W: Write>(w: &mut BufWriter<W>, corr: &Correction) -> Result<(), FormattingError> {
    let body = if corr.ctype.is_iono() {
        let mut body = format!("{:<4} ", corr.ctype.descriptor());
        for value in corr.coefficients.iter() {
            body.push_str(&fmt_d(*value, 12, 4));
        }
        body
    } else {
        format!(
            "{:<4} {}{}{:>7}{:>5}",
            corr.ctype.descriptor(),
            fmt_d(corr.coefficients[0], 17, 10),
            fmt_d(corr.coefficients[1], 16, 9),
            corr.ref_tow.round() as i64,
            corr.ref_week,
        )
    };
    writeln!(w, "{}", fmt_rinex(&body, corr.ctype.v3_label().tag()))?;
    Ok(())
}

fn format_v2_correction<W: Write>(w: &mut BufWriter<W>, corr: &Correction) -> Result<(), FormattingError> {
    let (body, tag) = match corr.ctype {
        CorrectionType::GpsAlpha | CorrectionType::GpsBeta => {
            let mut body = String::from("  ");
            for value in corr.coefficients.iter() {
                body.push_str(&fmt_d(*value, 12, 4));
            }
            let label = if corr.ctype == CorrectionType::GpsAlpha {
                HeaderLabel::IonAlpha
            } else {
                HeaderLabel::IonBeta
            };
            (body, label.tag())
        },
        CorrectionType::GpsUtc => (
            format!(
                "   {}{}{:>9}{:>9}",
                fmt_d(corr.coefficients[0], 19, 12),
                fmt_d(corr.coefficients[1], 19, 12),
                corr.ref_tow.round() as i64,
                corr.ref_week,
            ),
            HeaderLabel::DeltaUtc.tag(),
        ),
        CorrectionType::GlonassUtc => {
            // reference time renders as a calendar date here
            let week = corr.ref_week.max(0) as u32;
            let reference = epoch::week_tow_to_epoch(week, corr.ref_tow, TimeScale::UTC);
            let (y, m, d, ..) = epoch::epoch_decompose(reference);
            (
                format!(
                    "{:>6}{:>6}{:>6}   {}",
                    y,
                    m,
                    d,
                    fmt_d(corr.coefficients[0], 19, 12),
                ),
                HeaderLabel::CorrToSystemTime.tag(),
            )
        },
        CorrectionType::SbasUtc => (
            format!(
                " {}{}{:>7}{:>5}",
                fmt_d(corr.coefficients[0], 19, 12),
                fmt_d(corr.coefficients[1], 19, 12),
                corr.ref_tow.round() as i64,
                corr.ref_week,
            ),
            HeaderLabel::DUtcGeo.tag(),
        ),
        CorrectionType::GalAi | CorrectionType::GalileoUtc => {
            warn!(
                "no 2.10 rendition for correction {}, skipped",
                corr.ctype.descriptor().trim()
            );
            return Ok(());
        },
    };
    writeln!(w, "{}", fmt_rinex(&body, tag))?;
    Ok(())
}

fn format_field<W: Write>(w: &mut BufWriter<W>, field: &HeaderField) -> Result<(), FormattingError> {
    let tag = field.label().tag();
    match field {
        HeaderField::Text(label, text) => match label {
            HeaderLabel::Comment => writeln!(w, "{}", fmt_comment(text))?,
            HeaderLabel::MarkerName => writeln!(w, "{}", fmt_rinex(text, tag))?,
            _ => writeln!(w, "{}", fmt_rinex(&format!("{:<20}", text), tag))?,
        },
        HeaderField::TextPair(label, first, second) => match label {
            HeaderLabel::Agency => {
                writeln!(w, "{}", fmt_rinex(&format!("{:<20}{:<40}", first, second), tag))?;
            },
            _ => {
                writeln!(w, "{}", fmt_rinex(&format!("{:<20}{:<20}", first, second), tag))?;
            },
        },
        HeaderField::TextTriple(_, first, second, third) => {
            writeln!(
                w,
                "{}",
                fmt_rinex(&format!("{:<20}{:<20}{:<20}", first, second, third), tag)
            )?;
        },
        HeaderField::Vector3(_, x, y, z) => {
            writeln!(w, "{}", fmt_rinex(&format!("{:14.4}{:14.4}{:14.4}", x, y, z), tag))?;
        },
        HeaderField::Real(_, value) => {
            writeln!(w, "{}", fmt_rinex(&format!("{:10.3}", value), tag))?;
        },
        HeaderField::Integer(_, value) => {
            writeln!(w, "{}", fmt_rinex(&format!("{:6}", value), tag))?;
        },
        HeaderField::IntegerPair(_, first, second) => {
            writeln!(w, "{}", fmt_rinex(&format!("{:6}{:6}", first, second), tag))?;
        },
        HeaderField::TimeTag(_, epoch) => {
            writeln!(w, "{}", fmt_rinex(&epoch::format_first_last_obs(*epoch), tag))?;
        },
        HeaderField::GloSlots(_, pairs) => {
            let mut body = format!("{:3}", pairs.len());
            for (index, (slot, fcn)) in pairs.iter().enumerate() {
                if index > 0 && index % 8 == 0 {
                    writeln!(w, "{}", fmt_rinex(&body, tag))?;
                    body = " ".repeat(3);
                }
                body.push_str(&format!(" R{:02} {:>2}", slot, fcn));
            }
            writeln!(w, "{}", fmt_rinex(&body, tag))?;
        },
        HeaderField::GloPhaseBias(_, pairs) => {
            let mut body = String::new();
            for (code, bias) in pairs.iter() {
                body.push_str(&format!(" {:>3} {:8.3}", code, bias));
            }
            writeln!(w, "{}", fmt_rinex(&body, tag))?;
        },
        HeaderField::PhaseShift(_, constellation, code, correction) => {
            let mut body = format!("{:x} {:>3}", constellation, code);
            if let Some(value) = correction {
                body.push_str(&format!(" {:8.5}", value));
            }
            writeln!(w, "{}", fmt_rinex(&body, tag))?;
        },
        HeaderField::ScaleFactor(_, constellation, factor, codes) => {
            let mut body = format!("{:x} {:4}  {:2}", constellation, factor, codes.len());
            for code in codes.iter() {
                body.push_str(&format!(" {:>3}", code));
            }
            writeln!(w, "{}", fmt_rinex(&body, tag))?;
        },
        HeaderField::PrnObsCount(_, sv, counts) => {
            let mut body = format!("   {}", sv);
            for count in counts.iter() {
                body.push_str(&format!("{:6}", count));
            }
            writeln!(w, "{}", fmt_rinex(&body, tag))?;
        },
        // corrections print through their own path
        HeaderField::Correction(..) => {},
    }
    Ok(())
}
